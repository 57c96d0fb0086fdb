use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        "server_url = \"https://admin.example.com/api\"\nrequest_timeout_secs = 30\n",
    )
    .expect("parse");
    assert_eq!(settings.server_url, "https://admin.example.com/api");
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "request_timeout_secs = 5").expect("parse");
    assert_eq!(settings.server_url, Settings::default().server_url);
    assert_eq!(settings.request_timeout_secs, 5);
}

#[test]
fn malformed_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "request_timeout_secs = \"soon\"").is_err());
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("DASHBOARD_SERVER_URL", "http://plain:1"),
            ("APP__SERVER_URL", "http://prefixed:2"),
            ("APP__REQUEST_TIMEOUT_SECS", " 42 "),
        ]),
    );
    assert_eq!(settings.server_url, "http://prefixed:2");
    assert_eq!(settings.request_timeout_secs, 42);
}

#[test]
fn unparsable_env_timeout_is_ignored() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[("APP__REQUEST_TIMEOUT_SECS", "forever")]),
    );
    assert_eq!(settings.request_timeout_secs, 15);
}

#[test]
fn explicit_config_file_and_flags_are_layered() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("dashboard_cli_config_test_{suffix}.toml"));
    fs::write(
        &path,
        "server_url = \"http://from-file:9000/api\"\nrequest_timeout_secs = 20\n",
    )
    .expect("write config");

    let settings = load_settings(&Overrides {
        config_path: Some(path.clone()),
        server_url: None,
        request_timeout_secs: Some(3),
    })
    .expect("load");
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.request_timeout_secs, 3);
    if env::var("DASHBOARD_SERVER_URL").is_err() && env::var("APP__SERVER_URL").is_err() {
        assert_eq!(settings.server_url, "http://from-file:9000/api");
    }
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let err = load_settings(&Overrides {
        config_path: Some(PathBuf::from("/nonexistent/dashboard.toml")),
        ..Overrides::default()
    })
    .expect_err("must fail");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn zero_timeout_is_rejected() {
    let settings = Settings {
        request_timeout_secs: 0,
        ..Settings::default()
    };
    assert!(validate(&settings).is_err());
}
