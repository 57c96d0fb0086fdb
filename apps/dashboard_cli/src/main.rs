use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dashboard_core::{
    AssignmentCoordinator, AssignmentError, HttpAssignmentBackend, SortSpec, SupplierColumn,
};
use shared::domain::{MarketerId, SupplierId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Overrides};

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Supplier and marketer assignment console")]
struct Args {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flat supplier table.
    Suppliers {
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long)]
        sort: Option<SupplierColumn>,
        #[arg(long)]
        desc: bool,
    },
    /// Suppliers grouped by region.
    Regions {
        #[arg(long, default_value = "")]
        filter: String,
    },
    Marketers,
    Assign {
        #[arg(long)]
        supplier: i64,
        #[arg(long)]
        marketer: i64,
    },
    Remove {
        #[arg(long)]
        supplier: i64,
        /// Confirms the removal.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(&Overrides {
        config_path: args.config.clone(),
        server_url: args.server_url.clone(),
        request_timeout_secs: args.timeout_secs,
    })?;
    info!(server_url = %settings.server_url, "dashboard: using data service");

    let backend = Arc::new(HttpAssignmentBackend::new(&settings.server_url)?);
    let coordinator = AssignmentCoordinator::new_with_timeout(backend, settings.request_timeout());
    let outcome = run(&coordinator, args.command).await;
    coordinator.dispose().await;
    outcome
}

async fn run(coordinator: &AssignmentCoordinator, command: Command) -> Result<()> {
    coordinator
        .refresh()
        .await
        .context("failed to load suppliers, marketers and regions")?;

    match command {
        Command::Suppliers { filter, sort, desc } => {
            coordinator.set_filter(filter).await;
            coordinator
                .set_sort(sort.map(|column| {
                    if desc {
                        SortSpec::descending(column)
                    } else {
                        SortSpec::ascending(column)
                    }
                }))
                .await;
            let snapshot = coordinator.snapshot().await;
            let view = coordinator.view().await;
            println!("{}", render::render_suppliers(&snapshot, &view));
        }
        Command::Regions { filter } => {
            coordinator.set_filter(filter).await;
            let snapshot = coordinator.snapshot().await;
            let view = coordinator.view().await;
            println!("{}", render::render_regions(&snapshot, &view));
        }
        Command::Marketers => {
            let snapshot = coordinator.snapshot().await;
            println!("{}", render::render_marketers(&snapshot.marketers));
        }
        Command::Assign { supplier, marketer } => {
            let supplier_id = SupplierId(supplier);
            let marketer_id = MarketerId(marketer);
            if coordinator.snapshot().await.marketer(marketer_id).is_none() {
                bail!("marketer {marketer_id} is not among the fetched marketers");
            }
            coordinator.select(supplier_id, marketer_id).await?;
            coordinator
                .assign(supplier_id)
                .await
                .with_context(|| format!("could not assign marketer to supplier {supplier_id}"))?;
            print_row(coordinator, supplier_id).await;
        }
        Command::Remove { supplier, yes } => {
            let supplier_id = SupplierId(supplier);
            let pending = match coordinator.begin_remove(supplier_id).await {
                Ok(pending) => pending,
                Err(AssignmentError::Validation(warning)) => {
                    println!("{warning}");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            if !yes {
                bail!(
                    "refusing to remove marketer {} from supplier {supplier_id} without --yes",
                    pending.marketer_id()
                );
            }
            coordinator
                .confirm_remove(pending)
                .await
                .with_context(|| format!("could not remove marketer from supplier {supplier_id}"))?;
            print_row(coordinator, supplier_id).await;
        }
    }

    Ok(())
}

async fn print_row(coordinator: &AssignmentCoordinator, supplier_id: SupplierId) {
    let snapshot = coordinator.snapshot().await;
    match coordinator.row_state(supplier_id).await {
        Some(state) => println!(
            "supplier {supplier_id}: {}",
            render::describe_row_state(&snapshot, state)
        ),
        None => println!("supplier {supplier_id} is no longer listed"),
    }
}
