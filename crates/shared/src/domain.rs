use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(SupplierId);
id_newtype!(MarketerId);
id_newtype!(RegionId);

/// A supplier row as served by the data service.
///
/// `marketer_id` changes only through the assign/remove endpoints; `marketer`
/// is the server-rendered display name of that marketer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub company_name: String,
    pub contact_person: String,
    #[serde(default)]
    pub region_id: Option<RegionId>,
    #[serde(default)]
    pub marketer_id: Option<MarketerId>,
    #[serde(default)]
    pub marketer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marketer {
    pub user_id: MarketerId,
    pub first_name: String,
    pub last_name: String,
}

impl Marketer {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
}
