use serde::{Deserialize, Serialize};

use crate::domain::{MarketerId, SupplierId};

pub fn suppliers_route() -> &'static str {
    "/suppliers"
}

pub fn marketers_route() -> &'static str {
    "/marketers"
}

pub fn regions_route() -> &'static str {
    "/regions"
}

pub fn assign_marketer_route() -> &'static str {
    "/assign-marketer"
}

pub fn remove_marketer_route(supplier_id: SupplierId) -> String {
    format!("/remove-marketer/{}", supplier_id.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignMarketerRequest {
    pub supplier_id: SupplierId,
    pub marketer_id: MarketerId,
}

