use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::future::try_join3;
use shared::domain::{Marketer, MarketerId, Region, RegionId, Supplier, SupplierId};

use crate::{
    error::{AssignmentError, Collection},
    with_timeout, AssignmentBackend,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collections {
    pub suppliers: Vec<Supplier>,
    pub marketers: Vec<Marketer>,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Default)]
pub struct EntitySnapshot {
    pub suppliers: Vec<Supplier>,
    pub marketers: Vec<Marketer>,
    pub regions: Vec<Region>,
    /// Bumped only when fetched content differs from the previous snapshot.
    pub version: u64,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl EntitySnapshot {
    pub fn supplier(&self, supplier_id: SupplierId) -> Option<&Supplier> {
        self.suppliers.iter().find(|s| s.id == supplier_id)
    }

    pub fn marketer(&self, marketer_id: MarketerId) -> Option<&Marketer> {
        self.marketers.iter().find(|m| m.user_id == marketer_id)
    }

    pub fn region(&self, region_id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == region_id)
    }

    fn same_content(&self, collections: &Collections) -> bool {
        self.suppliers == collections.suppliers
            && self.marketers == collections.marketers
            && self.regions == collections.regions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Replaced { version: u64 },
    Unchanged { version: u64 },
    /// A refresh started later has already been applied.
    Superseded,
}

#[derive(Debug, Default)]
pub struct EntityStore {
    snapshot: Arc<EntitySnapshot>,
    last_ticket: u64,
    applied_ticket: u64,
    outstanding: usize,
}

impl EntityStore {
    pub fn snapshot(&self) -> Arc<EntitySnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn version(&self) -> u64 {
        self.snapshot.version
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding > 0
    }

    pub(crate) fn begin_refresh(&mut self) -> RefreshTicket {
        self.last_ticket += 1;
        self.outstanding += 1;
        RefreshTicket(self.last_ticket)
    }

    pub(crate) fn finish_refresh(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }

    pub(crate) fn apply(&mut self, ticket: RefreshTicket, collections: Collections) -> ApplyOutcome {
        if ticket.0 < self.applied_ticket {
            return ApplyOutcome::Superseded;
        }
        self.applied_ticket = ticket.0;

        let changed = !self.snapshot.same_content(&collections);
        let version = if changed {
            self.snapshot.version + 1
        } else {
            self.snapshot.version
        };
        self.snapshot = Arc::new(EntitySnapshot {
            suppliers: collections.suppliers,
            marketers: collections.marketers,
            regions: collections.regions,
            version,
            fetched_at: Some(Utc::now()),
        });

        if changed {
            ApplyOutcome::Replaced { version }
        } else {
            ApplyOutcome::Unchanged { version }
        }
    }
}

/// The first failure aborts the join.
pub(crate) async fn fetch_collections(
    backend: &dyn AssignmentBackend,
    timeout: Duration,
) -> Result<Collections, AssignmentError> {
    let suppliers = async {
        with_timeout(timeout, backend.fetch_suppliers())
            .await
            .map_err(|source| AssignmentError::FetchFailure {
                collection: Collection::Suppliers,
                source,
            })
    };
    let marketers = async {
        with_timeout(timeout, backend.fetch_marketers())
            .await
            .map_err(|source| AssignmentError::FetchFailure {
                collection: Collection::Marketers,
                source,
            })
    };
    let regions = async {
        with_timeout(timeout, backend.fetch_regions())
            .await
            .map_err(|source| AssignmentError::FetchFailure {
                collection: Collection::Regions,
                source,
            })
    };

    let (suppliers, marketers, regions) = try_join3(suppliers, marketers, regions).await?;
    Ok(Collections {
        suppliers,
        marketers,
        regions,
    })
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
