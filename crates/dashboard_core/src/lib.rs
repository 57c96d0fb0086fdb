use std::{future::Future, time::Duration};

use async_trait::async_trait;
use shared::domain::{Marketer, MarketerId, Region, Supplier, SupplierId};

pub mod coordinator;
pub mod error;
pub mod http;
pub mod selection;
pub mod store;
pub mod view;

pub use coordinator::{AssignmentCoordinator, PendingRemoval, RowState};
pub use error::{AssignmentError, Collection, MutationAction, RemoteError, ValidationWarning};
pub use http::HttpAssignmentBackend;
pub use selection::SelectionState;
pub use store::{EntitySnapshot, EntityStore};
pub use view::{ComposedView, FilterTerm, RegionPartition, SortDirection, SortSpec, SupplierColumn};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The data service the assignment screen talks to.
#[async_trait]
pub trait AssignmentBackend: Send + Sync {
    async fn fetch_suppliers(&self) -> Result<Vec<Supplier>, RemoteError>;
    async fn fetch_marketers(&self) -> Result<Vec<Marketer>, RemoteError>;
    async fn fetch_regions(&self) -> Result<Vec<Region>, RemoteError>;
    async fn assign_marketer(
        &self,
        supplier_id: SupplierId,
        marketer_id: MarketerId,
    ) -> Result<(), RemoteError>;
    async fn remove_marketer(&self, supplier_id: SupplierId) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentEvent {
    LoadingChanged(bool),
    SnapshotReplaced {
        version: u64,
    },
    FetchFailed {
        collection: Collection,
        message: String,
    },
    RowBusyChanged {
        supplier_id: SupplierId,
        busy: bool,
    },
    MutationSucceeded {
        action: MutationAction,
        supplier_id: SupplierId,
    },
    MutationFailed {
        action: MutationAction,
        supplier_id: SupplierId,
        message: String,
        retryable: bool,
    },
    ValidationWarning(ValidationWarning),
}

pub(crate) async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| RemoteError::Timeout(timeout))?
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
