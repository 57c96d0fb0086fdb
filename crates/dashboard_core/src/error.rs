use std::{fmt, time::Duration};

use shared::{
    domain::{MarketerId, SupplierId},
    error::ErrorCode,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Suppliers,
    Marketers,
    Regions,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Suppliers => "suppliers",
            Self::Marketers => "marketers",
            Self::Regions => "regions",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationAction {
    Assign,
    Remove,
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Assign => "assign marketer",
            Self::Remove => "remove marketer",
        })
    }
}

#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server rejected request with status {status}: {message}")]
    Rejected {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether re-issuing the same call may succeed without any user change.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    #[error("select a marketer for supplier {0} before assigning")]
    NoSelection(SupplierId),
    #[error("supplier {0} has no assigned marketer to remove")]
    NothingToRemove(SupplierId),
    #[error("supplier {supplier_id} is no longer assigned to marketer {confirmed}; reload before removing")]
    StaleRemoval {
        supplier_id: SupplierId,
        confirmed: MarketerId,
        current: Option<MarketerId>,
    },
}

impl ValidationWarning {
    pub fn supplier_id(&self) -> SupplierId {
        match self {
            Self::NoSelection(id) | Self::NothingToRemove(id) => *id,
            Self::StaleRemoval { supplier_id, .. } => *supplier_id,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AssignmentError {
    #[error("failed to fetch {collection}: {source}")]
    FetchFailure {
        collection: Collection,
        #[source]
        source: RemoteError,
    },
    #[error("{action} failed for supplier {supplier_id}: {source}")]
    MutationFailure {
        action: MutationAction,
        supplier_id: SupplierId,
        #[source]
        source: RemoteError,
    },
    #[error(transparent)]
    Validation(#[from] ValidationWarning),
    #[error("supplier {supplier_id} already has an operation in flight")]
    RowBusy { supplier_id: SupplierId },
    #[error("supplier {supplier_id} is not in the current snapshot")]
    UnknownSupplier { supplier_id: SupplierId },
    #[error("assignment coordinator has been disposed")]
    Disposed,
}

impl AssignmentError {
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::FetchFailure { source, .. } | Self::MutationFailure { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.remote().is_some_and(RemoteError::is_retryable)
    }
}
