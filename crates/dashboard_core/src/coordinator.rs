use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::domain::{MarketerId, SupplierId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::{AssignmentError, MutationAction, RemoteError, ValidationWarning},
    selection::SelectionState,
    store::{fetch_collections, ApplyOutcome, EntitySnapshot, EntityStore},
    view::{ComposedView, FilterTerm, SortSpec, ViewComposer},
    with_timeout, AssignmentBackend, AssignmentEvent, DEFAULT_REQUEST_TIMEOUT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Unassigned,
    SelectedPendingCommit {
        committed: Option<MarketerId>,
        target: MarketerId,
    },
    Committing {
        committed: Option<MarketerId>,
        target: MarketerId,
    },
    Assigned {
        marketer_id: MarketerId,
    },
    Removing {
        marketer_id: MarketerId,
    },
}

impl RowState {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Committing { .. } | Self::Removing { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Committing { target: MarketerId },
    Removing { marketer_id: MarketerId },
}

fn derive_row_state(
    committed: Option<MarketerId>,
    selected: Option<MarketerId>,
    in_flight: Option<InFlight>,
) -> RowState {
    match (in_flight, committed, selected) {
        (Some(InFlight::Committing { target }), committed, _) => {
            RowState::Committing { committed, target }
        }
        (Some(InFlight::Removing { marketer_id }), _, _) => RowState::Removing { marketer_id },
        (None, committed, Some(target)) if committed != Some(target) => {
            RowState::SelectedPendingCommit { committed, target }
        }
        (None, Some(marketer_id), _) => RowState::Assigned { marketer_id },
        (None, None, _) => RowState::Unassigned,
    }
}

/// Dropping the token cancels the removal.
#[derive(Debug)]
#[must_use = "a removal is only issued once it is confirmed"]
pub struct PendingRemoval {
    supplier_id: SupplierId,
    marketer_id: MarketerId,
}

impl PendingRemoval {
    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn marketer_id(&self) -> MarketerId {
        self.marketer_id
    }
}

struct CoordinatorState {
    store: EntityStore,
    selection: SelectionState,
    in_flight: HashMap<SupplierId, InFlight>,
    composer: ViewComposer,
    filter: FilterTerm,
    sort: Option<SortSpec>,
}

pub struct AssignmentCoordinator {
    backend: Arc<dyn AssignmentBackend>,
    timeout: Duration,
    inner: Mutex<CoordinatorState>,
    disposed: AtomicBool,
    events: broadcast::Sender<AssignmentEvent>,
}

impl AssignmentCoordinator {
    pub fn new(backend: Arc<dyn AssignmentBackend>) -> Arc<Self> {
        Self::new_with_timeout(backend, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn new_with_timeout(backend: Arc<dyn AssignmentBackend>, timeout: Duration) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            timeout,
            inner: Mutex::new(CoordinatorState {
                store: EntityStore::default(),
                selection: SelectionState::default(),
                in_flight: HashMap::new(),
                composer: ViewComposer::default(),
                filter: FilterTerm::default(),
                sort: None,
            }),
            disposed: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AssignmentEvent> {
        self.events.subscribe()
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut guard = self.inner.lock().await;
        guard.in_flight.clear();
        guard.composer.invalidate();
        debug!("assignment: coordinator disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.store.is_loading()
    }

    pub async fn snapshot(&self) -> Arc<EntitySnapshot> {
        self.inner.lock().await.store.snapshot()
    }

    pub async fn refresh(&self) -> Result<Arc<EntitySnapshot>, AssignmentError> {
        self.ensure_live()?;
        let ticket = {
            let mut guard = self.inner.lock().await;
            let was_loading = guard.store.is_loading();
            let ticket = guard.store.begin_refresh();
            if !was_loading {
                self.emit(AssignmentEvent::LoadingChanged(true));
            }
            ticket
        };

        let fetched = fetch_collections(self.backend.as_ref(), self.timeout).await;

        // dispose() sets the flag before it locks; check it under the lock.
        let mut guard = self.inner.lock().await;
        if self.is_disposed() {
            debug!("assignment: dropping refresh result after dispose");
            return Err(AssignmentError::Disposed);
        }
        guard.store.finish_refresh();
        if !guard.store.is_loading() {
            self.emit(AssignmentEvent::LoadingChanged(false));
        }

        let collections = match fetched {
            Ok(collections) => collections,
            Err(err) => {
                warn!(error = %err, "assignment: refresh failed, keeping previous snapshot");
                if let AssignmentError::FetchFailure { collection, source } = &err {
                    self.emit(AssignmentEvent::FetchFailed {
                        collection: *collection,
                        message: source.to_string(),
                    });
                }
                return Err(err);
            }
        };

        match guard.store.apply(ticket, collections) {
            ApplyOutcome::Replaced { version } => {
                let snapshot = guard.store.snapshot();
                guard.selection.reseed(&snapshot.suppliers);
                info!(
                    version,
                    suppliers = snapshot.suppliers.len(),
                    marketers = snapshot.marketers.len(),
                    regions = snapshot.regions.len(),
                    "assignment: snapshot replaced"
                );
                self.emit(AssignmentEvent::SnapshotReplaced { version });
            }
            ApplyOutcome::Unchanged { version } => {
                let snapshot = guard.store.snapshot();
                guard.selection.reseed(&snapshot.suppliers);
                debug!(version, "assignment: refresh returned unchanged data");
            }
            ApplyOutcome::Superseded => {
                debug!("assignment: discarding refresh superseded by a newer one");
            }
        }

        Ok(guard.store.snapshot())
    }

    pub async fn select(
        &self,
        supplier_id: SupplierId,
        marketer_id: MarketerId,
    ) -> Result<(), AssignmentError> {
        self.ensure_live()?;
        let mut guard = self.inner.lock().await;
        if guard.in_flight.contains_key(&supplier_id) {
            return Err(AssignmentError::RowBusy { supplier_id });
        }
        guard.selection.select(supplier_id, marketer_id);
        Ok(())
    }

    pub async fn clear_selection(&self, supplier_id: SupplierId) -> Result<(), AssignmentError> {
        self.ensure_live()?;
        let mut guard = self.inner.lock().await;
        if guard.in_flight.contains_key(&supplier_id) {
            return Err(AssignmentError::RowBusy { supplier_id });
        }
        guard.selection.clear(supplier_id);
        Ok(())
    }

    pub async fn selection(&self, supplier_id: SupplierId) -> Option<MarketerId> {
        self.inner.lock().await.selection.get(supplier_id)
    }

    /// `None` when the supplier is not part of the current snapshot.
    pub async fn row_state(&self, supplier_id: SupplierId) -> Option<RowState> {
        let guard = self.inner.lock().await;
        let snapshot = guard.store.snapshot();
        let supplier = snapshot.supplier(supplier_id)?;
        Some(derive_row_state(
            supplier.marketer_id,
            guard.selection.get(supplier_id),
            guard.in_flight.get(&supplier_id).copied(),
        ))
    }

    pub async fn is_row_busy(&self, supplier_id: SupplierId) -> bool {
        self.inner.lock().await.in_flight.contains_key(&supplier_id)
    }

    pub async fn set_filter(&self, filter: impl Into<String>) {
        self.inner.lock().await.filter = FilterTerm::new(filter);
    }

    pub async fn set_sort(&self, sort: Option<SortSpec>) {
        self.inner.lock().await.sort = sort;
    }

    pub async fn view(&self) -> Arc<ComposedView> {
        let mut guard = self.inner.lock().await;
        let state = &mut *guard;
        let snapshot = state.store.snapshot();
        state.composer.view(&snapshot, &state.filter, state.sort)
    }

    pub async fn assign(&self, supplier_id: SupplierId) -> Result<(), AssignmentError> {
        self.ensure_live()?;
        let target = {
            let mut guard = self.inner.lock().await;
            if guard.in_flight.contains_key(&supplier_id) {
                return Err(AssignmentError::RowBusy { supplier_id });
            }
            let Some(target) = guard.selection.get(supplier_id) else {
                let warning = ValidationWarning::NoSelection(supplier_id);
                debug!(supplier_id = supplier_id.0, "assignment: assign without selection");
                self.emit(AssignmentEvent::ValidationWarning(warning.clone()));
                return Err(warning.into());
            };
            if guard.store.snapshot().supplier(supplier_id).is_none() {
                return Err(AssignmentError::UnknownSupplier { supplier_id });
            }
            guard
                .in_flight
                .insert(supplier_id, InFlight::Committing { target });
            target
        };
        self.emit(AssignmentEvent::RowBusyChanged {
            supplier_id,
            busy: true,
        });

        info!(
            supplier_id = supplier_id.0,
            marketer_id = target.0,
            "assignment: assigning marketer"
        );
        let result = with_timeout(
            self.timeout,
            self.backend.assign_marketer(supplier_id, target),
        )
        .await;
        self.complete_mutation(MutationAction::Assign, supplier_id, result)
            .await
    }

    pub async fn begin_remove(
        &self,
        supplier_id: SupplierId,
    ) -> Result<PendingRemoval, AssignmentError> {
        self.ensure_live()?;
        let guard = self.inner.lock().await;
        if guard.in_flight.contains_key(&supplier_id) {
            return Err(AssignmentError::RowBusy { supplier_id });
        }
        let snapshot = guard.store.snapshot();
        let Some(supplier) = snapshot.supplier(supplier_id) else {
            return Err(AssignmentError::UnknownSupplier { supplier_id });
        };
        let Some(marketer_id) = supplier.marketer_id else {
            let warning = ValidationWarning::NothingToRemove(supplier_id);
            self.emit(AssignmentEvent::ValidationWarning(warning.clone()));
            return Err(warning.into());
        };
        Ok(PendingRemoval {
            supplier_id,
            marketer_id,
        })
    }

    pub async fn confirm_remove(&self, pending: PendingRemoval) -> Result<(), AssignmentError> {
        self.ensure_live()?;
        let PendingRemoval {
            supplier_id,
            marketer_id,
        } = pending;
        {
            let mut guard = self.inner.lock().await;
            if guard.in_flight.contains_key(&supplier_id) {
                return Err(AssignmentError::RowBusy { supplier_id });
            }
            let snapshot = guard.store.snapshot();
            let Some(supplier) = snapshot.supplier(supplier_id) else {
                return Err(AssignmentError::UnknownSupplier { supplier_id });
            };
            if supplier.marketer_id != Some(marketer_id) {
                let warning = ValidationWarning::StaleRemoval {
                    supplier_id,
                    confirmed: marketer_id,
                    current: supplier.marketer_id,
                };
                debug!(
                    supplier_id = supplier_id.0,
                    marketer_id = marketer_id.0,
                    "assignment: removal confirmed against a stale assignment"
                );
                self.emit(AssignmentEvent::ValidationWarning(warning.clone()));
                return Err(warning.into());
            }
            guard
                .in_flight
                .insert(supplier_id, InFlight::Removing { marketer_id });
        }
        self.emit(AssignmentEvent::RowBusyChanged {
            supplier_id,
            busy: true,
        });

        info!(
            supplier_id = supplier_id.0,
            marketer_id = marketer_id.0,
            "assignment: removing marketer"
        );
        let result = with_timeout(self.timeout, self.backend.remove_marketer(supplier_id)).await;
        self.complete_mutation(MutationAction::Remove, supplier_id, result)
            .await
    }

    async fn complete_mutation(
        &self,
        action: MutationAction,
        supplier_id: SupplierId,
        result: Result<(), RemoteError>,
    ) -> Result<(), AssignmentError> {
        if self.is_disposed() {
            debug!(
                supplier_id = supplier_id.0,
                %action,
                "assignment: dropping mutation result after dispose"
            );
            return Err(AssignmentError::Disposed);
        }

        if let Err(source) = result {
            warn!(
                supplier_id = supplier_id.0,
                %action,
                error = %source,
                "assignment: mutation failed"
            );
            self.release_row(supplier_id).await;
            self.emit(AssignmentEvent::MutationFailed {
                action,
                supplier_id,
                message: source.to_string(),
                retryable: source.is_retryable(),
            });
            return Err(AssignmentError::MutationFailure {
                action,
                supplier_id,
                source,
            });
        }

        info!(supplier_id = supplier_id.0, %action, "assignment: mutation accepted");
        self.emit(AssignmentEvent::MutationSucceeded {
            action,
            supplier_id,
        });
        if action == MutationAction::Remove {
            let mut guard = self.inner.lock().await;
            if self.is_disposed() {
                return Err(AssignmentError::Disposed);
            }
            guard.selection.clear(supplier_id);
        }

        let refreshed = self.refresh().await;
        self.release_row(supplier_id).await;
        refreshed.map(|_| ())
    }

    async fn release_row(&self, supplier_id: SupplierId) {
        let removed = {
            let mut guard = self.inner.lock().await;
            if self.is_disposed() {
                return;
            }
            guard.in_flight.remove(&supplier_id)
        };
        if removed.is_some() {
            self.emit(AssignmentEvent::RowBusyChanged {
                supplier_id,
                busy: false,
            });
        }
    }

    fn ensure_live(&self) -> Result<(), AssignmentError> {
        if self.is_disposed() {
            Err(AssignmentError::Disposed)
        } else {
            Ok(())
        }
    }

    fn emit(&self, event: AssignmentEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
