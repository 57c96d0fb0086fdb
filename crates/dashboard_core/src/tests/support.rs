use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use shared::domain::{Marketer, MarketerId, Region, RegionId, Supplier, SupplierId};
use tokio::sync::{oneshot, Mutex};

use crate::{error::Collection, AssignmentBackend, RemoteError};

pub(crate) fn supplier(
    id: i64,
    company_name: &str,
    contact_person: &str,
    region_id: Option<i64>,
    marketer: Option<(i64, &str)>,
) -> Supplier {
    Supplier {
        id: SupplierId(id),
        company_name: company_name.to_string(),
        contact_person: contact_person.to_string(),
        region_id: region_id.map(RegionId),
        marketer_id: marketer.map(|(id, _)| MarketerId(id)),
        marketer: marketer.map(|(_, name)| name.to_string()),
    }
}

pub(crate) fn marketer(user_id: i64, first_name: &str, last_name: &str) -> Marketer {
    Marketer {
        user_id: MarketerId(user_id),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    }
}

pub(crate) fn region(id: i64, name: &str) -> Region {
    Region {
        id: RegionId(id),
        name: name.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeData {
    pub(crate) suppliers: Vec<Supplier>,
    pub(crate) marketers: Vec<Marketer>,
    pub(crate) regions: Vec<Region>,
}

pub(crate) fn sample_data() -> FakeData {
    FakeData {
        suppliers: vec![
            supplier(1, "Acme Corp", "Wile Coyote", Some(10), None),
            supplier(2, "Globex", "Hank Scorpio", Some(20), Some((7, "Jane Roe"))),
            supplier(3, "Initech", "Bill Lumbergh", None, None),
            supplier(4, "Umbrella", "Albert Wesker", Some(99), None),
        ],
        marketers: vec![marketer(7, "Jane", "Roe"), marketer(99, "Max", "Power")],
        regions: vec![region(10, "North"), region(20, "South")],
    }
}

/// Held until the test releases it; `entered` fires once the call is parked.
pub(crate) struct GateHandle {
    pub(crate) entered: oneshot::Receiver<()>,
    pub(crate) release: oneshot::Sender<()>,
}

struct Gate {
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

fn gate_pair() -> (Gate, GateHandle) {
    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    (
        Gate {
            entered: entered_tx,
            release: release_rx,
        },
        GateHandle {
            entered: entered_rx,
            release: release_tx,
        },
    )
}

impl Gate {
    async fn park(self) {
        let _ = self.entered.send(());
        let _ = self.release.await;
    }
}

#[derive(Default)]
struct Faults {
    fetch: Option<Collection>,
    hang_fetch: bool,
    mutations: HashSet<SupplierId>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    data: Mutex<FakeData>,
    faults: Mutex<Faults>,
    mutation_gates: Mutex<HashMap<SupplierId, Gate>>,
    fetch_gate: Mutex<Option<Gate>>,
    supplier_fetches: AtomicUsize,
    mutations: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new(data: FakeData) -> Self {
        Self {
            data: Mutex::new(data),
            ..Self::default()
        }
    }

    pub(crate) async fn set_data(&self, data: FakeData) {
        *self.data.lock().await = data;
    }

    pub(crate) async fn update_supplier(&self, supplier_id: SupplierId, f: impl FnOnce(&mut Supplier)) {
        let mut data = self.data.lock().await;
        if let Some(supplier) = data.suppliers.iter_mut().find(|s| s.id == supplier_id) {
            f(supplier);
        }
    }

    pub(crate) async fn fail_fetch(&self, collection: Option<Collection>) {
        self.faults.lock().await.fetch = collection;
    }

    pub(crate) async fn hang_fetches(&self, hang: bool) {
        self.faults.lock().await.hang_fetch = hang;
    }

    pub(crate) async fn fail_mutations_for(&self, supplier_id: SupplierId) {
        self.faults.lock().await.mutations.insert(supplier_id);
    }

    pub(crate) async fn gate_mutation(&self, supplier_id: SupplierId) -> GateHandle {
        let (gate, handle) = gate_pair();
        self.mutation_gates.lock().await.insert(supplier_id, gate);
        handle
    }

    /// Parks the next supplier fetch after it has read the data.
    pub(crate) async fn gate_next_fetch(&self) -> GateHandle {
        let (gate, handle) = gate_pair();
        *self.fetch_gate.lock().await = Some(gate);
        handle
    }

    pub(crate) fn supplier_fetch_count(&self) -> usize {
        self.supplier_fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    async fn fetch_fault(&self, collection: Collection) -> Result<(), RemoteError> {
        let (failing, hang) = {
            let faults = self.faults.lock().await;
            (faults.fetch, faults.hang_fetch)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        if failing == Some(collection) {
            return Err(RemoteError::Rejected {
                status: 503,
                code: None,
                message: format!("{collection} unavailable"),
            });
        }
        Ok(())
    }

    async fn mutation_fault(&self, supplier_id: SupplierId) -> Result<(), RemoteError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let gate = self.mutation_gates.lock().await.remove(&supplier_id);
        if let Some(gate) = gate {
            gate.park().await;
        }
        if self.faults.lock().await.mutations.contains(&supplier_id) {
            return Err(RemoteError::Rejected {
                status: 500,
                code: None,
                message: "mutation rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentBackend for FakeBackend {
    async fn fetch_suppliers(&self) -> Result<Vec<Supplier>, RemoteError> {
        self.supplier_fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_fault(Collection::Suppliers).await?;
        let suppliers = self.data.lock().await.suppliers.clone();
        let gate = self.fetch_gate.lock().await.take();
        if let Some(gate) = gate {
            gate.park().await;
        }
        Ok(suppliers)
    }

    async fn fetch_marketers(&self) -> Result<Vec<Marketer>, RemoteError> {
        self.fetch_fault(Collection::Marketers).await?;
        Ok(self.data.lock().await.marketers.clone())
    }

    async fn fetch_regions(&self) -> Result<Vec<Region>, RemoteError> {
        self.fetch_fault(Collection::Regions).await?;
        Ok(self.data.lock().await.regions.clone())
    }

    async fn assign_marketer(
        &self,
        supplier_id: SupplierId,
        marketer_id: MarketerId,
    ) -> Result<(), RemoteError> {
        self.mutation_fault(supplier_id).await?;
        let mut data = self.data.lock().await;
        let name = data
            .marketers
            .iter()
            .find(|m| m.user_id == marketer_id)
            .map(Marketer::display_name);
        if let Some(supplier) = data.suppliers.iter_mut().find(|s| s.id == supplier_id) {
            supplier.marketer_id = Some(marketer_id);
            supplier.marketer = name;
        }
        Ok(())
    }

    async fn remove_marketer(&self, supplier_id: SupplierId) -> Result<(), RemoteError> {
        self.mutation_fault(supplier_id).await?;
        self.update_supplier(supplier_id, |supplier| {
            supplier.marketer_id = None;
            supplier.marketer = None;
        })
        .await;
        Ok(())
    }
}
