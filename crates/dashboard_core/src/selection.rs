use std::collections::HashMap;

use shared::domain::{MarketerId, Supplier, SupplierId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    Seeded,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEntry {
    pub marketer_id: MarketerId,
    pub origin: SelectionOrigin,
}

#[derive(Debug, Default, Clone)]
pub struct SelectionState {
    entries: HashMap<SupplierId, SelectionEntry>,
}

impl SelectionState {
    /// The marketer is not checked against the fetched marketer collection.
    pub fn select(&mut self, supplier_id: SupplierId, marketer_id: MarketerId) {
        self.entries.insert(
            supplier_id,
            SelectionEntry {
                marketer_id,
                origin: SelectionOrigin::User,
            },
        );
    }

    pub fn clear(&mut self, supplier_id: SupplierId) {
        self.entries.remove(&supplier_id);
    }

    pub fn get(&self, supplier_id: SupplierId) -> Option<MarketerId> {
        self.entries.get(&supplier_id).map(|entry| entry.marketer_id)
    }

    pub fn entry(&self, supplier_id: SupplierId) -> Option<SelectionEntry> {
        self.entries.get(&supplier_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigned suppliers are re-seeded from their `marketer_id`, overwriting
    /// any pending change even when the refresh was triggered by another row.
    /// Only an unassigned supplier keeps a user choice; it loses a seed.
    /// Entries for vanished suppliers are dropped.
    pub fn reseed(&mut self, suppliers: &[Supplier]) {
        let mut next = HashMap::with_capacity(suppliers.len());
        for supplier in suppliers {
            match supplier.marketer_id {
                Some(marketer_id) => {
                    next.insert(
                        supplier.id,
                        SelectionEntry {
                            marketer_id,
                            origin: SelectionOrigin::Seeded,
                        },
                    );
                }
                None => {
                    if let Some(entry) = self.entries.get(&supplier.id) {
                        if entry.origin == SelectionOrigin::User {
                            next.insert(supplier.id, *entry);
                        }
                    }
                }
            }
        }
        self.entries = next;
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
