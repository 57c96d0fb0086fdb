use super::*;

fn supplier(id: i64, marketer_id: Option<i64>) -> Supplier {
    Supplier {
        id: SupplierId(id),
        company_name: format!("Company {id}"),
        contact_person: format!("Contact {id}"),
        region_id: None,
        marketer_id: marketer_id.map(MarketerId),
        marketer: None,
    }
}

#[test]
fn select_then_clear_leaves_no_entry() {
    let mut selection = SelectionState::default();
    selection.select(SupplierId(1), MarketerId(99));
    assert_eq!(selection.get(SupplierId(1)), Some(MarketerId(99)));

    selection.clear(SupplierId(1));
    assert_eq!(selection.get(SupplierId(1)), None);
    assert!(selection.is_empty());
}

#[test]
fn clear_removes_seeded_entry_too() {
    let mut selection = SelectionState::default();
    selection.reseed(&[supplier(1, Some(5))]);
    selection.select(SupplierId(1), MarketerId(6));
    selection.clear(SupplierId(1));
    assert_eq!(selection.get(SupplierId(1)), None);
}

#[test]
fn select_overwrites_previous_choice() {
    let mut selection = SelectionState::default();
    selection.select(SupplierId(1), MarketerId(3));
    selection.select(SupplierId(1), MarketerId(4));
    assert_eq!(selection.get(SupplierId(1)), Some(MarketerId(4)));
    assert_eq!(selection.len(), 1);
}

#[test]
fn reseed_populates_only_assigned_suppliers() {
    let mut selection = SelectionState::default();
    selection.reseed(&[supplier(1, Some(7)), supplier(2, None)]);

    assert_eq!(
        selection.entry(SupplierId(1)),
        Some(SelectionEntry {
            marketer_id: MarketerId(7),
            origin: SelectionOrigin::Seeded,
        })
    );
    assert_eq!(selection.get(SupplierId(2)), None);
}

#[test]
fn reseed_overwrites_divergent_choice_on_assigned_supplier() {
    let mut selection = SelectionState::default();
    selection.select(SupplierId(1), MarketerId(8));
    selection.reseed(&[supplier(1, Some(7))]);
    assert_eq!(selection.get(SupplierId(1)), Some(MarketerId(7)));
}

#[test]
fn reseed_keeps_unsaved_choice_for_unassigned_supplier() {
    let mut selection = SelectionState::default();
    selection.select(SupplierId(2), MarketerId(9));
    selection.reseed(&[supplier(1, Some(7)), supplier(2, None)]);
    assert_eq!(
        selection.entry(SupplierId(2)),
        Some(SelectionEntry {
            marketer_id: MarketerId(9),
            origin: SelectionOrigin::User,
        })
    );
}

#[test]
fn reseed_drops_stale_seed_after_remote_unassignment() {
    let mut selection = SelectionState::default();
    selection.reseed(&[supplier(1, Some(7))]);
    selection.reseed(&[supplier(1, None)]);
    assert_eq!(selection.get(SupplierId(1)), None);
}

#[test]
fn reseed_drops_entries_for_vanished_suppliers() {
    let mut selection = SelectionState::default();
    selection.select(SupplierId(3), MarketerId(1));
    selection.reseed(&[supplier(1, None)]);
    assert!(selection.is_empty());
}
