//! Plain-text rendering of the composed views for the terminal.

use std::fmt::Write as _;

use dashboard_core::{ComposedView, EntitySnapshot, RowState};
use shared::domain::{Marketer, MarketerId, Supplier};

fn region_label(snapshot: &EntitySnapshot, supplier: &Supplier) -> String {
    match supplier.region_id {
        Some(region_id) => snapshot
            .region(region_id)
            .map(|region| region.name.clone())
            .unwrap_or_else(|| format!("#{region_id}")),
        None => "-".to_string(),
    }
}

fn marketer_label(snapshot: &EntitySnapshot, marketer_id: MarketerId) -> String {
    snapshot
        .marketer(marketer_id)
        .map(Marketer::display_name)
        .unwrap_or_else(|| format!("#{marketer_id}"))
}

fn supplier_line(snapshot: &EntitySnapshot, supplier: &Supplier) -> String {
    format!(
        "{:>6}  {:<28}  {:<24}  {:<16}  {}",
        supplier.id,
        supplier.company_name,
        supplier.contact_person,
        region_label(snapshot, supplier),
        supplier.marketer.as_deref().unwrap_or("-"),
    )
}

pub fn render_suppliers(snapshot: &EntitySnapshot, view: &ComposedView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6}  {:<28}  {:<24}  {:<16}  {}",
        "id", "company", "contact", "region", "marketer"
    );
    for supplier in &view.flat {
        let _ = writeln!(out, "{}", supplier_line(snapshot, supplier));
    }
    let _ = write!(
        out,
        "{} of {} suppliers",
        view.flat.len(),
        snapshot.suppliers.len()
    );
    if !view.filter.is_empty() {
        let _ = write!(out, " matching \"{}\"", view.filter.as_str());
    }
    out
}

pub fn render_regions(snapshot: &EntitySnapshot, view: &ComposedView) -> String {
    let mut out = String::new();
    for partition in &view.partitions {
        let _ = writeln!(out, "{} ({})", partition.region.name, partition.count);
        for supplier in &partition.suppliers {
            let _ = writeln!(
                out,
                "  {:>6}  {:<28}  {}",
                supplier.id,
                supplier.company_name,
                supplier.marketer.as_deref().unwrap_or("-"),
            );
        }
    }
    let _ = write!(out, "without a known region: {}", view.unpartitioned);
    out
}

pub fn render_marketers(marketers: &[Marketer]) -> String {
    marketers
        .iter()
        .map(|marketer| format!("{:>6}  {}", marketer.user_id, marketer.display_name()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn describe_row_state(snapshot: &EntitySnapshot, state: RowState) -> String {
    match state {
        RowState::Unassigned => "unassigned".to_string(),
        RowState::Assigned { marketer_id } => {
            format!("assigned to {}", marketer_label(snapshot, marketer_id))
        }
        RowState::SelectedPendingCommit { committed, target } => match committed {
            Some(committed) => format!(
                "pending change from {} to {}",
                marketer_label(snapshot, committed),
                marketer_label(snapshot, target)
            ),
            None => format!("pending assignment to {}", marketer_label(snapshot, target)),
        },
        RowState::Committing { target, .. } => {
            format!("committing {}", marketer_label(snapshot, target))
        }
        RowState::Removing { marketer_id } => {
            format!("removing {}", marketer_label(snapshot, marketer_id))
        }
    }
}
