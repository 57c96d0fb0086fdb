use std::{cmp::Ordering, fmt, str::FromStr, sync::Arc};

use shared::domain::{Region, Supplier};

use crate::store::EntitySnapshot;

pub trait Searchable {
    /// `needle` is already lowercased.
    fn matches_needle(&self, needle: &str) -> bool;
}

pub trait Sortable {
    type Column: Copy;

    fn compare_by(&self, other: &Self, column: Self::Column) -> Ordering;
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Searchable for Supplier {
    fn matches_needle(&self, needle: &str) -> bool {
        contains_folded(&self.company_name, needle)
            || contains_folded(&self.contact_person, needle)
            || contains_folded(self.marketer.as_deref().unwrap_or_default(), needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupplierColumn {
    CompanyName,
    ContactPerson,
    Marketer,
    Region,
}

impl SupplierColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyName => "company_name",
            Self::ContactPerson => "contact_person",
            Self::Marketer => "marketer",
            Self::Region => "region",
        }
    }
}

impl fmt::Display for SupplierColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupplierColumn {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "company_name" | "company" => Ok(Self::CompanyName),
            "contact_person" | "contact" => Ok(Self::ContactPerson),
            "marketer" => Ok(Self::Marketer),
            "region" | "region_id" => Ok(Self::Region),
            other => Err(format!(
                "unknown column '{other}', expected one of company_name, contact_person, marketer, region"
            )),
        }
    }
}

impl Sortable for Supplier {
    type Column = SupplierColumn;

    fn compare_by(&self, other: &Self, column: SupplierColumn) -> Ordering {
        match column {
            SupplierColumn::CompanyName => self
                .company_name
                .to_lowercase()
                .cmp(&other.company_name.to_lowercase()),
            SupplierColumn::ContactPerson => self
                .contact_person
                .to_lowercase()
                .cmp(&other.contact_person.to_lowercase()),
            SupplierColumn::Marketer => self
                .marketer
                .as_ref()
                .map(|name| name.to_lowercase())
                .cmp(&other.marketer.as_ref().map(|name| name.to_lowercase())),
            SupplierColumn::Region => self.region_id.cmp(&other.region_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub column: SupplierColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: SupplierColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: SupplierColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

pub fn sort_list<T: Sortable>(items: &mut [T], column: T::Column, direction: SortDirection) {
    items.sort_by(|a, b| {
        let cmp = a.compare_by(b, column);
        match direction {
            SortDirection::Ascending => cmp,
            SortDirection::Descending => cmp.reverse(),
        }
    });
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterTerm {
    raw: String,
    needle: String,
}

impl FilterTerm {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = raw.to_lowercase();
        Self { raw, needle }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn matches<T: Searchable>(&self, item: &T) -> bool {
        self.needle.is_empty() || item.matches_needle(&self.needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPartition {
    pub region: Region,
    pub suppliers: Vec<Supplier>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedView {
    pub version: u64,
    pub filter: FilterTerm,
    pub sort: Option<SortSpec>,
    pub flat: Vec<Supplier>,
    pub partitions: Vec<RegionPartition>,
    /// Filtered suppliers whose region is null or not among the fetched regions.
    pub unpartitioned: usize,
}

pub fn compose(
    snapshot: &EntitySnapshot,
    filter: &FilterTerm,
    sort: Option<SortSpec>,
) -> ComposedView {
    let mut flat: Vec<Supplier> = snapshot
        .suppliers
        .iter()
        .filter(|supplier| filter.matches(*supplier))
        .cloned()
        .collect();
    if let Some(sort) = sort {
        sort_list(&mut flat, sort.column, sort.direction);
    }

    let partitions: Vec<RegionPartition> = snapshot
        .regions
        .iter()
        .map(|region| {
            let suppliers: Vec<Supplier> = flat
                .iter()
                .filter(|supplier| supplier.region_id == Some(region.id))
                .cloned()
                .collect();
            RegionPartition {
                region: region.clone(),
                count: suppliers.len(),
                suppliers,
            }
        })
        .collect();

    let unpartitioned = flat
        .iter()
        .filter(|supplier| match supplier.region_id {
            Some(region_id) => snapshot.region(region_id).is_none(),
            None => true,
        })
        .count();

    ComposedView {
        version: snapshot.version,
        filter: filter.clone(),
        sort,
        flat,
        partitions,
        unpartitioned,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewKey {
    version: u64,
    filter: FilterTerm,
    sort: Option<SortSpec>,
}

/// Memoizes [`compose`] on (snapshot version, filter, sort).
#[derive(Debug, Default)]
pub struct ViewComposer {
    cached: Option<(ViewKey, Arc<ComposedView>)>,
}

impl ViewComposer {
    pub fn view(
        &mut self,
        snapshot: &EntitySnapshot,
        filter: &FilterTerm,
        sort: Option<SortSpec>,
    ) -> Arc<ComposedView> {
        let key = ViewKey {
            version: snapshot.version,
            filter: filter.clone(),
            sort,
        };
        if let Some((cached_key, view)) = &self.cached {
            if *cached_key == key {
                return Arc::clone(view);
            }
        }

        let view = Arc::new(compose(snapshot, filter, sort));
        self.cached = Some((key, Arc::clone(&view)));
        view
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
