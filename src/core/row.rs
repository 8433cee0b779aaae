//! Purpose: Compose logical rows out of per-family documents.
//! Exports: `RowData`, `ScanData`, `Cell`, `CellRef`, composition helpers.
//! Role: Rows are never stored; they are a join of family documents on row key.
//! Invariants: A row exists iff at least one family document holds its key.
//! Invariants: Only families that hold the row appear in its `RowData`.
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::family::{FamilyDoc, Qualifiers};

/// One row joined across families: family -> qualifier -> version series.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RowData(BTreeMap<String, Qualifiers>);

/// Row key -> joined row, sorted by row key.
pub type ScanData = BTreeMap<String, RowData>;

/// A single resolved cell version.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Cell {
    pub version: u64,
    pub value: String,
}

/// Borrowed view of one stored version, used for flat listings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellRef<'a> {
    pub family: &'a str,
    pub qualifier: &'a str,
    pub version: u64,
    pub value: &'a str,
}

impl RowData {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn family(&self, name: &str) -> Option<&Qualifiers> {
        self.0.get(name)
    }

    pub fn family_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Every stored version, ordered by family, qualifier, then newest first.
    pub fn cells(&self) -> impl Iterator<Item = CellRef<'_>> + '_ {
        self.0.iter().flat_map(|(family, quals)| {
            quals.iter().flat_map(move |(qualifier, series)| {
                series.iter().rev().map(move |(version, value)| CellRef {
                    family,
                    qualifier,
                    version,
                    value,
                })
            })
        })
    }

    fn insert(&mut self, family: &str, quals: &Qualifiers) {
        self.0.insert(family.to_string(), quals.clone());
    }
}

/// Joins `row` across `families`; `None` when no family holds it.
pub fn compose_row<'a, I>(families: I, row: &str) -> Option<RowData>
where
    I: IntoIterator<Item = (&'a str, &'a FamilyDoc)>,
{
    let mut data = RowData::default();
    for (name, doc) in families {
        if let Some(quals) = doc.row(row) {
            data.insert(name, quals);
        }
    }
    if data.is_empty() { None } else { Some(data) }
}

pub fn compose_scan<'a, I>(families: I) -> ScanData
where
    I: IntoIterator<Item = (&'a str, &'a FamilyDoc)>,
{
    let mut scan = ScanData::new();
    for (name, doc) in families {
        for (row, quals) in doc.rows() {
            scan.entry(row.to_string()).or_default().insert(name, quals);
        }
    }
    scan
}

/// Number of distinct row keys across `families`.
pub fn distinct_rows<'a, I>(families: I) -> usize
where
    I: IntoIterator<Item = &'a FamilyDoc>,
{
    let mut keys = BTreeSet::new();
    for doc in families {
        keys.extend(doc.row_keys());
    }
    keys.len()
}

#[cfg(test)]
mod tests {
    use super::{compose_row, compose_scan, distinct_rows};
    use crate::core::family::FamilyDoc;

    fn docs() -> (FamilyDoc, FamilyDoc) {
        let mut info = FamilyDoc::new();
        info.put("r1", "name", "Alice", 2);
        info.put("r1", "name", "Alicia", 2);
        info.put("r2", "name", "Bob", 2);
        let mut contact = FamilyDoc::new();
        contact.put("r1", "email", "a@example.com", 2);
        contact.put("r3", "email", "c@example.com", 2);
        (info, contact)
    }

    #[test]
    fn compose_row_joins_only_families_holding_row() {
        let (info, contact) = docs();
        let row = compose_row([("info", &info), ("contact", &contact)], "r2").expect("row");
        assert_eq!(row.family_names().collect::<Vec<_>>(), vec!["info"]);

        let row = compose_row([("info", &info), ("contact", &contact)], "r1").expect("row");
        let cells: Vec<_> = row
            .cells()
            .map(|cell| (cell.family, cell.qualifier, cell.version, cell.value))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("contact", "email", 1, "a@example.com"),
                ("info", "name", 2, "Alicia"),
                ("info", "name", 1, "Alice"),
            ]
        );

        assert!(compose_row([("info", &info), ("contact", &contact)], "r9").is_none());
    }

    #[test]
    fn scan_covers_every_row_once() {
        let (info, contact) = docs();
        let scan = compose_scan([("info", &info), ("contact", &contact)]);
        assert_eq!(scan.keys().map(String::as_str).collect::<Vec<_>>(), vec!["r1", "r2", "r3"]);
        assert_eq!(scan["r1"].family_names().count(), 2);
    }

    #[test]
    fn distinct_rows_ignores_family_order() {
        let (info, contact) = docs();
        assert_eq!(distinct_rows([&info, &contact]), 3);
        assert_eq!(distinct_rows([&contact, &info]), 3);
        assert_eq!(distinct_rows(std::iter::empty::<&FamilyDoc>()), 0);
    }
}
