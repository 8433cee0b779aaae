// One column family's document: row -> qualifier -> version series.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::version::VersionSeries;

/// Qualifier map for one row inside one family.
pub type Qualifiers = BTreeMap<String, VersionSeries>;

/// Highest version ever assigned, per row and qualifier.
pub type LastVersions = BTreeMap<String, BTreeMap<String, u64>>;

/// In-memory image of a persisted family document.
///
/// Empty series are pruned from their qualifier map, and rows left without
/// qualifiers are pruned from the document, so row existence always means
/// at least one stored version. `last_versions` is never pruned: it keeps
/// version numbers from being handed out twice after deletes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FamilyDoc {
    #[serde(default)]
    rows: BTreeMap<String, Qualifiers>,
    #[serde(default)]
    last_versions: LastVersions,
}

impl FamilyDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_row(&self, row: &str) -> bool {
        self.rows.contains_key(row)
    }

    pub fn row(&self, row: &str) -> Option<&Qualifiers> {
        self.rows.get(row)
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.keys().map(String::as_str)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &Qualifiers)> + '_ {
        self.rows.iter().map(|(key, quals)| (key.as_str(), quals))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn put(&mut self, row: &str, qualifier: &str, value: &str, max_versions: u32) -> u64 {
        let last = self
            .last_versions
            .entry(row.to_string())
            .or_default()
            .entry(qualifier.to_string())
            .or_default();
        let version = self
            .rows
            .entry(row.to_string())
            .or_default()
            .entry(qualifier.to_string())
            .or_default()
            .put(*last, value, max_versions);
        *last = version;
        version
    }

    /// Highest version ever assigned to the cell, 0 if none.
    pub fn last_version(&self, row: &str, qualifier: &str) -> u64 {
        self.last_versions
            .get(row)
            .and_then(|quals| quals.get(qualifier))
            .copied()
            .unwrap_or(0)
    }

    pub fn series(&self, row: &str, qualifier: &str) -> Result<&VersionSeries, Error> {
        let quals = self
            .rows
            .get(row)
            .ok_or_else(|| Error::new(ErrorKind::RowNotFound).with_row(row))?;
        quals.get(qualifier).ok_or_else(|| {
            Error::new(ErrorKind::QualifierNotFound)
                .with_message(format!("qualifier {qualifier} not found"))
                .with_row(row)
        })
    }

    /// Removes one exact version and prunes anything it leaves empty.
    pub fn delete_version(
        &mut self,
        row: &str,
        qualifier: &str,
        version: u64,
    ) -> Result<String, Error> {
        let quals = self
            .rows
            .get_mut(row)
            .ok_or_else(|| Error::new(ErrorKind::RowNotFound).with_row(row))?;
        let series = quals.get_mut(qualifier).ok_or_else(|| {
            Error::new(ErrorKind::QualifierNotFound)
                .with_message(format!("qualifier {qualifier} not found"))
                .with_row(row)
        })?;
        let removed = series.remove(version).ok_or_else(|| {
            Error::new(ErrorKind::VersionNotFound)
                .with_message(format!("version {version} of {qualifier} not found"))
                .with_row(row)
                .with_version(version)
        })?;
        if series.is_empty() {
            quals.remove(qualifier);
        }
        if quals.is_empty() {
            self.rows.remove(row);
        }
        Ok(removed)
    }

    pub fn delete_row(&mut self, row: &str) -> Option<Qualifiers> {
        self.rows.remove(row)
    }
}

#[cfg(test)]
mod tests {
    use super::FamilyDoc;
    use crate::core::error::ErrorKind;

    #[test]
    fn put_creates_row_and_qualifier() {
        let mut doc = FamilyDoc::new();
        assert_eq!(doc.put("r1", "name", "Alice", 1), 1);
        assert!(doc.contains_row("r1"));
        assert_eq!(doc.series("r1", "name").expect("series").latest(), Some((1, "Alice")));
    }

    #[test]
    fn delete_version_errors_by_level() {
        let mut doc = FamilyDoc::new();
        doc.put("r1", "name", "Alice", 2);

        let err = doc.delete_version("r2", "name", 1).expect_err("row");
        assert_eq!(err.kind(), ErrorKind::RowNotFound);
        let err = doc.delete_version("r1", "age", 1).expect_err("qualifier");
        assert_eq!(err.kind(), ErrorKind::QualifierNotFound);
        let err = doc.delete_version("r1", "name", 9).expect_err("version");
        assert_eq!(err.kind(), ErrorKind::VersionNotFound);
        assert_eq!(err.version(), Some(9));

        assert_eq!(doc.series("r1", "name").expect("untouched").len(), 1);
    }

    #[test]
    fn deleting_last_version_prunes_qualifier_and_row() {
        let mut doc = FamilyDoc::new();
        doc.put("r1", "name", "Alice", 2);
        doc.put("r1", "age", "30", 2);

        doc.delete_version("r1", "name", 1).expect("delete");
        assert!(doc.row("r1").expect("row").get("name").is_none());
        assert!(doc.contains_row("r1"));

        doc.delete_version("r1", "age", 1).expect("delete");
        assert!(!doc.contains_row("r1"));
        assert!(doc.is_empty());
    }

    #[test]
    fn versions_are_not_reassigned_after_deletes() {
        let mut doc = FamilyDoc::new();
        doc.put("r1", "name", "a", 3);
        doc.put("r1", "name", "b", 3);
        doc.delete_version("r1", "name", 2).expect("delete");
        assert_eq!(doc.put("r1", "name", "c", 3), 3);

        doc.delete_version("r1", "name", 1).expect("delete");
        doc.delete_version("r1", "name", 3).expect("delete");
        assert!(!doc.contains_row("r1"));
        assert_eq!(doc.last_version("r1", "name"), 3);
        assert_eq!(doc.put("r1", "name", "d", 3), 4);

        doc.delete_row("r1").expect("row");
        assert_eq!(doc.put("r1", "name", "e", 3), 5);
        assert_eq!(doc.put("r1", "age", "30", 3), 1);
    }

    #[test]
    fn document_shape_is_rows_and_last_versions() {
        let mut doc = FamilyDoc::new();
        doc.put("r1", "name", "Alice", 1);
        doc.put("r1", "name", "Alicia", 1);
        let value = serde_json::to_value(&doc).expect("encode");
        assert_eq!(
            value,
            serde_json::json!({
                "rows": {"r1": {"name": {"2": "Alicia"}}},
                "last_versions": {"r1": {"name": 2}},
            })
        );
        let empty: FamilyDoc = serde_json::from_value(serde_json::json!({})).expect("decode");
        assert!(empty.is_empty());
    }
}
