// Per-cell version series and its retention policy.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Versions of one (row, family, qualifier) cell, keyed by version number.
///
/// Versions are monotonic counters, not timestamps: a put takes one past the
/// highest number ever assigned to the cell, and the lowest number is
/// evicted once the series exceeds the retention cap. Deletes never renumber.
/// The series only holds survivors, so the caller supplies the high-water
/// mark that outlives deletes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionSeries(BTreeMap<u64, String>);

impl VersionSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, version: u64) -> Option<&str> {
        self.0.get(&version).map(String::as_str)
    }

    /// Highest-numbered surviving version.
    pub fn latest(&self) -> Option<(u64, &str)> {
        self.0
            .last_key_value()
            .map(|(version, value)| (*version, value.as_str()))
    }

    pub fn oldest(&self) -> Option<(u64, &str)> {
        self.0
            .first_key_value()
            .map(|(version, value)| (*version, value.as_str()))
    }

    pub fn versions(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (u64, &str)> + '_ {
        self.0
            .iter()
            .map(|(version, value)| (*version, value.as_str()))
    }

    /// Appends `value` as the version after `last_assigned` (or after the
    /// newest survivor, whichever is higher), evicting the oldest entries
    /// while the series holds more than `max_versions`. Returns the new version.
    pub fn put(
        &mut self,
        last_assigned: u64,
        value: impl Into<String>,
        max_versions: u32,
    ) -> u64 {
        let newest = self.0.last_key_value().map_or(0, |(version, _)| *version);
        let next = last_assigned.max(newest) + 1;
        self.0.insert(next, value.into());
        let cap = (max_versions.max(1)) as usize;
        while self.0.len() > cap {
            self.0.pop_first();
        }
        next
    }

    /// Removes exactly `version`. Returns the removed value, `None` if absent.
    pub fn remove(&mut self, version: u64) -> Option<String> {
        self.0.remove(&version)
    }
}

#[cfg(test)]
mod tests {
    use super::VersionSeries;

    #[test]
    fn first_put_is_version_one() {
        let mut series = VersionSeries::new();
        assert_eq!(series.put(0, "a", 3), 1);
        assert_eq!(series.latest(), Some((1, "a")));
    }

    #[test]
    fn retention_keeps_most_recent_contiguous_versions() {
        for max in 1..=4u32 {
            for extra in 0..5u64 {
                let mut series = VersionSeries::new();
                let total = max as u64 + extra;
                for i in 1..=total {
                    assert_eq!(series.put(0, format!("v{i}"), max), i);
                }
                assert_eq!(series.len(), max as usize);
                let versions: Vec<u64> = series.versions().collect();
                let expected: Vec<u64> = (extra + 1..=total).collect();
                assert_eq!(versions, expected, "max={max} extra={extra}");
                assert_eq!(series.get(total), Some(format!("v{total}").as_str()));
            }
        }
    }

    #[test]
    fn remove_does_not_renumber_or_reuse() {
        let mut series = VersionSeries::new();
        series.put(0, "Alice", 2);
        series.put(1, "Alicia", 2);
        series.put(2, "Ali", 2);
        assert_eq!(series.oldest(), Some((2, "Alicia")));

        assert_eq!(series.remove(2).as_deref(), Some("Alicia"));
        assert_eq!(series.remove(2), None);
        assert_eq!(series.iter().collect::<Vec<_>>(), vec![(3, "Ali")]);

        assert_eq!(series.put(3, "Al", 2), 4);
        assert_eq!(series.versions().collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn deleted_newest_version_is_not_reassigned() {
        let mut series = VersionSeries::new();
        let first = series.put(0, "a", 3);
        let second = series.put(first, "b", 3);
        series.remove(second);
        assert_eq!(series.put(second, "c", 3), 3);
        assert_eq!(series.versions().collect::<Vec<_>>(), vec![1, 3]);

        series.remove(1);
        series.remove(3);
        assert!(series.is_empty());
        assert_eq!(series.put(3, "d", 3), 4);
    }

    #[test]
    fn serializes_with_string_version_keys() {
        let mut series = VersionSeries::new();
        series.put(0, "x", 2);
        series.put(1, "y", 2);
        let value = serde_json::to_value(&series).expect("encode");
        assert_eq!(value, serde_json::json!({"1": "x", "2": "y"}));
        let back: VersionSeries = serde_json::from_value(value).expect("decode");
        assert_eq!(back, series);
    }
}
