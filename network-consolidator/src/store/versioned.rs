//! Multi-version entity store.
//!
//! Source files describe the same logical entity (a stop, a route, a shape
//! fragment) many times, each time for a different validity period. The store
//! keeps one list of versions per key and guarantees that, after every
//! successful insert, versions under the same key cover disjoint days.

use std::collections::HashMap;
use std::hash::Hash;

use crate::calendar::ServiceCalendar;

/// Error from store operations that indicate a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A version with no valid day can never be observed.
    #[error("cannot store a version with an empty calendar")]
    EmptyCalendar,
}

/// One version of an entity: its payload and the days it applies on.
#[derive(Debug, Clone, PartialEq)]
pub struct Version<V> {
    pub value: V,
    pub calendar: ServiceCalendar,
}

/// Result of [`VersionedStore::add_or_merge_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// No stored version overlapped; the new one was appended.
    Appended,

    /// The new calendar was folded into an existing, equivalent version.
    /// `absorbed` counts other overlapping versions folded in as well.
    Merged { absorbed: usize },

    /// An overlapping version is not equivalent; nothing was stored.
    /// `existing` is the calendar of the first such version.
    Conflict { existing: ServiceCalendar },
}

impl AddOutcome {
    /// True unless the version was rejected as a conflict.
    pub fn is_stored(&self) -> bool {
        !matches!(self, AddOutcome::Conflict { .. })
    }
}

/// Result of [`VersionedStore::find_or_default`].
#[derive(Debug, PartialEq)]
pub enum Lookup<'a, V> {
    /// A version valid on every queried day.
    Exact(&'a Version<V>),

    /// Versions exist, but none covers the queried days. The returned one
    /// is the first overlapping version, or the first version if none
    /// overlaps.
    OtherPeriod(&'a Version<V>),

    /// Nothing is stored under the key.
    Missing,
}

impl<'a, V> Lookup<'a, V> {
    /// True only for [`Lookup::Exact`].
    pub fn found(&self) -> bool {
        matches!(self, Lookup::Exact(_))
    }

    /// The returned version, whether exact or not.
    pub fn version(&self) -> Option<&'a Version<V>> {
        match *self {
            Lookup::Exact(v) | Lookup::OtherPeriod(v) => Some(v),
            Lookup::Missing => None,
        }
    }
}

/// A store of calendar-disjoint versions, keyed by composite key.
///
/// # Examples
///
/// ```
/// use network_consolidator::calendar::ServiceCalendar;
/// use network_consolidator::store::{AddOutcome, VersionedStore};
///
/// let cal = |s: &str| ServiceCalendar::from_bitmap_str(s).unwrap();
/// let mut store: VersionedStore<u32, &str> = VersionedStore::new();
///
/// let same = |a: &&str, b: &&str| a == b;
/// assert_eq!(store.add_or_merge_version(7, "A", cal("1100"), same).unwrap(), AddOutcome::Appended);
/// assert!(store.add_or_merge_version(7, "A", cal("0110"), same).unwrap().is_stored());
/// assert_eq!(store.find(&7)[0].calendar, cal("1110"));
///
/// // Different payload on overlapping days is rejected
/// assert!(!store.add_or_merge_version(7, "B", cal("0010"), same).unwrap().is_stored());
/// ```
#[derive(Debug, Clone)]
pub struct VersionedStore<K, V> {
    entries: HashMap<K, Vec<Version<V>>>,
}

impl<K, V> Default for VersionedStore<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> VersionedStore<K, V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a version, merging it into an equivalent overlapping one.
    ///
    /// `equivalent(existing, new)` decides whether two payloads may share a
    /// version. It only needs to compare the fields whose divergence matters:
    /// on a merge the existing payload survives and `value` is discarded.
    ///
    /// Every stored version overlapping `calendar` must be equivalent to
    /// `value`, otherwise the outcome is a conflict and the store is left
    /// untouched. When several equivalent versions overlap, the first one
    /// absorbs the others so that calendars stay disjoint.
    pub fn add_or_merge_version<F>(
        &mut self,
        key: K,
        value: V,
        calendar: ServiceCalendar,
        mut equivalent: F,
    ) -> Result<AddOutcome, StoreError>
    where
        F: FnMut(&V, &V) -> bool,
    {
        if calendar.is_empty() {
            return Err(StoreError::EmptyCalendar);
        }

        let versions = self.entries.entry(key).or_default();

        let overlapping: Vec<usize> = versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.calendar.intersects(&calendar))
            .map(|(i, _)| i)
            .collect();

        if let Some(&clash) = overlapping
            .iter()
            .find(|&&i| !equivalent(&versions[i].value, &value))
        {
            return Ok(AddOutcome::Conflict {
                existing: versions[clash].calendar.clone(),
            });
        }

        let Some((&target, rest)) = overlapping.split_first() else {
            versions.push(Version { value, calendar });
            return Ok(AddOutcome::Appended);
        };

        let mut merged = calendar;
        // Remove from the back so earlier indices stay valid.
        for &i in rest.iter().rev() {
            let absorbed = versions.remove(i);
            merged.union_with(&absorbed.calendar);
        }
        versions[target].calendar.union_with(&merged);

        Ok(AddOutcome::Merged {
            absorbed: rest.len(),
        })
    }

    /// Find the version that applies on every day of `calendar`.
    pub fn find_or_default(&self, key: &K, calendar: &ServiceCalendar) -> Lookup<'_, V> {
        let versions = self.find(key);

        if let Some(v) = versions.iter().find(|v| calendar.is_subset_of(&v.calendar)) {
            return Lookup::Exact(v);
        }

        versions
            .iter()
            .find(|v| v.calendar.intersects(calendar))
            .or_else(|| versions.first())
            .map_or(Lookup::Missing, Lookup::OtherPeriod)
    }

    /// All versions stored under `key`.
    pub fn find(&self, key: &K) -> &[Version<V>] {
        self.entries.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Mutable access to the versions under `key`.
    ///
    /// Callers may update payloads but must not make calendars overlap.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut [Version<V>]> {
        self.entries.get_mut(key).map(|v| v.as_mut_slice())
    }

    /// True if at least one version exists under `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        !self.find(key).is_empty()
    }

    /// Iterate over all keys with their versions.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[Version<V>])> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k, v.as_slice()))
    }

    /// Iterate over keys that have at least one version.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Number of keys with at least one version.
    pub fn key_count(&self) -> usize {
        self.iter().count()
    }

    /// Total number of stored versions.
    pub fn version_count(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.version_count() == 0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn calendar() -> impl Strategy<Value = ServiceCalendar> {
        prop::collection::vec(any::<bool>(), 1..12).prop_map(ServiceCalendar::from_iter)
    }

    proptest! {
        /// Stored versions under one key never overlap
        #[test]
        fn versions_stay_disjoint(
            inserts in prop::collection::vec((0u8..3, calendar()), 0..20)
        ) {
            let mut store: VersionedStore<&str, u8> = VersionedStore::new();
            for (payload, calendar) in inserts {
                let _ = store.add_or_merge_version("K", payload, calendar, |a, b| a == b);
            }

            let versions = store.find(&"K");
            for (i, a) in versions.iter().enumerate() {
                for b in &versions[i + 1..] {
                    prop_assert!(!a.calendar.intersects(&b.calendar));
                }
            }
        }

        /// A stored insert is always observable on its days
        #[test]
        fn stored_insert_is_found(
            first in calendar(),
            second in calendar(),
        ) {
            let mut store: VersionedStore<u8, u8> = VersionedStore::new();
            let _ = store.add_or_merge_version(0, 1, first, |a, b| a == b);
            let outcome = store.add_or_merge_version(0, 1, second.clone(), |a, b| a == b);

            if let Ok(outcome) = outcome {
                prop_assert!(outcome.is_stored());
                prop_assert!(store.find_or_default(&0, &second).found());
            }
        }
    }
}
