//! Mapping from installed root directories to package identifiers.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::package::PackageId;

/// Root directory -> optional [`PackageId`].
///
/// Merging is last-writer-wins: on a path collision the right-hand side's
/// identifier replaces the left-hand side's. Equality ignores insertion
/// order. Storing [`PackageId::NONE`] is the same as storing `None`.
///
/// # Examples
///
/// ```
/// use ugcmount::PackageId;
/// use ugcmount::provider::PackagePathMap;
///
/// let mut a = PackagePathMap::new();
/// a.insert("/mods/1", Some(PackageId::new(1)));
/// let mut b = PackagePathMap::new();
/// b.insert("/mods/1", Some(PackageId::new(2)));
///
/// let merged = a + b;
/// assert_eq!(merged.get("/mods/1"), Some(Some(PackageId::new(2))));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePathMap {
    entries: BTreeMap<String, Option<PackageId>>,
}

impl PackagePathMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. Returns the previous identifier, if any.
    pub fn insert(&mut self, path: impl Into<String>, id: Option<PackageId>) -> Option<Option<PackageId>> {
        self.entries
            .insert(path.into(), id.and_then(PackageId::into_option))
    }

    /// Identifier stored for `path`. The outer `Option` is `None` when the
    /// path is not present.
    pub fn get(&self, path: &str) -> Option<Option<PackageId>> {
        self.entries.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<Option<PackageId>> {
        self.entries.remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<PackageId>)> {
        self.entries.iter().map(|(path, id)| (path.as_str(), *id))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Merge `other` into `self`; `other` wins on collisions.
    pub fn merge(&mut self, other: &PackagePathMap) {
        for (path, id) in &other.entries {
            self.entries.insert(path.clone(), *id);
        }
    }

    /// The entry whose root contains `dir`.
    ///
    /// When nested roots both contain `dir`, the deepest one wins.
    pub fn resolve(&self, dir: &Path) -> Option<(&str, Option<PackageId>)> {
        self.entries
            .iter()
            .filter(|(root, _)| dir.starts_with(Path::new(root.as_str())))
            .max_by_key(|(root, _)| Path::new(root.as_str()).components().count())
            .map(|(root, id)| (root.as_str(), *id))
    }
}

impl Add for PackagePathMap {
    type Output = PackagePathMap;

    fn add(mut self, rhs: PackagePathMap) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for PackagePathMap {
    fn add_assign(&mut self, rhs: PackagePathMap) {
        for (path, id) in rhs.entries {
            self.entries.insert(path, id);
        }
    }
}

impl<P: Into<String>> FromIterator<(P, Option<PackageId>)> for PackagePathMap {
    fn from_iter<I: IntoIterator<Item = (P, Option<PackageId>)>>(iter: I) -> Self {
        let mut map = PackagePathMap::new();
        map.extend(iter);
        map
    }
}

impl<P: Into<String>> Extend<(P, Option<PackageId>)> for PackagePathMap {
    fn extend<I: IntoIterator<Item = (P, Option<PackageId>)>>(&mut self, iter: I) {
        for (path, id) in iter {
            self.insert(path, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(raw: i64) -> Option<PackageId> {
        Some(PackageId::new(raw))
    }

    #[test]
    fn test_merge_right_side_wins() {
        let left: PackagePathMap = [("/a", id(1)), ("/b", id(2))].into_iter().collect();
        let right: PackagePathMap = [("/b", id(20)), ("/c", None)].into_iter().collect();

        let merged = left + right;

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("/a"), Some(id(1)));
        assert_eq!(merged.get("/b"), Some(id(20)));
        assert_eq!(merged.get("/c"), Some(None));
        assert_eq!(merged.get("/d"), None);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a: PackagePathMap = [("/x", id(1)), ("/y", None)].into_iter().collect();
        let b: PackagePathMap = [("/y", None), ("/x", id(1))].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sentinel_is_stored_as_none() {
        let mut map = PackagePathMap::new();
        map.insert("/sideload/Red", Some(PackageId::NONE));
        assert_eq!(map.get("/sideload/Red"), Some(None));
    }

    #[test]
    fn test_resolve_prefers_deepest_root() {
        let map: PackagePathMap = [("/mods", None), ("/mods/42", id(42))]
            .into_iter()
            .collect();

        assert_eq!(
            map.resolve(Path::new("/mods/42/Red")),
            Some(("/mods/42", id(42)))
        );
        assert_eq!(map.resolve(Path::new("/mods/7/Blue")), Some(("/mods", None)));
        assert_eq!(map.resolve(Path::new("/other/Blue")), None);
    }

    #[test]
    fn test_resolve_respects_component_boundaries() {
        let map: PackagePathMap = [("/mods/4", id(4))].into_iter().collect();
        assert_eq!(map.resolve(Path::new("/mods/42/Red")), None);
    }

    fn arb_map() -> impl Strategy<Value = PackagePathMap> {
        prop::collection::vec(("[a-d]{1,2}", prop::option::of(0i64..5)), 0..8).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(p, id)| (format!("/{p}"), id.map(PackageId::new)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_merge_is_deterministic(a in arb_map(), b in arb_map()) {
            let first = a.clone() + b.clone();
            let second = a.clone() + b.clone();
            prop_assert_eq!(&first, &second);

            for (path, id) in b.iter() {
                prop_assert_eq!(first.get(path), Some(id));
            }
            for (path, id) in a.iter() {
                if !b.contains(path) {
                    prop_assert_eq!(first.get(path), Some(id));
                }
            }
        }

        #[test]
        fn test_merge_in_place_matches_add(a in arb_map(), b in arb_map()) {
            let mut in_place = a.clone();
            in_place.merge(&b);
            prop_assert_eq!(in_place, a + b);
        }
    }
}
