//! `CacheData` (spec §4.9): per-module-class keyed store of previously
//! computed artifacts. One `CacheData` is shared by all instances of a
//! given module-class+version (spec §4.7 step 7).

use parking_lot::RwLock;
use std::collections::HashMap;

use pulsar_hash::Hash;
use pulsar_types::{FromValue, ModuleInfo, OptionMap, PropertyEntry, PulsarError, Result, Value};

use crate::entry::CacheEntry;

/// `parking_lot::RwLock<HashMap<..>>`, linear scan within the (usually
/// short) per-key bucket — spec §4.9: "a simple coarse lock per CacheData
/// is acceptable given typical hit rates; finer-grained sharding is a
/// permitted optimization."
#[derive(Default)]
pub struct CacheData {
    buckets: RwLock<HashMap<String, Vec<CacheEntry>>>,
}

impl CacheData {
    pub fn new() -> Self {
        CacheData::default()
    }

    /// Number of entries matching `key`, regardless of options/aux (spec
    /// §4.9 `count`).
    pub fn count(&self, key: &str) -> usize {
        self.buckets
            .read()
            .get(key)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    /// True if an entry exists whose options match `options` restricted to
    /// `significant_keys` AND whose `aux_hash` matches (spec §4.9
    /// `has_data`).
    pub fn has_data(
        &self,
        key: &str,
        options: &OptionMap,
        significant_keys: &[String],
        aux_hash: Hash,
    ) -> bool {
        self.find(key, options, significant_keys, aux_hash).is_some()
    }

    fn find(
        &self,
        key: &str,
        options: &OptionMap,
        significant_keys: &[String],
        aux_hash: Hash,
    ) -> Option<CacheEntry> {
        let buckets = self.buckets.read();
        let snapshot = options.snapshot();
        buckets.get(key).and_then(|entries| {
            entries
                .iter()
                .find(|e| e.aux_hash == aux_hash && e.option_snapshot.compare_selected(&snapshot, significant_keys))
                .cloned()
        })
    }

    /// Returns a copy of the matching entry's value; `NotFound` if no
    /// match; `TypeMismatch` if the stored type differs from `T` (spec
    /// §4.9 `get<T>`).
    pub fn get<T: FromValue>(
        &self,
        key: &str,
        options: &OptionMap,
        significant_keys: &[String],
        aux_hash: Hash,
    ) -> Result<T> {
        let entry = self
            .find(key, options, significant_keys, aux_hash)
            .ok_or_else(|| PulsarError::not_found(key))?;
        T::from_value(&entry.value.value)
    }

    /// Insert-or-overwrite (spec §4.9 `set`): multiple entries with the
    /// same `key` but different options/aux coexist; duplicate insertion
    /// with identical `(option_snapshot restricted to all declared keys,
    /// aux_hash)` criteria overwrites, last-writer-wins. Significance is
    /// not known at insertion time (it's a per-lookup caller concept, spec
    /// §9), so "identical criteria" here means the *full* option snapshot
    /// plus aux_hash — the narrowest possible notion of "same producing
    /// call" that doesn't require the producer to pre-declare significance.
    pub fn set(&self, key: &str, value: impl Into<Value>, options: &OptionMap, aux_hash: Hash, producer_info: ModuleInfo) {
        let snapshot = options.snapshot();
        let all_keys = options.keys();
        let mut buckets = self.buckets.write();
        let bucket = buckets.entry(key.to_string()).or_default();
        if let Some(existing) = bucket
            .iter_mut()
            .find(|e| e.aux_hash == aux_hash && e.option_snapshot.compare_selected(&snapshot, &all_keys))
        {
            existing.value = PropertyEntry::new(value.into());
            existing.option_snapshot = snapshot;
            existing.producer_info = producer_info;
        } else {
            bucket.push(CacheEntry {
                option_snapshot: snapshot,
                aux_hash,
                value: PropertyEntry::new(value.into()),
                producer_info,
            });
        }
    }

    /// Removes all entries under `key` (spec §4.9 `erase`).
    pub fn erase(&self, key: &str) {
        self.buckets.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsar_hash::hash_one;

    fn opts(tol: f64, screening: bool) -> OptionMap {
        let mut m = OptionMap::new();
        m.declare("tol", tol, false, "", None).unwrap();
        m.declare("screening", screening, false, "", None).unwrap();
        m
    }

    #[test]
    fn cache_hit_respects_significant_keys() {
        let cache = CacheData::new();
        let producer_opts = opts(1e-6, true);
        let h = hash_one(&"bs1,bs2".to_string());
        cache.set(
            "ints",
            42i64,
            &producer_opts,
            h,
            ModuleInfo::new("Ints", "T", "", "1.0"),
        );

        let consumer_opts = opts(1e-6, false);
        let significant = vec!["tol".to_string()];
        assert!(cache.has_data("ints", &consumer_opts, &significant, h));
        assert_eq!(cache.get::<i64>("ints", &consumer_opts, &significant, h).unwrap(), 42);

        let mismatched_tol = opts(1e-8, false);
        assert!(!cache.has_data("ints", &mismatched_tol, &significant, h));
        assert!(matches!(
            cache.get::<i64>("ints", &mismatched_tol, &significant, h),
            Err(PulsarError::NotFound { .. })
        ));
    }

    #[test]
    fn distinct_aux_hash_coexists() {
        let cache = CacheData::new();
        let producer_opts = opts(1e-6, true);
        let h1 = hash_one(&"a".to_string());
        let h2 = hash_one(&"b".to_string());
        cache.set("ints", 1i64, &producer_opts, h1, ModuleInfo::new("I", "T", "", "1.0"));
        cache.set("ints", 2i64, &producer_opts, h2, ModuleInfo::new("I", "T", "", "1.0"));
        assert_eq!(cache.count("ints"), 2);
        let keys: Vec<String> = producer_opts.keys();
        assert_eq!(cache.get::<i64>("ints", &producer_opts, &keys, h1).unwrap(), 1);
        assert_eq!(cache.get::<i64>("ints", &producer_opts, &keys, h2).unwrap(), 2);
    }

    #[test]
    fn set_with_identical_criteria_overwrites() {
        let cache = CacheData::new();
        let producer_opts = opts(1e-6, true);
        let h = hash_one(&"x".to_string());
        cache.set("ints", 1i64, &producer_opts, h, ModuleInfo::new("I", "T", "", "1.0"));
        cache.set("ints", 2i64, &producer_opts, h, ModuleInfo::new("I", "T", "", "1.0"));
        assert_eq!(cache.count("ints"), 1);
        let keys = producer_opts.keys();
        assert_eq!(cache.get::<i64>("ints", &producer_opts, &keys, h).unwrap(), 2);
    }

    #[test]
    fn erase_drops_all_entries_for_key() {
        let cache = CacheData::new();
        let producer_opts = opts(1e-6, true);
        let h = hash_one(&"x".to_string());
        cache.set("ints", 1i64, &producer_opts, h, ModuleInfo::new("I", "T", "", "1.0"));
        cache.erase("ints");
        assert_eq!(cache.count("ints"), 0);
    }
}
