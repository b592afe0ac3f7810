//! `CacheEntry` (spec §3): one previously computed artifact, keyed by
//! `(modulekey, option_selection, aux_hash)`.

use pulsar_hash::Hash;
use pulsar_types::{ModuleInfo, OptionSnapshot, PropertyEntry};

/// One record in a [`crate::data::CacheData`] bucket. `option_snapshot` is
/// the *restriction* the producer declared significant at insertion time —
/// comparison against a consumer's options always goes through
/// `OptionSnapshot::compare_selected` with the consumer's own
/// `significant_keys` (spec §3 invariant: "lookup matches only when
/// option_snapshot compares equal *restricted to the caller-supplied
/// significant-keys set*").
#[derive(Clone)]
pub struct CacheEntry {
    pub option_snapshot: OptionSnapshot,
    pub aux_hash: Hash,
    pub value: PropertyEntry,
    pub producer_info: ModuleInfo,
}
