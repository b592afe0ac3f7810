use twox_hash::XxHash64;
use std::hash::Hasher;

use crate::hash::Hash;

/// Second-stream seed, chosen as the 64-bit golden-ratio constant used by
/// substrate's `Twox128` to decorrelate the two halves of a concatenated
/// 128-bit hash built from a 64-bit hasher run twice.
const SECOND_STREAM_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// A streaming, content-addressable archive. Feed it references to
/// serializable values and call [`HashableArchive::finish`] to obtain a
/// stable 128-bit [`Hash`].
///
/// Internally this runs two independent 64-bit xxHash streams over the same
/// byte sequence (one seeded `0`, one seeded [`SECOND_STREAM_SEED`]) and
/// concatenates their digests. Nothing is ever materialized as a standalone
/// byte buffer; every `feed_*` call writes straight into both hashers.
pub struct HashableArchive {
    lo: XxHash64,
    hi: XxHash64,
}

impl Default for HashableArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl HashableArchive {
    pub fn new() -> Self {
        HashableArchive {
            lo: XxHash64::with_seed(0),
            hi: XxHash64::with_seed(SECOND_STREAM_SEED),
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        self.lo.write(bytes);
        self.hi.write(bytes);
    }

    /// Feed a raw byte slice, with no length prefix. Used by the leaf
    /// `feed_*` helpers below; prefer those over calling this directly.
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        self.write(bytes);
    }

    pub fn feed_bool(&mut self, v: bool) {
        self.write(&[v as u8]);
    }

    pub fn feed_i64(&mut self, v: i64) {
        self.write(&v.to_le_bytes());
    }

    pub fn feed_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn feed_f64(&mut self, v: f64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Length prefix then raw bytes, per the contract in spec §4.1.
    pub fn feed_str(&mut self, v: &str) {
        self.feed_u64(v.len() as u64);
        self.write(v.as_bytes());
    }

    /// Length prefix then element-wise `feed`, for any ordered sequence of
    /// a [`Hashable`] element type.
    pub fn feed_seq<T: Hashable>(&mut self, items: &[T]) {
        self.feed_u64(items.len() as u64);
        for item in items {
            item.feed(self);
        }
    }

    /// A named-value pair: the name is a serialization convenience and is
    /// discarded, only the value is fed (spec §4.1).
    pub fn feed_named<T: Hashable>(&mut self, _name: &str, value: &T) {
        value.feed(self);
    }

    /// Feed any [`Hashable`] value directly.
    pub fn feed<T: Hashable>(&mut self, value: &T) {
        value.feed(self);
    }

    /// Consume the archive and produce the final 128-bit fingerprint.
    pub fn finish(self) -> Hash {
        Hash::from_halves(self.lo.finish(), self.hi.finish())
    }
}

/// Implemented by any value that can be fed into a [`HashableArchive`].
///
/// Implementers must be deterministic: the same logical value must always
/// feed the same bytes, regardless of process or architecture endianness
/// assumptions baked into the `feed_*` helpers above (all multi-byte
/// primitives are fed little-endian explicitly).
pub trait Hashable {
    fn feed(&self, archive: &mut HashableArchive);
}

impl Hashable for bool {
    fn feed(&self, archive: &mut HashableArchive) {
        archive.feed_bool(*self);
    }
}

impl Hashable for i64 {
    fn feed(&self, archive: &mut HashableArchive) {
        archive.feed_i64(*self);
    }
}

impl Hashable for u64 {
    fn feed(&self, archive: &mut HashableArchive) {
        archive.feed_u64(*self);
    }
}

impl Hashable for f64 {
    fn feed(&self, archive: &mut HashableArchive) {
        archive.feed_f64(*self);
    }
}

impl Hashable for String {
    fn feed(&self, archive: &mut HashableArchive) {
        archive.feed_str(self);
    }
}

impl Hashable for str {
    fn feed(&self, archive: &mut HashableArchive) {
        archive.feed_str(self);
    }
}

impl<T: Hashable> Hashable for Vec<T> {
    fn feed(&self, archive: &mut HashableArchive) {
        archive.feed_u64(self.len() as u64);
        for item in self {
            item.feed(archive);
        }
    }
}

impl<T: Hashable> Hashable for [T] {
    fn feed(&self, archive: &mut HashableArchive) {
        archive.feed_u64(self.len() as u64);
        for item in self {
            item.feed(archive);
        }
    }
}

/// Convenience: hash a single value in one call.
pub fn hash_one<T: Hashable + ?Sized>(value: &T) -> Hash {
    let mut archive = HashableArchive::new();
    value.feed(&mut archive);
    archive.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stability_across_independent_archives() {
        let v = vec!["alpha".to_string(), "beta".to_string()];
        let h1 = hash_one(&v);
        let h2 = hash_one(&v);
        assert_eq!(h1, h2);
    }

    #[test]
    fn distinct_values_usually_differ() {
        // Non-cryptographic: collisions are not guaranteed impossible, but a
        // small fixed corpus should not collide in practice.
        let corpus: Vec<String> = (0..256).map(|i| format!("option-{i}")).collect();
        let mut hashes: Vec<_> = corpus.iter().map(|s| hash_one(s)).collect();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), corpus.len());
    }

    #[test]
    fn named_pair_ignores_name() {
        let mut a1 = HashableArchive::new();
        a1.feed_named("tol", &1i64);
        let mut a2 = HashableArchive::new();
        a2.feed_named("completely_different_name", &1i64);
        assert_eq!(a1.finish(), a2.finish());
    }

    #[test]
    fn length_prefix_disambiguates_sequences() {
        // Without a length prefix, ["ab", "c"] and ["a", "bc"] could collide
        // when concatenated naively.
        let seq1 = vec!["ab".to_string(), "c".to_string()];
        let seq2 = vec!["a".to_string(), "bc".to_string()];
        assert_ne!(hash_one(&seq1), hash_one(&seq2));
    }
}
