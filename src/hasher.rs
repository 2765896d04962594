//! Stable, non-cryptographic digests.
//!
//! [`hash`] turns a target URL into the identifier used as the public short
//! path and as the uniqueness key in the store. It is 32-bit FNV-1a, so
//! identifiers already stored in an existing `links` table keep matching.
//! Collisions are possible and are left to the store's UNIQUE constraint.
//!
//! [`fingerprint`] and [`Fingerprinter`] digest generated artifacts with
//! 64-bit FNV-1a for use as cache-validation tokens.

use const_fnv1a_hash::fnv1a_hash_32;
use fnv::FnvHasher;
use std::hash::Hasher;

/// Derive the 8-hex-digit identifier for `url`.
pub fn hash(url: &str) -> String {
    format!("{:08x}", fnv1a_hash_32(url.as_bytes(), None))
}

/// Digest `bytes` into a 16-hex-digit fingerprint.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut f = Fingerprinter::new();
    f.update(bytes);
    f.finish()
}

/// Streaming form of [`fingerprint`]: feeding the same bytes in any number of
/// chunks yields the same digest.
#[derive(Default)]
pub struct Fingerprinter {
    state: FnvHasher,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.state.write(bytes);
    }

    pub fn finish(&self) -> String {
        format!("{:016x}", self.state.finish())
    }
}
