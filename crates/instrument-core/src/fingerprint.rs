//! Cache-key contribution.
//!
//! Rewritten units are cached by an external system keyed on the content of
//! the input plus a description of the transform. The transform writes a fixed
//! identifier and its format version into a [`ConfigHasher`]; bumping the
//! version invalidates every previously cached rewritten unit.

use sha2::{Digest, Sha256};

/// Sink for the values that identify a transform configuration.
pub trait ConfigHasher {
    fn put_string(&mut self, value: &str);
    fn put_int(&mut self, value: i32);
}

/// SHA-256 over strings prefixed with their `u64` byte length and
/// little-endian integers.
#[derive(Debug, Clone, Default)]
pub struct Sha256ConfigHasher {
    hasher: Sha256,
}

impl Sha256ConfigHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> [u8; 32] {
        let digest = self.hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..]);
        out
    }

    pub fn finish_hex(self) -> String {
        hex::encode(self.finish())
    }
}

impl ConfigHasher for Sha256ConfigHasher {
    fn put_string(&mut self, value: &str) {
        self.hasher.update((value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
    }

    fn put_int(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }
}
