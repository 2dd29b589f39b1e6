use std::fmt;

use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Opaque digest of a raw summary payload. Only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(raw: &[u8]) -> Self {
        Fingerprint(sha256_hex(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // short form is enough for log lines
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

/// `None` means nothing has been fingerprinted yet, which always counts as a change.
pub fn has_changed(prev: Option<&Fingerprint>, curr: &Fingerprint) -> bool {
    prev != Some(curr)
}
