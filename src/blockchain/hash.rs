use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest in bytes
pub const HASH_SIZE: usize = 32;

/// Length of a hex-encoded SHA-256 digest
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Computes the SHA-256 hash of the input and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Feeds an ordered list of fields into a single SHA-256 state.
///
/// Every field is prefixed with its length, so two different field lists
/// never produce the same byte stream.
#[derive(Clone, Default)]
pub struct DigestBuilder {
    hasher: Sha256,
}

impl DigestBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        DigestBuilder {
            hasher: Sha256::new(),
        }
    }

    /// Appends one field to the digest input
    pub fn field(mut self, data: impl AsRef<[u8]>) -> Self {
        let data = data.as_ref();
        self.hasher.update((data.len() as u64).to_le_bytes());
        self.hasher.update(data);
        self
    }

    /// Consumes the builder and returns the hex digest
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Counts the leading `'0'` hex digits of a digest
pub fn leading_zero_digits(hash: &str) -> usize {
    hash.chars().take_while(|c| *c == '0').count()
}
