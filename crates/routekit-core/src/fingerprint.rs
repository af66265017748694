//! Content-stable digest used for every cache fingerprint

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a fingerprint (128 bits)
const FINGERPRINT_BYTES: usize = 16;

/// Hash `input` into a 32 character lowercase hex fingerprint
///
/// SHA-256 truncated to its first 128 bits. Equal inputs always produce
/// equal fingerprints across processes and platforms.
pub fn digest(input: &str) -> String {
    let hash = Sha256::digest(input.as_bytes());
    hex::encode(&hash[..FINGERPRINT_BYTES])
}
