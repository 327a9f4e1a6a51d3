//! Body digests for stored entries.

use sha2::{Digest, Sha256};

/// SHA-256 of a response body, hex encoded.
pub fn body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}
