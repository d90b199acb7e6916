//! Partition routing.

use sha2::{Digest, Sha256};

/// Partition for `key` among `partitions`.
///
/// Stable across processes and releases: SHA-256 of the key, first four
/// bytes big-endian, modulo the partition count.
#[must_use]
pub fn partition_for(key: &str, partitions: u32) -> u32 {
    if partitions <= 1 {
        return 0;
    }
    let digest = Sha256::digest(key.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    prefix % partitions
}
