//! Checksums identifying streaming runs.

use sha2::{Digest, Sha256};

use crate::models::{Body, DateRange};

/// SHA-256 of `content`, hex encoded.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Key under which the cursor of a run is stored.
///
/// Two runs share a key exactly when they cover the same range with the same
/// step over the same bodies in the same order.
pub fn run_key(range: &DateRange, bodies: &[Body]) -> String {
    let names: Vec<&str> = bodies.iter().map(|b| b.name.as_str()).collect();
    let content = format!(
        "{}|{}|{}|{}",
        range.start,
        range.end,
        range.step_days,
        names.join(",")
    );
    calculate_checksum(&content)
}
