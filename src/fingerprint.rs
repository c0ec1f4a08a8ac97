//! Canonical fingerprinting.
//!
//! A fingerprint identifies a slot's observable state (partition, range,
//! payload) without comparing field by field; the persistence gateway uses it
//! to detect that a pre-fetched impacted list went stale before a diff is
//! applied. Serialization is canonical as long as fingerprinted types keep
//! their fields in declaration order and use `BTreeMap` where a map is needed.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Compute the xxh64 fingerprint of a value's canonical JSON bytes.
pub fn fingerprint<T: Serialize>(value: &T) -> u64 {
    let bytes = serde_json::to_vec(value).expect("canonical serialization failed");
    xxh64(&bytes, 0)
}
