//! Content fingerprint codec and perceptual similarity
//!
//! Scenes are identified by up to three fingerprints: an MD5 checksum of the
//! file content, an OpenSubtitles-style OSHASH, and a 64-bit perceptual hash
//! of a representative frame. The string form is canonical per algorithm:
//! MD5 and OSHASH are lowercase hex of their natural byte length, and a
//! perceptual hash is the zero-padded 16-character lowercase hex of the
//! 64-bit value reinterpreted as unsigned.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Maximum Hamming distance at which two perceptual hashes count as a match.
///
/// Stash-box does not yet report per-result distance, so the threshold is
/// fixed locally. It remains injectable for the day the registry exposes it.
pub const DEFAULT_PHASH_DISTANCE: u32 = 4;

/// Fingerprint algorithms understood by stash-box registries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerprintAlgorithm {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "OSHASH")]
    Oshash,
    #[serde(rename = "PHASH")]
    Phash,
}

impl FingerprintAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            FingerprintAlgorithm::Md5 => "MD5",
            FingerprintAlgorithm::Oshash => "OSHASH",
            FingerprintAlgorithm::Phash => "PHASH",
        }
    }
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode a perceptual hash in its canonical wire form.
///
/// The signed bit pattern is reinterpreted as unsigned, so negative hashes
/// round-trip: `phash_to_string(-1)` is `"ffffffffffffffff"`.
pub fn phash_to_string(phash: i64) -> String {
    format!("{:016x}", phash as u64)
}

/// Decode a perceptual hash from its canonical wire form.
///
/// Only the exact canonical form is accepted: 16 lowercase hex digits.
/// Anything else fails with [`Error::BadFingerprint`].
pub fn string_to_phash(hash: &str) -> Result<i64> {
    let canonical = hash.len() == 16
        && hash
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !canonical {
        return Err(Error::BadFingerprint {
            algorithm: "PHASH",
            hash: hash.to_string(),
        });
    }

    let value = u64::from_str_radix(hash, 16).map_err(|_| Error::BadFingerprint {
        algorithm: "PHASH",
        hash: hash.to_string(),
    })?;

    Ok(value as i64)
}

/// Hamming distance between two 64-bit perceptual hashes
pub fn distance(a: i64, b: i64) -> u32 {
    (a ^ b).count_ones()
}

/// Whether two perceptual hashes are within `max_distance` bits of each other
pub fn matches_within(a: i64, b: i64, max_distance: u32) -> bool {
    distance(a, b) <= max_distance
}
