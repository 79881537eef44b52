//! Storage keys for subdivision groups.
//!
//! A group holds the direct children of one parent path
//! (`[country_code, code_1, code_2, ..]`). Subdivision codes can be in any
//! script, so the codes below the country are hashed:
//!
//! ```text
//! ["US"]                                  -> "US"
//! ["CN", "Taiwan Sheng"]                  -> "CN-<hash>"
//! ["CN", "Taiwan Sheng", "Taichung City"] -> "CN--<hash>"
//! ```
//!
//! The number of dashes equals the nesting depth below the country.

use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest.
pub const HASH_LENGTH: usize = 12;

pub fn hash_codes(codes: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(codes.join("-").as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..HASH_LENGTH].to_string()
}

/// The group key for `parents`, or `None` for an empty path.
pub fn group_key(parents: &[String]) -> Option<String> {
    let (country_code, codes) = parents.split_first()?;
    if codes.is_empty() {
        return Some(country_code.clone());
    }
    Some(format!(
        "{}{}{}",
        country_code,
        "-".repeat(codes.len()),
        hash_codes(codes)
    ))
}

/// Depth below the country encoded in a group key.
pub fn key_depth(group_key: &str) -> usize {
    let trimmed = group_key.trim_end_matches(|c: char| c.is_ascii_hexdigit());
    trimmed.chars().rev().take_while(|c| *c == '-').count()
}

pub fn storage_path(group_key: &str) -> String {
    format!("subdivision/{}.json", group_key)
}
