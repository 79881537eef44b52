//! Locale helpers.
//!
//! Locales are compared through their fallback candidates: `zh-Hant-TW`
//! yields `zh-Hant-TW`, `zh-Hant` and `zh`. Two locales match when they
//! share at least one candidate.

/// Normalizes separators and casing: `zh_hant_tw` becomes `zh-Hant-TW`.
pub fn canonicalize(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(index, part)| {
            if index == 0 {
                part.to_lowercase()
            } else if part.len() == 4 && part.chars().all(|c| c.is_ascii_alphabetic()) {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase(),
                    None => String::new(),
                }
            } else {
                part.to_uppercase()
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

pub fn candidates(locale: &str) -> Vec<String> {
    let canonical = canonicalize(locale);
    if canonical.is_empty() {
        return Vec::new();
    }

    let parts: Vec<&str> = canonical.split('-').collect();
    (1..=parts.len()).rev().map(|len| parts[..len].join("-")).collect()
}

pub fn matches(first: &str, second: &str) -> bool {
    let first = candidates(first);
    if first.is_empty() {
        return false;
    }
    candidates(second).iter().any(|candidate| first.contains(candidate))
}

/// `None` on either side never matches.
pub fn matches_opt(first: Option<&str>, second: Option<&str>) -> bool {
    match (first, second) {
        (Some(first), Some(second)) => matches(first, second),
        _ => false,
    }
}
