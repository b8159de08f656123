//! # Tag / Locale Annotator
//!
//! Static lookup from free-text locations to a canonical short code and a
//! decorative flag marker, plus hashtag derivation from raw tag lists.
//!
//! - Location lookup is exact after trimming and Unicode lowercasing.
//! - Unknown locations yield no code and an empty marker, never an error.
//! - Hashtags share one namespace prefix so channel readers can filter on it.

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::collections::HashMap;

/// Namespace prefix of every derived hashtag.
pub const HASHTAG_PREFIX: &str = "#fr_";

/// Maximum number of hashtags derived from a tag list.
pub const MAX_HASHTAGS: usize = 5;

/// Canonical code and marker for a known place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub code: &'static str,
    pub flag: &'static str,
}

static LOCALES: Lazy<HashMap<&'static str, Locale>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for (name, code, flag) in [
        ("usa", "US", "🇺🇸"),
        ("united states", "US", "🇺🇸"),
        ("us", "US", "🇺🇸"),
        ("canada", "CA", "🇨🇦"),
        ("ca", "CA", "🇨🇦"),
        ("eu", "EU", "🇪🇺"),
        ("european union", "EU", "🇪🇺"),
        ("europe", "EU", "🇪🇺"),
        ("netherlands", "EU", "🇪🇺"),
        ("spain", "EU", "🇪🇺"),
        ("uk", "GB", "🇬🇧"),
        ("united kingdom", "GB", "🇬🇧"),
        ("great britain", "GB", "🇬🇧"),
        ("gb", "GB", "🇬🇧"),
        ("russia", "RU", "🇷🇺"),
        ("pl", "PL", "🇵🇱"),
        ("poland", "PL", "🇵🇱"),
        ("in", "IN", "🇮🇳"),
        ("india", "IN", "🇮🇳"),
        ("br", "BR", "🇧🇷"),
        ("brazil", "BR", "🇧🇷"),
        ("lu", "LU", "🇱🇺"),
        ("luxembourg", "LU", "🇱🇺"),
        ("china", "CN", "🇨🇳"),
        ("shanghai", "CN", "🇨🇳"),
        ("hk", "CN", "🇨🇳"),
        ("world", "WW", "🌍"),
        ("worldwide", "WW", "🌍"),
        ("anywhere", "WW", "🌍"),
        ("anywhere in the world", "WW", "🌍"),
        ("global", "WW", "🌍"),
        ("москва", "RU", "🇷🇺"),
        ("санкт-петербург", "RU", "🇷🇺"),
        ("омск", "RU", "🇷🇺"),
        ("уфа", "RU", "🇷🇺"),
        ("нижний новгород", "RU", "🇷🇺"),
        ("тюмень", "RU", "🇷🇺"),
        ("пермь", "RU", "🇷🇺"),
        ("тбилиси", "GE", "🇬🇪"),
        ("грузия", "GE", "🇬🇪"),
        ("минск", "BY", "🇧🇾"),
        ("кипр", "CY", "🇨🇾"),
        ("лимассол", "CY", "🇨🇾"),
        ("сербия", "RS", "🇷🇸"),
        ("белград", "RS", "🇷🇸"),
    ] {
        m.insert(name, Locale { code, flag });
    }
    m
});

/// Look up a free-text location. `None` for empty or unknown input.
pub fn locale_for(location: Option<&str>) -> Option<Locale> {
    let key = location?.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    LOCALES.get(key.as_str()).copied()
}

/// Flag marker for a location; empty string when unknown.
pub fn flag_for(location: Option<&str>) -> &'static str {
    locale_for(location).map(|l| l.flag).unwrap_or("")
}

/// Normalize one tag fragment: trim, lowercase, drop spaces, prefix.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let clean: String = tag
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if clean.is_empty() {
        None
    } else {
        Some(format!("{HASHTAG_PREFIX}{clean}"))
    }
}

/// Derive hashtags from raw tag strings.
///
/// Each string is split on `,`, `&`, `/` and the word "and"; fragments are
/// normalized, duplicates dropped, and the result capped at [`MAX_HASHTAGS`].
pub fn derive_hashtags<S: AsRef<str>>(raw_tags: &[S]) -> Vec<String> {
    static RE_SPLIT: OnceCell<Regex> = OnceCell::new();
    let re = RE_SPLIT.get_or_init(|| Regex::new(r"(?i)[,&/]|\s+and\s+").unwrap());

    let mut out: Vec<String> = Vec::new();
    for raw in raw_tags {
        for part in re.split(raw.as_ref()) {
            if let Some(tag) = normalize_tag(part) {
                if !out.contains(&tag) {
                    out.push(tag);
                }
            }
        }
    }
    out.truncate(MAX_HASHTAGS);
    out
}

/// Location hashtag first, then tag-derived hashtags (without repeats).
pub fn hashtags_with_location<S: AsRef<str>>(location: Option<&str>, raw_tags: &[S]) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(tag) = location.and_then(normalize_tag) {
        out.push(tag);
    }
    for tag in derive_hashtags(raw_tags) {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
