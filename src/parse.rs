//! Extraction of the raw session documents written by the game.
//!
//! The documents are flat: one `<stats .../>` element holding every scalar as
//! an attribute, plus lists of `<E key=".." value=".."/>` entries for visited
//! biomes and per-enemy kills. A pattern scan is enough to read them.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Values at or above this are treated as "infinite".
pub const NUMERIC_CAP: f64 = 1e15;

static STATS_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<stats\b([^>]*?)/?>").expect("valid regex"));
static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_][\w.\-]*)\s*=\s*"([^"]*)""#).expect("valid regex"));
static BIOMES_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<biomes_visited\b[^>]*>(.*?)</biomes_visited>").expect("valid regex")
});
static KILL_MAP_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<kill_map\b[^>]*>(.*?)</kill_map>").expect("valid regex"));
static ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"<E\b([^>]*?)/?>").expect("valid regex"));

/// The attribute bag of one `<stats>` element plus its visited biomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStats {
    pub attributes: HashMap<String, String>,
    pub biomes: Vec<String>,
}

impl RawStats {
    pub fn text(&self, name: &str) -> &str {
        self.attributes.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn flag(&self, name: &str) -> bool {
        self.text(name).trim() == "1"
    }

    /// Floating-point attribute: missing or garbage is 0, magnitudes are capped.
    pub fn float(&self, name: &str) -> f64 {
        parse_float(self.text(name))
    }

    /// Integer attribute; accepts float text and truncates it.
    pub fn int(&self, name: &str) -> i64 {
        parse_int(self.text(name))
    }
}

pub fn parse_float(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    let lower = text.to_ascii_lowercase();
    if lower.contains("inf") {
        return if lower.starts_with('-') {
            -NUMERIC_CAP
        } else {
            NUMERIC_CAP
        };
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_nan() => 0.0,
        Ok(v) => v.clamp(-NUMERIC_CAP, NUMERIC_CAP),
        Err(_) => 0.0,
    }
}

pub fn parse_int(text: &str) -> i64 {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return v.clamp(-(NUMERIC_CAP as i64), NUMERIC_CAP as i64);
    }
    let v = parse_float(text);
    v.clamp(-NUMERIC_CAP, NUMERIC_CAP).trunc() as i64
}

fn attributes(fragment: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(fragment)
        .map(|cap| (cap[1].to_string(), unescape(&cap[2])))
        .collect()
}

fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn entries(section: &str) -> impl Iterator<Item = HashMap<String, String>> + '_ {
    ENTRY.captures_iter(section).map(|cap| attributes(&cap[1]))
}

/// Parse a `*_stats.xml` document. `None` when the root element is absent.
pub fn parse_stats(document: &str) -> Option<RawStats> {
    let root = STATS_ELEMENT.captures(document)?;
    let attributes = attributes(&root[1]);

    let biomes = BIOMES_SECTION
        .captures(document)
        .map(|section| {
            entries(section.get(1).map_or("", |m| m.as_str()))
                .filter_map(|mut e| e.remove("key"))
                .map(|key| key.trim_start_matches("$biome_").to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Some(RawStats { attributes, biomes })
}

/// Enemy kind -> number killed.
pub type KillBreakdown = BTreeMap<String, u64>;

/// Parse a `*_kills.xml` document. Unreadable entries are dropped.
pub fn parse_kills(document: &str) -> KillBreakdown {
    let mut kills = KillBreakdown::new();
    let Some(section) = KILL_MAP_SECTION.captures(document) else {
        return kills;
    };
    for entry in entries(section.get(1).map_or("", |m| m.as_str())) {
        let Some(key) = entry.get("key") else {
            continue;
        };
        let count = entry.get("value").map_or(0, |v| parse_int(v).max(0) as u64);
        *kills.entry(key.clone()).or_insert(0) += count;
    }
    kills
}
