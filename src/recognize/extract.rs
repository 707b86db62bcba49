//! Tag extraction: pure text mining over raw OCR output.
//!
//! Every rule is a pure function (`&str -> String`) over the recognised
//! text, all matching case-insensitive and best-effort. A rule that finds
//! nothing returns its explicit placeholder rather than failing, so the
//! whole extraction composes into a filename no matter how garbled the
//! scan was. Each rule is independently testable without an OCR engine.

use once_cell::sync::Lazy;
use regex::Regex;

/// Exporter names the packing room ships for. Matched as whole words.
const KNOWN_EXPORTERS: [&str; 4] = ["agrosur", "frutex", "tropimar", "andifresh"];

/// Product keywords, most specific first.
const KNOWN_PRODUCTS: [&str; 6] = ["mango", "avocado", "pineapple", "papaya", "banana", "lime"];

/// Structured tags mined from the label text.
///
/// Every field is always populated; "unknown"/"unspecified" are explicit
/// values, not absences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTags {
    pub importer: String,
    pub exporter: String,
    pub weight: String,
    pub product: String,
    pub size: String,
    pub grade: String,
}

/// Mine all six tags from raw OCR text.
pub fn extract_tags(text: &str) -> LabelTags {
    LabelTags {
        importer: extract_importer(text),
        exporter: extract_exporter(text),
        weight: extract_weight(text),
        product: extract_product(text),
        size: extract_size(text),
        grade: extract_grade(text),
    }
}

impl LabelTags {
    /// Render the tags as a sanitized `.pdf` filename.
    pub fn filename(&self) -> String {
        let joined = format!(
            "{}_{}_{}_{}_{}_{}",
            self.importer, self.exporter, self.product, self.weight, self.size, self.grade
        );
        format!("{}.pdf", sanitize(&joined))
    }
}

/// Keep lowercase alphanumerics, collapse everything else to underscores.
fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_sep = true;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    out.trim_end_matches('_').to_string()
}

// ── Importer: "IMPORTED BY" marker, else first plausible line ────────────

static RE_IMPORTED_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^.*imported\s+by[:\s]+(.+)$").unwrap());

fn extract_importer(text: &str) -> String {
    if let Some(caps) = RE_IMPORTED_BY.captures(text) {
        let name = caps[1].trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    // first line with at least three letters in a row
    static RE_PLAUSIBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{3,}").unwrap());
    text.lines()
        .map(str::trim)
        .find(|l| RE_PLAUSIBLE.is_match(l))
        .map(|l| l.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// ── Exporter: fixed keyword set ──────────────────────────────────────────

fn extract_exporter(text: &str) -> String {
    let lower = text.to_lowercase();
    KNOWN_EXPORTERS
        .iter()
        .find(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// ── Weight: number followed by a mass unit ───────────────────────────────

static RE_WEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+(?:[.,]\d+)?)\s*(kg|kgs|lb|lbs|oz|g)\b").unwrap());

fn extract_weight(text: &str) -> String {
    RE_WEIGHT
        .captures(text)
        .map(|caps| format!("{}{}", caps[1].replace(',', "."), caps[2].to_lowercase()))
        .unwrap_or_else(|| "unspecified".to_string())
}

// ── Product: fixed keyword sets, else generic ────────────────────────────

fn extract_product(text: &str) -> String {
    let lower = text.to_lowercase();
    KNOWN_PRODUCTS
        .iter()
        .find(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string())
        .unwrap_or_else(|| "label".to_string())
}

// ── Size: single-letter size codes from fixed tokens ─────────────────────

static RE_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsize\s*[:\-]?\s*(XL|[SML])\b").unwrap());

fn extract_size(text: &str) -> String {
    RE_SIZE
        .captures(text)
        .map(|caps| caps[1].to_lowercase())
        .unwrap_or_else(|| "unspecified".to_string())
}

// ── Grade: fixed grade markers ───────────────────────────────────────────

static RE_GRADE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:class\s*(I{1,2}|1|2)|grade\s*([AB])|(premium))\b").unwrap());

fn extract_grade(text: &str) -> String {
    if let Some(caps) = RE_GRADE.captures(text) {
        if let Some(class) = caps.get(1) {
            let n = match class.as_str().to_uppercase().as_str() {
                "I" | "1" => "1",
                _ => "2",
            };
            return format!("class{n}");
        }
        if let Some(grade) = caps.get(2) {
            return format!("grade{}", grade.as_str().to_lowercase());
        }
        if caps.get(3).is_some() {
            return "premium".to_string();
        }
    }
    "unknown".to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────
