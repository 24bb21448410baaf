use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::engine::model::{ExtractedField, FieldKind, FieldValue};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});
// North American format: (555) 123-4567, 555-123-4567, 555.123.4567.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]\d{4}\b").unwrap());
// Capitalized name after an explicit contact label only.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Contact|Attn\.?|Attention)\s*:?\s+([A-Z][a-z'-]+(?:\s+[A-Z][a-z'-]+)+)")
        .unwrap()
});

/// Every email, phone, and labeled-name match, verbatim apart from trimming,
/// deduplicated within the block.
pub fn extract(text: &str) -> Vec<ExtractedField> {
    let mut fields = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for m in EMAIL_RE.find_iter(text) {
        let raw = m.as_str().trim().to_string();
        if seen.insert(raw.clone()) {
            fields.push(field(FieldKind::ContactEmail, raw, 0.9));
        }
    }
    for m in PHONE_RE.find_iter(text) {
        let raw = m.as_str().trim().to_string();
        if seen.insert(raw.clone()) {
            fields.push(field(FieldKind::ContactPhone, raw, 0.7));
        }
    }
    for caps in NAME_RE.captures_iter(text) {
        if let Some(name) = caps.get(1) {
            let raw = name.as_str().trim().to_string();
            if seen.insert(raw.clone()) {
                fields.push(field(FieldKind::ContactName, raw, 0.6));
            }
        }
    }
    fields
}

fn field(kind: FieldKind, raw: String, confidence: f32) -> ExtractedField {
    ExtractedField {
        kind,
        raw: raw.clone(),
        value: FieldValue::Text(raw),
        confidence,
    }
}

// ── Tests ──
