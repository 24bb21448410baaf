use std::sync::LazyLock;

use regex::Regex;

use crate::config::CompiledConfig;
use crate::engine::model::{ExtractedField, FieldKind, FieldValue};

/// Generic solicitation-code patterns, applied after any entity-specific
/// ones. The code body must carry a digit so bare words never match.
static GENERIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?i:RFP|RFQ|RFI|ITB|IFB)[#:\s-]{0,3}[A-Z0-9][A-Z0-9-]*\d[A-Z0-9-]*",
        r"\b(?i:Solicitation)\s+(?i:No\.?|Number|#)\s*:?\s*[A-Z0-9][A-Z0-9-]*\d[A-Z0-9-]*",
        r"\b(?i:Bid)\s+(?i:No\.?|Number|#)\s*:?\s*[A-Z0-9][A-Z0-9-]*\d[A-Z0-9-]*",
        r"\b(?i:Project)\s+(?i:No\.?|Number|#)\s*:?\s*[A-Z0-9][A-Z0-9-]*\d[A-Z0-9-]*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// First match wins: entity-specific patterns at confidence 1.0, then the
/// generic set at 0.7. Returns at most one field.
pub fn extract(text: &str, cfg: &CompiledConfig) -> Vec<ExtractedField> {
    for re in &cfg.identifier_patterns {
        if let Some(m) = re.find(text) {
            return vec![field(m.as_str(), 1.0)];
        }
    }
    for re in GENERIC_PATTERNS.iter() {
        if let Some(m) = re.find(text) {
            return vec![field(m.as_str(), 0.7)];
        }
    }
    Vec::new()
}

pub fn contains_identifier(text: &str, cfg: &CompiledConfig) -> bool {
    cfg.identifier_patterns.iter().any(|re| re.is_match(text))
        || GENERIC_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Canonical form used as the dedup key: uppercase, dots stripped, separator
/// runs collapsed to a single hyphen. "RFP # 2025-014" and "RFP-2025-014"
/// normalize identically.
pub fn normalize(raw: &str) -> String {
    let upper = raw.trim().to_uppercase().replace('.', "");
    let mut out = String::with_capacity(upper.len());
    let mut pending_sep = false;
    for c in upper.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

fn field(raw: &str, confidence: f32) -> ExtractedField {
    ExtractedField {
        kind: FieldKind::Identifier,
        raw: raw.trim().to_string(),
        value: FieldValue::Text(normalize(raw)),
        confidence,
    }
}

// ── Tests ──
