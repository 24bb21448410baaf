use std::sync::LazyLock;

use regex::Regex;

use crate::config::CompiledConfig;
use crate::engine::extract::identifier;
use crate::engine::model::{ExtractedField, FieldKind, FieldValue, RawBlock};

static DATE_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2}|(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4})",
    )
    .unwrap()
});

/// Pick a title line for the block: its heading if one opened it, else the
/// first descriptive table cell, else the first sentence-like run. Returns at
/// most one field; when none fits, promotion falls back to truncated block
/// text.
pub fn extract(block: &RawBlock, text: &str, cfg: &CompiledConfig) -> Vec<ExtractedField> {
    let cap = cfg.entity.title_cap;

    if let Some(heading) = &block.heading {
        let cleaned = tidy(heading, cap);
        if !cleaned.is_empty() {
            return vec![field(heading, cleaned, 0.9)];
        }
    }

    if block.is_table_row {
        for cell in text.split(" | ") {
            let trimmed = cell.trim();
            if trimmed.chars().count() < 4
                || identifier::contains_identifier(trimmed, cfg)
                || DATE_LIKE_RE.is_match(trimmed)
            {
                continue;
            }
            let cleaned = tidy(trimmed, cap);
            if !cleaned.is_empty() {
                return vec![field(trimmed, cleaned, 0.7)];
            }
        }
        return Vec::new();
    }

    // First sentence-like run of the leading segment.
    let first = match block.segments.first() {
        Some(s) => s.as_str(),
        None => return Vec::new(),
    };
    let sentence = first.split_terminator(". ").next().unwrap_or(first);
    let cleaned = tidy(sentence, cap);
    if cleaned.is_empty() {
        Vec::new()
    } else {
        vec![field(sentence, cleaned, 0.6)]
    }
}

/// Cap to `max` chars and trim trailing punctuation and whitespace.
pub fn tidy(s: &str, max: usize) -> String {
    let capped: String = s.trim().chars().take(max).collect();
    capped
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '-' | '|'))
        .to_string()
}

fn field(raw: &str, cleaned: String, confidence: f32) -> ExtractedField {
    ExtractedField {
        kind: FieldKind::Title,
        raw: raw.to_string(),
        value: FieldValue::Text(cleaned),
        confidence,
    }
}

// ── Tests ──
