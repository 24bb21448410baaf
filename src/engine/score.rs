use crate::config::CompiledConfig;
use crate::engine::model::{Candidate, ExtractedField, FieldKind, RawBlock};

/// Aggregate confidence for a block from its extracted fields: identifier
/// presence (+0.4), at least one date (+0.2), keyword density (up to +0.2),
/// and a title taken from a structural heading (+0.2). Clamped to [0, 1].
pub fn confidence(block: &RawBlock, fields: &[ExtractedField], cfg: &CompiledConfig) -> f32 {
    let mut score = 0.0f32;

    if fields.iter().any(|f| f.kind == FieldKind::Identifier) {
        score += 0.4;
    }
    if fields.iter().any(|f| f.kind == FieldKind::Date) {
        score += 0.2;
    }

    let text_lower = block.text().to_lowercase();
    let words = text_lower.split_whitespace().count().max(1);
    let hits = cfg.keyword_hits(&text_lower);
    score += (2.0 * hits as f32 / words as f32).min(0.2);

    if block.heading.is_some() && fields.iter().any(|f| f.kind == FieldKind::Title) {
        score += 0.2;
    }

    score.clamp(0.0, 1.0)
}

/// Drop candidates below the acceptance threshold. A recall/precision knob,
/// not an error path: rejects disappear silently.
pub fn filter(candidates: Vec<Candidate>, threshold: f32) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.confidence >= threshold)
        .collect()
}

// ── Tests ──
