pub mod contacts;
pub mod dates;
pub mod identifier;
pub mod status;
pub mod title;

use crate::config::CompiledConfig;
use crate::engine::model::{ExtractedField, FieldKind, FieldValue, RawBlock};

/// Chars of block text kept as the opportunity description.
const DESCRIPTION_CAP: usize = 500;

/// Limited surrounding context for a block, used only for date-role
/// disambiguation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockContext<'a> {
    pub prev_line: Option<&'a str>,
    pub next_line: Option<&'a str>,
}

/// Run every extractor over one block. Extractors are independent and pure;
/// each returns zero or more fields and never fails on no-match.
pub fn run(block: &RawBlock, ctx: &BlockContext, cfg: &CompiledConfig) -> Vec<ExtractedField> {
    let text = block.text();
    let mut fields = Vec::new();
    fields.extend(identifier::extract(&text, cfg));
    fields.extend(dates::extract(&text, ctx, cfg));
    fields.extend(title::extract(block, &text, cfg));
    fields.extend(contacts::extract(&text));
    fields.extend(status::extract(&text));

    let description: String = text.chars().take(DESCRIPTION_CAP).collect();
    let description = description.trim().to_string();
    if !description.is_empty() {
        fields.push(ExtractedField {
            kind: FieldKind::Description,
            raw: description.clone(),
            value: FieldValue::Text(description),
            confidence: 1.0,
        });
    }

    fields
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntityConfig;

    #[test]
    fn table_row_yields_all_field_kinds() {
        let cfg = EntityConfig::new("test", "Test Utility").compile().unwrap();
        let block = RawBlock {
            segments: vec![
                "RFP-2025-014 | Substation Upgrade | Due: Dec 1, 2025 | buyer@utility.com"
                    .to_string(),
            ],
            heading: None,
            is_table_row: true,
            page: None,
            span: (0, 1),
            source_url: "https://example.com".to_string(),
        };
        let fields = run(&block, &BlockContext::default(), &cfg);
        let kinds: Vec<FieldKind> = fields.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&FieldKind::Identifier));
        assert!(kinds.contains(&FieldKind::Date));
        assert!(kinds.contains(&FieldKind::Title));
        assert!(kinds.contains(&FieldKind::ContactEmail));
        assert!(kinds.contains(&FieldKind::Description));
    }

    #[test]
    fn extraction_is_idempotent() {
        let cfg = EntityConfig::new("test", "Test Utility").compile().unwrap();
        let block = RawBlock {
            segments: vec!["Open RFQ 88 for pole inspection, due 2025-11-30".to_string()],
            heading: None,
            is_table_row: false,
            page: Some(1),
            span: (3, 4),
            source_url: "https://example.com/rfp.pdf".to_string(),
        };
        let a = run(&block, &BlockContext::default(), &cfg);
        let b = run(&block, &BlockContext::default(), &cfg);
        assert_eq!(a, b);
    }
}
