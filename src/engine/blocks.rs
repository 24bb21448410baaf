use crate::config::CompiledConfig;
use crate::engine::extract::identifier;
use crate::engine::model::RawBlock;
use crate::engine::normalize::{Node, NodeHint};

/// Partition the normalized node sequence into candidate blocks, one per
/// plausible opportunity. Table rows and list items map to one block each;
/// free text is segmented at heading, identifier, and keyword boundaries,
/// capped at `max_block_span` nodes. Table segmentation wins inside keyworded
/// regions by construction, since rows arrive as distinct nodes.
pub fn detect(nodes: &[Node], cfg: &CompiledConfig, source_url: &str) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenBlock> = None;

    for (i, node) in nodes.iter().enumerate() {
        match node.hint {
            NodeHint::TableRow { header } => {
                flush(&mut open, &mut blocks, cfg, source_url);
                if !header {
                    blocks_push(
                        &mut blocks,
                        cfg,
                        RawBlock {
                            segments: vec![node.text.clone()],
                            heading: None,
                            is_table_row: true,
                            page: None,
                            span: (i, i + 1),
                            source_url: source_url.to_string(),
                        },
                    );
                }
            }
            NodeHint::ListItem => {
                flush(&mut open, &mut blocks, cfg, source_url);
                blocks_push(
                    &mut blocks,
                    cfg,
                    RawBlock {
                        segments: vec![node.text.clone()],
                        heading: None,
                        is_table_row: false,
                        page: None,
                        span: (i, i + 1),
                        source_url: source_url.to_string(),
                    },
                );
            }
            _ => {
                let at_capacity = open
                    .as_ref()
                    .map(|o| o.segments.len() >= cfg.entity.max_block_span)
                    .unwrap_or(false);
                if is_boundary(node, cfg) || at_capacity {
                    flush(&mut open, &mut blocks, cfg, source_url);
                }
                let o = open.get_or_insert_with(|| OpenBlock {
                    start: i,
                    heading: node.is_heading().then(|| node.text.clone()),
                    page: node.page(),
                    segments: Vec::new(),
                });
                o.segments.push(node.text.clone());
            }
        }
    }

    flush(&mut open, &mut blocks, cfg, source_url);
    blocks
}

struct OpenBlock {
    start: usize,
    heading: Option<String>,
    page: Option<u32>,
    segments: Vec<String>,
}

fn is_boundary(node: &Node, cfg: &CompiledConfig) -> bool {
    if node.is_heading() {
        return true;
    }
    if matches!(
        node.hint,
        NodeHint::Paragraph {
            keyword_container: true
        }
    ) {
        return true;
    }
    cfg.contains_keyword(&node.text.to_lowercase()) || identifier::contains_identifier(&node.text, cfg)
}

fn flush(
    open: &mut Option<OpenBlock>,
    blocks: &mut Vec<RawBlock>,
    cfg: &CompiledConfig,
    source_url: &str,
) {
    if let Some(o) = open.take() {
        let end = o.start + o.segments.len();
        blocks_push(
            blocks,
            cfg,
            RawBlock {
                segments: o.segments,
                heading: o.heading,
                is_table_row: false,
                page: o.page,
                span: (o.start, end),
                source_url: source_url.to_string(),
            },
        );
    }
}

/// Blocks below the minimum content length are never RawBlocks.
fn blocks_push(blocks: &mut Vec<RawBlock>, cfg: &CompiledConfig, block: RawBlock) {
    if block.text().chars().count() >= cfg.entity.min_block_len {
        blocks.push(block);
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntityConfig;

    fn cfg() -> CompiledConfig {
        EntityConfig::new("test", "Test Utility").compile().unwrap()
    }

    fn row(text: &str, header: bool) -> Node {
        Node {
            text: text.to_string(),
            hint: NodeHint::TableRow { header },
        }
    }

    fn pdf_line(text: &str, page: u32, heading_like: bool) -> Node {
        Node {
            text: text.to_string(),
            hint: NodeHint::PdfLine { page, heading_like },
        }
    }

    #[test]
    fn table_rows_one_block_each_header_skipped() {
        let nodes = vec![
            row("Number | Title | Due", true),
            row("RFP-2025-014 | Substation Upgrade | Due: Dec 1, 2025", false),
            row("RFQ-88 | Pole Inspection Services | Due: Jan 5, 2026", false),
        ];
        let blocks = detect(&nodes, &cfg(), "https://example.com");
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.is_table_row));
        assert_eq!(blocks[0].span, (1, 2));
    }

    #[test]
    fn keyword_boundaries_segment_free_text() {
        let mut nodes = vec![pdf_line("Request for Proposal: substation upgrade work", 1, false)];
        nodes.extend((0..3).map(|_| pdf_line("general body text without markers", 1, false)));
        nodes.push(pdf_line("RFQ for pole inspection services", 1, false));
        nodes.extend((0..3).map(|_| pdf_line("more body text for the second notice", 1, false)));
        let blocks = detect(&nodes, &cfg(), "https://example.com");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].segments.len(), 4);
        assert_eq!(blocks[1].segments.len(), 4);
    }

    #[test]
    fn identifier_hit_starts_a_block() {
        let nodes = vec![
            pdf_line("introductory text with nothing of note", 1, false),
            pdf_line("RFP-2025-014 covers the substation work", 1, false),
        ];
        let blocks = detect(&nodes, &cfg(), "https://example.com");
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].text().contains("RFP-2025-014"));
    }

    #[test]
    fn heading_becomes_block_heading() {
        let nodes = vec![
            pdf_line("SUBSTATION UPGRADE PROJECT", 1, true),
            pdf_line("details of the project follow here", 1, false),
        ];
        let blocks = detect(&nodes, &cfg(), "https://example.com");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].heading.as_deref(), Some("SUBSTATION UPGRADE PROJECT"));
        assert_eq!(blocks[0].page, Some(1));
    }

    #[test]
    fn short_blocks_discarded() {
        let nodes = vec![row("x | y", false)];
        assert!(detect(&nodes, &cfg(), "https://example.com").is_empty());
    }

    #[test]
    fn max_span_bounds_block_size() {
        let mut entity = EntityConfig::new("test", "Test");
        entity.max_block_span = 5;
        let cfg = entity.compile().unwrap();
        let nodes: Vec<Node> = (0..12)
            .map(|i| pdf_line(&format!("unmarked line number {} of running text", i), 1, false))
            .collect();
        let blocks = detect(&nodes, &cfg, "https://example.com");
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| b.segments.len() <= 5));
    }

    #[test]
    fn detection_is_idempotent() {
        let nodes = vec![
            row("RFP-1001 | Transformer Replacement | Due 2025-11-30", false),
            pdf_line("Open solicitation for grid telemetry services", 1, false),
            pdf_line("contact procurement@example.com for details", 1, false),
        ];
        let cfg = cfg();
        let a = detect(&nodes, &cfg, "https://example.com");
        let b = detect(&nodes, &cfg, "https://example.com");
        assert_eq!(a, b);
    }
}
