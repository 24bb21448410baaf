use scraper::{ElementRef, Html};

use crate::config::CompiledConfig;
use crate::engine::model::{DocumentContent, ParsedDocument};

/// Structural hint attached to each text-bearing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeHint {
    Heading { level: u8 },
    TableRow { header: bool },
    ListItem,
    Paragraph { keyword_container: bool },
    PdfLine { page: u32, heading_like: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub text: String,
    pub hint: NodeHint,
}

impl Node {
    pub fn is_heading(&self) -> bool {
        matches!(
            self.hint,
            NodeHint::Heading { .. } | NodeHint::PdfLine { heading_like: true, .. }
        )
    }

    pub fn page(&self) -> Option<u32> {
        match self.hint {
            NodeHint::PdfLine { page, .. } => Some(page),
            _ => None,
        }
    }
}

/// Flatten a parsed document into an ordered sequence of text nodes. Pure
/// transformation: an empty or unusable document yields an empty sequence,
/// never an error.
pub fn normalize(doc: &ParsedDocument, cfg: &CompiledConfig) -> Vec<Node> {
    match &doc.content {
        DocumentContent::Html(html) => normalize_html(html, cfg),
        DocumentContent::PdfText(text) => normalize_pdf(text),
    }
}

// ── HTML ──

const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "svg", "head", "iframe"];
const BLOCK_TAGS: &[&str] = &[
    "body", "div", "p", "section", "article", "main", "header", "footer", "nav", "aside", "table",
    "ul", "ol", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "form", "dl", "pre",
];

/// Class/id tokens that mark a container as procurement-related, from the
/// common vocabulary of utility procurement portals.
const CLASS_HINTS: &[&str] = &[
    "rfp",
    "rfq",
    "rfi",
    "bid",
    "bids",
    "tender",
    "tenders",
    "procurement",
    "opportunity",
    "opportunities",
    "solicitation",
    "solicitations",
];

fn normalize_html(html: &str, cfg: &CompiledConfig) -> Vec<Node> {
    let dom = Html::parse_document(html);
    let mut out = Vec::new();
    walk(dom.root_element(), cfg, false, &mut out);
    out
}

fn walk(el: ElementRef, cfg: &CompiledConfig, keyworded: bool, out: &mut Vec<Node>) {
    let name = el.value().name();
    if SKIP_TAGS.contains(&name) {
        return;
    }

    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let text = element_text(el);
            if !text.is_empty() {
                let level = name.as_bytes()[1] - b'0';
                out.push(Node {
                    text,
                    hint: NodeHint::Heading { level },
                });
            }
        }
        "table" => {
            for row in descendants_named(el, "tr") {
                let mut cells = Vec::new();
                let mut saw_td = false;
                for cell in child_elements(row) {
                    match cell.value().name() {
                        "td" => saw_td = true,
                        "th" => {}
                        _ => continue,
                    }
                    let text = element_text(cell);
                    if !text.is_empty() {
                        cells.push(text);
                    }
                }
                if !cells.is_empty() {
                    out.push(Node {
                        text: cells.join(" | "),
                        hint: NodeHint::TableRow { header: !saw_td },
                    });
                }
            }
        }
        "ul" | "ol" => {
            for item in child_elements(el) {
                if item.value().name() != "li" {
                    continue;
                }
                let text = element_text(item);
                if !text.is_empty() {
                    out.push(Node {
                        text,
                        hint: NodeHint::ListItem,
                    });
                }
            }
        }
        _ => {
            let keyworded = keyworded
                || (matches!(name, "div" | "section" | "article") && has_keyword_attr(el, cfg));
            if has_block_child(el) {
                for child in child_elements(el) {
                    walk(child, cfg, keyworded, out);
                }
            } else {
                let text = element_text(el);
                if !text.is_empty() {
                    out.push(Node {
                        text,
                        hint: NodeHint::Paragraph {
                            keyword_container: keyworded,
                        },
                    });
                }
            }
        }
    }
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn descendants_named<'a>(el: ElementRef<'a>, name: &str) -> Vec<ElementRef<'a>> {
    let mut out = Vec::new();
    let mut stack: Vec<ElementRef> = child_elements(el).collect();
    stack.reverse();
    while let Some(e) = stack.pop() {
        if e.value().name() == name {
            out.push(e);
        } else {
            let mut children: Vec<ElementRef> = child_elements(e).collect();
            children.reverse();
            stack.extend(children);
        }
    }
    out
}

fn has_block_child(el: ElementRef) -> bool {
    child_elements(el).any(|c| BLOCK_TAGS.contains(&c.value().name()))
}

fn has_keyword_attr(el: ElementRef, cfg: &CompiledConfig) -> bool {
    let mut tokens: Vec<String> = Vec::new();
    for class in el.value().classes() {
        tokens.extend(split_tokens(class));
    }
    if let Some(id) = el.value().attr("id") {
        tokens.extend(split_tokens(id));
    }
    tokens
        .iter()
        .any(|t| CLASS_HINTS.contains(&t.as_str()) || cfg.contains_keyword(t))
}

fn split_tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn element_text(el: ElementRef) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── PDF text ──

fn normalize_pdf(text: &str) -> Vec<Node> {
    let mut out = Vec::new();
    for (page_idx, page) in text.split('\u{0c}').enumerate() {
        let lines: Vec<&str> = page.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let next_blank = lines
                .get(i + 1)
                .map(|l| l.trim().is_empty())
                .unwrap_or(true);
            out.push(Node {
                text: collapse_ws(trimmed),
                hint: NodeHint::PdfLine {
                    page: page_idx as u32 + 1,
                    heading_like: next_blank && looks_like_heading(trimmed),
                },
            });
        }
    }
    out
}

/// Emphasis is unavailable in plain text, so a heading is approximated as a
/// short line in all caps or title case.
fn looks_like_heading(line: &str) -> bool {
    if line.len() >= 80 || !line.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    let all_caps = !line.chars().any(|c| c.is_lowercase());
    let title_case = line.split_whitespace().all(|w| {
        w.chars()
            .next()
            .map(|c| !c.is_alphabetic() || c.is_uppercase())
            .unwrap_or(true)
    });
    all_caps || title_case
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntityConfig;
    use crate::engine::model::DocumentContent;

    fn cfg() -> CompiledConfig {
        EntityConfig::new("test", "Test Utility").compile().unwrap()
    }

    fn html_doc(html: &str) -> ParsedDocument {
        ParsedDocument {
            content: DocumentContent::Html(html.to_string()),
            source_url: "https://example.com/bids".to_string(),
            entity_id: "test".to_string(),
        }
    }

    fn pdf_doc(text: &str) -> ParsedDocument {
        ParsedDocument {
            content: DocumentContent::PdfText(text.to_string()),
            source_url: "https://example.com/rfp.pdf".to_string(),
            entity_id: "test".to_string(),
        }
    }

    #[test]
    fn table_rows_become_nodes() {
        let doc = html_doc(
            "<table>\
             <tr><th>Number</th><th>Title</th></tr>\
             <tr><td>RFP-2025-014</td><td>Substation Upgrade</td></tr>\
             </table>",
        );
        let nodes = normalize(&doc, &cfg());
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].hint, NodeHint::TableRow { header: true });
        assert_eq!(nodes[1].hint, NodeHint::TableRow { header: false });
        assert_eq!(nodes[1].text, "RFP-2025-014 | Substation Upgrade");
    }

    #[test]
    fn list_items_become_nodes() {
        let doc = html_doc("<ul><li>RFQ-88 Pole Inspection</li><li>RFP-12 Meters</li></ul>");
        let nodes = normalize(&doc, &cfg());
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.hint == NodeHint::ListItem));
    }

    #[test]
    fn headings_carry_level() {
        let doc = html_doc("<h2>Current Solicitations</h2><p>None at this time.</p>");
        let nodes = normalize(&doc, &cfg());
        assert_eq!(nodes[0].hint, NodeHint::Heading { level: 2 });
        assert_eq!(nodes[0].text, "Current Solicitations");
    }

    #[test]
    fn keyword_class_marks_container() {
        let doc = html_doc(r#"<div class="rfp-listing"><p>Grid work proposal</p></div>"#);
        let nodes = normalize(&doc, &cfg());
        assert_eq!(
            nodes[0].hint,
            NodeHint::Paragraph {
                keyword_container: true
            }
        );
    }

    #[test]
    fn script_and_style_skipped() {
        let doc = html_doc("<script>var x = 1;</script><style>p{}</style><p>visible</p>");
        let nodes = normalize(&doc, &cfg());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text, "visible");
    }

    #[test]
    fn pdf_pages_and_headings() {
        let doc = pdf_doc("REQUEST FOR PROPOSALS\n\nbody text on page one\n\x0cpage two line");
        let nodes = normalize(&doc, &cfg());
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[0].hint,
            NodeHint::PdfLine {
                page: 1,
                heading_like: true
            }
        );
        assert_eq!(nodes[1].page(), Some(1));
        assert_eq!(nodes[2].page(), Some(2));
    }

    #[test]
    fn long_caps_line_is_not_a_heading() {
        let line = "A".repeat(100);
        assert!(!looks_like_heading(&line));
    }

    #[test]
    fn empty_inputs_yield_empty_sequences() {
        assert!(normalize(&html_doc(""), &cfg()).is_empty());
        assert!(normalize(&pdf_doc("  \n \n"), &cfg()).is_empty());
    }
}
