pub mod blocks;
pub mod extract;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod score;

use tracing::debug;

use crate::config::CompiledConfig;
use extract::BlockContext;
use model::{
    Candidate, Contact, FieldKind, FieldValue, Opportunity, OpportunityDate, ParsedDocument,
    Status,
};

/// Heuristic extraction pipeline for one source entity:
/// normalize → detect blocks → extract fields → score → filter, then a
/// cross-document merge at [`ExtractionEngine::aggregate`].
pub struct ExtractionEngine {
    cfg: CompiledConfig,
}

impl ExtractionEngine {
    pub fn new(cfg: CompiledConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CompiledConfig {
        &self.cfg
    }

    /// Scored candidates for one document, before threshold filtering.
    /// Deterministic and pure: same input, same candidates.
    pub fn candidates(&self, doc: &ParsedDocument) -> Vec<Candidate> {
        let nodes = normalize::normalize(doc, &self.cfg);
        let blocks = blocks::detect(&nodes, &self.cfg, &doc.source_url);
        debug!(
            url = %doc.source_url,
            nodes = nodes.len(),
            blocks = blocks.len(),
            "detected candidate blocks"
        );

        let mut out = Vec::with_capacity(blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            let ctx = BlockContext {
                prev_line: i
                    .checked_sub(1)
                    .and_then(|p| blocks[p].segments.first())
                    .map(|s| s.as_str()),
                next_line: blocks
                    .get(i + 1)
                    .and_then(|b| b.segments.first())
                    .map(|s| s.as_str()),
            };
            let fields = extract::run(block, &ctx, &self.cfg);
            let confidence = score::confidence(block, &fields, &self.cfg);
            out.push(Candidate {
                block: block.clone(),
                fields,
                confidence,
            });
        }
        out
    }

    /// Full per-document pass. An empty or unusable document yields an empty
    /// list, never an error.
    pub fn process_document(&self, doc: &ParsedDocument) -> Vec<Opportunity> {
        let candidates = self.candidates(doc);
        let total = candidates.len();
        let kept = score::filter(candidates, self.cfg.entity.acceptance_threshold);
        debug!(
            url = %doc.source_url,
            kept = kept.len(),
            dropped = total - kept.len(),
            "filtered candidates"
        );
        kept.into_iter().map(|c| self.promote(c, doc)).collect()
    }

    /// Join point for one entity after all documents are processed:
    /// dedup/merge into canonical records with a deterministic order.
    pub fn aggregate(&self, found: Vec<Opportunity>) -> Vec<Opportunity> {
        merge::merge_all(found)
    }

    fn promote(&self, candidate: Candidate, doc: &ParsedDocument) -> Opportunity {
        let mut title = None;
        let mut identifier = None;
        let mut dates = std::collections::BTreeSet::new();
        let mut contacts = std::collections::BTreeSet::new();
        let mut status = Status::Unknown;
        let mut description = String::new();

        for field in &candidate.fields {
            match (field.kind, &field.value) {
                (FieldKind::Title, FieldValue::Text(t)) if title.is_none() => {
                    title = Some(t.clone());
                }
                (FieldKind::Identifier, FieldValue::Text(id)) if identifier.is_none() => {
                    identifier = Some(id.clone());
                }
                (FieldKind::Date, FieldValue::Date(d)) => {
                    dates.insert(OpportunityDate { date: d.date, role: d.role });
                }
                (FieldKind::ContactEmail, FieldValue::Text(e)) => {
                    contacts.insert(Contact::Email(e.clone()));
                }
                (FieldKind::ContactPhone, FieldValue::Text(p)) => {
                    contacts.insert(Contact::Phone(p.clone()));
                }
                (FieldKind::ContactName, FieldValue::Text(n)) => {
                    contacts.insert(Contact::Name(n.clone()));
                }
                (FieldKind::Status, FieldValue::Status(s)) => {
                    status = *s;
                }
                (FieldKind::Description, FieldValue::Text(d)) => {
                    description = d.clone();
                }
                _ => {}
            }
        }

        let title = title.unwrap_or_else(|| {
            extract::title::tidy(&candidate.block.text(), self.cfg.entity.title_cap)
        });

        Opportunity {
            title,
            identifier,
            dates,
            description,
            contacts,
            status,
            source_url: doc.source_url.clone(),
            source_kind: doc.kind(),
            entity_id: doc.entity_id.clone(),
            confidence: candidate.confidence,
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntityConfig;
    use crate::engine::model::{DateRole, DocumentContent, SourceKind};
    use chrono::NaiveDate;

    fn engine() -> ExtractionEngine {
        ExtractionEngine::new(EntityConfig::new("citypower", "City Power & Light").compile().unwrap())
    }

    fn html_doc(html: &str) -> ParsedDocument {
        ParsedDocument {
            content: DocumentContent::Html(html.to_string()),
            source_url: "https://citypower.example/bids".to_string(),
            entity_id: "citypower".to_string(),
        }
    }

    fn pdf_doc(text: &str) -> ParsedDocument {
        ParsedDocument {
            content: DocumentContent::PdfText(text.to_string()),
            source_url: "https://citypower.example/docs/rfq-88.pdf".to_string(),
            entity_id: "citypower".to_string(),
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    #[test]
    fn table_row_yields_full_opportunity() {
        let doc = html_doc(
            "<table>\
             <tr><th>Number</th><th>Title</th><th>Deadline</th></tr>\
             <tr><td>RFP-2025-014</td><td>Substation Upgrade</td><td>Due: Dec 1, 2025</td></tr>\
             </table>",
        );
        let opps = engine().process_document(&doc);
        assert_eq!(opps.len(), 1);
        let opp = &opps[0];
        assert_eq!(opp.identifier.as_deref(), Some("RFP-2025-014"));
        assert!(opp.title.contains("Substation Upgrade"));
        let dates: Vec<_> = opp.dates.iter().collect();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].date, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(dates[0].role, DateRole::Deadline);
    }

    #[test]
    fn archived_block_is_closed_with_no_dates() {
        let doc = html_doc(
            "<ul><li>RFP-2019-02 Street Lighting Retrofit (archived)</li></ul>",
        );
        let opps = engine().process_document(&doc);
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].status, Status::Closed);
        assert!(opps[0].dates.is_empty());
    }

    #[test]
    fn below_threshold_block_is_dropped() {
        let doc = html_doc(
            "<ul><li>Bid opportunity announcements are posted on this page periodically throughout the year.</li></ul>",
        );
        let eng = engine();
        let candidates = eng.candidates(&doc);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].confidence < 0.3);
        assert!(eng.process_document(&doc).is_empty());
    }

    #[test]
    fn oversized_keyworded_page_splits_into_three_blocks() {
        let mut text = String::new();
        for name in ["substation upgrade", "pole inspection", "grid telemetry"] {
            text.push_str(&format!("Request for proposal covering {}\n", name));
            for i in 0..19 {
                text.push_str(&format!("continuation line {} describing scope and terms\n", i));
            }
        }
        let eng = engine();
        let nodes = normalize::normalize(&pdf_doc(&text), eng.config());
        let found = blocks::detect(&nodes, eng.config(), "https://citypower.example/big.pdf");
        assert_eq!(found.len(), 3);
        assert!(found
            .iter()
            .all(|b| b.segments.len() <= eng.config().entity.max_block_span));
    }

    #[test]
    fn pipeline_is_idempotent() {
        let doc = html_doc(&fixture("city_bids.html"));
        let eng = engine();
        assert_eq!(eng.candidates(&doc), eng.candidates(&doc));
    }

    #[test]
    fn raising_threshold_never_adds_opportunities() {
        let doc = html_doc(&fixture("city_bids.html"));
        let mut counts = Vec::new();
        for threshold in [0.1f32, 0.3, 0.6, 0.9] {
            let mut entity = EntityConfig::new("citypower", "City Power & Light");
            entity.acceptance_threshold = threshold;
            let eng = ExtractionEngine::new(entity.compile().unwrap());
            counts.push(eng.process_document(&doc).len());
        }
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert!(engine().process_document(&html_doc("")).is_empty());
        assert!(engine().process_document(&pdf_doc("")).is_empty());
    }

    #[test]
    fn html_fixture_extracts_expected_records() {
        let eng = engine();
        let opps = eng.aggregate(eng.process_document(&html_doc(&fixture("city_bids.html"))));
        assert!(opps.len() >= 2);
        let ids: Vec<_> = opps.iter().filter_map(|o| o.identifier.as_deref()).collect();
        assert!(ids.contains(&"RFP-2025-014"));
        assert!(ids.contains(&"RFQ-88"));
        let substation = opps
            .iter()
            .find(|o| o.identifier.as_deref() == Some("RFP-2025-014"))
            .unwrap();
        assert!(substation.title.contains("Substation"));
        assert!(substation
            .dates
            .iter()
            .any(|d| d.role == DateRole::Deadline));
    }

    #[test]
    fn pdf_title_wins_cross_document_merge() {
        let eng = engine();
        let mut found = eng.process_document(&html_doc(&fixture("city_bids.html")));
        found.extend(eng.process_document(&pdf_doc(&fixture("grid_upgrade_rfq.txt"))));
        let merged = eng.aggregate(found);

        let rfq: Vec<_> = merged
            .iter()
            .filter(|o| o.identifier.as_deref() == Some("RFQ-88"))
            .collect();
        assert_eq!(rfq.len(), 1, "HTML and PDF records must collapse to one");
        assert_eq!(rfq[0].source_kind, SourceKind::Pdf);
        assert!(rfq[0].title.to_lowercase().contains("request for quotation"));
        assert!(rfq[0]
            .contacts
            .iter()
            .any(|c| matches!(c, Contact::Email(e) if e == "procurement@citypower.example")));
        assert!(rfq[0]
            .contacts
            .iter()
            .any(|c| matches!(c, Contact::Name(n) if n == "Dana Whitfield")));
        assert!(rfq[0].dates.iter().any(|d| d.role == DateRole::Issued));
        assert!(rfq[0].dates.iter().any(|d| d.role == DateRole::Deadline));
    }
}
