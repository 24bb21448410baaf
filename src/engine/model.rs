use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Html,
    Pdf,
}

/// Already-materialized document input. Fetching, rendering and PDF-to-text
/// conversion happen upstream; the engine only sees the result.
#[derive(Debug, Clone)]
pub enum DocumentContent {
    /// Raw HTML, parsed into a DOM by the normalizer.
    Html(String),
    /// Plain text extracted from a PDF, pages separated by form feeds.
    PdfText(String),
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub content: DocumentContent,
    pub source_url: String,
    pub entity_id: String,
}

impl ParsedDocument {
    pub fn kind(&self) -> SourceKind {
        match self.content {
            DocumentContent::Html(_) => SourceKind::Html,
            DocumentContent::PdfText(_) => SourceKind::Pdf,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DateRole {
    Deadline,
    Issued,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Active,
    Closed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct OpportunityDate {
    pub date: NaiveDate,
    pub role: DateRole,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Contact {
    Email(String),
    Phone(String),
    Name(String),
}

/// A structurally-delimited span of document text, as produced by the block
/// detector. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    /// Text segments in document order (table cells, lines, paragraphs).
    pub segments: Vec<String>,
    /// Heading line for this block, when one opened it.
    pub heading: Option<String>,
    pub is_table_row: bool,
    /// Page number for PDF-sourced blocks.
    pub page: Option<u32>,
    /// Node index range [start, end) in the normalized sequence.
    pub span: (usize, usize),
    pub source_url: String,
}

impl RawBlock {
    pub fn text(&self) -> String {
        self.segments.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Identifier,
    Title,
    Date,
    ContactEmail,
    ContactPhone,
    ContactName,
    Description,
    Status,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(OpportunityDate),
    Status(Status),
}

/// Tagged value produced by one extractor: the raw matched substring plus a
/// normalized value and the extractor's local confidence in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedField {
    pub kind: FieldKind,
    pub raw: String,
    pub value: FieldValue,
    pub confidence: f32,
}

/// Provisional opportunity: one block plus its extracted fields. Dropped by
/// the threshold filter or promoted to an `Opportunity`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub block: RawBlock,
    pub fields: Vec<ExtractedField>,
    pub confidence: f32,
}

impl Candidate {
    pub fn first_field(&self, kind: FieldKind) -> Option<&ExtractedField> {
        self.fields.iter().find(|f| f.kind == kind)
    }

    pub fn has_field(&self, kind: FieldKind) -> bool {
        self.fields.iter().any(|f| f.kind == kind)
    }
}

/// The canonical record handed to the reporting layer. Immutable after merge;
/// merging two opportunities always builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub title: String,
    pub identifier: Option<String>,
    pub dates: BTreeSet<OpportunityDate>,
    pub description: String,
    pub contacts: BTreeSet<Contact>,
    pub status: Status,
    pub source_url: String,
    pub source_kind: SourceKind,
    pub entity_id: String,
    pub confidence: f32,
}
