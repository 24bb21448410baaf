use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

/// Top-level sources file: `{ "entities": [ ... ] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    pub entities: Vec<EntityConfig>,
}

/// Per-source-entity configuration. Every tuning knob of the extraction
/// engine lives here; the engine itself carries no mutable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Entity-specific solicitation-code patterns, tried before the generic
    /// built-ins and extracted at full confidence.
    #[serde(default)]
    pub identifier_patterns: Vec<String>,
    #[serde(default = "default_keyword_set")]
    pub keyword_set: Vec<String>,
    #[serde(default)]
    pub date_role_keywords: DateRoleKeywords,
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f32,
    #[serde(default = "default_max_block_span")]
    pub max_block_span: usize,
    #[serde(default = "default_min_block_len")]
    pub min_block_len: usize,
    #[serde(default = "default_title_cap")]
    pub title_cap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRoleKeywords {
    #[serde(default = "default_deadline_keywords")]
    pub deadline: Vec<String>,
    #[serde(default = "default_issued_keywords")]
    pub issued: Vec<String>,
}

impl Default for DateRoleKeywords {
    fn default() -> Self {
        Self {
            deadline: default_deadline_keywords(),
            issued: default_issued_keywords(),
        }
    }
}

impl EntityConfig {
    /// Config with all defaults, for entities that need no overrides.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            region: None,
            kind: None,
            active: true,
            identifier_patterns: Vec::new(),
            keyword_set: default_keyword_set(),
            date_role_keywords: DateRoleKeywords::default(),
            acceptance_threshold: default_acceptance_threshold(),
            max_block_span: default_max_block_span(),
            min_block_len: default_min_block_len(),
            title_cap: default_title_cap(),
        }
    }

    /// Compile the entity's patterns and normalize its keyword lists. A
    /// malformed pattern is a hard error here, before any document for this
    /// entity is processed.
    pub fn compile(self) -> Result<CompiledConfig> {
        let mut identifier_patterns = Vec::with_capacity(self.identifier_patterns.len());
        for pat in &self.identifier_patterns {
            let re = Regex::new(pat).with_context(|| {
                format!("invalid identifier pattern {:?} for entity {}", pat, self.id)
            })?;
            identifier_patterns.push(re);
        }

        let keywords = lowercase_all(&self.keyword_set);
        let deadline_keywords = lowercase_all(&self.date_role_keywords.deadline);
        let issued_keywords = lowercase_all(&self.date_role_keywords.issued);

        Ok(CompiledConfig {
            entity: self,
            identifier_patterns,
            keywords,
            deadline_keywords,
            issued_keywords,
        })
    }
}

/// Validated, immutable configuration handed to the engine at entry.
#[derive(Debug)]
pub struct CompiledConfig {
    pub entity: EntityConfig,
    pub identifier_patterns: Vec<Regex>,
    keywords: Vec<String>,
    pub deadline_keywords: Vec<String>,
    pub issued_keywords: Vec<String>,
}

impl CompiledConfig {
    /// Count keyword occurrences in already-lowercased text.
    pub fn keyword_hits(&self, text_lower: &str) -> usize {
        self.keywords
            .iter()
            .map(|kw| text_lower.matches(kw.as_str()).count())
            .sum()
    }

    pub fn contains_keyword(&self, text_lower: &str) -> bool {
        self.keywords.iter().any(|kw| text_lower.contains(kw.as_str()))
    }
}

pub fn load_sources(path: &Path) -> Result<SourcesFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sources file {}", path.display()))?;
    let file: SourcesFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse sources file {}", path.display()))?;
    Ok(file)
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

fn default_true() -> bool {
    true
}

fn default_keyword_set() -> Vec<String> {
    [
        "request for proposal",
        "request for quotation",
        "request for information",
        "rfp",
        "rfq",
        "rfi",
        "bid opportunity",
        "procurement notice",
        "solicitation",
        "tender",
        "invitation to bid",
        "invitation for bids",
        "competitive bidding",
        "contract opportunity",
        "vendor opportunity",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_deadline_keywords() -> Vec<String> {
    ["due", "deadline", "submit by", "submission", "closing", "closes", "expires", "until"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_issued_keywords() -> Vec<String> {
    ["issued", "posted", "released", "release date", "issue date"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_acceptance_threshold() -> f32 {
    0.3
}

fn default_max_block_span() -> usize {
    40
}

fn default_min_block_len() -> usize {
    20
}

fn default_title_cap() -> usize {
    120
}

// ── Tests ──
