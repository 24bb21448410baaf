use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::config::EntityConfig;
use crate::engine::model::{Contact, DateRole, Opportunity, Status};

/// Aggregated extraction results for one source entity, paired with the
/// entity metadata the report formats carry through.
pub struct EntityReport {
    pub entity: EntityConfig,
    pub opportunities: Vec<Opportunity>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    total: usize,
    opportunities: Vec<JsonRecord<'a>>,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    entity: &'a str,
    region: Option<&'a str>,
    kind: Option<&'a str>,
    #[serde(flatten)]
    opportunity: &'a Opportunity,
}

pub fn render_json(results: &[EntityReport]) -> Result<String> {
    let opportunities: Vec<JsonRecord> = results
        .iter()
        .flat_map(|r| {
            r.opportunities.iter().map(|opp| JsonRecord {
                entity: &r.entity.name,
                region: r.entity.region.as_deref(),
                kind: r.entity.kind.as_deref(),
                opportunity: opp,
            })
        })
        .collect();

    let report = JsonReport {
        generated_at: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        total: opportunities.len(),
        opportunities,
    };
    serde_json::to_string_pretty(&report).context("failed to serialize JSON report")
}

/// Detailed markdown report, one section per entity.
pub fn render_markdown(results: &[EntityReport]) -> String {
    let total: usize = results.iter().map(|r| r.opportunities.len()).sum();
    let mut out = String::new();
    let _ = writeln!(out, "# Procurement Opportunity Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "Total opportunities: {}", total);

    for r in results {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", entity_heading(&r.entity));
        if r.opportunities.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "No opportunities found.");
            continue;
        }
        for opp in &r.opportunities {
            let _ = writeln!(out);
            let _ = writeln!(out, "### {}", opp.title);
            let _ = writeln!(out);
            if let Some(id) = &opp.identifier {
                let _ = writeln!(out, "- **Identifier**: {}", id);
            }
            let _ = writeln!(out, "- **Status**: {}", status_label(opp.status));
            for d in &opp.dates {
                let _ = writeln!(
                    out,
                    "- **{}**: {}",
                    date_role_label(d.role),
                    d.date.format("%Y-%m-%d")
                );
            }
            for c in &opp.contacts {
                let (label, value) = contact_parts(c);
                let _ = writeln!(out, "- **{}**: {}", label, value);
            }
            let _ = writeln!(out, "- **Confidence**: {:.2}", opp.confidence);
            let _ = writeln!(out, "- **Source**: {}", opp.source_url);
            if !opp.description.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "> {}", opp.description);
            }
        }
    }
    out
}

/// One-screen console summary in the same spirit as the markdown report.
pub fn render_summary(results: &[EntityReport]) -> String {
    let total: usize = results.iter().map(|r| r.opportunities.len()).sum();
    let mut out = String::new();
    let _ = writeln!(out, "{} opportunities across {} entities", total, results.len());

    for r in results {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}: {} found",
            entity_heading(&r.entity),
            r.opportunities.len()
        );
        for opp in &r.opportunities {
            let id = opp.identifier.as_deref().unwrap_or("-");
            let deadline = opp
                .dates
                .iter()
                .find(|d| d.role == DateRole::Deadline)
                .map(|d| d.date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "  [{}] {} | {} | due {} | conf {:.2}",
                id,
                truncate(&opp.title, 48),
                status_label(opp.status),
                deadline,
                opp.confidence
            );
        }
    }
    out
}

/// Write one report file with a timestamped name, returning its path.
pub fn save(dir: &Path, content: &str, ext: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("rfp_report_{}.{}", stamp, ext));
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(path)
}

fn entity_heading(entity: &EntityConfig) -> String {
    match (&entity.region, &entity.kind) {
        (Some(region), Some(kind)) => format!("{} ({}, {})", entity.name, region, kind),
        (Some(region), None) => format!("{} ({})", entity.name, region),
        (None, Some(kind)) => format!("{} ({})", entity.name, kind),
        (None, None) => entity.name.clone(),
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Active => "ACTIVE",
        Status::Closed => "CLOSED",
        Status::Unknown => "UNKNOWN",
    }
}

fn date_role_label(role: DateRole) -> &'static str {
    match role {
        DateRole::Deadline => "Deadline",
        DateRole::Issued => "Issued",
        DateRole::Unknown => "Date",
    }
}

fn contact_parts(contact: &Contact) -> (&'static str, &str) {
    match contact {
        Contact::Email(v) => ("Email", v),
        Contact::Phone(v) => ("Phone", v),
        Contact::Name(v) => ("Contact", v),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let shortened: String = s.chars().take(max).collect();
        format!("{}...", shortened)
    }
}

// ── Tests ──
