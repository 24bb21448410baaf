use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::engine::model::{Opportunity, SourceKind, Status};

/// Collapse duplicates across every document of one source entity. Exact
/// identifier match first; identifier-less records fall back to exact
/// normalized-title match. Records with an identifier never merge with
/// records without one. The result is independent of input order.
pub fn merge_all(found: Vec<Opportunity>) -> Vec<Opportunity> {
    let mut groups: BTreeMap<String, Vec<Opportunity>> = BTreeMap::new();
    for opp in found {
        let key = match &opp.identifier {
            Some(id) => format!("id:{id}"),
            None => format!("title:{}", normalize_title(&opp.title)),
        };
        groups.entry(key).or_default().push(opp);
    }

    let mut merged: Vec<Opportunity> = groups.into_values().filter_map(merge_group).collect();
    merged.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.source_url.cmp(&b.source_url))
    });
    merged
}

/// Collapse one dedup group into a canonical record. The authoritative record
/// contributes title, identifier, and source fields; dates and contacts are
/// unioned, the longest description and the strongest status and confidence
/// survive. Authority is decided by comparing the original inputs under a
/// total order, never a merged intermediate, so the outcome cannot depend on
/// arrival order.
fn merge_group(mut records: Vec<Opportunity>) -> Option<Opportunity> {
    records.sort_by(|a, b| authority(b, a));
    let mut records = records.into_iter();
    let mut out = records.next()?;
    for r in records {
        out.dates.extend(r.dates);
        out.contacts.extend(r.contacts);
        out.description = longer_description(std::mem::take(&mut out.description), r.description);
        out.status = merge_status(out.status, r.status);
        out.confidence = out.confidence.max(r.confidence);
    }
    Some(out)
}

/// Total order deciding which record's identity fields win a merge. PDFs are
/// treated as the more authoritative documents.
fn authority(a: &Opportunity, b: &Opportunity) -> Ordering {
    kind_rank(a.source_kind)
        .cmp(&kind_rank(b.source_kind))
        .then_with(|| a.confidence.total_cmp(&b.confidence))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.source_url.cmp(&b.source_url))
}

fn kind_rank(kind: SourceKind) -> u8 {
    match kind {
        SourceKind::Pdf => 1,
        SourceKind::Html => 0,
    }
}

fn longer_description(a: String, b: String) -> String {
    match a.len().cmp(&b.len()) {
        Ordering::Greater => a,
        Ordering::Less => b,
        Ordering::Equal => a.max(b),
    }
}

fn merge_status(a: Status, b: Status) -> Status {
    match (a, b) {
        (Status::Closed, _) | (_, Status::Closed) => Status::Closed,
        (Status::Active, _) | (_, Status::Active) => Status::Active,
        _ => Status::Unknown,
    }
}

/// Case-insensitive, whitespace-collapsed, punctuation-stripped title key.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ──
