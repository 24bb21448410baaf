use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::config::CompiledConfig;
use crate::engine::extract::BlockContext;
use crate::engine::model::{DateRole, ExtractedField, FieldKind, FieldValue, OpportunityDate};

static MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}\b",
    )
    .unwrap()
});
static ISO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap());
// Years are four digits or exactly two, never three.
static SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/(?:\d{4}|\d{2})\b").unwrap());

/// Chars of surrounding text consulted when classifying a date's role.
const ROLE_WINDOW: usize = 50;

/// Find every date-like substring, validate it against the calendar, and
/// classify its role from the nearest role keyword. Unparseable calendar
/// dates (month 13, Feb 30) are dropped, not surfaced as UNKNOWN.
pub fn extract(text: &str, ctx: &BlockContext, cfg: &CompiledConfig) -> Vec<ExtractedField> {
    let mut fields = Vec::new();
    let passes: [(&Regex, fn(&str) -> Option<NaiveDate>); 3] = [
        (&MONTH_RE, parse_month_date),
        (&ISO_RE, parse_iso_date),
        (&SLASH_RE, parse_slash_date),
    ];
    for (re, parse) in passes {
        for m in re.find_iter(text) {
            let Some(date) = parse(m.as_str()) else {
                continue;
            };
            let role = classify(text, m.start(), m.end(), ctx, cfg);
            fields.push(ExtractedField {
                kind: FieldKind::Date,
                raw: m.as_str().to_string(),
                value: FieldValue::Date(OpportunityDate { date, role }),
                confidence: if role == DateRole::Unknown { 0.6 } else { 0.9 },
            });
        }
    }
    fields
}

fn classify(
    text: &str,
    start: usize,
    end: usize,
    ctx: &BlockContext,
    cfg: &CompiledConfig,
) -> DateRole {
    let before = window_before(text, start).to_lowercase();
    let after = window_after(text, end).to_lowercase();

    let deadline = nearest(&before, &after, &cfg.deadline_keywords);
    let issued = nearest(&before, &after, &cfg.issued_keywords);
    match (deadline, issued) {
        (Some(d), Some(i)) if i < d => return DateRole::Issued,
        (Some(_), _) => return DateRole::Deadline,
        (None, Some(_)) => return DateRole::Issued,
        (None, None) => {}
    }

    // No keyword inside the window: fall back to the neighbouring block lines.
    let context = [ctx.prev_line, ctx.next_line]
        .iter()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    if cfg.deadline_keywords.iter().any(|k| context.contains(k.as_str())) {
        DateRole::Deadline
    } else if cfg.issued_keywords.iter().any(|k| context.contains(k.as_str())) {
        DateRole::Issued
    } else {
        DateRole::Unknown
    }
}

/// Distance in chars from the date to the closest occurrence of any keyword,
/// looking both backward and forward.
fn nearest(before: &str, after: &str, keywords: &[String]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for kw in keywords {
        if let Some(pos) = before.rfind(kw.as_str()) {
            let dist = before.len().saturating_sub(pos + kw.len());
            best = Some(best.map_or(dist, |b| b.min(dist)));
        }
        if let Some(pos) = after.find(kw.as_str()) {
            best = Some(best.map_or(pos, |b| b.min(pos)));
        }
    }
    best
}

fn window_before(text: &str, end: usize) -> &str {
    let mut start = end.saturating_sub(ROLE_WINDOW);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    &text[start..end]
}

fn window_after(text: &str, start: usize) -> &str {
    let mut end = (start + ROLE_WINDOW).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    &text[start..end]
}

fn parse_month_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.replace([',', '.'], " ");
    let mut parts = cleaned.split_whitespace();
    let month = month_number(parts.next()?)?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_slash_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('/');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    // Two-digit years pivot at 70.
    let year = match year {
        0..=69 => year + 2000,
        70..=99 => year + 1900,
        _ => year,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_lowercase();
    let n = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

// ── Tests ──
