use crate::engine::model::{ExtractedField, FieldKind, FieldValue, Status};

const CLOSED_KEYWORDS: &[&str] = &[
    "closed",
    "awarded",
    "expired",
    "archived",
    "cancelled",
    "canceled",
    "withdrawn",
    "completed",
];
const ACTIVE_KEYWORDS: &[&str] = &[
    "open",
    "accepting proposals",
    "now accepting",
    "currently accepting",
];

/// Keyword scan, closed indicators first. Deliberately never infers status by
/// comparing deadlines against the clock.
pub fn extract(text: &str) -> Vec<ExtractedField> {
    let lower = text.to_lowercase();
    for kw in CLOSED_KEYWORDS {
        if lower.contains(kw) {
            return vec![field(kw, Status::Closed)];
        }
    }
    for kw in ACTIVE_KEYWORDS {
        if lower.contains(kw) {
            return vec![field(kw, Status::Active)];
        }
    }
    Vec::new()
}

fn field(raw: &str, status: Status) -> ExtractedField {
    ExtractedField {
        kind: FieldKind::Status,
        raw: raw.to_string(),
        value: FieldValue::Status(status),
        confidence: 0.8,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(text: &str) -> Option<Status> {
        extract(text).into_iter().next().map(|f| match f.value {
            FieldValue::Status(s) => s,
            _ => unreachable!(),
        })
    }

    #[test]
    fn closed_keywords_detected() {
        assert_eq!(status_of("This RFP has been archived."), Some(Status::Closed));
        assert_eq!(status_of("Contract awarded to vendor"), Some(Status::Closed));
    }

    #[test]
    fn active_keywords_detected() {
        assert_eq!(status_of("Now accepting proposals"), Some(Status::Active));
        assert_eq!(status_of("bidding is open until further notice"), Some(Status::Active));
    }

    #[test]
    fn closed_wins_over_active() {
        assert_eq!(
            status_of("previously open, now closed"),
            Some(Status::Closed)
        );
    }

    #[test]
    fn no_keyword_no_field() {
        assert!(extract("Substation upgrade project").is_empty());
    }
}
