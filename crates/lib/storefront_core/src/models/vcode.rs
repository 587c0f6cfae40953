//! Virtual (gift-card) code records and their status machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// Lifecycle state of a virtual code.
///
/// ```text
/// pending ──► active ──► used
///    │           │
///    └───────────┴──► expired   (computed from the expiry date)
/// ```
///
/// `used` and `expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Pending,
    Active,
    Used,
    Expired,
}

impl CodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeStatus::Pending => "pending",
            CodeStatus::Active => "active",
            CodeStatus::Used => "used",
            CodeStatus::Expired => "expired",
        }
    }

    /// Human-readable label shown next to a code.
    pub fn label(self) -> &'static str {
        match self {
            CodeStatus::Pending => "Pending",
            CodeStatus::Active => "Active",
            CodeStatus::Used => "Used",
            CodeStatus::Expired => "Expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CodeStatus::Used | CodeStatus::Expired)
    }

    /// Whether `self → next` is an edge of the status machine.
    pub fn can_transition_to(self, next: CodeStatus) -> bool {
        matches!(
            (self, next),
            (CodeStatus::Pending, CodeStatus::Active)
                | (CodeStatus::Active, CodeStatus::Used)
                | (CodeStatus::Pending, CodeStatus::Expired)
                | (CodeStatus::Active, CodeStatus::Expired)
        )
    }
}

impl fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CodeStatus::Pending),
            "active" => Ok(CodeStatus::Active),
            "used" => Ok(CodeStatus::Used),
            "expired" => Ok(CodeStatus::Expired),
            other => Err(UnknownVariant {
                kind: "code status",
                value: other.to_string(),
            }),
        }
    }
}

/// Whether an optional expiry date lies strictly before `now`. A code is
/// still valid at the instant it expires.
pub fn is_code_expired(expiry_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expiry_date.is_some_and(|expiry| expiry < now)
}

/// Display form of an expiry date, e.g. `October 18, 2026`.
pub fn format_expiry_date(expiry_date: Option<DateTime<Utc>>) -> String {
    match expiry_date {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => "No expiry".to_string(),
    }
}

/// A stored virtual code attached to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualCode {
    pub id: String,
    pub order_id: String,
    pub code: String,
    /// Status as persisted. Use [`VirtualCode::effective_status`] for reads.
    pub status: CodeStatus,
    pub expiry_date: Option<DateTime<Utc>>,
    /// SHA-256 (hex) of the idempotency key presented when the code was consumed.
    pub retrieval_key_hash: Option<String>,
    pub retrieved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VirtualCode {
    /// Status as observed at `now`: a past expiry date overrides any
    /// non-`used` stored status.
    pub fn effective_status(&self, now: DateTime<Utc>) -> CodeStatus {
        if self.status != CodeStatus::Used && is_code_expired(self.expiry_date, now) {
            CodeStatus::Expired
        } else {
            self.status
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn code(status: CodeStatus, expiry_date: Option<DateTime<Utc>>) -> VirtualCode {
        VirtualCode {
            id: "c1".into(),
            order_id: "o1".into(),
            code: "AB12-CD34-EF56-GH78".into(),
            status,
            expiry_date,
            retrieval_key_hash: None,
            retrieved_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn transitions_follow_the_machine() {
        use CodeStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Active.can_transition_to(Used));
        assert!(Pending.can_transition_to(Expired));
        assert!(Active.can_transition_to(Expired));

        assert!(!Active.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Used));
        for next in [Pending, Active, Used, Expired] {
            assert!(!Used.can_transition_to(next), "used -> {next} must be rejected");
            assert!(!Expired.can_transition_to(next), "expired -> {next} must be rejected");
        }
    }

    #[test]
    fn past_expiry_reads_as_expired() {
        let now = Utc::now();
        let yesterday = Some(now - Duration::days(1));
        assert_eq!(code(CodeStatus::Active, yesterday).effective_status(now), CodeStatus::Expired);
        assert_eq!(code(CodeStatus::Pending, yesterday).effective_status(now), CodeStatus::Expired);
        // used is terminal even after the expiry date passes
        assert_eq!(code(CodeStatus::Used, yesterday).effective_status(now), CodeStatus::Used);
    }

    #[test]
    fn future_or_missing_expiry_keeps_stored_status() {
        let now = Utc::now();
        let tomorrow = Some(now + Duration::days(1));
        assert_eq!(code(CodeStatus::Active, tomorrow).effective_status(now), CodeStatus::Active);
        assert_eq!(code(CodeStatus::Pending, None).effective_status(now), CodeStatus::Pending);
    }

    #[test]
    fn expiry_instant_is_still_valid() {
        let now = Utc::now();
        assert!(!is_code_expired(Some(now), now));
        assert!(is_code_expired(Some(now), now + Duration::milliseconds(1)));
        assert_eq!(code(CodeStatus::Active, Some(now)).effective_status(now), CodeStatus::Active);
    }

    #[test]
    fn terminal_states() {
        assert!(CodeStatus::Used.is_terminal());
        assert!(CodeStatus::Expired.is_terminal());
        assert!(!CodeStatus::Pending.is_terminal());
        assert!(!CodeStatus::Active.is_terminal());
    }

    #[test]
    fn expiry_display() {
        let date = Utc.with_ymd_and_hms(2026, 10, 8, 12, 0, 0).unwrap();
        assert_eq!(format_expiry_date(Some(date)), "October 8, 2026");
        assert_eq!(format_expiry_date(None), "No expiry");
    }

    #[test]
    fn labels() {
        assert_eq!(CodeStatus::Pending.label(), "Pending");
        assert_eq!(CodeStatus::Expired.label(), "Expired");
        assert_eq!("used".parse::<CodeStatus>().unwrap(), CodeStatus::Used);
    }
}
