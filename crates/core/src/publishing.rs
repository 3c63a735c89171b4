//! Page publishing state machine.
//!
//! A page is stored with a two-valued `status` plus optional `published_at`
//! and `scheduled_at` timestamps. Together they describe three phases:
//!
//! ```text
//!              schedule(t > now)
//!   Draft ────────────────────────▶ Scheduled
//!     ▲  ╲                            │   ▲
//!     │   ╲ publish                   │   │ schedule (re-arm)
//!     │    ▼                          ▼   │
//!     └── Published ◀──── publish / auto-publish (scheduled_at <= now)
//!        unpublish
//! ```
//!
//! This module lives in `core` (zero internal deps) so the HTTP handlers and
//! the background scheduler apply exactly the same transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// How often the scheduler sweeps for due pages, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Maximum number of pages one sweep publishes.
pub const DEFAULT_SWEEP_BATCH_LIMIT: i64 = 20;

// ---------------------------------------------------------------------------
// PageStatus
// ---------------------------------------------------------------------------

/// Persisted page status. Matches the `pages.status` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Draft,
    Published,
}

impl PageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PageStatus::Draft => "draft",
            PageStatus::Published => "published",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PageStatus::Draft),
            "published" => Ok(PageStatus::Published),
            other => Err(CoreError::Validation(format!(
                "Invalid page status '{other}'. Must be one of: draft, published"
            ))),
        }
    }
}

impl TryFrom<String> for PageStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Phase derived from status + schedule, used for display and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishPhase {
    Draft,
    Scheduled,
    Published,
}

// ---------------------------------------------------------------------------
// PublishState
// ---------------------------------------------------------------------------

/// The publishing-related fields of a page.
///
/// Transitions are pure: they return the next state and leave persistence
/// to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishState {
    pub status: PageStatus,
    pub published_at: Option<Timestamp>,
    pub scheduled_at: Option<Timestamp>,
}

impl Default for PublishState {
    fn default() -> Self {
        Self::draft()
    }
}

impl PublishState {
    /// Initial state of every new page.
    pub fn draft() -> Self {
        Self {
            status: PageStatus::Draft,
            published_at: None,
            scheduled_at: None,
        }
    }

    pub fn phase(&self) -> PublishPhase {
        match (self.status, self.scheduled_at) {
            (PageStatus::Published, _) => PublishPhase::Published,
            (PageStatus::Draft, Some(_)) => PublishPhase::Scheduled,
            (PageStatus::Draft, None) => PublishPhase::Draft,
        }
    }

    /// Publish now.
    ///
    /// `published_at` keeps its original value on republish; it is only set
    /// when empty. Any pending schedule is cleared. Publishing an already
    /// published page is not an error.
    pub fn publish(&self, now: Timestamp) -> Self {
        Self {
            status: PageStatus::Published,
            published_at: self.published_at.or(Some(now)),
            scheduled_at: None,
        }
    }

    /// Move back to draft and clear `published_at`.
    ///
    /// `scheduled_at` is left as it is, so a scheduled draft stays armed.
    pub fn unpublish(&self) -> Self {
        Self {
            status: PageStatus::Draft,
            published_at: None,
            scheduled_at: self.scheduled_at,
        }
    }

    /// Arm the page for automatic publishing at `at`.
    ///
    /// `at` must be strictly after `now`. Re-arms regardless of the prior
    /// phase; a published page drops back to draft and loses `published_at`
    /// so the eventual auto-publish stamps a fresh date.
    pub fn schedule(&self, at: Timestamp, now: Timestamp) -> Result<Self, CoreError> {
        if at <= now {
            return Err(CoreError::Validation(
                "Scheduled date must be in the future".into(),
            ));
        }
        Ok(Self {
            status: PageStatus::Draft,
            published_at: None,
            scheduled_at: Some(at),
        })
    }

    /// Whether the scheduler should publish this page at `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.status == PageStatus::Draft && self.scheduled_at.is_some_and(|at| at <= now)
    }

    /// Transition applied by the scheduler sweep. Same effect as [`publish`](Self::publish).
    pub fn auto_publish(&self, now: Timestamp) -> Self {
        let mut next = self.publish(now);
        next.scheduled_at = None;
        next
    }

    /// Check the cross-field invariants of a persisted state.
    pub fn check_invariants(&self) -> Result<(), CoreError> {
        match self.status {
            PageStatus::Published if self.published_at.is_none() => Err(CoreError::Internal(
                "published page has no published_at".into(),
            )),
            PageStatus::Published if self.scheduled_at.is_some() => Err(CoreError::Internal(
                "published page still has a scheduled_at".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Parse the `scheduledAt` request field (RFC 3339 / ISO 8601 with offset).
pub fn parse_scheduled_at(raw: Option<&str>) -> Result<Timestamp, CoreError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Validation("scheduledAt is required".into()))?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| CoreError::Validation(format!("scheduledAt is not a valid timestamp: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    // -----------------------------------------------------------------------
    // Status parsing
    // -----------------------------------------------------------------------

    #[test]
    fn status_round_trips_through_str() {
        for status in [PageStatus::Draft, PageStatus::Published] {
            assert_eq!(status.as_str().parse::<PageStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_matches!("archived".parse::<PageStatus>(), Err(CoreError::Validation(_)));
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    #[test]
    fn new_page_is_draft() {
        assert_eq!(PublishState::draft().phase(), PublishPhase::Draft);
    }

    #[test]
    fn publish_sets_date_and_clears_schedule() {
        let now = Utc::now();
        let scheduled = PublishState::draft()
            .schedule(now + Duration::hours(1), now)
            .unwrap();

        let published = scheduled.publish(now);
        assert_eq!(published.status, PageStatus::Published);
        assert_eq!(published.published_at, Some(now));
        assert_eq!(published.scheduled_at, None);
        assert!(published.check_invariants().is_ok());
    }

    #[test]
    fn republish_keeps_original_date() {
        let first = Utc::now() - Duration::days(3);
        let published = PublishState::draft().publish(first);
        let again = published.publish(Utc::now());
        assert_eq!(again.published_at, Some(first));
    }

    #[test]
    fn unpublish_clears_date_but_not_schedule() {
        let now = Utc::now();
        let at = now + Duration::minutes(5);
        let scheduled = PublishState::draft().schedule(at, now).unwrap();

        let unpublished = scheduled.unpublish();
        assert_eq!(unpublished.status, PageStatus::Draft);
        assert_eq!(unpublished.published_at, None);
        assert_eq!(unpublished.scheduled_at, Some(at));
        assert_eq!(unpublished.phase(), PublishPhase::Scheduled);
    }

    #[test]
    fn schedule_in_past_is_rejected() {
        let now = Utc::now();
        let state = PublishState::draft();
        assert_matches!(
            state.schedule(now - Duration::seconds(1), now),
            Err(CoreError::Validation(_))
        );
        assert_matches!(state.schedule(now, now), Err(CoreError::Validation(_)));
    }

    #[test]
    fn schedule_rearms_published_page() {
        let now = Utc::now();
        let published = PublishState::draft().publish(now - Duration::days(1));
        let at = now + Duration::hours(2);

        let rearmed = published.schedule(at, now).unwrap();
        assert_eq!(rearmed.phase(), PublishPhase::Scheduled);
        assert_eq!(rearmed.published_at, None);
        assert_eq!(rearmed.scheduled_at, Some(at));
    }

    #[test]
    fn due_only_when_draft_and_time_reached() {
        let now = Utc::now();
        let at = now + Duration::seconds(30);
        let scheduled = PublishState::draft().schedule(at, now).unwrap();

        assert!(!scheduled.is_due(now));
        assert!(scheduled.is_due(at));
        assert!(!PublishState::draft().is_due(now));
        assert!(!scheduled.publish(now).is_due(at));
    }

    #[test]
    fn auto_publish_stamps_time_not_before_schedule() {
        let now = Utc::now();
        let at = now + Duration::seconds(1);
        let scheduled = PublishState::draft().schedule(at, now).unwrap();

        let tick = at + Duration::milliseconds(250);
        let published = scheduled.auto_publish(tick);
        assert_eq!(published.phase(), PublishPhase::Published);
        assert_eq!(published.scheduled_at, None);
        assert!(published.published_at.unwrap() >= at);
    }

    #[test]
    fn invariants_catch_published_without_date() {
        let broken = PublishState {
            status: PageStatus::Published,
            published_at: None,
            scheduled_at: None,
        };
        assert!(broken.check_invariants().is_err());
    }

    // -----------------------------------------------------------------------
    // Request parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_scheduled_at_accepts_rfc3339() {
        let parsed = parse_scheduled_at(Some("2030-01-02T03:04:05+02:00")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2030-01-02T01:04:05+00:00");
    }

    #[test]
    fn parse_scheduled_at_requires_value() {
        assert_matches!(parse_scheduled_at(None), Err(CoreError::Validation(m)) if m.contains("required"));
        assert_matches!(parse_scheduled_at(Some("  ")), Err(CoreError::Validation(_)));
        assert_matches!(parse_scheduled_at(Some("tomorrow")), Err(CoreError::Validation(_)));
    }
}
