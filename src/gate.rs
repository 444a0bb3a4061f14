//! Survey availability gate.
//!
//! Decides, fresh on every request, whether a public survey is currently
//! accepting responses. The decision is a pure function of the survey's
//! temporal bounds, its active flag, and the current wall-clock time; it is
//! never persisted as survey state and it cannot fail.

use crate::i18n::{strings, Locale};
use crate::survey::Survey;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Availability of a survey at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// The start timestamp lies in the future
    NotStarted,
    /// Open for responses
    Active,
    /// Past its expiry timestamp, or deactivated by its author
    Expired,
}

impl Availability {
    pub fn is_active(&self) -> bool {
        matches!(self, Availability::Active)
    }

    /// Stable string form used as the handoff state flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::NotStarted => "not_started",
            Availability::Active => "active",
            Availability::Expired => "expired",
        }
    }
}

/// Evaluate the gate for `survey` at `now`.
///
/// The branches are checked in a fixed priority order:
/// 1. a future start timestamp wins, even over a past expiry; the
///    earliest applicable temporal boundary governs a misconfigured
///    survey;
/// 2. a past expiry timestamp or a cleared active flag closes the survey;
/// 3. otherwise the survey is active. Absent timestamps simply skip their
///    branch, so a survey with no bounds and `is_active` is always open.
pub fn evaluate(survey: &Survey, now: DateTime<Utc>) -> Availability {
    if let Some(starts_at) = survey.starts_at {
        if now < starts_at {
            return Availability::NotStarted;
        }
    }

    let past_expiry = survey
        .expires_at
        .map(|expires_at| now > expires_at)
        .unwrap_or(false);

    if past_expiry || !survey.is_active {
        return Availability::Expired;
    }

    Availability::Active
}

/// The resolved notice a visitor sees when a gate is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedNotice {
    pub state: Availability,
    pub title: String,
    pub body: String,
}

/// Resolve the notice for a non-active gate state at the visitor's locale.
///
/// Returns `None` for `Active`, which has nothing to announce. The title
/// and body always resolve to some string: the survey's own copy when it
/// has any, the generic literals otherwise.
pub fn closed_notice(survey: &Survey, state: Availability, locale: Locale) -> Option<ClosedNotice> {
    let (bundle, fallback_title, fallback_body) = match state {
        Availability::Active => return None,
        Availability::NotStarted => (
            &survey.start_notice,
            strings::NOT_STARTED_TITLE,
            strings::NOT_STARTED_BODY,
        ),
        Availability::Expired => (
            &survey.expiry_notice,
            strings::EXPIRED_TITLE,
            strings::EXPIRED_BODY,
        ),
    };

    Some(ClosedNotice {
        state,
        title: bundle.title.resolve(locale, fallback_title),
        body: bundle.body.resolve(locale, fallback_body),
    })
}
