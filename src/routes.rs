//! HTTP surface: survey page, submission, landing page, locale switch,
//! and operational endpoints.
//!
//! Handlers return localized JSON view models; rendering them is the
//! frontend's job. Every translatable string is resolved before it leaves
//! this module; no bundle ever crosses the wire unresolved.

use crate::assembler::{self, SubmissionOutcome};
use crate::error::AppError;
use crate::gate::{self, Availability};
use crate::handoff::{keys, HandoffRecord};
use crate::i18n::{strings, FallbackMetrics, Locale, LocaleRegistry};
use crate::middleware::locale_redirect;
use crate::security::constant_time_compare;
use crate::session;
use crate::state::AppState;
use crate::survey::{Answer, Survey, SurveyView};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/internal/metrics", get(metrics))
        .route("/locale/:code", get(switch_locale))
        .route("/:locale/survey/:token", get(survey_page))
        .route("/:locale/survey/:token/responses", post(submit_response))
        .route("/:locale/result", get(landing_page))
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            locale_redirect,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn not_found() -> Response {
    let body = Json(serde_json::json!({ "error": "Not found" }));
    (StatusCode::NOT_FOUND, body).into_response()
}

/// Fallback resolution metrics, guarded by the internal API key.
///
/// Returns 404 when no key is configured so the endpoint is invisible in
/// deployments that never set one.
async fn metrics(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(expected) = state.config.internal_api_key.as_deref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let provided = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if !constant_time_compare(provided, expected) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(FallbackMetrics::global().report()).into_response()
}

#[derive(Debug, Deserialize)]
struct SwitchLocaleParams {
    next: Option<String>,
}

/// Explicit locale switch: pin the preference cookie and send the visitor
/// back to `next` with its locale segment replaced.
///
/// The switch is a full navigation, not an in-place re-render: after the
/// redirect nothing rendered under the old locale survives.
async fn switch_locale(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(params): Query<SwitchLocaleParams>,
) -> Result<Response, AppError> {
    let locale = Locale::from_code(&code).map_err(|_| AppError::UnknownLocale(code))?;

    // Relative paths only; anything else goes home
    let next = params
        .next
        .filter(|next| next.starts_with('/') && !next.starts_with("//"))
        .unwrap_or_else(|| "/".to_string());

    let target = swap_locale_segment(&next, locale);
    info!("Locale switch to '{}', returning to {}", locale, target);

    let mut response = Redirect::temporary(&target).into_response();
    append_cookie(
        &mut response,
        session::locale_cookie(locale, state.config.locale_cookie_max_age_days),
    );
    Ok(response)
}

/// Replace (or insert) the leading locale segment of `path`.
fn swap_locale_segment(path: &str, locale: Locale) -> String {
    let (path_part, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };

    let trimmed = path_part.trim_start_matches('/');
    let mut segments: Vec<&str> = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    };

    match segments.first() {
        Some(first) if LocaleRegistry::get().is_enabled(first) => segments[0] = locale.code(),
        _ => segments.insert(0, locale.code()),
    }

    let rebuilt = format!("/{}", segments.join("/"));
    match query {
        Some(query) => format!("{}?{}", rebuilt, query),
        None => rebuilt,
    }
}

/// The public survey page.
///
/// The availability gate runs fresh on every load. An open survey renders
/// its localized question list; a closed one writes the resolved gate
/// notice into the visitor's handoff slot and redirects to the landing
/// page without ever exposing the questions.
async fn survey_page(
    State(state): State<Arc<AppState>>,
    Path((locale, token)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let locale = Locale::from_code(&locale).map_err(|_| AppError::UnknownLocale(locale))?;

    let survey = state
        .backend
        .fetch_survey(&token)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::SurveyNotFound)?;

    let availability = gate::evaluate(&survey, Utc::now());
    if let Some(notice) = gate::closed_notice(&survey, availability, locale) {
        info!(
            "Survey '{}' gated ({}) for locale '{}'",
            survey.id,
            notice.state.as_str(),
            locale
        );
        let (session, set_cookie) = session::ensure_session(&headers);
        let record =
            closed_record(&survey, locale, notice.state.as_str(), notice.title, notice.body);
        return Ok(handoff_redirect(
            &state, session, set_cookie, locale, record, false,
        ));
    }

    Ok(Json(SurveyView::render(&survey, locale)).into_response())
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    answers: Vec<Answer>,
}

/// Validation failure payload: the visitor stays on the page, corrects the
/// named questions, and may resubmit.
#[derive(Debug, Serialize)]
struct ValidationFailureBody {
    error: &'static str,
    unmet: Vec<String>,
    prompts: Vec<String>,
    message: String,
}

/// Accept a response submission.
///
/// The gate is re-evaluated first; a survey that closed since page load
/// hands off its notice exactly like the page view does. Past the gate, at
/// most one submission may be in flight per session; a concurrent attempt
/// is rejected with 409, never queued.
async fn submit_response(
    State(state): State<Arc<AppState>>,
    Path((locale, token)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<SubmitRequest>,
) -> Result<Response, AppError> {
    let locale = Locale::from_code(&locale).map_err(|_| AppError::UnknownLocale(locale))?;

    let survey = state
        .backend
        .fetch_survey(&token)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::SurveyNotFound)?;

    let availability = gate::evaluate(&survey, Utc::now());
    let (session, set_cookie) = session::ensure_session(&headers);

    let outcome = match gate::closed_notice(&survey, availability, locale) {
        Some(notice) => SubmissionOutcome::Closed(notice),
        None => {
            let _slot = state
                .begin_submission(session)
                .ok_or(AppError::SubmissionInFlight)?;

            assembler::assemble(&state.backend, &survey, request.answers, locale)
                .await
                .map_err(|e| AppError::SubmissionFailed(e.to_string()))?
        }
    };

    match outcome {
        SubmissionOutcome::Accepted {
            reference,
            completion_title,
            completion_body,
        } => {
            info!("Survey '{}' submission stored as '{}'", survey.id, reference);
            let record = HandoffRecord::completed(
                survey.title.resolve(locale, strings::SURVEY_TITLE),
                locale.code(),
                reference,
                completion_title,
                completion_body,
            );
            Ok(handoff_redirect(
                &state, session, set_cookie, locale, record, true,
            ))
        }
        SubmissionOutcome::Rejected { unmet, prompts } => {
            let message = prompts.join(" · ");
            let body = ValidationFailureBody {
                error: "validation_failed",
                unmet,
                prompts,
                message,
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response())
        }
        SubmissionOutcome::Closed(notice) => {
            info!(
                "Survey '{}' submission refused, gate {} since page load",
                survey.id,
                notice.state.as_str()
            );
            let record =
                closed_record(&survey, locale, notice.state.as_str(), notice.title, notice.body);
            Ok(handoff_redirect(
                &state, session, set_cookie, locale, record, true,
            ))
        }
    }
}

fn closed_record(
    survey: &Survey,
    locale: Locale,
    state: &str,
    title: String,
    body: String,
) -> HandoffRecord {
    HandoffRecord::closed(
        survey.title.resolve(locale, strings::SURVEY_TITLE),
        locale.code(),
        state,
        title,
        body,
    )
}

/// Write `record` into the visitor's handoff slot and redirect to the
/// landing page, attaching the freshly minted session cookie when there is
/// one. `see_other` picks 303 for the POST → GET hop; page views use 307.
fn handoff_redirect(
    state: &AppState,
    session: uuid::Uuid,
    set_cookie: Option<String>,
    locale: Locale,
    record: HandoffRecord,
    see_other: bool,
) -> Response {
    state.handoff.write(session, record);

    let target = format!("/{}/result", locale.code());
    let mut response = if see_other {
        Redirect::to(&target).into_response()
    } else {
        Redirect::temporary(&target).into_response()
    };

    if let Some(cookie) = set_cookie {
        append_cookie(&mut response, cookie);
    }
    response
}

fn append_cookie(response: &mut Response, cookie: String) {
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// Landing page view. Every field falls back to generic copy: an empty
/// handoff store must render, never crash.
#[derive(Debug, Serialize, PartialEq)]
struct LandingView {
    outcome: &'static str,
    title: String,
    body: String,
    locale: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    survey_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    closed_state: Option<String>,
}

impl LandingView {
    /// Build the view from whatever the handoff store held.
    ///
    /// Discrimination is on the outcome flag alone, because the two outcome
    /// families populate overlapping keys, so presence of a title says
    /// nothing.
    fn from_record(record: Option<&HandoffRecord>, locale: Locale) -> Self {
        let Some(record) = record else {
            return Self::generic(locale);
        };

        match record.outcome() {
            Some(keys::OUTCOME_COMPLETED) => Self {
                outcome: "completed",
                title: record
                    .get(keys::COMPLETION_TITLE)
                    .unwrap_or(strings::COMPLETION_TITLE)
                    .to_string(),
                body: record
                    .get(keys::COMPLETION_BODY)
                    .unwrap_or(strings::COMPLETION_BODY)
                    .to_string(),
                locale: locale.code(),
                survey_title: record.get(keys::SURVEY_TITLE).map(str::to_string),
                reference: record.get(keys::SUBMISSION_REF).map(str::to_string),
                closed_state: None,
            },
            Some(keys::OUTCOME_CLOSED) => {
                let closed_state = record.get(keys::CLOSED_STATE).map(str::to_string);
                let (fallback_title, fallback_body) = match closed_state.as_deref() {
                    Some(state) if state == Availability::NotStarted.as_str() => {
                        (strings::NOT_STARTED_TITLE, strings::NOT_STARTED_BODY)
                    }
                    _ => (strings::EXPIRED_TITLE, strings::EXPIRED_BODY),
                };
                Self {
                    outcome: "closed",
                    title: record
                        .get(keys::CLOSED_TITLE)
                        .unwrap_or(fallback_title)
                        .to_string(),
                    body: record
                        .get(keys::CLOSED_BODY)
                        .unwrap_or(fallback_body)
                        .to_string(),
                    locale: locale.code(),
                    survey_title: record.get(keys::SURVEY_TITLE).map(str::to_string),
                    reference: None,
                    closed_state,
                }
            }
            // Unknown flag: the most generic copy we have
            _ => Self::generic(locale),
        }
    }

    fn generic(locale: Locale) -> Self {
        Self {
            outcome: "none",
            title: strings::LANDING_TITLE.to_string(),
            body: strings::LANDING_BODY.to_string(),
            locale: locale.code(),
            survey_title: None,
            reference: None,
            closed_state: None,
        }
    }
}

/// The landing page a visitor reaches after a submission or a gate
/// rejection. Reads the handoff slot once; the store clears it shortly
/// after, so a later unrelated visit renders the generic copy.
async fn landing_page(
    State(state): State<Arc<AppState>>,
    Path(locale): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let locale = Locale::from_code(&locale).map_err(|_| AppError::UnknownLocale(locale))?;

    let record = session::session_id(&headers)
        .and_then(|session| state.handoff.read_once(session));

    Ok(Json(LandingView::from_record(record.as_ref(), locale)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Path Rewriting Tests ====================

    #[test]
    fn test_swap_locale_segment_replaces_existing() {
        assert_eq!(
            swap_locale_segment("/en/survey/tok_abc", Locale::GERMAN),
            "/de/survey/tok_abc"
        );
    }

    #[test]
    fn test_swap_locale_segment_inserts_when_missing() {
        assert_eq!(
            swap_locale_segment("/survey/tok_abc", Locale::FRENCH),
            "/fr/survey/tok_abc"
        );
    }

    #[test]
    fn test_swap_locale_segment_preserves_query() {
        assert_eq!(
            swap_locale_segment("/es/result?ref=1", Locale::ENGLISH),
            "/en/result?ref=1"
        );
    }

    #[test]
    fn test_swap_locale_segment_root() {
        assert_eq!(swap_locale_segment("/", Locale::SPANISH), "/es");
    }

    // ==================== Landing View Tests ====================

    #[test]
    fn test_landing_view_empty_store_renders_generic_copy() {
        let view = LandingView::from_record(None, Locale::ENGLISH);
        assert_eq!(view.outcome, "none");
        assert_eq!(view.title, strings::LANDING_TITLE);
        assert_eq!(view.body, strings::LANDING_BODY);
        assert!(view.reference.is_none());
    }

    #[test]
    fn test_landing_view_completed() {
        let record = HandoffRecord::completed(
            "Pulse".to_string(),
            "fr",
            "resp_1".to_string(),
            "Merci !".to_string(),
            "Enregistré.".to_string(),
        );
        let view = LandingView::from_record(Some(&record), Locale::FRENCH);

        assert_eq!(view.outcome, "completed");
        assert_eq!(view.title, "Merci !");
        assert_eq!(view.reference.as_deref(), Some("resp_1"));
        assert!(view.closed_state.is_none());
    }

    #[test]
    fn test_landing_view_closed() {
        let record = HandoffRecord::closed(
            "Pulse".to_string(),
            "en",
            "not_started",
            "Not open yet".to_string(),
            "Come back later.".to_string(),
        );
        let view = LandingView::from_record(Some(&record), Locale::ENGLISH);

        assert_eq!(view.outcome, "closed");
        assert_eq!(view.closed_state.as_deref(), Some("not_started"));
        assert_eq!(view.title, "Not open yet");
        assert!(view.reference.is_none());
    }
}
