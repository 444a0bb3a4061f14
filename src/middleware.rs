//! Routing edge: locale prefix enforcement.
//!
//! Every public path carries an explicit locale segment. Requests arriving
//! without one are redirected to the negotiated locale's variant of the
//! same path, and the negotiated choice is pinned in the preference cookie
//! on the redirect response. This runs fresh on every un-prefixed request,
//! since the negotiated value can change between visits (cleared cookies,
//! new browser); nothing here is memoized.

use crate::i18n::{negotiate, LocaleRegistry};
use crate::session;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;
use tracing::debug;

/// Path prefixes that are never locale-rewritten: operational endpoints,
/// API namespaces, static assets, and the locale switch itself.
const DENYLIST: &[&str] = &["healthz", "internal", "api", "assets", "locale", "favicon.ico"];

/// Whether the routing edge leaves this path untouched.
fn passes_through(first_segment: &str) -> bool {
    DENYLIST.contains(&first_segment) || LocaleRegistry::get().is_enabled(first_segment)
}

/// Redirect un-prefixed paths to their locale-prefixed form.
pub async fn locale_redirect(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or("");

    if passes_through(first_segment) {
        return next.run(request).await;
    }

    let stored = session::stored_locale(request.headers());
    let accept_language = request
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let locale = negotiate(stored, accept_language);

    let target = match request.uri().query() {
        Some(query) => format!("/{}{}?{}", locale.code(), path, query),
        None => format!("/{}{}", locale.code(), path),
    };

    debug!("Locale redirect: {} -> {}", path, target);

    // Temporary redirect: the target depends on a mutable per-visitor
    // preference
    let mut response = Redirect::temporary(&target).into_response();
    let cookie = session::locale_cookie(locale, state.config.locale_cookie_max_age_days);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
