//! Visitor cookies: locale preference and handoff session.
//!
//! Two cookies, both root-scoped. The locale preference cookie pins the
//! negotiated locale for 30 days (configurable) so later requests
//! short-circuit negotiation. The session cookie is an opaque v4 UUID that
//! keys the visitor's slot in the handoff store; it carries no identity and
//! lives only for the browser session.

use crate::i18n::Locale;
use axum::http::{header, HeaderMap};
use uuid::Uuid;

/// Locale preference cookie name.
pub const LOCALE_COOKIE: &str = "survey_locale";

/// Handoff session cookie name.
pub const SESSION_COOKIE: &str = "survey_session";

/// Extract a cookie value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header_value in headers.get_all(header::COOKIE) {
        let Ok(raw) = header_value.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some((key, value)) = pair.trim().split_once('=') {
                if key == name {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// The stored locale preference, when present and still supported.
///
/// An unsupported or garbage value is the same as no preference: the
/// visitor renegotiates.
pub fn stored_locale(headers: &HeaderMap) -> Option<Locale> {
    cookie_value(headers, LOCALE_COOKIE).and_then(|code| Locale::from_code(&code).ok())
}

/// `Set-Cookie` value pinning the locale preference.
pub fn locale_cookie(locale: Locale, max_age_days: u32) -> String {
    let max_age_secs = u64::from(max_age_days) * 24 * 60 * 60;
    format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        LOCALE_COOKIE,
        locale.code(),
        max_age_secs
    )
}

/// The visitor's handoff session id, when the cookie is present and valid.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    cookie_value(headers, SESSION_COOKIE).and_then(|value| Uuid::parse_str(&value).ok())
}

/// `Set-Cookie` value for a new handoff session.
pub fn session_cookie(session: Uuid) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session
    )
}

/// The visitor's session id, minting a fresh one when absent.
///
/// Returns the id plus the `Set-Cookie` value to attach when one was
/// minted.
pub fn ensure_session(headers: &HeaderMap) -> (Uuid, Option<String>) {
    match session_id(headers) {
        Some(session) => (session, None),
        None => {
            let session = Uuid::new_v4();
            (session, Some(session_cookie(session)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(raw).unwrap());
        headers
    }

    // ==================== Cookie Parsing Tests ====================

    #[test]
    fn test_cookie_value_single() {
        let headers = headers_with_cookie("survey_locale=fr");
        assert_eq!(cookie_value(&headers, LOCALE_COOKIE).as_deref(), Some("fr"));
    }

    #[test]
    fn test_cookie_value_among_others() {
        let headers = headers_with_cookie("theme=dark; survey_locale=de; tz=UTC");
        assert_eq!(cookie_value(&headers, LOCALE_COOKIE).as_deref(), Some("de"));
    }

    #[test]
    fn test_cookie_value_missing() {
        let headers = headers_with_cookie("theme=dark");
        assert_eq!(cookie_value(&headers, LOCALE_COOKIE), None);
        assert_eq!(cookie_value(&HeaderMap::new(), LOCALE_COOKIE), None);
    }

    #[test]
    fn test_cookie_value_does_not_match_prefix() {
        let headers = headers_with_cookie("survey_locale_old=fr");
        assert_eq!(cookie_value(&headers, LOCALE_COOKIE), None);
    }

    // ==================== Stored Locale Tests ====================

    #[test]
    fn test_stored_locale_valid() {
        let headers = headers_with_cookie("survey_locale=es");
        assert_eq!(stored_locale(&headers), Some(Locale::SPANISH));
    }

    #[test]
    fn test_stored_locale_unsupported_is_none() {
        let headers = headers_with_cookie("survey_locale=pt");
        assert_eq!(stored_locale(&headers), None);
    }

    #[test]
    fn test_stored_locale_garbage_is_none() {
        let headers = headers_with_cookie("survey_locale=%00%00");
        assert_eq!(stored_locale(&headers), None);
    }

    // ==================== Cookie Building Tests ====================

    #[test]
    fn test_locale_cookie_format() {
        let cookie = locale_cookie(Locale::FRENCH, 30);
        assert_eq!(
            cookie,
            "survey_locale=fr; Path=/; Max-Age=2592000; SameSite=Lax"
        );
    }

    #[test]
    fn test_session_cookie_is_http_only() {
        let session = Uuid::new_v4();
        let cookie = session_cookie(session);
        assert!(cookie.starts_with("survey_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains(&session.to_string()));
    }

    // ==================== Session Tests ====================

    #[test]
    fn test_session_id_round_trip() {
        let session = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("survey_session={}", session));
        assert_eq!(session_id(&headers), Some(session));
    }

    #[test]
    fn test_session_id_invalid_uuid_is_none() {
        let headers = headers_with_cookie("survey_session=not-a-uuid");
        assert_eq!(session_id(&headers), None);
    }

    #[test]
    fn test_ensure_session_reuses_existing() {
        let session = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("survey_session={}", session));

        let (resolved, set_cookie) = ensure_session(&headers);
        assert_eq!(resolved, session);
        assert!(set_cookie.is_none());
    }

    #[test]
    fn test_ensure_session_mints_when_absent() {
        let (session, set_cookie) = ensure_session(&HeaderMap::new());
        let cookie = set_cookie.expect("should mint a cookie");
        assert!(cookie.contains(&session.to_string()));
    }
}
