//! Locale negotiation: decide which language a visitor sees.
//!
//! Negotiation is a pure function over a stored preference and the request's
//! `Accept-Language` header. A previously pinned preference always wins;
//! otherwise the header is parsed into weighted candidates and the first
//! supported one is chosen; if nothing matches, the default locale is
//! returned. Negotiation never fails: malformed header entries are demoted,
//! not rejected. Persisting the chosen locale (the 30-day preference cookie)
//! is the caller's job at the routing edge.

use crate::i18n::Locale;

/// Negotiate the locale for a request.
///
/// Precedence:
/// 1. `stored`: an already-pinned preference, honored as long as it is
///    still a supported locale.
/// 2. The first supported primary subtag from `accept_language`, in
///    descending quality order. Equal weights keep header order.
/// 3. The default locale.
pub fn negotiate(stored: Option<Locale>, accept_language: Option<&str>) -> Locale {
    if let Some(locale) = stored {
        // A Locale value is registry-validated by construction
        return locale;
    }

    if let Some(header) = accept_language {
        for (subtag, _weight) in parse_accept_language(header) {
            if let Ok(locale) = Locale::from_code(&subtag) {
                return locale;
            }
        }
    }

    Locale::default_locale()
}

/// Parse an `Accept-Language` header into `(primary_subtag, weight)` pairs,
/// sorted by descending weight.
///
/// Entries are split on commas; each entry may carry a `;q=` quality weight,
/// defaulting to 1.0 when absent. Only the primary subtag is kept ("en" from
/// "en-US"). Malformed entries (non-numeric or non-finite weight, missing
/// subtag) get weight 0.0 so they sort last instead of failing the parse.
/// The sort is stable: equally weighted entries keep their header order,
/// which is how the header expresses preference among them.
pub fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
    let mut entries: Vec<(String, f32)> = Vec::new();

    for part in header.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (tag, weight) = match part.split_once(';') {
            Some((tag, params)) => (tag.trim(), parse_quality(params)),
            None => (part, 1.0),
        };

        let subtag = tag
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        // Missing subtag: keep the entry but make sure it sorts last
        let weight = if subtag.is_empty() { 0.0 } else { weight };

        entries.push((subtag, weight));
    }

    // Stable sort preserves header order among equal weights
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
}

/// Extract the quality weight from an entry's parameter section.
///
/// Anything that does not parse as a finite number is treated as 0.0.
fn parse_quality(params: &str) -> f32 {
    for param in params.split(';') {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim() == "q" {
                return value
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|q| q.is_finite())
                    .unwrap_or(0.0);
            }
        }
    }
    // A parameter section without a q= value ("en;level=1") keeps full weight
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocaleRegistry;
    use proptest::prelude::*;

    // ==================== Stored Preference Tests ====================

    #[test]
    fn test_stored_preference_wins_over_header() {
        let chosen = negotiate(Some(Locale::GERMAN), Some("fr,es;q=0.9"));
        assert_eq!(chosen, Locale::GERMAN);
    }

    #[test]
    fn test_stored_preference_wins_without_header() {
        let chosen = negotiate(Some(Locale::SPANISH), None);
        assert_eq!(chosen, Locale::SPANISH);
    }

    // ==================== Header Negotiation Tests ====================

    #[test]
    fn test_highest_supported_weight_wins() {
        // xx has the top weight but is unsupported; de is the best supported
        let chosen = negotiate(None, Some("fr;q=0.5,de;q=0.9,xx;q=1.0"));
        assert_eq!(chosen, Locale::GERMAN);
    }

    #[test]
    fn test_region_suffix_is_stripped() {
        let chosen = negotiate(None, Some("fr-CA,en;q=0.8"));
        assert_eq!(chosen, Locale::FRENCH);
    }

    #[test]
    fn test_equal_weights_keep_header_order() {
        let chosen = negotiate(None, Some("es,de"));
        assert_eq!(chosen, Locale::SPANISH);

        let chosen = negotiate(None, Some("de,es"));
        assert_eq!(chosen, Locale::GERMAN);
    }

    #[test]
    fn test_unsupported_only_falls_back_to_default() {
        let chosen = negotiate(None, Some("pt-BR,ja;q=0.7"));
        assert_eq!(chosen, Locale::default_locale());
    }

    #[test]
    fn test_no_inputs_falls_back_to_default() {
        assert_eq!(negotiate(None, None), Locale::default_locale());
    }

    #[test]
    fn test_empty_header_falls_back_to_default() {
        assert_eq!(negotiate(None, Some("")), Locale::default_locale());
    }

    // ==================== Malformed Header Tests ====================

    #[test]
    fn test_malformed_weight_sorts_last() {
        // de's weight is garbage, so a valid lower-weighted fr still wins
        let chosen = negotiate(None, Some("de;q=abc,fr;q=0.2"));
        assert_eq!(chosen, Locale::FRENCH);
    }

    #[test]
    fn test_nan_weight_sorts_last() {
        let chosen = negotiate(None, Some("de;q=NaN,es;q=0.1"));
        assert_eq!(chosen, Locale::SPANISH);
    }

    #[test]
    fn test_missing_subtag_is_ignored() {
        let chosen = negotiate(None, Some(";q=1.0,es;q=0.5"));
        assert_eq!(chosen, Locale::SPANISH);
    }

    #[test]
    fn test_garbage_header_never_panics() {
        for header in [",,,", ";;;", "q=", "=;=,;q", "en;;q==0.5"] {
            let chosen = negotiate(None, Some(header));
            assert!(LocaleRegistry::get().is_enabled(chosen.code()));
        }
    }

    #[test]
    fn test_non_q_parameter_keeps_full_weight() {
        let chosen = negotiate(None, Some("es;level=1,de;q=0.9"));
        assert_eq!(chosen, Locale::SPANISH);
    }

    // ==================== Parser Tests ====================

    #[test]
    fn test_parse_accept_language_orders_by_weight() {
        let parsed = parse_accept_language("en;q=0.3,fr;q=0.9,de");
        let codes: Vec<&str> = parsed.iter().map(|(tag, _)| tag.as_str()).collect();
        assert_eq!(codes, vec!["de", "fr", "en"]);
    }

    #[test]
    fn test_parse_accept_language_uppercase_normalized() {
        let parsed = parse_accept_language("EN-us");
        assert_eq!(parsed[0].0, "en");
    }

    // ==================== Closure Property ====================

    proptest! {
        /// Negotiation always terminates in a supported locale, for any
        /// header bytes and any stored preference.
        #[test]
        fn prop_negotiate_is_closed_over_supported_locales(
            header in "\\PC*",
            stored_idx in proptest::option::of(0usize..4),
        ) {
            let stored = stored_idx.map(|i| {
                [Locale::ENGLISH, Locale::SPANISH, Locale::FRENCH, Locale::GERMAN][i]
            });
            let chosen = negotiate(stored, Some(&header));
            prop_assert!(LocaleRegistry::get().is_enabled(chosen.code()));
        }
    }
}
