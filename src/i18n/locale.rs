//! Locale type: a validated, registry-backed language tag.
//!
//! A `Locale` can only be constructed for a code the registry knows and has
//! enabled, so holding one is proof the tag is servable. It is `Copy` and is
//! passed by value through the render path.

use crate::i18n::{LocaleConfig, LocaleRegistry};
use anyhow::{bail, Result};
use std::fmt;

/// A validated locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    /// ISO 639-1 language code (e.g., "en", "fr")
    code: &'static str,
}

impl Locale {
    pub const ENGLISH: Locale = Locale { code: "en" };
    pub const SPANISH: Locale = Locale { code: "es" };
    pub const FRENCH: Locale = Locale { code: "fr" };
    pub const GERMAN: Locale = Locale { code: "de" };

    /// Create a Locale from a language code string.
    ///
    /// # Returns
    /// * `Ok(Locale)` if the code is supported and enabled
    /// * `Err` if the code is unknown or the locale is disabled
    pub fn from_code(code: &str) -> Result<Locale> {
        let registry = LocaleRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Locale {
                code: config.code, // Use the static str from the registry
            }),
            Some(_) => bail!("Locale '{}' is not enabled", code),
            None => bail!("Unknown locale code: '{}'", code),
        }
    }

    /// The default locale every negotiation falls back to.
    pub fn default_locale() -> Locale {
        let config = LocaleRegistry::get().default_locale();
        Locale { code: config.code }
    }

    /// The ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Full registry configuration for this locale.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a `Locale` constructed through `from_code` or the constants.
    pub fn config(&self) -> &'static LocaleConfig {
        LocaleRegistry::get()
            .get_by_code(self.code)
            .expect("Locale code should always be valid")
    }

    /// English name of the language (e.g., "German").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Native name of the language (e.g., "Deutsch").
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Whether this is the default locale.
    pub fn is_default(&self) -> bool {
        self.config().is_default
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
