//! Locale registry: single source of truth for the supported locales.
//!
//! Every locale the gateway can serve is declared here. The registry is a
//! process-wide singleton initialized lazily via `OnceLock`; negotiation,
//! path rewriting, and bundle resolution all validate against it so a
//! visitor can never end up on an unsupported language tag.

use std::sync::OnceLock;

/// Configuration for a supported locale.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// ISO 639-1 language code (e.g., "en", "fr")
    pub code: &'static str,

    /// English name of the language (e.g., "French")
    pub name: &'static str,

    /// Native name of the language (e.g., "Français")
    pub native_name: &'static str,

    /// Whether this is the default locale (exactly one must be true)
    pub is_default: bool,

    /// Whether this locale is enabled for visitors
    pub enabled: bool,
}

/// Global locale registry singleton.
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global locale registry instance.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: supported_locales(),
        })
    }

    /// Look up a locale configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// All enabled locales, in declaration order.
    pub fn list_enabled(&self) -> Vec<&LocaleConfig> {
        self.locales
            .iter()
            .filter(|locale| locale.enabled)
            .collect()
    }

    /// The default locale configuration.
    ///
    /// # Panics
    /// Panics if zero or more than one default locale is declared, which
    /// indicates a configuration error in `supported_locales`.
    pub fn default_locale(&self) -> &LocaleConfig {
        let defaults: Vec<_> = self
            .locales
            .iter()
            .filter(|locale| locale.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default locale declared in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default locales declared in registry"),
        }
    }

    /// Check whether a code names a supported, enabled locale.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|locale| locale.enabled)
            .unwrap_or(false)
    }
}

/// The locales served by this deployment.
///
/// English is the default: survey authors write their copy in English first
/// and translate from there, so it doubles as the fallback target.
fn supported_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_default: true,
            enabled: true,
        },
        LocaleConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_default: false,
            enabled: true,
        },
        LocaleConfig {
            code: "fr",
            name: "French",
            native_name: "Français",
            is_default: false,
            enabled: true,
        },
        LocaleConfig {
            code: "de",
            name: "German",
            native_name: "Deutsch",
            is_default: false,
            enabled: true,
        },
    ]
}
