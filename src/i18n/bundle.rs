//! Localized text bundles and the fallback resolution chain.
//!
//! A `LocalizedText` maps locale codes to translated strings. Bundles come
//! from the backend as JSON objects and are rarely complete; partial
//! translation coverage is the normal case, not an error. Resolution is a
//! total function: exact match, then the default locale, then the first
//! entry in insertion order, then a caller-supplied literal. A visitor
//! filling out a public survey must never see a missing-key placeholder.

use crate::i18n::metrics::FallbackMetrics;
use crate::i18n::Locale;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An insertion-ordered mapping from locale code to translated string.
///
/// Entry order matters: the third fallback tier is "first entry in the
/// bundle", so deserialization preserves the document order of the backend
/// payload rather than re-sorting keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText {
    entries: Vec<(String, String)>,
}

impl LocalizedText {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a bundle from `(code, text)` pairs, keeping their order.
    pub fn from_pairs<I, C, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, T)>,
        C: Into<String>,
        T: Into<String>,
    {
        let mut bundle = Self::new();
        for (code, text) in pairs {
            bundle.insert(code.into(), text.into());
        }
        bundle
    }

    /// Insert or replace a translation. Replacing keeps the original
    /// position so resolution order stays stable.
    pub fn insert(&mut self, code: String, text: String) {
        match self.entries.iter_mut().find(|(c, _)| *c == code) {
            Some((_, existing)) => *existing = text,
            None => self.entries.push((code, text)),
        }
    }

    /// Exact lookup by locale code.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, text)| text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Locale codes present in this bundle, in insertion order.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(code, _)| code.as_str())
    }

    /// Resolve this bundle to a display string for `requested`.
    ///
    /// Fallback chain: exact match on `requested` → the default locale →
    /// the first entry in insertion order → `literal_fallback`. Blank
    /// entries are treated as untranslated and skipped. Every call
    /// produces a string; the tier that satisfied it is recorded in
    /// [`FallbackMetrics`].
    pub fn resolve(&self, requested: Locale, literal_fallback: &str) -> String {
        let metrics = FallbackMetrics::global();

        if let Some(text) = self.get(requested.code()).filter(|t| !t.trim().is_empty()) {
            metrics.record_exact_hit();
            return text.to_string();
        }

        let default = Locale::default_locale();
        if let Some(text) = self.get(default.code()).filter(|t| !t.trim().is_empty()) {
            metrics.record_default_fallback();
            return text.to_string();
        }

        if let Some((_, text)) = self.entries.iter().find(|(_, t)| !t.trim().is_empty()) {
            metrics.record_first_entry_fallback();
            return text.to_string();
        }

        metrics.record_literal_fallback();
        literal_fallback.to_string()
    }
}

impl Serialize for LocalizedText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, text) in &self.entries {
            map.serialize_entry(code, text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LocalizedText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BundleVisitor;

        impl<'de> Visitor<'de> for BundleVisitor {
            type Value = LocalizedText;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of locale codes to translated strings")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut bundle = LocalizedText::new();
                while let Some((code, text)) = access.next_entry::<String, String>()? {
                    bundle.insert(code, text);
                }
                Ok(bundle)
            }
        }

        deserializer.deserialize_map(BundleVisitor)
    }
}
