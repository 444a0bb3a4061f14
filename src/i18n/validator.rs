//! Translation coverage auditing for fetched surveys.
//!
//! Survey copy is authored in the backend and arrives here with whatever
//! coverage the author managed. The validator walks every bundle of a
//! fetched survey and reports what the fallback chain will be papering
//! over: missing locales, empty bundles, and `{placeholder}` drift between
//! the default text and its translations. The report is advisory: it is
//! logged, never used to block rendering.

use crate::i18n::{Locale, LocaleRegistry, LocalizedText};
use crate::survey::Survey;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Audit results for one survey's bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Bundles a visitor will see literal fallback copy for
    pub errors: Vec<String>,

    /// Coverage gaps the fallback chain absorbs
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for survey translation coverage.
pub struct BundleValidator;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

impl BundleValidator {
    /// Audit every bundle of `survey`.
    pub fn validate(survey: &Survey) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::check_bundle(&mut report, "title", &survey.title, true);

        for question in &survey.questions {
            let label = format!("question '{}' prompt", question.id);
            Self::check_bundle(&mut report, &label, &question.prompt, true);

            let label = format!("question '{}' hint", question.id);
            Self::check_bundle(&mut report, &label, &question.hint, false);
        }

        for (name, notice) in [
            ("start notice", &survey.start_notice),
            ("expiry notice", &survey.expiry_notice),
            ("completion notice", &survey.completion_notice),
        ] {
            Self::check_bundle(&mut report, &format!("{} title", name), &notice.title, false);
            Self::check_bundle(&mut report, &format!("{} body", name), &notice.body, false);
        }

        report
    }

    /// Check one bundle: emptiness, per-locale coverage, placeholder drift.
    ///
    /// `required` marks bundles a visitor always sees (title, prompts);
    /// those produce an error when entirely empty, the rest only warn.
    fn check_bundle(
        report: &mut ValidationReport,
        label: &str,
        bundle: &LocalizedText,
        required: bool,
    ) {
        if bundle.is_empty() || bundle.locales().all(|code| {
            bundle.get(code).map(|t| t.trim().is_empty()).unwrap_or(true)
        }) {
            if required {
                report
                    .errors
                    .push(format!("{}: no usable translation in any locale", label));
            }
            // Optional copy may legitimately be absent; nothing to check
            return;
        }

        for locale in LocaleRegistry::get().list_enabled() {
            match bundle.get(locale.code) {
                Some(text) if !text.trim().is_empty() => {}
                Some(_) => report
                    .warnings
                    .push(format!("{}: blank translation for '{}'", label, locale.code)),
                None => report
                    .warnings
                    .push(format!("{}: missing translation for '{}'", label, locale.code)),
            }
        }

        Self::check_placeholders(report, label, bundle);
    }

    /// Compare `{placeholder}` tokens between the default-locale text and
    /// every translation. A translator dropping or renaming a placeholder
    /// breaks interpolation at render time.
    fn check_placeholders(report: &mut ValidationReport, label: &str, bundle: &LocalizedText) {
        let default_code = Locale::default_locale().code();
        let Some(default_text) = bundle.get(default_code) else {
            return;
        };

        let expected = Self::extract_placeholders(default_text);

        for code in bundle.locales() {
            if code == default_code {
                continue;
            }
            let Some(text) = bundle.get(code) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }

            let found = Self::extract_placeholders(text);
            if found != expected {
                report.warnings.push(format!(
                    "{}: placeholder mismatch for '{}': expected {:?}, found {:?}",
                    label, code, expected, found
                ));
            }
        }
    }

    fn extract_placeholders(text: &str) -> BTreeSet<String> {
        let regex = PLACEHOLDER_REGEX
            .get_or_init(|| Regex::new(r"\{[a-z0-9_]+\}").expect("valid placeholder regex"));
        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
