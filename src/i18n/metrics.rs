//! Fallback resolution metrics.
//!
//! Tracks which tier of the bundle fallback chain satisfied each resolution.
//! A rising default- or literal-fallback rate is the operational signal that
//! survey copy is missing translations for locales visitors actually use.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Global fallback metrics singleton.
pub struct FallbackMetrics {
    /// Resolutions satisfied by the requested locale
    exact_hits: AtomicUsize,

    /// Resolutions that fell back to the default locale
    default_fallbacks: AtomicUsize,

    /// Resolutions that fell back to the bundle's first entry
    first_entry_fallbacks: AtomicUsize,

    /// Resolutions that fell all the way through to the caller's literal
    literal_fallbacks: AtomicUsize,
}

static METRICS: OnceLock<FallbackMetrics> = OnceLock::new();

impl FallbackMetrics {
    /// Get the global metrics instance.
    pub fn global() -> &'static FallbackMetrics {
        METRICS.get_or_init(|| FallbackMetrics {
            exact_hits: AtomicUsize::new(0),
            default_fallbacks: AtomicUsize::new(0),
            first_entry_fallbacks: AtomicUsize::new(0),
            literal_fallbacks: AtomicUsize::new(0),
        })
    }

    pub fn record_exact_hit(&self) {
        self.exact_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_default_fallback(&self) {
        self.default_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_first_entry_fallback(&self) {
        self.first_entry_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_literal_fallback(&self) {
        self.literal_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exact_hits(&self) -> usize {
        self.exact_hits.load(Ordering::Relaxed)
    }

    pub fn default_fallbacks(&self) -> usize {
        self.default_fallbacks.load(Ordering::Relaxed)
    }

    pub fn first_entry_fallbacks(&self) -> usize {
        self.first_entry_fallbacks.load(Ordering::Relaxed)
    }

    pub fn literal_fallbacks(&self) -> usize {
        self.literal_fallbacks.load(Ordering::Relaxed)
    }

    /// Generate a point-in-time report.
    pub fn report(&self) -> MetricsReport {
        let exact = self.exact_hits();
        let default = self.default_fallbacks();
        let first_entry = self.first_entry_fallbacks();
        let literal = self.literal_fallbacks();
        let total = exact + default + first_entry + literal;

        let exact_hit_rate = if total > 0 {
            (exact as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            resolutions: total,
            exact_hits: exact,
            default_fallbacks: default,
            first_entry_fallbacks: first_entry,
            literal_fallbacks: literal,
            exact_hit_rate,
        }
    }

    /// Reset all counters to zero (useful for testing).
    #[cfg(test)]
    pub fn reset(&self) {
        self.exact_hits.store(0, Ordering::Relaxed);
        self.default_fallbacks.store(0, Ordering::Relaxed);
        self.first_entry_fallbacks.store(0, Ordering::Relaxed);
        self.literal_fallbacks.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time fallback resolution statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Total resolutions performed
    pub resolutions: usize,

    /// Resolutions satisfied by the requested locale
    pub exact_hits: usize,

    /// Resolutions that used the default locale
    pub default_fallbacks: usize,

    /// Resolutions that used the bundle's first entry
    pub first_entry_fallbacks: usize,

    /// Resolutions that used the caller's literal fallback
    pub literal_fallbacks: usize,

    /// Exact hit rate as a percentage (0-100)
    pub exact_hit_rate: f64,
}
