//! Per-visitor handoff store.
//!
//! The page that computes a submission outcome (or a gate rejection)
//! navigates the visitor to a separate landing page. The outcome crosses
//! that navigation through this store rather than a server round trip: the
//! computing handler writes one record for the visitor's session, the
//! landing render reads it once, and the record is purged shortly after so
//! nothing leaks into a later, unrelated visit.
//!
//! Records are plain key/value sets over a fixed set of literal keys. The
//! two outcome families (closed gate, completed submission) populate
//! overlapping keys, so every record carries a dedicated outcome flag the
//! landing page discriminates on, never the mere presence of a title key.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// The fixed key set. Writers use the record constructors; these are public
/// so the landing page names the keys it reads.
pub mod keys {
    /// Outcome discriminator: [`OUTCOME_CLOSED`] or [`OUTCOME_COMPLETED`]
    pub const OUTCOME: &str = "outcome";

    pub const SURVEY_TITLE: &str = "survey_title";
    pub const SURVEY_LANG: &str = "survey_lang";

    /// Gate state that closed the survey ("not_started" / "expired")
    pub const CLOSED_STATE: &str = "closed_state";
    pub const CLOSED_TITLE: &str = "closed_title";
    pub const CLOSED_BODY: &str = "closed_body";

    pub const SUBMISSION_REF: &str = "submission_ref";
    pub const COMPLETION_TITLE: &str = "completion_title";
    pub const COMPLETION_BODY: &str = "completion_body";

    pub const OUTCOME_CLOSED: &str = "closed";
    pub const OUTCOME_COMPLETED: &str = "completed";
}

/// One outcome handed across a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRecord {
    entries: HashMap<&'static str, String>,
}

impl HandoffRecord {
    /// Record for a gate rejection.
    pub fn closed(
        survey_title: String,
        locale: &str,
        state: &str,
        title: String,
        body: String,
    ) -> Self {
        let mut entries = HashMap::new();
        entries.insert(keys::OUTCOME, keys::OUTCOME_CLOSED.to_string());
        entries.insert(keys::SURVEY_TITLE, survey_title);
        entries.insert(keys::SURVEY_LANG, locale.to_string());
        entries.insert(keys::CLOSED_STATE, state.to_string());
        entries.insert(keys::CLOSED_TITLE, title);
        entries.insert(keys::CLOSED_BODY, body);
        Self { entries }
    }

    /// Record for a successful submission.
    pub fn completed(
        survey_title: String,
        locale: &str,
        reference: String,
        title: String,
        body: String,
    ) -> Self {
        let mut entries = HashMap::new();
        entries.insert(keys::OUTCOME, keys::OUTCOME_COMPLETED.to_string());
        entries.insert(keys::SURVEY_TITLE, survey_title);
        entries.insert(keys::SURVEY_LANG, locale.to_string());
        entries.insert(keys::SUBMISSION_REF, reference);
        entries.insert(keys::COMPLETION_TITLE, title);
        entries.insert(keys::COMPLETION_BODY, body);
        Self { entries }
    }

    /// Fetch one key. Consumers must treat every key as optional and
    /// supply their own default.
    pub fn get(&self, key: &'static str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The outcome flag, when present and well-formed.
    pub fn outcome(&self) -> Option<&str> {
        self.get(keys::OUTCOME)
    }
}

struct Slot {
    record: HandoffRecord,
    written_at: Instant,
    read_at: Option<Instant>,
}

/// Session-keyed store of pending handoff records.
///
/// `write` replaces the session's record wholesale; `read_once` stamps the
/// first read, after which the record stays visible for `clear_delay`
/// (render logic on the landing page may look again slightly deferred) and
/// is then purged. Unread records are dropped after `ttl` so an abandoned
/// navigation never leaves state behind.
pub struct HandoffStore {
    slots: Mutex<HashMap<Uuid, Slot>>,
    clear_delay: Duration,
    ttl: Duration,
}

impl HandoffStore {
    pub fn new(clear_delay: Duration, ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            clear_delay,
            ttl,
        }
    }

    /// Stage `record` for `session`, replacing any previous record.
    pub fn write(&self, session: Uuid, record: HandoffRecord) {
        let mut slots = self.slots.lock().unwrap();
        slots.insert(
            session,
            Slot {
                record,
                written_at: Instant::now(),
                read_at: None,
            },
        );
    }

    /// Read the pending record for `session`, if one is live.
    ///
    /// The first call stamps the read; the record remains readable until
    /// the clear delay elapses and then disappears. An expired or absent
    /// record yields `None` and the landing page renders generic copy.
    pub fn read_once(&self, session: Uuid) -> Option<HandoffRecord> {
        let now = Instant::now();
        let mut slots = self.slots.lock().unwrap();

        if let Some(slot) = slots.get(&session) {
            if Self::is_expired(slot, now, self.clear_delay, self.ttl) {
                slots.remove(&session);
                return None;
            }
        }

        let slot = slots.get_mut(&session)?;
        if slot.read_at.is_none() {
            slot.read_at = Some(now);
        }
        Some(slot.record.clone())
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots.lock().unwrap();
        let before = slots.len();
        slots.retain(|_, slot| !Self::is_expired(slot, now, self.clear_delay, self.ttl));
        before - slots.len()
    }

    /// Drop everything, read or not.
    pub fn clear_all(&self) {
        self.slots.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(slot: &Slot, now: Instant, clear_delay: Duration, ttl: Duration) -> bool {
        match slot.read_at {
            Some(read_at) => now.duration_since(read_at) >= clear_delay,
            None => now.duration_since(slot.written_at) >= ttl,
        }
    }

    /// Periodically sweep expired records until the store is dropped.
    pub fn run_sweeper(self: std::sync::Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.sweep();
                if removed > 0 {
                    debug!("Handoff sweeper removed {} expired records", removed);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HandoffStore {
        HandoffStore::new(Duration::from_secs(2), Duration::from_secs(600))
    }

    fn closed_record() -> HandoffRecord {
        HandoffRecord::closed(
            "Team pulse".to_string(),
            "fr",
            "expired",
            "Fermé".to_string(),
            "Ce sondage est clos.".to_string(),
        )
    }

    fn completed_record() -> HandoffRecord {
        HandoffRecord::completed(
            "Team pulse".to_string(),
            "en",
            "resp_123".to_string(),
            "Thank you!".to_string(),
            "Your response has been recorded.".to_string(),
        )
    }

    // ==================== Record Tests ====================

    #[test]
    fn test_closed_record_keys() {
        let record = closed_record();
        assert_eq!(record.outcome(), Some(keys::OUTCOME_CLOSED));
        assert_eq!(record.get(keys::CLOSED_STATE), Some("expired"));
        assert_eq!(record.get(keys::CLOSED_TITLE), Some("Fermé"));
        assert_eq!(record.get(keys::SURVEY_LANG), Some("fr"));
        // Completion keys are not visible on a closed record
        assert_eq!(record.get(keys::SUBMISSION_REF), None);
        assert_eq!(record.get(keys::COMPLETION_TITLE), None);
    }

    #[test]
    fn test_completed_record_keys() {
        let record = completed_record();
        assert_eq!(record.outcome(), Some(keys::OUTCOME_COMPLETED));
        assert_eq!(record.get(keys::SUBMISSION_REF), Some("resp_123"));
        assert_eq!(record.get(keys::CLOSED_TITLE), None);
        assert_eq!(record.get(keys::CLOSED_STATE), None);
    }

    // ==================== Read-Once Lifecycle Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_write_then_read_yields_record() {
        let store = store();
        let session = Uuid::new_v4();

        store.write(session, closed_record());
        let record = store.read_once(session).expect("record should be live");
        assert_eq!(record.get(keys::CLOSED_TITLE), Some("Fermé"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_stays_visible_within_clear_delay() {
        let store = store();
        let session = Uuid::new_v4();

        store.write(session, completed_record());
        assert!(store.read_once(session).is_some());

        tokio::time::advance(Duration::from_millis(500)).await;
        // Slightly deferred render logic may still see it
        assert!(store.read_once(session).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_cleared_after_delay() {
        let store = store();
        let session = Uuid::new_v4();

        store.write(session, completed_record());
        assert!(store.read_once(session).is_some());

        tokio::time::advance(Duration::from_secs(3)).await;
        // A second, unrelated visit sees nothing
        assert!(store.read_once(session).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_record_expires_after_ttl() {
        let store = store();
        let session = Uuid::new_v4();

        store.write(session, closed_record());
        tokio::time::advance(Duration::from_secs(601)).await;

        assert!(store.read_once(session).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_record_survives_until_ttl() {
        let store = store();
        let session = Uuid::new_v4();

        store.write(session, closed_record());
        tokio::time::advance(Duration::from_secs(599)).await;

        assert!(store.read_once(session).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_replaces_previous_record() {
        let store = store();
        let session = Uuid::new_v4();

        store.write(session, closed_record());
        store.write(session, completed_record());

        let record = store.read_once(session).expect("record should be live");
        assert_eq!(record.outcome(), Some(keys::OUTCOME_COMPLETED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_are_isolated() {
        let store = store();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.write(alice, completed_record());

        assert!(store.read_once(bob).is_none());
        assert!(store.read_once(alice).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_without_write_is_none() {
        let store = store();
        assert!(store.read_once(Uuid::new_v4()).is_none());
    }

    // ==================== Sweep Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_read_and_stale_records() {
        let store = store();
        let read_session = Uuid::new_v4();
        let stale_session = Uuid::new_v4();
        let fresh_session = Uuid::new_v4();

        store.write(stale_session, closed_record());
        tokio::time::advance(Duration::from_secs(599)).await;

        store.write(read_session, completed_record());
        store.read_once(read_session);
        store.write(fresh_session, completed_record());

        tokio::time::advance(Duration::from_secs(2)).await;

        // read_session passed its clear delay, stale_session its ttl
        assert_eq!(store.sweep(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.read_once(fresh_session).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all() {
        let store = store();
        store.write(Uuid::new_v4(), closed_record());
        store.write(Uuid::new_v4(), completed_record());

        store.clear_all();
        assert!(store.is_empty());
    }
}
