//! Shared application state.

use crate::backend::BackendClient;
use crate::config::Config;
use crate::handoff::HandoffStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// State shared by every handler.
///
/// Nothing here is shared across visitors except read-only configuration:
/// the handoff store and the in-flight set are both keyed per session.
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub handoff: Arc<HandoffStore>,
    inflight: Mutex<HashSet<Uuid>>,
}

impl AppState {
    pub fn new(config: Config) -> Arc<Self> {
        let backend = BackendClient::new(&config);
        let handoff = Arc::new(HandoffStore::new(
            Duration::from_millis(config.handoff_clear_delay_ms),
            Duration::from_secs(config.handoff_ttl_secs),
        ));

        Arc::new(Self {
            config,
            backend,
            handoff,
            inflight: Mutex::new(HashSet::new()),
        })
    }

    /// Claim the session's submission slot.
    ///
    /// At most one submission is in flight per visitor session; a second
    /// attempt while one is outstanding gets `None` and must be rejected,
    /// never queued. The slot is released when the guard drops.
    pub fn begin_submission(&self, session: Uuid) -> Option<InFlightSubmission<'_>> {
        let mut inflight = self.inflight.lock().unwrap();
        if inflight.insert(session) {
            Some(InFlightSubmission {
                state: self,
                session,
            })
        } else {
            None
        }
    }

    #[cfg(test)]
    fn submission_in_flight(&self, session: Uuid) -> bool {
        self.inflight.lock().unwrap().contains(&session)
    }
}

/// RAII guard for a session's in-flight submission slot.
pub struct InFlightSubmission<'a> {
    state: &'a AppState,
    session: Uuid,
}

impl Drop for InFlightSubmission<'_> {
    fn drop(&mut self) {
        self.state.inflight.lock().unwrap().remove(&self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> Arc<AppState> {
        AppState::new(Config {
            environment: "test".to_string(),
            backend_api_url: "http://backend.test".to_string(),
            backend_api_key: None,
            internal_api_key: None,
            locale_cookie_max_age_days: 30,
            handoff_clear_delay_ms: 2_000,
            handoff_ttl_secs: 600,
            port: 8080,
        })
    }

    #[test]
    fn test_second_submission_is_rejected_while_in_flight() {
        let state = test_state();
        let session = Uuid::new_v4();

        let guard = state.begin_submission(session).expect("first claim");
        assert!(state.begin_submission(session).is_none());
        drop(guard);
    }

    #[test]
    fn test_slot_released_on_drop() {
        let state = test_state();
        let session = Uuid::new_v4();

        {
            let _guard = state.begin_submission(session).expect("first claim");
            assert!(state.submission_in_flight(session));
        }

        assert!(!state.submission_in_flight(session));
        assert!(state.begin_submission(session).is_some());
    }

    #[test]
    fn test_sessions_claim_independently() {
        let state = test_state();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let _alice_guard = state.begin_submission(alice).expect("alice claims");
        assert!(state.begin_submission(bob).is_some());
    }
}
