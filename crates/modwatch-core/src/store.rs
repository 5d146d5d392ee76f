//! Moderation state store
//!
//! Owns every piece of process-wide mutable state: usage counters, the
//! active-user set, the bounded flagged-message log, the bounded message
//! history, and the focus-mode timer. One exclusive lock serializes all
//! reads and writes; snapshots that combine several fields are computed
//! while still holding it, so there are no torn reads.

use crate::event::{ChannelEvent, EventBus};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::{debug, info};

/// Flagged-message log bound; oldest entries are evicted first.
const FLAGGED_LOG_LIMIT: usize = 200;

/// Message-history bound.
const HISTORY_LIMIT: usize = 1000;

/// A message the checker flagged, kept for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedMessage {
    pub user: String,
    pub text: String,
    pub categories: BTreeMap<String, bool>,
    pub timestamp: DateTime<Utc>,
}

/// One moderated message, flagged or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub flagged: bool,
    pub timestamp: DateTime<Utc>,
}

/// Consistent view of the focus timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSnapshot {
    pub active: bool,
    pub started_at: Option<DateTime<Utc>>,
    /// Accumulated focus time plus the live session, whole seconds.
    pub duration_seconds: i64,
    pub blocked_sites: Vec<String>,
}

/// Aggregate stats for the dashboard.
///
/// Message counts come from the raw monotonic counters, not from the
/// bounded history log, so they keep growing past the log bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_messages: u64,
    pub flagged_messages: u64,
    pub active_users: usize,
    pub flagged_recent: usize,
    pub focus_active: bool,
    pub focus_duration_seconds: i64,
}

struct FocusState {
    active: bool,
    started_at: Option<DateTime<Utc>>,
    blocked_sites: Vec<String>,
    total_focus_time: Duration,
}

impl FocusState {
    fn new() -> Self {
        Self {
            active: false,
            started_at: None,
            blocked_sites: Vec::new(),
            total_focus_time: Duration::zero(),
        }
    }
}

struct StoreInner {
    total_messages: u64,
    flagged_messages: u64,
    active_users: HashSet<String>,
    flagged: VecDeque<FlaggedMessage>,
    history: VecDeque<HistoryEntry>,
    focus: FocusState,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            total_messages: 0,
            flagged_messages: 0,
            active_users: HashSet::new(),
            flagged: VecDeque::new(),
            history: VecDeque::new(),
            focus: FocusState::new(),
        }
    }

    /// Focus view at `now`. Callers hold the store lock.
    fn focus_snapshot(&self, now: DateTime<Utc>) -> FocusSnapshot {
        let elapsed = match (self.focus.active, self.focus.started_at) {
            (true, Some(started_at)) => now - started_at,
            _ => Duration::zero(),
        };
        FocusSnapshot {
            active: self.focus.active,
            started_at: self.focus.started_at,
            duration_seconds: (self.focus.total_focus_time + elapsed).num_seconds(),
            blocked_sites: self.focus.blocked_sites.clone(),
        }
    }
}

/// Central mutable state for the moderation backend
///
/// Thread-safe: every operation takes the single internal lock for its
/// whole duration. Also owns the event bus the realtime layer subscribes
/// to; focus transitions publish their own status events.
pub struct ModerationStore {
    inner: Mutex<StoreInner>,
    events: EventBus,
}

impl ModerationStore {
    /// Create an empty store with a default-capacity event bus.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::new()),
            events: EventBus::default_capacity(),
        }
    }

    /// Get the event bus for subscribing to realtime updates
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Count a moderated message and remember the user.
    ///
    /// Empty users stay out of the active set but are recorded in the
    /// history as "unknown".
    pub fn record_message(&self, user: &str, flagged: bool) {
        let mut inner = self.inner.lock();

        inner.total_messages += 1;
        if flagged {
            inner.flagged_messages += 1;
        }
        if !user.is_empty() {
            inner.active_users.insert(user.to_string());
        }

        inner.history.push_back(HistoryEntry {
            user: if user.is_empty() { "unknown" } else { user }.to_string(),
            flagged,
            timestamp: Utc::now(),
        });
        if inner.history.len() > HISTORY_LIMIT {
            inner.history.pop_front();
        }
    }

    /// Append to the flagged-message log, evicting the oldest entry once
    /// the bound is exceeded.
    pub fn record_flagged(&self, user: &str, text: &str, categories: BTreeMap<String, bool>) {
        let entry = FlaggedMessage {
            user: if user.is_empty() { "unknown" } else { user }.to_string(),
            text: text.to_string(),
            categories,
            timestamp: Utc::now(),
        };

        let mut inner = self.inner.lock();
        inner.flagged.push_back(entry);
        if inner.flagged.len() > FLAGGED_LOG_LIMIT {
            inner.flagged.pop_front();
        }
        debug!(user, log_len = inner.flagged.len(), "Flagged message recorded");
    }

    /// Begin focus mode (idempotent) and replace the blocked-site list.
    ///
    /// Re-starting while active keeps the original `started_at`; the
    /// blocked sites are always replaced wholesale (last call wins),
    /// deduplicated and lowercased.
    pub fn focus_start(&self, sites: &[String]) -> FocusSnapshot {
        let now = Utc::now();
        let snapshot = {
            let mut inner = self.inner.lock();
            if !inner.focus.active {
                inner.focus.active = true;
                inner.focus.started_at = Some(now);
            }
            let deduped: BTreeSet<String> = sites
                .iter()
                .map(|site| site.trim().to_lowercase())
                .filter(|site| !site.is_empty())
                .collect();
            inner.focus.blocked_sites = deduped.into_iter().collect();
            inner.focus_snapshot(now)
        };

        info!(sites = snapshot.blocked_sites.len(), "Focus mode started");
        self.events.publish(ChannelEvent::FocusStatus(snapshot.clone()));
        snapshot
    }

    /// Stop focus mode, folding the elapsed session into the accumulated
    /// total. Stopping while inert is a no-op apart from the broadcast.
    pub fn focus_stop(&self) -> FocusSnapshot {
        let now = Utc::now();
        let snapshot = {
            let mut inner = self.inner.lock();
            if inner.focus.active {
                if let Some(started_at) = inner.focus.started_at {
                    inner.focus.total_focus_time = inner.focus.total_focus_time + (now - started_at);
                }
            }
            inner.focus.active = false;
            inner.focus.started_at = None;
            inner.focus_snapshot(now)
        };

        info!(
            total_seconds = snapshot.duration_seconds,
            "Focus mode stopped"
        );
        self.events.publish(ChannelEvent::FocusStatus(snapshot.clone()));
        snapshot
    }

    /// Current focus view without mutating anything.
    pub fn focus_snapshot(&self) -> FocusSnapshot {
        let now = Utc::now();
        self.inner.lock().focus_snapshot(now)
    }

    /// Aggregate stats for the dashboard.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        let now = Utc::now();
        let inner = self.inner.lock();
        let focus = inner.focus_snapshot(now);
        StatsSnapshot {
            total_messages: inner.total_messages,
            flagged_messages: inner.flagged_messages,
            active_users: inner.active_users.len(),
            flagged_recent: inner.flagged.len(),
            focus_active: focus.active,
            focus_duration_seconds: focus.duration_seconds,
        }
    }

    /// Clone of the current flagged-message log, oldest first.
    pub fn flagged_messages(&self) -> Vec<FlaggedMessage> {
        self.inner.lock().flagged.iter().cloned().collect()
    }

    /// Clone of the bounded message history, oldest first.
    pub fn message_history(&self) -> Vec<HistoryEntry> {
        self.inner.lock().history.iter().cloned().collect()
    }
}

impl Default for ModerationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn flagged_categories() -> BTreeMap<String, bool> {
        let mut categories = BTreeMap::new();
        categories.insert("violence".to_string(), true);
        categories
    }

    #[test]
    fn test_record_message_counters() {
        let store = ModerationStore::new();

        store.record_message("alice", false);
        store.record_message("bob", true);
        store.record_message("alice", true);

        let stats = store.stats_snapshot();
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.flagged_messages, 2);
        assert_eq!(stats.active_users, 2);
    }

    #[test]
    fn test_empty_user_stays_out_of_active_set() {
        let store = ModerationStore::new();

        store.record_message("", false);

        let stats = store.stats_snapshot();
        assert_eq!(stats.total_messages, 1);
        assert_eq!(stats.active_users, 0);

        let history = store.message_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, "unknown");
    }

    #[test]
    fn test_flagged_log_bounded_at_200() {
        let store = ModerationStore::new();

        for i in 0..201 {
            store.record_flagged("user", &format!("message {i}"), flagged_categories());
        }

        let log = store.flagged_messages();
        assert_eq!(log.len(), 200);
        // Entry 0 was evicted; entry 200 is the newest.
        assert_eq!(log.first().unwrap().text, "message 1");
        assert_eq!(log.last().unwrap().text, "message 200");
    }

    #[test]
    fn test_history_bounded_at_1000() {
        let store = ModerationStore::new();

        for i in 0..1005 {
            store.record_message(&format!("user-{i}"), false);
        }

        assert_eq!(store.message_history().len(), 1000);
        // Stats come from raw counters, not the trimmed history.
        assert_eq!(store.stats_snapshot().total_messages, 1005);
    }

    #[test]
    fn test_focus_start_normalizes_and_dedupes_sites() {
        let store = ModerationStore::new();

        let snapshot = store.focus_start(&[
            "YouTube.com".to_string(),
            "twitter.com".to_string(),
            "YOUTUBE.com".to_string(),
            "  ".to_string(),
        ]);

        assert!(snapshot.active);
        assert_eq!(
            snapshot.blocked_sites,
            vec!["twitter.com".to_string(), "youtube.com".to_string()]
        );
    }

    #[test]
    fn test_focus_restart_keeps_started_at_replaces_sites() {
        let store = ModerationStore::new();

        let first = store.focus_start(&["a.com".to_string()]);
        let second = store.focus_start(&["b.com".to_string()]);

        assert_eq!(first.started_at, second.started_at);
        assert_eq!(second.blocked_sites, vec!["b.com".to_string()]);
    }

    #[test]
    fn test_focus_stop_deactivates_and_accumulates() {
        let store = ModerationStore::new();

        store.focus_start(&["a.com".to_string()]);
        let stopped = store.focus_stop();

        assert!(!stopped.active);
        assert!(stopped.started_at.is_none());
        assert!(stopped.duration_seconds >= 0);

        // Stopping again while inert does not disturb the total.
        let again = store.focus_stop();
        assert_eq!(again.duration_seconds, stopped.duration_seconds);
    }

    #[test]
    fn test_focus_stop_while_inert_is_noop() {
        let store = ModerationStore::new();

        let snapshot = store.focus_stop();
        assert!(!snapshot.active);
        assert_eq!(snapshot.duration_seconds, 0);
        assert!(snapshot.blocked_sites.is_empty());
    }

    #[tokio::test]
    async fn test_focus_transitions_publish_status_events() {
        let store = ModerationStore::new();
        let mut rx = store.events().subscribe();

        store.focus_start(&["a.com".to_string()]);
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ChannelEvent::FocusStatus(s) if s.active));

        store.focus_stop();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ChannelEvent::FocusStatus(s) if !s.active));
    }

    #[test]
    fn test_concurrent_recording_loses_no_updates() {
        let store = Arc::new(ModerationStore::new());
        let threads = 8;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        // Every other message is flagged.
                        store.record_message(&format!("user-{t}"), i % 2 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = store.stats_snapshot();
        assert_eq!(stats.total_messages, (threads * per_thread) as u64);
        assert_eq!(stats.flagged_messages, (threads * per_thread / 2) as u64);
        assert_eq!(stats.active_users, threads);
    }

    #[test]
    fn test_stats_reflect_flagged_log_size() {
        let store = ModerationStore::new();

        store.record_flagged("alice", "go die", flagged_categories());
        store.record_flagged("bob", "kill you", flagged_categories());

        let stats = store.stats_snapshot();
        assert_eq!(stats.flagged_recent, 2);
    }

    #[test]
    fn test_focus_snapshot_serializes_iso_timestamp() {
        let store = ModerationStore::new();
        store.focus_start(&["a.com".to_string()]);

        let value = serde_json::to_value(store.focus_snapshot()).unwrap();
        assert_eq!(value["active"], true);
        assert!(value["started_at"].as_str().unwrap().contains('T'));

        store.focus_stop();
        let value = serde_json::to_value(store.focus_snapshot()).unwrap();
        assert!(value["started_at"].is_null());
    }
}
