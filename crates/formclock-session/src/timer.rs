//! Start-timestamp lifecycle in a session store.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use formclock_types::{
    ActionName, SharedClock, SystemClock, Timestamp, format_timestamp, parse_timestamp,
};
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::store::SessionStore;

/// Latest instant that survives the RFC 3339 round trip (9999-12-31T23:59:59Z).
const MAX_STORABLE_SECS: i64 = 253_402_300_799;

/// Observable state of a timer in a given store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// No readable timestamp stored.
    Unset,
    /// Timestamp stored and not expired.
    Active,
    /// Timestamp stored but its expiry marker has passed (or is unreadable).
    /// The next `read` purges it.
    Expired,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerState::Unset => write!(f, "unset"),
            TimerState::Active => write!(f, "active"),
            TimerState::Expired => write!(f, "expired"),
        }
    }
}

/// Session timer for one tracked attribute.
///
/// Holds its own [`SessionConfig`]; the store is passed to every call.
/// Expiry is evaluated lazily on read, never swept in the background.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    config: SessionConfig,
    clock: SharedClock,
}

impl SessionTimer {
    /// Create a timer using the system clock.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a timer with an explicit clock.
    pub fn with_clock(config: SessionConfig, clock: SharedClock) -> Self {
        Self { config, clock }
    }

    /// Get the timer configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the clock this timer reads.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Record the start of a form interaction.
    ///
    /// `edit` and `update` never touch the store: editing an existing record
    /// keeps its original baseline.
    pub fn initialize<S>(&self, store: &mut S, action: &ActionName)
    where
        S: SessionStore + ?Sized,
    {
        let edit_like = action.is_edit_like();

        if self.config.auto_cleanup && !edit_like {
            self.cleanup(store);
        }

        if edit_like {
            trace!(
                session_key = %self.config.session_key,
                action = %action,
                "Skipping timer initialization for edit action"
            );
            return;
        }

        let now = self.clock.now();

        if self.config.expirable {
            if self.marker_expired(store, now) {
                debug!(
                    session_key = %self.config.session_key,
                    "Purging expired timestamp before initialization"
                );
                self.cleanup(store);
            }
            store.set(
                &self.config.expiry_key,
                format_timestamp(self.expiry_from(now)),
            );
        }

        store.set(&self.config.session_key, format_timestamp(now));

        debug!(
            session_key = %self.config.session_key,
            action = %action,
            started_at = %now,
            "Form timer initialized"
        );
    }

    /// Read the stored start timestamp.
    ///
    /// Returns `None` when nothing is stored or the entry has expired; an
    /// expired entry is removed from the store.
    pub fn read<S>(&self, store: &mut S) -> Option<Timestamp>
    where
        S: SessionStore + ?Sized,
    {
        let raw = store.get(&self.config.session_key)?;

        if self.config.expirable {
            let now = self.clock.now();
            if self.marker_expired(store, now) {
                debug!(
                    session_key = %self.config.session_key,
                    "Form timer expired, removing from session"
                );
                self.cleanup(store);
                return None;
            }
        }

        match parse_timestamp(&raw) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warn!(
                    session_key = %self.config.session_key,
                    error = %e,
                    "Ignoring unreadable form timestamp"
                );
                None
            }
        }
    }

    /// Remove the timestamp (and the expiry marker, when expirable).
    pub fn cleanup<S>(&self, store: &mut S)
    where
        S: SessionStore + ?Sized,
    {
        store.delete(&self.config.session_key);
        if self.config.expirable {
            store.delete(&self.config.expiry_key);
        }
        trace!(session_key = %self.config.session_key, "Form timer cleaned up");
    }

    /// Overwrite the timestamp with `value` and restart the expiry window.
    ///
    /// Used to carry a start time across a failed submission. Not affected by
    /// `auto_cleanup`.
    pub fn preserve<S>(&self, store: &mut S, value: Timestamp)
    where
        S: SessionStore + ?Sized,
    {
        store.set(&self.config.session_key, format_timestamp(value));
        if self.config.expirable {
            let now = self.clock.now();
            store.set(
                &self.config.expiry_key,
                format_timestamp(self.expiry_from(now)),
            );
        }
        debug!(
            session_key = %self.config.session_key,
            started_at = %value,
            "Form timer preserved"
        );
    }

    /// Inspect the timer state without modifying the store.
    ///
    /// Agrees with [`read`](Self::read): an unreadable timestamp is `Unset`.
    pub fn state<S>(&self, store: &S) -> TimerState
    where
        S: SessionStore + ?Sized,
    {
        let Some(raw) = store.get(&self.config.session_key) else {
            return TimerState::Unset;
        };
        if self.config.expirable && self.marker_expired(store, self.clock.now()) {
            return TimerState::Expired;
        }
        match parse_timestamp(&raw) {
            Ok(_) => TimerState::Active,
            Err(_) => TimerState::Unset,
        }
    }

    /// Whether the stored expiry marker says the entry is stale at `now`.
    ///
    /// A missing marker never expires; an unreadable one always has.
    fn marker_expired<S>(&self, store: &S, now: Timestamp) -> bool
    where
        S: SessionStore + ?Sized,
    {
        let Some(raw) = store.get(&self.config.expiry_key) else {
            return false;
        };
        match parse_timestamp(&raw) {
            Ok(expires_at) => now > expires_at,
            Err(e) => {
                warn!(
                    expiry_key = %self.config.expiry_key,
                    error = %e,
                    "Unreadable expiry marker, treating form timer as expired"
                );
                true
            }
        }
    }

    fn expiry_from(&self, now: Timestamp) -> Timestamp {
        let ceiling = DateTime::<Utc>::from_timestamp(MAX_STORABLE_SECS, 0).unwrap_or(now);
        let ttl = TimeDelta::from_std(self.config.expiry_duration).unwrap_or(TimeDelta::MAX);
        now.checked_add_signed(ttl)
            .map_or(ceiling, |expires_at| expires_at.min(ceiling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use chrono::TimeZone;
    use formclock_types::ManualClock;
    use std::time::Duration;

    fn start() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn timer(config: SessionConfig) -> (SessionTimer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        (SessionTimer::with_clock(config, clock.clone()), clock)
    }

    fn expiring(secs: u64) -> SessionConfig {
        SessionConfig::for_attribute("started_at").with_expiry(Duration::from_secs(secs))
    }

    #[test]
    fn test_read_unset_returns_none() {
        let (timer, _) = timer(SessionConfig::for_attribute("started_at"));
        let mut store = MemorySessionStore::new();
        assert_eq!(timer.read(&mut store), None);
        assert_eq!(timer.state(&store), TimerState::Unset);
    }

    #[test]
    fn test_initialize_then_read() {
        let (timer, _) = timer(SessionConfig::for_attribute("started_at"));
        let mut store = MemorySessionStore::new();

        timer.initialize(&mut store, &"new".into());

        assert_eq!(timer.read(&mut store), Some(start()));
        assert_eq!(timer.state(&store), TimerState::Active);
        assert!(!store.contains("started_at_timestamp_expires_at"));
    }

    #[test]
    fn test_initialize_writes_expiry_from_same_snapshot() {
        let (timer, _) = timer(expiring(3600));
        let mut store = MemorySessionStore::new();

        timer.initialize(&mut store, &"new".into());

        let ts = parse_timestamp(&store.get("started_at_timestamp").unwrap()).unwrap();
        let exp = parse_timestamp(&store.get("started_at_timestamp_expires_at").unwrap()).unwrap();
        assert_eq!(exp - ts, TimeDelta::seconds(3600));
    }

    #[test]
    fn test_initialize_on_edit_leaves_store_unchanged() {
        let (timer, clock) = timer(expiring(3600));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());
        store.set("unrelated", "x".to_string());
        let before = store.clone();

        clock.advance(TimeDelta::seconds(30));
        timer.initialize(&mut store, &"edit".into());
        assert_eq!(store, before);

        timer.initialize(&mut store, &"update".into());
        assert_eq!(store, before);
    }

    #[test]
    fn test_initialize_on_edit_with_empty_store_writes_nothing() {
        let (timer, _) = timer(SessionConfig::for_attribute("started_at"));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"edit".into());
        assert!(store.is_empty());
    }

    #[test]
    fn test_initialize_replaces_stale_timestamp() {
        let (timer, clock) = timer(SessionConfig::for_attribute("started_at"));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());

        clock.advance(TimeDelta::minutes(10));
        timer.initialize(&mut store, &"new".into());

        assert_eq!(timer.read(&mut store), Some(start() + TimeDelta::minutes(10)));
    }

    #[test]
    fn test_initialize_without_auto_cleanup_purges_expired_marker() {
        let config = expiring(60).with_auto_cleanup(false);
        let (timer, clock) = timer(config);
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());

        clock.advance(TimeDelta::seconds(120));
        timer.initialize(&mut store, &"new".into());

        let now = start() + TimeDelta::seconds(120);
        assert_eq!(timer.read(&mut store), Some(now));
        let exp = parse_timestamp(&store.get("started_at_timestamp_expires_at").unwrap()).unwrap();
        assert_eq!(exp, now + TimeDelta::seconds(60));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let (timer, clock) = timer(expiring(60));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());

        clock.advance(TimeDelta::seconds(60));
        assert_eq!(timer.read(&mut store), Some(start()));

        clock.advance(TimeDelta::milliseconds(1));
        assert_eq!(timer.state(&store), TimerState::Expired);
        assert_eq!(timer.read(&mut store), None);
        assert!(store.is_empty());

        // Stays expired.
        assert_eq!(timer.read(&mut store), None);
        assert_eq!(timer.state(&store), TimerState::Unset);
    }

    #[test]
    fn test_malformed_marker_treated_as_expired() {
        let (timer, _) = timer(expiring(60));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());
        store.set("started_at_timestamp_expires_at", "garbage".to_string());

        assert_eq!(timer.state(&store), TimerState::Expired);
        assert_eq!(timer.read(&mut store), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_marker_never_expires() {
        let (timer, clock) = timer(expiring(60));
        let mut store = MemorySessionStore::new();
        store.set("started_at_timestamp", format_timestamp(start()));

        clock.advance(TimeDelta::days(30));
        assert_eq!(timer.read(&mut store), Some(start()));
    }

    #[test]
    fn test_marker_ignored_when_not_expirable() {
        let (timer, clock) = timer(SessionConfig::for_attribute("started_at"));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());
        store.set(
            "started_at_timestamp_expires_at",
            format_timestamp(start() - TimeDelta::days(1)),
        );

        clock.advance(TimeDelta::hours(1));
        assert_eq!(timer.read(&mut store), Some(start()));
    }

    #[test]
    fn test_unreadable_timestamp_reads_as_none() {
        let (timer, _) = timer(SessionConfig::for_attribute("started_at"));
        let mut store = MemorySessionStore::new();
        store.set("started_at_timestamp", "yesterday".to_string());

        assert_eq!(timer.state(&store), TimerState::Unset);
        assert_eq!(timer.read(&mut store), None);
        assert!(store.contains("started_at_timestamp"));
    }

    #[test]
    fn test_unreadable_timestamp_with_live_marker_is_unset() {
        let (timer, _) = timer(expiring(60));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());
        store.set("started_at_timestamp", "yesterday".to_string());

        assert_eq!(timer.state(&store), TimerState::Unset);
        assert_eq!(timer.read(&mut store), None);
    }

    #[test]
    fn test_cleanup_removes_both_keys_when_expirable() {
        let (timer, _) = timer(expiring(60));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());
        assert_eq!(store.len(), 2);

        timer.cleanup(&mut store);
        assert!(store.is_empty());
        assert_eq!(timer.read(&mut store), None);
    }

    #[test]
    fn test_cleanup_leaves_marker_key_when_not_expirable() {
        let (timer, _) = timer(SessionConfig::for_attribute("started_at"));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());
        store.set("started_at_timestamp_expires_at", "stray".to_string());

        timer.cleanup(&mut store);
        assert!(!store.contains("started_at_timestamp"));
        assert!(store.contains("started_at_timestamp_expires_at"));
    }

    #[test]
    fn test_preserve_resets_ttl() {
        let (timer, clock) = timer(expiring(60));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());

        clock.advance(TimeDelta::seconds(59));
        let kept = start() - TimeDelta::minutes(5);
        timer.preserve(&mut store, kept);
        assert_eq!(timer.read(&mut store), Some(kept));

        // Past the original expiry but inside the renewed window.
        clock.advance(TimeDelta::seconds(30));
        assert_eq!(timer.read(&mut store), Some(kept));
    }

    #[test]
    fn test_preserve_round_trips_nanosecond_precision() {
        let precise = Utc.timestamp_nanos(1_780_000_000_123_456_789);
        let clock = Arc::new(ManualClock::new(precise));
        let timer = SessionTimer::with_clock(expiring(60), clock);
        let mut store = MemorySessionStore::new();

        timer.preserve(&mut store, precise);
        assert_eq!(timer.read(&mut store), Some(precise));

        timer.initialize(&mut store, &"new".into());
        assert_eq!(timer.read(&mut store), Some(precise));
    }

    #[test]
    fn test_preserve_revives_expired_entry() {
        let (timer, clock) = timer(expiring(60));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());

        clock.advance(TimeDelta::seconds(600));
        assert_eq!(timer.state(&store), TimerState::Expired);

        timer.preserve(&mut store, start());
        assert_eq!(timer.read(&mut store), Some(start()));
    }

    #[test]
    fn test_preserve_without_expiry_writes_only_timestamp() {
        let config = SessionConfig::for_attribute("started_at").with_auto_cleanup(false);
        let (timer, _) = timer(config);
        let mut store = MemorySessionStore::new();

        timer.preserve(&mut store, start());
        assert_eq!(store.len(), 1);
        assert_eq!(timer.read(&mut store), Some(start()));
    }

    #[test]
    fn test_huge_expiry_saturates() {
        let (timer, _) = timer(expiring(u64::MAX));
        let mut store = MemorySessionStore::new();
        timer.initialize(&mut store, &"new".into());
        assert_eq!(timer.read(&mut store), Some(start()));
    }

    #[test]
    fn test_works_with_dyn_store() {
        let (timer, _) = timer(SessionConfig::for_attribute("started_at"));
        let mut store = MemorySessionStore::new();
        let dyn_store: &mut dyn SessionStore = &mut store;

        timer.initialize(&mut *dyn_store, &"new".into());
        assert_eq!(timer.read(&mut *dyn_store), Some(start()));
    }

    #[test]
    fn test_timer_state_display() {
        assert_eq!(TimerState::Unset.to_string(), "unset");
        assert_eq!(TimerState::Active.to_string(), "active");
        assert_eq!(TimerState::Expired.to_string(), "expired");
    }
}
