//! Duration policy for a tracked start timestamp.

use std::time::Duration;

use chrono::TimeDelta;
use formclock_types::Timestamp;
use tracing::{debug, trace};

use crate::config::PolicyConfig;
use crate::hooks::{ValidationHooks, ValidationPhase};
use crate::record::TrackedRecord;
use crate::violation::Violation;

/// Start timestamps up to this many seconds ahead of `now` still count as
/// "not in the future", absorbing request latency and clock jitter.
pub const FUTURE_TOLERANCE_SECS: i64 = 1;

/// Validates one tracked attribute against a [`PolicyConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationPolicy {
    attribute: String,
    config: PolicyConfig,
}

impl DurationPolicy {
    pub fn new(attribute: impl Into<String>, config: PolicyConfig) -> Self {
        Self {
            attribute: attribute.into(),
            config,
        }
    }

    /// Name of the tracked attribute.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Time between the record's start timestamp and `now`.
    pub fn elapsed<R>(&self, record: &R, now: Timestamp) -> Option<TimeDelta>
    where
        R: TrackedRecord + ?Sized,
    {
        record.tracked_value(&self.attribute).map(|started| now - started)
    }

    /// Every violation for a start timestamp at `now`, in check order:
    /// presence, future, max, min.
    pub fn violations(&self, started_at: Option<Timestamp>, now: Timestamp) -> Vec<Violation> {
        let Some(started_at) = started_at else {
            return vec![Violation::Blank];
        };

        let mut found = Vec::new();
        found.extend(self.future_violation(started_at, now));
        found.extend(self.max_violation(started_at, now));
        found.extend(self.min_violation(started_at, now));
        found
    }

    /// Run all create-time checks and append every violation to the record.
    ///
    /// Returns `true` if nothing was appended.
    pub fn validate_on_create<R>(&self, record: &mut R, now: Timestamp) -> bool
    where
        R: TrackedRecord + ?Sized,
    {
        let violations = self.violations(record.tracked_value(&self.attribute), now);
        self.append(record, &violations);
        violations.is_empty()
    }

    /// Always active: fails when the attribute is absent.
    pub fn check_presence<R>(&self, record: &mut R)
    where
        R: TrackedRecord + ?Sized,
    {
        if record.tracked_value(&self.attribute).is_none() {
            self.append(record, &[Violation::Blank]);
        }
    }

    /// Active with `prevent_future`. Absent values are left to the presence check.
    pub fn check_not_future<R>(&self, record: &mut R, now: Timestamp)
    where
        R: TrackedRecord + ?Sized,
    {
        if let Some(started_at) = record.tracked_value(&self.attribute) {
            let found: Vec<_> = self.future_violation(started_at, now).into_iter().collect();
            self.append(record, &found);
        }
    }

    /// Active when `max_duration` is set.
    pub fn check_max_duration<R>(&self, record: &mut R, now: Timestamp)
    where
        R: TrackedRecord + ?Sized,
    {
        if let Some(started_at) = record.tracked_value(&self.attribute) {
            let found: Vec<_> = self.max_violation(started_at, now).into_iter().collect();
            self.append(record, &found);
        }
    }

    /// Active when `min_duration` is set.
    pub fn check_min_duration<R>(&self, record: &mut R, now: Timestamp)
    where
        R: TrackedRecord + ?Sized,
    {
        if let Some(started_at) = record.tracked_value(&self.attribute) {
            let found: Vec<_> = self.min_violation(started_at, now).into_iter().collect();
            self.append(record, &found);
        }
    }

    /// Revert a changed timestamp on a persisted record back to `previous`.
    ///
    /// Active with `prevent_update`. Nothing is reported; the change simply
    /// does not take effect. Returns `true` if the value was reverted.
    pub fn enforce_immutability<R>(&self, record: &mut R, previous: Option<Timestamp>) -> bool
    where
        R: TrackedRecord + ?Sized,
    {
        if !self.config.prevent_update || !record.is_persisted() {
            return false;
        }
        let Some(previous) = previous else {
            return false;
        };
        let current = record.tracked_value(&self.attribute);
        if current == Some(previous) {
            return false;
        }

        debug!(
            attribute = %self.attribute,
            attempted = ?current,
            kept = %previous,
            "Reverting change to immutable form timestamp"
        );
        record.set_tracked_value(&self.attribute, Some(previous));
        true
    }

    /// Register this policy's callbacks.
    ///
    /// Create validation always; the immutability revert runs before update
    /// validation when `prevent_update` is set.
    pub fn install<R>(&self, hooks: &mut ValidationHooks<R>)
    where
        R: TrackedRecord + 'static,
    {
        let policy = self.clone();
        hooks.validate_on(
            ValidationPhase::Create,
            format!("{}_duration", self.attribute),
            move |record: &mut R, now| {
                policy.validate_on_create(record, now);
            },
        );

        if self.config.prevent_update {
            let policy = self.clone();
            hooks.before_validation_on(
                ValidationPhase::Update,
                format!("{}_immutable", self.attribute),
                move |record: &mut R| {
                    let previous = record.persisted_value(&policy.attribute);
                    policy.enforce_immutability(record, previous);
                },
            );
        }
    }

    fn future_violation(&self, started_at: Timestamp, now: Timestamp) -> Option<Violation> {
        if !self.config.prevent_future {
            return None;
        }
        let limit = now + TimeDelta::seconds(FUTURE_TOLERANCE_SECS);
        (started_at > limit).then_some(Violation::Future)
    }

    fn max_violation(&self, started_at: Timestamp, now: Timestamp) -> Option<Violation> {
        let max = self.config.max_duration?;
        let elapsed = now - started_at;
        trace!(attribute = %self.attribute, elapsed_ms = elapsed.num_milliseconds(), "Checking max duration");
        (elapsed > to_delta(max)).then_some(Violation::MaxDurationExceeded { max })
    }

    fn min_violation(&self, started_at: Timestamp, now: Timestamp) -> Option<Violation> {
        let min = self.config.min_duration?;
        let elapsed = now - started_at;
        (elapsed < to_delta(min)).then_some(Violation::MinDurationNotMet { min })
    }

    fn append<R>(&self, record: &mut R, violations: &[Violation])
    where
        R: TrackedRecord + ?Sized,
    {
        for violation in violations {
            debug!(attribute = %self.attribute, violation = %violation, "Form timing violation");
            record
                .errors_mut()
                .add(self.attribute.clone(), violation.to_string());
        }
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
