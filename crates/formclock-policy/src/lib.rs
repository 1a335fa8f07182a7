//! Time-window validation for form start timestamps.
//!
//! A [`DurationPolicy`] checks a record's tracked start timestamp against a
//! [`PolicyConfig`] and appends human-readable violations to the record's
//! [`Errors`]. Checks never short-circuit, so every violation is reported at
//! once. With `prevent_update`, changes to the timestamp on an already
//! persisted record are silently reverted before update validation.
//!
//! Hosts implement [`TrackedRecord`] (or use [`FormSubmission`]) and register
//! the policy with a [`ValidationHooks`] registry.

mod config;
mod hooks;
mod policy;
mod record;
mod violation;

pub use config::PolicyConfig;
pub use hooks::{ValidationHooks, ValidationPhase};
pub use policy::{DurationPolicy, FUTURE_TOLERANCE_SECS};
pub use record::{ErrorEntry, Errors, FormSubmission, TrackedRecord};
pub use violation::Violation;
