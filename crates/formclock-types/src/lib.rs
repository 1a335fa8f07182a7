//! Shared types for formclock.
//!
//! Every other crate in the workspace depends on these:
//! - [`Clock`] abstracts the wall clock so a single snapshot can be taken per operation
//! - [`Timestamp`] plus the store-boundary codec in [`timestamp`]
//! - [`ActionName`] for request action names (`new`, `create`, `edit`, `update`, ...)

pub mod action;
pub mod clock;
pub mod error;
pub mod timestamp;

pub use action::ActionName;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{Error, Result};
pub use timestamp::{Timestamp, format_timestamp, parse_timestamp};
