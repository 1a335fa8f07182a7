//! Session-scoped form start timestamps.
//!
//! A [`SessionTimer`] stores the instant a form was presented in a
//! [`SessionStore`], optionally alongside an expiry marker:
//! - `initialize` records a fresh start time (skipped on `edit`/`update`)
//! - `read` returns the start time, lazily purging expired entries
//! - `cleanup` discards the entry
//! - `preserve` keeps a timestamp alive across a failed submission
//!
//! # Example
//!
//! ```rust,ignore
//! use formclock_session::{MemorySessionStore, SessionConfig, SessionTimer};
//!
//! let config = SessionConfig::for_attribute("started_at")
//!     .with_expiry(Duration::from_secs(3600));
//! let timer = SessionTimer::new(config);
//!
//! let mut store = MemorySessionStore::new();
//! timer.initialize(&mut store, &"new".into());
//! let started_at = timer.read(&mut store);
//! ```

mod config;
mod store;
mod timer;

pub use config::{
    AutoParams, DEFAULT_EXPIRY, DEFAULT_ON_ACTIONS, SessionConfig, default_expiry_key,
    default_session_key,
};
pub use store::{MemorySessionStore, SessionStore};
pub use timer::{SessionTimer, TimerState};
