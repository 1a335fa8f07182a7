//! Request lifecycle wiring for form timers.
//!
//! - [`ParamInjector`] copies the session timestamp into a request's params
//!   without overwriting a submitted value
//! - [`ActionHooks`] runs before-action callbacks restricted to named actions
//! - [`LifecycleCoordinator`] registers, per [`TrackedAttribute`], the timer
//!   initialization and param injection hooks

mod actions;
mod coordinator;
mod params;

pub use actions::{ActionHooks, RequestContext};
pub use coordinator::{LifecycleCoordinator, ParamBinding, TrackedAttribute};
pub use params::{ParamInjector, inject, resolve_auto_params};
