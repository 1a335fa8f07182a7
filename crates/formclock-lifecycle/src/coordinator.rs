//! Binding session timers and param injection to the request lifecycle.

use std::sync::Arc;

use formclock_session::{SessionConfig, SessionStore, SessionTimer};
use formclock_types::{ActionName, Timestamp};
use serde_json::Value;
use tracing::debug;

use crate::actions::{ActionHooks, RequestContext};
use crate::params::{ParamInjector, resolve_auto_params};

/// Everything a host needs for one tracked attribute.
///
/// Built once at setup; the session store is passed to each call.
#[derive(Debug, Clone)]
pub struct TrackedAttribute {
    attribute: String,
    timer: SessionTimer,
    auto_params: Vec<ActionName>,
    injector: Option<ParamInjector>,
}

impl TrackedAttribute {
    /// Track `attribute` with `timer`.
    ///
    /// `resource_key` is the param group injected into when the config has
    /// no `param_key` of its own.
    pub fn new(attribute: impl Into<String>, timer: SessionTimer, resource_key: &str) -> Self {
        let attribute = attribute.into();
        let config = timer.config();
        let auto_params = resolve_auto_params(&config.auto_params, &config.on_actions);
        let injector = (!auto_params.is_empty()).then(|| {
            let target = config.param_key.as_deref().unwrap_or(resource_key);
            ParamInjector::new(target, attribute.clone())
        });

        Self {
            attribute,
            timer,
            auto_params,
            injector,
        }
    }

    /// Name of the tracked attribute.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn session_config(&self) -> &SessionConfig {
        self.timer.config()
    }

    /// Actions the timestamp is injected on (empty when injection is off).
    pub fn auto_params(&self) -> &[ActionName] {
        &self.auto_params
    }

    pub fn initialize_session<S>(&self, store: &mut S, action: &ActionName)
    where
        S: SessionStore + ?Sized,
    {
        self.timer.initialize(store, action);
    }

    pub fn read_from_session<S>(&self, store: &mut S) -> Option<Timestamp>
    where
        S: SessionStore + ?Sized,
    {
        self.timer.read(store)
    }

    pub fn cleanup_session<S>(&self, store: &mut S)
    where
        S: SessionStore + ?Sized,
    {
        self.timer.cleanup(store);
    }

    pub fn preserve_in_session<S>(&self, store: &mut S, value: Timestamp)
    where
        S: SessionStore + ?Sized,
    {
        self.timer.preserve(store, value);
    }

    /// Param injection, if any actions resolved for it.
    pub fn injector(&self) -> Option<ParamBinding<'_>> {
        self.injector.as_ref().map(|injector| ParamBinding {
            timer: &self.timer,
            injector,
        })
    }
}

/// Param injection for one tracked attribute.
#[derive(Debug, Clone, Copy)]
pub struct ParamBinding<'a> {
    timer: &'a SessionTimer,
    injector: &'a ParamInjector,
}

impl ParamBinding<'_> {
    /// Param group the timestamp goes into.
    pub fn target_key(&self) -> &str {
        self.injector.target_key()
    }

    /// Copy the session timestamp into `params` unless already submitted.
    pub fn inject_into_params<S>(&self, store: &mut S, params: &mut Value) -> bool
    where
        S: SessionStore + ?Sized,
    {
        let timestamp = self.timer.read(store);
        self.injector.inject(params, timestamp)
    }
}

/// Registers tracked attributes' hooks with an [`ActionHooks`] chain.
///
/// Per attribute, up to two independent hooks:
/// - `<attr>_initialize_session` on `on_actions`
/// - `<attr>_inject_params` on the resolved auto-param actions
#[derive(Debug, Default)]
pub struct LifecycleCoordinator {
    attributes: Vec<Arc<TrackedAttribute>>,
    hooks: ActionHooks,
}

impl LifecycleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an attribute and register its hooks.
    pub fn track(&mut self, attribute: TrackedAttribute) -> Arc<TrackedAttribute> {
        let attribute = Arc::new(attribute);
        let on_actions = attribute.session_config().on_actions.clone();

        if !on_actions.is_empty() {
            let tracked = Arc::clone(&attribute);
            self.hooks.before_action(
                format!("{}_initialize_session", attribute.attribute()),
                on_actions,
                move |ctx: &mut RequestContext<'_>| {
                    let action = ctx.action().clone();
                    tracked.initialize_session(ctx.session_mut(), &action);
                },
            );
        }

        if attribute.injector.is_some() {
            let tracked = Arc::clone(&attribute);
            self.hooks.before_action(
                format!("{}_inject_params", attribute.attribute()),
                attribute.auto_params().to_vec(),
                move |ctx: &mut RequestContext<'_>| {
                    if let Some(binding) = tracked.injector() {
                        let (session, params) = ctx.parts_mut();
                        binding.inject_into_params(session, params);
                    }
                },
            );
        }

        debug!(
            attribute = %attribute.attribute(),
            session_key = %attribute.session_config().session_key,
            auto_params = ?attribute.auto_params(),
            "Tracking form duration"
        );

        self.attributes.push(Arc::clone(&attribute));
        attribute
    }

    /// Look up a tracked attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Arc<TrackedAttribute>> {
        self.attributes.iter().find(|a| a.attribute() == name)
    }

    pub fn attributes(&self) -> &[Arc<TrackedAttribute>] {
        &self.attributes
    }

    pub fn hooks(&self) -> &ActionHooks {
        &self.hooks
    }

    /// Run the before-action phase for a request.
    pub fn before_action(&self, ctx: &mut RequestContext<'_>) -> usize {
        self.hooks.run_before(ctx)
    }
}
