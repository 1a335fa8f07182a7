//! Configuration for a session timer.

use std::collections::BTreeSet;
use std::time::Duration;

use formclock_types::ActionName;

/// Default lifetime of an expiry marker (24 hours).
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Actions that initialize the timer unless configured otherwise.
pub const DEFAULT_ON_ACTIONS: &[&str] = &[ActionName::NEW];

/// Which actions receive the session timestamp as a request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AutoParams {
    /// Derive from `on_actions`: `new` implies `create`, `edit` implies `update`.
    #[default]
    Infer,
    /// Inject on exactly these actions.
    Explicit(Vec<ActionName>),
    /// Never inject.
    Disabled,
}

/// Session key for an attribute when none is configured.
pub fn default_session_key(attribute: &str) -> String {
    format!("{attribute}_timestamp")
}

/// Expiry marker key paired with a session key.
pub fn default_expiry_key(session_key: &str) -> String {
    format!("{session_key}_expires_at")
}

/// Configuration for one tracked attribute's session timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Session key holding the start timestamp.
    pub session_key: String,

    /// Session key holding the expiry marker.
    pub expiry_key: String,

    /// Whether the timestamp expires.
    pub expirable: bool,

    /// How long a timestamp stays valid after it is written (when expirable).
    pub expiry_duration: Duration,

    /// Actions that initialize the timer.
    pub on_actions: BTreeSet<ActionName>,

    /// Actions that get the timestamp injected into their params.
    pub auto_params: AutoParams,

    /// Parameter group the timestamp is injected into.
    /// `None` falls back to the host resource's own key.
    pub param_key: Option<String>,

    /// Discard any previous timestamp before initializing a new one.
    pub auto_cleanup: bool,
}

impl SessionConfig {
    /// Default configuration for an attribute.
    pub fn for_attribute(attribute: &str) -> Self {
        let session_key = default_session_key(attribute);
        Self {
            expiry_key: default_expiry_key(&session_key),
            session_key,
            expirable: false,
            expiry_duration: DEFAULT_EXPIRY,
            on_actions: DEFAULT_ON_ACTIONS
                .iter()
                .map(|a| ActionName::from(*a))
                .collect(),
            auto_params: AutoParams::Infer,
            param_key: None,
            auto_cleanup: true,
        }
    }

    /// Set the session key. The expiry key follows unless set afterwards.
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self.expiry_key = default_expiry_key(&self.session_key);
        self
    }

    /// Set the expiry marker key.
    pub fn with_expiry_key(mut self, key: impl Into<String>) -> Self {
        self.expiry_key = key.into();
        self
    }

    /// Make the timestamp expire `duration` after it is written.
    pub fn with_expiry(mut self, duration: Duration) -> Self {
        self.expirable = true;
        self.expiry_duration = duration;
        self
    }

    /// Disable expiry (timestamps never expire).
    pub fn without_expiry(mut self) -> Self {
        self.expirable = false;
        self
    }

    /// Set the actions that initialize the timer.
    pub fn with_on_actions<I, A>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ActionName>,
    {
        self.on_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Set which actions receive injected params.
    pub fn with_auto_params(mut self, auto_params: AutoParams) -> Self {
        self.auto_params = auto_params;
        self
    }

    /// Set the parameter group to inject into.
    pub fn with_param_key(mut self, key: impl Into<String>) -> Self {
        self.param_key = Some(key.into());
        self
    }

    /// Enable or disable cleanup before initialization.
    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }
}
