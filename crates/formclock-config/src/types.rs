//! Configuration types mapping to the TOML schema.

use std::collections::BTreeMap;
use std::time::Duration;

use formclock_lifecycle::TrackedAttribute;
use formclock_policy::{DurationPolicy, PolicyConfig};
use formclock_session::{AutoParams, SessionConfig, SessionTimer};
use formclock_types::{ActionName, SharedClock};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Expiry windows tighter than this fraction of `max_duration` above it
/// draw an advisory.
const RECOMMENDED_BUFFER_RATIO: f64 = 0.1;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormclockConfig {
    /// Tracker settings keyed by attribute name (`[trackers.started_at]`).
    pub trackers: BTreeMap<String, TrackerConfig>,
}

impl FormclockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one.
    ///
    /// A tracker table in `other` replaces the whole table of the same name.
    pub fn merge(&mut self, other: FormclockConfig) {
        for (name, tracker) in other.trackers {
            self.trackers.insert(name, tracker);
        }
    }

    pub fn tracker(&self, attribute: &str) -> Result<&TrackerConfig> {
        self.trackers
            .get(attribute)
            .ok_or_else(|| ConfigError::TrackerNotFound(attribute.to_string()))
    }

    /// Advisories for every tracker, prefixed with the tracker name.
    pub fn advisories(&self) -> Vec<String> {
        self.trackers
            .iter()
            .flat_map(|(name, tracker)| {
                tracker
                    .advisories()
                    .into_iter()
                    .map(move |msg| format!("tracker '{name}': {msg}"))
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracker
// ─────────────────────────────────────────────────────────────────────────────

/// `auto_params = true | false | ["create", ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AutoParamsSetting {
    /// `true` infers from `on_actions`, `false` disables injection.
    Enabled(bool),
    /// Inject on exactly these actions.
    Actions(Vec<String>),
}

impl From<&AutoParamsSetting> for AutoParams {
    fn from(setting: &AutoParamsSetting) -> Self {
        match setting {
            AutoParamsSetting::Enabled(true) => AutoParams::Infer,
            AutoParamsSetting::Enabled(false) => AutoParams::Disabled,
            AutoParamsSetting::Actions(actions) => {
                AutoParams::Explicit(actions.iter().map(|a| ActionName::from(a.as_str())).collect())
            }
        }
    }
}

/// Settings for one tracked attribute.
///
/// ```toml
/// [trackers.started_at]
/// session_key = "form_started_at"
/// expirable = true
/// expiry_secs = 86400
/// on_actions = ["new"]
/// auto_params = true
/// param_key = "submission"
/// auto_cleanup = true
/// prevent_future = true
/// prevent_update = true
/// max_duration_secs = 7200
/// min_duration_secs = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Session key for the timestamp (default `<attribute>_timestamp`).
    pub session_key: Option<String>,
    /// Session key for the expiry marker (default `<session_key>_expires_at`).
    pub expiry_key: Option<String>,
    pub expirable: bool,
    /// Expiry window in seconds (default 24 hours).
    pub expiry_secs: Option<u64>,
    /// Actions that start the timer (default `["new"]`).
    pub on_actions: Option<Vec<String>>,
    pub auto_params: Option<AutoParamsSetting>,
    pub param_key: Option<String>,
    /// Default `true`.
    pub auto_cleanup: Option<bool>,
    pub prevent_future: bool,
    pub prevent_update: bool,
    pub max_duration_secs: Option<u64>,
    pub min_duration_secs: Option<u64>,
}

/// Runtime objects built from one tracker's config.
#[derive(Debug, Clone)]
pub struct TrackerSetup {
    pub attribute: TrackedAttribute,
    pub policy: DurationPolicy,
}

impl TrackerConfig {
    /// Build the session config for `attribute`.
    pub fn session_config(&self, attribute: &str) -> Result<SessionConfig> {
        self.validate(attribute)?;

        let mut config = SessionConfig::for_attribute(attribute);
        if let Some(key) = &self.session_key {
            config = config.with_session_key(key.clone());
        }
        if let Some(key) = &self.expiry_key {
            config = config.with_expiry_key(key.clone());
        }
        if self.expirable {
            let ttl = self
                .expiry_secs
                .map(Duration::from_secs)
                .unwrap_or(config.expiry_duration);
            config = config.with_expiry(ttl);
        }
        if let Some(actions) = &self.on_actions {
            config = config.with_on_actions(actions.iter().map(String::as_str));
        }
        if let Some(setting) = &self.auto_params {
            config = config.with_auto_params(setting.into());
        }
        if let Some(key) = &self.param_key {
            config = config.with_param_key(key.clone());
        }
        if let Some(enabled) = self.auto_cleanup {
            config = config.with_auto_cleanup(enabled);
        }
        Ok(config)
    }

    /// Build the validation policy.
    pub fn policy_config(&self, attribute: &str) -> Result<PolicyConfig> {
        self.validate(attribute)?;
        Ok(PolicyConfig {
            prevent_future: self.prevent_future,
            prevent_update: self.prevent_update,
            max_duration: self.max_duration_secs.map(Duration::from_secs),
            min_duration: self.min_duration_secs.map(Duration::from_secs),
        })
    }

    /// Build the tracked attribute and its policy.
    ///
    /// `resource_key` is the param group used when `param_key` is unset.
    pub fn build(
        &self,
        attribute: &str,
        resource_key: &str,
        clock: SharedClock,
    ) -> Result<TrackerSetup> {
        let timer = SessionTimer::with_clock(self.session_config(attribute)?, clock);
        Ok(TrackerSetup {
            attribute: TrackedAttribute::new(attribute, timer, resource_key),
            policy: DurationPolicy::new(attribute, self.policy_config(attribute)?),
        })
    }

    /// Non-fatal consistency warnings.
    ///
    /// A session that expires before `max_duration` elapses turns slow but
    /// legitimate submissions into blank ones instead of "took too long".
    pub fn advisories(&self) -> Vec<String> {
        let mut advisories = Vec::new();

        if !self.expirable && self.expiry_secs.is_some() {
            advisories.push("expiry_secs is ignored because expirable is false".to_string());
        }

        if let (true, Some(max)) = (self.expirable, self.max_duration_secs) {
            let expiry = self
                .expiry_secs
                .unwrap_or(formclock_session::DEFAULT_EXPIRY.as_secs());
            if expiry < max {
                advisories.push(format!(
                    "expiry_secs ({expiry}) is shorter than max_duration_secs ({max}); sessions may expire before the form times out"
                ));
            } else if ((expiry - max) as f64) < (max as f64) * RECOMMENDED_BUFFER_RATIO {
                let recommended = max + (max as f64 * RECOMMENDED_BUFFER_RATIO).ceil() as u64;
                advisories.push(format!(
                    "expiry_secs ({expiry}) leaves little buffer over max_duration_secs ({max}); consider at least {recommended}"
                ));
            }
        }

        advisories
    }

    fn validate(&self, attribute: &str) -> Result<()> {
        let invalid = |reason: &str| ConfigError::InvalidDuration {
            tracker: attribute.to_string(),
            reason: reason.to_string(),
        };

        if self.expirable && self.expiry_secs == Some(0) {
            return Err(invalid("expiry_secs must be greater than zero"));
        }
        if let (Some(min), Some(max)) = (self.min_duration_secs, self.max_duration_secs)
            && min > max
        {
            return Err(invalid(&format!(
                "min_duration_secs ({min}) exceeds max_duration_secs ({max})"
            )));
        }
        Ok(())
    }
}
