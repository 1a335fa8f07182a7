//! Injecting the session timestamp into request params.

use std::collections::BTreeSet;

use formclock_session::AutoParams;
use formclock_types::{ActionName, Timestamp, format_timestamp};
use serde_json::Value;
use tracing::trace;

/// Set `params[target_key][attribute]` to `timestamp` unless a value is already there.
///
/// A submitted value always wins over the session. Missing timestamps and
/// missing or non-object param groups are no-ops. An explicit `null` counts
/// as absent. Returns `true` if the value was written.
pub fn inject(
    params: &mut Value,
    target_key: &str,
    attribute: &str,
    timestamp: Option<Timestamp>,
) -> bool {
    let Some(timestamp) = timestamp else {
        return false;
    };
    let Some(group) = params.get_mut(target_key).and_then(Value::as_object_mut) else {
        trace!(target_key = %target_key, "No param group to inject into");
        return false;
    };
    if group.get(attribute).is_some_and(|v| !v.is_null()) {
        trace!(target_key = %target_key, attribute = %attribute, "Keeping submitted value");
        return false;
    }

    group.insert(
        attribute.to_string(),
        Value::String(format_timestamp(timestamp)),
    );
    true
}

/// Actions that should receive the session timestamp.
///
/// An explicit list wins. Otherwise `new` in `on_actions` implies `create`
/// and `edit` implies `update`.
pub fn resolve_auto_params(
    auto_params: &AutoParams,
    on_actions: &BTreeSet<ActionName>,
) -> Vec<ActionName> {
    match auto_params {
        AutoParams::Disabled => Vec::new(),
        AutoParams::Explicit(actions) => {
            let mut seen = BTreeSet::new();
            actions
                .iter()
                .filter(|a| seen.insert(a.as_str()))
                .cloned()
                .collect()
        }
        AutoParams::Infer => on_actions
            .iter()
            .filter_map(ActionName::submit_action)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    }
}

/// Injects one attribute into one param group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInjector {
    target_key: String,
    attribute: String,
}

impl ParamInjector {
    pub fn new(target_key: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            target_key: target_key.into(),
            attribute: attribute.into(),
        }
    }

    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// See [`inject`].
    pub fn inject(&self, params: &mut Value, timestamp: Option<Timestamp>) -> bool {
        inject(params, &self.target_key, &self.attribute, timestamp)
    }
}
