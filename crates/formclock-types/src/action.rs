//! Request action names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a request action (`new`, `create`, `edit`, `update`, or any custom action).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionName(String);

impl ActionName {
    pub const NEW: &'static str = "new";
    pub const CREATE: &'static str = "create";
    pub const EDIT: &'static str = "edit";
    pub const UPDATE: &'static str = "update";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for actions that act on an already persisted record (`edit`, `update`).
    pub fn is_edit_like(&self) -> bool {
        matches!(self.0.as_str(), Self::EDIT | Self::UPDATE)
    }

    /// The submit action paired with a form-rendering action.
    ///
    /// `new` submits to `create` and `edit` submits to `update`.
    pub fn submit_action(&self) -> Option<ActionName> {
        match self.0.as_str() {
            Self::NEW => Some(ActionName::new(Self::CREATE)),
            Self::EDIT => Some(ActionName::new(Self::UPDATE)),
            _ => None,
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ActionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ActionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_like() {
        assert!(ActionName::from("edit").is_edit_like());
        assert!(ActionName::from("update").is_edit_like());
        assert!(!ActionName::from("new").is_edit_like());
        assert!(!ActionName::from("create").is_edit_like());
        assert!(!ActionName::from("show").is_edit_like());
    }

    #[test]
    fn test_submit_action() {
        assert_eq!(
            ActionName::from("new").submit_action(),
            Some(ActionName::from("create"))
        );
        assert_eq!(
            ActionName::from("edit").submit_action(),
            Some(ActionName::from("update"))
        );
        assert_eq!(ActionName::from("index").submit_action(), None);
    }

    #[test]
    fn test_serde_transparent() {
        let action: ActionName = serde_json::from_str("\"new\"").unwrap();
        assert_eq!(action.as_str(), "new");
        assert_eq!(serde_json::to_string(&action).unwrap(), "\"new\"");
    }
}
