//! Records carrying a tracked start timestamp.

use std::collections::HashMap;

use formclock_types::Timestamp;

/// One error message attached to an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub attribute: String,
    pub message: String,
}

/// Error messages collected on a record, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    entries: Vec<ErrorEntry>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a message to an attribute.
    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.entries.push(ErrorEntry {
            attribute: attribute.into(),
            message: message.into(),
        });
    }

    /// Messages for one attribute.
    pub fn get(&self, attribute: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.attribute == attribute)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter()
    }

    /// Messages prefixed with the humanized attribute name,
    /// e.g. `"Started at can't be blank"`.
    pub fn full_messages(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("{} {}", humanize(&e.attribute), e.message))
            .collect()
    }
}

fn humanize(attribute: &str) -> String {
    let spaced = attribute.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A record with a tracked start timestamp and an error sink.
///
/// Implemented by whatever the host persists (a form submission, a survey
/// response, ...). The policy only reads the timestamp, except for reverting
/// it under `prevent_update`.
pub trait TrackedRecord {
    /// Current value of a tracked attribute.
    fn tracked_value(&self, attribute: &str) -> Option<Timestamp>;

    /// Overwrite a tracked attribute.
    fn set_tracked_value(&mut self, attribute: &str, value: Option<Timestamp>);

    /// Value of the attribute as of the last persistence.
    fn persisted_value(&self, attribute: &str) -> Option<Timestamp>;

    /// Whether the record has been persisted at least once.
    fn is_persisted(&self) -> bool;

    fn errors(&self) -> &Errors;

    fn errors_mut(&mut self) -> &mut Errors;
}

/// Plain in-memory record, useful when the host has no model of its own.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    values: HashMap<String, Option<Timestamp>>,
    persisted: Option<HashMap<String, Option<Timestamp>>>,
    errors: Errors,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute while building.
    pub fn with_value(mut self, attribute: &str, value: Option<Timestamp>) -> Self {
        self.values.insert(attribute.to_string(), value);
        self
    }

    /// Snapshot current values as persisted.
    pub fn mark_persisted(&mut self) {
        self.persisted = Some(self.values.clone());
    }
}

impl TrackedRecord for FormSubmission {
    fn tracked_value(&self, attribute: &str) -> Option<Timestamp> {
        self.values.get(attribute).copied().flatten()
    }

    fn set_tracked_value(&mut self, attribute: &str, value: Option<Timestamp>) {
        self.values.insert(attribute.to_string(), value);
    }

    fn persisted_value(&self, attribute: &str) -> Option<Timestamp> {
        self.persisted
            .as_ref()
            .and_then(|p| p.get(attribute).copied().flatten())
    }

    fn is_persisted(&self) -> bool {
        self.persisted.is_some()
    }

    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }
}
