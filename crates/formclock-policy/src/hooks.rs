//! Validation hook registry.
//!
//! Hosts register named validations per lifecycle phase, plus callbacks that
//! run before validation. `run` executes the before-validation callbacks
//! first, then every validation for the phase, collecting errors on the
//! record.

use std::fmt;

use formclock_types::Timestamp;
use tracing::trace;

use crate::record::TrackedRecord;

/// Record lifecycle phase a hook is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationPhase {
    /// First save of a new record.
    Create,
    /// Save of an already persisted record.
    Update,
}

impl fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationPhase::Create => write!(f, "create"),
            ValidationPhase::Update => write!(f, "update"),
        }
    }
}

type Validator<R> = Box<dyn Fn(&mut R, Timestamp) + Send + Sync>;
type BeforeValidation<R> = Box<dyn Fn(&mut R) + Send + Sync>;

struct Registered<F> {
    name: String,
    phase: ValidationPhase,
    hook: F,
}

/// Validation callbacks for records of type `R`.
pub struct ValidationHooks<R> {
    before: Vec<Registered<BeforeValidation<R>>>,
    validators: Vec<Registered<Validator<R>>>,
}

impl<R> Default for ValidationHooks<R> {
    fn default() -> Self {
        Self {
            before: Vec::new(),
            validators: Vec::new(),
        }
    }
}

impl<R> fmt::Debug for ValidationHooks<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationHooks")
            .field("before", &self.before.iter().map(|h| &h.name).collect::<Vec<_>>())
            .field(
                "validators",
                &self.validators.iter().map(|h| &h.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<R: TrackedRecord> ValidationHooks<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validation for one phase.
    pub fn validate_on<F>(&mut self, phase: ValidationPhase, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut R, Timestamp) + Send + Sync + 'static,
    {
        self.validators.push(Registered {
            name: name.into(),
            phase,
            hook: Box::new(hook),
        });
    }

    /// Register a callback that runs before validation in one phase.
    pub fn before_validation_on<F>(
        &mut self,
        phase: ValidationPhase,
        name: impl Into<String>,
        hook: F,
    ) where
        F: Fn(&mut R) + Send + Sync + 'static,
    {
        self.before.push(Registered {
            name: name.into(),
            phase,
            hook: Box::new(hook),
        });
    }

    /// Names of the validations registered for a phase.
    pub fn validations(&self, phase: ValidationPhase) -> Vec<&str> {
        self.validators
            .iter()
            .filter(|h| h.phase == phase)
            .map(|h| h.name.as_str())
            .collect()
    }

    /// Names of the before-validation callbacks registered for a phase.
    pub fn before_validations(&self, phase: ValidationPhase) -> Vec<&str> {
        self.before
            .iter()
            .filter(|h| h.phase == phase)
            .map(|h| h.name.as_str())
            .collect()
    }

    /// Validate a record. Clears previous errors; returns `true` if valid.
    pub fn run(&self, record: &mut R, phase: ValidationPhase, now: Timestamp) -> bool {
        record.errors_mut().clear();

        for hook in self.before.iter().filter(|h| h.phase == phase) {
            trace!(hook = %hook.name, phase = %phase, "Running before-validation hook");
            (hook.hook)(record);
        }
        for hook in self.validators.iter().filter(|h| h.phase == phase) {
            trace!(hook = %hook.name, phase = %phase, "Running validation");
            (hook.hook)(record, now);
        }

        record.errors().is_empty()
    }

    /// Validate for whichever phase matches the record's persistence state.
    pub fn run_for(&self, record: &mut R, now: Timestamp) -> bool {
        let phase = if record.is_persisted() {
            ValidationPhase::Update
        } else {
            ValidationPhase::Create
        };
        self.run(record, phase, now)
    }
}
