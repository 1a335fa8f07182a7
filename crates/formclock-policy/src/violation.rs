//! Policy violations and their user-facing messages.

use std::fmt;
use std::time::Duration;

/// A constraint the tracked timestamp failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// No timestamp at creation.
    Blank,
    /// Timestamp later than now plus tolerance.
    Future,
    /// Took longer than the configured maximum.
    MaxDurationExceeded { max: Duration },
    /// Submitted faster than the configured minimum.
    MinDurationNotMet { min: Duration },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Blank => write!(f, "can't be blank"),
            Violation::Future => write!(f, "can't be in the future"),
            Violation::MaxDurationExceeded { max } => write!(
                f,
                "form took too long to complete (max: {:?} minutes)",
                max.as_secs_f64() / 60.0
            ),
            Violation::MinDurationNotMet { min } => write!(
                f,
                "form was completed too quickly (min: {} seconds)",
                DisplaySecs(*min)
            ),
        }
    }
}

/// Whole seconds print as integers, fractional ones as decimals.
struct DisplaySecs(Duration);

impl fmt::Display for DisplaySecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.subsec_nanos() == 0 {
            write!(f, "{}", self.0.as_secs())
        } else {
            write!(f, "{:?}", self.0.as_secs_f64())
        }
    }
}
