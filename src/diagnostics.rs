use std::fmt;

// ---------------------------------------------------------------------------
// Warning – a non-fatal notice attached to a result
// ---------------------------------------------------------------------------

/// A recoverable condition. The call still produced a complete result, but
/// it may not be the one the caller asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The filter expression could not be applied; rows were left untouched.
    FilterFailed { expression: String, reason: String },
    /// No confidence level was given, or it is not in the supported table.
    UnsupportedConfidence {
        requested: Option<String>,
        supported: Vec<&'static str>,
    },
    /// The polynomial design matrix is rank deficient.
    PoorlyConditioned { rank: usize, order: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::FilterFailed { expression, reason } => {
                write!(f, "unable to apply filter '{expression}': {reason}")
            }
            Warning::UnsupportedConfidence {
                requested,
                supported,
            } => {
                match requested {
                    Some(level) => write!(f, "confidence level '{level}' is not supported")?,
                    None => write!(f, "no confidence level given")?,
                }
                write!(f, "; use one of: {}", supported.join(", "))
            }
            Warning::PoorlyConditioned { rank, order } => write!(
                f,
                "polyfit may be poorly conditioned (rank {rank} of {order})"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome – a value plus the warnings raised while computing it
// ---------------------------------------------------------------------------

/// Result wrapper for operations that degrade instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    /// A clean result with no warnings.
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Record a warning. Every warning is also sent to the `log` facade.
    pub fn warn(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Take the value of another outcome, keeping its warnings.
    pub fn absorb<U>(&mut self, other: Outcome<U>) -> U {
        self.warnings.extend(other.warnings);
        other.value
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
