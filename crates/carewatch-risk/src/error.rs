use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("risk score {0} is not a probability in [0, 1]")]
    InvalidScore(f64),

    #[error("field '{field}' {problem}")]
    MissingField {
        field: &'static str,
        problem: FieldProblem,
    },
}

impl RiskError {
    /// The form field this error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Why a required feature field was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldProblem {
    #[error("is required")]
    Absent,

    #[error("is not a number: {0:?}")]
    NotANumber(String),

    #[error("must not be negative (got {0})")]
    Negative(f64),

    #[error("must be 1 (yes) or 0 (no), got {0:?}")]
    NotAFlag(String),
}
