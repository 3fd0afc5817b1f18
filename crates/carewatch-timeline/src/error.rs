use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("unparseable timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("unknown date range {0:?}, expected a number of days or \"all\"")]
    UnknownAgeBound(String),

    #[error("unknown event type {0:?}")]
    UnknownKind(String),
}
