use std::time::Duration;

use thiserror::Error;

/// Outcome of a single failed model attempt. Consumed by the retry loop and
/// never surfaced to callers of the generation operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationFault {
    #[error("transport fault: {0}")]
    Transport(String),
    #[error("model call exceeded {0:?}")]
    Timeout(Duration),
    #[error("malformed model output: {0}")]
    MalformedOutput(String),
}

impl From<SchemaError> for GenerationFault {
    fn from(value: SchemaError) -> Self {
        Self::MalformedOutput(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a json object for {0}")]
    NotAnObject(String),
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("itinerary has no day plans")]
    NoDayPlans,
    #[error("day {day} has no activities")]
    EmptyActivities { day: u32 },
    #[error("day {day} lists {count} activities, at most 10 are allowed")]
    TooManyActivities { day: u32, count: usize },
    #[error("day {day} is outside 1..={max}")]
    DayOutOfRange { day: u32, max: u32 },
}

impl SchemaError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Hard failures of the planning operations.
#[derive(Debug, Error, PartialEq)]
pub enum PlanningError {
    #[error("no destinations available")]
    CatalogUnavailable,
    #[error("invalid preferences: {0}")]
    InvalidPreferences(String),
}
