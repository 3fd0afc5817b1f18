use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use carewatch_core::PatientId;
use carewatch_risk::Tier;

use crate::error::TimelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum EventKind {
    PatientAdded,
    RiskAssessment,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PatientAdded => "patient_added",
            EventKind::RiskAssessment => "risk_assessment",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "patient_added" => Ok(EventKind::PatientAdded),
            "risk_assessment" => Ok(EventKind::RiskAssessment),
            other => Err(TimelineError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EventMetadata {
    pub patient_id: PatientId,
    pub risk_score: Option<f64>,
    /// Derived from `risk_score`, never taken from the remote.
    pub tier: Option<Tier>,
}

/// One entry in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryEvent {
    /// `patient_<id>` or `risk_<id>`.
    pub id: String,
    pub kind: EventKind,
    pub title: String,
    pub description: String,
    pub actor: String,
    pub timestamp: jiff::Timestamp,
    pub metadata: EventMetadata,
}

impl HistoryEvent {
    /// Case-insensitive match against title, description or actor.
    /// `needle` must already be lowercase.
    pub(crate) fn mentions(&self, needle: &str) -> bool {
        [&self.title, &self.description, &self.actor]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}
