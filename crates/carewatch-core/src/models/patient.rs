use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::ids::PatientId;

/// Where a patient is in today's queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum PatientStatus {
    #[default]
    Waiting,
    InProgress,
    Completed,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Waiting => "waiting",
            PatientStatus::InProgress => "in-progress",
            PatientStatus::Completed => "completed",
        }
    }
}

/// A patient as returned by the remote API.
///
/// Any `risk_level` the remote sends is ignored: the tier is always derived
/// from `risk_score` so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default, alias = "emergencyContact")]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub appointment: Option<String>,
    #[serde(default, rename = "appointmentTime")]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Patient {
    /// Scheduled appointment, preferring the dashboard's `appointmentTime`
    /// over the remote's plain `appointment` field. Blank values are skipped.
    pub fn scheduled_for(&self) -> Option<&str> {
        non_blank(self.appointment_time.as_deref()).or_else(|| non_blank(self.appointment.as_deref()))
    }

    /// Creation time as sent by the remote, if it sent a non-blank one.
    pub fn created(&self) -> Option<&str> {
        non_blank(self.created_at.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Fields staff enter when creating or editing a patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientDraft {
    pub name: String,
    pub age: u32,
    pub condition: String,
    pub appointment: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PatientDraft {
    /// Check the fields the remote refuses to store blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("name", &self.name),
            ("condition", &self.condition),
            ("appointment", &self.appointment),
            ("contact", &self.contact),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::MissingField(field.to_string()));
            }
        }
        Ok(())
    }
}
