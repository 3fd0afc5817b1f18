//! REST path conventions of the remote API.
//!
//! Pure string functions, relative to the API base URL. Every path keeps the
//! trailing slash the remote requires.

use crate::ids::{PatientId, RoomId};

pub const PATIENTS: &str = "patients/";

pub fn patient(id: &PatientId) -> String {
    format!("patients/{id}/")
}

pub const ROOMS: &str = "rooms/";

pub fn room(id: &RoomId) -> String {
    format!("rooms/{id}/")
}

/// Read side of risk assessments: every stored record, newest first.
pub const RISK_ASSESSMENT_HISTORY: &str = "risk-assessment-history/";

/// Write side of risk assessments: scores a feature vector and stores the record.
pub const RISK_ASSESSMENT: &str = "risk_assessment/";
