use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{AssessmentId, PatientId};

/// A stored risk assessment. Created by the remote when a feature vector is
/// submitted; read-only from here on.
///
/// `timestamp` is kept as the raw string the remote sent. Parsing happens
/// where it is consumed, so one malformed record cannot fail a whole fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RiskAssessmentRecord {
    pub id: AssessmentId,
    #[serde(alias = "patient_id")]
    pub patient: PatientId,
    #[serde(default)]
    pub patient_name: Option<String>,
    pub risk_score: f64,
    #[serde(default)]
    pub recommended_action: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub screening_type: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}
