use serde::Serialize;

use carewatch_core::PatientId;
use carewatch_risk::RiskFeatureVector;

/// Body of a risk assessment request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentSubmission {
    pub patient_id: PatientId,
    pub features: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screening_type: Option<String>,
}

impl AssessmentSubmission {
    pub fn new(patient_id: PatientId, vector: &RiskFeatureVector) -> Self {
        Self {
            patient_id,
            features: vector.to_wire_features(),
            region: vector.region.clone(),
            screening_type: vector.screening_type.clone(),
        }
    }
}
