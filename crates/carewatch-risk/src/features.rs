use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{FieldProblem, RiskError};

/// Form field names, in the order the remote model consumes them.
pub mod field {
    pub const AGE: &str = "age";
    pub const SEXUAL_PARTNERS: &str = "sexual_partners";
    pub const FIRST_SEXUAL_AGE: &str = "first_sexual_age";
    pub const YEARS_SEXUALLY_ACTIVE: &str = "years_sexually_active";
    pub const HPV_POSITIVE: &str = "hpv_positive";
    pub const ABNORMAL_PAP: &str = "abnormal_pap";
    pub const SMOKING: &str = "smoking";
    pub const STDS_HISTORY: &str = "stds_history";
    pub const INSURANCE: &str = "insurance";
    pub const REGION: &str = "region";
    pub const SCREENING_TYPE: &str = "screening_type";
}

/// Raw assessment form values keyed by field name, exactly as entered.
///
/// Blank values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRiskInputs {
    values: BTreeMap<String, String>,
}

impl RawRiskInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Trimmed value for `field`, or `None` when missing or blank.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for RawRiskInputs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Validated clinical inputs for one risk assessment.
///
/// Built fresh per submission and not kept afterwards; the remote service
/// returns and stores the authoritative score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RiskFeatureVector {
    pub age: f64,
    pub sexual_partners: f64,
    pub first_sexual_age: f64,
    pub years_sexually_active: f64,
    pub hpv_positive: bool,
    pub abnormal_pap: bool,
    pub smoking: bool,
    pub stds_history: bool,
    pub insurance: Option<bool>,
    pub region: Option<String>,
    pub screening_type: Option<String>,
}

impl RiskFeatureVector {
    /// Number of slots in the model's feature array.
    pub const WIRE_LEN: usize = 10;

    /// Feature array in the remote model's order.
    ///
    /// The last slot is the model's total-score placeholder and is always
    /// `null`. A missing insurance flag is sent as `0`.
    pub fn to_wire_features(&self) -> Vec<Option<f64>> {
        vec![
            Some(self.age),
            Some(self.sexual_partners),
            Some(self.first_sexual_age),
            Some(self.years_sexually_active),
            Some(flag(self.hpv_positive)),
            Some(flag(self.abnormal_pap)),
            Some(flag(self.smoking)),
            Some(flag(self.stds_history)),
            Some(flag(self.insurance.unwrap_or(false))),
            None,
        ]
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Validate raw form input and shape it into a [`RiskFeatureVector`].
///
/// Every numeric and boolean field is required except `insurance`; region
/// and screening type are optional context. Nothing is defaulted: a missing
/// `age` is an error, never `0`.
pub fn build_feature_vector(raw: &RawRiskInputs) -> Result<RiskFeatureVector, RiskError> {
    Ok(RiskFeatureVector {
        age: required_number(raw, field::AGE)?,
        sexual_partners: required_number(raw, field::SEXUAL_PARTNERS)?,
        first_sexual_age: required_number(raw, field::FIRST_SEXUAL_AGE)?,
        years_sexually_active: required_number(raw, field::YEARS_SEXUALLY_ACTIVE)?,
        hpv_positive: required_flag(raw, field::HPV_POSITIVE)?,
        abnormal_pap: required_flag(raw, field::ABNORMAL_PAP)?,
        smoking: required_flag(raw, field::SMOKING)?,
        stds_history: required_flag(raw, field::STDS_HISTORY)?,
        insurance: raw
            .get(field::INSURANCE)
            .map(|v| parse_flag(field::INSURANCE, v))
            .transpose()?,
        region: raw.get(field::REGION).map(str::to_string),
        screening_type: raw.get(field::SCREENING_TYPE).map(str::to_string),
    })
}

fn required<'a>(raw: &'a RawRiskInputs, field: &'static str) -> Result<&'a str, RiskError> {
    raw.get(field).ok_or(RiskError::MissingField {
        field,
        problem: FieldProblem::Absent,
    })
}

fn required_number(raw: &RawRiskInputs, field: &'static str) -> Result<f64, RiskError> {
    let value = required(raw, field)?;
    let not_a_number = || RiskError::MissingField {
        field,
        problem: FieldProblem::NotANumber(value.to_string()),
    };

    let number: f64 = value.parse().map_err(|_| not_a_number())?;
    if !number.is_finite() {
        return Err(not_a_number());
    }
    if number < 0.0 {
        return Err(RiskError::MissingField {
            field,
            problem: FieldProblem::Negative(number),
        });
    }
    Ok(number)
}

fn required_flag(raw: &RawRiskInputs, field: &'static str) -> Result<bool, RiskError> {
    parse_flag(field, required(raw, field)?)
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, RiskError> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(RiskError::MissingField {
            field,
            problem: FieldProblem::NotAFlag(other.to_string()),
        }),
    }
}
