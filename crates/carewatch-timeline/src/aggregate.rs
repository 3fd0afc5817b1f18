use jiff::Timestamp;
use jiff::tz::TimeZone;
use tracing::{debug, warn};

use carewatch_core::models::assessment::RiskAssessmentRecord;
use carewatch_core::models::patient::Patient;
use carewatch_risk::tier_of;

use crate::event::{EventKind, EventMetadata, HistoryEvent};
use crate::timestamp::parse_timestamp;

const SYSTEM_ACTOR: &str = "System";

/// Merge patients and assessments into one log, newest first.
///
/// Patient events come first in the merge, then assessment events, and the
/// sort is stable, so events with equal timestamps keep that order. An
/// event whose timestamp cannot be parsed is dropped with a warning; the
/// rest of the timeline is unaffected.
///
/// A patient's timestamp is its creation time, else its appointment, else
/// `now`.
pub fn build_timeline(
    patients: &[Patient],
    assessments: &[RiskAssessmentRecord],
    now: Timestamp,
    tz: &TimeZone,
) -> Vec<HistoryEvent> {
    let mut events: Vec<HistoryEvent> = patients
        .iter()
        .filter_map(|p| patient_event(p, now, tz))
        .chain(assessments.iter().filter_map(|r| assessment_event(r, tz)))
        .collect();

    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

fn patient_event(patient: &Patient, now: Timestamp, tz: &TimeZone) -> Option<HistoryEvent> {
    let id = format!("patient_{}", patient.id);

    let timestamp = match patient.created().or_else(|| patient.scheduled_for()) {
        Some(raw) => match parse_timestamp(raw, tz) {
            Ok(ts) => ts,
            Err(e) => {
                warn!(event = %id, error = %e, "dropping timeline event");
                return None;
            }
        },
        None => {
            debug!(event = %id, "patient has no creation or appointment time, using now");
            now
        }
    };

    Some(HistoryEvent {
        id,
        kind: EventKind::PatientAdded,
        title: "New Patient Added".to_string(),
        description: format!("{} was added to the system", patient.name),
        actor: actor(patient.created_by.as_deref()),
        timestamp,
        metadata: EventMetadata {
            patient_id: patient.id.clone(),
            risk_score: patient.risk_score,
            tier: tier_of(patient.risk_score),
        },
    })
}

fn assessment_event(record: &RiskAssessmentRecord, tz: &TimeZone) -> Option<HistoryEvent> {
    let id = format!("risk_{}", record.id);

    let timestamp = match parse_timestamp(&record.timestamp, tz) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(event = %id, error = %e, "dropping timeline event");
            return None;
        }
    };

    let subject = record
        .patient_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| record.patient.to_string(), str::to_string);

    Some(HistoryEvent {
        id,
        kind: EventKind::RiskAssessment,
        title: "Risk Assessment Completed".to_string(),
        description: format!("{subject} risk assessment completed"),
        actor: actor(record.user.as_deref()),
        timestamp,
        metadata: EventMetadata {
            patient_id: record.patient.clone(),
            risk_score: Some(record.risk_score),
            tier: tier_of(Some(record.risk_score)),
        },
    })
}

fn actor(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(SYSTEM_ACTOR)
        .to_string()
}
