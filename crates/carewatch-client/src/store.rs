use std::future::Future;
use std::pin::Pin;

use carewatch_core::models::assessment::RiskAssessmentRecord;
use carewatch_core::models::patient::{Patient, PatientDraft};
use carewatch_core::models::room::{NewRoom, Room, RoomPatch};
use carewatch_core::{PatientId, RoomId};

use crate::error::RemoteError;
use crate::submission::AssessmentSubmission;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Operations consumed from the remote system of record.
///
/// Every call either resolves with the remote's authoritative response or
/// fails with a [`RemoteError`]. Implementations never retry.
pub trait RemoteStore: Send + Sync {
    fn fetch_patients(&self) -> BoxFuture<'_, Result<Vec<Patient>, RemoteError>>;

    /// All rooms or an error. Never a partial list: a missing room would
    /// hide its occupant from the one-room-per-patient check.
    fn fetch_rooms(&self) -> BoxFuture<'_, Result<Vec<Room>, RemoteError>>;

    fn fetch_assessments(&self) -> BoxFuture<'_, Result<Vec<RiskAssessmentRecord>, RemoteError>>;

    fn create_patient<'a>(
        &'a self,
        draft: &'a PatientDraft,
    ) -> BoxFuture<'a, Result<Patient, RemoteError>>;

    fn update_patient<'a>(
        &'a self,
        id: &'a PatientId,
        draft: &'a PatientDraft,
    ) -> BoxFuture<'a, Result<Patient, RemoteError>>;

    fn delete_patient<'a>(&'a self, id: &'a PatientId) -> BoxFuture<'a, Result<(), RemoteError>>;

    /// Set a room's status and occupant in one request.
    fn patch_room<'a>(
        &'a self,
        id: &'a RoomId,
        patch: &'a RoomPatch,
    ) -> BoxFuture<'a, Result<Room, RemoteError>>;

    fn create_room<'a>(&'a self, room: &'a NewRoom) -> BoxFuture<'a, Result<Room, RemoteError>>;

    /// Score a feature vector. The remote stores the resulting record.
    fn submit_assessment<'a>(
        &'a self,
        submission: &'a AssessmentSubmission,
    ) -> BoxFuture<'a, Result<RiskAssessmentRecord, RemoteError>>;
}
