#![allow(dead_code)]

use std::sync::Mutex;

use carewatch_client::{AssessmentSubmission, BoxFuture, RemoteError, RemoteStore};
use carewatch_core::models::assessment::RiskAssessmentRecord;
use carewatch_core::models::patient::{Patient, PatientDraft, PatientStatus};
use carewatch_core::models::room::{NewRoom, Room, RoomPatch, RoomStatus, RoomType};
use carewatch_core::{AssessmentId, PatientId, RoomId};

pub fn patient(id: &str, status: PatientStatus, risk_score: Option<f64>) -> Patient {
    Patient {
        id: PatientId::from(id),
        name: format!("Patient {id}"),
        age: 30,
        condition: "Routine".to_string(),
        contact: None,
        emergency_contact: None,
        email: None,
        status,
        risk_score,
        appointment: None,
        appointment_time: None,
        created_at: None,
        created_by: None,
    }
}

pub fn room(id: &str, status: RoomStatus, occupant: Option<&str>) -> Room {
    Room {
        id: RoomId::from(id),
        number: format!("Room {id}"),
        room_type: Some(RoomType::Consultation),
        status,
        capacity: 1,
        equipment: Vec::new(),
        patient: occupant.map(PatientId::from),
    }
}

#[derive(Default)]
struct State {
    patients: Vec<Patient>,
    rooms: Vec<Room>,
    next_id: u32,
    fetches: u32,
    patches: Vec<(RoomId, RoomPatch)>,
    fail_fetches: bool,
    fail_patches: bool,
    hold_fetches: bool,
}

/// In-memory remote that enforces occupancy the way the real service does:
/// conflicting patches are rejected with a 409.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(patients: Vec<Patient>, rooms: Vec<Room>) -> Self {
        Self {
            state: Mutex::new(State {
                patients,
                rooms,
                next_id: 100,
                ..State::default()
            }),
        }
    }

    /// Rooms as the remote holds them right now.
    pub fn rooms(&self) -> Vec<Room> {
        self.state.lock().unwrap().rooms.clone()
    }

    pub fn remote_room(&self, id: &str) -> Room {
        self.rooms()
            .into_iter()
            .find(|r| r.id.as_str() == id)
            .unwrap()
    }

    /// Change a room behind the coordinator's back, as another session would.
    pub fn set_room(&self, room: Room) {
        let mut state = self.state.lock().unwrap();
        match state.rooms.iter_mut().find(|r| r.id == room.id) {
            Some(existing) => *existing = room,
            None => state.rooms.push(room),
        }
    }

    pub fn remove_room(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .rooms
            .retain(|r| r.id.as_str() != id);
    }

    pub fn fetch_count(&self) -> u32 {
        self.state.lock().unwrap().fetches
    }

    pub fn patch_count(&self) -> usize {
        self.state.lock().unwrap().patches.len()
    }

    pub fn last_patch(&self) -> Option<(RoomId, RoomPatch)> {
        self.state.lock().unwrap().patches.last().cloned()
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.state.lock().unwrap().fail_fetches = fail;
    }

    pub fn fail_patches(&self, fail: bool) {
        self.state.lock().unwrap().fail_patches = fail;
    }

    /// Fetches started while held never resolve.
    pub fn hold_fetches(&self, hold: bool) {
        self.state.lock().unwrap().hold_fetches = hold;
    }

    async fn wait_if_held(&self) {
        let held = self.state.lock().unwrap().hold_fetches;
        if held {
            std::future::pending::<()>().await;
        }
    }

    fn fetch<T>(&self, pick: impl FnOnce(&State) -> Vec<T>) -> Result<Vec<T>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        if state.fail_fetches {
            return Err(RemoteError::Unreachable("connection refused".to_string()));
        }
        Ok(pick(&state))
    }

    fn patch(&self, id: &RoomId, patch: &RoomPatch) -> Result<Room, RemoteError> {
        let mut state = self.state.lock().unwrap();
        let path = format!("rooms/{id}/");
        if state.fail_patches {
            return Err(RemoteError::Timeout { path });
        }
        state.patches.push((id.clone(), patch.clone()));

        let conflict = |message: &str| RemoteError::Conflict {
            path: path.clone(),
            message: Some(message.to_string()),
        };

        let elsewhere = patch.patient.as_ref().is_some_and(|patient| {
            state
                .rooms
                .iter()
                .any(|r| &r.id != id && r.is_occupied_by(patient))
        });
        if elsewhere {
            return Err(conflict("Patient already has a room."));
        }

        let room = state
            .rooms
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(RemoteError::NotFound { path: path.clone() })?;

        let allowed = matches!(
            (room.status, patch.status),
            (RoomStatus::Available, RoomStatus::Occupied)
                | (RoomStatus::Occupied, RoomStatus::Available)
                | (RoomStatus::Available, RoomStatus::Maintenance)
                | (RoomStatus::Maintenance, RoomStatus::Available)
        );
        if !allowed {
            return Err(conflict("Room status changed."));
        }

        room.status = patch.status;
        room.patient = patch.patient.clone();
        Ok(room.clone())
    }
}

impl RemoteStore for MemoryStore {
    fn fetch_patients(&self) -> BoxFuture<'_, Result<Vec<Patient>, RemoteError>> {
        Box::pin(async move {
            self.wait_if_held().await;
            self.fetch(|s| s.patients.clone())
        })
    }

    fn fetch_rooms(&self) -> BoxFuture<'_, Result<Vec<Room>, RemoteError>> {
        Box::pin(async move {
            self.wait_if_held().await;
            self.fetch(|s| s.rooms.clone())
        })
    }

    fn fetch_assessments(&self) -> BoxFuture<'_, Result<Vec<RiskAssessmentRecord>, RemoteError>> {
        Box::pin(async move { Ok(Vec::new()) })
    }

    fn create_patient<'a>(
        &'a self,
        draft: &'a PatientDraft,
    ) -> BoxFuture<'a, Result<Patient, RemoteError>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let mut created = patient(&state.next_id.to_string(), PatientStatus::Waiting, None);
            created.name = draft.name.clone();
            state.patients.push(created.clone());
            Ok(created)
        })
    }

    fn update_patient<'a>(
        &'a self,
        id: &'a PatientId,
        draft: &'a PatientDraft,
    ) -> BoxFuture<'a, Result<Patient, RemoteError>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            let found = state
                .patients
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or(RemoteError::NotFound {
                    path: format!("patients/{id}/"),
                })?;
            found.name = draft.name.clone();
            Ok(found.clone())
        })
    }

    fn delete_patient<'a>(&'a self, id: &'a PatientId) -> BoxFuture<'a, Result<(), RemoteError>> {
        Box::pin(async move {
            self.state.lock().unwrap().patients.retain(|p| &p.id != id);
            Ok(())
        })
    }

    fn patch_room<'a>(
        &'a self,
        id: &'a RoomId,
        patch: &'a RoomPatch,
    ) -> BoxFuture<'a, Result<Room, RemoteError>> {
        Box::pin(async move { self.patch(id, patch) })
    }

    fn create_room<'a>(&'a self, new: &'a NewRoom) -> BoxFuture<'a, Result<Room, RemoteError>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            if state.rooms.iter().any(|r| r.number == new.number) {
                return Err(RemoteError::Conflict {
                    path: "rooms/".to_string(),
                    message: Some("Room with this name already exists.".to_string()),
                });
            }
            state.next_id += 1;
            let created = Room {
                id: RoomId::from(state.next_id.to_string()),
                number: new.number.clone(),
                room_type: Some(new.room_type),
                status: new.status,
                capacity: new.capacity,
                equipment: new.equipment.clone(),
                patient: new.patient.clone(),
            };
            state.rooms.push(created.clone());
            Ok(created)
        })
    }

    fn submit_assessment<'a>(
        &'a self,
        submission: &'a AssessmentSubmission,
    ) -> BoxFuture<'a, Result<RiskAssessmentRecord, RemoteError>> {
        Box::pin(async move {
            Ok(RiskAssessmentRecord {
                id: AssessmentId::from("1"),
                patient: submission.patient_id.clone(),
                patient_name: None,
                risk_score: 0.5,
                recommended_action: String::new(),
                timestamp: String::new(),
                region: None,
                screening_type: None,
                user: None,
            })
        })
    }
}
