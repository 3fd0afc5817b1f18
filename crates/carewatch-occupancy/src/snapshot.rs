use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use carewatch_core::models::patient::{Patient, PatientStatus};
use carewatch_core::models::room::{Room, RoomStatus};
use carewatch_core::{PatientId, RoomId};

/// Patients and rooms as last fetched from the remote, together.
///
/// Always replaced as a whole; never patched in place from a mutation
/// response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub patients: Vec<Patient>,
    pub rooms: Vec<Room>,
}

/// Room counts for the rooms screen summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RoomStats {
    pub total: u32,
    pub occupied: u32,
    pub available: u32,
    pub maintenance: u32,
}

/// A disagreement inside a fetched snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccupancyDrift {
    /// Status says occupied but there is no occupant, or the reverse.
    StatusMismatch {
        room: RoomId,
        status: RoomStatus,
        patient: Option<PatientId>,
    },
    /// The room names an occupant the patient list does not contain.
    UnknownOccupant { room: RoomId, patient: PatientId },
    /// One patient is the occupant of more than one room.
    SeveralRooms {
        patient: PatientId,
        rooms: Vec<RoomId>,
    },
}

impl Snapshot {
    pub fn new(patients: Vec<Patient>, rooms: Vec<Room>) -> Self {
        Self { patients, rooms }
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    pub fn patient(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.iter().find(|p| &p.id == id)
    }

    /// The room `patient` currently occupies, if any.
    pub fn room_of(&self, patient: &PatientId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.is_occupied_by(patient))
    }

    pub fn stats(&self) -> RoomStats {
        let mut stats = RoomStats::default();
        for room in &self.rooms {
            stats.total += 1;
            match room.status {
                RoomStatus::Available => stats.available += 1,
                RoomStatus::Occupied => stats.occupied += 1,
                RoomStatus::Maintenance => stats.maintenance += 1,
            }
        }
        stats
    }

    /// Candidates for assignment: waiting patients who hold no room.
    pub fn waiting_patients(&self) -> Vec<&Patient> {
        self.patients
            .iter()
            .filter(|p| p.status == PatientStatus::Waiting && self.room_of(&p.id).is_none())
            .collect()
    }

    pub fn inconsistencies(&self) -> Vec<OccupancyDrift> {
        let mut drift = Vec::new();
        let mut rooms_by_patient: BTreeMap<&PatientId, Vec<RoomId>> = BTreeMap::new();

        for room in &self.rooms {
            if !room.is_consistent() {
                drift.push(OccupancyDrift::StatusMismatch {
                    room: room.id.clone(),
                    status: room.status,
                    patient: room.patient.clone(),
                });
            }
            if let Some(patient) = &room.patient {
                if self.patient(patient).is_none() {
                    drift.push(OccupancyDrift::UnknownOccupant {
                        room: room.id.clone(),
                        patient: patient.clone(),
                    });
                }
                rooms_by_patient
                    .entry(patient)
                    .or_default()
                    .push(room.id.clone());
            }
        }

        for (patient, rooms) in rooms_by_patient {
            if rooms.len() > 1 {
                drift.push(OccupancyDrift::SeveralRooms {
                    patient: patient.clone(),
                    rooms,
                });
            }
        }
        drift
    }
}
