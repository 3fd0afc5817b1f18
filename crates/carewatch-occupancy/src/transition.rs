use std::fmt;

use carewatch_core::models::room::{RoomPatch, RoomStatus};
use carewatch_core::{PatientId, RoomId};

use crate::error::OccupancyError;
use crate::snapshot::Snapshot;

/// One edge of the room state machine.
///
/// `Available -> Occupied` (assign), `Occupied -> Available` (discharge),
/// `Available -> Maintenance` and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Assign { room: RoomId, patient: PatientId },
    Discharge { room: RoomId },
    StartMaintenance { room: RoomId },
    EndMaintenance { room: RoomId },
}

impl Transition {
    pub fn room(&self) -> &RoomId {
        match self {
            Self::Assign { room, .. }
            | Self::Discharge { room }
            | Self::StartMaintenance { room }
            | Self::EndMaintenance { room } => room,
        }
    }

    /// Check preconditions against `snapshot` and produce the patch to send.
    pub fn validate(&self, snapshot: &Snapshot) -> Result<RoomPatch, OccupancyError> {
        let room = snapshot
            .room(self.room())
            .ok_or_else(|| OccupancyError::UnknownRoom(self.room().clone()))?;

        match self {
            Self::Assign { patient, .. } => {
                if room.status != RoomStatus::Available {
                    return Err(OccupancyError::RoomUnavailable {
                        room: room.id.clone(),
                        status: room.status,
                    });
                }
                if snapshot.patient(patient).is_none() {
                    return Err(OccupancyError::UnknownPatient(patient.clone()));
                }
                if let Some(other) = snapshot.room_of(patient) {
                    return Err(OccupancyError::PatientAlreadyAssigned {
                        patient: patient.clone(),
                        room: other.id.clone(),
                    });
                }
                Ok(RoomPatch::occupy(patient.clone()))
            }
            Self::Discharge { .. } => {
                if room.status != RoomStatus::Occupied {
                    return Err(OccupancyError::RoomNotOccupied {
                        room: room.id.clone(),
                        status: room.status,
                    });
                }
                Ok(RoomPatch::vacate())
            }
            Self::StartMaintenance { .. } => {
                if room.status != RoomStatus::Available {
                    return Err(OccupancyError::RoomUnavailable {
                        room: room.id.clone(),
                        status: room.status,
                    });
                }
                Ok(RoomPatch::maintenance())
            }
            Self::EndMaintenance { .. } => {
                if room.status != RoomStatus::Maintenance {
                    return Err(OccupancyError::RoomNotInMaintenance {
                        room: room.id.clone(),
                        status: room.status,
                    });
                }
                Ok(RoomPatch::vacate())
            }
        }
    }

    /// The error to report when the remote rejected this transition as a
    /// conflict but the refreshed snapshot shows no specific cause.
    pub(crate) fn lost_race(&self, status: RoomStatus) -> OccupancyError {
        let room = self.room().clone();
        match self {
            Self::Discharge { .. } => OccupancyError::RoomNotOccupied { room, status },
            Self::EndMaintenance { .. } => OccupancyError::RoomNotInMaintenance { room, status },
            Self::Assign { .. } | Self::StartMaintenance { .. } => {
                OccupancyError::RoomUnavailable { room, status }
            }
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign { room, patient } => write!(f, "assign patient {patient} to room {room}"),
            Self::Discharge { room } => write!(f, "discharge room {room}"),
            Self::StartMaintenance { room } => write!(f, "start maintenance on room {room}"),
            Self::EndMaintenance { room } => write!(f, "end maintenance on room {room}"),
        }
    }
}
