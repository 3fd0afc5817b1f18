use thiserror::Error;

use carewatch_client::RemoteError;
use carewatch_core::error::CoreError;
use carewatch_core::models::room::RoomStatus;
use carewatch_core::{PatientId, RoomId};

#[derive(Debug, Error)]
pub enum OccupancyError {
    #[error("invalid room: {0}")]
    Validation(#[from] CoreError),

    #[error("room {0} no longer exists")]
    UnknownRoom(RoomId),

    #[error("patient {0} no longer exists")]
    UnknownPatient(PatientId),

    #[error("room {room} is {status} and cannot take a patient")]
    RoomUnavailable { room: RoomId, status: RoomStatus },

    #[error("patient {patient} is already assigned to room {room}")]
    PatientAlreadyAssigned { patient: PatientId, room: RoomId },

    #[error("room {room} is {status}, there is no patient to discharge")]
    RoomNotOccupied { room: RoomId, status: RoomStatus },

    #[error("room {room} is {status}, not under maintenance")]
    RoomNotInMaintenance { room: RoomId, status: RoomStatus },

    #[error(transparent)]
    Transport(#[from] RemoteError),
}

impl OccupancyError {
    /// Someone else changed the room or patient underneath us. Retrying the
    /// same intent after a refresh may succeed or fail for a clearer reason.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::RoomUnavailable { .. }
                | Self::PatientAlreadyAssigned { .. }
                | Self::RoomNotOccupied { .. }
                | Self::RoomNotInMaintenance { .. }
        )
    }

    /// Errors that mean the local snapshot is behind the remote.
    pub fn needs_refresh(&self) -> bool {
        self.is_conflict() || matches!(self, Self::UnknownRoom(_) | Self::UnknownPatient(_))
    }

    /// Text to show staff.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
