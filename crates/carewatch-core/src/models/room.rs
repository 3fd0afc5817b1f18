use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::ids::{PatientId, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RoomType {
    Delivery,
    Recovery,
    Consultation,
    Emergency,
}

impl RoomType {
    /// Read a free-text type as entered on the remote. Case and surrounding
    /// whitespace are ignored; anything else unrecognised is `None`.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "delivery" => Some(Self::Delivery),
            "recovery" => Some(Self::Recovery),
            "consultation" => Some(Self::Consultation),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }
}

/// Occupancy state of a room.
///
/// `Available ⇄ Occupied` and `Available ⇄ Maintenance` are the only edges;
/// there is no terminal state. Older rooms report `cleaning`, which reads as
/// maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RoomStatus {
    Available,
    Occupied,
    #[serde(alias = "cleaning")]
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A room as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub id: RoomId,
    #[serde(alias = "name")]
    pub number: String,
    /// `None` when the remote's free-text type is missing or unrecognised.
    #[serde(rename = "type", default, deserialize_with = "deserialize_room_type")]
    pub room_type: Option<RoomType>,
    pub status: RoomStatus,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Occupant. The remote sends either a bare id or the nested patient.
    #[serde(default, deserialize_with = "deserialize_occupant")]
    pub patient: Option<PatientId>,
}

impl Room {
    /// A room is consistent when it is occupied exactly when it has an occupant.
    pub fn is_consistent(&self) -> bool {
        (self.status == RoomStatus::Occupied) == self.patient.is_some()
    }

    pub fn is_occupied_by(&self, patient: &PatientId) -> bool {
        self.patient.as_ref() == Some(patient)
    }
}

fn default_capacity() -> u32 {
    1
}

fn deserialize_room_type<'de, D>(deserializer: D) -> Result<Option<RoomType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RoomType::from_wire))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OccupantRef {
    Id(PatientId),
    Nested { id: PatientId },
}

fn deserialize_occupant<'de, D>(deserializer: D) -> Result<Option<PatientId>, D::Error>
where
    D: Deserializer<'de>,
{
    let occupant = Option::<OccupantRef>::deserialize(deserializer)?;
    Ok(occupant.map(|o| match o {
        OccupantRef::Id(id) | OccupantRef::Nested { id } => id,
    }))
}

/// Status and occupant change sent for a room transition.
///
/// The occupant is always serialized, as `null` when clearing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RoomPatch {
    pub status: RoomStatus,
    pub patient: Option<PatientId>,
}

impl RoomPatch {
    pub fn occupy(patient: PatientId) -> Self {
        Self {
            status: RoomStatus::Occupied,
            patient: Some(patient),
        }
    }

    pub fn vacate() -> Self {
        Self {
            status: RoomStatus::Available,
            patient: None,
        }
    }

    pub fn maintenance() -> Self {
        Self {
            status: RoomStatus::Maintenance,
            patient: None,
        }
    }
}

/// Registration form for a new room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomDraft {
    pub number: String,
    pub room_type: Option<RoomType>,
    /// Initial status; `Available` when not given.
    pub status: Option<RoomStatus>,
    pub capacity: Option<u32>,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub patient: Option<PatientId>,
}

/// Body of a room creation request, produced by [`RoomDraft::into_request`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRoom {
    #[serde(rename = "name")]
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub status: RoomStatus,
    pub capacity: u32,
    pub equipment: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientId>,
}

impl RoomDraft {
    /// Validate the draft and fill defaults.
    ///
    /// Number and type are required. A room may only start out occupied if
    /// it names its occupant, and may only name an occupant if it starts
    /// out occupied.
    pub fn into_request(self) -> Result<NewRoom, CoreError> {
        let number = self.number.trim().to_string();
        if number.is_empty() {
            return Err(CoreError::MissingField("number".to_string()));
        }
        let room_type = self
            .room_type
            .ok_or_else(|| CoreError::MissingField("type".to_string()))?;
        let status = self.status.unwrap_or(RoomStatus::Available);

        match (status, &self.patient) {
            (RoomStatus::Occupied, None) => {
                return Err(CoreError::InvalidValue {
                    field: "status".to_string(),
                    message: "an occupied room needs an occupant".to_string(),
                });
            }
            (RoomStatus::Available | RoomStatus::Maintenance, Some(_)) => {
                return Err(CoreError::InvalidValue {
                    field: "patient".to_string(),
                    message: format!("a {status} room cannot have an occupant"),
                });
            }
            _ => {}
        }

        let capacity = self.capacity.unwrap_or_else(default_capacity);
        if capacity == 0 {
            return Err(CoreError::InvalidValue {
                field: "capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(NewRoom {
            number,
            room_type,
            status,
            capacity,
            equipment: self.equipment,
            patient: self.patient,
        })
    }
}
