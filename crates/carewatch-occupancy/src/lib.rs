//! carewatch-occupancy
//!
//! Keeps patient/room occupancy consistent. A room is occupied exactly when
//! it names an occupant, and a patient occupies at most one room.
//!
//! Transitions are validated against the local [`Snapshot`], sent to the
//! remote, and only reflected locally after the remote acknowledges them and
//! a full re-fetch of patients and rooms completes. The remote is the only
//! arbiter between concurrent staff sessions.

pub mod coordinator;
pub mod error;
pub mod snapshot;
pub mod transition;

pub use coordinator::{FetchTicket, OccupancyCoordinator, fetch_snapshot};
pub use error::OccupancyError;
pub use snapshot::{OccupancyDrift, RoomStats, Snapshot};
pub use transition::Transition;
