//! carewatch-core
//!
//! Pure domain types and REST path conventions for the remote clinical API.
//! No HTTP dependency; this is the shared vocabulary of the Carewatch
//! workspace. The remote API is the system of record; these types are
//! snapshots of it.

pub mod endpoints;
pub mod error;
pub mod ids;
pub mod models;

pub use ids::{AssessmentId, PatientId, RoomId};
