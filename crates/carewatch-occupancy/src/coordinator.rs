use std::sync::Arc;

use tracing::{debug, info, warn};

use carewatch_client::{RemoteError, RemoteStore};
use carewatch_core::models::patient::Patient;
use carewatch_core::models::room::{Room, RoomDraft, RoomStatus};
use carewatch_core::{PatientId, RoomId};
use carewatch_risk::{Tier, tier_of};

use crate::error::OccupancyError;
use crate::snapshot::{RoomStats, Snapshot};
use crate::transition::Transition;

/// Fetch patients and rooms concurrently. Fails if either fetch fails.
pub async fn fetch_snapshot(store: &dyn RemoteStore) -> Result<Snapshot, RemoteError> {
    let (patients, rooms) = futures::try_join!(store.fetch_patients(), store.fetch_rooms())?;
    debug!(
        patients = patients.len(),
        rooms = rooms.len(),
        "fetched occupancy snapshot"
    );
    Ok(Snapshot::new(patients, rooms))
}

/// Proof that a fetch was started. Only the most recent ticket may apply
/// its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// Owns the local occupancy snapshot and performs room transitions.
///
/// Mutations take `&mut self`, so a coordinator never has two transitions
/// in flight. After every acknowledged mutation both patients and rooms are
/// re-fetched; the local snapshot is never edited from a mutation response.
pub struct OccupancyCoordinator {
    store: Arc<dyn RemoteStore>,
    snapshot: Snapshot,
    generation: u64,
    closed: bool,
    stale: bool,
}

impl OccupancyCoordinator {
    /// A coordinator with an empty snapshot. Call [`refresh`](Self::refresh)
    /// before relying on it, or use [`load`](Self::load).
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            snapshot: Snapshot::default(),
            generation: 0,
            closed: false,
            stale: true,
        }
    }

    pub async fn load(store: Arc<dyn RemoteStore>) -> Result<Self, OccupancyError> {
        let mut coordinator = Self::new(store);
        coordinator.refresh().await?;
        Ok(coordinator)
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// True until the first successful refresh, and from the moment a
    /// mutation is sent until the re-fetch after it succeeds. A mutation that
    /// failed in transport, or whose future was dropped, leaves it set.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop accepting fetch results. Fetches still in flight are discarded
    /// when they land.
    pub fn close(&mut self) {
        if !self.closed {
            debug!(generation = self.generation, "occupancy coordinator closed");
        }
        self.closed = true;
    }

    /// Start a fetch. Any earlier ticket is superseded.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Install a fetched snapshot if `ticket` is still current and the
    /// coordinator is open. Returns whether the snapshot was applied.
    pub fn apply(&mut self, ticket: FetchTicket, snapshot: Snapshot) -> bool {
        if self.closed {
            debug!(generation = ticket.generation, "discarding fetch result after close");
            return false;
        }
        if ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "discarding superseded fetch result"
            );
            return false;
        }

        for drift in snapshot.inconsistencies() {
            warn!(?drift, "remote occupancy is inconsistent");
        }
        self.snapshot = snapshot;
        self.stale = false;
        true
    }

    /// Re-fetch patients and rooms. A failed fetch leaves the snapshot as it
    /// was.
    pub async fn refresh(&mut self) -> Result<(), OccupancyError> {
        let ticket = self.begin_fetch();
        let snapshot = fetch_snapshot(self.store.as_ref()).await?;
        self.apply(ticket, snapshot);
        Ok(())
    }

    /// Refresh after a mutation or conflict. Failure is logged and marks the
    /// snapshot stale instead of replacing the caller's result.
    async fn refresh_after(&mut self, reason: &str) {
        if let Err(e) = self.refresh().await {
            warn!(reason, error = %e, "refresh failed, occupancy snapshot is stale");
            self.stale = true;
        }
    }

    pub async fn assign(
        &mut self,
        room: &RoomId,
        patient: &PatientId,
    ) -> Result<Room, OccupancyError> {
        self.run(Transition::Assign {
            room: room.clone(),
            patient: patient.clone(),
        })
        .await
    }

    pub async fn discharge(&mut self, room: &RoomId) -> Result<Room, OccupancyError> {
        self.run(Transition::Discharge { room: room.clone() }).await
    }

    pub async fn set_maintenance(&mut self, room: &RoomId) -> Result<Room, OccupancyError> {
        self.run(Transition::StartMaintenance { room: room.clone() })
            .await
    }

    pub async fn end_maintenance(&mut self, room: &RoomId) -> Result<Room, OccupancyError> {
        self.run(Transition::EndMaintenance { room: room.clone() })
            .await
    }

    /// Validate locally, send, then re-fetch.
    ///
    /// A conflict reported by the remote is re-validated against a fresh
    /// snapshot so the caller learns what actually changed.
    pub async fn run(&mut self, transition: Transition) -> Result<Room, OccupancyError> {
        let patch = match transition.validate(&self.snapshot) {
            Ok(patch) => patch,
            Err(e) => {
                if e.needs_refresh() {
                    debug!(%transition, error = %e, "rejected locally, refreshing");
                    self.refresh_after("rejected transition").await;
                }
                return Err(e);
            }
        };

        // Once the request may have reached the remote, the snapshot is stale
        // until a refresh lands. Holds even if this future is dropped here.
        self.stale = true;
        let result = self.store.patch_room(transition.room(), &patch).await;
        match result {
            Ok(room) => {
                info!(%transition, status = %room.status, "room transition acknowledged");
                self.refresh_after("acknowledged transition").await;
                Ok(room)
            }
            Err(RemoteError::Conflict { message, .. }) => {
                warn!(%transition, ?message, "remote rejected transition as a conflict");
                self.refresh_after("conflict").await;
                Err(self.explain_conflict(&transition))
            }
            Err(RemoteError::NotFound { .. }) => {
                warn!(%transition, "room no longer exists on the remote");
                self.refresh_after("missing room").await;
                Err(OccupancyError::UnknownRoom(transition.room().clone()))
            }
            Err(e) => {
                warn!(%transition, error = %e, "room transition failed");
                Err(e.into())
            }
        }
    }

    fn explain_conflict(&self, transition: &Transition) -> OccupancyError {
        if let Err(e) = transition.validate(&self.snapshot) {
            return e;
        }
        let status = self
            .snapshot
            .room(transition.room())
            .map_or(RoomStatus::Available, |r| r.status);
        transition.lost_race(status)
    }

    /// Register a new room.
    ///
    /// A room registered as occupied must name an occupant who exists and
    /// holds no other room.
    pub async fn register(&mut self, draft: RoomDraft) -> Result<Room, OccupancyError> {
        let request = draft.into_request()?;

        if let Some(patient) = &request.patient {
            if self.snapshot.patient(patient).is_none() {
                return Err(OccupancyError::UnknownPatient(patient.clone()));
            }
            if let Some(other) = self.snapshot.room_of(patient) {
                return Err(OccupancyError::PatientAlreadyAssigned {
                    patient: patient.clone(),
                    room: other.id.clone(),
                });
            }
        }

        self.stale = true;
        let room = match self.store.create_room(&request).await {
            Ok(room) => room,
            Err(e) => {
                warn!(number = %request.number, error = %e, "room registration failed");
                if matches!(e, RemoteError::Conflict { .. }) {
                    self.refresh_after("conflict").await;
                }
                return Err(e.into());
            }
        };
        info!(room = %room.id, number = %room.number, status = %room.status, "room registered");
        self.refresh_after("room registered").await;
        Ok(room)
    }

    pub fn room_stats(&self) -> RoomStats {
        self.snapshot.stats()
    }

    pub fn waiting_patients(&self) -> Vec<&Patient> {
        self.snapshot.waiting_patients()
    }

    pub fn room_of(&self, patient: &PatientId) -> Option<&Room> {
        self.snapshot.room_of(patient)
    }

    /// Risk tier badge for the occupant of `room`, if it has a scored one.
    pub fn occupant_tier(&self, room: &RoomId) -> Option<Tier> {
        let occupant = self.snapshot.room(room)?.patient.as_ref()?;
        tier_of(self.snapshot.patient(occupant)?.risk_score)
    }
}
