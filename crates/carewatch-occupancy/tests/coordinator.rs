mod common;

use std::sync::Arc;
use std::time::Duration;

use carewatch_core::models::patient::PatientStatus;
use carewatch_core::models::room::{Room, RoomDraft, RoomPatch, RoomStatus, RoomType};
use carewatch_core::{PatientId, RoomId};
use carewatch_occupancy::{
    OccupancyCoordinator, OccupancyDrift, OccupancyError, RoomStats, Snapshot, fetch_snapshot,
};
use carewatch_risk::Tier;

use common::{MemoryStore, patient, room};

fn ward() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(
        vec![
            patient("p1", PatientStatus::Waiting, Some(0.82)),
            patient("p2", PatientStatus::Waiting, Some(0.12)),
            patient("p3", PatientStatus::Completed, None),
        ],
        vec![
            room("A", RoomStatus::Available, None),
            room("B", RoomStatus::Available, None),
            room("C", RoomStatus::Maintenance, None),
        ],
    ))
}

async fn coordinator(store: &Arc<MemoryStore>) -> OccupancyCoordinator {
    OccupancyCoordinator::load(store.clone()).await.unwrap()
}

fn rid(id: &str) -> RoomId {
    RoomId::from(id)
}

fn pid(id: &str) -> PatientId {
    PatientId::from(id)
}

#[tokio::test]
async fn load_fetches_patients_and_rooms() {
    let store = ward();
    let coord = coordinator(&store).await;

    assert_eq!(store.fetch_count(), 2);
    assert!(!coord.is_stale());
    assert_eq!(coord.snapshot().patients.len(), 3);
    assert_eq!(
        coord.room_stats(),
        RoomStats {
            total: 3,
            occupied: 0,
            available: 2,
            maintenance: 1,
        }
    );
}

#[tokio::test]
async fn second_assignment_to_same_room_is_rejected() {
    let store = ward();
    let mut coord = coordinator(&store).await;

    let room = coord.assign(&rid("A"), &pid("p1")).await.unwrap();
    assert_eq!(room.status, RoomStatus::Occupied);
    assert_eq!(room.patient, Some(pid("p1")));

    let local = coord.snapshot().room(&rid("A")).unwrap();
    assert_eq!(local.status, RoomStatus::Occupied);
    assert_eq!(local.patient, Some(pid("p1")));

    let before = coord.snapshot().clone();
    let err = coord.assign(&rid("A"), &pid("p2")).await.unwrap_err();
    assert!(matches!(
        err,
        OccupancyError::RoomUnavailable {
            status: RoomStatus::Occupied,
            ..
        }
    ));
    assert!(err.is_conflict());
    assert_eq!(store.patch_count(), 1);
    assert_eq!(store.remote_room("A").patient, Some(pid("p1")));
    assert_eq!(coord.snapshot(), &before);
}

#[tokio::test]
async fn occupied_room_wins_over_unknown_patient() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    coord.assign(&rid("A"), &pid("p1")).await.unwrap();

    let err = coord.assign(&rid("A"), &pid("nobody")).await.unwrap_err();
    assert!(matches!(
        err,
        OccupancyError::RoomUnavailable {
            status: RoomStatus::Occupied,
            ..
        }
    ));
    assert_eq!(store.patch_count(), 1);
}

#[tokio::test]
async fn patient_cannot_hold_two_rooms() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    coord.assign(&rid("A"), &pid("p1")).await.unwrap();

    let err = coord.assign(&rid("B"), &pid("p1")).await.unwrap_err();
    match err {
        OccupancyError::PatientAlreadyAssigned { patient, room } => {
            assert_eq!(patient, pid("p1"));
            assert_eq!(room, rid("A"));
        }
        other => panic!("expected PatientAlreadyAssigned, got {other:?}"),
    }
    assert_eq!(store.remote_room("B").status, RoomStatus::Available);
}

#[tokio::test]
async fn occupant_of_room_with_unrecognised_type_still_counts() {
    let birthing: Room = serde_json::from_value(serde_json::json!({
        "id": "D", "name": "D-1", "type": "Birthing suite", "status": "occupied", "patient": "p1"
    }))
    .unwrap();
    assert_eq!(birthing.room_type, None);
    let store = ward();
    store.set_room(birthing);
    let mut coord = coordinator(&store).await;

    assert_eq!(coord.room_of(&pid("p1")).map(|r| r.id.clone()), Some(rid("D")));
    let err = coord.assign(&rid("A"), &pid("p1")).await.unwrap_err();
    assert!(matches!(
        err,
        OccupancyError::PatientAlreadyAssigned { ref room, .. } if room == &rid("D")
    ));
    assert_eq!(store.patch_count(), 0);
    assert_eq!(store.remote_room("A").status, RoomStatus::Available);
}

#[tokio::test]
async fn every_acknowledged_mutation_refetches_both_lists() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    let before = store.fetch_count();

    coord.assign(&rid("A"), &pid("p1")).await.unwrap();
    assert_eq!(store.fetch_count(), before + 2);

    coord.discharge(&rid("A")).await.unwrap();
    assert_eq!(store.fetch_count(), before + 4);
}

#[tokio::test]
async fn unknown_ids_refresh_and_fail() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    let before = store.fetch_count();

    let err = coord.assign(&rid("Z"), &pid("p1")).await.unwrap_err();
    assert!(matches!(err, OccupancyError::UnknownRoom(ref id) if id == &rid("Z")));
    assert!(!err.is_conflict());
    assert!(err.needs_refresh());
    assert_eq!(store.fetch_count(), before + 2);

    let err = coord.assign(&rid("A"), &pid("nobody")).await.unwrap_err();
    assert!(matches!(err, OccupancyError::UnknownPatient(_)));
    assert_eq!(store.patch_count(), 0);
}

#[tokio::test]
async fn remote_conflict_refreshes_and_reports_what_changed() {
    let store = ward();
    let mut coord = coordinator(&store).await;

    // Another session takes room A after our snapshot was fetched.
    store.set_room(room("A", RoomStatus::Occupied, Some("p2")));

    let err = coord.assign(&rid("A"), &pid("p1")).await.unwrap_err();
    assert!(matches!(
        err,
        OccupancyError::RoomUnavailable {
            status: RoomStatus::Occupied,
            ..
        }
    ));
    assert_eq!(store.patch_count(), 1);

    let local = coord.snapshot().room(&rid("A")).unwrap();
    assert_eq!(local.patient, Some(pid("p2")));
    assert_eq!(coord.room_of(&pid("p2")).map(|r| r.id.clone()), Some(rid("A")));
}

#[tokio::test]
async fn room_deleted_remotely_is_unknown() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    store.remove_room("B");

    let err = coord.assign(&rid("B"), &pid("p1")).await.unwrap_err();
    assert!(matches!(err, OccupancyError::UnknownRoom(_)));
    assert!(coord.snapshot().room(&rid("B")).is_none());
}

#[tokio::test]
async fn transport_failure_leaves_snapshot_untouched() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    let before = coord.snapshot().clone();
    let fetches = store.fetch_count();
    store.fail_patches(true);

    let err = coord.assign(&rid("A"), &pid("p1")).await.unwrap_err();
    assert!(matches!(err, OccupancyError::Transport(_)));
    assert_eq!(
        err.user_message(),
        "The remote service could not be reached. Please try again."
    );
    assert_eq!(coord.snapshot(), &before);
    assert_eq!(store.fetch_count(), fetches);
    // A timed out patch may still have been applied remotely.
    assert!(coord.is_stale());
}

#[tokio::test]
async fn dropping_a_sent_transition_leaves_snapshot_stale() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    store.hold_fetches(true);

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        coord.assign(&rid("A"), &pid("p1")),
    )
    .await;
    assert!(outcome.is_err());

    assert_eq!(store.remote_room("A").patient, Some(pid("p1")));
    assert!(coord.is_stale());
    assert_eq!(
        coord.snapshot().room(&rid("A")).unwrap().status,
        RoomStatus::Available
    );

    store.hold_fetches(false);
    coord.refresh().await.unwrap();
    assert!(!coord.is_stale());
    assert_eq!(coord.room_of(&pid("p1")).map(|r| r.id.clone()), Some(rid("A")));
}

#[tokio::test]
async fn failed_refresh_after_success_marks_snapshot_stale() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    store.fail_fetches(true);

    let room = coord.assign(&rid("A"), &pid("p1")).await.unwrap();
    assert_eq!(room.status, RoomStatus::Occupied);
    assert!(coord.is_stale());
    // The local snapshot was not edited from the response.
    assert_eq!(
        coord.snapshot().room(&rid("A")).unwrap().status,
        RoomStatus::Available
    );

    store.fail_fetches(false);
    coord.refresh().await.unwrap();
    assert!(!coord.is_stale());
    assert_eq!(
        coord.snapshot().room(&rid("A")).unwrap().status,
        RoomStatus::Occupied
    );
}

#[tokio::test]
async fn refresh_failure_keeps_previous_snapshot() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    let before = coord.snapshot().clone();
    store.fail_fetches(true);

    let err = coord.refresh().await.unwrap_err();
    assert!(matches!(err, OccupancyError::Transport(_)));
    assert_eq!(coord.snapshot(), &before);
}

#[tokio::test]
async fn discharge_clears_occupant() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    coord.assign(&rid("A"), &pid("p1")).await.unwrap();

    let room = coord.discharge(&rid("A")).await.unwrap();
    assert_eq!(room.status, RoomStatus::Available);
    assert_eq!(room.patient, None);
    assert_eq!(store.last_patch(), Some((rid("A"), RoomPatch::vacate())));
    assert!(coord.room_of(&pid("p1")).is_none());
}

#[tokio::test]
async fn discharge_requires_occupied_room() {
    let store = ward();
    let mut coord = coordinator(&store).await;

    let err = coord.discharge(&rid("B")).await.unwrap_err();
    assert!(matches!(
        err,
        OccupancyError::RoomNotOccupied {
            status: RoomStatus::Available,
            ..
        }
    ));
    assert_eq!(store.patch_count(), 0);
}

#[tokio::test]
async fn maintenance_round_trip() {
    let store = ward();
    let mut coord = coordinator(&store).await;

    let room = coord.set_maintenance(&rid("B")).await.unwrap();
    assert_eq!(room.status, RoomStatus::Maintenance);

    let err = coord.assign(&rid("B"), &pid("p1")).await.unwrap_err();
    assert!(matches!(
        err,
        OccupancyError::RoomUnavailable {
            status: RoomStatus::Maintenance,
            ..
        }
    ));

    let room = coord.end_maintenance(&rid("B")).await.unwrap();
    assert_eq!(room.status, RoomStatus::Available);

    let err = coord.end_maintenance(&rid("B")).await.unwrap_err();
    assert!(matches!(err, OccupancyError::RoomNotInMaintenance { .. }));
}

#[tokio::test]
async fn occupied_room_cannot_enter_maintenance() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    coord.assign(&rid("A"), &pid("p1")).await.unwrap();

    let err = coord.set_maintenance(&rid("A")).await.unwrap_err();
    assert!(matches!(
        err,
        OccupancyError::RoomUnavailable {
            status: RoomStatus::Occupied,
            ..
        }
    ));
}

#[tokio::test]
async fn register_defaults_to_available_and_refreshes() {
    let store = ward();
    let mut coord = coordinator(&store).await;

    let room = coord
        .register(RoomDraft {
            number: "D-12".to_string(),
            room_type: Some(RoomType::Recovery),
            ..RoomDraft::default()
        })
        .await
        .unwrap();

    assert_eq!(room.status, RoomStatus::Available);
    assert_eq!(room.capacity, 1);
    assert!(coord.snapshot().room(&room.id).is_some());
    assert_eq!(coord.room_stats().total, 4);
}

#[tokio::test]
async fn register_rejects_invalid_drafts_without_remote_call() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    let fetches = store.fetch_count();

    let err = coord
        .register(RoomDraft {
            number: "D-12".to_string(),
            ..RoomDraft::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OccupancyError::Validation(_)));

    let err = coord
        .register(RoomDraft {
            number: "D-13".to_string(),
            room_type: Some(RoomType::Delivery),
            status: Some(RoomStatus::Occupied),
            ..RoomDraft::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OccupancyError::Validation(_)));

    assert_eq!(coord.room_stats().total, 3);
    assert_eq!(store.fetch_count(), fetches);
}

#[tokio::test]
async fn register_occupied_room_checks_occupant() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    coord.assign(&rid("A"), &pid("p1")).await.unwrap();

    let err = coord
        .register(RoomDraft {
            number: "E-1".to_string(),
            room_type: Some(RoomType::Emergency),
            status: Some(RoomStatus::Occupied),
            patient: Some(pid("p1")),
            ..RoomDraft::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OccupancyError::PatientAlreadyAssigned { .. }));

    let room = coord
        .register(RoomDraft {
            number: "E-1".to_string(),
            room_type: Some(RoomType::Emergency),
            status: Some(RoomStatus::Occupied),
            patient: Some(pid("p2")),
            ..RoomDraft::default()
        })
        .await
        .unwrap();
    assert_eq!(room.patient, Some(pid("p2")));
    assert_eq!(coord.room_stats().occupied, 2);
}

#[tokio::test]
async fn duplicate_room_number_surfaces_remote_message() {
    let store = ward();
    let mut coord = coordinator(&store).await;

    let err = coord
        .register(RoomDraft {
            number: "Room A".to_string(),
            room_type: Some(RoomType::Consultation),
            ..RoomDraft::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OccupancyError::Transport(_)));
    assert_eq!(err.user_message(), "Room with this name already exists.");
}

#[tokio::test]
async fn superseded_fetch_is_discarded() {
    let store = ward();
    let mut coord = OccupancyCoordinator::new(store.clone());
    assert!(coord.is_stale());

    let old = coord.begin_fetch();
    let old_snapshot = fetch_snapshot(&*store).await.unwrap();

    store.set_room(room("A", RoomStatus::Maintenance, None));
    let current = coord.begin_fetch();
    let current_snapshot = fetch_snapshot(&*store).await.unwrap();

    assert!(coord.apply(current, current_snapshot));
    assert!(!coord.apply(old, old_snapshot));
    assert_eq!(
        coord.snapshot().room(&rid("A")).unwrap().status,
        RoomStatus::Maintenance
    );
}

#[tokio::test]
async fn fetch_landing_after_close_is_discarded() {
    let store = ward();
    let mut coord = OccupancyCoordinator::new(store.clone());

    let ticket = coord.begin_fetch();
    let remote = coord.store();
    let pending = tokio::spawn(async move { fetch_snapshot(&*remote).await });

    coord.close();
    let snapshot = pending.await.unwrap().unwrap();

    assert!(coord.is_closed());
    assert!(!coord.apply(ticket, snapshot));
    assert!(coord.snapshot().rooms.is_empty());
}

#[tokio::test]
async fn waiting_patients_excludes_assigned_and_finished() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    coord.assign(&rid("A"), &pid("p1")).await.unwrap();

    let waiting: Vec<_> = coord
        .waiting_patients()
        .into_iter()
        .map(|p| p.id.clone())
        .collect();
    assert_eq!(waiting, vec![pid("p2")]);
}

#[tokio::test]
async fn occupant_tier_uses_shared_thresholds() {
    let store = ward();
    let mut coord = coordinator(&store).await;
    coord.assign(&rid("A"), &pid("p1")).await.unwrap();
    coord.assign(&rid("B"), &pid("p2")).await.unwrap();

    assert_eq!(coord.occupant_tier(&rid("A")), Some(Tier::High));
    assert_eq!(coord.occupant_tier(&rid("B")), Some(Tier::Low));
    assert_eq!(coord.occupant_tier(&rid("C")), None);
}

#[test]
fn inconsistencies_are_reported() {
    let snapshot = Snapshot::new(
        vec![
            patient("p1", PatientStatus::InProgress, None),
            patient("p2", PatientStatus::InProgress, None),
        ],
        vec![
            room("A", RoomStatus::Occupied, None),
            room("B", RoomStatus::Occupied, Some("p1")),
            room("C", RoomStatus::Occupied, Some("p1")),
            room("D", RoomStatus::Available, Some("p2")),
            room("E", RoomStatus::Occupied, Some("ghost")),
        ],
    );

    let drift = snapshot.inconsistencies();
    assert!(drift.contains(&OccupancyDrift::StatusMismatch {
        room: rid("A"),
        status: RoomStatus::Occupied,
        patient: None,
    }));
    assert!(drift.contains(&OccupancyDrift::StatusMismatch {
        room: rid("D"),
        status: RoomStatus::Available,
        patient: Some(pid("p2")),
    }));
    assert!(drift.contains(&OccupancyDrift::SeveralRooms {
        patient: pid("p1"),
        rooms: vec![rid("B"), rid("C")],
    }));
    assert!(drift.contains(&OccupancyDrift::UnknownOccupant {
        room: rid("E"),
        patient: pid("ghost"),
    }));
    assert_eq!(drift.len(), 4);
}

#[test]
fn consistent_snapshot_has_no_drift() {
    let snapshot = Snapshot::new(
        vec![patient("p1", PatientStatus::InProgress, None)],
        vec![
            room("A", RoomStatus::Occupied, Some("p1")),
            room("B", RoomStatus::Maintenance, None),
        ],
    );
    assert!(snapshot.inconsistencies().is_empty());
}
