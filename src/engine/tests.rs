use super::*;
use crate::config::ShiftPolicy;
use crate::observability::{NoopDiagnostics, RecordingDiagnostics};

/// Minutes → "HH:mm".
fn hm(m: Minutes) -> String {
    crate::time::format_hhmm(m)
}

fn engine() -> Engine {
    Engine::with_diagnostics(EngineConfig::default(), Arc::new(NoopDiagnostics))
}

fn engine_with(config: EngineConfig) -> Engine {
    Engine::with_diagnostics(config, Arc::new(NoopDiagnostics))
}

fn slot_at(id: &str, start: Minutes, status: SlotStatus) -> Slot {
    Slot::new(id, hm(start), hm(start + 15), status, RoomRef::new("r1"), "Morning")
}

/// `n` consecutive 15-minute available slots from 08:00, ids s0..s{n-1}.
fn run(n: usize) -> Vec<Slot> {
    (0..n)
        .map(|i| slot_at(&format!("s{i}"), 480 + 15 * i as Minutes, SlotStatus::Available))
        .collect()
}

fn labels(outcome: &GroupingOutcome) -> Vec<&str> {
    outcome.groups.iter().map(|g| g.display_label.as_str()).collect()
}

// ── Scenarios ────────────────────────────────────────────

#[test]
fn scenario_a_three_overlapping_windows() {
    let outcome = engine().group_slots(&run(5), Some(45.0), Some(15));
    assert_eq!(outcome.stats.required_slot_count, 3);
    assert_eq!(
        labels(&outcome),
        vec!["08:00 - 08:45", "08:15 - 09:00", "08:30 - 09:15"]
    );
    assert!(outcome.groups.iter().all(|g| g.is_available));
    assert!(outcome.groups.iter().all(|g| g.conflict_reason.is_none()));
    assert_eq!(outcome.groups[0].member_slot_ids, vec!["s0", "s1", "s2"]);
    assert_eq!(outcome.groups[0].group_id, "s0-s1-s2");
    assert_eq!(outcome.groups[0].window_start, "08:00");
    assert_eq!(outcome.groups[0].window_end, "08:45");
}

#[test]
fn scenario_b_booked_middle_slot_taints_every_window() {
    let mut slots = run(5);
    slots[2].status = SlotStatus::Booked;
    let outcome = engine().group_slots(&slots, Some(45.0), Some(15));
    assert_eq!(outcome.groups.len(), 3);
    for g in &outcome.groups {
        assert!(!g.is_available);
        assert_eq!(g.conflict_reason, Some(ConflictReason::Booked));
        assert_eq!(g.status_priority, 2);
    }
    assert_eq!(outcome.stats.available, 0);
}

#[test]
fn scenario_c_room_boundary_splits_windows() {
    let mut slots = run(5);
    slots[1].room = RoomRef::new("r2");
    let outcome = engine().group_slots(&slots, Some(45.0), Some(15));
    // Windows [0..3) and [1..4) both contain the r2/r1 boundary.
    assert_eq!(labels(&outcome), vec!["08:30 - 09:15"]);
    assert_eq!(outcome.stats.rejected_room, 2);
    assert!(outcome.groups.iter().all(|g| g.room.id == "r1"));
}

#[test]
fn scenario_d_degenerate_keeps_each_slot() {
    let mut slots = run(5);
    slots[1].status = SlotStatus::Locked;
    slots[3].status = SlotStatus::Booked;
    let outcome = engine().group_slots(&slots, Some(15.0), Some(15));
    assert_eq!(outcome.groups.len(), 5);
    let reasons: Vec<Option<ConflictReason>> =
        outcome.groups.iter().map(|g| g.conflict_reason).collect();
    assert_eq!(
        reasons,
        vec![
            None,
            Some(ConflictReason::Locked),
            None,
            Some(ConflictReason::Booked),
            None
        ]
    );
    assert!(outcome.groups.iter().all(|g| g.member_slot_ids.len() == 1));
}

// ── Duration & granularity edge cases ────────────────────

#[test]
fn missing_duration_is_single_slot() {
    let outcome = engine().group_slots(&run(4), None, None);
    assert_eq!(outcome.stats.required_slot_count, 1);
    assert_eq!(outcome.groups.len(), 4);
}

#[test]
fn negative_duration_is_single_slot() {
    let outcome = engine().group_slots(&run(4), Some(-10.0), None);
    assert_eq!(outcome.groups.len(), 4);
}

#[test]
fn zero_granularity_uses_default() {
    let outcome = engine().group_slots(&run(4), Some(30.0), Some(0));
    assert_eq!(outcome.stats.required_slot_count, 2);
    assert_eq!(outcome.groups.len(), 3);
}

#[test]
fn duration_not_multiple_of_granularity_rounds_up() {
    let outcome = engine().group_slots(&run(4), Some(50.0), Some(15));
    assert_eq!(outcome.stats.required_slot_count, 4);
    assert_eq!(labels(&outcome), vec!["08:00 - 09:00"]);
}

#[test]
fn batch_shorter_than_service_is_empty() {
    let outcome = engine().group_slots(&run(2), Some(60.0), None);
    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.stats.emitted, 0);
}

#[test]
fn empty_batch_is_empty() {
    let outcome = engine().group_slots(&[], Some(45.0), None);
    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.stats.slots_in, 0);
}

#[test]
fn thirty_minute_granularity() {
    let slots: Vec<Slot> = (0..4)
        .map(|i| {
            let start = 540 + 30 * i;
            Slot::new(
                format!("h{i}"),
                hm(start),
                hm(start + 30),
                SlotStatus::Available,
                RoomRef::new("r1"),
                "Morning",
            )
        })
        .collect();
    let outcome = engine().group_slots(&slots, Some(60.0), Some(30));
    assert_eq!(
        labels(&outcome),
        vec!["09:00 - 10:00", "09:30 - 10:30", "10:00 - 11:00"]
    );
}

// ── Room / sub-room boundaries ───────────────────────────

#[test]
fn interleaved_rooms_at_same_times_do_not_mix() {
    // Two rooms with identical times: sorted by start, rooms alternate, so
    // no adjacent pair in the sorted sequence shares a room.
    let mut slots = run(3);
    let mut other = run(3);
    for (i, s) in other.iter_mut().enumerate() {
        s.id = format!("o{i}");
        s.room = RoomRef::new("r2");
    }
    slots.extend(other);
    let outcome = engine().group_slots(&slots, Some(30.0), None);
    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.stats.rejected_room, 5);
}

#[test]
fn sub_room_windows_stay_within_sub_room() {
    let mut slots = run(4);
    for s in &mut slots {
        s.room = RoomRef::with_sub_room("r1", "chair-1");
    }
    slots[3].room = RoomRef::with_sub_room("r1", "chair-2");
    let outcome = engine().group_slots(&slots, Some(30.0), None);
    assert_eq!(labels(&outcome), vec!["08:00 - 08:30", "08:15 - 08:45"]);
    assert_eq!(outcome.stats.rejected_sub_room, 1);
    assert_eq!(outcome.groups[0].room.sub_room_id(), Some("chair-1"));
}

#[test]
fn sub_room_and_bare_room_do_not_pair() {
    let mut slots = run(2);
    slots[1].room = RoomRef::with_sub_room("r1", "chair-1");
    let outcome = engine().group_slots(&slots, Some(30.0), None);
    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.stats.rejected_sub_room, 1);
}

// ── Time continuity ──────────────────────────────────────

#[test]
fn one_minute_rounding_is_tolerated() {
    let slots = vec![
        Slot::new("a", "08:00", "08:14", SlotStatus::Available, RoomRef::new("r1"), "Morning"),
        Slot::new("b", "08:15", "08:30", SlotStatus::Available, RoomRef::new("r1"), "Morning"),
    ];
    let outcome = engine().group_slots(&slots, Some(30.0), None);
    assert_eq!(outcome.groups.len(), 1);
}

#[test]
fn two_minute_gap_breaks_window() {
    let slots = vec![
        Slot::new("a", "08:00", "08:13", SlotStatus::Available, RoomRef::new("r1"), "Morning"),
        Slot::new("b", "08:15", "08:30", SlotStatus::Available, RoomRef::new("r1"), "Morning"),
    ];
    let outcome = engine().group_slots(&slots, Some(30.0), None);
    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.stats.rejected_gap, 1);
}

#[test]
fn configured_tolerance_widens_continuity() {
    let slots = vec![
        Slot::new("a", "08:00", "08:13", SlotStatus::Available, RoomRef::new("r1"), "Morning"),
        Slot::new("b", "08:15", "08:30", SlotStatus::Available, RoomRef::new("r1"), "Morning"),
    ];
    let config = EngineConfig {
        continuity_tolerance_minutes: 2,
        ..EngineConfig::default()
    };
    let outcome = engine_with(config).group_slots(&slots, Some(30.0), None);
    assert_eq!(outcome.groups.len(), 1);
}

#[test]
fn timestamp_slots_group_like_clock_slots() {
    let slots: Vec<Slot> = (0..3)
        .map(|i| {
            let start = 60 + 15 * i;
            Slot::new(
                format!("t{i}"),
                format!("2026-03-02T{}:00.000Z", hm(start)),
                format!("2026-03-02T{}:00.000Z", hm(start + 15)),
                SlotStatus::Available,
                RoomRef::new("r1"),
                "Morning",
            )
        })
        .collect();
    let config = EngineConfig {
        timezone: Some(chrono_tz::Asia::Ho_Chi_Minh),
        ..EngineConfig::default()
    };
    let outcome = engine_with(config).group_slots(&slots, Some(45.0), None);
    assert_eq!(labels(&outcome), vec!["08:00 - 08:45"]);
    assert_eq!(outcome.stats.malformed_times, 0);
}

#[test]
fn local_fields_override_timestamps() {
    let slots: Vec<Slot> = run(2)
        .into_iter()
        .map(|s| {
            let local = (s.start_time.clone(), s.end_time.clone());
            Slot {
                start_time: "garbled".into(),
                end_time: "garbled".into(),
                ..s
            }
            .with_local_times(local.0, local.1)
        })
        .collect();
    let outcome = engine().group_slots(&slots, Some(30.0), None);
    assert_eq!(labels(&outcome), vec!["08:00 - 08:30"]);
    assert_eq!(outcome.stats.malformed_times, 0);
}

// ── Malformed input ──────────────────────────────────────

#[test]
fn malformed_time_is_counted_and_does_not_abort() {
    let diag = Arc::new(RecordingDiagnostics::default());
    let engine = Engine::with_diagnostics(EngineConfig::default(), diag.clone());
    let mut slots = run(5);
    slots[4].start_time = "soon".into();
    let outcome = engine.group_slots(&slots, Some(30.0), None);

    assert_eq!(outcome.stats.malformed_times, 1);
    // s4 reads as 00:00 and sorts first; it cannot join s0 (08:00).
    assert_eq!(
        labels(&outcome),
        vec!["08:00 - 08:30", "08:15 - 08:45", "08:30 - 09:00"]
    );
    assert_eq!(
        *diag.malformed.lock().unwrap(),
        vec![("s4".to_string(), "soon".to_string())]
    );
    let finished = diag.finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0], outcome.stats);
}

// ── Availability ─────────────────────────────────────────

#[test]
fn locked_and_booked_reports_booked() {
    let mut slots = run(3);
    slots[0].status = SlotStatus::Locked;
    slots[2].status = SlotStatus::Booked;
    let outcome = engine().group_slots(&slots, Some(45.0), None);
    assert_eq!(outcome.groups[0].conflict_reason, Some(ConflictReason::Booked));
}

#[test]
fn lock_only_affects_windows_containing_it() {
    let mut slots = run(4);
    slots[0].status = SlotStatus::Locked;
    let outcome = engine().group_slots(&slots, Some(30.0), None);
    let verdicts: Vec<bool> = outcome.groups.iter().map(|g| g.is_available).collect();
    assert_eq!(verdicts, vec![false, true, true]);
    assert_eq!(outcome.groups[0].conflict_reason, Some(ConflictReason::Locked));
    assert_eq!(outcome.stats.available, 2);
}

// ── Shifts ───────────────────────────────────────────────

fn across_noon() -> Vec<Slot> {
    let mut slots: Vec<Slot> = (0..4)
        .map(|i| slot_at(&format!("n{i}"), 690 + 15 * i as Minutes, SlotStatus::Available))
        .collect();
    slots[2].shift_name = "Afternoon".into();
    slots[3].shift_name = "Afternoon".into();
    slots
}

#[test]
fn inherit_policy_takes_first_member_shift() {
    let outcome = engine().group_slots(&across_noon(), Some(30.0), None);
    let shifts: Vec<&str> = outcome.groups.iter().map(|g| g.shift_name.as_str()).collect();
    assert_eq!(shifts, vec!["Morning", "Morning", "Afternoon"]);
}

#[test]
fn strict_policy_drops_straddling_windows() {
    let config = EngineConfig {
        shift_policy: ShiftPolicy::Strict,
        ..EngineConfig::default()
    };
    let outcome = engine_with(config).group_slots(&across_noon(), Some(30.0), None);
    assert_eq!(labels(&outcome), vec!["11:30 - 12:00", "12:00 - 12:30"]);
    assert_eq!(outcome.stats.rejected_shift, 1);
}

#[test]
fn outcome_buckets_by_shift() {
    let outcome = engine().group_slots(&across_noon(), Some(15.0), None);
    let buckets = outcome.by_shift();
    assert_eq!(buckets.shift_names().collect::<Vec<_>>(), vec!["Morning", "Afternoon"]);
    assert_eq!(buckets.get("Morning").unwrap().len(), 2);
    assert_eq!(buckets.get("Afternoon").unwrap().len(), 2);
}

// ── Determinism ──────────────────────────────────────────

#[test]
fn repeated_calls_are_identical() {
    let mut slots = run(6);
    slots[3].status = SlotStatus::Locked;
    let e = engine();
    let a = e.group_slots(&slots, Some(45.0), None);
    let b = e.group_slots(&slots, Some(45.0), None);
    assert_eq!(a, b);
}

// ── Selection check ──────────────────────────────────────

fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn selection_ok() {
    let slots = run(5);
    engine()
        .check_selection(&slots, &ids(&["s1", "s2", "s3"]), Some(45.0), None)
        .unwrap();
}

#[test]
fn selection_wrong_length() {
    let err = engine()
        .check_selection(&run(5), &ids(&["s1", "s2"]), Some(45.0), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::WrongLength { expected: 3, got: 2 }));
}

#[test]
fn selection_unknown_slot() {
    let err = engine()
        .check_selection(&run(5), &ids(&["s1", "zz", "s3"]), Some(45.0), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownSlot(ref id) if id == "zz"));
}

#[test]
fn selection_out_of_order_is_not_contiguous() {
    let err = engine()
        .check_selection(&run(5), &ids(&["s1", "s3", "s2"]), Some(45.0), None)
        .unwrap_err();
    match err {
        EngineError::NotContiguous { slot_id, reason } => {
            assert_eq!(slot_id, "s3");
            assert_eq!(reason, RejectReason::TimeGap);
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn selection_repeating_a_slot_is_rejected() {
    // One-minute slots sit inside the default tolerance, so a slot paired
    // with itself would otherwise pass the gap check.
    let slots: Vec<Slot> = (0..4)
        .map(|i| {
            let start = 480 + i;
            Slot::new(
                format!("m{i}"),
                hm(start),
                hm(start + 1),
                SlotStatus::Available,
                RoomRef::new("r1"),
                "Morning",
            )
        })
        .collect();
    let engine = engine();
    let offered = engine.group_slots(&slots, Some(3.0), Some(1));
    let offered_ids: Vec<&str> = offered.groups.iter().map(|g| g.group_id.as_str()).collect();
    assert_eq!(offered_ids, vec!["m0-m1-m2", "m1-m2-m3"]);

    engine
        .check_selection(&slots, &ids(&["m0", "m1", "m2"]), Some(3.0), Some(1))
        .unwrap();
    let err = engine
        .check_selection(&slots, &ids(&["m0", "m0", "m0"]), Some(3.0), Some(1))
        .unwrap_err();
    assert!(matches!(err, EngineError::RepeatedSlot(ref id) if id == "m0"));

    let err = engine
        .check_selection(&slots, &ids(&["m1", "m2", "m1"]), Some(3.0), Some(1))
        .unwrap_err();
    assert!(matches!(err, EngineError::RepeatedSlot(ref id) if id == "m1"));
}

#[test]
fn selection_conflict_names_most_severe_slot() {
    let mut slots = run(5);
    slots[1].status = SlotStatus::Locked;
    slots[2].status = SlotStatus::Booked;
    let err = engine()
        .check_selection(&slots, &ids(&["s0", "s1", "s2"]), Some(45.0), None)
        .unwrap_err();
    match err {
        EngineError::Conflict { slot_id, reason } => {
            assert_eq!(slot_id, "s2");
            assert_eq!(reason, ConflictReason::Booked);
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn selection_room_mismatch() {
    let mut slots = run(3);
    slots[2].room = RoomRef::new("r2");
    let err = engine()
        .check_selection(&slots, &ids(&["s1", "s2"]), Some(30.0), None)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotContiguous {
            reason: RejectReason::RoomMismatch,
            ..
        }
    ));
}

#[test]
fn every_emitted_available_group_passes_selection() {
    let mut slots = run(8);
    slots[5].status = SlotStatus::Locked;
    let e = engine();
    let outcome = e.group_slots(&slots, Some(45.0), None);
    for g in &outcome.groups {
        let checked = e.check_selection(&slots, &g.member_slot_ids, Some(45.0), None);
        assert_eq!(checked.is_ok(), g.is_available, "group {}", g.group_id);
    }
}

// ── JSON boundary ────────────────────────────────────────

#[test]
fn handle_json_round_trip() {
    let request = GroupingRequest::new(run(3), 30.0);
    let body = serde_json::to_string(&request).unwrap();
    let response = engine().handle_json(&body).unwrap();
    let value: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(value["groups"].as_array().unwrap().len(), 2);
    assert_eq!(value["groups"][0]["displayLabel"], "08:00 - 08:30");
    assert_eq!(value["byShift"]["Morning"].as_array().unwrap().len(), 2);
    assert_eq!(value["stats"]["requiredSlotCount"], 2);
}

#[test]
fn handle_json_rejects_garbage() {
    let err = engine().handle_json(r#"{"slots": 42}"#).unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));
}

// ── Concurrency ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invocations_do_not_interfere() {
    let engine = Arc::new(engine());
    let mut handles = Vec::new();
    for k in 1..=8usize {
        let engine = engine.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let outcome = engine.group_slots(&run(12), Some(15.0 * k as f64), None);
            (k, outcome.groups.len())
        }));
    }
    for h in handles {
        let (k, len) = h.await.unwrap();
        assert_eq!(len, 12 - k + 1);
    }
}
