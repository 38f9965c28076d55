use super::common::{booking, observer_id, window};
use crate::workflows::observation::conflict::{first_overlap, has_conflict, ConflictCandidate};
use crate::workflows::observation::domain::{Booking, ScheduleId, ScheduleStatus};

fn candidate(start_hour: u32, end_hour: u32) -> ConflictCandidate {
    ConflictCandidate {
        person_id: observer_id(),
        window: window(start_hour, end_hour),
        exclude_schedule: None,
    }
}

fn candidate_from(booking: &Booking) -> ConflictCandidate {
    ConflictCandidate {
        person_id: observer_id(),
        window: booking.window,
        exclude_schedule: None,
    }
}

#[test]
fn overlapping_windows_conflict() {
    let existing = vec![booking("sched-b", 9, 11, ScheduleStatus::Approved)];
    assert!(has_conflict(&candidate(8, 10), &existing));
}

#[test]
fn touching_endpoints_do_not_conflict() {
    let existing = vec![booking("sched-b", 10, 12, ScheduleStatus::Approved)];
    assert!(!has_conflict(&candidate(8, 10), &existing));
}

#[test]
fn containment_conflicts() {
    let existing = vec![booking("sched-b", 8, 12, ScheduleStatus::Pending)];
    assert!(has_conflict(&candidate(9, 10), &existing));
}

#[test]
fn overlap_is_symmetric() {
    let pairs = [(8u32, 10u32, 9u32, 11u32), (8, 10, 10, 12), (9, 10, 8, 12), (8, 9, 11, 12)];
    for (a_start, a_end, b_start, b_end) in pairs {
        let a = booking("sched-a", a_start, a_end, ScheduleStatus::Approved);
        let b = booking("sched-b", b_start, b_end, ScheduleStatus::Approved);
        assert_eq!(
            has_conflict(&candidate_from(&a), &[b.clone()]),
            has_conflict(&candidate_from(&b), &[a.clone()]),
            "symmetry violated for [{a_start},{a_end}) vs [{b_start},{b_end})"
        );
    }
}

#[test]
fn cancelled_and_disapproved_bookings_never_occupy_a_slot() {
    let existing = vec![
        booking("sched-b", 8, 10, ScheduleStatus::Cancelled),
        booking("sched-c", 9, 11, ScheduleStatus::Disapproved),
    ];
    assert!(!has_conflict(&candidate(8, 10), &existing));
}

#[test]
fn update_excludes_own_schedule() {
    let existing = vec![booking("sched-self", 8, 10, ScheduleStatus::Approved)];
    let mut update = candidate(8, 10);
    update.exclude_schedule = Some(ScheduleId("sched-self".to_string()));
    assert!(!has_conflict(&update, &existing));

    update.exclude_schedule = Some(ScheduleId("sched-other".to_string()));
    assert!(has_conflict(&update, &existing));
}

#[test]
fn different_dates_do_not_conflict() {
    let mut other_day = booking("sched-b", 8, 10, ScheduleStatus::Approved);
    other_day.window.date = other_day.window.date.succ_opt().expect("valid date");
    assert!(!has_conflict(&candidate(8, 10), &[other_day]));
}

#[test]
fn first_overlap_reports_the_blocking_booking() {
    let existing = vec![
        booking("sched-free", 6, 7, ScheduleStatus::Approved),
        booking("sched-busy", 9, 11, ScheduleStatus::InProgress),
    ];
    let blocker = first_overlap(&candidate(8, 10), &existing).expect("overlap found");
    assert_eq!(blocker.schedule_id.0, "sched-busy");
}
