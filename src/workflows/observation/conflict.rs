//! Time-slot conflict detection.
//!
//! A pure predicate over already-fetched bookings; persistence enforces the
//! same person+window uniqueness as the final safety net.

use serde::Serialize;

use super::domain::{Booking, PersonId, ScheduleId, SessionWindow};

/// Which participant of a schedule request collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    Faculty,
    Observer,
}

impl ParticipantKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Faculty => "faculty",
            Self::Observer => "observer",
        }
    }
}

/// Candidate slot for one participant of a schedule request.
#[derive(Debug, Clone)]
pub struct ConflictCandidate {
    pub person_id: PersonId,
    pub window: SessionWindow,
    /// Present when revalidating an update, so the schedule is not compared
    /// against itself.
    pub exclude_schedule: Option<ScheduleId>,
}

/// True when any active booking overlaps the candidate window.
///
/// Cancelled and disapproved bookings never occupy a slot, and touching
/// endpoints (`end == start`) do not conflict.
pub fn has_conflict(candidate: &ConflictCandidate, existing: &[Booking]) -> bool {
    first_overlap(candidate, existing).is_some()
}

/// The first overlapping booking, if any, for error payloads.
pub fn first_overlap<'a>(
    candidate: &ConflictCandidate,
    existing: &'a [Booking],
) -> Option<&'a Booking> {
    existing.iter().find(|booking| {
        booking.status.is_active()
            && candidate.exclude_schedule.as_ref() != Some(&booking.schedule_id)
            && booking.window.overlaps(&candidate.window)
    })
}
