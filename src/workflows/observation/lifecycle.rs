//! Schedule state machine.
//!
//! States: pending -> {approved, disapproved}; approved -> {in_progress,
//! cancelled}; in_progress -> {completed, cancelled}. Disapproved, cancelled,
//! and completed are terminal. Transitions mutate nothing when the guard
//! rejects, and every successful transition yields a [`TransitionRecord`]
//! for the audit collaborator.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Actor, ObservationSchedule, PersonId, PersonRole, ScheduleId, ScheduleStatus};

/// The operation names double as audit vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOp {
    Approve,
    Disapprove,
    Start,
    Complete,
    Cancel,
}

impl TransitionOp {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Disapprove => "disapprove",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {} a schedule in state '{}'", operation.label(), from.label())]
    InvalidTransition {
        from: ScheduleStatus,
        operation: TransitionOp,
    },
}

/// Emitted after each successful transition; consumed fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub schedule_id: ScheduleId,
    pub from: ScheduleStatus,
    pub to: ScheduleStatus,
    pub actor_id: PersonId,
    pub actor_role: PersonRole,
    pub occurred_at: DateTime<Utc>,
}

/// Target state for an operation, or `None` when the guard rejects.
///
/// `start` normally requires an approved schedule; a role carrying the
/// bypass capability may start straight from pending. That is a capability
/// scoped exception, not a relaxation of the guard for everyone else.
fn target_state(from: ScheduleStatus, op: TransitionOp, actor_role: PersonRole) -> Option<ScheduleStatus> {
    match (op, from) {
        (TransitionOp::Approve, ScheduleStatus::Pending) => Some(ScheduleStatus::Approved),
        (TransitionOp::Disapprove, ScheduleStatus::Pending) => Some(ScheduleStatus::Disapproved),
        (TransitionOp::Start, ScheduleStatus::Approved) => Some(ScheduleStatus::InProgress),
        (TransitionOp::Start, ScheduleStatus::Pending) if actor_role.may_bypass_approval() => {
            Some(ScheduleStatus::InProgress)
        }
        (TransitionOp::Complete, ScheduleStatus::InProgress) => Some(ScheduleStatus::Completed),
        (TransitionOp::Cancel, ScheduleStatus::Approved | ScheduleStatus::InProgress) => {
            Some(ScheduleStatus::Cancelled)
        }
        _ => None,
    }
}

/// Apply one operation to a schedule, all-or-nothing.
pub fn transition(
    schedule: &mut ObservationSchedule,
    op: TransitionOp,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<TransitionRecord, TransitionError> {
    let from = schedule.status;
    let to = target_state(from, op, actor.role).ok_or(TransitionError::InvalidTransition {
        from,
        operation: op,
    })?;

    schedule.status = to;

    Ok(TransitionRecord {
        schedule_id: schedule.id.clone(),
        from,
        to,
        actor_id: actor.id.clone(),
        actor_role: actor.role,
        occurred_at: now,
    })
}

pub fn approve(
    schedule: &mut ObservationSchedule,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<TransitionRecord, TransitionError> {
    transition(schedule, TransitionOp::Approve, actor, now)
}

pub fn disapprove(
    schedule: &mut ObservationSchedule,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<TransitionRecord, TransitionError> {
    transition(schedule, TransitionOp::Disapprove, actor, now)
}

pub fn start(
    schedule: &mut ObservationSchedule,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<TransitionRecord, TransitionError> {
    transition(schedule, TransitionOp::Start, actor, now)
}

pub fn complete(
    schedule: &mut ObservationSchedule,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<TransitionRecord, TransitionError> {
    transition(schedule, TransitionOp::Complete, actor, now)
}

pub fn cancel(
    schedule: &mut ObservationSchedule,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<TransitionRecord, TransitionError> {
    transition(schedule, TransitionOp::Cancel, actor, now)
}
