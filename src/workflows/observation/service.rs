//! Orchestration facades over the pure core.
//!
//! [`SchedulingService`] owns booking creation and status transitions;
//! [`EvaluationService`] owns interval submission and scoring. Both take an
//! explicit [`Actor`] on every call; nothing is read from ambient state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::aggregate::{self, AggregationError};
use super::conflict::{first_overlap, ConflictCandidate, ParticipantKind};
use super::domain::{
    Actor, CopusPass, IntervalObservation, ObservationRecord, ObservationSchedule, PersonId,
    PersonRole, ScheduleId, ScheduleRequest, ScheduleStatus,
};
use super::lifecycle::{self, TransitionOp, TransitionRecord};
use super::progression::{self, GateError, ProgressionRequest};
use super::repository::{
    AuditSink, CompletionLedger, IdentityDirectory, RecordRepository, RecordStoreError,
    ScheduleRepository, ScheduleStoreError,
};
use super::scoring::{self, EvaluationResult, Rating, ScoringError};

static SCHEDULE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_schedule_id() -> ScheduleId {
    let id = SCHEDULE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ScheduleId(format!("sched-{id:06}"))
}

/// An overlapping active booking blocked the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} {} already has a booking overlapping the requested window", participant.label(), person_id.0)]
pub struct ConflictError {
    pub participant: ParticipantKind,
    pub person_id: PersonId,
    pub conflicting_schedule: Option<ScheduleId>,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("schedule window must start before it ends")]
    InvalidWindow,
    #[error("person {} is not registered", person_id.0)]
    UnknownPerson { person_id: PersonId },
    #[error("person {} cannot fill the {} slot of a schedule", person_id.0, slot.label())]
    WrongRole {
        person_id: PersonId,
        slot: ParticipantKind,
    },
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Transition(#[from] lifecycle::TransitionError),
    #[error("schedule {} not found", schedule_id.0)]
    NotFound { schedule_id: ScheduleId },
    #[error(transparent)]
    Store(#[from] ScheduleStoreError),
}

/// Books observations after participant, conflict, and progression
/// validation, and drives approval/start/cancel transitions.
pub struct SchedulingService<S, C, I, A> {
    schedules: Arc<S>,
    completion: Arc<C>,
    identity: Arc<I>,
    audit: Arc<A>,
}

impl<S, C, I, A> SchedulingService<S, C, I, A>
where
    S: ScheduleRepository + 'static,
    C: CompletionLedger + 'static,
    I: IdentityDirectory + 'static,
    A: AuditSink + 'static,
{
    pub fn new(schedules: Arc<S>, completion: Arc<C>, identity: Arc<I>, audit: Arc<A>) -> Self {
        Self {
            schedules,
            completion,
            identity,
            audit,
        }
    }

    /// Validate and persist a new pending schedule.
    ///
    /// Conflicts are checked for the faculty member first, then the
    /// observer, then the progression gate; the first failure wins and
    /// nothing is persisted. The repository re-enforces window uniqueness
    /// on insert, so a racing writer still cannot double-book a slot.
    pub fn request_schedule(
        &self,
        request: ScheduleRequest,
        actor: &Actor,
    ) -> Result<ObservationSchedule, SchedulingError> {
        if !request.window.is_well_formed() {
            return Err(SchedulingError::InvalidWindow);
        }

        self.verify_participant(ParticipantKind::Faculty, &request.faculty_id)?;
        self.verify_participant(ParticipantKind::Observer, &request.observer_id)?;

        for (participant, person_id) in [
            (ParticipantKind::Faculty, &request.faculty_id),
            (ParticipantKind::Observer, &request.observer_id),
        ] {
            let bookings = self.schedules.bookings_for(person_id, request.window.date)?;
            let candidate = ConflictCandidate {
                person_id: person_id.clone(),
                window: request.window,
                exclude_schedule: None,
            };
            if let Some(blocker) = first_overlap(&candidate, &bookings) {
                return Err(ConflictError {
                    participant,
                    person_id: person_id.clone(),
                    conflicting_schedule: Some(blocker.schedule_id.clone()),
                }
                .into());
            }
        }

        let history = self
            .completion
            .history_for(&request.faculty_id, &request.academic_year)?;
        progression::can_schedule(
            &ProgressionRequest {
                faculty_id: request.faculty_id.clone(),
                semester: request.semester,
                copus_pass: request.copus_pass,
            },
            &history,
        )?;

        let schedule = ObservationSchedule::from_request(next_schedule_id(), request);
        let faculty_id = schedule.faculty_id.clone();
        let stored = match self.schedules.insert(schedule) {
            Ok(stored) => stored,
            // A racing writer slipped past the snapshot check; surface the
            // store's uniqueness rejection as the same conflict error.
            Err(ScheduleStoreError::OverlapExists { person_id }) => {
                let participant = if person_id == faculty_id {
                    ParticipantKind::Faculty
                } else {
                    ParticipantKind::Observer
                };
                return Err(ConflictError {
                    participant,
                    person_id,
                    conflicting_schedule: None,
                }
                .into());
            }
            Err(other) => return Err(other.into()),
        };

        info!(
            schedule = %stored.id.0,
            actor = %actor.id.0,
            pass = stored.copus_pass.number(),
            "observation scheduled"
        );
        Ok(stored)
    }

    pub fn approve(
        &self,
        schedule_id: &ScheduleId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ObservationSchedule, SchedulingError> {
        self.apply(schedule_id, TransitionOp::Approve, actor, now)
    }

    pub fn disapprove(
        &self,
        schedule_id: &ScheduleId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ObservationSchedule, SchedulingError> {
        self.apply(schedule_id, TransitionOp::Disapprove, actor, now)
    }

    pub fn start(
        &self,
        schedule_id: &ScheduleId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ObservationSchedule, SchedulingError> {
        self.apply(schedule_id, TransitionOp::Start, actor, now)
    }

    pub fn cancel(
        &self,
        schedule_id: &ScheduleId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ObservationSchedule, SchedulingError> {
        self.apply(schedule_id, TransitionOp::Cancel, actor, now)
    }

    pub fn get(&self, schedule_id: &ScheduleId) -> Result<ObservationSchedule, SchedulingError> {
        self.schedules
            .fetch(schedule_id)?
            .ok_or_else(|| SchedulingError::NotFound {
                schedule_id: schedule_id.clone(),
            })
    }

    /// The faculty slot must hold a faculty member; the observer slot an
    /// observer or coordinator.
    fn verify_participant(
        &self,
        slot: ParticipantKind,
        person_id: &PersonId,
    ) -> Result<(), SchedulingError> {
        let person = self
            .identity
            .resolve(person_id)
            .ok_or_else(|| SchedulingError::UnknownPerson {
                person_id: person_id.clone(),
            })?;

        let fits = match slot {
            ParticipantKind::Faculty => person.role == PersonRole::Faculty,
            ParticipantKind::Observer => {
                matches!(person.role, PersonRole::Observer | PersonRole::Coordinator)
            }
        };
        if !fits {
            return Err(SchedulingError::WrongRole {
                person_id: person_id.clone(),
                slot,
            });
        }
        Ok(())
    }

    fn apply(
        &self,
        schedule_id: &ScheduleId,
        op: TransitionOp,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<ObservationSchedule, SchedulingError> {
        let mut schedule = self.get(schedule_id)?;
        let record = lifecycle::transition(&mut schedule, op, actor, now)?;
        self.schedules.update(schedule.clone())?;
        emit_audit(self.audit.as_ref(), record);
        Ok(schedule)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("schedule {} not found", schedule_id.0)]
    NotFound { schedule_id: ScheduleId },
    #[error("schedule is booked for {}, not the submitted pass", schedule_pass.label())]
    PassMismatch { schedule_pass: CopusPass },
    #[error("intervals can only be saved while the observation is in progress (status '{}')", status.label())]
    NotInProgress { status: ScheduleStatus },
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Transition(#[from] lifecycle::TransitionError),
    #[error("record changed since it was read (expected version {expected}, found {found})")]
    ConcurrentModification { expected: u64, found: u64 },
    #[error(transparent)]
    ScheduleStore(#[from] ScheduleStoreError),
    #[error("record store error: {0}")]
    RecordStore(RecordStoreError),
}

fn map_record_err(err: RecordStoreError) -> SubmissionError {
    match err {
        RecordStoreError::VersionMismatch { expected, found } => {
            SubmissionError::ConcurrentModification { expected, found }
        }
        other => SubmissionError::RecordStore(other),
    }
}

/// What a submission produced.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Intervals were scored; the schedule is completed and the pass flag set.
    Completed {
        schedule: ObservationSchedule,
        record: ObservationRecord,
        evaluation: EvaluationResult,
    },
    /// Nothing to score yet; the record was kept as a draft.
    Draft { record: ObservationRecord },
}

/// Sanitized status view exposed at the API edge.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleStatusView {
    pub schedule_id: ScheduleId,
    pub status: &'static str,
    pub copus_pass: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_percentage: Option<f64>,
}

/// Accepts interval submissions, runs aggregation and scoring, and closes
/// out the owning schedule. One parameterized service covers all three
/// passes; the pass is data, not a code path.
pub struct EvaluationService<S, R, C, A> {
    schedules: Arc<S>,
    records: Arc<R>,
    completion: Arc<C>,
    audit: Arc<A>,
}

impl<S, R, C, A> EvaluationService<S, R, C, A>
where
    S: ScheduleRepository + 'static,
    R: RecordRepository + 'static,
    C: CompletionLedger + 'static,
    A: AuditSink + 'static,
{
    pub fn new(schedules: Arc<S>, records: Arc<R>, completion: Arc<C>, audit: Arc<A>) -> Self {
        Self {
            schedules,
            records,
            completion,
            audit,
        }
    }

    /// Replace the record's intervals and, when there is data, score it and
    /// complete the schedule.
    ///
    /// `expected_version` is the record version the caller last read (0 for
    /// a first save); a stale value fails with `ConcurrentModification` and
    /// changes nothing. An empty submission is saved as a draft and the
    /// schedule stays in progress.
    pub fn submit_observation(
        &self,
        schedule_id: &ScheduleId,
        pass: CopusPass,
        intervals: Vec<IntervalObservation>,
        actor: &Actor,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let schedule = self.fetch_schedule(schedule_id)?;
        ensure_pass_matches(&schedule, pass)?;

        let mut record = self.fetch_or_draft(&schedule, pass)?;
        record.intervals = intervals;

        let counts = aggregate::aggregate(&record.intervals)?;
        if counts.total_intervals == 0 {
            record.finalized = false;
            let saved = self
                .records
                .save(record, expected_version)
                .map_err(map_record_err)?;
            return Ok(SubmissionOutcome::Draft { record: saved });
        }

        // Guard the completion transition before persisting anything, so a
        // schedule that is not in progress rejects the submission wholesale.
        // An already-completed schedule accepts a corrective re-submission:
        // the record and evaluation are replaced, no transition fires.
        let mut completed_schedule = schedule.clone();
        let transition = if schedule.status == ScheduleStatus::Completed {
            None
        } else {
            Some(lifecycle::complete(&mut completed_schedule, actor, now)?)
        };

        let evaluation = scoring::score(counts)?;

        record.finalized = true;
        let saved = self
            .records
            .save(record, expected_version)
            .map_err(map_record_err)?;
        self.records
            .save_evaluation(schedule_id, pass, evaluation.clone())
            .map_err(map_record_err)?;

        if let Some(transition) = transition {
            self.schedules.update(completed_schedule.clone())?;
            self.completion.mark_pass_done(
                &completed_schedule.faculty_id,
                &completed_schedule.academic_year,
                completed_schedule.semester,
                pass,
            )?;
            emit_audit(self.audit.as_ref(), transition);
        }

        info!(
            schedule = %completed_schedule.id.0,
            actor = %actor.id.0,
            pass = pass.number(),
            overall = evaluation.overall_percentage,
            rating = evaluation.rating.label(),
            "observation submitted"
        );

        Ok(SubmissionOutcome::Completed {
            schedule: completed_schedule,
            record: saved,
            evaluation,
        })
    }

    /// Periodic partial save during an in-progress observation. Shares the
    /// replace-intervals path and version check with submission, but never
    /// scores or completes.
    pub fn autosave_observation(
        &self,
        schedule_id: &ScheduleId,
        pass: CopusPass,
        intervals: Vec<IntervalObservation>,
        expected_version: u64,
    ) -> Result<ObservationRecord, SubmissionError> {
        let schedule = self.fetch_schedule(schedule_id)?;
        ensure_pass_matches(&schedule, pass)?;
        if schedule.status != ScheduleStatus::InProgress {
            return Err(SubmissionError::NotInProgress {
                status: schedule.status,
            });
        }

        let mut record = self.fetch_or_draft(&schedule, pass)?;
        record.intervals = intervals;
        aggregate::aggregate(&record.intervals)?;
        record.finalized = false;

        self.records
            .save(record, expected_version)
            .map_err(map_record_err)
    }

    pub fn status(&self, schedule_id: &ScheduleId) -> Result<ScheduleStatusView, SubmissionError> {
        let schedule = self.fetch_schedule(schedule_id)?;
        let evaluation = self
            .records
            .evaluation(schedule_id, schedule.copus_pass)
            .map_err(map_record_err)?;

        Ok(ScheduleStatusView {
            schedule_id: schedule.id.clone(),
            status: schedule.status.label(),
            copus_pass: schedule.copus_pass.number(),
            rating: evaluation.as_ref().map(|e| e.rating),
            overall_percentage: evaluation.as_ref().map(|e| e.overall_percentage),
        })
    }

    fn fetch_schedule(
        &self,
        schedule_id: &ScheduleId,
    ) -> Result<ObservationSchedule, SubmissionError> {
        self.schedules
            .fetch(schedule_id)?
            .ok_or_else(|| SubmissionError::NotFound {
                schedule_id: schedule_id.clone(),
            })
    }

    fn fetch_or_draft(
        &self,
        schedule: &ObservationSchedule,
        pass: CopusPass,
    ) -> Result<ObservationRecord, SubmissionError> {
        let existing = self
            .records
            .fetch(&schedule.id, pass)
            .map_err(map_record_err)?;
        Ok(existing.unwrap_or_else(|| {
            ObservationRecord::draft(schedule.id.clone(), pass, schedule.observer_id.clone())
        }))
    }
}

fn ensure_pass_matches(
    schedule: &ObservationSchedule,
    pass: CopusPass,
) -> Result<(), SubmissionError> {
    if schedule.copus_pass != pass {
        return Err(SubmissionError::PassMismatch {
            schedule_pass: schedule.copus_pass,
        });
    }
    Ok(())
}

fn emit_audit<A: AuditSink + ?Sized>(audit: &A, record: TransitionRecord) {
    if let Err(err) = audit.record_transition(record) {
        warn!(error = %err, "audit sink rejected transition record");
    }
}
