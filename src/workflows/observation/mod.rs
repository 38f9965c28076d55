//! COPUS observation scheduling, lifecycle, and scoring.
//!
//! The pure pieces (conflict detection, progression gating, the state
//! machine, aggregation, scoring) operate on already-fetched data; the two
//! service facades wire them to the repository traits. The HTTP router is a
//! thin wrapper over the services.

pub mod aggregate;
pub mod conflict;
pub mod domain;
pub mod lifecycle;
pub mod memory;
pub mod progression;
pub mod protocol;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate, AggregationError, EngagementCounts, RawCounts};
pub use conflict::{first_overlap, has_conflict, ConflictCandidate, ParticipantKind};
pub use domain::{
    Actor, Booking, CompletionHistory, CopusPass, IntervalObservation, ObservationRecord,
    ObservationSchedule, PassCompletion, PersonId, PersonRef, PersonRole, ScheduleId,
    ScheduleRequest, ScheduleStatus, Semester, SessionWindow,
};
pub use lifecycle::{TransitionError, TransitionOp, TransitionRecord};
pub use memory::{
    LoggingAuditSink, MemoryCompletionLedger, MemoryIdentityDirectory, MemoryRecordRepository,
    MemoryScheduleRepository,
};
pub use progression::{can_schedule, GateError, ProgressionRequest};
pub use protocol::{
    EngagementLevel, StudentAction, TeacherAction, SESSION_INTERVALS, STUDENT_ACTION_CATEGORIES,
    TEACHER_ACTION_CATEGORIES,
};
pub use repository::{
    AuditError, AuditSink, CompletionLedger, IdentityDirectory, RecordRepository, RecordStoreError,
    ScheduleRepository, ScheduleStoreError,
};
pub use router::{observation_router, ObservationApi};
pub use scoring::{legacy_breakdown, score, EvaluationResult, LegacyBreakdown, Rating, ScoringError};
pub use service::{
    ConflictError, EvaluationService, ScheduleStatusView, SchedulingError, SchedulingService,
    SubmissionError, SubmissionOutcome,
};
