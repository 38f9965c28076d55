//! Storage, audit, and identity abstractions so the services can be
//! exercised in isolation.

use chrono::NaiveDate;

use super::domain::{
    Booking, CompletionHistory, CopusPass, ObservationRecord, ObservationSchedule, PersonId,
    PersonRef, ScheduleId, Semester,
};
use super::lifecycle::TransitionRecord;
use super::scoring::EvaluationResult;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleStoreError {
    #[error("schedule already exists")]
    Duplicate,
    #[error("schedule not found")]
    NotFound,
    #[error("an overlapping active schedule already exists for person {}", person_id.0)]
    OverlapExists { person_id: PersonId },
    #[error("schedule store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("observation record not found")]
    NotFound,
    #[error("record changed since it was read (expected version {expected}, found {found})")]
    VersionMismatch { expected: u64, found: u64 },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Schedule persistence.
///
/// `insert` is the last line of defense against double-booking: it must
/// reject a schedule whose window overlaps an active booking for either
/// participant, even if the conflict check raced another writer.
pub trait ScheduleRepository: Send + Sync {
    fn insert(&self, schedule: ObservationSchedule)
        -> Result<ObservationSchedule, ScheduleStoreError>;
    fn update(&self, schedule: ObservationSchedule) -> Result<(), ScheduleStoreError>;
    fn fetch(&self, id: &ScheduleId) -> Result<Option<ObservationSchedule>, ScheduleStoreError>;
    fn bookings_for(
        &self,
        person_id: &PersonId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, ScheduleStoreError>;
}

/// Interval-record persistence with optimistic versioning.
pub trait RecordRepository: Send + Sync {
    fn fetch(
        &self,
        schedule_id: &ScheduleId,
        pass: CopusPass,
    ) -> Result<Option<ObservationRecord>, RecordStoreError>;
    /// Compare-and-swap: fails with `VersionMismatch` unless the stored
    /// version equals `expected_version`; bumps the version on success.
    fn save(
        &self,
        record: ObservationRecord,
        expected_version: u64,
    ) -> Result<ObservationRecord, RecordStoreError>;
    fn save_evaluation(
        &self,
        schedule_id: &ScheduleId,
        pass: CopusPass,
        result: EvaluationResult,
    ) -> Result<(), RecordStoreError>;
    fn evaluation(
        &self,
        schedule_id: &ScheduleId,
        pass: CopusPass,
    ) -> Result<Option<EvaluationResult>, RecordStoreError>;
}

/// Completion flags per (faculty, academic year, semester); written only by
/// the evaluation service on successful submission.
pub trait CompletionLedger: Send + Sync {
    fn history_for(
        &self,
        faculty_id: &PersonId,
        academic_year: &str,
    ) -> Result<CompletionHistory, ScheduleStoreError>;
    fn mark_pass_done(
        &self,
        faculty_id: &PersonId,
        academic_year: &str,
        semester: Semester,
        pass: CopusPass,
    ) -> Result<(), ScheduleStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}

/// Fire-and-forget transition trail; failures never block a transition.
pub trait AuditSink: Send + Sync {
    fn record_transition(&self, record: TransitionRecord) -> Result<(), AuditError>;
}

/// Read-only person lookup owned by the identity collaborator.
pub trait IdentityDirectory: Send + Sync {
    fn resolve(&self, id: &PersonId) -> Option<PersonRef>;
}
