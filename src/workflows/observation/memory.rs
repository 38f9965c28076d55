//! In-memory collaborator implementations.
//!
//! Back the demo server and the test suites; a deployment swaps these for
//! database-backed adapters behind the same traits.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::info;

use super::domain::{
    Booking, CompletionHistory, CopusPass, ObservationRecord, ObservationSchedule, PersonId,
    PersonRef, ScheduleId, Semester,
};
use super::lifecycle::TransitionRecord;
use super::repository::{
    AuditError, AuditSink, CompletionLedger, IdentityDirectory, RecordRepository,
    RecordStoreError, ScheduleRepository, ScheduleStoreError,
};
use super::scoring::EvaluationResult;

#[derive(Default)]
pub struct MemoryScheduleRepository {
    schedules: Mutex<HashMap<ScheduleId, ObservationSchedule>>,
}

impl MemoryScheduleRepository {
    fn overlapping_person(
        schedules: &HashMap<ScheduleId, ObservationSchedule>,
        candidate: &ObservationSchedule,
    ) -> Option<PersonId> {
        for person_id in [&candidate.faculty_id, &candidate.observer_id] {
            let clash = schedules.values().any(|existing| {
                existing.id != candidate.id
                    && existing.status.is_active()
                    && (existing.faculty_id == *person_id || existing.observer_id == *person_id)
                    && existing.window.overlaps(&candidate.window)
            });
            if clash {
                return Some(person_id.clone());
            }
        }
        None
    }
}

impl ScheduleRepository for MemoryScheduleRepository {
    fn insert(
        &self,
        schedule: ObservationSchedule,
    ) -> Result<ObservationSchedule, ScheduleStoreError> {
        let mut guard = self.schedules.lock().expect("schedule store mutex poisoned");
        if guard.contains_key(&schedule.id) {
            return Err(ScheduleStoreError::Duplicate);
        }
        // Uniqueness backstop: the conflict check upstream reads a snapshot,
        // so the store re-verifies the window before committing.
        if let Some(person_id) = Self::overlapping_person(&guard, &schedule) {
            return Err(ScheduleStoreError::OverlapExists { person_id });
        }
        guard.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule)
    }

    fn update(&self, schedule: ObservationSchedule) -> Result<(), ScheduleStoreError> {
        let mut guard = self.schedules.lock().expect("schedule store mutex poisoned");
        if !guard.contains_key(&schedule.id) {
            return Err(ScheduleStoreError::NotFound);
        }
        guard.insert(schedule.id.clone(), schedule);
        Ok(())
    }

    fn fetch(&self, id: &ScheduleId) -> Result<Option<ObservationSchedule>, ScheduleStoreError> {
        let guard = self.schedules.lock().expect("schedule store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn bookings_for(
        &self,
        person_id: &PersonId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, ScheduleStoreError> {
        let guard = self.schedules.lock().expect("schedule store mutex poisoned");
        Ok(guard
            .values()
            .filter(|schedule| {
                schedule.window.date == date
                    && (schedule.faculty_id == *person_id || schedule.observer_id == *person_id)
            })
            .map(ObservationSchedule::booking)
            .collect())
    }
}

type RecordKey = (ScheduleId, CopusPass);

#[derive(Default)]
pub struct MemoryRecordRepository {
    records: Mutex<HashMap<RecordKey, ObservationRecord>>,
    evaluations: Mutex<HashMap<RecordKey, EvaluationResult>>,
}

impl RecordRepository for MemoryRecordRepository {
    fn fetch(
        &self,
        schedule_id: &ScheduleId,
        pass: CopusPass,
    ) -> Result<Option<ObservationRecord>, RecordStoreError> {
        let guard = self.records.lock().expect("record store mutex poisoned");
        Ok(guard.get(&(schedule_id.clone(), pass)).cloned())
    }

    fn save(
        &self,
        mut record: ObservationRecord,
        expected_version: u64,
    ) -> Result<ObservationRecord, RecordStoreError> {
        let mut guard = self.records.lock().expect("record store mutex poisoned");
        let key = (record.schedule_id.clone(), record.copus_pass);
        let current = guard.get(&key).map(|existing| existing.version).unwrap_or(0);
        if current != expected_version {
            return Err(RecordStoreError::VersionMismatch {
                expected: expected_version,
                found: current,
            });
        }
        record.version = current + 1;
        guard.insert(key, record.clone());
        Ok(record)
    }

    fn save_evaluation(
        &self,
        schedule_id: &ScheduleId,
        pass: CopusPass,
        result: EvaluationResult,
    ) -> Result<(), RecordStoreError> {
        let mut guard = self.evaluations.lock().expect("evaluation store mutex poisoned");
        guard.insert((schedule_id.clone(), pass), result);
        Ok(())
    }

    fn evaluation(
        &self,
        schedule_id: &ScheduleId,
        pass: CopusPass,
    ) -> Result<Option<EvaluationResult>, RecordStoreError> {
        let guard = self.evaluations.lock().expect("evaluation store mutex poisoned");
        Ok(guard.get(&(schedule_id.clone(), pass)).cloned())
    }
}

#[derive(Default)]
pub struct MemoryCompletionLedger {
    entries: Mutex<HashMap<(PersonId, String), CompletionHistory>>,
}

impl MemoryCompletionLedger {
    /// Test/demo seeding helper.
    pub fn seed(&self, faculty_id: PersonId, academic_year: &str, history: CompletionHistory) {
        let mut guard = self.entries.lock().expect("completion ledger mutex poisoned");
        guard.insert((faculty_id, academic_year.to_string()), history);
    }
}

impl CompletionLedger for MemoryCompletionLedger {
    fn history_for(
        &self,
        faculty_id: &PersonId,
        academic_year: &str,
    ) -> Result<CompletionHistory, ScheduleStoreError> {
        let guard = self.entries.lock().expect("completion ledger mutex poisoned");
        Ok(guard
            .get(&(faculty_id.clone(), academic_year.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn mark_pass_done(
        &self,
        faculty_id: &PersonId,
        academic_year: &str,
        semester: Semester,
        pass: CopusPass,
    ) -> Result<(), ScheduleStoreError> {
        let mut guard = self.entries.lock().expect("completion ledger mutex poisoned");
        guard
            .entry((faculty_id.clone(), academic_year.to_string()))
            .or_default()
            .mark_done(semester, pass);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryIdentityDirectory {
    people: Mutex<HashMap<PersonId, PersonRef>>,
}

impl MemoryIdentityDirectory {
    pub fn seed(&self, person: PersonRef) {
        let mut guard = self.people.lock().expect("identity mutex poisoned");
        guard.insert(person.id.clone(), person);
    }
}

impl IdentityDirectory for MemoryIdentityDirectory {
    fn resolve(&self, id: &PersonId) -> Option<PersonRef> {
        let guard = self.people.lock().expect("identity mutex poisoned");
        guard.get(id).cloned()
    }
}

/// Audit trail that just logs; real deployments point this at the audit
/// collaborator.
#[derive(Default)]
pub struct LoggingAuditSink;

impl AuditSink for LoggingAuditSink {
    fn record_transition(&self, record: TransitionRecord) -> Result<(), AuditError> {
        info!(
            schedule = %record.schedule_id.0,
            from = record.from.label(),
            to = record.to.label(),
            actor = %record.actor_id.0,
            role = record.actor_role.label(),
            "schedule transition"
        );
        Ok(())
    }
}
