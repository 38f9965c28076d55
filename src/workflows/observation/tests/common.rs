use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::workflows::observation::domain::{
    Actor, Booking, CopusPass, IntervalObservation, ObservationSchedule, PersonId, PersonRef,
    PersonRole, ScheduleId, ScheduleRequest, ScheduleStatus, Semester, SessionWindow,
};
use crate::workflows::observation::lifecycle::TransitionRecord;
use crate::workflows::observation::memory::{
    MemoryCompletionLedger, MemoryIdentityDirectory, MemoryRecordRepository,
    MemoryScheduleRepository,
};
use crate::workflows::observation::protocol::{EngagementLevel, StudentAction, TeacherAction};
use crate::workflows::observation::repository::{AuditError, AuditSink};
use crate::workflows::observation::service::{EvaluationService, SchedulingService};

pub(super) fn observation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date")
}

pub(super) fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn window(start_hour: u32, end_hour: u32) -> SessionWindow {
    SessionWindow {
        date: observation_date(),
        start: at(start_hour, 0),
        end: at(end_hour, 0),
    }
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn faculty_id() -> PersonId {
    PersonId("fac-101".to_string())
}

pub(super) fn observer_id() -> PersonId {
    PersonId("obs-301".to_string())
}

pub(super) fn observer_actor() -> Actor {
    Actor {
        id: observer_id(),
        role: PersonRole::Observer,
    }
}

pub(super) fn coordinator_actor() -> Actor {
    Actor {
        id: PersonId("coord-001".to_string()),
        role: PersonRole::Coordinator,
    }
}

pub(super) fn booking(id: &str, start_hour: u32, end_hour: u32, status: ScheduleStatus) -> Booking {
    Booking {
        schedule_id: ScheduleId(id.to_string()),
        window: window(start_hour, end_hour),
        status,
    }
}

pub(super) fn schedule_request(pass: CopusPass, semester: Semester) -> ScheduleRequest {
    ScheduleRequest {
        faculty_id: faculty_id(),
        observer_id: observer_id(),
        copus_pass: pass,
        semester,
        academic_year: "2025-2026".to_string(),
        window: window(8, 10),
        subject_name: "General Chemistry".to_string(),
        subject_type: "Lecture".to_string(),
        room: "SCI-204".to_string(),
    }
}

pub(super) fn pending_schedule(id: &str) -> ObservationSchedule {
    ObservationSchedule::from_request(
        ScheduleId(id.to_string()),
        schedule_request(CopusPass::First, Semester::First),
    )
}

pub(super) fn schedule_in(id: &str, status: ScheduleStatus) -> ObservationSchedule {
    let mut schedule = pending_schedule(id);
    schedule.status = status;
    schedule
}

pub(super) fn interval(number: u8, engagement: EngagementLevel) -> IntervalObservation {
    IntervalObservation {
        interval_number: number,
        student_actions: BTreeSet::new(),
        teacher_actions: BTreeSet::new(),
        engagement,
        comment: None,
    }
}

pub(super) fn interval_with_actions(
    number: u8,
    students: &[StudentAction],
    teachers: &[TeacherAction],
    engagement: EngagementLevel,
) -> IntervalObservation {
    IntervalObservation {
        interval_number: number,
        student_actions: students.iter().copied().collect(),
        teacher_actions: teachers.iter().copied().collect(),
        engagement,
        comment: None,
    }
}

/// 45 intervals with no actions marked: 20 High, 15 Medium, 10 Low.
pub(super) fn engagement_only_session() -> Vec<IntervalObservation> {
    (1..=45u8)
        .map(|n| {
            let engagement = if n <= 20 {
                EngagementLevel::High
            } else if n <= 35 {
                EngagementLevel::Medium
            } else {
                EngagementLevel::Low
            };
            interval(n, engagement)
        })
        .collect()
}

#[derive(Default)]
pub(super) struct RecordingAudit {
    events: Mutex<Vec<TransitionRecord>>,
}

impl RecordingAudit {
    pub(super) fn events(&self) -> Vec<TransitionRecord> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for RecordingAudit {
    fn record_transition(&self, record: TransitionRecord) -> Result<(), AuditError> {
        self.events
            .lock()
            .expect("audit mutex poisoned")
            .push(record);
        Ok(())
    }
}

/// Always fails, to prove audit problems never block a transition.
pub(super) struct FailingAudit;

impl AuditSink for FailingAudit {
    fn record_transition(&self, _record: TransitionRecord) -> Result<(), AuditError> {
        Err(AuditError::Transport("audit queue offline".to_string()))
    }
}

/// Register the people the fixtures reference.
pub(super) fn seed_roster(identity: &MemoryIdentityDirectory) {
    let roster = [
        ("fac-101", PersonRole::Faculty, "Chemistry"),
        ("fac-202", PersonRole::Faculty, "Biology"),
        ("obs-301", PersonRole::Observer, "Center for Teaching"),
        ("coord-001", PersonRole::Coordinator, "Center for Teaching"),
    ];
    for (id, role, department) in roster {
        identity.seed(PersonRef {
            id: PersonId(id.to_string()),
            name: id.to_string(),
            role,
            department: department.to_string(),
        });
    }
}

pub(super) struct TestHarness {
    pub(super) scheduling: SchedulingService<
        MemoryScheduleRepository,
        MemoryCompletionLedger,
        MemoryIdentityDirectory,
        RecordingAudit,
    >,
    pub(super) evaluation: EvaluationService<
        MemoryScheduleRepository,
        MemoryRecordRepository,
        MemoryCompletionLedger,
        RecordingAudit,
    >,
    pub(super) schedules: Arc<MemoryScheduleRepository>,
    pub(super) records: Arc<MemoryRecordRepository>,
    pub(super) completion: Arc<MemoryCompletionLedger>,
    pub(super) identity: Arc<MemoryIdentityDirectory>,
    pub(super) audit: Arc<RecordingAudit>,
}

pub(super) fn harness() -> TestHarness {
    let schedules = Arc::new(MemoryScheduleRepository::default());
    let records = Arc::new(MemoryRecordRepository::default());
    let completion = Arc::new(MemoryCompletionLedger::default());
    let identity = Arc::new(MemoryIdentityDirectory::default());
    let audit = Arc::new(RecordingAudit::default());

    seed_roster(&identity);

    TestHarness {
        scheduling: SchedulingService::new(
            schedules.clone(),
            completion.clone(),
            identity.clone(),
            audit.clone(),
        ),
        evaluation: EvaluationService::new(
            schedules.clone(),
            records.clone(),
            completion.clone(),
            audit.clone(),
        ),
        schedules,
        records,
        completion,
        identity,
        audit,
    }
}
