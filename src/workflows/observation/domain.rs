use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::protocol::{EngagementLevel, StudentAction, TeacherAction, SESSION_INTERVALS};

/// Identifier wrapper for people (faculty and observers alike).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub String);

/// Identifier wrapper for observation schedules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Faculty,
    Observer,
    Coordinator,
}

impl PersonRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Faculty => "Faculty",
            Self::Observer => "Observer",
            Self::Coordinator => "Observation Coordinator",
        }
    }

    /// Coordinators may start an observation that was never approved.
    pub const fn may_bypass_approval(self) -> bool {
        matches!(self, Self::Coordinator)
    }
}

/// Read-only reference data resolved by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: PersonId,
    pub name: String,
    pub role: PersonRole,
    pub department: String,
}

/// The party performing a service call; always threaded in explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: PersonId,
    pub role: PersonRole,
}

/// One of the three sequential observation passes per faculty per semester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopusPass {
    First,
    Second,
    Third,
}

impl CopusPass {
    pub const fn ordered() -> [Self; 3] {
        [Self::First, Self::Second, Self::Third]
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            _ => None,
        }
    }

    /// The pass that must be completed before this one may be scheduled.
    pub const fn prerequisite(self) -> Option<Self> {
        match self {
            Self::First => None,
            Self::Second => Some(Self::First),
            Self::Third => Some(Self::Second),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "COPUS 1",
            Self::Second => "COPUS 2",
            Self::Third => "COPUS 3",
        }
    }
}

/// Semester tokens carry a fixed total order; progression rules iterate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub const fn ordered() -> [Self; 2] {
        [Self::First, Self::Second]
    }

    /// Semesters strictly before this one in scheduling order.
    pub fn preceding(self) -> impl Iterator<Item = Semester> {
        Self::ordered().into_iter().take_while(move |s| *s < self)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "1st Semester",
            Self::Second => "2nd Semester",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Approved,
    Disapproved,
    InProgress,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Disapproved => "disapproved",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Disapproved)
    }

    /// Active schedules are the only ones that occupy a time slot.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled | Self::Disapproved)
    }
}

/// A same-day wall-clock window, half-open over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &SessionWindow) -> bool {
        self.date == other.date && self.start < other.end && self.end > other.start
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }
}

/// What a schedule looks like to the conflict checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub schedule_id: ScheduleId,
    pub window: SessionWindow,
    pub status: ScheduleStatus,
}

/// Inbound request to book one observation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub faculty_id: PersonId,
    pub observer_id: PersonId,
    pub copus_pass: CopusPass,
    pub semester: Semester,
    pub academic_year: String,
    pub window: SessionWindow,
    pub subject_name: String,
    pub subject_type: String,
    pub room: String,
}

/// One observation booking for one (faculty, observer, pass) combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSchedule {
    pub id: ScheduleId,
    pub faculty_id: PersonId,
    pub observer_id: PersonId,
    pub copus_pass: CopusPass,
    pub semester: Semester,
    pub academic_year: String,
    pub window: SessionWindow,
    pub subject_name: String,
    pub subject_type: String,
    pub room: String,
    pub status: ScheduleStatus,
}

impl ObservationSchedule {
    pub fn from_request(id: ScheduleId, request: ScheduleRequest) -> Self {
        Self {
            id,
            faculty_id: request.faculty_id,
            observer_id: request.observer_id,
            copus_pass: request.copus_pass,
            semester: request.semester,
            academic_year: request.academic_year,
            window: request.window,
            subject_name: request.subject_name,
            subject_type: request.subject_type,
            room: request.room,
            status: ScheduleStatus::Pending,
        }
    }

    pub fn booking(&self) -> Booking {
        Booking {
            schedule_id: self.id.clone(),
            window: self.window,
            status: self.status,
        }
    }
}

/// One two-minute slice of an observation pass.
///
/// The engagement level is a single enum value, so an interval can never
/// carry zero or multiple engagement flags once it reaches the core; raw
/// checkbox input is validated at the sheet boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalObservation {
    pub interval_number: u8,
    pub student_actions: BTreeSet<StudentAction>,
    pub teacher_actions: BTreeSet<TeacherAction>,
    pub engagement: EngagementLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl IntervalObservation {
    pub fn in_protocol_range(&self) -> bool {
        (1..=SESSION_INTERVALS).contains(&self.interval_number)
    }
}

/// The full interval set for one (schedule, pass); at most one exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub schedule_id: ScheduleId,
    pub copus_pass: CopusPass,
    pub observer_id: PersonId,
    pub intervals: Vec<IntervalObservation>,
    pub finalized: bool,
    /// Bumped by the repository on every successful save.
    pub version: u64,
}

impl ObservationRecord {
    pub fn draft(schedule_id: ScheduleId, copus_pass: CopusPass, observer_id: PersonId) -> Self {
        Self {
            schedule_id,
            copus_pass,
            observer_id,
            intervals: Vec::new(),
            finalized: false,
            version: 0,
        }
    }
}

/// Per-semester completion flags for one faculty member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassCompletion {
    pub copus1_done: bool,
    pub copus2_done: bool,
    pub copus3_done: bool,
}

impl PassCompletion {
    pub const fn pass_done(self, pass: CopusPass) -> bool {
        match pass {
            CopusPass::First => self.copus1_done,
            CopusPass::Second => self.copus2_done,
            CopusPass::Third => self.copus3_done,
        }
    }

    pub fn mark_done(&mut self, pass: CopusPass) {
        match pass {
            CopusPass::First => self.copus1_done = true,
            CopusPass::Second => self.copus2_done = true,
            CopusPass::Third => self.copus3_done = true,
        }
    }

    pub const fn all_done(self) -> bool {
        self.copus1_done && self.copus2_done && self.copus3_done
    }
}

/// Snapshot of completed passes consumed by the progression gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionHistory {
    completed: BTreeMap<Semester, PassCompletion>,
}

impl CompletionHistory {
    pub fn pass_done(&self, semester: Semester, pass: CopusPass) -> bool {
        self.completed
            .get(&semester)
            .map(|c| c.pass_done(pass))
            .unwrap_or(false)
    }

    pub fn semester_complete(&self, semester: Semester) -> bool {
        self.completed
            .get(&semester)
            .map(|c| c.all_done())
            .unwrap_or(false)
    }

    pub fn mark_done(&mut self, semester: Semester, pass: CopusPass) {
        self.completed.entry(semester).or_default().mark_done(pass);
    }
}
