//! Closed COPUS action vocabularies.
//!
//! The percentage denominators in scoring are derived from `ordered().len()`,
//! so adding a code to either vocabulary moves the denominator with it.

use serde::{Deserialize, Serialize};

/// Number of two-minute slices in a full 90-minute session.
pub const SESSION_INTERVALS: u8 = 45;

/// Length of one observation slice in minutes.
pub const INTERVAL_MINUTES: u8 = 2;

/// Student behavior codes marked per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentAction {
    Listening,
    IndividualWork,
    GroupWork,
    AnsweringQuestion,
    AskingQuestion,
    WholeClassDiscussion,
    Presenting,
    TestOrQuiz,
    Waiting,
    Other,
}

impl StudentAction {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Listening,
            Self::IndividualWork,
            Self::GroupWork,
            Self::AnsweringQuestion,
            Self::AskingQuestion,
            Self::WholeClassDiscussion,
            Self::Presenting,
            Self::TestOrQuiz,
            Self::Waiting,
            Self::Other,
        ]
    }

    /// Shorthand used on the paper form and in exported sheets.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Listening => "L",
            Self::IndividualWork => "Ind",
            Self::GroupWork => "Grp",
            Self::AnsweringQuestion => "AnQ",
            Self::AskingQuestion => "SQ",
            Self::WholeClassDiscussion => "WC",
            Self::Presenting => "SP",
            Self::TestOrQuiz => "TQ",
            Self::Waiting => "W",
            Self::Other => "O",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Listening => "Listening to instructor",
            Self::IndividualWork => "Individual thinking or problem solving",
            Self::GroupWork => "Working in groups",
            Self::AnsweringQuestion => "Answering a question",
            Self::AskingQuestion => "Asking a question",
            Self::WholeClassDiscussion => "Whole-class discussion",
            Self::Presenting => "Student presenting",
            Self::TestOrQuiz => "Test or quiz",
            Self::Waiting => "Waiting",
            Self::Other => "Other student activity",
        }
    }
}

/// Instructor behavior codes marked per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherAction {
    Lecturing,
    RealTimeWriting,
    MovingAndGuiding,
    AnsweringQuestion,
    PosingQuestion,
    FollowUp,
    OneOnOne,
    DemoOrVideo,
    Administration,
    Waiting,
    Other,
}

impl TeacherAction {
    pub const fn ordered() -> [Self; 11] {
        [
            Self::Lecturing,
            Self::RealTimeWriting,
            Self::MovingAndGuiding,
            Self::AnsweringQuestion,
            Self::PosingQuestion,
            Self::FollowUp,
            Self::OneOnOne,
            Self::DemoOrVideo,
            Self::Administration,
            Self::Waiting,
            Self::Other,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Lecturing => "Lec",
            Self::RealTimeWriting => "RtW",
            Self::MovingAndGuiding => "MG",
            Self::AnsweringQuestion => "AnQ",
            Self::PosingQuestion => "PQ",
            Self::FollowUp => "FUp",
            Self::OneOnOne => "1o1",
            Self::DemoOrVideo => "DV",
            Self::Administration => "Adm",
            Self::Waiting => "W",
            Self::Other => "O",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Lecturing => "Lecturing",
            Self::RealTimeWriting => "Real-time writing on board or document camera",
            Self::MovingAndGuiding => "Moving through class guiding work",
            Self::AnsweringQuestion => "Answering a student question",
            Self::PosingQuestion => "Posing a non-clicker question",
            Self::FollowUp => "Follow-up on question or activity",
            Self::OneOnOne => "One-on-one discussion with student",
            Self::DemoOrVideo => "Demonstration, video, or simulation",
            Self::Administration => "Administration",
            Self::Waiting => "Waiting",
            Self::Other => "Other instructor activity",
        }
    }
}

/// Engagement rating assigned once per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

impl EngagementLevel {
    pub const fn ordered() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }

    /// Points contributed to the engagement percentage.
    pub const fn points(self) -> u32 {
        match self {
            Self::High => 100,
            Self::Medium => 50,
            Self::Low => 0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Category counts consumed by the scoring denominators.
pub const STUDENT_ACTION_CATEGORIES: usize = StudentAction::ordered().len();
pub const TEACHER_ACTION_CATEGORIES: usize = TeacherAction::ordered().len();
