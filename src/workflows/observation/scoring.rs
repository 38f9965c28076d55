//! Converts raw counts into bounded percentages and a categorical rating.

use serde::{Deserialize, Serialize};

use super::aggregate::RawCounts;
use super::protocol::{
    StudentAction, TeacherAction, STUDENT_ACTION_CATEGORIES, TEACHER_ACTION_CATEGORIES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("cannot score an observation with no submitted intervals")]
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Great,
    Good,
    NeedsImprovement,
    Unsatisfactory,
}

impl Rating {
    /// Inclusive lower bounds on the overall percentage.
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 72.5 {
            Self::Great
        } else if overall >= 50.0 {
            Self::Good
        } else if overall >= 25.0 {
            Self::NeedsImprovement
        } else {
            Self::Unsatisfactory
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Great => "Great",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
            Self::Unsatisfactory => "Unsatisfactory",
        }
    }
}

/// Computed, derived scoring output; never hand-edited. A re-submission
/// replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub counts: RawCounts,
    pub student_action_percentage: f64,
    pub teacher_action_percentage: f64,
    pub engagement_level_percentage: f64,
    pub overall_percentage: f64,
    pub rating: Rating,
}

fn clamp0to100(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn rounded_percentage(numerator: f64, denominator: f64) -> f64 {
    clamp0to100((100.0 * numerator / denominator).round())
}

/// Score one submission. Fails only when no intervals were submitted.
///
/// All percentages divide by the number of intervals actually submitted,
/// never the nominal session length, so partial observations score
/// consistently with full ones.
pub fn score(counts: RawCounts) -> Result<EvaluationResult, ScoringError> {
    if counts.total_intervals == 0 {
        return Err(ScoringError::InsufficientData);
    }

    let intervals = counts.total_intervals as f64;

    let student_action_percentage = rounded_percentage(
        counts.student_action_total() as f64,
        intervals * STUDENT_ACTION_CATEGORIES as f64,
    );
    let teacher_action_percentage = rounded_percentage(
        counts.teacher_action_total() as f64,
        intervals * TEACHER_ACTION_CATEGORIES as f64,
    );
    let engagement_level_percentage =
        clamp0to100((counts.engagement.points() as f64 / intervals).round());

    let overall_percentage = ((student_action_percentage
        + teacher_action_percentage
        + engagement_level_percentage)
        / 3.0)
        .round();
    let rating = Rating::from_overall(overall_percentage);

    Ok(EvaluationResult {
        counts,
        student_action_percentage,
        teacher_action_percentage,
        engagement_level_percentage,
        overall_percentage,
        rating,
    })
}

/// Display-only sub-metric view kept for parity with older report layouts.
///
/// Computed from the same raw counts as [`score`], but over hand-picked
/// action subsets. The two averages can disagree; the rating always derives
/// from [`EvaluationResult::overall_percentage`], never from this view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBreakdown {
    pub engagement: f64,
    pub facilitation: f64,
    pub interaction: f64,
    pub presentation: f64,
    pub legacy_average: f64,
}

const FACILITATION_CODES: [TeacherAction; 5] = [
    TeacherAction::MovingAndGuiding,
    TeacherAction::AnsweringQuestion,
    TeacherAction::PosingQuestion,
    TeacherAction::FollowUp,
    TeacherAction::OneOnOne,
];

const INTERACTION_CODES: [StudentAction; 5] = [
    StudentAction::GroupWork,
    StudentAction::AnsweringQuestion,
    StudentAction::AskingQuestion,
    StudentAction::WholeClassDiscussion,
    StudentAction::Presenting,
];

const PRESENTATION_CODES: [TeacherAction; 3] = [
    TeacherAction::Lecturing,
    TeacherAction::RealTimeWriting,
    TeacherAction::DemoOrVideo,
];

pub fn legacy_breakdown(counts: &RawCounts) -> Result<LegacyBreakdown, ScoringError> {
    if counts.total_intervals == 0 {
        return Err(ScoringError::InsufficientData);
    }

    let intervals = counts.total_intervals as f64;
    let engagement = clamp0to100((counts.engagement.points() as f64 / intervals).round());

    let subset_sum = |codes: &[TeacherAction]| -> u64 {
        codes
            .iter()
            .map(|code| counts.teacher_actions.get(code).copied().unwrap_or(0) as u64)
            .sum()
    };

    let facilitation = rounded_percentage(
        subset_sum(&FACILITATION_CODES) as f64,
        intervals * FACILITATION_CODES.len() as f64,
    );
    let interaction = rounded_percentage(
        INTERACTION_CODES
            .iter()
            .map(|code| counts.student_actions.get(code).copied().unwrap_or(0) as u64)
            .sum::<u64>() as f64,
        intervals * INTERACTION_CODES.len() as f64,
    );
    let presentation = rounded_percentage(
        subset_sum(&PRESENTATION_CODES) as f64,
        intervals * PRESENTATION_CODES.len() as f64,
    );

    let legacy_average = ((engagement + facilitation + interaction + presentation) / 4.0).round();

    Ok(LegacyBreakdown {
        engagement,
        facilitation,
        interaction,
        presentation,
        legacy_average,
    })
}
