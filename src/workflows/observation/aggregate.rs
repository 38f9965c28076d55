//! Folds an ordered interval sequence into raw action and engagement counts.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::IntervalObservation;
use super::protocol::{EngagementLevel, StudentAction, TeacherAction, SESSION_INTERVALS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    #[error("interval {interval_number} appears more than once in the submission")]
    DuplicateInterval { interval_number: u8 },
    #[error("interval {interval_number} is outside the protocol range 1..={SESSION_INTERVALS}")]
    IntervalOutOfRange { interval_number: u8 },
}

/// Engagement tallies; the three buckets partition the submitted intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl EngagementCounts {
    fn tally(&mut self, level: EngagementLevel) {
        match level {
            EngagementLevel::High => self.high += 1,
            EngagementLevel::Medium => self.medium += 1,
            EngagementLevel::Low => self.low += 1,
        }
    }

    pub const fn total(self) -> u32 {
        self.high + self.medium + self.low
    }

    /// Weighted points per the protocol (High 100, Medium 50, Low 0).
    pub const fn points(self) -> u64 {
        self.high as u64 * EngagementLevel::High.points() as u64
            + self.medium as u64 * EngagementLevel::Medium.points() as u64
            + self.low as u64 * EngagementLevel::Low.points() as u64
    }
}

/// Deterministic fold of one submission; input to the scoring engine.
///
/// Both count maps carry an entry for every code in the vocabulary, observed
/// or not, so serialized results are stable across submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCounts {
    pub student_actions: BTreeMap<StudentAction, u32>,
    pub teacher_actions: BTreeMap<TeacherAction, u32>,
    pub engagement: EngagementCounts,
    pub total_intervals: u32,
}

impl RawCounts {
    pub fn empty() -> Self {
        Self {
            student_actions: StudentAction::ordered().into_iter().map(|a| (a, 0)).collect(),
            teacher_actions: TeacherAction::ordered().into_iter().map(|a| (a, 0)).collect(),
            engagement: EngagementCounts::default(),
            total_intervals: 0,
        }
    }

    pub fn student_action_total(&self) -> u64 {
        self.student_actions.values().map(|c| *c as u64).sum()
    }

    pub fn teacher_action_total(&self) -> u64 {
        self.teacher_actions.values().map(|c| *c as u64).sum()
    }
}

/// Count action flags and engagement levels across the submitted intervals.
///
/// Partial submissions (fewer than the full session) are fine;
/// `total_intervals` reflects what was actually submitted. Duplicate or
/// out-of-range interval numbers are rejected rather than coerced.
pub fn aggregate(intervals: &[IntervalObservation]) -> Result<RawCounts, AggregationError> {
    let mut counts = RawCounts::empty();
    let mut seen: BTreeSet<u8> = BTreeSet::new();

    for interval in intervals {
        if !interval.in_protocol_range() {
            return Err(AggregationError::IntervalOutOfRange {
                interval_number: interval.interval_number,
            });
        }
        if !seen.insert(interval.interval_number) {
            return Err(AggregationError::DuplicateInterval {
                interval_number: interval.interval_number,
            });
        }

        for action in &interval.student_actions {
            *counts.student_actions.entry(*action).or_insert(0) += 1;
        }
        for action in &interval.teacher_actions {
            *counts.teacher_actions.entry(*action).or_insert(0) += 1;
        }
        counts.engagement.tally(interval.engagement);
        counts.total_intervals += 1;
    }

    Ok(counts)
}
