//! COPUS pass and semester progression gating.

use serde::Serialize;

use super::domain::{CompletionHistory, CopusPass, PersonId, Semester};

/// The slice of a schedule request the gate cares about.
#[derive(Debug, Clone)]
pub struct ProgressionRequest {
    pub faculty_id: PersonId,
    pub semester: Semester,
    pub copus_pass: CopusPass,
}

/// Unmet prerequisite for the requested pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum GateError {
    #[error("COPUS pass {} must be completed before scheduling the next pass", required_pass.number())]
    PreviousPassIncomplete { required_pass: CopusPass },
    #[error("all passes of {} must be completed before scheduling a later semester", required_semester.label())]
    PreviousSemesterIncomplete { required_semester: Semester },
}

/// Decide whether the requested pass and semester are unlockable.
///
/// Pass 1 carries no pass prerequisite. Any pass in a semester after the
/// first additionally requires every earlier semester fully completed for
/// that faculty member. Earlier-semester gaps are reported before same-
/// semester pass gaps so the caller surfaces the oldest unmet prerequisite.
pub fn can_schedule(
    request: &ProgressionRequest,
    history: &CompletionHistory,
) -> Result<(), GateError> {
    for earlier in request.semester.preceding() {
        if !history.semester_complete(earlier) {
            return Err(GateError::PreviousSemesterIncomplete {
                required_semester: earlier,
            });
        }
    }

    if let Some(required) = request.copus_pass.prerequisite() {
        if !history.pass_done(request.semester, required) {
            return Err(GateError::PreviousPassIncomplete {
                required_pass: required,
            });
        }
    }

    Ok(())
}
