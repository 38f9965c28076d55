//! Header-name resolution for exported interval sheets.

use crate::workflows::observation::protocol::{EngagementLevel, StudentAction, TeacherAction};

/// What a sheet column feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Interval,
    Student(StudentAction),
    Teacher(TeacherAction),
    Engagement(EngagementLevel),
    Comment,
}

/// Lowercase, collapse runs of whitespace, strip a leading BOM.
pub(crate) fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolve a normalized header to a column kind.
///
/// Action columns match either the shorthand code or the full label from
/// the protocol vocabularies; sheets exported from different templates use
/// one or the other.
pub(crate) fn column_for(normalized: &str) -> Option<ColumnKind> {
    match normalized {
        "interval" | "interval number" | "#" | "min" => return Some(ColumnKind::Interval),
        "comment" | "comments" | "notes" => return Some(ColumnKind::Comment),
        "high" => return Some(ColumnKind::Engagement(EngagementLevel::High)),
        "med" | "medium" => return Some(ColumnKind::Engagement(EngagementLevel::Medium)),
        "low" => return Some(ColumnKind::Engagement(EngagementLevel::Low)),
        _ => {}
    }

    // Student columns take priority on code clashes and are disambiguated
    // by the "s:"/"t:" prefixes some templates emit.
    if let Some(rest) = normalized.strip_prefix("s:") {
        return student_for(rest.trim()).map(ColumnKind::Student);
    }
    if let Some(rest) = normalized.strip_prefix("t:") {
        return teacher_for(rest.trim()).map(ColumnKind::Teacher);
    }

    if let Some(action) = student_for(normalized) {
        return Some(ColumnKind::Student(action));
    }
    if let Some(action) = teacher_for(normalized) {
        return Some(ColumnKind::Teacher(action));
    }

    None
}

fn student_for(normalized: &str) -> Option<StudentAction> {
    StudentAction::ordered().into_iter().find(|action| {
        normalized == action.code().to_lowercase() || normalized == action.label().to_lowercase()
    })
}

fn teacher_for(normalized: &str) -> Option<TeacherAction> {
    TeacherAction::ordered().into_iter().find(|action| {
        normalized == action.code().to_lowercase() || normalized == action.label().to_lowercase()
    })
}

#[cfg(test)]
pub(crate) fn lookup_for_tests(raw: &str) -> Option<ColumnKind> {
    column_for(&normalize_header(raw))
}
