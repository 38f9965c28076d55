//! CSV interval-sheet import.
//!
//! Observers who code a session on the paper form or a spreadsheet export
//! one row per two-minute interval: one column per action code, three
//! engagement columns, an optional comment. The importer turns such an
//! export into the interval set the evaluation service consumes.

mod mapping;
mod parser;

use std::io::Read;
use std::path::Path;

use crate::workflows::observation::domain::IntervalObservation;

#[derive(Debug, thiserror::Error)]
pub enum SheetImportError {
    #[error("failed to read interval sheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid interval sheet data: {0}")]
    Csv(#[from] csv::Error),
    #[error("sheet column '{0}' does not match any protocol code")]
    UnknownColumn(String),
    #[error("sheet is missing the interval number column")]
    MissingIntervalColumn,
    #[error("row {row} has an invalid interval number '{value}'")]
    InvalidIntervalNumber { row: usize, value: String },
    #[error("interval {interval_number} has {marks} engagement marks; exactly one is required")]
    InvalidEngagement { interval_number: u8, marks: usize },
}

pub struct ObservationSheetImporter;

impl ObservationSheetImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<IntervalObservation>, SheetImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<IntervalObservation>, SheetImportError> {
        parser::parse_intervals(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::mapping::{lookup_for_tests, ColumnKind};
    use super::*;
    use crate::workflows::observation::protocol::{EngagementLevel, StudentAction, TeacherAction};
    use std::io::Cursor;

    const HEADER: &str = "Interval,L,Grp,t:Lec,t:PQ,High,Med,Low,Comments";

    #[test]
    fn mapping_recognizes_codes_labels_and_prefixes() {
        assert_eq!(
            lookup_for_tests("L"),
            Some(ColumnKind::Student(StudentAction::Listening))
        );
        assert_eq!(
            lookup_for_tests("Working in groups"),
            Some(ColumnKind::Student(StudentAction::GroupWork))
        );
        assert_eq!(
            lookup_for_tests("t:Lec"),
            Some(ColumnKind::Teacher(TeacherAction::Lecturing))
        );
        assert_eq!(
            lookup_for_tests("\u{feff}  MED "),
            Some(ColumnKind::Engagement(EngagementLevel::Medium))
        );
        assert_eq!(lookup_for_tests("Random Column"), None);
    }

    #[test]
    fn importer_parses_marked_cells_into_action_sets() {
        let csv = format!("{HEADER}\n1,x,,1,,x,,,students tracking\n2,,x,,x,,x,,\n");
        let intervals =
            ObservationSheetImporter::from_reader(Cursor::new(csv)).expect("sheet parses");

        assert_eq!(intervals.len(), 2);
        assert!(intervals[0].student_actions.contains(&StudentAction::Listening));
        assert!(intervals[0].teacher_actions.contains(&TeacherAction::Lecturing));
        assert_eq!(intervals[0].engagement, EngagementLevel::High);
        assert_eq!(intervals[0].comment.as_deref(), Some("students tracking"));
        assert_eq!(intervals[1].engagement, EngagementLevel::Medium);
        assert!(intervals[1].comment.is_none());
    }

    #[test]
    fn importer_rejects_rows_without_exactly_one_engagement_mark() {
        let none = format!("{HEADER}\n1,x,,,,,,,\n");
        let err = ObservationSheetImporter::from_reader(Cursor::new(none))
            .expect_err("zero marks rejected");
        assert!(matches!(
            err,
            SheetImportError::InvalidEngagement {
                interval_number: 1,
                marks: 0
            }
        ));

        let double = format!("{HEADER}\n1,x,,,,x,x,,\n");
        let err = ObservationSheetImporter::from_reader(Cursor::new(double))
            .expect_err("two marks rejected");
        assert!(matches!(
            err,
            SheetImportError::InvalidEngagement {
                interval_number: 1,
                marks: 2
            }
        ));
    }

    #[test]
    fn importer_rejects_unknown_columns() {
        let csv = "Interval,Mystery,High,Med,Low\n1,x,x,,\n";
        let err = ObservationSheetImporter::from_reader(Cursor::new(csv))
            .expect_err("unknown column rejected");
        assert!(matches!(err, SheetImportError::UnknownColumn(name) if name == "Mystery"));
    }

    #[test]
    fn importer_requires_an_interval_column() {
        let csv = "L,High,Med,Low\nx,x,,\n";
        let err = ObservationSheetImporter::from_reader(Cursor::new(csv))
            .expect_err("missing interval column rejected");
        assert!(matches!(err, SheetImportError::MissingIntervalColumn));
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        let err = ObservationSheetImporter::from_path("./does-not-exist.csv")
            .expect_err("expected io error");
        assert!(matches!(err, SheetImportError::Io(_)));
    }
}
