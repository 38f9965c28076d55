use std::collections::BTreeSet;
use std::io::Read;

use crate::workflows::observation::domain::IntervalObservation;
use crate::workflows::observation::protocol::EngagementLevel;

use super::mapping::{column_for, normalize_header, ColumnKind};
use super::SheetImportError;

/// Marks accepted as "checked" on an exported sheet.
fn is_marked(cell: &str) -> bool {
    !matches!(
        cell.trim().to_lowercase().as_str(),
        "" | "0" | "n" | "no" | "false"
    )
}

/// Parse sheet rows into interval observations.
///
/// Every header must resolve to a known column; an unrecognized header is
/// an error rather than silently dropped data. Exactly one engagement
/// column must be marked per row.
pub(crate) fn parse_intervals<R: Read>(
    reader: R,
) -> Result<Vec<IntervalObservation>, SheetImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut columns = Vec::with_capacity(headers.len());
    let mut has_interval_column = false;

    for header in headers.iter() {
        let normalized = normalize_header(header);
        if normalized.is_empty() {
            columns.push(None);
            continue;
        }
        let kind = column_for(&normalized)
            .ok_or_else(|| SheetImportError::UnknownColumn(header.to_string()))?;
        has_interval_column |= kind == ColumnKind::Interval;
        columns.push(Some(kind));
    }

    if !has_interval_column {
        return Err(SheetImportError::MissingIntervalColumn);
    }

    let mut intervals = Vec::new();

    for (row_index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let mut interval_number: Option<u8> = None;
        let mut student_actions = BTreeSet::new();
        let mut teacher_actions = BTreeSet::new();
        let mut engagement_marks: Vec<EngagementLevel> = Vec::new();
        let mut comment: Option<String> = None;

        for (cell, kind) in record.iter().zip(columns.iter()) {
            let Some(kind) = kind else { continue };
            match kind {
                ColumnKind::Interval => {
                    let parsed = cell.trim().parse::<u8>().map_err(|_| {
                        SheetImportError::InvalidIntervalNumber {
                            row: row_index + 1,
                            value: cell.to_string(),
                        }
                    })?;
                    interval_number = Some(parsed);
                }
                ColumnKind::Student(action) if is_marked(cell) => {
                    student_actions.insert(*action);
                }
                ColumnKind::Teacher(action) if is_marked(cell) => {
                    teacher_actions.insert(*action);
                }
                ColumnKind::Engagement(level) if is_marked(cell) => {
                    engagement_marks.push(*level);
                }
                ColumnKind::Comment if !cell.trim().is_empty() => {
                    comment = Some(cell.trim().to_string());
                }
                _ => {}
            }
        }

        let interval_number =
            interval_number.ok_or_else(|| SheetImportError::InvalidIntervalNumber {
                row: row_index + 1,
                value: String::new(),
            })?;

        // Zero or multiple engagement marks are rejected, never coerced.
        let engagement = match engagement_marks.as_slice() {
            [single] => *single,
            _ => {
                return Err(SheetImportError::InvalidEngagement {
                    interval_number,
                    marks: engagement_marks.len(),
                })
            }
        };

        intervals.push(IntervalObservation {
            interval_number,
            student_actions,
            teacher_actions,
            engagement,
            comment,
        });
    }

    Ok(intervals)
}
