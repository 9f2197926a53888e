use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::warn;

use crate::error::NormalizationError;
use crate::models::{Distinction, ModalityRecord, ModalityStatus, ModalityType};

/// Wire shape of a modality as exported by the tracker: every column optional text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawModalityRecord {
    pub id: Option<String>,
    #[serde(alias = "type")]
    pub modality_type: Option<String>,
    pub status: Option<String>,
    pub selection_date: Option<String>,
    pub last_update: Option<String>,
    pub completion_date: Option<String>,
    pub final_grade: Option<String>,
    pub distinction: Option<String>,
    pub director_id: Option<String>,
    /// `;` or `,` separated.
    pub student_ids: Option<String>,
    pub academic_program_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<ModalityRecord>,
    /// Zero-based input position of each rejected row.
    pub rejected: Vec<(usize, NormalizationError)>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, NormalizationError> {
    present(value).ok_or(NormalizationError::MissingField { field })
}

fn parse_id(value: &str, field: &'static str) -> Result<u64, NormalizationError> {
    value.parse().map_err(|_| NormalizationError::Malformed {
        field,
        value: value.to_string(),
    })
}

fn optional_id(value: &Option<String>, field: &'static str) -> Result<Option<u64>, NormalizationError> {
    present(value).map(|v| parse_id(v, field)).transpose()
}

/// Offsets are dropped, keeping the wall-clock time the tracker recorded, so a
/// late-evening timestamp stays in its own academic half.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn optional_timestamp(
    value: &Option<String>,
    field: &'static str,
) -> Result<Option<NaiveDateTime>, NormalizationError> {
    present(value)
        .map(|v| {
            parse_timestamp(v).ok_or_else(|| NormalizationError::Malformed {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}

fn optional_grade(value: &Option<String>) -> Result<Option<f64>, NormalizationError> {
    present(value)
        .map(|v| {
            v.replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|g| g.is_finite())
                .ok_or_else(|| NormalizationError::Malformed {
                    field: "final_grade",
                    value: v.to_string(),
                })
        })
        .transpose()
}

fn student_set(value: &Option<String>) -> Result<BTreeSet<u64>, NormalizationError> {
    let Some(list) = present(value) else {
        return Ok(BTreeSet::new());
    };
    list.split([';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_id(s, "student_ids"))
        .collect()
}

/// Maps a raw row onto the canonical record shape.
///
/// Only `id`, `type`, `status` and `academic_program_id` are mandatory. Every other field falls back to `None`
/// or an empty set when blank, but a value that is present and unparseable is rejected.
pub fn normalize(raw: &RawModalityRecord) -> Result<ModalityRecord, NormalizationError> {
    let id = parse_id(required(&raw.id, "id")?, "id")?;
    let modality_type: ModalityType = required(&raw.modality_type, "type")?.parse()?;
    let status: ModalityStatus = required(&raw.status, "status")?.parse()?;

    let selection_date = optional_timestamp(&raw.selection_date, "selection_date")?;
    let completion_date = optional_timestamp(&raw.completion_date, "completion_date")?;
    if let (Some(start), Some(end)) = (selection_date, completion_date) {
        if end < start {
            return Err(NormalizationError::CompletionBeforeSelection { id });
        }
    }

    let distinction = present(&raw.distinction)
        .map(str::parse::<Distinction>)
        .transpose()?;

    Ok(ModalityRecord {
        id,
        modality_type,
        status,
        selection_date,
        last_update: optional_timestamp(&raw.last_update, "last_update")?,
        completion_date,
        final_grade: optional_grade(&raw.final_grade)?,
        distinction,
        director_id: optional_id(&raw.director_id, "director_id")?,
        student_ids: student_set(&raw.student_ids)?,
        academic_program_id: parse_id(
            required(&raw.academic_program_id, "academic_program_id")?,
            "academic_program_id",
        )?,
    })
}

/// Normalizes every row, collecting failures instead of stopping at the first one.
pub fn normalize_all<'a, I>(raws: I) -> NormalizedBatch
where
    I: IntoIterator<Item = &'a RawModalityRecord>,
{
    let mut batch = NormalizedBatch::default();
    for (index, raw) in raws.into_iter().enumerate() {
        match normalize(raw) {
            Ok(record) => batch.records.push(record),
            Err(err) => {
                warn!(row = index, error = %err, "skipping malformed modality record");
                batch.rejected.push((index, err));
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseEnumError;
    use crate::models::DateBasis;

    fn raw() -> RawModalityRecord {
        RawModalityRecord {
            id: Some("42".into()),
            modality_type: Some("internship".into()),
            status: Some("GRADED_APPROVED".into()),
            selection_date: Some("2024-02-10".into()),
            last_update: Some("2024-09-01 08:15:00".into()),
            completion_date: Some("2024-09-01T08:15:00Z".into()),
            final_grade: Some("4,5".into()),
            distinction: Some("meritorious".into()),
            director_id: Some("9".into()),
            student_ids: Some("1001; 1002".into()),
            academic_program_id: Some("3".into()),
        }
    }

    #[test]
    fn normalizes_full_row() {
        let record = normalize(&raw()).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.modality_type, ModalityType::Internship);
        assert_eq!(record.status, ModalityStatus::GradedApproved);
        assert_eq!(record.final_grade, Some(4.5));
        assert_eq!(record.distinction, Some(Distinction::Meritorious));
        assert_eq!(record.director_id, Some(9));
        assert!(record.is_group());
        assert_eq!(record.academic_program_id, 3);
        assert_eq!(record.completion_date, record.last_update);
    }

    #[test]
    fn optional_fields_default_when_blank() {
        let row = RawModalityRecord {
            id: Some("1".into()),
            modality_type: Some("seminar".into()),
            status: Some("selected".into()),
            director_id: Some("   ".into()),
            academic_program_id: Some("3".into()),
            ..Default::default()
        };
        let record = normalize(&row).unwrap();
        assert_eq!(record.director_id, None);
        assert!(record.student_ids.is_empty());
        assert_eq!(record.selection_date, None);
        assert_eq!(record.distinction, None);
    }

    #[test]
    fn missing_mandatory_fields_fail() {
        let mut row = raw();
        row.status = None;
        assert_eq!(
            normalize(&row),
            Err(NormalizationError::MissingField { field: "status" })
        );
        let mut row = raw();
        row.id = Some("".into());
        assert_eq!(
            normalize(&row),
            Err(NormalizationError::MissingField { field: "id" })
        );
    }

    #[test]
    fn rows_without_a_program_are_rejected() {
        let mut row = raw();
        row.academic_program_id = None;
        assert_eq!(
            normalize(&row),
            Err(NormalizationError::MissingField {
                field: "academic_program_id"
            })
        );
        let batch = normalize_all(&[row]);
        assert!(batch.records.is_empty());
        assert_eq!(batch.rejected.len(), 1);
    }

    #[test]
    fn offset_timestamps_keep_their_wall_clock_date() {
        let mut row = raw();
        row.selection_date = Some("2024-01-15T09:00:00+01:00".into());
        row.completion_date = Some("2024-06-30T22:00:00-05:00".into());
        let record = normalize(&row).unwrap();
        let completed = record.completion_date.unwrap();
        assert_eq!(completed.date(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(record.period(DateBasis::Completion).unwrap().half(), 1);
    }

    #[test]
    fn malformed_values_fail() {
        let mut row = raw();
        row.modality_type = Some("hackathon".into());
        assert_eq!(
            normalize(&row),
            Err(NormalizationError::UnknownLiteral(ParseEnumError::new(
                "modality type",
                "hackathon"
            )))
        );

        let mut row = raw();
        row.selection_date = Some("10/02/2024".into());
        assert!(matches!(
            normalize(&row),
            Err(NormalizationError::Malformed { field: "selection_date", .. })
        ));
    }

    #[test]
    fn completion_before_selection_fails() {
        let mut row = raw();
        row.completion_date = Some("2023-12-31".into());
        assert_eq!(
            normalize(&row),
            Err(NormalizationError::CompletionBeforeSelection { id: 42 })
        );
    }

    #[test]
    fn batch_keeps_good_rows() {
        let mut bad = raw();
        bad.id = None;
        let rows = vec![raw(), bad, raw()];
        let batch = normalize_all(&rows);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].0, 1);
    }
}
