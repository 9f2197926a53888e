use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{DateBasis, Distinction, ModalityRecord, ModalityStatus, ModalityType};

/// Allowed values per dimension. An empty set or `None` means "no restriction".
///
/// Year and half are matched against the selection period; a record without a
/// selection date fails any year/half restriction. A grade bound likewise excludes
/// ungraded records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub types: BTreeSet<ModalityType>,
    pub statuses: BTreeSet<ModalityStatus>,
    pub year: Option<i32>,
    pub half: Option<u8>,
    pub director_ids: BTreeSet<u64>,
    pub min_grade: Option<f64>,
    pub max_grade: Option<f64>,
    pub distinctions: BTreeSet<Distinction>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self == &FilterSpec::default()
    }

    pub fn matches(&self, record: &ModalityRecord) -> bool {
        if !self.types.is_empty() && !self.types.contains(&record.modality_type) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&record.status) {
            return false;
        }
        if self.year.is_some() || self.half.is_some() {
            let Some(period) = record.period(DateBasis::Selection) else {
                return false;
            };
            if self.year.is_some_and(|y| y != period.year()) {
                return false;
            }
            if self.half.is_some_and(|h| h != period.half()) {
                return false;
            }
        }
        if !self.director_ids.is_empty()
            && !record
                .director_id
                .is_some_and(|d| self.director_ids.contains(&d))
        {
            return false;
        }
        if self.min_grade.is_some() || self.max_grade.is_some() {
            let Some(grade) = record.final_grade else {
                return false;
            };
            if self.min_grade.is_some_and(|min| grade < min) {
                return false;
            }
            if self.max_grade.is_some_and(|max| grade > max) {
                return false;
            }
        }
        if !self.distinctions.is_empty() {
            let tier = record.distinction.unwrap_or(Distinction::None);
            if !self.distinctions.contains(&tier) {
                return false;
            }
        }
        true
    }
}

/// The records `spec` admits, in input order.
pub fn filter<'a>(records: &'a [ModalityRecord], spec: &FilterSpec) -> Vec<&'a ModalityRecord> {
    records.iter().filter(|r| spec.matches(r)).collect()
}
