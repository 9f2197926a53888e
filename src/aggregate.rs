use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    CountShare, DateBasis, Distinction, ModalityRecord, ModalityStatus, ModalityType, PeriodAggregate,
};
use crate::period::{walk_back, AcademicPeriod};
use crate::stats;

/// The records sharing one grouping key, with the statistics callers read off them.
///
/// Every accessor is total: an empty group yields zero counts and 0.0 rates.
#[derive(Debug, Clone, Default)]
pub struct GroupStats<'a> {
    records: Vec<&'a ModalityRecord>,
}

impl<'a> GroupStats<'a> {
    pub fn new(records: Vec<&'a ModalityRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[&'a ModalityRecord] {
        &self.records
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unique_student_count(&self) -> usize {
        self.records
            .iter()
            .flat_map(|r| r.student_ids.iter())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn count_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&ModalityRecord) -> bool,
    {
        self.records.iter().filter(|r| predicate(**r)).count()
    }

    /// Share of the group matching `predicate`, in percent.
    pub fn rate_of<P>(&self, predicate: P) -> f64
    where
        P: Fn(&ModalityRecord) -> bool,
    {
        stats::percentage(self.count_where(predicate), self.count())
    }

    /// The present values of `field`, in record order.
    pub fn values<F>(&self, field: F) -> Vec<f64>
    where
        F: Fn(&ModalityRecord) -> Option<f64>,
    {
        self.records.iter().filter_map(|r| field(*r)).collect()
    }

    pub fn sum<F>(&self, field: F) -> f64
    where
        F: Fn(&ModalityRecord) -> Option<f64>,
    {
        self.values(field).iter().sum()
    }

    pub fn average<F>(&self, field: F) -> f64
    where
        F: Fn(&ModalityRecord) -> Option<f64>,
    {
        stats::mean(&self.values(field))
    }

    pub fn median<F>(&self, field: F) -> f64
    where
        F: Fn(&ModalityRecord) -> Option<f64>,
    {
        stats::median(&self.values(field))
    }

    pub fn std_dev<F>(&self, field: F) -> f64
    where
        F: Fn(&ModalityRecord) -> Option<f64>,
    {
        stats::std_dev(&self.values(field))
    }

    pub fn min<F>(&self, field: F) -> Option<f64>
    where
        F: Fn(&ModalityRecord) -> Option<f64>,
    {
        self.values(field).into_iter().reduce(f64::min)
    }

    pub fn max<F>(&self, field: F) -> Option<f64>
    where
        F: Fn(&ModalityRecord) -> Option<f64>,
    {
        self.values(field).into_iter().reduce(f64::max)
    }

    pub fn completed(&self) -> usize {
        self.count_where(|r| r.status.is_completed())
    }

    pub fn failed(&self) -> usize {
        self.count_where(|r| r.status.is_failed())
    }

    /// completed / (completed + failed)
    pub fn success_rate(&self) -> f64 {
        let completed = self.completed();
        stats::percentage(completed, completed + self.failed())
    }
}

/// Buckets `records` by `key_fn`. A `None` key leaves the record out of this grouping
/// only; empty input yields an empty map.
pub fn aggregate<'a, I, K, F>(records: I, key_fn: F) -> BTreeMap<K, GroupStats<'a>>
where
    I: IntoIterator<Item = &'a ModalityRecord>,
    K: Ord,
    F: Fn(&ModalityRecord) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&'a ModalityRecord>> = BTreeMap::new();
    for record in records {
        if let Some(key) = key_fn(record) {
            groups.entry(key).or_default().push(record);
        }
    }
    groups
        .into_iter()
        .map(|(key, records)| (key, GroupStats::new(records)))
        .collect()
}

pub fn by_type(record: &ModalityRecord) -> Option<ModalityType> {
    Some(record.modality_type)
}

pub fn by_status(record: &ModalityRecord) -> Option<ModalityStatus> {
    Some(record.status)
}

pub fn by_director(record: &ModalityRecord) -> Option<u64> {
    record.director_id
}

/// Completed records only; a completed record without a distinction is in the
/// `none` tier.
pub fn by_distinction(record: &ModalityRecord) -> Option<Distinction> {
    record
        .status
        .is_completed()
        .then(|| record.distinction.unwrap_or(Distinction::None))
}

pub fn by_period(basis: DateBasis) -> impl Fn(&ModalityRecord) -> Option<AcademicPeriod> {
    move |record| record.period(basis)
}

pub fn final_grade(record: &ModalityRecord) -> Option<f64> {
    record.final_grade
}

pub fn duration_days(record: &ModalityRecord) -> Option<f64> {
    record.duration_days()
}

impl PeriodAggregate {
    pub fn from_stats(period: AcademicPeriod, group: &GroupStats<'_>) -> Self {
        Self {
            period,
            label: period.label(),
            count: group.count(),
            completed: group.completed(),
            failed: group.failed(),
            active: group.count_where(|r| r.status.is_active()),
            unique_students: group.unique_student_count(),
            honors: group.count_where(ModalityRecord::has_honor),
            completion_rate: group.rate_of(|r| r.status.is_completed()),
            success_rate: group.success_rate(),
            average_grade: group.average(final_grade),
        }
    }

    pub fn empty(period: AcademicPeriod) -> Self {
        Self::from_stats(period, &GroupStats::default())
    }
}

/// `periods` aggregates walking back from `current`, newest first. Periods without
/// records appear with zero counts so the sequence has no gaps.
pub fn period_history<'a, I>(
    records: I,
    current: AcademicPeriod,
    periods: usize,
    basis: DateBasis,
) -> Vec<PeriodAggregate>
where
    I: IntoIterator<Item = &'a ModalityRecord>,
{
    let groups = aggregate(records, by_period(basis));
    walk_back(current, periods)
        .into_iter()
        .map(|period| match groups.get(&period) {
            Some(group) => PeriodAggregate::from_stats(period, group),
            None => PeriodAggregate::empty(period),
        })
        .collect()
}

/// Group sizes as shares of `total`, largest first, ties in key order.
pub fn breakdown<K: Clone + Ord>(groups: &BTreeMap<K, GroupStats<'_>>, total: usize) -> Vec<CountShare<K>> {
    let counts = groups.iter().map(|(key, group)| (key.clone(), group.count()));
    shares(counts, total)
}

/// Occurrences of each key as shares of the number of keys seen.
pub fn tally<K, I>(keys: I) -> Vec<CountShare<K>>
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    let mut total = 0;
    for key in keys {
        *counts.entry(key).or_default() += 1;
        total += 1;
    }
    shares(counts, total)
}

fn shares<K: Ord, I: IntoIterator<Item = (K, usize)>>(counts: I, total: usize) -> Vec<CountShare<K>> {
    let mut shares: Vec<CountShare<K>> = counts
        .into_iter()
        .map(|(key, count)| CountShare {
            key,
            count,
            percentage: stats::percentage(count, total),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    shares
}
