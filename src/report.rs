//! Per-report composition of the analyzers.
//!
//! Each builder selects the records in scope, then runs aggregate, classify, trend,
//! compare and project in that order and assembles the shape the renderer binds to.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{
    aggregate, breakdown, by_director, by_distinction, by_status, by_type, duration_days, final_grade,
    period_history, tally, GroupStats,
};
use crate::classify::{classify, SUCCESS_VERDICT, WORKLOAD_LEVEL};
use crate::compare::{compare, period_comparisons};
use crate::config::EngineConfig;
use crate::error::ParseEnumError;
use crate::filter::{filter, FilterSpec};
use crate::models::{
    ComparisonResult, CountShare, DateBasis, Distinction, ModalityRecord, ModalityStatus, ModalityType,
    PerformanceSummary, PerformanceVerdict, PeriodAggregate, PeriodComparisons, Projection, TrendResult,
    WorkloadLevel,
};
use crate::period::{period_of, AcademicPeriod};
use crate::stats::{self, serialize_rounded, serialize_rounded_opt};
use crate::{performance, projection, trend};

/// Whose records a report covers and the date it is computed as of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportScope {
    pub program_id: u64,
    pub as_of: NaiveDate,
}

impl ReportScope {
    pub fn current_period(&self) -> AcademicPeriod {
        period_of(&self.as_of)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub scope: ReportScope,
    pub filter: FilterSpec,
}

impl ReportRequest {
    pub fn new(scope: ReportScope) -> Self {
        Self {
            scope,
            filter: FilterSpec::default(),
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    /// The records of the scoped program that pass the filter.
    fn select<'a>(&self, records: &'a [ModalityRecord]) -> Vec<&'a ModalityRecord> {
        let mut selected = filter(records, &self.filter);
        selected.retain(|r| r.academic_program_id == self.scope.program_id);
        selected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    GlobalSummary,
    CompletedAnalysis,
    DirectorWorkload,
    TypeComparison,
    HistoricalAnalysis,
    StudentListing,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::GlobalSummary => "global_summary",
            ReportKind::CompletedAnalysis => "completed_analysis",
            ReportKind::DirectorWorkload => "director_workload",
            ReportKind::TypeComparison => "type_comparison",
            ReportKind::HistoricalAnalysis => "historical_analysis",
            ReportKind::StudentListing => "student_listing",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "global_summary" | "global" => Ok(ReportKind::GlobalSummary),
            "completed_analysis" | "completed" => Ok(ReportKind::CompletedAnalysis),
            "director_workload" | "directors" => Ok(ReportKind::DirectorWorkload),
            "type_comparison" | "types" => Ok(ReportKind::TypeComparison),
            "historical_analysis" | "historical" => Ok(ReportKind::HistoricalAnalysis),
            "student_listing" | "students" => Ok(ReportKind::StudentListing),
            _ => Err(ParseEnumError::new("report kind", s)),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    GlobalSummary(GlobalSummaryReport),
    CompletedAnalysis(CompletedAnalysisReport),
    DirectorWorkload(DirectorWorkloadReport),
    TypeComparison(TypeComparisonReport),
    HistoricalAnalysis(HistoricalAnalysisReport),
    StudentListing(StudentListingReport),
}

pub fn build_report(
    kind: ReportKind,
    records: &[ModalityRecord],
    request: &ReportRequest,
    config: &EngineConfig,
) -> Report {
    match kind {
        ReportKind::GlobalSummary => Report::GlobalSummary(global_summary(records, request, config)),
        ReportKind::CompletedAnalysis => {
            Report::CompletedAnalysis(completed_analysis(records, request, config))
        }
        ReportKind::DirectorWorkload => Report::DirectorWorkload(director_workload(records, request)),
        ReportKind::TypeComparison => Report::TypeComparison(type_comparison(records, request, config)),
        ReportKind::HistoricalAnalysis => {
            Report::HistoricalAnalysis(historical_analysis(records, request, config))
        }
        ReportKind::StudentListing => Report::StudentListing(student_listing(records, request)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub modality_type: ModalityType,
    pub count: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub percentage: f64,
    pub completed: usize,
    pub unique_students: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub completion_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub success_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub average_grade: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub median_grade: f64,
    pub verdict: PerformanceVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalSummaryReport {
    pub program_id: u64,
    pub period: String,
    pub total_modalities: usize,
    pub active_modalities: usize,
    pub unique_students: usize,
    pub group_modalities: usize,
    pub unassigned_director: usize,
    pub by_status: Vec<CountShare<ModalityStatus>>,
    pub by_type: Vec<TypeSummary>,
    pub history: Vec<PeriodAggregate>,
    pub performance: PerformanceSummary,
    pub trend: TrendResult,
    pub comparisons: PeriodComparisons,
    pub projection: Projection,
}

pub fn global_summary(
    records: &[ModalityRecord],
    request: &ReportRequest,
    config: &EngineConfig,
) -> GlobalSummaryReport {
    let selected = request.select(records);
    let current = request.scope.current_period();
    debug!(
        program = request.scope.program_id,
        records = selected.len(),
        period = %current,
        "building global summary"
    );

    let all = GroupStats::new(selected.clone());
    let by_type_groups = aggregate(selected.iter().copied(), by_type);
    let by_status_groups = aggregate(selected.iter().copied(), by_status);

    let mut by_type_summary: Vec<TypeSummary> = by_type_groups
        .iter()
        .map(|(modality_type, group)| type_summary(*modality_type, group, all.count()))
        .collect();
    by_type_summary.sort_by(|a, b| b.count.cmp(&a.count).then(a.modality_type.cmp(&b.modality_type)));

    let history = period_history(
        selected.iter().copied(),
        current,
        config.summary_periods,
        DateBasis::Selection,
    );
    let table = config.summary_trend.table();

    GlobalSummaryReport {
        program_id: request.scope.program_id,
        period: current.label(),
        total_modalities: all.count(),
        active_modalities: all.count_where(|r| r.status.is_active()),
        unique_students: all.unique_student_count(),
        group_modalities: all.count_where(ModalityRecord::is_group),
        unassigned_director: all.count_where(|r| r.director_id.is_none()),
        by_status: breakdown(&by_status_groups, all.count()),
        by_type: by_type_summary,
        performance: performance::analyze(selected.iter().copied()),
        trend: trend::analyze(&history, table),
        comparisons: period_comparisons(&history),
        projection: projection::project(&history, table),
        history,
    }
}

fn type_summary(modality_type: ModalityType, group: &GroupStats<'_>, total: usize) -> TypeSummary {
    let completion_rate = group.rate_of(|r| r.status.is_completed());
    TypeSummary {
        modality_type,
        count: group.count(),
        percentage: stats::percentage(group.count(), total),
        completed: group.completed(),
        unique_students: group.unique_student_count(),
        completion_rate,
        success_rate: group.success_rate(),
        average_grade: group.average(final_grade),
        median_grade: group.median(final_grade),
        verdict: classify(completion_rate, &SUCCESS_VERDICT),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeStats {
    pub graded: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub average: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub median: f64,
    #[serde(serialize_with = "serialize_rounded_opt")]
    pub min: Option<f64>,
    #[serde(serialize_with = "serialize_rounded_opt")]
    pub max: Option<f64>,
    #[serde(serialize_with = "serialize_rounded")]
    pub std_dev: f64,
}

impl GradeStats {
    fn of(group: &GroupStats<'_>) -> Self {
        Self {
            graded: group.values(final_grade).len(),
            average: group.average(final_grade),
            median: group.median(final_grade),
            min: group.min(final_grade),
            max: group.max(final_grade),
            std_dev: group.std_dev(final_grade),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedTypeSummary {
    pub modality_type: ModalityType,
    pub completed: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub share: f64,
    pub honors: usize,
    pub grades: GradeStats,
    #[serde(serialize_with = "serialize_rounded")]
    pub average_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedAnalysisReport {
    pub program_id: u64,
    pub period: String,
    pub total_completed: usize,
    pub grades: GradeStats,
    pub distinctions: Vec<CountShare<Distinction>>,
    #[serde(serialize_with = "serialize_rounded")]
    pub honor_rate: f64,
    pub by_type: Vec<CompletedTypeSummary>,
    pub performance: PerformanceSummary,
    pub history: Vec<PeriodAggregate>,
    pub trend: TrendResult,
}

pub fn completed_analysis(
    records: &[ModalityRecord],
    request: &ReportRequest,
    config: &EngineConfig,
) -> CompletedAnalysisReport {
    let selected = request.select(records);
    let current = request.scope.current_period();
    let completed: Vec<&ModalityRecord> = selected
        .iter()
        .copied()
        .filter(|r| r.status.is_completed())
        .collect();
    debug!(
        program = request.scope.program_id,
        records = selected.len(),
        completed = completed.len(),
        "building completed-modality analysis"
    );

    let completed_group = GroupStats::new(completed.clone());
    let distinctions = aggregate(completed.iter().copied(), by_distinction);

    let mut by_type_summary: Vec<CompletedTypeSummary> = aggregate(completed.iter().copied(), by_type)
        .iter()
        .map(|(modality_type, group)| CompletedTypeSummary {
            modality_type: *modality_type,
            completed: group.count(),
            share: stats::percentage(group.count(), completed_group.count()),
            honors: group.count_where(ModalityRecord::has_honor),
            grades: GradeStats::of(group),
            average_days: group.average(duration_days),
        })
        .collect();
    by_type_summary.sort_by(|a, b| b.completed.cmp(&a.completed).then(a.modality_type.cmp(&b.modality_type)));

    // Completions are bucketed by the period they finished in.
    let history = period_history(
        completed.iter().copied(),
        current,
        config.summary_periods,
        DateBasis::Completion,
    );

    CompletedAnalysisReport {
        program_id: request.scope.program_id,
        period: current.label(),
        total_completed: completed_group.count(),
        grades: GradeStats::of(&completed_group),
        distinctions: breakdown(&distinctions, completed_group.count()),
        honor_rate: completed_group.rate_of(ModalityRecord::has_honor),
        by_type: by_type_summary,
        performance: performance::analyze(selected.iter().copied()),
        trend: trend::analyze(&history, config.summary_trend.table()),
        history,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorWorkload {
    pub director_id: u64,
    pub active: usize,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub group_modalities: usize,
    pub unique_students: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub completion_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub success_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub average_grade: f64,
    pub workload_level: WorkloadLevel,
    pub verdict: PerformanceVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorWorkloadReport {
    pub program_id: u64,
    pub period: String,
    pub total_directors: usize,
    pub unassigned_modalities: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub average_active: f64,
    pub directors: Vec<DirectorWorkload>,
    pub level_distribution: Vec<CountShare<WorkloadLevel>>,
    pub overloaded_directors: Vec<u64>,
}

pub fn director_workload(records: &[ModalityRecord], request: &ReportRequest) -> DirectorWorkloadReport {
    let selected = request.select(records);
    debug!(
        program = request.scope.program_id,
        records = selected.len(),
        "building director workload"
    );

    let mut directors: Vec<DirectorWorkload> = aggregate(selected.iter().copied(), by_director)
        .iter()
        .map(|(director_id, group)| {
            let active = group.count_where(|r| r.status.is_active());
            let completion_rate = group.rate_of(|r| r.status.is_completed());
            let success_rate = group.success_rate();
            DirectorWorkload {
                director_id: *director_id,
                active,
                total: group.count(),
                completed: group.completed(),
                failed: group.failed(),
                group_modalities: group.count_where(ModalityRecord::is_group),
                unique_students: group.unique_student_count(),
                completion_rate,
                success_rate,
                average_grade: group.average(final_grade),
                workload_level: classify(active as f64, &WORKLOAD_LEVEL),
                verdict: classify(completion_rate.min(success_rate), &SUCCESS_VERDICT),
            }
        })
        .collect();
    directors.sort_by(|a, b| b.active.cmp(&a.active).then(a.director_id.cmp(&b.director_id)));

    let active_counts: Vec<f64> = directors.iter().map(|d| d.active as f64).collect();

    DirectorWorkloadReport {
        program_id: request.scope.program_id,
        period: request.scope.current_period().label(),
        total_directors: directors.len(),
        unassigned_modalities: selected.iter().filter(|r| r.director_id.is_none()).count(),
        average_active: stats::mean(&active_counts),
        level_distribution: tally(directors.iter().map(|d| d.workload_level)),
        overloaded_directors: directors
            .iter()
            .filter(|d| d.workload_level == WorkloadLevel::Overloaded)
            .map(|d| d.director_id)
            .collect(),
        directors,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeComparison {
    pub modality_type: ModalityType,
    #[serde(serialize_with = "serialize_rounded")]
    pub share_of_current: f64,
    pub current: PeriodAggregate,
    pub previous: PeriodAggregate,
    pub comparison: ComparisonResult,
    pub trend: TrendResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeComparisonReport {
    pub program_id: u64,
    pub current_period: String,
    pub previous_period: String,
    pub overall: ComparisonResult,
    pub types: Vec<TypeComparison>,
    pub most_popular: Option<ModalityType>,
    pub least_popular: Option<ModalityType>,
    pub fastest_growing: Option<ModalityType>,
}

pub fn type_comparison(
    records: &[ModalityRecord],
    request: &ReportRequest,
    config: &EngineConfig,
) -> TypeComparisonReport {
    let selected = request.select(records);
    let current = request.scope.current_period();
    let periods = config.summary_periods.max(2);
    let table = config.comparison_trend.table();
    debug!(
        program = request.scope.program_id,
        records = selected.len(),
        period = %current,
        "building modality-type comparison"
    );

    let overall_history = period_history(selected.iter().copied(), current, 2, DateBasis::Selection);
    let overall = compare(&overall_history[0], &overall_history[1]);

    let types: Vec<TypeComparison> = aggregate(selected.iter().copied(), by_type)
        .iter()
        .map(|(modality_type, group)| {
            let history = period_history(
                group.records().iter().copied(),
                current,
                periods,
                DateBasis::Selection,
            );
            TypeComparison {
                modality_type: *modality_type,
                share_of_current: stats::percentage(history[0].count, overall_history[0].count),
                comparison: compare(&history[0], &history[1]),
                trend: trend::analyze(&history, table),
                current: history[0].clone(),
                previous: history[1].clone(),
            }
        })
        .collect();

    let most_popular = types
        .iter()
        .min_by(|a, b| b.current.count.cmp(&a.current.count).then(a.modality_type.cmp(&b.modality_type)))
        .map(|t| t.modality_type);
    let least_popular = types
        .iter()
        .min_by(|a, b| a.current.count.cmp(&b.current.count).then(a.modality_type.cmp(&b.modality_type)))
        .map(|t| t.modality_type);
    let fastest_growing = types
        .iter()
        .filter(|t| t.comparison.count_change > 0.0)
        .max_by(|a, b| a.comparison.count_change.total_cmp(&b.comparison.count_change))
        .map(|t| t.modality_type);

    TypeComparisonReport {
        program_id: request.scope.program_id,
        current_period: current.label(),
        previous_period: current.previous().label(),
        overall,
        types,
        most_popular,
        least_popular,
        fastest_growing,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalAnalysisReport {
    pub program_id: u64,
    /// Set when the filter narrows the analysis to a single modality type.
    pub modality_type: Option<ModalityType>,
    pub periods_analyzed: usize,
    pub total_modalities: usize,
    pub history: Vec<PeriodAggregate>,
    pub trend: TrendResult,
    pub comparisons: PeriodComparisons,
    pub projection: Projection,
    pub performance: PerformanceSummary,
    pub distinctions: Vec<CountShare<Distinction>>,
}

pub fn historical_analysis(
    records: &[ModalityRecord],
    request: &ReportRequest,
    config: &EngineConfig,
) -> HistoricalAnalysisReport {
    let selected = request.select(records);
    let current = request.scope.current_period();
    let table = config.historical_trend.table();
    debug!(
        program = request.scope.program_id,
        records = selected.len(),
        periods = config.historical_periods,
        "building historical analysis"
    );

    let history = period_history(
        selected.iter().copied(),
        current,
        config.historical_periods,
        DateBasis::Selection,
    );
    let distinctions = aggregate(selected.iter().copied(), by_distinction);
    let completed: usize = distinctions.values().map(GroupStats::count).sum();
    let modality_type = match request.filter.types.len() {
        1 => request.filter.types.first().copied(),
        _ => None,
    };

    HistoricalAnalysisReport {
        program_id: request.scope.program_id,
        modality_type,
        periods_analyzed: history.len(),
        total_modalities: selected.len(),
        trend: trend::analyze(&history, table),
        comparisons: period_comparisons(&history),
        projection: projection::project(&history, table),
        performance: performance::analyze(selected.iter().copied()),
        distinctions: breakdown(&distinctions, completed),
        history,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRow {
    pub modality_id: u64,
    pub modality_type: ModalityType,
    pub status: ModalityStatus,
    pub student_ids: Vec<u64>,
    pub director_id: Option<u64>,
    pub period: Option<String>,
    pub selection_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    #[serde(serialize_with = "serialize_rounded_opt")]
    pub final_grade: Option<f64>,
    pub distinction: Option<Distinction>,
    #[serde(serialize_with = "serialize_rounded_opt")]
    pub duration_days: Option<f64>,
}

impl ListingRow {
    fn of(record: &ModalityRecord) -> Self {
        Self {
            modality_id: record.id,
            modality_type: record.modality_type,
            status: record.status,
            student_ids: record.student_ids.iter().copied().collect(),
            director_id: record.director_id,
            period: record.period(DateBasis::Selection).map(|p| p.label()),
            selection_date: record.selection_date.map(|d| d.date()),
            completion_date: record.completion_date.map(|d| d.date()),
            final_grade: record.final_grade,
            distinction: record.distinction,
            duration_days: record.duration_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentListingReport {
    pub program_id: u64,
    pub filter: FilterSpec,
    pub total_records: usize,
    pub unique_students: usize,
    pub group_modalities: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub average_grade: f64,
    pub by_status: Vec<CountShare<ModalityStatus>>,
    pub by_type: Vec<CountShare<ModalityType>>,
    pub rows: Vec<ListingRow>,
}

pub fn student_listing(records: &[ModalityRecord], request: &ReportRequest) -> StudentListingReport {
    let mut selected = request.select(records);
    debug!(
        program = request.scope.program_id,
        records = selected.len(),
        filtered = !request.filter.is_empty(),
        "building student listing"
    );

    // Newest selection first; undated records last.
    selected.sort_by(|a, b| {
        b.selection_date
            .is_some()
            .cmp(&a.selection_date.is_some())
            .then(b.selection_date.cmp(&a.selection_date))
            .then(a.id.cmp(&b.id))
    });

    let all = GroupStats::new(selected.clone());
    StudentListingReport {
        program_id: request.scope.program_id,
        filter: request.filter.clone(),
        total_records: all.count(),
        unique_students: all.unique_student_count(),
        group_modalities: all.count_where(ModalityRecord::is_group),
        average_grade: all.average(final_grade),
        by_status: breakdown(&aggregate(selected.iter().copied(), by_status), all.count()),
        by_type: breakdown(&aggregate(selected.iter().copied(), by_type), all.count()),
        rows: selected.iter().map(|r| ListingRow::of(r)).collect(),
    }
}
