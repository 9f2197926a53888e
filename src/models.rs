use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;
use crate::period::{period_of, AcademicPeriod};
use crate::stats::{serialize_rounded, serialize_rounded_opt};

/// Upper-cases a literal and folds spaces and dashes into underscores.
fn literal_token(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalityType {
    ResearchProject,
    Internship,
    Seminar,
    Entrepreneurship,
    PostgraduateCredits,
    AcademicExcellence,
    SocialOutreach,
}

impl ModalityType {
    pub const ALL: [ModalityType; 7] = [
        ModalityType::ResearchProject,
        ModalityType::Internship,
        ModalityType::Seminar,
        ModalityType::Entrepreneurship,
        ModalityType::PostgraduateCredits,
        ModalityType::AcademicExcellence,
        ModalityType::SocialOutreach,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModalityType::ResearchProject => "research_project",
            ModalityType::Internship => "internship",
            ModalityType::Seminar => "seminar",
            ModalityType::Entrepreneurship => "entrepreneurship",
            ModalityType::PostgraduateCredits => "postgraduate_credits",
            ModalityType::AcademicExcellence => "academic_excellence",
            ModalityType::SocialOutreach => "social_outreach",
        }
    }
}

impl FromStr for ModalityType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match literal_token(s).as_str() {
            "RESEARCH_PROJECT" | "THESIS" => Ok(ModalityType::ResearchProject),
            "INTERNSHIP" => Ok(ModalityType::Internship),
            "SEMINAR" => Ok(ModalityType::Seminar),
            "ENTREPRENEURSHIP" => Ok(ModalityType::Entrepreneurship),
            "POSTGRADUATE_CREDITS" => Ok(ModalityType::PostgraduateCredits),
            "ACADEMIC_EXCELLENCE" => Ok(ModalityType::AcademicExcellence),
            "SOCIAL_OUTREACH" => Ok(ModalityType::SocialOutreach),
            _ => Err(ParseEnumError::new("modality type", s)),
        }
    }
}

impl fmt::Display for ModalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage of a graduation process. The five pre-grading stages are "active".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalityStatus {
    Selected,
    UnderReview,
    Approved,
    InDevelopment,
    DefenseScheduled,
    GradedApproved,
    GradedFailed,
    Cancelled,
    Rejected,
}

impl ModalityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModalityStatus::Selected => "selected",
            ModalityStatus::UnderReview => "under_review",
            ModalityStatus::Approved => "approved",
            ModalityStatus::InDevelopment => "in_development",
            ModalityStatus::DefenseScheduled => "defense_scheduled",
            ModalityStatus::GradedApproved => "graded_approved",
            ModalityStatus::GradedFailed => "graded_failed",
            ModalityStatus::Cancelled => "cancelled",
            ModalityStatus::Rejected => "rejected",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ModalityStatus::GradedApproved)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ModalityStatus::GradedFailed)
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ModalityStatus::Selected
                | ModalityStatus::UnderReview
                | ModalityStatus::Approved
                | ModalityStatus::InDevelopment
                | ModalityStatus::DefenseScheduled
        )
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl FromStr for ModalityStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match literal_token(s).as_str() {
            "SELECTED" => Ok(ModalityStatus::Selected),
            "UNDER_REVIEW" => Ok(ModalityStatus::UnderReview),
            "APPROVED" => Ok(ModalityStatus::Approved),
            "IN_DEVELOPMENT" => Ok(ModalityStatus::InDevelopment),
            "DEFENSE_SCHEDULED" => Ok(ModalityStatus::DefenseScheduled),
            "GRADED_APPROVED" | "COMPLETED" => Ok(ModalityStatus::GradedApproved),
            "GRADED_FAILED" | "FAILED" => Ok(ModalityStatus::GradedFailed),
            "CANCELLED" | "CANCELED" => Ok(ModalityStatus::Cancelled),
            "REJECTED" => Ok(ModalityStatus::Rejected),
            _ => Err(ParseEnumError::new("modality status", s)),
        }
    }
}

impl fmt::Display for ModalityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distinction {
    None,
    Meritorious,
    Laureate,
}

impl Distinction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distinction::None => "none",
            Distinction::Meritorious => "meritorious",
            Distinction::Laureate => "laureate",
        }
    }

    pub fn is_honor(&self) -> bool {
        !matches!(self, Distinction::None)
    }
}

impl FromStr for Distinction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match literal_token(s).as_str() {
            "NONE" | "NO_DISTINCTION" => Ok(Distinction::None),
            "MERITORIOUS" => Ok(Distinction::Meritorious),
            "LAUREATE" => Ok(Distinction::Laureate),
            _ => Err(ParseEnumError::new("distinction", s)),
        }
    }
}

impl fmt::Display for Distinction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which timestamp places a record in a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBasis {
    Selection,
    Completion,
}

/// One student graduation-process instance, as consumed by every analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalityRecord {
    pub id: u64,
    pub modality_type: ModalityType,
    pub status: ModalityStatus,
    pub selection_date: Option<NaiveDateTime>,
    pub last_update: Option<NaiveDateTime>,
    pub completion_date: Option<NaiveDateTime>,
    pub final_grade: Option<f64>,
    pub distinction: Option<Distinction>,
    pub director_id: Option<u64>,
    pub student_ids: BTreeSet<u64>,
    pub academic_program_id: u64,
}

impl ModalityRecord {
    pub fn is_group(&self) -> bool {
        self.student_ids.len() > 1
    }

    pub fn date(&self, basis: DateBasis) -> Option<NaiveDateTime> {
        match basis {
            DateBasis::Selection => self.selection_date,
            DateBasis::Completion => self.completion_date,
        }
    }

    pub fn period(&self, basis: DateBasis) -> Option<AcademicPeriod> {
        self.date(basis).map(|d| period_of(&d))
    }

    /// Whole days from selection to completion, for completed records only.
    pub fn duration_days(&self) -> Option<f64> {
        if !self.status.is_completed() {
            return None;
        }
        match (self.selection_date, self.completion_date) {
            (Some(start), Some(end)) => Some((end - start).num_days() as f64),
            _ => None,
        }
    }

    pub fn has_honor(&self) -> bool {
        self.distinction.is_some_and(|d| d.is_honor())
    }
}

/// Counts and rates of the records falling in one academic period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAggregate {
    pub period: AcademicPeriod,
    pub label: String,
    pub count: usize,
    pub completed: usize,
    pub failed: usize,
    pub active: usize,
    pub unique_students: usize,
    pub honors: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub completion_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub success_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub average_grade: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceVerdict {
    NeedsImprovement,
    Regular,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkloadLevel {
    Low,
    Normal,
    High,
    Overloaded,
}

/// Declaration order is "most declining" to "most growing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    InsufficientData,
    Declining,
    Stable,
    Growing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeIndicator {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonVerdict {
    Improved,
    Declined,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRef {
    pub period: AcademicPeriod,
    pub label: String,
    pub count: usize,
}

impl PeriodRef {
    pub fn of(aggregate: &PeriodAggregate) -> Self {
        Self {
            period: aggregate.period,
            label: aggregate.label.clone(),
            count: aggregate.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: AcademicPeriod,
    pub label: String,
    pub count: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub completion_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub change_percentage: f64,
    pub indicator: ChangeIndicator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub overall_trend: TrendDirection,
    #[serde(serialize_with = "serialize_rounded")]
    pub growth_rate: f64,
    pub peak: Option<PeriodRef>,
    pub lowest: Option<PeriodRef>,
    pub points: Vec<TrendPoint>,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub current_label: String,
    pub previous_label: String,
    pub current_count: usize,
    pub previous_count: usize,
    pub current_completed: usize,
    pub previous_completed: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub current_completion_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub previous_completion_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub count_change: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub completed_change: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub completion_rate_change: f64,
    pub verdict: ComparisonVerdict,
}

/// The three fixed comparisons over a newest-first history. Absent when the history
/// cannot supply both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodComparisons {
    pub vs_previous: Option<ComparisonResult>,
    pub vs_year_ago: Option<ComparisonResult>,
    pub best_vs_worst: Option<ComparisonResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub basis_trend: TrendDirection,
    pub periods_used: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub baseline: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub next_period_value: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub next_year_value: f64,
    pub demand_level: DemandLevel,
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub completion_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub success_rate: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub abandonment_rate: f64,
    #[serde(serialize_with = "serialize_rounded_opt")]
    pub fastest_days: Option<f64>,
    #[serde(serialize_with = "serialize_rounded_opt")]
    pub slowest_days: Option<f64>,
    #[serde(serialize_with = "serialize_rounded")]
    pub average_days: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub median_days: f64,
    pub verdict: PerformanceVerdict,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
}

/// A keyed count with its share of the whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountShare<K> {
    pub key: K,
    pub count: usize,
    #[serde(serialize_with = "serialize_rounded")]
    pub percentage: f64,
}
