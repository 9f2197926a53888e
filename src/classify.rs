//! Threshold tables and the classifier that walks them.
//!
//! Each table is one semantic use. Two tables with the same shape but different
//! cutoffs (`TREND_STANDARD` and `TREND_STRICT`) stay separate on purpose: different
//! reports classify trends with different sensitivity.

use serde::{Deserialize, Serialize};

use crate::models::{ChangeIndicator, ComparisonVerdict, PerformanceVerdict, TrendDirection, WorkloadLevel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `value >= bound`
    AtLeast(f64),
    /// `value > bound`
    Above(f64),
}

impl Bound {
    pub fn admits(&self, value: f64) -> bool {
        match *self {
            Bound::AtLeast(b) => value >= b,
            Bound::Above(b) => value > b,
        }
    }
}

/// Ordered `(bound, verdict)` steps, highest first, plus the verdict for values that
/// clear no step.
#[derive(Debug)]
pub struct ThresholdTable<V: 'static> {
    pub name: &'static str,
    pub steps: &'static [(Bound, V)],
    pub fallback: V,
}

/// First step whose bound admits `value`, else the table's fallback.
///
/// NaN clears no bound and lands on the fallback.
pub fn classify<V: Copy>(value: f64, table: &ThresholdTable<V>) -> V {
    table
        .steps
        .iter()
        .find(|(bound, _)| bound.admits(value))
        .map(|(_, verdict)| *verdict)
        .unwrap_or(table.fallback)
}

pub const SUCCESS_VERDICT: ThresholdTable<PerformanceVerdict> = ThresholdTable {
    name: "success_verdict",
    steps: &[
        (Bound::AtLeast(80.0), PerformanceVerdict::Excellent),
        (Bound::AtLeast(60.0), PerformanceVerdict::Good),
        (Bound::AtLeast(40.0), PerformanceVerdict::Regular),
    ],
    fallback: PerformanceVerdict::NeedsImprovement,
};

/// Count-based: number of active modalities under one director.
pub const WORKLOAD_LEVEL: ThresholdTable<WorkloadLevel> = ThresholdTable {
    name: "workload_level",
    steps: &[
        (Bound::AtLeast(8.0), WorkloadLevel::Overloaded),
        (Bound::AtLeast(5.0), WorkloadLevel::High),
        (Bound::AtLeast(2.0), WorkloadLevel::Normal),
    ],
    fallback: WorkloadLevel::Low,
};

pub const TREND_STANDARD: ThresholdTable<TrendDirection> = ThresholdTable {
    name: "trend_standard",
    steps: &[
        (Bound::Above(10.0), TrendDirection::Growing),
        (Bound::AtLeast(-10.0), TrendDirection::Stable),
    ],
    fallback: TrendDirection::Declining,
};

pub const TREND_STRICT: ThresholdTable<TrendDirection> = ThresholdTable {
    name: "trend_strict",
    steps: &[
        (Bound::Above(15.0), TrendDirection::Growing),
        (Bound::AtLeast(-15.0), TrendDirection::Stable),
    ],
    fallback: TrendDirection::Declining,
};

/// ±5% deadband between consecutive periods.
pub const CHANGE_INDICATOR: ThresholdTable<ChangeIndicator> = ThresholdTable {
    name: "change_indicator",
    steps: &[
        (Bound::Above(5.0), ChangeIndicator::Up),
        (Bound::AtLeast(-5.0), ChangeIndicator::Stable),
    ],
    fallback: ChangeIndicator::Down,
};

pub const COMPARISON_VERDICT: ThresholdTable<ComparisonVerdict> = ThresholdTable {
    name: "comparison_verdict",
    steps: &[
        (Bound::Above(10.0), ComparisonVerdict::Improved),
        (Bound::AtLeast(-10.0), ComparisonVerdict::Stable),
    ],
    fallback: ComparisonVerdict::Declined,
};

/// Selects one of the trend tables by name, so reports pick their sensitivity through
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendProfile {
    #[default]
    Standard,
    Strict,
}

impl TrendProfile {
    pub fn table(&self) -> &'static ThresholdTable<TrendDirection> {
        match self {
            TrendProfile::Standard => &TREND_STANDARD,
            TrendProfile::Strict => &TREND_STRICT,
        }
    }
}
