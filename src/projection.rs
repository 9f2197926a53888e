//! Near-term demand projection.
//!
//! A fixed heuristic over recent counts, not a fitted model. The constants below are the
//! ones the reports have always printed and must not drift.

use crate::classify::ThresholdTable;
use crate::models::{DemandLevel, PeriodAggregate, Projection, TrendDirection};
use crate::stats;
use crate::trend;

pub const MIN_HISTORY: usize = 3;
const RECENT_WINDOW: usize = 3;
const GROWTH_FACTOR: f64 = 1.15;
const DECLINE_FACTOR: f64 = 0.85;
const HIGH_DEMAND: f64 = 1.2;
const MEDIUM_DEMAND: f64 = 0.8;

const BASE_CONFIDENCE: i32 = 50;
const CONFIDENCE_PER_PERIOD: i32 = 5;
const MAX_HISTORY_BONUS: i32 = 30;
const STEADY_BONUS: i32 = 15;
const VOLATILE_PENALTY: i32 = 10;
const MAX_CONFIDENCE: i32 = 95;

/// Projects the next period and the next year (two halves) from a newest-first history.
///
/// Fewer than three periods yields an `insufficient_data` projection with zero
/// confidence.
pub fn project(history: &[PeriodAggregate], table: &ThresholdTable<TrendDirection>) -> Projection {
    if history.len() < MIN_HISTORY {
        return Projection {
            basis_trend: TrendDirection::InsufficientData,
            periods_used: history.len(),
            baseline: 0.0,
            next_period_value: 0.0,
            next_year_value: 0.0,
            demand_level: DemandLevel::Low,
            confidence: 0,
        };
    }

    let counts: Vec<f64> = history.iter().map(|a| a.count as f64).collect();
    let baseline = stats::mean(&counts[..RECENT_WINDOW]);
    let basis_trend = trend::analyze(history, table).overall_trend;
    let next_period_value = match basis_trend {
        TrendDirection::Growing => baseline * GROWTH_FACTOR,
        TrendDirection::Declining => baseline * DECLINE_FACTOR,
        TrendDirection::Stable | TrendDirection::InsufficientData => baseline,
    };

    Projection {
        basis_trend,
        periods_used: history.len(),
        baseline,
        next_period_value,
        next_year_value: 2.0 * next_period_value,
        demand_level: demand_level(next_period_value, baseline),
        confidence: confidence(&counts),
    }
}

/// Projected value against the recent baseline it was scaled from. A zero baseline
/// projects zero, which clears both bounds and reads as high.
pub fn demand_level(projected: f64, baseline: f64) -> DemandLevel {
    if projected >= baseline * HIGH_DEMAND {
        DemandLevel::High
    } else if projected >= baseline * MEDIUM_DEMAND {
        DemandLevel::Medium
    } else {
        DemandLevel::Low
    }
}

/// 50, plus 5 per period (at most 30), plus 15 for a steady series (std dev < 2) or
/// minus 10 for a volatile one (std dev > 5), clamped to 0..=95.
pub fn confidence(counts: &[f64]) -> u8 {
    if counts.len() < MIN_HISTORY {
        return 0;
    }
    let periods = i32::try_from(counts.len()).unwrap_or(i32::MAX);
    let mut score = BASE_CONFIDENCE + periods.saturating_mul(CONFIDENCE_PER_PERIOD).min(MAX_HISTORY_BONUS);
    let spread = stats::std_dev(counts);
    if spread < 2.0 {
        score += STEADY_BONUS;
    } else if spread > 5.0 {
        score -= VOLATILE_PENALTY;
    }
    score.clamp(0, MAX_CONFIDENCE) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{TREND_STANDARD, TREND_STRICT};
    use crate::period::{walk_back, AcademicPeriod};
    use proptest::prelude::*;

    fn history(counts: &[usize]) -> Vec<PeriodAggregate> {
        walk_back(AcademicPeriod::new(2025, 1).unwrap(), counts.len())
            .into_iter()
            .zip(counts)
            .map(|(period, &count)| {
                let mut aggregate = PeriodAggregate::empty(period);
                aggregate.count = count;
                aggregate
            })
            .collect()
    }

    #[test]
    fn short_history_is_insufficient() {
        let projection = project(&history(&[4, 5]), &TREND_STANDARD);
        assert_eq!(projection.basis_trend, TrendDirection::InsufficientData);
        assert_eq!(projection.confidence, 0);
        assert_eq!(projection.next_period_value, 0.0);
    }

    #[test]
    fn stable_history_keeps_the_baseline() {
        let projection = project(&history(&[5, 5, 5]), &TREND_STANDARD);
        assert_eq!(projection.basis_trend, TrendDirection::Stable);
        assert_eq!(projection.baseline, 5.0);
        assert_eq!(projection.next_period_value, 5.0);
        assert_eq!(projection.next_year_value, 10.0);
        assert_eq!(projection.demand_level, DemandLevel::Medium);
        // 50 + 15 (three periods) + 15 (steady)
        assert_eq!(projection.confidence, 80);
    }

    #[test]
    fn growing_history_is_scaled_up() {
        // newest first: 12, 10, 8, 4, 2, 2
        let projection = project(&history(&[12, 10, 8, 4, 2, 2]), &TREND_STANDARD);
        assert_eq!(projection.basis_trend, TrendDirection::Growing);
        assert_eq!(projection.baseline, 10.0);
        assert!((projection.next_period_value - 11.5).abs() < 1e-9);
        assert!((projection.next_year_value - 23.0).abs() < 1e-9);
        // 11.5 is under 1.2x the baseline of 10
        assert_eq!(projection.demand_level, DemandLevel::Medium);
        // 50 + 30 (six periods); std dev ~3.9 is neither steady nor volatile
        assert_eq!(projection.confidence, 80);
    }

    #[test]
    fn declining_history_is_scaled_down() {
        let projection = project(&history(&[2, 4, 10, 20]), &TREND_STRICT);
        assert_eq!(projection.basis_trend, TrendDirection::Declining);
        let baseline = 16.0 / 3.0;
        assert!((projection.next_period_value - baseline * 0.85).abs() < 1e-9);
        assert_eq!(projection.demand_level, DemandLevel::Medium);
        // 50 + 20 - 10 (std dev 7)
        assert_eq!(projection.confidence, 60);
    }

    #[test]
    fn demand_is_measured_against_the_recent_baseline() {
        // newest three average 2 even though the older periods held 20
        let projection = project(&history(&[2, 2, 2, 20, 20, 20]), &TREND_STRICT);
        assert_eq!(projection.basis_trend, TrendDirection::Declining);
        assert_eq!(projection.baseline, 2.0);
        assert!((projection.next_period_value - 1.7).abs() < 1e-9);
        assert_eq!(projection.demand_level, DemandLevel::Medium);
    }

    #[test]
    fn demand_level_bounds() {
        assert_eq!(demand_level(12.0, 10.0), DemandLevel::High);
        assert_eq!(demand_level(11.99, 10.0), DemandLevel::Medium);
        assert_eq!(demand_level(8.0, 10.0), DemandLevel::Medium);
        assert_eq!(demand_level(7.99, 10.0), DemandLevel::Low);
    }

    #[test]
    fn zero_baseline_reads_as_high_demand() {
        let projection = project(&history(&[0, 0, 0]), &TREND_STANDARD);
        assert_eq!(projection.next_period_value, 0.0);
        assert_eq!(projection.demand_level, DemandLevel::High);
        assert_eq!(projection.confidence, 80);
    }

    #[test]
    fn confidence_is_capped() {
        let counts = vec![7.0; 40];
        assert_eq!(confidence(&counts), 95);
    }

    proptest! {
        #[test]
        fn confidence_stays_in_range(counts in prop::collection::vec(0usize..200, 0..30)) {
            let projection = project(&history(&counts), &TREND_STANDARD);
            prop_assert!(projection.confidence <= 95);
            prop_assert_eq!(projection.confidence == 0, counts.len() < 3);
        }
    }
}
