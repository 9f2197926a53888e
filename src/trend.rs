//! Trend and pattern analysis over a period history.
//!
//! Every function here takes the history newest first, the order in which callers build
//! it by walking back from the current period.

use crate::classify::{classify, ThresholdTable, CHANGE_INDICATOR};
use crate::models::{PeriodAggregate, PeriodRef, TrendDirection, TrendPoint, TrendResult};
use crate::stats;

/// One half's average count must exceed the other's by more than this factor.
const SEASONAL_SKEW: f64 = 1.3;
/// Consecutive periods needed before a streak is reported.
const MIN_STREAK: usize = 3;
const HIGH_CONSISTENCY: f64 = 75.0;
const LOW_CONSISTENCY: f64 = 50.0;

/// Growth from the oldest to the newest count, in percent.
///
/// A segment that grew out of nothing counts as 100% growth; nothing to nothing is 0%.
pub fn growth_rate(newest: usize, oldest: usize) -> f64 {
    match (newest, oldest) {
        (_, 0) if newest > 0 => 100.0,
        (_, 0) => 0.0,
        _ => 100.0 * (newest as f64 - oldest as f64) / oldest as f64,
    }
}

pub fn analyze(history: &[PeriodAggregate], table: &ThresholdTable<TrendDirection>) -> TrendResult {
    let points = trend_points(history);
    let (Some(newest), Some(oldest)) = (history.first(), history.last()) else {
        return insufficient(points);
    };
    if history.len() < 2 {
        return insufficient(points);
    }

    let growth = growth_rate(newest.count, oldest.count);
    TrendResult {
        overall_trend: classify(growth, table),
        growth_rate: growth,
        peak: peak(history).map(PeriodRef::of),
        lowest: lowest(history).map(PeriodRef::of),
        points,
        patterns: detect_patterns(history),
    }
}

fn insufficient(points: Vec<TrendPoint>) -> TrendResult {
    TrendResult {
        overall_trend: TrendDirection::InsufficientData,
        growth_rate: 0.0,
        peak: None,
        lowest: None,
        points,
        patterns: Vec::new(),
    }
}

/// Highest count; ties go to the earliest period.
pub fn peak(history: &[PeriodAggregate]) -> Option<&PeriodAggregate> {
    history
        .iter()
        .min_by(|a, b| b.count.cmp(&a.count).then(a.period.cmp(&b.period)))
}

/// Lowest count; ties go to the earliest period.
pub fn lowest(history: &[PeriodAggregate]) -> Option<&PeriodAggregate> {
    history
        .iter()
        .min_by(|a, b| a.count.cmp(&b.count).then(a.period.cmp(&b.period)))
}

/// One point per period. Each change is measured against the next older period; the
/// oldest period has nothing to compare with and reads as stable.
pub fn trend_points(history: &[PeriodAggregate]) -> Vec<TrendPoint> {
    history
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let change = history
                .get(i + 1)
                .map(|previous| stats::percent_change(current.count as f64, previous.count as f64))
                .unwrap_or(0.0);
            TrendPoint {
                period: current.period,
                label: current.label.clone(),
                count: current.count,
                completion_rate: current.completion_rate,
                change_percentage: change,
                indicator: classify(change, &CHANGE_INDICATOR),
            }
        })
        .collect()
}

pub fn detect_patterns(history: &[PeriodAggregate]) -> Vec<String> {
    let mut patterns = Vec::new();

    if let Some(pattern) = seasonal_pattern(history) {
        patterns.push(pattern);
    }

    let counts: Vec<usize> = history.iter().map(|a| a.count).collect();
    let rising_back = longest_run(&counts, |newer, older| newer < older);
    if rising_back >= MIN_STREAK {
        patterns.push(format!(
            "Sustained decrease: counts fell across {rising_back} consecutive periods"
        ));
    }
    let falling_back = longest_run(&counts, |newer, older| newer > older);
    if falling_back >= MIN_STREAK {
        patterns.push(format!(
            "Sustained growth: counts rose across {falling_back} consecutive periods"
        ));
    }

    // Empty periods carry a 0.0 rate by convention and say nothing about consistency.
    let rates: Vec<f64> = history
        .iter()
        .filter(|a| a.count > 0)
        .map(|a| a.completion_rate)
        .collect();
    if !rates.is_empty() {
        let average = stats::mean(&rates);
        if average >= HIGH_CONSISTENCY {
            patterns.push(format!(
                "High consistency in completion rates ({:.1}% on average)",
                average
            ));
        } else if average < LOW_CONSISTENCY {
            patterns.push(format!(
                "Completion rate requires attention ({:.1}% on average)",
                average
            ));
        }
    }

    patterns
}

fn seasonal_pattern(history: &[PeriodAggregate]) -> Option<String> {
    let counts_for = |half: u8| -> Vec<f64> {
        history
            .iter()
            .filter(|a| a.period.half() == half)
            .map(|a| a.count as f64)
            .collect()
    };
    let first = counts_for(1);
    let second = counts_for(2);
    if first.is_empty() || second.is_empty() {
        return None;
    }
    let (first_avg, second_avg) = (stats::mean(&first), stats::mean(&second));
    if first_avg > second_avg * SEASONAL_SKEW {
        Some("Seasonal skew: higher demand in the first half of the year".to_string())
    } else if second_avg > first_avg * SEASONAL_SKEW {
        Some("Seasonal skew: higher demand in the second half of the year".to_string())
    } else {
        None
    }
}

/// Length, in periods, of the longest run where every adjacent (newer, older) pair
/// satisfies `step`. A single period is not a run.
fn longest_run<F>(counts: &[usize], step: F) -> usize
where
    F: Fn(usize, usize) -> bool,
{
    let mut best = 0;
    let mut current = 1;
    for pair in counts.windows(2) {
        if step(pair[0], pair[1]) {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{TREND_STANDARD, TREND_STRICT};
    use crate::models::ChangeIndicator;
    use crate::period::{walk_back, AcademicPeriod};

    /// Newest first, starting at 2024-2.
    fn history(counts: &[usize], completion_rate: f64) -> Vec<PeriodAggregate> {
        walk_back(AcademicPeriod::new(2024, 2).unwrap(), counts.len())
            .into_iter()
            .zip(counts)
            .map(|(period, &count)| {
                let mut aggregate = PeriodAggregate::empty(period);
                aggregate.count = count;
                aggregate.completion_rate = completion_rate;
                aggregate
            })
            .collect()
    }

    #[test]
    fn growth_rate_edge_cases() {
        assert_eq!(growth_rate(10, 20), -50.0);
        assert_eq!(growth_rate(30, 20), 50.0);
        assert_eq!(growth_rate(4, 0), 100.0);
        assert_eq!(growth_rate(0, 0), 0.0);
    }

    #[test]
    fn newest_lower_than_oldest_is_declining() {
        let result = analyze(&history(&[10, 20], 60.0), &TREND_STANDARD);
        assert_eq!(result.growth_rate, -50.0);
        assert_eq!(result.overall_trend, TrendDirection::Declining);
        assert_eq!(result.peak.unwrap().label, "2024-1");
        assert_eq!(result.lowest.unwrap().label, "2024-2");
    }

    #[test]
    fn fewer_than_two_periods_is_insufficient() {
        for counts in [&[][..], &[7][..]] {
            let result = analyze(&history(counts, 80.0), &TREND_STANDARD);
            assert_eq!(result.overall_trend, TrendDirection::InsufficientData);
            assert_eq!(result.growth_rate, 0.0);
            assert!(result.peak.is_none());
            assert!(result.patterns.is_empty());
        }
    }

    #[test]
    fn flat_history_is_stable() {
        let result = analyze(&history(&[5, 5, 5], 80.0), &TREND_STANDARD);
        assert_eq!(result.overall_trend, TrendDirection::Stable);
        assert_eq!(result.growth_rate, 0.0);
        assert!(result
            .patterns
            .iter()
            .any(|p| p.starts_with("High consistency")));

        let result = analyze(&history(&[5, 5, 5], 60.0), &TREND_STANDARD);
        assert!(!result
            .patterns
            .iter()
            .any(|p| p.starts_with("High consistency")));
        assert!(!result.patterns.iter().any(|p| p.contains("requires attention")));
    }

    #[test]
    fn table_choice_changes_the_verdict() {
        let h = history(&[112, 100], 60.0);
        assert_eq!(analyze(&h, &TREND_STANDARD).overall_trend, TrendDirection::Growing);
        assert_eq!(analyze(&h, &TREND_STRICT).overall_trend, TrendDirection::Stable);
    }

    #[test]
    fn ties_resolve_to_earliest_period() {
        let h = history(&[9, 3, 9, 3], 60.0);
        assert_eq!(peak(&h).unwrap().label, "2023-2");
        assert_eq!(lowest(&h).unwrap().label, "2023-1");
    }

    #[test]
    fn points_compare_each_period_with_the_one_before() {
        let points = trend_points(&history(&[21, 20, 10, 0], 60.0));
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].change_percentage, 5.0);
        assert_eq!(points[0].indicator, ChangeIndicator::Stable);
        assert_eq!(points[1].change_percentage, 100.0);
        assert_eq!(points[1].indicator, ChangeIndicator::Up);
        assert_eq!(points[2].change_percentage, 0.0);
        assert_eq!(points[3].indicator, ChangeIndicator::Stable);

        let points = trend_points(&history(&[10, 20], 60.0));
        assert_eq!(points[0].indicator, ChangeIndicator::Down);
    }

    #[test]
    fn detects_streaks_in_both_directions() {
        let patterns = detect_patterns(&history(&[2, 4, 6, 6], 60.0));
        assert!(patterns.iter().any(|p| p.starts_with("Sustained decrease")));
        assert!(!patterns.iter().any(|p| p.starts_with("Sustained growth")));

        let patterns = detect_patterns(&history(&[9, 6, 3], 60.0));
        assert!(patterns.iter().any(|p| p.starts_with("Sustained growth")));

        let patterns = detect_patterns(&history(&[2, 4], 60.0));
        assert!(!patterns.iter().any(|p| p.starts_with("Sustained")));
    }

    #[test]
    fn detects_seasonal_skew() {
        // 2024-2, 2024-1, 2023-2, 2023-1
        let patterns = detect_patterns(&history(&[20, 10, 20, 10], 60.0));
        assert!(patterns.iter().any(|p| p.contains("second half")));

        let patterns = detect_patterns(&history(&[12, 10, 12, 10], 60.0));
        assert!(!patterns.iter().any(|p| p.starts_with("Seasonal")));
    }

    #[test]
    fn empty_periods_do_not_drag_completion_down() {
        assert!(detect_patterns(&history(&[0, 0, 0], 0.0)).is_empty());

        let mut h = history(&[4, 0, 4], 0.0);
        h[0].completion_rate = 80.0;
        h[2].completion_rate = 90.0;
        let patterns = detect_patterns(&h);
        assert!(patterns.iter().any(|p| p.starts_with("High consistency")));
        assert!(!patterns.iter().any(|p| p.contains("requires attention")));
    }

    #[test]
    fn low_completion_needs_attention() {
        let patterns = detect_patterns(&history(&[3, 3], 20.0));
        assert!(patterns.iter().any(|p| p.contains("requires attention")));
    }
}
