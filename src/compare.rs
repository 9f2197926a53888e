use crate::classify::{classify, COMPARISON_VERDICT};
use crate::models::{ComparisonResult, PeriodAggregate, PeriodComparisons};
use crate::stats::percent_change;
use crate::trend::{lowest, peak};

/// Deltas of `current` relative to `previous`. A zero base yields a 0.0 delta.
pub fn compare(current: &PeriodAggregate, previous: &PeriodAggregate) -> ComparisonResult {
    let count_change = percent_change(current.count as f64, previous.count as f64);
    ComparisonResult {
        current_label: current.label.clone(),
        previous_label: previous.label.clone(),
        current_count: current.count,
        previous_count: previous.count,
        current_completed: current.completed,
        previous_completed: previous.completed,
        current_completion_rate: current.completion_rate,
        previous_completion_rate: previous.completion_rate,
        count_change,
        completed_change: percent_change(current.completed as f64, previous.completed as f64),
        completion_rate_change: percent_change(current.completion_rate, previous.completion_rate),
        verdict: classify(count_change, &COMPARISON_VERDICT),
    }
}

/// The three fixed comparisons over a newest-first history.
///
/// The year-ago comparison needs the same half of the prior year to be present in the
/// history; when it is not, that comparison is simply absent. Best-vs-worst is absent
/// when every period has the same count.
pub fn period_comparisons(history: &[PeriodAggregate]) -> PeriodComparisons {
    let Some(current) = history.first() else {
        return PeriodComparisons::default();
    };

    let vs_previous = history.get(1).map(|previous| compare(current, previous));

    let year_ago = current.period.same_half_prior_year();
    let vs_year_ago = history
        .iter()
        .find(|a| a.period == year_ago)
        .map(|previous| compare(current, previous));

    // A flat history has no distinct best and worst period.
    let best_vs_worst = peak(history)
        .zip(lowest(history))
        .filter(|(best, worst)| best.period != worst.period)
        .map(|(best, worst)| compare(best, worst));

    PeriodComparisons {
        vs_previous,
        vs_year_ago,
        best_vs_worst,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComparisonVerdict;
    use crate::period::{walk_back, AcademicPeriod};

    fn history(counts: &[(usize, usize)]) -> Vec<PeriodAggregate> {
        walk_back(AcademicPeriod::new(2024, 2).unwrap(), counts.len())
            .into_iter()
            .zip(counts)
            .map(|(period, &(count, completed))| {
                let mut aggregate = PeriodAggregate::empty(period);
                aggregate.count = count;
                aggregate.completed = completed;
                aggregate.completion_rate = crate::stats::percentage(completed, count);
                aggregate
            })
            .collect()
    }

    #[test]
    fn verdict_follows_count_delta() {
        let h = history(&[(12, 6), (10, 5)]);
        let result = compare(&h[0], &h[1]);
        assert!((result.count_change - 20.0).abs() < 1e-9);
        assert!((result.completed_change - 20.0).abs() < 1e-9);
        assert_eq!(result.completion_rate_change, 0.0);
        assert_eq!(result.verdict, ComparisonVerdict::Improved);

        let h = history(&[(11, 0), (10, 0)]);
        assert_eq!(compare(&h[0], &h[1]).verdict, ComparisonVerdict::Stable);

        let h = history(&[(5, 0), (10, 0)]);
        let result = compare(&h[0], &h[1]);
        assert_eq!(result.count_change, -50.0);
        assert_eq!(result.verdict, ComparisonVerdict::Declined);
    }

    #[test]
    fn zero_base_is_neutral() {
        let h = history(&[(4, 2), (0, 0)]);
        let result = compare(&h[0], &h[1]);
        assert_eq!(result.count_change, 0.0);
        assert_eq!(result.completion_rate_change, 0.0);
        assert_eq!(result.verdict, ComparisonVerdict::Stable);
    }

    #[test]
    fn year_ago_needs_the_exact_period() {
        let short = history(&[(4, 2), (3, 1)]);
        let comparisons = period_comparisons(&short);
        assert!(comparisons.vs_previous.is_some());
        assert!(comparisons.vs_year_ago.is_none());

        let long = history(&[(4, 2), (3, 1), (8, 4)]);
        let comparisons = period_comparisons(&long);
        let year_ago = comparisons.vs_year_ago.unwrap();
        assert_eq!(year_ago.current_label, "2024-2");
        assert_eq!(year_ago.previous_label, "2023-2");
        assert_eq!(year_ago.verdict, ComparisonVerdict::Declined);
    }

    #[test]
    fn best_vs_worst_spans_the_history() {
        let h = history(&[(4, 2), (9, 1), (2, 2)]);
        let best_vs_worst = period_comparisons(&h).best_vs_worst.unwrap();
        assert_eq!(best_vs_worst.current_label, "2024-1");
        assert_eq!(best_vs_worst.previous_label, "2023-2");
        assert_eq!(best_vs_worst.count_change, 350.0);
    }

    #[test]
    fn short_histories_yield_nothing() {
        assert_eq!(period_comparisons(&[]), PeriodComparisons::default());
        let single = period_comparisons(&history(&[(3, 1)]));
        assert!(single.vs_previous.is_none());
        assert!(single.best_vs_worst.is_none());
    }

    #[test]
    fn flat_history_has_no_best_vs_worst() {
        let flat = period_comparisons(&history(&[(0, 0), (0, 0), (0, 0)]));
        assert!(flat.best_vs_worst.is_none());
        assert!(flat.vs_previous.is_some());
        let flat = period_comparisons(&history(&[(5, 1), (5, 3)]));
        assert!(flat.best_vs_worst.is_none());
    }
}
