use crate::aggregate::{duration_days, GroupStats};
use crate::classify::{classify, SUCCESS_VERDICT};
use crate::models::{ModalityRecord, PerformanceSummary};
use crate::stats;

const STRONG_COMPLETION: f64 = 70.0;
const TIMELY_DURATION_DAYS: f64 = 270.0;
const LOW_ABANDONMENT: f64 = 15.0;

/// Completion, success and abandonment over a flat record set, with the resulting
/// verdict and the strengths/improvement notes a report prints next to it.
pub fn analyze<'a, I>(records: I) -> PerformanceSummary
where
    I: IntoIterator<Item = &'a ModalityRecord>,
{
    let group = GroupStats::new(records.into_iter().collect());
    let total = group.count();
    let completed = group.completed();
    let failed = group.failed();
    let resolved = completed + failed;

    let completion_rate = stats::percentage(completed, total);
    let success_rate = stats::percentage(completed, resolved);
    let abandonment_rate = stats::percentage(failed, resolved);

    let durations = group.values(duration_days);
    let average_days = stats::mean(&durations);

    // Both rates have to clear a bound for its verdict.
    let verdict = classify(completion_rate.min(success_rate), &SUCCESS_VERDICT);

    let mut strengths = Vec::new();
    let mut improvement_areas = Vec::new();

    if total > 0 {
        if completion_rate >= STRONG_COMPLETION {
            strengths.push(format!("High completion rate ({completion_rate:.1}%)"));
        } else {
            improvement_areas.push(format!("Completion rate below 70% ({completion_rate:.1}%)"));
        }
    }
    if !durations.is_empty() {
        if average_days < TIMELY_DURATION_DAYS {
            strengths.push(format!("Efficient completion times ({average_days:.0} days on average)"));
        } else {
            improvement_areas.push(format!(
                "Long completion times ({average_days:.0} days on average)"
            ));
        }
    }
    if resolved > 0 {
        if abandonment_rate < LOW_ABANDONMENT {
            strengths.push(format!("Low abandonment rate ({abandonment_rate:.1}%)"));
        } else {
            improvement_areas.push(format!("High abandonment rate ({abandonment_rate:.1}%)"));
        }
    }

    PerformanceSummary {
        total,
        completed,
        failed,
        completion_rate,
        success_rate,
        abandonment_rate,
        fastest_days: group.min(duration_days),
        slowest_days: group.max(duration_days),
        average_days,
        median_days: stats::median(&durations),
        verdict,
        strengths,
        improvement_areas,
    }
}
