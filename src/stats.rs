//! Numeric helpers shared by every analyzer.
//!
//! All functions are total: empty input or a zero denominator yields 0.0.

use serde::Serializer;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `100 * part / whole`, or 0.0 when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// Signed percent change of `current` relative to `base`, or 0.0 when `base` is zero.
pub fn percent_change(current: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        100.0 * (current - base) / base
    }
}

/// Two decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub(crate) fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

pub(crate) fn serialize_rounded_opt<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round2(*v)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn median_follows_odd_even_rule() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[7.5]), 7.5);
    }

    #[test]
    fn std_dev_is_population_form() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&v) - 2.0).abs() < 1e-12);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn zero_denominators_are_neutral() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percent_change(10.0, 0.0), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn percent_change_is_signed() {
        assert_eq!(percent_change(10.0, 20.0), -50.0);
        assert_eq!(percent_change(30.0, 20.0), 50.0);
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-12.345_9), -12.35);
    }

    #[test]
    fn serialized_values_are_rounded() {
        #[derive(serde::Serialize)]
        struct Probe {
            #[serde(serialize_with = "serialize_rounded")]
            rate: f64,
            #[serde(serialize_with = "serialize_rounded_opt")]
            grade: Option<f64>,
        }
        let json = serde_json::to_string(&Probe {
            rate: 100.0 / 3.0,
            grade: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"rate":33.33,"grade":null}"#);
    }

    proptest! {
        #[test]
        fn median_of_sorted_odd_is_middle(mut v in prop::collection::vec(-1e6f64..1e6, 1..40)) {
            if v.len() % 2 == 0 {
                v.pop();
            }
            v.sort_by(|a, b| a.total_cmp(b));
            prop_assert_eq!(median(&v), v[v.len() / 2]);
        }

        #[test]
        fn percentage_stays_in_range(whole in 1usize..10_000, frac in 0.0f64..=1.0) {
            let part = (whole as f64 * frac) as usize;
            let rate = percentage(part, whole);
            prop_assert!((0.0..=100.0).contains(&rate));
        }
    }
}
