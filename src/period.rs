use std::fmt;

use chrono::Datelike;
use serde::Serialize;

/// An academic term: one of the two six-month halves of a calendar year.
///
/// Ordered by `(year, half)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AcademicPeriod {
    year: i32,
    half: u8,
}

impl AcademicPeriod {
    /// Returns `None` unless `half` is 1 or 2.
    pub fn new(year: i32, half: u8) -> Option<Self> {
        matches!(half, 1 | 2).then_some(Self { year, half })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn half(&self) -> u8 {
        self.half
    }

    pub fn label(&self) -> String {
        period_label(self)
    }

    pub fn previous(&self) -> Self {
        match self.half {
            2 => Self {
                year: self.year,
                half: 1,
            },
            _ => Self {
                year: self.year - 1,
                half: 2,
            },
        }
    }

    pub fn same_half_prior_year(&self) -> Self {
        Self {
            year: self.year - 1,
            half: self.half,
        }
    }
}

impl fmt::Display for AcademicPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.half)
    }
}

/// Months 1-6 fall in half 1, months 7-12 in half 2.
pub fn period_of<D: Datelike>(timestamp: &D) -> AcademicPeriod {
    AcademicPeriod {
        year: timestamp.year(),
        half: if timestamp.month() <= 6 { 1 } else { 2 },
    }
}

pub fn period_label(period: &AcademicPeriod) -> String {
    period.to_string()
}

/// `count` periods ending at `current`, newest first.
pub fn walk_back(current: AcademicPeriod, count: usize) -> Vec<AcademicPeriod> {
    std::iter::successors(Some(current), |p| Some(p.previous()))
        .take(count)
        .collect()
}
