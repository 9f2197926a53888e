use serde::{Deserialize, Serialize};

use crate::classify::TrendProfile;
use crate::error::ConfigError;

/// Window sizes and trend sensitivity per report family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Periods of history in summary-style reports.
    pub summary_periods: usize,
    /// Periods of history in the historical analysis.
    pub historical_periods: usize,
    pub summary_trend: TrendProfile,
    pub historical_trend: TrendProfile,
    pub comparison_trend: TrendProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            summary_periods: 6,
            historical_periods: 8,
            summary_trend: TrendProfile::Standard,
            historical_trend: TrendProfile::Strict,
            comparison_trend: TrendProfile::Standard,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary_periods < 2 {
            return Err(ConfigError::WindowTooShort {
                field: "summary_periods",
                min: 2,
                value: self.summary_periods,
            });
        }
        if self.historical_periods < 2 {
            return Err(ConfigError::WindowTooShort {
                field: "historical_periods",
                min: 2,
                value: self.historical_periods,
            });
        }
        Ok(())
    }
}
