use std::ops::RangeInclusive;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{core::power_flow::PowerFlowSnapshot, prelude::*, quantity::energy::WattHours};

/// Site monitoring API as seen by the meter.
#[async_trait]
pub trait Monitoring: Send + Sync {
    async fn get_power_flow(&self, site_id: &str) -> Result<PowerFlowSnapshot>;

    /// Get the energy summary over the inclusive date range.
    ///
    /// Returns [`None`] when the API responded with an empty summary.
    async fn get_energy_summary(
        &self,
        site_id: &str,
        dates: RangeInclusive<NaiveDate>,
    ) -> Result<Option<EnergySummary>, SummaryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// The API refused the date range, which is how it reports that there is no data.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Other(#[from] Error),
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct EnergySummary {
    #[serde(rename = "import")]
    pub imported: WattHours,

    #[serde(rename = "export")]
    pub exported: WattHours,
}

/// Whole calendar year as an inclusive date range.
pub fn calendar_year(year: i32) -> Result<RangeInclusive<NaiveDate>> {
    let start =
        NaiveDate::from_ymd_opt(year, 1, 1).with_context(|| format!("invalid year {year}"))?;
    let end =
        NaiveDate::from_ymd_opt(year, 12, 31).with_context(|| format!("invalid year {year}"))?;
    Ok(start..=end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_year() -> Result {
        let dates = calendar_year(2024)?;
        assert_eq!(dates.start().to_string(), "2024-01-01");
        assert_eq!(dates.end().to_string(), "2024-12-31");
        Ok(())
    }
}
