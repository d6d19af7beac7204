use std::{collections::BTreeMap, sync::Arc, time::Duration};

use bon::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio::{task::JoinHandle, time::sleep};

use crate::{
    core::{
        monitoring::{EnergySummary, Monitoring, SummaryError, calendar_year},
        outputs::{Capability, Outputs},
        run_token::RunToken,
    },
    prelude::*,
    quantity::energy::{KilowattHours, WattHours},
    store::Store,
};

/// Outcome of fetching a closed calendar year.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum YearRecord {
    Computed { imported: WattHours, exported: WattHours },

    /// No data for the year, and hence for any earlier year.
    Missing,

    /// The fetch failed and has to be retried.
    Error,
}

impl YearRecord {
    pub fn key(year: i32) -> String {
        format!("measurements-{year}")
    }
}

impl From<EnergySummary> for YearRecord {
    fn from(summary: EnergySummary) -> Self {
        Self::Computed { imported: summary.imported, exported: summary.exported }
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CumulativeTotals {
    pub imported: WattHours,
    pub exported: WattHours,
}

impl From<EnergySummary> for CumulativeTotals {
    fn from(summary: EnergySummary) -> Self {
        Self { imported: summary.imported, exported: summary.exported }
    }
}

impl CumulativeTotals {
    pub async fn publish(&self, outputs: &dyn Outputs) {
        info!(imported = %self.imported, exported = %self.exported, "publishing the totals…");
        outputs
            .set_value_or_log(Capability::ImportedEnergy, KilowattHours::from(self.imported).0)
            .await;
        outputs
            .set_value_or_log(Capability::ExportedEnergy, KilowattHours::from(self.exported).0)
            .await;
    }
}

/// Lifetime imported and exported energy, built from per-year records.
///
/// Closed years are cached in the [`Store`] forever once they are known.
/// The current year is always fetched live.
#[derive(Clone, Builder)]
pub struct YearlyTotals {
    #[builder(into)]
    site_id: Arc<str>,

    monitoring: Arc<dyn Monitoring>,
    store: Arc<dyn Store>,
    outputs: Arc<dyn Outputs>,

    /// Pause before each historical fetch, the API is rate-limited.
    #[builder(default = Duration::from_secs(1))]
    throttle: Duration,

    /// The backward walk never goes below this year.
    #[builder(default = 2000)]
    earliest_year: i32,

    #[builder(default)]
    token: RunToken,
}

impl YearlyTotals {
    /// Start a background run unless one is already in flight.
    pub fn trigger(&self, current_year: i32) -> Option<JoinHandle<()>> {
        let Some(guard) = self.token.try_acquire() else {
            debug!("the totals are still being accumulated");
            return None;
        };
        let this = self.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            if let Err(error) = this.run(current_year).await {
                error!("failed to fetch the totals: {error:#}");
            }
        }))
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.token.is_held()
    }

    /// Accumulate and publish the totals.
    pub async fn run(&self, current_year: i32) -> Result<CumulativeTotals> {
        let totals = self.accumulate(current_year).await?;
        totals.publish(self.outputs.as_ref()).await;
        Ok(totals)
    }

    #[instrument(skip_all, fields(site_id = %self.site_id, current_year = current_year))]
    pub async fn accumulate(&self, current_year: i32) -> Result<CumulativeTotals> {
        let mut records = BTreeMap::new();
        for year in (self.earliest_year..current_year).rev() {
            let record = self.resolve_year(year).await?;
            records.insert(year, record);
            if record == YearRecord::Missing {
                break;
            }
        }

        let mut totals = self.fetch_current_year(current_year).await?;
        let mut failed_years = Vec::new();
        for (year, record) in records {
            match record {
                YearRecord::Computed { imported, exported } => {
                    totals.imported += imported;
                    totals.exported += exported;
                }
                YearRecord::Missing => {}
                YearRecord::Error => failed_years.push(year),
            }
        }
        if !failed_years.is_empty() {
            bail!("missing data for {}", failed_years.iter().join(", "));
        }

        info!(imported = %totals.imported, exported = %totals.exported, "accumulated");
        Ok(totals)
    }

    /// Get the year's record from the cache, or fetch and cache it.
    #[instrument(skip_all, fields(year = year))]
    async fn resolve_year(&self, year: i32) -> Result<YearRecord> {
        let key = YearRecord::key(year);
        let cached = self
            .store
            .get(&key)
            .await
            .with_context(|| format!("failed to read `{key}`"))?
            .and_then(|value| {
                serde_json::from_value::<YearRecord>(value)
                    .inspect_err(|error| warn!("ignoring the malformed record: {error:#}"))
                    .ok()
            });
        match cached {
            Some(record @ (YearRecord::Computed { .. } | YearRecord::Missing)) => {
                debug!(?record, "cached");
                return Ok(record);
            }
            Some(YearRecord::Error) => info!("retrying…"),
            None => {}
        }

        info!("fetching measurements…");
        sleep(self.throttle).await;
        let record =
            match self.monitoring.get_energy_summary(&self.site_id, calendar_year(year)?).await {
                Ok(Some(summary)) => YearRecord::from(summary),
                Ok(None) => {
                    info!("empty summary, no more data");
                    YearRecord::Missing
                }
                Err(SummaryError::InvalidArguments(message)) => {
                    info!(%message, "no more data");
                    YearRecord::Missing
                }
                Err(SummaryError::Other(error)) => {
                    error!("failed to fetch the measurements: {error:#}");
                    YearRecord::Error
                }
            };

        self.store
            .set(&key, serde_json::to_value(record)?)
            .await
            .with_context(|| format!("failed to save `{key}`"))?;
        Ok(record)
    }

    async fn fetch_current_year(&self, year: i32) -> Result<CumulativeTotals> {
        info!(year, "fetching the current year…");
        let summary = self
            .monitoring
            .get_energy_summary(&self.site_id, calendar_year(year)?)
            .await
            .with_context(|| format!("failed to fetch the current year {year}"))?
            .with_context(|| format!("empty summary for the current year {year}"))?;
        Ok(summary.into())
    }
}
