use std::{sync::Arc, time::Duration};

use bon::bon;
use tokio::task::JoinHandle;

use crate::{
    core::{
        monitoring::Monitoring,
        outputs::Outputs,
        power_flow::PowerFlowReadings,
        yearly_totals::YearlyTotals,
    },
    prelude::*,
    store::Store,
};

/// SolarEdge site exposed as a meter device.
pub struct Meter {
    site_id: Arc<str>,
    monitoring: Arc<dyn Monitoring>,
    outputs: Arc<dyn Outputs>,
    yearly_totals: YearlyTotals,
}

#[bon]
impl Meter {
    #[builder]
    pub fn new(
        #[builder(into)] site_id: Arc<str>,
        monitoring: Arc<dyn Monitoring>,
        store: Arc<dyn Store>,
        outputs: Arc<dyn Outputs>,
        #[builder(default = Duration::from_secs(1))] throttle: Duration,
        #[builder(default = 2000)] earliest_year: i32,
    ) -> Self {
        let yearly_totals = YearlyTotals::builder()
            .site_id(site_id.clone())
            .monitoring(monitoring.clone())
            .store(store)
            .outputs(outputs.clone())
            .throttle(throttle)
            .earliest_year(earliest_year)
            .build();
        Self { site_id, monitoring, outputs, yearly_totals }
    }
}

impl Meter {
    #[cfg(test)]
    pub const fn yearly_totals(&self) -> &YearlyTotals {
        &self.yearly_totals
    }

    /// Run a single poll cycle.
    ///
    /// The power flow readings are published before returning. The totals are accumulated
    /// in the background, and the handle is returned when a new run has been started.
    #[instrument(skip_all, fields(site_id = %self.site_id))]
    pub async fn poll(&self, current_year: i32) -> Result<Option<JoinHandle<()>>> {
        let snapshot = self
            .monitoring
            .get_power_flow(&self.site_id)
            .await
            .context("failed to fetch the power flow")?;
        PowerFlowReadings::from(&snapshot).publish(self.outputs.as_ref()).await;
        Ok(self.yearly_totals.trigger(current_year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{outputs::Capability, power_flow::PowerFlowSnapshot},
        testing::{FakeMonitoring, FakeSummary, MemoryStore, RecordingOutputs},
    };

    fn snapshot() -> Result<PowerFlowSnapshot> {
        // language=json
        Ok(serde_json::from_str(
            r#"{
                "consumption": { "currentPower": 0.8, "isActive": true },
                "grid": { "currentPower": 0.3, "status": "import" },
                "solarProduction": { "currentPower": 0.5, "isProducing": true }
            }"#,
        )?)
    }

    fn meter(monitoring: &Arc<FakeMonitoring>, outputs: &Arc<RecordingOutputs>) -> Meter {
        Meter::builder()
            .site_id("42")
            .monitoring(monitoring.clone())
            .store(Arc::new(MemoryStore::default()))
            .outputs(outputs.clone())
            .throttle(Duration::ZERO)
            .build()
    }

    #[tokio::test]
    async fn test_poll_publishes_readings_then_totals() -> Result {
        let monitoring = Arc::new(
            FakeMonitoring::default()
                .with_power_flow(snapshot()?)
                .with_summary(2025, FakeSummary::ok(12_400.0, 6_600.0))
                .with_summary(2024, FakeSummary::InvalidArguments),
        );
        let outputs = Arc::new(RecordingOutputs::default());
        let meter = meter(&monitoring, &outputs);

        let handle = meter.poll(2025).await?.context("the totals run must start")?;
        assert_eq!(outputs.value(Capability::Power), Some(800));
        assert_eq!(outputs.value(Capability::GridPower), Some(300));
        assert_eq!(outputs.value(Capability::SolarPower), Some(500));
        assert_eq!(outputs.availability(), [true]);
        assert_eq!(outputs.count(Capability::ImportedEnergy), 0);

        handle.await?;
        assert_eq!(outputs.value(Capability::ImportedEnergy), Some(12));
        assert_eq!(outputs.value(Capability::ExportedEnergy), Some(7));
        Ok(())
    }

    #[tokio::test]
    async fn test_poll_during_run_does_not_start_another() -> Result {
        let monitoring = Arc::new(
            FakeMonitoring::default()
                .with_power_flow(snapshot()?)
                .with_summary(2025, FakeSummary::ok(1_000.0, 0.0)),
        );
        let outputs = Arc::new(RecordingOutputs::default());
        let meter = meter(&monitoring, &outputs);

        let handle = meter.poll(2025).await?.context("the totals run must start")?;
        assert!(meter.poll(2025).await?.is_none());
        handle.await?;

        assert_eq!(outputs.count(Capability::Power), 2);
        assert_eq!(outputs.count(Capability::ImportedEnergy), 1);
        assert_eq!(monitoring.take_requested_years(), [2024, 2025]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_power_flow_skips_the_cycle() {
        let monitoring = Arc::new(FakeMonitoring::default());
        let outputs = Arc::new(RecordingOutputs::default());
        let meter = meter(&monitoring, &outputs);

        assert!(meter.poll(2025).await.is_err());
        assert!(!meter.yearly_totals().is_running());
        assert!(monitoring.take_requested_years().is_empty());
        assert!(outputs.availability().is_empty());
    }
}
