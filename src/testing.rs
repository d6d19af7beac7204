//! Fakes for the collaborator traits.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    ops::RangeInclusive,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::{
    core::{
        monitoring::{EnergySummary, Monitoring, SummaryError},
        outputs::{Capability, Outputs},
        power_flow::PowerFlowSnapshot,
    },
    prelude::*,
    quantity::energy::WattHours,
    store::Store,
};

#[derive(Copy, Clone)]
pub enum FakeSummary {
    Summary(EnergySummary),
    Empty,
    InvalidArguments,
    Failure,
}

impl FakeSummary {
    pub const fn ok(imported: f64, exported: f64) -> Self {
        Self::Summary(EnergySummary { imported: WattHours(imported), exported: WattHours(exported) })
    }
}

/// Monitoring API with canned responses.
///
/// Years without a canned summary are answered with «invalid arguments».
#[derive(Default)]
pub struct FakeMonitoring {
    power_flow: Option<PowerFlowSnapshot>,
    summaries: Mutex<HashMap<i32, FakeSummary>>,
    requested_years: Mutex<Vec<i32>>,
}

impl FakeMonitoring {
    pub fn with_power_flow(mut self, snapshot: PowerFlowSnapshot) -> Self {
        self.power_flow = Some(snapshot);
        self
    }

    pub fn with_summary(self, year: i32, summary: FakeSummary) -> Self {
        self.set_summary(year, summary);
        self
    }

    pub fn set_summary(&self, year: i32, summary: FakeSummary) {
        self.summaries.lock().unwrap().insert(year, summary);
    }

    /// Years of the summary requests so far, in order.
    pub fn take_requested_years(&self) -> Vec<i32> {
        std::mem::take(&mut *self.requested_years.lock().unwrap())
    }
}

#[async_trait]
impl Monitoring for FakeMonitoring {
    async fn get_power_flow(&self, _site_id: &str) -> Result<PowerFlowSnapshot> {
        self.power_flow.clone().context("power flow is unavailable")
    }

    async fn get_energy_summary(
        &self,
        _site_id: &str,
        dates: RangeInclusive<NaiveDate>,
    ) -> Result<Option<EnergySummary>, SummaryError> {
        let year = dates.start().year();
        assert_eq!(dates.end().year(), year);
        self.requested_years.lock().unwrap().push(year);
        let summary =
            self.summaries.lock().unwrap().get(&year).copied().unwrap_or(FakeSummary::InvalidArguments);
        match summary {
            FakeSummary::Summary(summary) => Ok(Some(summary)),
            FakeSummary::Empty => Ok(None),
            FakeSummary::InvalidArguments => {
                Err(SummaryError::InvalidArguments("INVALID_ARGUMENTS".to_owned()))
            }
            FakeSummary::Failure => Err(SummaryError::Other(anyhow!("service unavailable"))),
        }
    }
}

/// Outputs that remember everything published.
pub struct RecordingOutputs {
    values: Mutex<Vec<(Capability, i64)>>,
    availability: Mutex<Vec<bool>>,
    capabilities: Mutex<HashSet<Capability>>,
    failing: Option<Capability>,
}

impl Default for RecordingOutputs {
    fn default() -> Self {
        Self {
            values: Mutex::default(),
            availability: Mutex::default(),
            capabilities: Mutex::new(Capability::BASE.into_iter().collect()),
            failing: None,
        }
    }
}

impl RecordingOutputs {
    /// Fail to publish the specified capability.
    pub fn failing_on(capability: Capability) -> Self {
        Self { failing: Some(capability), ..Self::default() }
    }

    /// Last published value.
    pub fn value(&self, capability: Capability) -> Option<i64> {
        self.values
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(published, _)| *published == capability)
            .map(|(_, value)| *value)
    }

    /// Number of times the capability has been published.
    pub fn count(&self, capability: Capability) -> usize {
        self.values.lock().unwrap().iter().filter(|(published, _)| *published == capability).count()
    }

    pub fn availability(&self) -> Vec<bool> {
        self.availability.lock().unwrap().clone()
    }
}

#[async_trait]
impl Outputs for RecordingOutputs {
    async fn set_value(&self, capability: Capability, value: i64) -> Result {
        ensure!(self.failing != Some(capability), "`{capability}` is broken");
        ensure!(self.has_capability(capability), "no such capability: `{capability}`");
        self.values.lock().unwrap().push((capability, value));
        Ok(())
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.lock().unwrap().contains(&capability)
    }

    async fn add_capability(&self, capability: Capability) -> Result {
        self.capabilities.lock().unwrap().insert(capability);
        Ok(())
    }

    async fn set_available(&self, is_available: bool) -> Result {
        self.availability.lock().unwrap().push(is_available);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore(Mutex<BTreeMap<String, Value>>);

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.0.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result {
        self.0.lock().unwrap().insert(key.to_owned(), value);
        Ok(())
    }
}
