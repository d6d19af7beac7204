//! [SolarEdge monitoring](https://monitoring.solaredge.com) client.

mod response;

use std::{ops::RangeInclusive, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use http::{HeaderMap, HeaderValue, header};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use self::response::{MeasurementsResponse, PowerFlowResponse};
use crate::{
    core::{
        monitoring::{EnergySummary, Monitoring, SummaryError},
        power_flow::PowerFlowSnapshot,
    },
    prelude::*,
};

pub struct Api {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl Api {
    pub const DEFAULT_BASE_URL: &'static str = "https://monitoringapi.solaredge.com/";

    pub fn new(api_key: String, base_url: Url) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.append(header::ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent("solaredge-meter")
            .timeout(Duration::from_secs(15))
            .default_headers(headers)
            .build()?;
        Ok(Self { client, base_url, api_key })
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(path = path))]
    async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R, SummaryError> {
        let url = self.base_url.join(path).with_context(|| format!("invalid path `{path}`"))?;
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .with_context(|| format!("failed to call `{path}`"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(path, status, body));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read `{path}` response"))?;
        debug!(%body, "call succeeded");
        Ok(serde_json::from_str(&body)
            .with_context(|| format!("failed to deserialize `{path}` response"))?)
    }

    fn classify_failure(path: &str, status: StatusCode, body: String) -> SummaryError {
        if body.contains("INVALID_ARGUMENTS") {
            SummaryError::InvalidArguments(body)
        } else {
            SummaryError::Other(anyhow!("`{path}` failed with {status}: {body}"))
        }
    }
}

#[async_trait]
impl Monitoring for Api {
    #[instrument(skip_all, fields(site_id = site_id))]
    async fn get_power_flow(&self, site_id: &str) -> Result<PowerFlowSnapshot> {
        info!("fetching the power flow…");
        Ok(self
            .get::<PowerFlowResponse>(&format!("site/{site_id}/powerflow"), &[])
            .await
            .context("failed to get the power flow")?
            .into())
    }

    #[instrument(skip_all, fields(site_id = site_id, start = %dates.start(), end = %dates.end()))]
    async fn get_energy_summary(
        &self,
        site_id: &str,
        dates: RangeInclusive<NaiveDate>,
    ) -> Result<Option<EnergySummary>, SummaryError> {
        info!("fetching the measurements…");
        let start_date = dates.start().format("%Y-%m-%d").to_string();
        let end_date = dates.end().format("%Y-%m-%d").to_string();
        let response: MeasurementsResponse = self
            .get(
                &format!("site/{site_id}/measurements"),
                &[("startDate", start_date.as_str()), ("endDate", end_date.as_str())],
            )
            .await?;
        Ok(response.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_failure() {
        // language=json
        let body = r#"{"String":"Invalid arguments","code":"INVALID_ARGUMENTS"}"#;
        let error = Api::classify_failure("site/1/measurements", StatusCode::BAD_REQUEST, body.into());
        assert!(matches!(error, SummaryError::InvalidArguments(_)));
    }

    #[test]
    fn test_other_failure() {
        let error = Api::classify_failure(
            "site/1/measurements",
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests".into(),
        );
        match error {
            SummaryError::Other(error) => assert!(error.to_string().contains("429")),
            SummaryError::InvalidArguments(_) => panic!("must not be treated as «no data»"),
        }
    }

    #[test]
    fn test_base_url_join() -> Result {
        let base_url = Url::parse(Api::DEFAULT_BASE_URL)?;
        assert_eq!(
            base_url.join("site/42/powerflow")?.as_str(),
            "https://monitoringapi.solaredge.com/site/42/powerflow",
        );
        Ok(())
    }
}
