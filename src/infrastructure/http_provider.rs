// HTTP variable provider implementation
use crate::application::variable_provider::VariableProvider;
use crate::domain::variable::{Variable, VariableSnapshot};
use crate::infrastructure::config::endpoint;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const VARIABLES_PATH: &str = "/api/variables";
const DETECT_PATH: &str = "/api/detectVariables";

#[derive(Debug, Clone)]
pub struct HttpVariableProvider {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    count: u64,
}

impl HttpVariableProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} failed with status {}: {}", what, status, body);
        }
        Ok(response)
    }
}

#[async_trait]
impl VariableProvider for HttpVariableProvider {
    async fn fetch_snapshot(&self) -> Result<Vec<Variable>> {
        let url = endpoint(&self.base_url, VARIABLES_PATH);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to variable provider")?;

        let snapshot = Self::check(response, "Variable fetch")
            .await?
            .json::<VariableSnapshot>()
            .await
            .context("Failed to parse variable snapshot")?;

        tracing::debug!("Fetched {} variables from {}", snapshot.details.len(), url);
        Ok(snapshot.details)
    }

    async fn detect_variables(&self) -> Result<u64> {
        let url = endpoint(&self.base_url, DETECT_PATH);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .context("Failed to send detection request")?;

        let detected = Self::check(response, "Variable detection")
            .await?
            .json::<DetectResponse>()
            .await
            .context("Failed to parse detection response")?;

        Ok(detected.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let provider = HttpVariableProvider::new("http://plc:8080///", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.base_url, "http://plc:8080");
        assert_eq!(endpoint(&provider.base_url, DETECT_PATH), "http://plc:8080/api/detectVariables");
    }

    #[test]
    fn test_detect_response_parsing() {
        let parsed: DetectResponse =
            serde_json::from_str(r#"{"success": true, "variables": ["A", "B"], "count": 2}"#).unwrap();
        assert_eq!(parsed.count, 2);
    }
}
