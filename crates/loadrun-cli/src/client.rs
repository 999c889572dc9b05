// HTTP client wrapper for the metrics service API

use async_trait::async_trait;
use loadrun_core::{
    AggregateQuery, AggregateQueryResult, Check, HttpUrlStat, MetricDescriptor, MetricsSource,
    SummaryError, TestRun, TestRunSummary, Threshold,
};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ClientConfig;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found")]
    NotFound,
}

impl From<ClientError> for SummaryError {
    fn from(err: ClientError) -> Self {
        SummaryError::remote(err.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

pub struct Client {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
            http,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(path).send().await?;
        self.handle_response(response).await
    }

    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ClientError> {
        let response = self.request(path).query(query).send().await?;
        self.handle_response(response).await
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");

        let request = self.http.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }

    // Test runs

    pub async fn test_run(&self, test_run_id: u64) -> Result<TestRun, ClientError> {
        self.get(&format!("/v1/test-runs/{}", test_run_id)).await
    }

    pub async fn test_runs(&self, test_id: u64) -> Result<Vec<TestRun>, ClientError> {
        self.list(&format!("/v1/tests/{}/test-runs", test_id)).await
    }

    pub async fn test_run_summary(&self, test_run_id: u64) -> Result<TestRunSummary, ClientError> {
        self.get(&format!("/v1/test-runs/{}/summary", test_run_id))
            .await
    }

    pub async fn thresholds(&self, test_run_id: u64) -> Result<Vec<Threshold>, ClientError> {
        self.list(&format!("/v1/test-runs/{}/thresholds", test_run_id))
            .await
    }

    pub async fn checks(&self, test_run_id: u64) -> Result<Vec<Check>, ClientError> {
        self.list(&format!("/v1/test-runs/{}/checks", test_run_id))
            .await
    }

    pub async fn http_urls(&self, test_run_id: u64) -> Result<Vec<HttpUrlStat>, ClientError> {
        self.list(&format!("/v1/test-runs/{}/http-urls", test_run_id))
            .await
    }

    // Metrics

    pub async fn metrics(&self, test_run_id: u64) -> Result<Vec<MetricDescriptor>, ClientError> {
        self.list(&format!("/v1/test-runs/{}/metrics", test_run_id))
            .await
    }

    pub async fn aggregate(
        &self,
        test_run_id: u64,
        query: &AggregateQuery,
    ) -> Result<AggregateQueryResult, ClientError> {
        self.get_with_query(&format!("/v1/test-runs/{}/aggregate", test_run_id), query)
            .await
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        let response: ListResponse<T> = self.get(path).await?;
        Ok(response.data)
    }
}

#[async_trait]
impl MetricsSource for Client {
    async fn fetch_test_run(&self, test_run_id: u64) -> loadrun_core::Result<TestRun> {
        Ok(self.test_run(test_run_id).await?)
    }

    async fn fetch_test_run_summary(
        &self,
        test_run_id: u64,
    ) -> loadrun_core::Result<TestRunSummary> {
        Ok(self.test_run_summary(test_run_id).await?)
    }

    async fn fetch_metrics(&self, test_run_id: u64) -> loadrun_core::Result<Vec<MetricDescriptor>> {
        Ok(self.metrics(test_run_id).await?)
    }

    async fn fetch_aggregate(
        &self,
        test_run_id: u64,
        query: &AggregateQuery,
    ) -> loadrun_core::Result<AggregateQueryResult> {
        Ok(self.aggregate(test_run_id, query).await?)
    }

    async fn fetch_thresholds(&self, test_run_id: u64) -> loadrun_core::Result<Vec<Threshold>> {
        Ok(self.thresholds(test_run_id).await?)
    }

    async fn fetch_checks(&self, test_run_id: u64) -> loadrun_core::Result<Vec<Check>> {
        Ok(self.checks(test_run_id).await?)
    }

    async fn fetch_http_url_stats(&self, test_run_id: u64) -> loadrun_core::Result<Vec<HttpUrlStat>> {
        Ok(self.http_urls(test_run_id).await?)
    }
}
