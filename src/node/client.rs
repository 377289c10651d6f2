use super::models::{
    AccountApplicationInformation, AccountAssetInformation, Application, Asset,
    CompileResponse, ErrorResponse, PendingTransactionResponse, SubmitResponse,
    SuggestedParamsResponse,
};
use super::NodeApi;
use crate::config::SdkConfig;
use crate::metrics::SdkMetrics;
use crate::transaction::{Address, NetworkParameters};
use crate::transport::{RetryConfig, RetryingTransport, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Request payload for the node
#[derive(Debug, Clone)]
pub enum RequestBody {
    Binary(Vec<u8>),
    Text(String),
}

/// REST client for a node, every call routed through [`RetryingTransport`]
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    transport: RetryingTransport,
}

impl HttpNodeClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            transport: RetryingTransport::new(retry),
        })
    }

    pub fn from_config(config: &SdkConfig) -> Result<Self, TransportError> {
        Self::new(
            config.node.url.clone(),
            config.node.token.clone(),
            Duration::from_secs(config.node.timeout_secs),
            config.retry.clone(),
        )
    }

    pub fn with_metrics(mut self, metrics: Arc<SdkMetrics>) -> Self {
        self.transport = self.transport.with_metrics(metrics);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One attempt. Non-2xx statuses become [`TransportError::Status`] with
    /// the node's error message when it sent one.
    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&RequestBody>,
    ) -> Result<reqwest::Response, TransportError> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }
        request = match body {
            Some(RequestBody::Binary(bytes)) => request
                .header(CONTENT_TYPE, "application/x-binary")
                .body(bytes.clone()),
            Some(RequestBody::Text(text)) => request
                .header(CONTENT_TYPE, "text/plain")
                .body(text.clone()),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e, url))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.message)
            .unwrap_or(text);
        Err(TransportError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    /// Request whose response is parsed as JSON into `T`
    pub async fn fetch_as_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<T, TransportError> {
        let url = self.url(path);
        let (url, method, body) = (&url, &method, body.as_ref());
        debug!(operation, url = %url, "Node request");

        self.transport
            .execute(operation, move || async move {
                let response = self.send_once(method, url, body).await?;
                response.json::<T>().await.map_err(|e| TransportError::Decode {
                    url: url.clone(),
                    message: e.to_string(),
                })
            })
            .await
    }

    /// Request whose response is returned as raw bytes
    pub async fn fetch_as_binary(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<Bytes, TransportError> {
        let url = self.url(path);
        let (url, method, body) = (&url, &method, body.as_ref());
        debug!(operation, url = %url, "Node request (binary)");

        self.transport
            .execute(operation, move || async move {
                let response = self.send_once(method, url, body).await?;
                response
                    .bytes()
                    .await
                    .map_err(|e| TransportError::from_reqwest(&e, url))
            })
            .await
    }

    /// Pending status in the node's compact binary encoding, undecoded
    pub async fn pending_transaction_raw(&self, tx_id: &str) -> Result<Bytes, TransportError> {
        self.fetch_as_binary(
            "pending_transaction_raw",
            Method::GET,
            &format!("/v2/transactions/pending/{}?format=msgpack", tx_id),
            None,
        )
        .await
    }
}

#[async_trait]
impl NodeApi for HttpNodeClient {
    async fn suggested_params(&self) -> Result<NetworkParameters, TransportError> {
        let dto: SuggestedParamsResponse = self
            .fetch_as_json("suggested_params", Method::GET, "/v2/transactions/params", None)
            .await?;
        NetworkParameters::try_from(dto)
    }

    async fn submit_raw_group(&self, group: Vec<u8>) -> Result<String, TransportError> {
        let response: SubmitResponse = self
            .fetch_as_json(
                "submit_raw_group",
                Method::POST,
                "/v2/transactions",
                Some(RequestBody::Binary(group)),
            )
            .await?;
        Ok(response.tx_id)
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransactionResponse, TransportError> {
        self.fetch_as_json(
            "pending_transaction",
            Method::GET,
            &format!("/v2/transactions/pending/{}?format=json", tx_id),
            None,
        )
        .await
    }

    async fn compile_program(&self, source: &str) -> Result<CompileResponse, TransportError> {
        self.fetch_as_json(
            "compile_program",
            Method::POST,
            "/v2/teal/compile?sourcemap=true",
            Some(RequestBody::Text(source.to_string())),
        )
        .await
    }

    async fn application_by_id(&self, app_id: u64) -> Result<Application, TransportError> {
        self.fetch_as_json(
            "application_by_id",
            Method::GET,
            &format!("/v2/applications/{}", app_id),
            None,
        )
        .await
    }

    async fn account_application_information(
        &self,
        address: &Address,
        app_id: u64,
    ) -> Result<AccountApplicationInformation, TransportError> {
        self.fetch_as_json(
            "account_application_information",
            Method::GET,
            &format!("/v2/accounts/{}/applications/{}", address, app_id),
            None,
        )
        .await
    }

    async fn asset_by_id(&self, asset_id: u64) -> Result<Asset, TransportError> {
        self.fetch_as_json(
            "asset_by_id",
            Method::GET,
            &format!("/v2/assets/{}", asset_id),
            None,
        )
        .await
    }

    async fn account_asset_information(
        &self,
        address: &Address,
        asset_id: u64,
    ) -> Result<AccountAssetInformation, TransportError> {
        self.fetch_as_json(
            "account_asset_information",
            Method::GET,
            &format!("/v2/accounts/{}/assets/{}", address, asset_id),
            None,
        )
        .await
    }
}
