//! HTTP client for the ingestion RPC endpoint.
//!
//! Speaks the PostgREST RPC convention: one POST per business to
//! `/rest/v1/rpc/<name>` with the service key in both the `apikey`
//! header and a bearer token. Failures surface the endpoint's own
//! status and body so a rejected payload can be diagnosed without
//! replaying the call.

use std::time::Duration;

use localserv_core::RpcConfig;
use reqwest::Client;

use crate::error::IngestError;
use crate::payload::BusinessPayload;

pub struct RpcClient {
    client: Client,
    base_url: String,
    service_key: String,
    rpc_name: String,
}

impl RpcClient {
    /// Builds a client from resolved credentials.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &RpcConfig, timeout_secs: u64) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("localserv/0.1 (ingest)")
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            rpc_name: config.rpc_name.clone(),
        })
    }

    #[must_use]
    pub fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.rpc_name)
    }

    /// Relays one business payload, wrapped as `{"p_payload": ...}` per
    /// the endpoint's single-argument convention.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Http`] on network failure or timeout.
    /// - [`IngestError::Api`] on any non-2xx response, carrying the
    ///   response body.
    pub async fn relay(&self, payload: &BusinessPayload) -> Result<(), IngestError> {
        let url = self.rpc_url();
        let body = serde_json::json!({ "p_payload": payload });

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Api {
                rpc_name: self.rpc_name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(url, business = %payload.business_name, "payload relayed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
