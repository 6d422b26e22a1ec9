use std::time::Duration;

use miette::{IntoDiagnostic, Result, WrapErr};
use shared::transport::{ask, ClientError, ClientTransport, RawResponse};

use crate::APP_USER_AGENT;

/// Talks to a running proxy over HTTP.
#[derive(Clone, Debug)]
pub struct ProxyClient {
    base_url: String,
    http: reqwest::Client,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .into_diagnostic()
            .wrap_err("Could not build reqwest client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait::async_trait(?Send)]
impl ClientTransport for ProxyClient {
    type Error = reqwest::Error;

    async fn post_json(
        &self,
        route: &str,
        body: serde_json::Value,
    ) -> Result<RawResponse, Self::Error> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, route))
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}

/// Asks the proxy, giving up after `timeout_secs`.
pub async fn ask_with_timeout(
    client: &ProxyClient,
    prompt: &str,
    timeout_secs: u64,
) -> Result<String, ClientError> {
    match tokio::time::timeout(Duration::from_secs(timeout_secs), ask(client, prompt)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ClientError::Timeout(timeout_secs)),
    }
}
