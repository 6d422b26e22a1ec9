use std::fmt;

use miette::{Diagnostic, IntoDiagnostic, Result, WrapErr};
use reqwest::header::{HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::debug;

use crate::APP_USER_AGENT;

pub mod completion;

use completion::{ChatCompletionRequest, ChatCompletionResponse};

pub const DEFAULT_API_VERSION: &str = "2024-06-01-preview";

const API_KEY_HEADER: &str = "api-key";

pub const ENDPOINT_VAR: &str = "AOAI_ENDPOINT";
pub const MODEL_NAME_VAR: &str = "AOAI_MODEL_NAME";
pub const DEPLOYMENT_VAR: &str = "AOAI_DEPLOYMENT_NAME";
pub const API_VERSION_VAR: &str = "AOAI_API_VERSION";
pub const API_KEY_VAR: &str = "AOAI_API_KEY";
pub const MAX_TOKENS_VAR: &str = "AOAI_MAX_TOKENS";
pub const TEMPERATURE_VAR: &str = "AOAI_TEMPERATURE";

#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Could not find {0} env var")]
    #[diagnostic(
        code(jedigpt::config::missing),
        help("Set AOAI_ENDPOINT, AOAI_MODEL_NAME, AOAI_DEPLOYMENT_NAME and AOAI_API_KEY, for example in a .env file")
    )]
    Missing(&'static str),
    #[error("Invalid value {value:?} for {name}")]
    #[diagnostic(code(jedigpt::config::invalid))]
    Invalid { name: &'static str, value: String },
}

/// Everything needed to talk to the upstream chat-completion deployment.
/// Built once at startup.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub endpoint: String,
    pub model_name: String,
    pub deployment: String,
    pub api_version: String,
    api_key: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("model_name", &self.model_name)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let endpoint = required(ENDPOINT_VAR)?;
        let endpoint = endpoint.strip_suffix('/').unwrap_or(&endpoint).to_string();

        Ok(Self {
            endpoint,
            model_name: required(MODEL_NAME_VAR)?,
            deployment: required(DEPLOYMENT_VAR)?,
            api_version: optional(API_VERSION_VAR)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            api_key: required(API_KEY_VAR)?,
            max_tokens: parse_optional(MAX_TOKENS_VAR, optional(MAX_TOKENS_VAR))?,
            temperature: parse_optional(TEMPERATURE_VAR, optional(TEMPERATURE_VAR))?,
        })
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    pub fn client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();

        let mut value = HeaderValue::from_str(&self.api_key)
            .into_diagnostic()
            .wrap_err("Could not create header value")?;
        value.set_sensitive(true);

        headers.insert(API_KEY_HEADER, value);

        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .build()
            .into_diagnostic()
            .wrap_err("Could not build reqwest client")?;

        Ok(Client {
            http,
            config: self.clone(),
        })
    }
}

fn parse_optional<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}

#[derive(Error, Diagnostic, Debug)]
pub enum UpstreamError {
    #[error("Could not reach the completion API: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Completion API answered with HTTP {status}")]
    Status {
        status: u16,
        body: serde_json::Value,
    },
    #[error("Could not parse the completion API response: {source}")]
    MalformedBody {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("Completion API returned no message")]
    NoReply,
}

impl UpstreamError {
    /// Best-effort detail to hand back to the caller: the upstream body when
    /// there is one, the error message otherwise.
    pub fn details(&self) -> serde_json::Value {
        match self {
            UpstreamError::Status { body, .. } => body.clone(),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Client {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, UpstreamError> {
        let url = self.config.completions_url();
        debug!(%url, "Calling completion API");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(UpstreamError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(UpstreamError::Network)?;

        if !status.is_success() {
            let body = serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body));
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<ChatCompletionResponse>(&body)
            .map_err(|source| UpstreamError::MalformedBody { source, body })
    }
}
