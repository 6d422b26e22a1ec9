use miette::Diagnostic;
use thiserror::Error;

use crate::{CompletionRequest, CompletionResponse, JEDI_ROUTE};

/// Ask the proxy, wait no longer than this by default.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw HTTP response as seen by a transport: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Something that can POST JSON to the proxy. The browser uses `gloo-net`,
/// the CLI uses `reqwest`.
#[async_trait::async_trait(?Send)]
pub trait ClientTransport {
    type Error: std::fmt::Display;

    async fn post_json(
        &self,
        route: &str,
        body: serde_json::Value,
    ) -> Result<RawResponse, Self::Error>;
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Could not reach the Jedi Council: {0}")]
    #[diagnostic(help("Check that the proxy is running and try again"))]
    Network(String),
    #[error("The Jedi Master did not answer within {0} seconds")]
    Timeout(u64),
    #[error("The Jedi Master's answer was missing a reply")]
    MalformedResponse(String),
    #[error("{error}")]
    Api {
        status: u16,
        error: String,
        details: Option<serde_json::Value>,
    },
}

impl ClientError {
    /// Human readable details to show under the error message, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            ClientError::Network(_) | ClientError::Timeout(_) => None,
            ClientError::MalformedResponse(body) => Some(body.clone()),
            ClientError::Api { details, .. } => details.as_ref().map(|d| match d {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

/// Turns a proxy response into the reply text or a [`ClientError`].
pub fn interpret_response(response: RawResponse) -> Result<String, ClientError> {
    let parsed = serde_json::from_str::<CompletionResponse>(&response.body);

    if (200..300).contains(&response.status) {
        return match parsed {
            Ok(CompletionResponse::Reply { reply }) => Ok(reply),
            _ => Err(ClientError::MalformedResponse(response.body)),
        };
    }

    match parsed {
        Ok(CompletionResponse::Error { error, details }) => Err(ClientError::Api {
            status: response.status,
            error,
            details,
        }),
        _ => Err(ClientError::Api {
            status: response.status,
            error: format!("The proxy answered with HTTP {}", response.status),
            details: (!response.body.is_empty())
                .then(|| serde_json::Value::String(response.body)),
        }),
    }
}

/// Sends `prompt` to the proxy over `transport`. Timeouts are the caller's
/// concern since they depend on the runtime.
pub async fn ask<T: ClientTransport + ?Sized>(
    transport: &T,
    prompt: &str,
) -> Result<String, ClientError> {
    let body = serde_json::to_value(CompletionRequest::new(prompt))
        .map_err(|e| ClientError::Network(e.to_string()))?;

    let response = transport
        .post_json(JEDI_ROUTE, body)
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    interpret_response(response)
}
