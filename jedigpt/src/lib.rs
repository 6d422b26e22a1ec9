use tracing::{info, warn};

pub use crate::aoai::completion::{ChatCompletionRequest, ChatCompletionResponse, Message};
pub use crate::aoai::{Client, Config, ConfigError, UpstreamError};
pub use crate::proxy::{ask_with_timeout, ProxyClient};

pub mod aoai;
mod proxy;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

pub const SYSTEM_INSTRUCTION: &str =
    "You are a wise Jedi Master. Respond with Star Wars lore and wisdom.";

/// Asks the upstream deployment for a single reply to `prompt`.
pub async fn ask_jedi(client: &Client, prompt: &str) -> Result<String, UpstreamError> {
    let request = ChatCompletionRequest::jedi(prompt, client.config());

    let response = match client.chat_completion(&request).await {
        Ok(response) => response,
        Err(UpstreamError::Status { status, body }) => {
            warn!(status, %body, "Completion API returned an error");
            return Err(UpstreamError::Status { status, body });
        }
        Err(e) => return Err(e),
    };

    let reply = response.first_reply().ok_or(UpstreamError::NoReply)?;
    info!(reply_len = reply.len(), "Received reply");

    Ok(reply)
}
