use serde::{Deserialize, Serialize};

pub mod chat;
pub mod transport;

pub const JEDI_ROUTE: &str = "/api/jedi";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
        }
    }

    /// The prompt, if present and not just whitespace.
    pub fn non_blank_prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.trim().is_empty())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CompletionResponse {
    Reply {
        reply: String,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
}

impl CompletionResponse {
    pub fn reply(reply: impl Into<String>) -> Self {
        Self::Reply {
            reply: reply.into(),
        }
    }

    pub fn error(error: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self::Error {
            error: error.into(),
            details,
        }
    }
}
