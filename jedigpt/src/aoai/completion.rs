use serde::{Deserialize, Serialize};

use super::Config;
use crate::SYSTEM_INSTRUCTION;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatCompletionRequest {
    /// The system instruction followed by the user's prompt, verbatim.
    pub fn jedi(prompt: &str, config: &Config) -> Self {
        Self {
            messages: vec![Message::system(SYSTEM_INSTRUCTION), Message::user(prompt)],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CompletionChoice {
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: Option<i64>,
    pub message: ChoiceMessage,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CompletionUsage {
    pub completion_tokens: i64,
    pub prompt_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
}

impl ChatCompletionResponse {
    pub fn first_reply(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::aoai::tests::config_for;

    #[test]
    fn request_carries_exactly_system_and_prompt() {
        let config = config_for("https://example.openai.azure.com");

        let request = ChatCompletionRequest::jedi("What is the Force?", &config);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [
                    { "role": "system", "content": SYSTEM_INSTRUCTION },
                    { "role": "user", "content": "What is the Force?" }
                ]
            })
        );
    }

    #[test]
    fn tuning_values_are_sent_when_configured() {
        let mut config = config_for("https://example.openai.azure.com");
        config.max_tokens = Some(500);
        config.temperature = Some(0.5);

        let body = serde_json::to_value(ChatCompletionRequest::jedi("Hi", &config)).unwrap();

        assert_eq!(body["max_tokens"], json!(500));
        assert_eq!(body["temperature"], json!(0.5));
    }

    #[test]
    fn first_reply_takes_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "finish_reason": "stop", "message": { "role": "assistant", "content": "Do or do not." } },
                { "index": 1, "finish_reason": "stop", "message": { "role": "assistant", "content": "There is no try." } }
            ]
        }))
        .unwrap();

        assert_eq!(response.first_reply().as_deref(), Some("Do or do not."));
    }

    #[test]
    fn no_choices_means_no_reply() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();

        assert_eq!(response.first_reply(), None);
    }
}
