//! In-memory conversation and the submit/reply/error state machine that both
//! the web UI and the CLI drive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transport::ClientError;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            created_at: Utc::now(),
        }
    }
}

/// What the UI shows when a request fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub message: String,
    pub details: Option<String>,
    /// The prompt that failed, offered again on retry.
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Status {
    #[default]
    Idle,
    Submitting {
        prompt: String,
    },
    Error(ErrorRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    BlankPrompt,
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Submit(String),
    Resolved(Result<String, ClientError>),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    status: Status,
    /// Bumped on every accepted submission.
    submissions: u64,
}

impl Conversation {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Changes exactly when a submission is accepted, so a UI can start one
    /// request per accepted prompt.
    pub fn submission_id(&self) -> u64 {
        self.submissions
    }

    /// The prompt currently in flight, if any.
    pub fn in_flight(&self) -> Option<&str> {
        match &self.status {
            Status::Submitting { prompt } => Some(prompt),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.status, Status::Submitting { .. })
    }

    pub fn can_send(&self) -> bool {
        !self.is_submitting()
    }

    pub fn can_clear(&self) -> bool {
        !self.messages.is_empty() && !self.is_submitting()
    }

    pub fn error(&self) -> Option<&ErrorRecord> {
        match &self.status {
            Status::Error(record) => Some(record),
            _ => None,
        }
    }

    /// Accepts a prompt from the input box. On success the prompt is already
    /// in the conversation and the caller should clear its input and send the
    /// returned text.
    pub fn submit(&mut self, input: &str) -> Result<String, Rejected> {
        if self.is_submitting() {
            return Err(Rejected::Busy);
        }
        if input.trim().is_empty() {
            return Err(Rejected::BlankPrompt);
        }

        let prompt = input.to_string();
        self.messages.push(ChatMessage::new(Role::User, prompt.clone()));
        self.status = Status::Submitting {
            prompt: prompt.clone(),
        };
        self.submissions += 1;

        Ok(prompt)
    }

    /// The prompt to put back in the input box when retrying after an error.
    pub fn retry_prompt(&self) -> Option<&str> {
        self.error().map(|record| record.prompt.as_str())
    }

    /// Re-submits the prompt that failed.
    pub fn retry(&mut self) -> Option<String> {
        let prompt = self.retry_prompt()?.to_string();
        self.submit(&prompt).ok()
    }

    /// Applies the outcome of the in-flight request. Ignored when nothing is
    /// in flight.
    pub fn resolve(&mut self, outcome: Result<String, ClientError>) {
        let prompt = match &mut self.status {
            Status::Submitting { prompt } => std::mem::take(prompt),
            _ => return,
        };

        self.status = match outcome {
            Ok(reply) => {
                self.messages.push(ChatMessage::new(Role::Assistant, reply));
                Status::Idle
            }
            Err(err) => Status::Error(ErrorRecord {
                message: err.to_string(),
                details: err.details(),
                prompt,
            }),
        };
    }

    /// Drops every message and any error. Returns false when there was
    /// nothing to clear or a request is in flight.
    pub fn clear(&mut self) -> bool {
        if !self.can_clear() {
            return false;
        }

        self.messages.clear();
        self.status = Status::Idle;
        true
    }

    /// Applies `event`, returning the prompt to send when a submission was
    /// accepted.
    pub fn apply(&mut self, event: ChatEvent) -> Option<String> {
        match event {
            ChatEvent::Submit(input) => self.submit(&input).ok(),
            ChatEvent::Resolved(outcome) => {
                self.resolve(outcome);
                None
            }
            ChatEvent::Clear => {
                self.clear();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(conversation: &Conversation) -> Vec<(Role, &str)> {
        conversation
            .messages()
            .iter()
            .map(|m| (m.role, m.text.as_str()))
            .collect()
    }

    #[test]
    fn submit_appends_user_message_before_reply() {
        let mut conversation = Conversation::default();

        let prompt = conversation.submit("Hello").unwrap();

        assert_eq!(prompt, "Hello");
        assert_eq!(texts(&conversation), vec![(Role::User, "Hello")]);
        assert_eq!(
            conversation.status(),
            &Status::Submitting {
                prompt: "Hello".to_string()
            }
        );
        assert!(!conversation.can_send());
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut conversation = Conversation::default();

        assert_eq!(conversation.submit("   \n"), Err(Rejected::BlankPrompt));
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.status(), &Status::Idle);
    }

    #[test]
    fn second_submit_while_in_flight_is_refused() {
        let mut conversation = Conversation::default();
        conversation.submit("Hello").unwrap();

        assert_eq!(conversation.submit("Again"), Err(Rejected::Busy));
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn reply_appends_one_assistant_message_and_goes_idle() {
        let mut conversation = Conversation::default();
        conversation.submit("Hello").unwrap();

        conversation.resolve(Ok("Patience you must have.".to_string()));

        assert_eq!(
            texts(&conversation),
            vec![
                (Role::User, "Hello"),
                (Role::Assistant, "Patience you must have.")
            ]
        );
        assert_eq!(conversation.status(), &Status::Idle);
        assert!(conversation.can_send());
    }

    #[test]
    fn timeout_keeps_user_message_and_offers_retry() {
        let mut conversation = Conversation::default();
        conversation.submit("Hello").unwrap();

        conversation.resolve(Err(ClientError::Timeout(30)));

        assert_eq!(texts(&conversation), vec![(Role::User, "Hello")]);
        let record = conversation.error().unwrap();
        assert_eq!(record.message, "The Jedi Master did not answer within 30 seconds");
        assert_eq!(conversation.retry_prompt(), Some("Hello"));

        let resent = conversation.retry().unwrap();
        assert_eq!(resent, "Hello");
        assert!(conversation.is_submitting());
        assert_eq!(conversation.error(), None);
        assert_eq!(
            texts(&conversation),
            vec![(Role::User, "Hello"), (Role::User, "Hello")]
        );
    }

    #[test]
    fn rejected_call_carries_details() {
        let mut conversation = Conversation::default();
        conversation.submit("Hello").unwrap();

        conversation.resolve(Err(ClientError::Api {
            status: 500,
            error: "Error calling AOAI".to_string(),
            details: Some(serde_json::Value::String("Access denied".to_string())),
        }));

        let record = conversation.error().unwrap();
        assert_eq!(record.message, "Error calling AOAI");
        assert_eq!(record.details.as_deref(), Some("Access denied"));
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn resolve_without_request_is_ignored() {
        let mut conversation = Conversation::default();

        conversation.resolve(Ok("stray".to_string()));

        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.status(), &Status::Idle);
    }

    #[test]
    fn stray_resolve_keeps_error() {
        let mut conversation = Conversation::default();
        conversation.submit("Hello").unwrap();
        conversation.resolve(Err(ClientError::Timeout(30)));

        conversation.resolve(Ok("late".to_string()));

        assert!(conversation.error().is_some());
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn clearing_empty_conversation_is_noop() {
        let mut conversation = Conversation::default();

        assert!(!conversation.clear());
        assert_eq!(conversation, Conversation::default());
    }

    #[test]
    fn clear_removes_messages_and_error() {
        let mut conversation = Conversation::default();
        conversation.submit("Hello").unwrap();
        conversation.resolve(Err(ClientError::Network("offline".to_string())));

        assert!(conversation.clear());

        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.status(), &Status::Idle);
    }

    #[test]
    fn clear_is_refused_while_in_flight() {
        let mut conversation = Conversation::default();
        conversation.submit("Hello").unwrap();

        assert!(!conversation.clear());
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn only_accepted_submissions_are_sent() {
        let mut conversation = Conversation::default();
        let before = conversation.submission_id();

        let sent = conversation.apply(ChatEvent::Submit("Hello".to_string()));
        assert_eq!(sent.as_deref(), Some("Hello"));
        assert_eq!(conversation.in_flight(), Some("Hello"));
        let accepted = conversation.submission_id();
        assert_ne!(accepted, before);

        let refused = conversation.apply(ChatEvent::Submit("Again".to_string()));
        assert_eq!(refused, None);
        assert_eq!(conversation.submission_id(), accepted);
        assert_eq!(conversation.in_flight(), Some("Hello"));
        assert_eq!(conversation.messages().len(), 1);

        let blank = {
            let mut idle = Conversation::default();
            idle.apply(ChatEvent::Submit("  ".to_string()))
        };
        assert_eq!(blank, None);
    }

    #[test]
    fn events_drive_the_same_transitions() {
        let mut conversation = Conversation::default();

        conversation.apply(ChatEvent::Submit("Hello".to_string()));
        conversation.apply(ChatEvent::Resolved(Ok("Hmm.".to_string())));
        assert_eq!(conversation.messages().len(), 2);

        conversation.apply(ChatEvent::Clear);
        assert!(conversation.messages().is_empty());
    }
}
