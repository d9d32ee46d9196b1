//! Chat sessions
//!
//! A [`ChatSession`] is the transcript of one conversation. It is owned by
//! whichever shell is running (terminal or web) and handed to each turn by
//! `&mut`, so there is no global state.

use crate::error::AnswerError;
use crate::features::FEATURE_NAMES;
use crate::model::Classifier;
use crate::respond::generate_answer;
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Assistant => write!(f, "assistant"),
            Role::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Local>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Local::now(),
        }
    }
}

/// First message of every session
pub fn greeting() -> String {
    format!(
        "Please send me the following data to check for diabetes: {}",
        FEATURE_NAMES.join(", ")
    )
}

/// Append-only transcript of one conversation
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Start a session with the assistant's greeting
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, greeting())],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record the user's message and reply to it
    ///
    /// A bad turn never ends the session: input errors are explained to the
    /// user, model errors get a generic apology and go to the log.
    pub fn handle_turn<C: Classifier + ?Sized>(&mut self, text: &str, model: &C) -> &ChatMessage {
        self.messages.push(ChatMessage::new(Role::User, text));

        let reply = match generate_answer(text, model) {
            Ok(answer) => answer,
            Err(e) => {
                match &e {
                    AnswerError::Parse(err) => {
                        tracing::debug!(input = text, error = %err, "unparseable chat input")
                    }
                    AnswerError::Prediction(err) => tracing::error!(error = %err, "prediction failed"),
                }
                e.user_message()
            }
        };

        self.messages.push(ChatMessage::new(Role::Assistant, reply));
        &self.messages[self.messages.len() - 1]
    }
}
