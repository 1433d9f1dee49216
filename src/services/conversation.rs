//! Multi-turn chat session used by the interactive terminal mode
//!
//! The history always starts with the system message. A turn is recorded only
//! when the model answers; a failed call leaves the history as it was.

use crate::constants::{LONG_CONVERSATION_TURNS, QUIT_COMMANDS, RESET_COMMANDS};
use crate::error::Error;
use crate::services::llm_client::{ChatMessage, LlmClient};
use tracing::debug;

/// One line typed by the user, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    Reset,
    Empty,
    Message(String),
}

pub fn parse_input(line: &str) -> Input {
    let text = line.trim();
    let lowered = text.to_lowercase();

    if text.is_empty() {
        Input::Empty
    } else if QUIT_COMMANDS.contains(&lowered.as_str()) {
        Input::Quit
    } else if RESET_COMMANDS.contains(&lowered.as_str()) {
        Input::Reset
    } else {
        Input::Message(text.to_string())
    }
}

pub struct Conversation {
    system: String,
    history: Vec<ChatMessage>,
    turns: usize,
}

impl Conversation {
    pub fn new(system: impl Into<String>) -> Self {
        let system = system.into();
        Self {
            history: vec![ChatMessage::system(system.clone())],
            system,
            turns: 0,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    /// True once the history is long enough to be worth clearing
    pub fn is_long(&self) -> bool {
        self.turns > LONG_CONVERSATION_TURNS
    }

    /// Drop every message except the system message
    pub fn reset(&mut self) {
        self.history = vec![ChatMessage::system(self.system.clone())];
        self.turns = 0;
    }

    /// Send `text` with the whole history and record the reply
    pub async fn ask(&mut self, llm: &dyn LlmClient, text: &str) -> Result<String, Error> {
        self.history.push(ChatMessage::user(text));

        match llm.chat(&self.history).await {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                self.turns += 1;
                debug!(turns = self.turns, messages = self.history.len(), "Conversation turn recorded");
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }
}
