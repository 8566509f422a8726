use super::ModelClient;
use crate::error::AdapterError;
use crate::models::Complexity;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

enum Reply {
    Text(String),
    Failure(String),
}

#[derive(Default)]
struct State {
    replies: VecDeque<Reply>,
    prompts: Vec<(String, Complexity)>,
}

/// Model client that answers from a queue of canned replies
///
/// Every prompt is recorded. An exhausted queue fails the call.
#[derive(Default)]
pub struct ScriptedModel {
    state: Mutex<State>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a reply
    pub fn reply(&self, text: impl Into<String>) -> &Self {
        self.state().replies.push_back(Reply::Text(text.into()));
        self
    }

    /// Queue an invocation failure
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.state().replies.push_back(Reply::Failure(message.into()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn complexities(&self) -> Vec<Complexity> {
        self.state().prompts.iter().map(|(_, c)| *c).collect()
    }

    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, prompt: &str, complexity: Complexity) -> Result<String, AdapterError> {
        let mut state = self.state();
        state.prompts.push((prompt.to_string(), complexity));
        match state.replies.pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(message)) => Err(AdapterError::Invocation { message }),
            None => Err(AdapterError::Invocation {
                message: "no scripted reply left".to_string(),
            }),
        }
    }
}
