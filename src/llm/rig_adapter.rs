//! Bridge from rig's `CompletionModel` trait to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel, Message};

use crate::error::LlmError;
use crate::llm::provider::{ChatRole, CompletionRequest, CompletionResponse, LlmProvider};

/// Max tokens applied when the request doesn't set one (Anthropic requires it).
const DEFAULT_MAX_TOKENS: u64 = 4096;

/// Adapter wrapping any rig `CompletionModel`.
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M: CompletionModel> LlmProvider for RigAdapter<M> {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // System messages become the preamble; the trailing user message is
        // the prompt; anything in between is chat history.
        let mut preamble = String::new();
        let mut history: Vec<Message> = Vec::new();
        let mut prompt: Option<String> = None;

        for message in &request.messages {
            match message.role {
                ChatRole::System => {
                    if !preamble.is_empty() {
                        preamble.push('\n');
                    }
                    preamble.push_str(&message.content);
                }
                ChatRole::User => {
                    if let Some(previous) = prompt.take() {
                        history.push(Message::user(previous));
                    }
                    prompt = Some(message.content.clone());
                }
                ChatRole::Assistant => {
                    if let Some(previous) = prompt.take() {
                        history.push(Message::user(previous));
                    }
                    history.push(Message::assistant(message.content.clone()));
                }
            }
        }

        let prompt = prompt.ok_or_else(|| LlmError::InvalidResponse {
            provider: self.model_name.clone(),
            reason: "completion request has no user message".to_string(),
        })?;

        let mut builder = self
            .model
            .completion_request(Message::user(prompt))
            .messages(history)
            .max_tokens(request.max_tokens.map_or(DEFAULT_MAX_TOKENS, u64::from));

        if !preamble.is_empty() {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }

        let response =
            self.model
                .completion(builder.build())
                .await
                .map_err(|e| LlmError::RequestFailed {
                    provider: self.model_name.clone(),
                    reason: e.to_string(),
                })?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "completion returned no text content".to_string(),
            });
        }

        Ok(CompletionResponse {
            content,
            model: self.model_name.clone(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
