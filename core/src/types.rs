//! Ollama API DTOs.
//!
//! # Design
//! Request types serialize the fixed fields the server expects; caller options
//! are merged over them at the top level when the body is built. Response
//! types default every field so partial or error-only bodies still deserialize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Extra top-level request fields (`options`, `format`, `keep_alive`, ...).
pub type Options = Map<String, Value>;

/// One chat turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Ordered chat history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Messages(Vec<Message>);

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, role: &str, content: &str) {
        self.0.push(Message {
            role: role.to_string(),
            content: content.to_string(),
        });
    }

    pub fn add_system(&mut self, content: &str) {
        self.add_message("system", content);
    }

    pub fn add_user(&mut self, content: &str) {
        self.add_message("user", content);
    }

    pub fn add_assistant(&mut self, content: &str) {
        self.add_message("assistant", content);
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a Messages,
    pub stream: bool,
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "no_images")]
    pub images: &'a [String],
}

fn no_images(images: &&[String]) -> bool {
    images.is_empty()
}

/// Reply of `POST /api/chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChatResponse {
    pub model: String,
    pub created_at: String,
    pub message: Option<Message>,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    /// The assistant's text, or empty if the reply had none.
    pub fn as_simple_string(&self) -> &str {
        self.message.as_ref().map_or("", |m| m.content.as_str())
    }

    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Reply of `POST /api/generate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerateResponse {
    pub model: String,
    pub created_at: String,
    pub response: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    pub fn as_simple_string(&self) -> &str {
        &self.response
    }

    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// One entry of `/api/tags` or `/api/ps`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelInfo {
    pub name: String,
    pub model: String,
    pub size: u64,
    pub digest: String,
}

/// Reply of `GET /api/tags` and `GET /api/ps`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelList {
    pub models: Vec<ModelInfo>,
}

impl ModelList {
    pub fn names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }
}
