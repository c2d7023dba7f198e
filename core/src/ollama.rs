//! Ollama API mapping.
//!
//! # Design
//! `OllamaClient` carries no state: each endpoint is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`, so both halves are testable without a server.
//! `Ollama` pairs it with an `HttpClient` and runs the round-trip, going
//! through `get`/`post` only.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    ChatRequest, ChatResponse, GenerateRequest, GenerateResponse, Messages, ModelList, Options,
};

pub const DEFAULT_URL: &str = "http://localhost:11434";
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);
pub const RUNNING_BANNER: &str = "Ollama is running";

const JSON: &str = "application/json";

/// Stateless request builder and response parser for the Ollama API.
#[derive(Debug, Clone, Copy, Default)]
pub struct OllamaClient;

impl OllamaClient {
    pub fn build_is_running(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, "/")
    }

    pub fn build_list_models(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, "/api/tags")
    }

    pub fn build_list_running_models(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, "/api/ps")
    }

    /// A generate call with no prompt asks the server to load `model`.
    pub fn build_load_model(&self, model: &str) -> Result<HttpRequest, ApiError> {
        let body = GenerateRequest {
            model,
            prompt: None,
            stream: None,
            images: &[],
        };
        json_post("/api/generate", &body, Options::new())
    }

    pub fn build_generate(
        &self,
        model: &str,
        prompt: &str,
        images: &[String],
        options: Options,
    ) -> Result<HttpRequest, ApiError> {
        let body = GenerateRequest {
            model,
            prompt: Some(prompt),
            stream: Some(false),
            images,
        };
        json_post("/api/generate", &body, options)
    }

    pub fn build_chat(
        &self,
        model: &str,
        messages: &Messages,
        options: Options,
    ) -> Result<HttpRequest, ApiError> {
        let body = ChatRequest {
            model,
            messages,
            stream: false,
        };
        json_post("/api/chat", &body, options)
    }

    pub fn parse_is_running(&self, response: &HttpResponse) -> bool {
        response.is_valid() && response.body == RUNNING_BANNER.as_bytes()
    }

    pub fn parse_model_list(&self, response: HttpResponse) -> Result<ModelList, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    /// The raw JSON document, for callers that want fields not modelled here.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_load_model(&self, response: HttpResponse) -> Result<bool, ApiError> {
        Ok(self.parse_generate(response)?.done)
    }

    pub fn parse_generate(&self, response: HttpResponse) -> Result<GenerateResponse, ApiError> {
        check_status(&response)?;
        let reply: GenerateResponse = decode(&response)?;
        if let Some(message) = reply.error() {
            return Err(server_error(&response, message));
        }
        Ok(reply)
    }

    pub fn parse_chat(&self, response: HttpResponse) -> Result<ChatResponse, ApiError> {
        check_status(&response)?;
        let reply: ChatResponse = decode(&response)?;
        if let Some(message) = reply.error() {
            return Err(server_error(&response, message));
        }
        Ok(reply)
    }
}

/// Serialize `body` and lay `options` over its top-level fields; an option
/// with the same key as a fixed field replaces it.
fn json_post<T: serde::Serialize>(
    path: &str,
    body: &T,
    options: Options,
) -> Result<HttpRequest, ApiError> {
    let serialization = |e: serde_json::Error| ApiError::SerializationError(e.to_string());
    let mut fields = match serde_json::to_value(body).map_err(serialization)? {
        Value::Object(fields) => fields,
        _ => return Err(ApiError::SerializationError("body is not a JSON object".to_string())),
    };
    fields.extend(options);
    let body = serde_json::to_vec(&fields).map_err(serialization)?;
    Ok(HttpRequest::new(HttpMethod::Post, path)
        .header("Content-Type", JSON)
        .body(body))
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn server_error(response: &HttpResponse, message: &str) -> ApiError {
    ApiError::Server {
        status: response.status,
        message: message.to_string(),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Map non-success statuses to `Server` when the body explains itself,
/// `HttpError` otherwise.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if let Ok(ErrorBody { error }) = serde_json::from_slice(&response.body) {
        return Err(server_error(response, &error));
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.text(),
    })
}

/// Turn a server URL into the `host[:port]` form `HttpClient` takes.
///
/// Only plaintext `http://` URLs without a path are usable.
pub fn server_host(url: &str) -> Result<&str, ApiError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("https://") {
        return Err(ApiError::InvalidUrl(format!("{url} (TLS is not supported)")));
    }
    let host = trimmed.strip_prefix("http://").unwrap_or(trimmed);
    if host.is_empty() || host.contains('/') || host.contains("://") {
        return Err(ApiError::InvalidUrl(url.to_string()));
    }
    Ok(host)
}

/// Ollama server handle that performs the HTTP round-trips.
#[derive(Debug, Clone)]
pub struct Ollama {
    api: OllamaClient,
    http: HttpClient,
    server_url: String,
}

impl Default for Ollama {
    fn default() -> Self {
        Self::with_host(
            DEFAULT_URL,
            "localhost:11434",
            ClientConfig::default().read_timeout(DEFAULT_READ_TIMEOUT),
        )
    }
}

impl Ollama {
    pub fn new(url: &str) -> Result<Self, ApiError> {
        Self::with_config(url, ClientConfig::default().read_timeout(DEFAULT_READ_TIMEOUT))
    }

    pub fn with_config(url: &str, config: ClientConfig) -> Result<Self, ApiError> {
        let host = server_host(url)?;
        Ok(Self::with_host(url, host, config))
    }

    fn with_host(url: &str, host: &str, config: ClientConfig) -> Self {
        Self {
            api: OllamaClient,
            http: HttpClient::new(host, config),
            server_url: url.to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn set_read_timeout(&mut self, timeout: Duration) {
        let config = self.http.config().clone().read_timeout(timeout);
        let host = self.http.endpoint().host_header();
        self.http = HttpClient::new(&host, config);
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = match request.method {
            HttpMethod::Get => self.http.get(&request.path)?,
            HttpMethod::Post => {
                let content_type = request.content_type().unwrap_or(JSON).to_string();
                self.http.post(&request.path, request.body, &content_type)?
            }
            _ => self.http.send(request)?,
        };
        Ok(response)
    }

    pub fn is_running(&self) -> bool {
        match self.execute(self.api.build_is_running()) {
            Ok(response) => self.api.parse_is_running(&response),
            Err(_) => false,
        }
    }

    pub fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let response = self.execute(self.api.build_list_models())?;
        Ok(self.api.parse_model_list(response)?.names())
    }

    pub fn list_model_json(&self) -> Result<Value, ApiError> {
        let response = self.execute(self.api.build_list_models())?;
        self.api.parse_json(response)
    }

    pub fn list_running_models(&self) -> Result<Vec<String>, ApiError> {
        let response = self.execute(self.api.build_list_running_models())?;
        Ok(self.api.parse_model_list(response)?.names())
    }

    pub fn running_model_json(&self) -> Result<Value, ApiError> {
        let response = self.execute(self.api.build_list_running_models())?;
        self.api.parse_json(response)
    }

    pub fn load_model(&self, model: &str) -> Result<bool, ApiError> {
        let response = self.execute(self.api.build_load_model(model)?)?;
        self.api.parse_load_model(response)
    }

    pub fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: Options,
    ) -> Result<GenerateResponse, ApiError> {
        let response = self.execute(self.api.build_generate(model, prompt, &[], options)?)?;
        self.api.parse_generate(response)
    }

    pub fn chat(
        &self,
        model: &str,
        messages: &Messages,
        options: Options,
    ) -> Result<ChatResponse, ApiError> {
        let response = self.execute(self.api.build_chat(model, messages, options)?)?;
        self.api.parse_chat(response)
    }
}
