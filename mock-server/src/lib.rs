use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const RUNNING_BANNER: &str = "Ollama is running";
pub const DEFAULT_MODELS: [&str; 2] = ["llama3:latest", "phi3:mini"];

/// Installed models and the subset currently loaded.
#[derive(Debug, Default)]
pub struct ModelStore {
    pub installed: Vec<String>,
    pub running: Vec<String>,
}

impl ModelStore {
    fn knows(&self, model: &str) -> bool {
        self.installed.iter().any(|m| m == model)
    }

    fn mark_running(&mut self, model: &str) {
        if !self.running.iter().any(|m| m == model) {
            self.running.push(model.to_string());
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatBody {
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
pub struct GenerateBody {
    pub model: String,
    pub prompt: Option<String>,
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EchoReply {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub type Db = Arc<RwLock<ModelStore>>;

pub fn app() -> Router {
    app_with_models(&DEFAULT_MODELS)
}

pub fn app_with_models(models: &[&str]) -> Router {
    let db: Db = Arc::new(RwLock::new(ModelStore {
        installed: models.iter().map(|m| m.to_string()).collect(),
        running: Vec::new(),
    }));
    Router::new()
        .route("/", get(banner))
        .route("/api/tags", get(list_installed))
        .route("/api/ps", get(list_running))
        .route("/api/generate", post(generate))
        .route("/api/chat", post(chat))
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn banner() -> &'static str {
    RUNNING_BANNER
}

fn model_list(names: &[String]) -> Value {
    let models: Vec<Value> = names
        .iter()
        .map(|name| json!({ "name": name, "model": name, "size": 0, "digest": "" }))
        .collect();
    json!({ "models": models })
}

async fn list_installed(State(db): State<Db>) -> Json<Value> {
    Json(model_list(&db.read().await.installed))
}

async fn list_running(State(db): State<Db>) -> Json<Value> {
    Json(model_list(&db.read().await.running))
}

fn not_found(model: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("model '{model}' not found") })),
    )
}

async fn generate(State(db): State<Db>, Json(input): Json<GenerateBody>) -> (StatusCode, Json<Value>) {
    let mut store = db.write().await;
    if !store.knows(&input.model) {
        return not_found(&input.model);
    }
    store.mark_running(&input.model);

    let response = match input.prompt.as_deref() {
        None | Some("") => String::new(),
        Some(prompt) => format!("echo: {prompt}"),
    };
    (
        StatusCode::OK,
        Json(json!({ "model": input.model, "response": response, "done": true })),
    )
}

async fn chat(State(db): State<Db>, Json(input): Json<ChatBody>) -> (StatusCode, Json<Value>) {
    let mut store = db.write().await;
    if !store.knows(&input.model) {
        return not_found(&input.model);
    }
    store.mark_running(&input.model);

    let last_user = input
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .unwrap_or("");
    (
        StatusCode::OK,
        Json(json!({
            "model": input.model,
            "message": { "role": "assistant", "content": format!("echo: {last_user}") },
            "done": true
        })),
    )
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<EchoReply> {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(EchoReply {
        method: method.as_str().to_string(),
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
