//! HTTP client for the MindfulMe REST API
//!
//! Endpoints:
//! - `GET  /api/journal`  -> `[{date, content}]`
//! - `POST /api/journal`  `{content}` -> `{date}` or `{error}`
//! - `POST /api/chatbot`  `{message}` -> `{response}` or `{error}`

use super::{ApiError, MindfulApi};
use crate::types::{truncate_preview, JournalEntry, SavedEntry};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Raw error bodies (often HTML pages) are cut to this many characters
const ERROR_BODY_LIMIT: usize = 200;

/// reqwest-backed implementation of [`MindfulApi`]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MindfulApi for HttpClient {
    async fn list_entries(&self) -> Result<Vec<JournalEntry>, ApiError> {
        let url = self.url("/api/journal");
        tracing::debug!(%url, "fetching journal entries");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: truncate_preview(&body, ERROR_BODY_LIMIT),
            });
        }

        response
            .json::<Vec<JournalEntry>>()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))
    }

    async fn save_entry(&self, content: &str) -> Result<SavedEntry, ApiError> {
        let url = self.url("/api/journal");
        tracing::debug!(%url, len = content.len(), "saving journal entry");

        let response = self
            .client
            .post(&url)
            .json(&SaveRequest { content })
            .send()
            .await
            .map_err(ApiError::Unreachable)?;

        read_json(response).await
    }

    async fn chat(&self, message: &str) -> Result<String, ApiError> {
        let url = self.url("/api/chatbot");
        tracing::debug!(%url, "sending chat message");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(ApiError::Unreachable)?;

        let reply: ChatReply = read_json(response).await?;
        Ok(reply.response)
    }
}

/// Decode a success body as `T`, or turn an error body into `ApiError`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(ApiError::Unreachable)?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()));
    }

    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => Err(ApiError::Rejected(err.error)),
        Err(_) => Err(ApiError::Status {
            status: status.as_u16(),
            message: truncate_preview(&body, ERROR_BODY_LIMIT),
        }),
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::{get, post}, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn save_handler(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        match body.get("content").and_then(Value::as_str) {
            Some(_) => (
                StatusCode::CREATED,
                Json(json!({"message": "Entry saved successfully!", "date": "2024-03-05 14:07:09"})),
            ),
            None => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Missing journal content"})),
            ),
        }
    }

    async fn chat_handler(Json(body): Json<Value>) -> Json<Value> {
        let message = body["message"].as_str().unwrap_or_default();
        Json(json!({"response": format!("echo: {}", message)}))
    }

    fn journal_router() -> Router {
        Router::new()
            .route(
                "/api/journal",
                get(|| async {
                    Json(json!([
                        {"id": 2, "date": "2024-03-05 14:07:09", "content": "second"},
                        {"id": 1, "date": "2024-03-04 09:00:00", "content": "first"}
                    ]))
                })
                .post(save_handler),
            )
            .route("/api/chatbot", post(chat_handler))
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpClient::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
        assert_eq!(client.url("/api/journal"), "http://127.0.0.1:5000/api/journal");
    }

    #[tokio::test]
    async fn test_list_entries() {
        let base = spawn_server(journal_router()).await;
        let client = HttpClient::new(&base).unwrap();

        let entries = client.list_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "second");
        assert_eq!(entries[1].date, "2024-03-04 09:00:00");
    }

    #[tokio::test]
    async fn test_list_entries_non_success_status() {
        let router = Router::new().route(
            "/api/journal",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_server(router).await;
        let client = HttpClient::new(&base).unwrap();

        match client.list_entries().await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_entries_malformed_body() {
        let router = Router::new().route("/api/journal", get(|| async { "not json" }));
        let base = spawn_server(router).await;
        let client = HttpClient::new(&base).unwrap();

        assert!(matches!(client.list_entries().await, Err(ApiError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_save_entry() {
        let base = spawn_server(journal_router()).await;
        let client = HttpClient::new(&base).unwrap();

        let saved = client.save_entry("a calm morning").await.unwrap();
        assert_eq!(saved.date, "2024-03-05 14:07:09");
        assert_eq!(saved.message.as_deref(), Some("Entry saved successfully!"));
    }

    #[tokio::test]
    async fn test_save_entry_rejected() {
        let router = Router::new().route(
            "/api/journal",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Failed to save entry: disk full"})),
                )
            }),
        );
        let base = spawn_server(router).await;
        let client = HttpClient::new(&base).unwrap();

        match client.save_entry("text").await {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "Failed to save entry: disk full"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat() {
        let base = spawn_server(journal_router()).await;
        let client = HttpClient::new(&base).unwrap();

        let reply = client.chat("hi").await.unwrap();
        assert_eq!(reply, "echo: hi");
    }

    #[tokio::test]
    async fn test_chat_error_without_payload() {
        let router = Router::new().route(
            "/api/chatbot",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream gone") }),
        );
        let base = spawn_server(router).await;
        let client = HttpClient::new(&base).unwrap();

        match client.chat("hi").await {
            Err(ApiError::Status { status, .. }) => assert_eq!(status, 502),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    /// Handler answering 500 with `page` as a plain body
    fn failing(
        page: String,
    ) -> impl Fn() -> std::future::Ready<(StatusCode, String)> + Clone + Send + Sync + 'static {
        move || std::future::ready((StatusCode::INTERNAL_SERVER_ERROR, page.clone()))
    }

    #[tokio::test]
    async fn test_html_error_page_is_truncated() {
        let page = format!("<html><body>{}</body></html>", "Internal Server Error ".repeat(50));
        let router = Router::new().route(
            "/api/journal",
            get(failing(page.clone())).post(failing(page)),
        );
        let base = spawn_server(router).await;
        let client = HttpClient::new(&base).unwrap();

        for result in [
            client.list_entries().await.map(|_| ()),
            client.save_entry("text").await.map(|_| ()),
        ] {
            match result {
                Err(ApiError::Status { status, message }) => {
                    assert_eq!(status, 500);
                    assert_eq!(message.chars().count(), ERROR_BODY_LIMIT + 3);
                    assert!(message.starts_with("<html><body>Internal Server Error"));
                    assert!(message.ends_with("..."));
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Grab a free port, then close it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpClient::new(&format!("http://{}", addr)).unwrap();
        let err = client.list_entries().await.unwrap_err();
        assert!(err.is_transport());
    }
}
