//! HTTP Research Client - 调用研究结果后端 HTTP 接口
//!
//! 实现 ResearchApiPort trait
//!
//! 后端 API:
//! GET  {base_url}/api/research/results/?page=1&page_size=10&ordering=-created_at
//! POST {base_url}/api/research/results/delete/  {"research_ids": [...]}
//! GET  {base_url}/api/notifications/?category=research

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{
    DeleteRequest, DeleteResponse, ListQuery, Notification, ResearchApiError, ResearchApiPort,
};
use crate::domain::{ResearchTask, ResultPage};

/// 列表响应
#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(alias = "data")]
    results: Vec<ResearchTask>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default, alias = "totalPages")]
    total_pages: Option<u32>,
}

/// 通知响应：裸数组或分页包装
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NotificationEnvelope {
    List(Vec<Notification>),
    Paged {
        #[serde(alias = "data")]
        results: Vec<Notification>,
    },
}

/// 错误响应体
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP 客户端配置
#[derive(Debug, Clone)]
pub struct HttpResearchClientConfig {
    /// 后端基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// Bearer 令牌
    pub auth_token: Option<String>,
    pub list_path: String,
    pub delete_path: String,
    pub notifications_path: String,
}

impl Default for HttpResearchClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            auth_token: None,
            list_path: "/api/research/results/".to_string(),
            delete_path: "/api/research/results/delete/".to_string(),
            notifications_path: "/api/notifications/".to_string(),
        }
    }
}

impl HttpResearchClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// HTTP Research 客户端
pub struct HttpResearchClient {
    client: Client,
    config: HttpResearchClientConfig,
}

impl HttpResearchClient {
    pub fn new(config: HttpResearchClientConfig) -> Result<Self, ResearchApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ResearchApiError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ResearchApiError> {
        let response = self.authorized(builder).send().await.map_err(|e| {
            if e.is_timeout() {
                ResearchApiError::Timeout
            } else if e.is_connect() {
                ResearchApiError::NetworkError(format!("Cannot connect to research API: {}", e))
            } else {
                ResearchApiError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(ResearchApiError::ServiceError {
            status: status.as_u16(),
            message: error_message(&text, status.as_u16()),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ResearchApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ResearchApiError::InvalidResponse(e.to_string()))
    }
}

/// 从错误响应中提取服务端文案，按 error / detail / message / 原始文本的顺序
fn error_message(body: &str, status: u16) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error
        .or(parsed.detail)
        .or(parsed.message)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[async_trait]
impl ResearchApiPort for HttpResearchClient {
    async fn list(&self, query: &ListQuery) -> Result<ResultPage, ResearchApiError> {
        let url = self.url(&self.config.list_path);
        tracing::debug!(url = %url, page = query.page, "Requesting research results");

        let response = self.send(self.client.get(&url).query(query)).await?;
        let envelope: ListEnvelope = Self::read_json(response).await?;

        let total_count = envelope
            .count
            .unwrap_or(envelope.results.len() as u64);
        Ok(ResultPage {
            tasks: envelope.results,
            page: query.page,
            page_size: query.page_size,
            total_count,
            total_pages: envelope.total_pages,
        })
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse, ResearchApiError> {
        let url = self.url(&self.config.delete_path);
        tracing::debug!(url = %url, kind = request.kind(), "Sending delete request");

        let response = self.send(self.client.post(&url).json(request)).await?;
        Self::read_json(response).await
    }

    async fn notifications(&self, category: &str) -> Result<Vec<Notification>, ResearchApiError> {
        let url = self.url(&self.config.notifications_path);
        let response = self
            .send(self.client.get(&url).query(&[("category", category)]))
            .await?;

        let envelope: NotificationEnvelope = Self::read_json(response).await?;
        Ok(match envelope {
            NotificationEnvelope::List(entries) => entries,
            NotificationEnvelope::Paged { results } => results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ORDERING_NEWEST_FIRST;
    use crate::domain::{TaskId, TaskStatus};
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: String) -> HttpResearchClient {
        HttpResearchClient::new(HttpResearchClientConfig::new(base_url).with_timeout(5)).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = HttpResearchClientConfig::new("http://api.example.com")
            .with_timeout(10)
            .with_auth_token("secret");
        assert_eq!(config.base_url, "http://api.example.com");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.list_path, "/api/research/results/");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"Nope"}"#, 400), "Nope");
        assert_eq!(error_message(r#"{"detail":"Not found."}"#, 404), "Not found.");
        assert_eq!(error_message("Bad Gateway", 502), "Bad Gateway");
        assert_eq!(error_message("", 500), "HTTP 500");
    }

    #[tokio::test]
    async fn test_list_sends_canonical_query() {
        let seen: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/api/research/results/",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(params);
                    Json(json!({
                        "results": [{
                            "id": 5,
                            "status": "processing",
                            "created_at": "2024-05-01T10:00:00Z"
                        }],
                        "count": 11,
                        "totalPages": 2
                    }))
                }
            }),
        );
        let api = client(serve(router).await);

        let query = ListQuery {
            page: 2,
            page_size: 10,
            search: Some("acme".into()),
            status: Some(TaskStatus::Processing),
            contact_type: None,
            ordering: ORDERING_NEWEST_FIRST,
        };
        let page = api.list(&query).await.unwrap();

        assert_eq!(page.ids(), vec![TaskId::new(5)]);
        assert_eq!(page.total_count, 11);
        assert_eq!(page.total_pages, Some(2));
        assert_eq!(page.page, 2);

        let params = seen.lock().unwrap()[0].clone();
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
        assert_eq!(params.get("page_size").map(String::as_str), Some("10"));
        assert_eq!(params.get("search").map(String::as_str), Some("acme"));
        assert_eq!(params.get("status").map(String::as_str), Some("processing"));
        assert_eq!(params.get("ordering").map(String::as_str), Some("-created_at"));
        assert!(!params.contains_key("contact_type"));
    }

    #[tokio::test]
    async fn test_delete_posts_exact_body() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/api/research/results/delete/",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(body);
                    Json(json!({
                        "success": true,
                        "message": "Deleted 2 items",
                        "not_found_ids": [9]
                    }))
                }
            }),
        );
        let api = client(serve(router).await);

        let response = api.delete(&DeleteRequest::all()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.not_found_ids, Some(vec![TaskId::new(9)]));
        assert_eq!(seen.lock().unwrap()[0], json!({ "delete_all": true }));
    }

    #[tokio::test]
    async fn test_delete_error_surfaces_server_text() {
        let router = Router::new().route(
            "/api/research/results/delete/",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "error": "No research results selected" })),
                )
            }),
        );
        let api = client(serve(router).await);

        let err = api
            .delete(&DeleteRequest::Bulk {
                research_ids: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ResearchApiError::ServiceError {
                status: 400,
                message: "No research results selected".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_notifications_accepts_both_shapes_and_sends_token() {
        let auth: Arc<Mutex<Option<String>>> = Arc::default();
        let recorder = auth.clone();
        let router = Router::new()
            .route(
                "/api/notifications/",
                get(move |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| {
                    let recorder = recorder.clone();
                    async move {
                        *recorder.lock().unwrap() = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        assert_eq!(params.get("category").map(String::as_str), Some("research"));
                        Json(json!({
                            "results": [
                                { "id": 1, "notification_type": "research_complete_success",
                                  "metadata": { "token": "abc" } },
                                { "notification_type": "campaign_sent" }
                            ]
                        }))
                    }
                }),
            )
            .route(
                "/bare/",
                get(|| async { Json(json!([{ "notification_type": "research_complete_failed" }])) }),
            );
        let base_url = serve(router).await;

        let api = HttpResearchClient::new(
            HttpResearchClientConfig::new(base_url.clone()).with_auth_token("secret"),
        )
        .unwrap();
        let entries = api.notifications("research").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].token(), Some("abc"));
        assert_eq!(auth.lock().unwrap().as_deref(), Some("Bearer secret"));

        let mut config = HttpResearchClientConfig::new(base_url);
        config.notifications_path = "/bare/".to_string();
        let bare = HttpResearchClient::new(config).unwrap();
        let entries = bare.notifications("research").await.unwrap();
        assert_eq!(entries[0].notification_type, "research_complete_failed");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(format!("http://{}", addr));
        let err = api.notifications("research").await.unwrap_err();
        assert!(matches!(err, ResearchApiError::NetworkError(_)));
    }
}
