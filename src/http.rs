use crate::calculator::Operation;
use crate::error::ToolError;
use crate::tools::{Dispatcher, ToolCall, ToolOutput};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

type AppState = Arc<Dispatcher>;

/// JSON の HTTP API
///
/// `/tools/{name}` は MCP と同じツール表を使う。`/add` などは a, b をクエリ文字列で受け取る電卓 API。
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .route("/add", post(add))
        .route("/subtract", post(subtract))
        .route("/multiply", post(multiply))
        .route("/divide", post(divide))
        .with_state(dispatcher)
}

impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        let status = match &self {
            ToolError::UnknownTool(_) => StatusCode::NOT_FOUND,
            ToolError::InvalidArgument(_) | ToolError::Calculation(_) => StatusCode::BAD_REQUEST,
            ToolError::Fetch(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ToolInfo {
    name: &'static str,
    description: &'static str,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_tools(State(dispatcher): State<AppState>) -> Json<Vec<ToolInfo>> {
    let tools = dispatcher
        .tools()
        .iter()
        .map(|spec| ToolInfo {
            name: spec.name,
            description: spec.description,
        })
        .collect();
    Json(tools)
}

/// 本文が空なら引数なし（null）として扱う
fn parse_arguments(body: &[u8]) -> Result<Value, ToolError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| ToolError::InvalidArgument(format!("JSON を解析できません: {}", e)))
}

async fn call_tool(
    State(dispatcher): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ToolOutput>, ToolError> {
    let args = parse_arguments(&body)?;
    let output = dispatcher.call(&name, &args).await?;
    Ok(Json(output))
}

#[derive(Debug, Deserialize)]
struct ArithmeticQuery {
    a: f64,
    b: f64,
}

async fn calculate(
    dispatcher: &Dispatcher,
    operation: Operation,
    query: Result<Query<ArithmeticQuery>, QueryRejection>,
) -> Result<Json<ToolOutput>, ToolError> {
    let Query(query) = query.map_err(|e| ToolError::InvalidArgument(e.body_text()))?;
    let output = dispatcher
        .execute(ToolCall::Arithmetic {
            operation,
            a: query.a,
            b: query.b,
        })
        .await?;
    Ok(Json(output))
}

async fn add(
    State(dispatcher): State<AppState>,
    query: Result<Query<ArithmeticQuery>, QueryRejection>,
) -> Result<Json<ToolOutput>, ToolError> {
    calculate(&dispatcher, Operation::Add, query).await
}

async fn subtract(
    State(dispatcher): State<AppState>,
    query: Result<Query<ArithmeticQuery>, QueryRejection>,
) -> Result<Json<ToolOutput>, ToolError> {
    calculate(&dispatcher, Operation::Subtract, query).await
}

async fn multiply(
    State(dispatcher): State<AppState>,
    query: Result<Query<ArithmeticQuery>, QueryRejection>,
) -> Result<Json<ToolOutput>, ToolError> {
    calculate(&dispatcher, Operation::Multiply, query).await
}

async fn divide(
    State(dispatcher): State<AppState>,
    query: Result<Query<ArithmeticQuery>, QueryRejection>,
) -> Result<Json<ToolOutput>, ToolError> {
    calculate(&dispatcher, Operation::Divide, query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedFetcher, FeedUrls};
    use crate::query::FeedQueryEngine;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NEWS_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>News</title><link>https://example.com</link><description>d</description>
<item><title>Learn Python Basics</title><description>intro</description><link>u1</link></item>
<item><title>JS Tips</title><description>python tricks</description><link>u2</link></item>
<item><title>Go Guide</title><link>u3</link></item>
</channel></rss>"#;

    fn app_for(uri: &str) -> Router {
        let fetcher = FeedFetcher::new(Duration::from_secs(5)).unwrap();
        let urls = FeedUrls {
            news: format!("{}/news/rss/", uri),
            video: format!("{}/videos.xml", uri),
        };
        router(Arc::new(Dispatcher::new(FeedQueryEngine::new(fetcher, urls))))
    }

    fn offline_app() -> Router {
        app_for("http://127.0.0.1:9")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_list_tools() {
        let request = Request::get("/tools").body(Body::empty()).unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "fcc_news_search");
        assert!(names.contains(&"divide".to_string()));
    }

    #[tokio::test]
    async fn test_calculator_endpoints() {
        let cases = [
            ("/add?a=2&b=3", 5.0),
            ("/subtract?a=2&b=3", -1.0),
            ("/multiply?a=1.5&b=4", 6.0),
            ("/divide?a=9&b=2", 4.5),
        ];

        for (uri, expected) in cases {
            let request = Request::post(uri).body(Body::empty()).unwrap();
            let (status, body) = send(offline_app(), request).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body, json!({ "result": expected }), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_divide_by_zero_endpoint() {
        let request = Request::post("/divide?a=1&b=0").body(Body::empty()).unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Division by zero is not allowed."));
    }

    #[tokio::test]
    async fn test_calculator_missing_operand() {
        let request = Request::post("/add?a=1").body(Body::empty()).unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("b"));

        let request = Request::post("/multiply?a=x&b=2")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_call_tool_malformed_json() {
        let request = Request::post("/tools/fcc_news_search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{bad"))
            .unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn test_call_tool_without_body() {
        // Content-Type も本文もなし
        let request = Request::post("/tools/fcc_secret_message")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Keep exploring! and happy coding!"));

        // 引数が必要なツールは JSON のエラーになる
        let request = Request::post("/tools/add").body(Body::empty()).unwrap();
        let (status, body) = send(offline_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("a は必須です"));
    }

    #[tokio::test]
    async fn test_call_tool_unknown() {
        let (status, body) = send(offline_app(), post_json("/tools/nope", json!({}))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_call_tool_invalid_argument() {
        let (status, body) = send(
            offline_app(),
            post_json(
                "/tools/fcc_news_search",
                json!({ "query": "python", "max_results": -1 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("max_results"));
    }

    #[tokio::test]
    async fn test_call_tool_secret_message() {
        let (status, body) = send(
            offline_app(),
            post_json("/tools/fcc_secret_message", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Keep exploring! and happy coding!"));
    }

    #[tokio::test]
    async fn test_call_tool_news_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/rss/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NEWS_RSS))
            .mount(&server)
            .await;

        let (status, body) = send(
            app_for(&server.uri()),
            post_json("/tools/fcc_news_search", json!({ "query": "python" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "title": "Learn Python Basics", "url": "u1" },
                { "title": "JS Tips", "url": "u2" }
            ])
        );

        let (status, body) = send(
            app_for(&server.uri()),
            post_json("/tools/fcc_news_search", json!({ "query": "rust" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "message": "No results found" }]));
    }

    #[tokio::test]
    async fn test_call_tool_fetch_failure() {
        let (status, body) = send(
            offline_app(),
            post_json("/tools/fcc_youtube_search", json!({ "query": "python" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].is_string());
    }
}
