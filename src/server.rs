use crate::error::ToolError;
use crate::tools::Dispatcher;
use rmcp::{
    model::{
        CallToolResult, Content, Implementation, InitializeResult, ProtocolVersion,
        ServerCapabilities,
    },
    tool, Error as McpError, ServerHandler,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchRequest {
    #[schemars(description = "検索語（大文字・小文字は区別しない部分一致。空文字列はすべてに一致）")]
    pub query: String,
    #[schemars(description = "返す件数の上限（1 以上、省略時は 3）")]
    #[serde(default)]
    pub max_results: Option<i128>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ArithmeticRequest {
    #[schemars(description = "1 つ目の数値")]
    pub a: f64,
    #[schemars(description = "2 つ目の数値")]
    pub b: f64,
}

/// MCP サーバ本体。ツールの中身はすべて [`Dispatcher`] に委譲する。
#[derive(Debug, Clone)]
pub struct FeedService {
    dispatcher: Arc<Dispatcher>,
}

impl FeedService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    async fn dispatch<T: Serialize>(
        &self,
        name: &str,
        args: &T,
    ) -> Result<CallToolResult, McpError> {
        let args =
            serde_json::to_value(args).map_err(|e| McpError::internal_error(e.to_string(), None))?;

        match self.dispatcher.call(name, &args).await {
            Ok(output) => {
                let text = output
                    .to_text()
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e @ (ToolError::InvalidArgument(_) | ToolError::UnknownTool(_))) => {
                Err(McpError::invalid_params(e.to_string(), None))
            }
            // 取得失敗や計算エラーはツールのエラー結果として返す
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }
}

#[tool(tool_box)]
impl FeedService {
    #[tool(description = "freeCodeCamp ニュースの RSS フィードをタイトルと説明文で検索します。")]
    pub async fn fcc_news_search(
        &self,
        #[tool(aggr)] request: SearchRequest,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("fcc_news_search", &request).await
    }

    #[tool(description = "freeCodeCamp YouTube チャンネルのフィードを動画タイトルで検索します。")]
    pub async fn fcc_youtube_search(
        &self,
        #[tool(aggr)] request: SearchRequest,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("fcc_youtube_search", &request).await
    }

    #[tool(description = "freeCodeCamp からの秘密のメッセージを返します。")]
    pub async fn fcc_secret_message(&self) -> Result<CallToolResult, McpError> {
        self.dispatch("fcc_secret_message", &serde_json::Value::Null)
            .await
    }

    #[tool(description = "2 つの数値を足し算します。")]
    pub async fn add(
        &self,
        #[tool(aggr)] request: ArithmeticRequest,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("add", &request).await
    }

    #[tool(description = "2 つの数値を引き算します（a - b）。")]
    pub async fn subtract(
        &self,
        #[tool(aggr)] request: ArithmeticRequest,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("subtract", &request).await
    }

    #[tool(description = "2 つの数値を掛け算します。")]
    pub async fn multiply(
        &self,
        #[tool(aggr)] request: ArithmeticRequest,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("multiply", &request).await
    }

    #[tool(description = "2 つの数値を割り算します（a / b）。b が 0 の場合はエラーになります。")]
    pub async fn divide(
        &self,
        #[tool(aggr)] request: ArithmeticRequest,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch("divide", &request).await
    }
}

#[tool(tool_box)]
impl ServerHandler for FeedService {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "freeCodeCamp のニュース・動画フィード検索と四則演算を提供するMCPサーバです。"
                    .into(),
            ),
        }
    }
}
