use crate::calculator::{Calculator, Operation};
use crate::error::ToolError;
use crate::feed::FeedSource;
use crate::query::{FeedQueryEngine, QueryRequest, QueryResult};
use serde::Serialize;
use serde_json::{Map, Value};

pub const SECRET_MESSAGE: &str = "Keep exploring! and happy coding!";

/// 検証済みの呼び出し内容。どのハンドラを実行するかもここで決まる。
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Search(QueryRequest),
    Arithmetic { operation: Operation, a: f64, b: f64 },
    SecretMessage,
}

/// ツールの実行結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Search(QueryResult),
    Calculation { result: f64 },
    Text(&'static str),
}

impl ToolOutput {
    /// MCP のテキストコンテンツとして返す形
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        match self {
            ToolOutput::Text(text) => Ok((*text).to_string()),
            other => serde_json::to_string(other),
        }
    }
}

type Validator = fn(&Value) -> Result<ToolCall, ToolError>;

/// ツール名と入力検証の組
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    validate: Validator,
}

impl ToolSpec {
    pub fn validate(&self, args: &Value) -> Result<ToolCall, ToolError> {
        (self.validate)(args)
    }
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec").field("name", &self.name).finish()
    }
}

pub static TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "fcc_news_search",
        description: "freeCodeCamp ニュースの RSS フィードをタイトルと説明文で検索します。",
        validate: validate_news_search,
    },
    ToolSpec {
        name: "fcc_youtube_search",
        description: "freeCodeCamp YouTube チャンネルのフィードを動画タイトルで検索します。",
        validate: validate_video_search,
    },
    ToolSpec {
        name: "fcc_secret_message",
        description: "freeCodeCamp からの秘密のメッセージを返します。",
        validate: validate_secret_message,
    },
    ToolSpec {
        name: "add",
        description: "2 つの数値を足し算します。",
        validate: validate_add,
    },
    ToolSpec {
        name: "subtract",
        description: "2 つの数値を引き算します（a - b）。",
        validate: validate_subtract,
    },
    ToolSpec {
        name: "multiply",
        description: "2 つの数値を掛け算します。",
        validate: validate_multiply,
    },
    ToolSpec {
        name: "divide",
        description: "2 つの数値を割り算します（a / b）。b が 0 の場合はエラーになります。",
        validate: validate_divide,
    },
];

pub fn lookup(name: &str) -> Result<&'static ToolSpec, ToolError> {
    TOOLS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
}

fn arguments(args: &Value) -> Result<&Map<String, Value>, ToolError> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();

    match args {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(EMPTY.get_or_init(Map::new)),
        _ => Err(ToolError::InvalidArgument(
            "引数は JSON オブジェクトで指定してください".to_string(),
        )),
    }
}

fn optional<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|v| !v.is_null())
}

fn search_request(source: FeedSource, args: &Value) -> Result<ToolCall, ToolError> {
    let args = arguments(args)?;

    let query = match optional(args, "query") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(ToolError::InvalidArgument(format!(
                "query は文字列で指定してください: {}",
                other
            )))
        }
    };

    let max_results = match optional(args, "max_results") {
        None => None,
        // i64 に収まらない正の整数は上限いっぱいとして扱う
        Some(value) => Some(
            value
                .as_u64()
                .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
                .or_else(|| value.as_i64())
                .ok_or_else(|| {
                    ToolError::InvalidArgument(format!(
                        "max_results は整数で指定してください: {}",
                        value
                    ))
                })?,
        ),
    };

    QueryRequest::new(source, query, max_results).map(ToolCall::Search)
}

fn validate_news_search(args: &Value) -> Result<ToolCall, ToolError> {
    search_request(FeedSource::News, args)
}

fn validate_video_search(args: &Value) -> Result<ToolCall, ToolError> {
    search_request(FeedSource::Video, args)
}

fn validate_secret_message(args: &Value) -> Result<ToolCall, ToolError> {
    arguments(args)?;
    Ok(ToolCall::SecretMessage)
}

fn number(args: &Map<String, Value>, key: &str) -> Result<f64, ToolError> {
    match optional(args, key) {
        Some(value) => value.as_f64().ok_or_else(|| {
            ToolError::InvalidArgument(format!("{} は数値で指定してください: {}", key, value))
        }),
        None => Err(ToolError::InvalidArgument(format!("{} は必須です", key))),
    }
}

fn arithmetic(operation: Operation, args: &Value) -> Result<ToolCall, ToolError> {
    let args = arguments(args)?;
    Ok(ToolCall::Arithmetic {
        operation,
        a: number(args, "a")?,
        b: number(args, "b")?,
    })
}

fn validate_add(args: &Value) -> Result<ToolCall, ToolError> {
    arithmetic(Operation::Add, args)
}

fn validate_subtract(args: &Value) -> Result<ToolCall, ToolError> {
    arithmetic(Operation::Subtract, args)
}

fn validate_multiply(args: &Value) -> Result<ToolCall, ToolError> {
    arithmetic(Operation::Multiply, args)
}

fn validate_divide(args: &Value) -> Result<ToolCall, ToolError> {
    arithmetic(Operation::Divide, args)
}

/// ツール呼び出しの窓口
///
/// MCP と HTTP の両方からここを通る。プロセス起動時に 1 つだけ作り、`Arc` で共有する。
#[derive(Debug, Clone)]
pub struct Dispatcher {
    engine: FeedQueryEngine,
}

impl Dispatcher {
    pub fn new(engine: FeedQueryEngine) -> Self {
        Self { engine }
    }

    pub fn tools(&self) -> &'static [ToolSpec] {
        TOOLS
    }

    pub async fn call(&self, name: &str, args: &Value) -> Result<ToolOutput, ToolError> {
        let call = lookup(name)?.validate(args).inspect_err(|e| {
            tracing::debug!(tool = %name, error = %e, "Rejected tool arguments");
        })?;
        tracing::info!(tool = %name, "Calling tool");
        self.execute(call).await
    }

    pub async fn execute(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        match call {
            ToolCall::Search(request) => {
                let result = self.engine.run(&request).await.inspect_err(|e| {
                    tracing::warn!(source = ?request.source, error = %e, "Feed search failed");
                })?;
                Ok(ToolOutput::Search(result))
            }
            ToolCall::Arithmetic { operation, a, b } => {
                let result = Calculator::apply(operation, a, b)?;
                tracing::debug!(operation = operation.name(), a, b, result, "Calculated");
                Ok(ToolOutput::Calculation { result })
            }
            ToolCall::SecretMessage => Ok(ToolOutput::Text(SECRET_MESSAGE)),
        }
    }
}
