use crate::error::ToolError;
use crate::feed::{FeedEntry, FeedFetcher, FeedSource, FeedUrls, FetchError};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::num::NonZeroUsize;

pub const DEFAULT_MAX_RESULTS: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => unreachable!(),
};

/// 検証済みの検索リクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub source: FeedSource,
    pub query: String,
    pub max_results: NonZeroUsize,
}

impl QueryRequest {
    /// 入力を検証してリクエストを組み立てる。フィードの取得より前に呼ばれる。
    pub fn new(
        source: FeedSource,
        query: Option<String>,
        max_results: Option<i64>,
    ) -> Result<Self, ToolError> {
        let query =
            query.ok_or_else(|| ToolError::InvalidArgument("query は必須です".to_string()))?;

        let max_results = match max_results {
            None => DEFAULT_MAX_RESULTS,
            Some(n) if n <= 0 => {
                return Err(ToolError::InvalidArgument(format!(
                    "max_results は 1 以上で指定してください（指定値: {}）",
                    n
                )))
            }
            // usize に収まらない値は上限いっぱいとして扱う
            Some(n) => usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .unwrap_or(NonZeroUsize::MAX),
        };

        Ok(Self {
            source,
            query,
            max_results,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

/// 検索結果
///
/// 一致したエントリの列か、一致なしを表すメッセージのどちらか一方になる。
/// どちらも JSON では配列としてシリアライズされる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Matches(Vec<SearchHit>),
    NoMatches { message: &'static str },
}

impl QueryResult {
    pub fn match_count(&self) -> usize {
        match self {
            QueryResult::Matches(hits) => hits.len(),
            QueryResult::NoMatches { .. } => 0,
        }
    }
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QueryResult::Matches(hits) => hits.serialize(serializer),
            QueryResult::NoMatches { message } => {
                struct Message<'a>(&'a str);

                impl Serialize for Message<'_> {
                    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                        let mut map = serializer.serialize_map(Some(1))?;
                        map.serialize_entry("message", self.0)?;
                        map.end()
                    }
                }

                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&Message(message))?;
                seq.end()
            }
        }
    }
}

/// エントリ列を先頭から走査し、一致したものを最大 `max_results` 件返す
///
/// クエリと対象項目を小文字にして部分一致を判定する。空のクエリはすべてに一致する。
/// `max_results` 件集まった時点で走査を打ち切るので、結果は常にフィード順の先頭部分になる。
pub fn search<'a, I>(
    entries: I,
    query: &str,
    max_results: NonZeroUsize,
    source: FeedSource,
) -> QueryResult
where
    I: IntoIterator<Item = &'a FeedEntry>,
{
    let query = query.to_lowercase();
    let fields = source.fields();
    let mut hits = Vec::new();

    for entry in entries {
        let matched = fields
            .iter()
            .any(|&field| entry.field(field).to_lowercase().contains(&query));
        if !matched {
            continue;
        }

        hits.push(SearchHit {
            title: entry.title.clone(),
            url: entry.link.clone(),
        });
        if hits.len() >= max_results.get() {
            break;
        }
    }

    if hits.is_empty() {
        QueryResult::NoMatches {
            message: source.fallback_message(),
        }
    } else {
        QueryResult::Matches(hits)
    }
}

/// フィードの取得と検索をまとめたエンジン
#[derive(Debug, Clone)]
pub struct FeedQueryEngine {
    fetcher: FeedFetcher,
    urls: FeedUrls,
}

impl FeedQueryEngine {
    pub fn new(fetcher: FeedFetcher, urls: FeedUrls) -> Self {
        Self { fetcher, urls }
    }

    pub async fn run(&self, request: &QueryRequest) -> Result<QueryResult, FetchError> {
        let url = self.urls.url_for(request.source);
        let entries = self.fetcher.fetch(url).await?;

        let result = search(
            &entries,
            &request.query,
            request.max_results,
            request.source,
        );
        tracing::debug!(
            source = ?request.source,
            query = %request.query,
            matches = result.match_count(),
            "Feed search finished"
        );
        Ok(result)
    }
}
