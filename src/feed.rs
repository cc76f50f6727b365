use feed_rs::parser;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_NEWS_FEED_URL: &str = "https://www.freecodecamp.org/news/rss/";
pub const DEFAULT_VIDEO_FEED_URL: &str =
    "https://www.youtube.com/feeds/videos.xml?channel_id=UC8butISFwT-Wl7EV0hUK0BQ";

/// フィード取得時のエラー
#[derive(Debug, Error)]
pub enum FetchError {
    /// 接続・TLS・タイムアウトなどのネットワークエラー
    #[error("フィードの取得に失敗しました: {0}")]
    Network(#[from] reqwest::Error),
    /// 2xx 以外のレスポンス
    #[error("フィードの取得に失敗しました: HTTP {0}")]
    HttpStatus(u16),
    /// RSS / Atom として解析できない
    #[error("フィードの解析に失敗しました: {0}")]
    Parse(String),
}

/// フィードの 1 件分（記事または動画）
///
/// フィード側で欠けている項目は空文字列になる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: String,
}

impl FeedEntry {
    pub fn field(&self, field: SearchField) -> &str {
        match field {
            SearchField::Title => &self.title,
            SearchField::Description => &self.description,
        }
    }
}

/// 検索対象になるエントリの項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Description,
}

/// 検索できるフィードの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    News,
    Video,
}

impl FeedSource {
    /// ニュースはタイトルと説明文、動画はタイトルのみを検索する
    pub fn fields(self) -> &'static [SearchField] {
        match self {
            FeedSource::News => &[SearchField::Title, SearchField::Description],
            FeedSource::Video => &[SearchField::Title],
        }
    }

    pub fn fallback_message(self) -> &'static str {
        match self {
            FeedSource::News => "No results found",
            FeedSource::Video => "No videos found",
        }
    }
}

/// ソースごとの取得先 URL
#[derive(Debug, Clone)]
pub struct FeedUrls {
    pub news: String,
    pub video: String,
}

impl FeedUrls {
    pub fn url_for(&self, source: FeedSource) -> &str {
        match source {
            FeedSource::News => &self.news,
            FeedSource::Video => &self.video,
        }
    }
}

/// RSS / Atom フィードを取得してエントリ列に変換する
///
/// キャッシュはしない。呼び出しのたびに取得し直す。
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feed-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Feed request failed");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let entries = parse_entries(&body)?;
        tracing::info!(url = %url, entries = entries.len(), "Fetched feed");
        Ok(entries)
    }
}

/// フィードの XML をエントリ列に変換する（順序はフィードのまま）
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<FeedEntry>, FetchError> {
    let feed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .or_else(|| {
                    entry
                        .media
                        .into_iter()
                        .find_map(|m| m.description.map(|d| d.content))
                })
                .unwrap_or_default();
            let link = entry
                .links
                .into_iter()
                .next()
                .map(|l| l.href)
                .unwrap_or_default();

            FeedEntry {
                title,
                description,
                link,
            }
        })
        .collect();

    Ok(entries)
}
