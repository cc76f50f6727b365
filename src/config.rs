use crate::feed::{FeedUrls, DEFAULT_NEWS_FEED_URL, DEFAULT_VIDEO_FEED_URL};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// MCP over stdio
    Stdio,
    /// MCP over server-sent events
    Sse,
    /// JSON の HTTP API
    Http,
}

/// freeCodeCamp フィード検索・電卓の MCP サーバ
#[derive(Debug, Parser)]
#[command(name = "feed-mcp", version)]
pub struct Config {
    #[arg(long, env = "FEED_MCP_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// sse / http で listen するアドレス
    #[arg(long, env = "FEED_MCP_BIND", default_value = "127.0.0.1:24242")]
    pub bind: SocketAddr,

    #[arg(long, env = "FEED_MCP_NEWS_URL", default_value = DEFAULT_NEWS_FEED_URL)]
    pub news_url: String,

    #[arg(long, env = "FEED_MCP_VIDEO_URL", default_value = DEFAULT_VIDEO_FEED_URL)]
    pub video_url: String,

    /// フィード取得のタイムアウト（秒、1 以上）
    #[arg(
        long,
        env = "FEED_MCP_FETCH_TIMEOUT",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout_secs: u64,

    /// RUST_LOG が未設定のときのログレベル
    #[arg(long, env = "FEED_MCP_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn feed_urls(&self) -> FeedUrls {
        FeedUrls {
            news: self.news_url.clone(),
            video: self.video_url.clone(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
