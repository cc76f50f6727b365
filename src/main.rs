use anyhow::{Context, Result};
use clap::Parser;
use rmcp::{
    transport::{sse_server::SseServer, stdio},
    ServiceExt,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod calculator;
mod config;
mod error;
mod feed;
mod http;
mod query;
mod server;
mod tools;

use config::{Config, Transport};
use feed::FeedFetcher;
use query::FeedQueryEngine;
use server::FeedService;
use tools::Dispatcher;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // stdout は MCP の stdio で使うのでログは stderr へ
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let fetcher =
        FeedFetcher::new(config.fetch_timeout()).context("HTTP クライアントの初期化に失敗")?;
    let engine = FeedQueryEngine::new(fetcher, config.feed_urls());
    let dispatcher = Arc::new(Dispatcher::new(engine));

    tracing::info!(transport = ?config.transport, "Starting feed-mcp");

    match config.transport {
        Transport::Stdio => {
            let service = FeedService::new(dispatcher).serve(stdio()).await?;
            service.waiting().await?;
        }
        Transport::Sse => {
            let shutdown = shutdown_token();
            let server_ct = SseServer::serve(config.bind)
                .await
                .with_context(|| format!("{} で listen できません", config.bind))?
                .with_service(move || FeedService::new(dispatcher.clone()));
            tracing::info!(bind = %config.bind, "MCP SSE server listening");

            shutdown.cancelled().await;
            server_ct.cancel();
        }
        Transport::Http => {
            let shutdown = shutdown_token();
            let listener = tokio::net::TcpListener::bind(config.bind)
                .await
                .with_context(|| format!("{} で listen できません", config.bind))?;
            tracing::info!(bind = %config.bind, "HTTP API listening");

            axum::serve(listener, http::router(dispatcher))
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await?;
        }
    }

    tracing::info!("Stopped");
    Ok(())
}

/// Ctrl-C でキャンセルされるトークン
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutting down");
                child.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
    token
}
