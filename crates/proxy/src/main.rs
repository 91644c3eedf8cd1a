//! Batching Proxy - Main Entry Point
//!
//! Single-process proxy sitting in front of a slow downstream classification service: admits
//! single-item requests, micro-batches them under a pluggable strategy, and dispatches them
//! serially.

use proxy::downstream::DownstreamClient;
use proxy::queue::PendingQueue;
use proxy::strategy::StrategyRegistry;
use proxy::{build_router, scheduler, AppState};
use proxy_common::{ProxyConfig, METRICS};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxy=info,tower_http=info,axum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting batching proxy");

    let config = match ProxyConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration, exiting");
            std::process::exit(1);
        }
    };

    info!(
        strategy = %config.initial_strategy,
        downstream_url = %config.downstream_url,
        max_batch = config.max_batch,
        bind = format!("{}:{}", config.bind_address, config.port),
        "configuration loaded"
    );

    let downstream =
        match DownstreamClient::new(config.downstream_url.clone(), config.downstream_timeout) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                error!(error = %err, "failed to build downstream client, exiting");
                std::process::exit(1);
            }
        };

    let queue = Arc::new(PendingQueue::new());
    let strategy = Arc::new(StrategyRegistry::new(config.initial_strategy));
    let metrics = &*METRICS;

    let scheduler_handle = tokio::spawn(scheduler::run(
        queue.clone(),
        strategy.clone(),
        downstream,
        config.max_batch,
        metrics,
    ));

    let state = Arc::new(AppState {
        queue,
        strategy,
        metrics,
    });
    let app = build_router(state);

    let addr: SocketAddr = match format!("{}:{}", config.bind_address, config.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!(error = %err, "invalid bind address, exiting");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, %addr, "failed to bind HTTP listener, exiting");
            std::process::exit(1);
        }
    };

    info!(%addr, "batching proxy listening");

    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()) => {
            if let Err(err) = result {
                error!(error = %err, "HTTP server exited with error");
            }
        }
        result = scheduler_handle => {
            if let Err(err) = result {
                error!(error = %err, "dispatcher task panicked");
            }
        }
    }

    info!("batching proxy shutdown complete");
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("received shutdown signal"),
        Err(err) => error!(error = %err, "failed to install Ctrl+C handler"),
    }
}
