use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokenscan::api::handlers::read_image;
use tokenscan::cache::CounterStore;
use tokenscan::models::request::OcrData;
use tokenscan::models::token::Provenance;
use tokenscan::{api, config, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Export spans over OTLP only when a collector endpoint is configured.
    use opentelemetry::KeyValue;

    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "tokenscan"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tokenscan=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(telemetry_layer)
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Scan { text, image }) => scan(text, image).await,
        Some(cli::Commands::Ocr { url, scan }) => ocr(cfg, &url, scan).await,
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", cfg.host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, port))?;

    let state = Arc::new(AppState::connect(cfg).await?);

    // Sweep expired in-process rate limit windows.
    if !state.counters.is_distributed() {
        spawn_counter_sweep(state.counters.clone());
    }

    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("tokenscan listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn spawn_counter_sweep(counters: CounterStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = counters.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, remaining = counters.local_len(), "rate limit windows swept");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down server...");
}

async fn scan(text: Option<String>, image: bool) -> anyhow::Result<()> {
    let text = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            buf
        }
    };
    let provenance = if image { Provenance::Image } else { Provenance::Text };
    let verdict = tokenscan::parser::validate(&text, provenance);
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

async fn ocr(mut cfg: config::Config, url: &str, scan: bool) -> anyhow::Result<()> {
    // One-shot command: no rate limiting, no Redis.
    cfg.redis_url = None;
    cfg.metrics_enabled = false;
    let state = AppState::connect(cfg).await?;

    let text = read_image(&state, url).await?;

    if scan {
        let verdict = state.validator.validate(&text, Provenance::Image);
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&OcrData::new(url, text))?);
    }
    Ok(())
}
