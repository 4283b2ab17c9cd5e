//! Huddle CLI and webhook server entry point.
//!
//! Binary name: `huddle`
//!
//! Parses CLI arguments, loads configuration, opens the database, then
//! dispatches to the requested command or starts the webhook server.

mod cli;
mod http;
mod state;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use huddle_core::sweeper::SweepScheduler;
use huddle_infra::config::{database_url, load_config, resolve_data_dir};
use huddle_infra::sqlite::pool::DatabasePool;
use huddle_observe::{TracingConfig, default_filter, init_tracing, shutdown_tracing};
use huddle_types::config::HuddleConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig {
        default_filter: default_filter(cli.verbose).to_string(),
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Classification needs neither config nor database
    if let Commands::Classify { text } = &cli.command {
        return cli::classify::classify_text(&text.join(" "), cli.json);
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(resolve_data_dir);
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let mut config = load_config(&data_dir).await;
    let db_pool = open_database(&config, &data_dir).await?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(db_pool.clone(), &config).await?;
        }

        Commands::Sweep => {
            let state = AppState::new(db_pool.clone(), &config)?;
            cli::sweep::run_sweep(&state, cli.json).await?;
        }

        Commands::Migrate => {
            if cli.json {
                println!("{}", serde_json::json!({ "migrated": true }));
            } else {
                println!();
                println!("  {} Database is up to date", console::style("✓").green());
                println!();
            }
        }

        Commands::Classify { .. } => unreachable!("handled above"),
    }

    db_pool.close().await;
    Ok(())
}

/// Open the database, applying pending migrations.
async fn open_database(config: &HuddleConfig, data_dir: &Path) -> anyhow::Result<DatabasePool> {
    let url = database_url(config, data_dir);
    DatabasePool::new(&url)
        .await
        .with_context(|| format!("failed to open database at {url}"))
}

async fn serve(db_pool: DatabasePool, config: &HuddleConfig) -> anyhow::Result<()> {
    for setting in config.missing_settings() {
        tracing::warn!(setting, "required setting is not configured");
    }

    let state = AppState::new(db_pool, config)?;

    let scheduler = SweepScheduler::new();
    scheduler
        .start(Arc::new(state.sweeper()), &config.session.cleanup_schedule)
        .await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "huddle listening");
    println!(
        "  {} Huddle listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await?;
    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
