pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod models;
pub mod services;
pub mod state;

use tokio::signal;

use anyhow::Context;
use cli::{Cli, Commands};
pub use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };

    match command {
        Commands::Serve => {
            let prometheus_handle = install_metrics(&config)?;
            run_server(config, prometheus_handle).await
        }

        Commands::Init => cli::cmd_init(&config).await,

        command => {
            let state = SharedState::new(config).await?;
            cli::dispatch(&state, command).await
        }
    }
}

fn install_metrics(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

fn print_help() {
    println!("Coffee Fund v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("  coffeefund <command> [args]");
    println!();
    println!("COMMANDS:");
    println!("  serve                      Start the web API server");
    println!("  init                       Create config.toml and a starter price list");
    println!("  prices                     List coffee prices");
    println!("  totals                     Show derived spend totals");
    println!("  next-payer                 Show who pays for the next round");
    println!("  settle                     Settle a round for everyone with a favorite");
    println!("  purchase <user> <coffee>   Record a single purchase");
    println!("  history <user>             Show a user's history");
    println!("  reconcile                  Compare stored totals against history");
    println!();
    println!("Run 'coffeefund <command> --help' for details.");
}

async fn run_server(config: Config, prometheus_handle: Option<PrometheusHandle>) -> anyhow::Result<()> {
    info!("Coffee Fund v{} starting...", env!("CARGO_PKG_VERSION"));

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(api_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
