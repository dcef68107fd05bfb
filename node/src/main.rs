// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Confidential Token Ledger Node
//!
//! Entry point for the `ctoken-node` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the ledger database and either
//! serves it over HTTP or runs a single request offline.
//!
//! Subcommands:
//!
//! - `run`: serve the JSON-RPC/REST API and the metrics endpoint
//! - `call`: execute one ledger request against the local database
//! - `show`: print an account or the ledger summary
//! - `status`: query a running node's status endpoint
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use ctoken_protocol::crypto::derive_tx_hash;
use ctoken_protocol::{DigestOracle, InvocationContext, Ledger, LedgerDb, Request};

use cli::{Commands, CtokenNodeCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CtokenNodeCli::parse();

    match cli.command {
        Commands::Run(args) => {
            logging::init_logging(logging::SERVER_FILTER, cli.log_format);
            run_node(args).await
        }
        Commands::Call(args) => {
            logging::init_logging(logging::OFFLINE_FILTER, cli.log_format);
            call(args)
        }
        Commands::Show(args) => {
            logging::init_logging(logging::OFFLINE_FILTER, cli.log_format);
            show(args)
        }
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens (creating if needed) the ledger database under the data directory.
fn open_ledger(data: &cli::DataDirArg) -> Result<Ledger<DigestOracle>> {
    let db_path = data.db_path();
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let db = open_db(&db_path)?;
    tracing::info!(path = %db_path.display(), "database opened");
    Ok(Ledger::new(db, DigestOracle::new()))
}

fn open_db(path: &Path) -> Result<LedgerDb> {
    LedgerDb::open(path).with_context(|| format!("failed to open database at {}", path.display()))
}

/// Starts the node: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data.data_dir.display(),
        "starting ctoken-node"
    );

    let ledger = open_ledger(&args.data)?;

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);
    node_metrics.set_max_token_id(ledger.max_id()?);

    // --- Application state ---
    let app_state = api::AppState::new(
        format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            ctoken_protocol::config::PROTOCOL_VERSION,
        ),
        ledger,
        Arc::clone(&node_metrics),
    );

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("ctoken-node stopped");
    Ok(())
}

/// Executes one ledger request offline and prints the outcome as JSON.
fn call(args: cli::CallArgs) -> Result<()> {
    let input = match (&args.input, &args.file) {
        (Some(input), _) => input.clone(),
        (None, Some(file)) => std::fs::read_to_string(file)
            .with_context(|| format!("failed to read request from {}", file.display()))?,
        (None, None) => anyhow::bail!("either --input or --file is required"),
    };

    let ledger = open_ledger(&args.data)?;
    let request = Request::parse(&input)?;

    let tx_hash = match args.tx_hash {
        Some(tx_hash) => tx_hash,
        None => {
            let sequence = ledger.max_id()?.value();
            derive_tx_hash(&args.sender, input.as_bytes(), sequence)
        }
    };
    let ctx = InvocationContext::new(args.sender, tx_hash);

    let outcome = ledger
        .dispatch(&ctx, &request)
        .with_context(|| format!("{} rejected", request.method()))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "tx_hash": ctx.tx_hash,
            "result": outcome,
        }))?
    );
    Ok(())
}

/// Prints one account, or the ledger summary when no account is given.
fn show(args: cli::ShowArgs) -> Result<()> {
    let ledger = open_ledger(&args.data)?;

    let value = match &args.account {
        Some(account_id) => {
            let account = ledger
                .account(account_id)?
                .with_context(|| format!("account not found: {account_id}"))?;
            serde_json::json!({
                "account": account_id,
                "tokens": account.tokens().collect::<Vec<_>>(),
            })
        }
        None => serde_json::json!({
            "metadata": ledger.metadata()?,
            "max_id": ledger.max_id()?.to_string(),
            "accounts": ledger.db().account_ids()?,
            "verdicts": ledger.last_verdicts()?,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let body = http_get(&args.rpc_addr, "/status").await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP/1.1 GET over a raw tokio TCP stream.
async fn http_get(addr: &str, path: &str) -> Result<String> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let addr = addr
        .strip_prefix("http://")
        .unwrap_or(addr)
        .trim_end_matches('/');
    let host = addr.rsplit_once(':').map_or(addr, |(host, _)| host);

    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Body starts after the first blank line.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("ctoken-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", ctoken_protocol::config::PROTOCOL_VERSION);
    println!(
        "standard    {}",
        ctoken_protocol::config::TOKEN_STANDARD_VERSION
    );
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. A handler that cannot
/// be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
