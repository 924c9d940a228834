//! Quicpool - QUIC session pool demonstration
//!
//! This is the main entry point for the echo server and load client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quicpool::config::{load_config, Config, DEFAULT_ALPN};
use quicpool::echo::{run_load, EchoServer, LoadOptions};
use quicpool::helper::{parse_server_list, DEFAULT_CALLS, DEFAULT_LISTEN_ADDR, DEFAULT_SERVERS};
use quicpool::init_pool;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Quicpool - client-side QUIC session pool with an echo demo
#[derive(Parser, Debug)]
#[command(name = "quicpool")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_log: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a QUIC echo server
    Serve {
        /// Listen address
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen: SocketAddr,

        /// Certificate chain (PEM)
        #[arg(long)]
        cert: PathBuf,

        /// Private key (PEM)
        #[arg(long)]
        key: PathBuf,

        /// ALPN protocol to accept
        #[arg(long, default_value = DEFAULT_ALPN)]
        alpn: Vec<String>,
    },

    /// Drive echo calls through the session pool
    Client {
        /// Servers to call, split by ','
        #[arg(short, long, default_value = DEFAULT_SERVERS)]
        servers: String,

        /// Calls to each server per round
        #[arg(short = 'n', long, default_value_t = DEFAULT_CALLS)]
        calls: usize,

        /// Number of rounds
        #[arg(long, default_value_t = 2)]
        rounds: usize,

        /// Seconds to sleep between rounds
        #[arg(long, default_value_t = 60)]
        pause: u64,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    info!("Quicpool v{}", quicpool::VERSION);

    match args.command {
        Command::Serve {
            listen,
            cert,
            key,
            alpn,
        } => {
            let server = EchoServer::bind(listen, &cert, &key, &alpn, &Default::default())?;
            let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
            tokio::spawn(wait_for_signal(shutdown_tx));
            server.run(shutdown_rx).await
        }
        Command::Client {
            servers,
            calls,
            rounds,
            pause,
            config,
        } => {
            let config = match config {
                Some(path) => {
                    info!("Configuration loaded from: {:?}", path);
                    load_config(&path)?
                }
                None => Config::default(),
            };

            let pool = Arc::new(init_pool(&config).context("Failed to initialize pool")?);
            let options = LoadOptions {
                servers: parse_server_list(&servers),
                calls,
                rounds,
                pause: Duration::from_secs(pause),
            };

            let report = run_load(pool.clone(), &options).await;
            pool.close_all("client exit").await;

            let report = report?;
            if report.failed() > 0 {
                anyhow::bail!("{} calls failed", report.failed());
            }
            Ok(())
        }
    }
}

/// Handle Ctrl+C and termination signals (cross-platform)
async fn wait_for_signal(shutdown_tx: broadcast::Sender<bool>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down...");
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        // On Windows, only handle Ctrl+C
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down...");
    }

    let _ = shutdown_tx.send(true);
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_args() {
        let args = Args::try_parse_from([
            "quicpool", "serve", "--listen", "127.0.0.1:6000", "--cert", "c.pem", "--key",
            "k.pem",
        ])
        .unwrap();

        match args.command {
            Command::Serve { listen, alpn, .. } => {
                assert_eq!(listen, "127.0.0.1:6000".parse::<SocketAddr>().unwrap());
                assert_eq!(alpn, vec![DEFAULT_ALPN.to_string()]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_client_args() {
        let args = Args::try_parse_from([
            "quicpool", "client", "--servers", "a:1,b:2", "--calls", "3", "-c", "pool.toml",
        ])
        .unwrap();

        match args.command {
            Command::Client {
                servers,
                calls,
                rounds,
                config,
                ..
            } => {
                assert_eq!(parse_server_list(&servers), vec!["a:1", "b:2"]);
                assert_eq!(calls, 3);
                assert_eq!(rounds, 2);
                assert_eq!(config, Some(PathBuf::from("pool.toml")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_client_short_flags() {
        let args = Args::try_parse_from(["quicpool", "client", "-s", "a:1", "-n", "7"]).unwrap();
        match args.command {
            Command::Client { servers, calls, .. } => {
                assert_eq!(servers, "a:1");
                assert_eq!(calls, 7);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
