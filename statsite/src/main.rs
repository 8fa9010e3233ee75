use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use statsite_core::{shutdown_channel, Clock, GraphiteSink, SystemClock};

mod config;
mod error;
mod ingest;
mod liveness;

use config::Config;
use error::StatsiteError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file. Missing keys fall back to defaults.
    #[arg(long, default_value = "statsite.toml")]
    config: PathBuf,

    #[arg(long)]
    collector_host: Option<String>,
    #[arg(long)]
    collector_port: Option<u16>,
    #[arg(long)]
    store_host: Option<String>,
    #[arg(long)]
    store_port: Option<u16>,
    #[arg(long)]
    store_prefix: Option<String>,
    #[arg(long)]
    flush_interval: Option<u64>,
    #[arg(long)]
    percentile: Option<u32>,
}

impl Args {
    /// Applies CLI overrides on top of a loaded config — the third and
    /// final layer of `defaults < config file < CLI` precedence.
    fn apply_overrides(&self, mut cfg: Config) -> Config {
        if let Some(v) = &self.collector_host {
            cfg.collector.host = v.clone();
        }
        if let Some(v) = self.collector_port {
            cfg.collector.port = v;
        }
        if let Some(v) = &self.store_host {
            cfg.store.host = v.clone();
        }
        if let Some(v) = self.store_port {
            cfg.store.port = v;
        }
        if let Some(v) = &self.store_prefix {
            cfg.store.prefix = v.clone();
        }
        if let Some(v) = self.flush_interval {
            cfg.flush_interval = v;
        }
        if let Some(v) = self.percentile {
            cfg.metrics.ms.percentile = v;
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!(error = %err, "fatal error, exiting");
        return Err(Box::new(err));
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), StatsiteError> {
    let cfg = args.apply_overrides(Config::load(&args.config)?);
    cfg.validate()?;
    info!(?cfg, "starting statsite");

    let (shutdown_handle, shutdown) = shutdown_channel();

    let collector_addr: SocketAddr = format!("{}:{}", cfg.collector.host, cfg.collector.port)
        .parse()
        .map_err(|_| StatsiteError::InvalidConfig {
            reason: format!("bad collector address {}:{}", cfg.collector.host, cfg.collector.port),
        })?;

    let udp_socket = ingest::udp::bind(collector_addr).map_err(|source| StatsiteError::Bind {
        addr: collector_addr.to_string(),
        source,
    })?;
    let tcp_listener = TcpListener::bind(collector_addr)
        .await
        .map_err(|source| StatsiteError::Bind {
            addr: collector_addr.to_string(),
            source,
        })?;

    let sink = Arc::new(GraphiteSink::new(
        cfg.store.host.clone(),
        cfg.store.port,
        format!("{}.", cfg.store.prefix),
        cfg.store.attempts,
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (handle, tick_task, fold_task) = statsite_core::spawn(
        std::time::Duration::from_secs(cfg.flush_interval),
        cfg.metrics.ms.percentile,
        sink,
        clock,
        shutdown.clone(),
    );

    let udp_task = tokio::spawn(ingest::udp::serve(udp_socket, handle.clone(), shutdown.clone()));
    let tcp_task = tokio::spawn(ingest::tcp::serve(tcp_listener, handle, shutdown.clone()));

    let liveness_task = if cfg.aliveness_check.enabled {
        let addr: SocketAddr = format!("{}:{}", cfg.aliveness_check.host, cfg.aliveness_check.port)
            .parse()
            .map_err(|_| StatsiteError::InvalidConfig {
                reason: format!(
                    "bad aliveness_check address {}:{}",
                    cfg.aliveness_check.host, cfg.aliveness_check.port
                ),
            })?;
        let listener = TcpListener::bind(addr).await.map_err(|source| StatsiteError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        info!(%addr, "liveness responder enabled");
        Some(tokio::spawn(liveness::serve(listener, shutdown.clone())))
    } else {
        None
    };

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received ctrl-c, shutting down");
        shutdown_handle.trigger();
    });

    let _ = tokio::join!(udp_task, tcp_task, tick_task);

    // Give a fold already in flight a bounded window to finish reaching the
    // sink before the process tears the task down with it.
    if tokio::time::timeout(std::time::Duration::from_secs(5), fold_task)
        .await
        .is_err()
    {
        info!("fold worker did not finish within the shutdown grace period");
    }
    if let Some(task) = liveness_task {
        task.abort();
    }

    Ok(())
}
