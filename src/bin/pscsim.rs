//! PSC DAQ front-end simulator
//!
//! Binds the control and data UDP channels and runs the single-task
//! event loop until interrupted.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pscsim::config::SimConfig;
use pscsim::network::Simulator;

#[derive(Parser, Debug)]
#[command(version, about = "UDP simulator for a PSC-style DAQ front end")]
struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address both UDP channels bind to
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Control channel port
    #[arg(long)]
    cport: Option<u16>,

    /// Data channel port
    #[arg(long)]
    dport: Option<u16>,

    /// Waveform tick period in milliseconds
    #[arg(long)]
    period_ms: Option<u64>,

    /// Subscriber liveness timeout in milliseconds
    #[arg(long)]
    stream_timeout_ms: Option<u64>,

    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes priority
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(port) = self.cport {
            config.control_port = port;
        }
        if let Some(port) = self.dport {
            config.data_port = port;
        }
        if let Some(ms) = self.period_ms {
            config.tick_period_ms = ms;
        }
        if let Some(ms) = self.stream_timeout_ms {
            config.stream_timeout_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolves on SIGINT or, on unix, SIGTERM
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = term.recv() => {}
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.into_config()?;
    let simulator = Simulator::bind(&config).await?;

    tracing::info!("running");
    tokio::select! {
        result = simulator.run() => result?,
        result = shutdown_signal() => {
            result?;
            tracing::info!("shutting down");
        }
    }
    Ok(())
}
