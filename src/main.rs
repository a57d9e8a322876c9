use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use xdrive_teleop::bridge::{ZenohBridge, load_zenoh_config};
use xdrive_teleop::config::{INPUT_TIMEOUT, LOOP_PERIOD, RuntimeConfig};
use xdrive_teleop::runtime::Runtime;

/// Operator control runtime for an X-drive base
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Control loop period in milliseconds
    #[arg(long, default_value_t = LOOP_PERIOD.as_millis() as u64)]
    period_ms: u64,

    /// Release all inputs after this long without an operator sample
    #[arg(long, default_value_t = INPUT_TIMEOUT.as_millis() as u64)]
    input_timeout_ms: u64,

    /// Zenoh config file (JSON5); default peer config when omitted
    #[arg(long)]
    zenoh_config: Option<String>,
}

impl Args {
    fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            period: Duration::from_millis(self.period_ms.max(1)),
            input_timeout: Duration::from_millis(self.input_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = args.runtime_config();
    let zenoh_config = load_zenoh_config(args.zenoh_config.as_deref())?;
    let bridge = ZenohBridge::open(zenoh_config, config.input_timeout).await?;
    let mut runtime = Runtime::new(bridge, config);

    tokio::select! {
        result = runtime.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Interrupted, ending operator control session");
        }
    }

    if let Err(e) = runtime.shutdown().await {
        error!("Failed to stop motors on shutdown: {}", e);
        return Err(e.into());
    }
    Ok(())
}
