//! Lightning strike monitor.
//!
//! Connects to the strike feed and prints every strike until Ctrl+C,
//! SIGTERM or the feed closes.
//!
//! Usage:
//!   strike-monitor
//!   strike-monitor --debug
//!   strike-monitor --url wss://ws1.blitzortung.org/
//!   strike-monitor --geocoder https://nominatim.openstreetmap.org/reverse
//!   strike-monitor --no-geocode
//!
//! `RUST_LOG` overrides the log filter.

// ============================================================================
// Imports
// ============================================================================

use strike_monitor::{Monitor, MonitorConfig, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
struct Args {
    debug: bool,
    url: Option<String>,
    geocoder: Option<String>,
    no_geocode: bool,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url: value_of(&args, "--url"),
            geocoder: value_of(&args, "--geocoder"),
            no_geocode: args.iter().any(|a| a == "--no-geocode"),
        }
    }

    /// Applies the arguments on top of the default configuration.
    fn config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::new();
        if let Some(url) = &self.url {
            config = config.with_url(url.as_str());
        }
        if let Some(geocoder) = &self.geocoder {
            config = config.with_geocoder_url(geocoder.as_str());
        }
        if self.no_geocode {
            config = config.without_geocoding();
        }
        config
    }
}

/// Returns the value following `flag`, if any. Another flag is not a value.
fn value_of(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|value| !value.starts_with("--"))
        .cloned()
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(&args).await {
        error!(error = %e, "Monitor failed");
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let monitor = Monitor::new(args.config())?;
    monitor.run(shutdown_signal()).await?;

    info!("Lightning Strike Monitor stopped");
    Ok(())
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "strike_monitor=debug"
    } else {
        "strike_monitor=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}

// ============================================================================
// Tests
// ============================================================================
