//! Strike output.
//!
//! The pipeline hands every finished strike to an [`Emitter`].
//! [`ConsoleEmitter`] prints a human-readable report to stdout.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::{self, Write as _};

use tracing::warn;

use crate::protocol::Strike;

// ============================================================================
// Constants
// ============================================================================

/// Width of the report separators.
const RULE_WIDTH: usize = 80;

// ============================================================================
// Emitter
// ============================================================================

/// Receives processed strikes, in feed order.
pub trait Emitter: Send + Sync {
    /// Called once after the feed subscription was sent.
    fn started(&self) {}

    /// Called for every strike with its location label or the unknown sentinel.
    fn emit(&self, strike: &Strike, location: &str);
}

// ============================================================================
// ConsoleEmitter
// ============================================================================

/// Prints strike reports to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEmitter;

impl Emitter for ConsoleEmitter {
    fn started(&self) {
        write_stdout(
            "Lightning Strike Monitor started. Press Ctrl+C to stop.\n\
             Waiting for lightning strikes...\n\n",
        );
    }

    fn emit(&self, strike: &Strike, location: &str) {
        write_stdout(&render_report(strike, location));
    }
}

/// Writes to stdout, logging failures instead of panicking.
fn write_stdout(text: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        warn!(error = %e, "Failed to write to stdout");
    }
}

// ============================================================================
// Report
// ============================================================================

/// Renders the console report for one strike.
#[must_use]
pub fn render_report(strike: &Strike, location: &str) -> String {
    let mut out = String::with_capacity(1024);
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, strike, location);
    out
}

/// Writes the report lines for one strike.
fn write_report(out: &mut impl fmt::Write, strike: &Strike, location: &str) -> fmt::Result {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let time = strike.timestamp().format("%Y-%m-%d %H:%M:%S%.3f UTC");

    writeln!(out, "{heavy}")?;
    writeln!(out, "LIGHTNING STRIKE DETECTED")?;
    writeln!(out, "{heavy}")?;
    writeln!(out, "Time: {time}")?;
    writeln!(out, "Coordinates: {:.6}, {:.6}", strike.lat, strike.lon)?;
    writeln!(out, "Location: {location}")?;
    writeln!(out, "Altitude: {} meters", strike.alt)?;
    writeln!(out, "Polarity: {}", strike.polarity())?;
    writeln!(out, "Processing delay: {:.3} seconds", strike.delay)?;
    writeln!(out, "Localization quality (MCG): {}", strike.mcg)?;
    writeln!(out, "Max distance to stations: {} meters", strike.mds)?;
    writeln!(out, "Status: {}", strike.status())?;
    writeln!(out, "Region: {}", strike.region)?;
    writeln!(out, "Detection stations: {}", strike.sig.len())?;

    if !strike.sig.is_empty() {
        writeln!(out, "Station details:")?;
        for (i, sig) in strike.sig.iter().enumerate() {
            writeln!(
                out,
                "  [{}] ID: {}, Location: {:.6}, {:.6}, Alt: {} m, Status: {}",
                i + 1,
                sig.sta,
                sig.lat,
                sig.lon,
                sig.alt,
                sig.status
            )?;
        }
    }

    writeln!(out, "{light}")?;
    writeln!(out)
}

// ============================================================================
// Tests
// ============================================================================
