//! CLI interface for Lanes

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Evaluate automation lanes for a synthesis engine
#[derive(Parser)]
#[command(name = "lanes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a session file
    Check {
        /// Session file path
        #[arg(short, long, default_value = "session.yaml")]
        session: PathBuf,
    },

    /// Print a lane's value at a point in time (without smoothing)
    Eval {
        /// Session file path
        #[arg(short, long, default_value = "session.yaml")]
        session: PathBuf,

        /// Lane name
        #[arg(short, long)]
        lane: String,

        /// Time in seconds
        #[arg(short, long)]
        time: f64,
    },

    /// Print every lane per control frame as CSV
    Dump {
        /// Session file path
        #[arg(short, long, default_value = "session.yaml")]
        session: PathBuf,

        /// Control frame length in milliseconds
        #[arg(short, long, default_value = "10")]
        frame_ms: f64,
    },

    /// Record lane signals to a WAV file, one channel per lane
    Record {
        /// Session file path
        #[arg(short, long, default_value = "session.yaml")]
        session: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Control frame length in milliseconds
        #[arg(short, long, default_value = "10")]
        frame_ms: f64,

        /// Bits per sample: 16, 24 or 32 (float, unnormalized)
        #[arg(short, long, default_value = "16")]
        bits: u16,
    },

    /// Generate an example session file
    Init,
}

/// Quote a CSV field when it contains a separator, quote or line break
pub fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
