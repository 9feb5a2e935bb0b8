//! Tello CLI - operator tools for the voice agent.
//!
//! Binaries:
//! - tello_command: send raw SDK commands through the restriction layer
//! - lint_sequence: check a JSON command sequence before flying it
//! - analyze_image: run the vision analysis on a still image
//! - record_video: dump the drone's H.264 stream to a file

pub mod lint;
pub mod report;

pub use lint::{load_sequence, LintReport};
pub use report::render_report;

/// Log to stderr at `warn` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
