//! Library half of the `solace` terminal client: configuration, flags and
//! reply rendering. The binary in `main.rs` wires them to a
//! [`TurnController`](solace_turn::TurnController).

pub mod args;
pub mod config;
pub mod error;
pub mod printer;

pub use args::{CliOptions, usage};
pub use config::{DEFAULT_CONFIG_FILE, SolaceConfig};
pub use error::CliError;
pub use printer::ReplyPrinter;

/// Install the stderr log subscriber. `RUST_LOG` overrides the `warn`
/// default.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
