// Expense Tracker - Logging
// Tracing subscriber setup shared by the binaries

use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `EnvFilter` directive.
pub const LOG_ENV: &str = "EXPENSE_LOG";

/// Install a global fmt subscriber. `EXPENSE_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
