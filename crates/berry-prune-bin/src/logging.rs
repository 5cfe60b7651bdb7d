//! Logging setup for the CLI. The library only emits events.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Env var read by clap for `--log`
pub const LOG_ENV: &str = "BERRY_PRUNE_LOG";

/// Install a stderr subscriber. An explicit filter (`--log` or
/// `BERRY_PRUNE_LOG`) wins over `RUST_LOG`, and without either the level is
/// `warn`, or `debug` with `--verbose`.
pub fn init(filter: Option<&str>, verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = match filter {
    Some(directives) => EnvFilter::try_new(directives).ok(),
    None => EnvFilter::try_from_default_env().ok(),
  }
  .unwrap_or_else(|| EnvFilter::new(default));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
    .init();
}
