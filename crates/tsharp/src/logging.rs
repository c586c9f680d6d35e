//! Log output for the compiler.
//!
//! The library crates only emit `tracing` events; nothing is printed until
//! [`init`] installs a subscriber.

use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Environment variable holding filter directives
/// (`TSHARP_LOG=tsharp_ir=trace`). Overrides the level given to [`init`].
pub const LOG_ENV: &str = "TSHARP_LOG";

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Send log events at `level` and above to stderr. Only the first call
/// has an effect.
pub fn init(level: Level) {
    INITIALISED.get_or_init(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(level).into())
            .with_env_var(LOG_ENV)
            .from_env_lossy();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .finish();
        // Another subscriber may already be installed by the host.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(Level::WARN);
        init(Level::TRACE);
        assert!(INITIALISED.get().is_some());
    }
}
