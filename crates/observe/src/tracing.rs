//! Structured logging setup (`tracing-subscriber`, §ambient "Logging").

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber.
///
/// `directives` seeds the `EnvFilter` (e.g. `"aether_router=debug,tower_http=info"`);
/// the `RUST_LOG` environment variable, if set, overrides it entirely rather
/// than merging with it, matching `EnvFilter`'s own precedence rules.
/// `json` switches the output format from human-readable to one-line JSON,
/// which is what we want once logs leave a developer's terminal and start
/// flowing into a log aggregator.
pub fn initialize(directives: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let subscriber = fmt().with_env_filter(filter).with_target(true);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
