use std::{net::SocketAddr, time::Duration};

/// Top-level process configuration, composed of `#[clap(flatten)]` groups
/// the way `autopilot::arguments::Arguments` composes its sub-structs.
/// Every field is settable by a `CONFIG_*` environment variable (§6).
#[derive(clap::Parser, Debug)]
#[clap(name = "aether-router")]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: Logging,

    #[clap(flatten)]
    pub server: Server,

    #[clap(flatten)]
    pub database: Database,

    #[clap(flatten)]
    pub cors: Cors,

    #[clap(flatten)]
    pub bridges: Bridges,

    #[clap(flatten)]
    pub auth: Auth,
}

#[derive(clap::Parser, Debug)]
pub struct Logging {
    /// `tracing-subscriber` `EnvFilter` directives, overridden entirely by
    /// `RUST_LOG` if that's set.
    #[clap(long, env = "CONFIG_LOG_FILTER", default_value = "info")]
    pub log_filter: String,

    /// Emit one-line JSON log records instead of the human-readable format.
    #[clap(long, env = "CONFIG_LOG_JSON")]
    pub log_json: bool,
}

#[derive(clap::Parser, Debug)]
pub struct Server {
    #[clap(long, env = "CONFIG_BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    pub bind_address: SocketAddr,

    #[clap(long, env = "CONFIG_METRICS_ADDRESS", default_value = "0.0.0.0:9090")]
    pub metrics_address: SocketAddr,

    /// Request bodies larger than this many bytes are rejected before
    /// reaching a handler (§4.7 "payload-size DoS defense").
    #[clap(long, env = "CONFIG_MAX_BODY_BYTES", default_value = "65536")]
    pub max_body_bytes: usize,
}

#[derive(clap::Parser, Debug)]
pub struct Database {
    #[clap(long, env = "CONFIG_DATABASE_URL", default_value = "postgresql://")]
    pub database_url: String,

    #[clap(long, env = "CONFIG_DATABASE_MAX_CONNECTIONS", default_value = "10")]
    pub max_connections: u32,
}

#[derive(clap::Parser, Debug)]
pub struct Cors {
    /// Comma-separated allow-list of origins. Requests from any other
    /// origin receive a preflight response with no allow-origin header
    /// (§4.5 "CORS").
    #[clap(long, env = "CONFIG_CORS_ORIGINS", use_value_delimiter = true)]
    pub cors_origins: Vec<String>,
}

#[derive(clap::Parser, Debug)]
pub struct Bridges {
    /// Flat CCIP fee quoted for every lane it supports.
    #[clap(long, env = "CONFIG_CCIP_FEE", default_value = "1.50")]
    pub ccip_fee: String,

    /// Flat Hyperlane fee quoted for every lane it supports.
    #[clap(long, env = "CONFIG_HYPERLANE_FEE", default_value = "1.75")]
    pub hyperlane_fee: String,
}

#[derive(clap::Parser, Debug)]
pub struct Auth {
    #[clap(
        long,
        env = "CONFIG_NONCE_TTL_SECS",
        default_value = "300",
        value_parser = duration_from_seconds,
    )]
    pub nonce_ttl: Duration,

    #[clap(long, env = "CONFIG_APP_TAG", default_value = "AetherRouter")]
    pub app_tag: String,
}

fn duration_from_seconds(s: &str) -> Result<Duration, std::num::ParseIntError> {
    s.parse().map(Duration::from_secs)
}
