//! Tilecast pairing and synchronized playback server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tilecast-server
//! cargo run --bin tilecast-server -- --host 0.0.0.0 --port 3000 --code-ttl-secs 120
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use tilecast_server::{
    config::ServerConfig, infrastructure::code_generator::RandomCodeGenerator, ui::Server,
};
use tilecast_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tilecast-server")]
#[command(about = "Pairing and synchronized video wall playback server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Lifetime of a pairing code in seconds
    #[arg(long, default_value = "300")]
    code_ttl_secs: u64,

    /// Number of clients a single pairing code can pair
    #[arg(long, default_value = "1")]
    code_max_uses: u32,

    /// Codes an admin may generate per rate window
    #[arg(long, default_value = "3")]
    issue_limit: u32,

    /// Code entries a connection may attempt per rate window
    #[arg(long, default_value = "5")]
    redeem_limit: u32,

    /// Rate limit window in seconds
    #[arg(long, default_value = "60")]
    rate_window_secs: u64,

    /// Interval of the expired code sweep in seconds
    #[arg(long, default_value = "60")]
    code_sweep_secs: u64,

    /// Interval of the liveness sweep in seconds
    #[arg(long, default_value = "25")]
    liveness_sweep_secs: u64,

    /// Seconds of silence after which a connection is dropped
    #[arg(long, default_value = "75")]
    liveness_timeout_secs: u64,

    /// Maximum number of simultaneous connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            code_ttl: Duration::from_secs(args.code_ttl_secs),
            code_max_uses: args.code_max_uses,
            issue_limit: args.issue_limit,
            redeem_limit: args.redeem_limit,
            rate_window: Duration::from_secs(args.rate_window_secs),
            code_sweep_interval: Duration::from_secs(args.code_sweep_secs),
            liveness_sweep_interval: Duration::from_secs(args.liveness_sweep_secs),
            liveness_timeout: Duration::from_secs(args.liveness_timeout_secs),
            max_connections: args.max_connections,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::from(Args::parse());
    tracing::debug!("Starting with {:?}", config);

    // Repository, MessagePusher and UseCases are wired inside the server
    let server = Server::from_config(
        &config,
        Arc::new(SystemClock),
        Box::new(RandomCodeGenerator::new()),
    );
    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
