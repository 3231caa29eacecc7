use std::sync::Arc;

use fibserve::app::App;
use fibserve::cache::FibCache;
use clap::Parser;
use fibserve::config::Config;
use fibserve::fib::{FibEngine, FibService};
use fibserve::server::Server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fibserve=info")),
        )
        .init();

    let config = Config::parse();
    info!(
        addr = %config.addr,
        cache_capacity = config.cache_capacity.get(),
        timeout = ?config.timeout,
        "starting fibserve"
    );
    if !config.timeout_matches_message() {
        warn!(
            timeout = ?config.timeout,
            "timeout responses still say 60 seconds; they will not match the configured budget"
        );
    }

    let cache = Arc::new(FibCache::new(config.cache_capacity));
    let service = FibService::new(FibEngine::new(cache), config.timeout);
    let app = App::fib(service);

    let server = Server::bind(&config.addr).await?;
    server
        .run_until(
            move |req| {
                let app = app.clone();
                async move { app.handle(req).await }
            },
            shutdown_signal(),
        )
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
