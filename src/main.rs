/// Wisper - anonymous short-post server
///
/// A vote-gated content ledger with real-time notification fan-out:
/// users post wispers, vote on them once each, comment, and receive
/// push notifications over WebSocket when their content is interacted with.

mod api;
mod config;
mod context;
mod db;
mod error;
mod fanout;
mod jobs;
mod ledger;
mod metrics;
mod notify;
mod rate_limit;
mod server;
mod validation;
mod votes;

use config::ServerConfig;
use context::AppContext;
use error::WisperResult;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> WisperResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wisper=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Print banner
    print_banner();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;
    let ctx = Arc::new(ctx);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
 _       ___
| |     / (_)________  ___  _____
| | /| / / / ___/ __ \/ _ \/ ___/
| |/ |/ / (__  ) /_/ /  __/ /
|__/|__/_/____/ .___/\___/_/
             /_/

        Anonymous wisper server v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
