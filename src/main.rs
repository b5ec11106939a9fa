use std::sync::Arc;

use anyhow::Context;
use duet_signal::{
    auth::IdentityVerifier,
    config::Config,
    feedback::TracingFeedbackSink,
    logging,
    server::{self, AppState},
    Matchmaker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    logging::init(&config.log_level, config.log_format);

    let identity = match config.jwt_secret.as_deref() {
        Some(secret) => Some(IdentityVerifier::new(secret)),
        None => {
            tracing::warn!("JWT_SECRET not set, identify and feedback are disabled");
            None
        }
    };

    let state = AppState {
        matchmaker: Arc::new(Matchmaker::new(identity, Arc::new(TracingFeedbackSink))),
        ping_interval: config.ping_interval,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %listener.local_addr()?,
        "duet-signal listening"
    );

    server::serve(listener, state, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Could not listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    })
    .await?;

    Ok(())
}
