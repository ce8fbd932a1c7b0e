use keyword_mcp::config::Config;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env().map_err(|e| format!("invalid configuration: {e}"))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let state = keyword_mcp::router::McpState::new(cfg.clone())?;

    info!(
        addr = %cfg.listen_addr(),
        loglevel = %cfg.loglevel,
        database = state.db.is_some(),
        dataforseo = state.dataforseo.is_configured(),
        gemini = cfg.google_api_key().is_some(),
        s3 = state.images.is_some(),
        auth = cfg.auth_token().is_some(),
        tools = state.tools.len(),
    );

    if let Some(db) = state.db.as_ref() {
        match db.init_schema().await {
            Ok(()) => info!("strategies table ready"),
            Err(e) => warn!(error = %e, "failed to initialize database schema"),
        }
    }

    let app = keyword_mcp::router::mcp_router(state);

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
