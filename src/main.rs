use std::sync::Arc;

use anyhow::Context;
use fit_coach::config::AppConfig;
use fit_coach::llm::{LlmConfig, create_provider};
use fit_coach::server::{self, AppServices};
use fit_coach::store::{Database, LibSqlBackend};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Console logging, plus a daily-rolling file when `log_dir` is set.
///
/// The returned guard must live until shutdown or buffered lines are lost.
fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "fit-coach.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let _log_guard = init_tracing(&config);

    eprintln!("🏋️ fit-coach v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   API: http://{}/api", config.bind_addr());
    if config.development_mode {
        eprintln!("   Development mode: serving the default routine");
    }

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── LLM ──────────────────────────────────────────────────────────────
    let llm = match LlmConfig::from_app(&config) {
        Some(llm_config) => Some(create_provider(&llm_config)?),
        None => {
            tracing::warn!("OPENAI_API_KEY not set, model calls are disabled");
            None
        }
    };

    // ── HTTP ─────────────────────────────────────────────────────────────
    let services = AppServices::new(&config, db, llm);
    let router = server::build_router(&services, server::cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    server::serve(listener, router).await?;

    Ok(())
}
