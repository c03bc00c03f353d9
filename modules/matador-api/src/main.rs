use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use matador_api::{router, AppState};
use matador_common::Config;
use matador_report::{MemoryReportStore, PgReportStore, ReportDeps, ReportGenerator, ReportStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("matador=info".parse()?))
        .init();

    let config = Config::from_env()?;
    config.log_redacted();

    let store: Arc<dyn ReportStore> = match &config.database_url {
        Some(url) => {
            let store = PgReportStore::connect(url).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, reports are kept in memory only");
            Arc::new(MemoryReportStore::new())
        }
    };

    let state = Arc::new(AppState {
        generator: ReportGenerator::new(ReportDeps::from_config(&config)?),
        store,
    });

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Matador API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
