use promoplan::{App, ApiService, AppConfig, Pool};
use may_minihttp::HttpServer;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    may::config().set_workers(
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4),
    );

    let config = AppConfig::load()?;
    tracing::info!(bind = %config.bind, version = %config.api_version, "starting");

    let pool = Pool::connect(
        &config.database.url,
        config.database.pool_size,
        std::time::Duration::from_secs(config.database.pool_timeout_seconds),
    )?;
    promoplan::schema::bootstrap(&pool.executor())?;

    let bind = config.bind.clone();
    let app = Arc::new(App::new(config, pool));
    let server = HttpServer(ApiService::new(app)).start(&bind)?;
    tracing::info!(%bind, "listening");
    server.join().map_err(|e| format!("server stopped: {e:?}"))?;
    Ok(())
}
