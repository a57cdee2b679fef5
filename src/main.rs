use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod handlers;

use handlers::{health, lottery};
use tyche::config::AppConfig;
use tyche::scraper::LotteryScraper;

/// Application state shared across handlers
pub struct AppState {
    pub scraper: LotteryScraper,
}

/// Log filter from `RUST_LOG` directives, INFO when none are given
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (also captures actix's `log` records)
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    FmtSubscriber::builder()
        .with_env_filter(log_filter(&directives))
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    let config = AppConfig::load()?;
    let addr = config.server.addr();

    info!(
        "Scraping {} ({}, timeout {}s)",
        config.scraper.base_url, config.scraper.encoding, config.scraper.timeout_secs
    );
    let scraper = LotteryScraper::new(config.scraper.clone())?;

    let app_state = Arc::new(AppState { scraper });

    info!("Starting tyche server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/version", web::get().to(health::version))
            .route("/terms", web::get().to(lottery::list_terms))
            .route("/terms/latest", web::get().to(lottery::latest_award))
            .route("/awards/{term}", web::get().to(lottery::get_award))
    })
    .bind(&addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
