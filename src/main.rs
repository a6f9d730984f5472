use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;

use staffdesk::config::Config;
use staffdesk::db::{ensure_bootstrap_admin, init_db};
use staffdesk::docs::openapi_for;
use staffdesk::routes::{self, Limiters};
use staffdesk::utils::username_index::UsernameIndex;

use tracing::info;
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    ensure_bootstrap_admin(&pool, &config).await?;

    let index = Data::new(UsernameIndex::new());
    index
        .warmup(&pool, 500)
        .await
        .context("Failed to warm up username index")?;

    let limiters = Limiters::from_config(&config)?;
    let server_addr = config.server_addr.clone();
    let pool = Data::new(pool);
    let config = Data::new(config);

    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", openapi_for(&config)),
            )
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(index.clone())
            .configure(|cfg| routes::configure(cfg, &config, limiters.clone()))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}
