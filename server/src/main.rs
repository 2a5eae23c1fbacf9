use anyhow::Context;
use potluck_server::config::Config;
use potluck_server::{api, app, db, telemetry, AppState};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .context("Failed to serialize OpenAPI spec")?;
        println!("{spec}");
        return Ok(());
    }

    let _telemetry = telemetry::init_telemetry();

    let config = Config::load()?;
    let pool = db::create_pool(&config.database_url)?;
    let bind_addr = config.bind_addr;
    let host_name = config.host_name.clone();

    let app = app(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!("Swagger UI available at {}/swagger-ui/", host_name);
    tracing::info!("Short links resolve under {}/s/", host_name);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
