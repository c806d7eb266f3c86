use gatehouse_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gatehouse_observability::init();

    let config = Config::from_env();

    let pool = gatehouse_store::connect(&config.postgres).await?;
    gatehouse_store::run_migrations(&pool).await?;

    let app = gatehouse_api::app::build_app(&config, pool);

    let addr = format!("0.0.0.0:{}", config.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(app = %config.app.name, env = %config.app.env, %addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
