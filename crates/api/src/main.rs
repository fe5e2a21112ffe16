use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    policygate_observability::init();

    let config = policygate_api::ApiConfig::from_env()?;
    if config.manifest.is_none() {
        tracing::warn!("POLICYGATE_MANIFEST not set; using built-in demo controller declarations");
    }

    let app = policygate_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
