use tokio::net::TcpListener;
use studyhub_ai::{
    AppState,
    api::routes::create_router,
    config::Config,
    logging::init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; generation requests will fail with 500");
    }
    tracing::info!(?config, "configuration loaded");

    let app = create_router(AppState::new(config)?);

    let listener = TcpListener::bind(server_addr).await?;
    tracing::info!(
        addr = %server_addr,
        "StudyHub AI proxy listening; endpoint at http://{}/api/gemini",
        server_addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}
