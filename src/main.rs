use reqwest::Client;
use screening_backend::services::candidate_service::PgCandidateStore;
use screening_backend::services::channel_service::TwilioChannel;
use screening_backend::services::interpreter_service::OpenAiOracle;
use screening_backend::services::speech_service::ElevenLabsSpeech;
use screening_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let http_client = Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()?;

    let app_state = AppState::new(
        Arc::new(PgCandidateStore::new(pool)),
        Arc::new(TwilioChannel::new(http_client.clone())),
        Arc::new(OpenAiOracle::new(http_client.clone())),
        Arc::new(ElevenLabsSpeech::new(http_client)),
    )?;

    info!("Serving synthesized audio from: {}", config.audio_dir);

    let app = routes::router(app_state)
        .nest_service("/static/audio", ServeDir::new(&config.audio_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
