use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use fablecast::application::services::{CoverWorkflow, EpisodeService, PipelineService};
use fablecast::application::ports::{
    CharsPerSecondEstimator, EpisodeRepository, ProjectRepository,
};
use fablecast::infrastructure::audio::FfmpegMixer;
use fablecast::infrastructure::image::KieImageGenerator;
use fablecast::infrastructure::llm::OpenRouterScriptWriter;
use fablecast::infrastructure::observability::{TracingConfig, init_tracing};
use fablecast::infrastructure::persistence::{
    create_pool, PgEpisodeRepository, PgProjectRepository,
};
use fablecast::infrastructure::speech::ElevenLabsSpeaker;
use fablecast::infrastructure::storage::create_blob_store;
use fablecast::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();

    let json_logs = settings.environment.is_prod()
        || std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
    init_tracing(
        TracingConfig::new(settings.environment.as_str(), json_logs),
        settings.server.port,
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()?;

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    let episodes = Arc::new(PgEpisodeRepository::new(pool.clone()));
    let projects = Arc::new(PgProjectRepository::new(pool));

    let blob_store = create_blob_store(
        &settings.storage.backend,
        settings.storage.base_path.clone(),
        http.clone(),
    )?;

    let script_writer = Arc::new(OpenRouterScriptWriter::new(
        http.clone(),
        settings.writer.api_key.clone(),
        settings.writer.model.clone(),
        settings.writer.base_url.clone(),
    )?);
    let speaker = Arc::new(ElevenLabsSpeaker::new(
        http.clone(),
        settings.speech.api_key.clone(),
        settings.speech.base_url.clone(),
        settings.speech.model_id.clone(),
    )?);
    let image_generator = Arc::new(KieImageGenerator::new(
        http,
        settings.image.api_key.clone(),
        settings.image.base_url.clone(),
        settings.image.model.clone(),
    )?);

    let cover_workflow = Arc::new(CoverWorkflow::new(
        image_generator,
        Arc::clone(&blob_store),
        Duration::from_secs(settings.image.poll_interval_seconds),
        Duration::from_secs(settings.image.max_wait_seconds),
    ));
    let mixer = Arc::new(FfmpegMixer::new(Arc::clone(&blob_store)));

    let pipeline_service = Arc::new(PipelineService::new(
        script_writer,
        speaker,
        cover_workflow,
        Arc::clone(&blob_store),
        mixer,
        Arc::clone(&episodes) as Arc<dyn EpisodeRepository>,
        Arc::clone(&projects) as Arc<dyn ProjectRepository>,
        Arc::new(CharsPerSecondEstimator::default()),
        settings.pipeline_config(),
    ));
    let episode_service = Arc::new(EpisodeService::new(episodes, projects, blob_store));

    let router = create_router(AppState {
        pipeline_service,
        episode_service,
    });

    let addr: SocketAddr =
        format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
