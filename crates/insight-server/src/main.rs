//! Insight server binary.
//!
//! Starts an axum HTTP server with structured logging, database initialization,
//! and graceful shutdown on SIGTERM/SIGINT.

use insight_interview::{
    FileExporter, Interviewer, OpenAiChatClient, QuestionGenerator, SessionRegistry,
};
use insight_server::config::{self, Config};
use insight_server::{app, AppState};
use insight_voice::{
    SpeechSynthesizer, SpeechToText, SttBackend, SttService, TtsService, WhisperApiClient,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("INSIGHT_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn build_interviewer(config: &Config) -> Interviewer {
    if !config.llm.is_configured() {
        tracing::warn!("no LLM API key configured; question generation will fail until one is set");
    }
    let llm = OpenAiChatClient::new(config.llm.clone())
        .expect("failed to build LLM client");
    tracing::info!(model = llm.model(), "using chat completion model");

    let generator = QuestionGenerator::new(Arc::new(llm), config.templates.clone())
        .expect("invalid prompt templates: check the [templates] section");

    if config.export.enabled {
        tracing::info!(dir = %config.export.dir.display(), "report export enabled");
        Interviewer::new(generator, Arc::new(FileExporter::new(&config.export.dir)))
    } else {
        tracing::info!("report export disabled");
        Interviewer::without_export(generator)
    }
}

fn build_stt(config: &Config) -> Arc<dyn SpeechToText> {
    let speech = &config.speech;
    match speech.stt_backend {
        SttBackend::WhisperCpp => {
            tracing::info!(model = %speech.whisper_model.display(), "using local whisper.cpp recogniser");
            Arc::new(SttService::new(&speech.whisper_model, &speech.whisper_binary))
        }
        SttBackend::WhisperApi => {
            let key = if speech.api_key.trim().is_empty() {
                config.llm.api_key.clone()
            } else {
                speech.api_key.clone()
            };
            tracing::info!(model = %speech.api_model, "using hosted Whisper recogniser");
            Arc::new(
                WhisperApiClient::new(&speech.api_base_url, key, &speech.api_model)
                    .expect("failed to build Whisper API client"),
            )
        }
    }
}

async fn build_tts(config: &Config) -> Arc<dyn SpeechSynthesizer> {
    let speech = &config.speech;
    let tts = TtsService::new(&speech.voices_dir, &speech.piper_binary)
        .with_espeak_binary(&speech.espeak_binary);
    for profile in &speech.voices {
        tts.add_profile(profile.clone()).await;
    }
    tracing::info!(voices = speech.voices.len(), "loaded voice profiles");
    Arc::new(tts)
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration: the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize database
    let pool = insight_db::create_pool(&config.database.path, config.database.runtime)
        .expect("failed to create database pool: check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied = insight_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    let state = AppState {
        pool,
        registry: SessionRegistry::default(),
        interviewer: build_interviewer(&config),
        stt: build_stt(&config),
        tts: build_tts(&config).await,
        default_theme: config.interview.default_theme.clone(),
        language: config.interview.language.clone(),
        cors_origins: config.server.cors_origins.clone(),
    };

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting insight server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address: is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("insight server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
