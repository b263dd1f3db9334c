//! Router assembly and server lifecycle.

use std::sync::Arc;

use axum::middleware;
use axum::{
    extract::State,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::{LlmClient, OpenRouterClient};
use crate::quiz::QuizGenerator;
use crate::quran::QuranCorpus;
use crate::store::{SharedStore, Store};

use super::auth;
use super::feedback;
use super::profile;
use super::quiz;
use super::quran;
use super::recitation;
use super::types::HealthResponse;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
    /// Ayah texts; may be empty when no corpus is configured
    pub corpus: Arc<QuranCorpus>,
    pub quiz: QuizGenerator,
}

impl AppState {
    pub fn new(
        config: Config,
        store: SharedStore,
        corpus: Arc<QuranCorpus>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        let quiz = QuizGenerator::new(
            llm,
            config.llm.model.clone(),
            config.quiz_max_questions,
            Arc::clone(&corpus),
        );
        Self {
            config,
            store,
            corpus,
            quiz,
        }
    }
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/users/:username", get(profile::get_public_profile))
        .route("/api/quran/surahs", get(quran::list_surahs))
        .route("/api/quran/surahs/:surah", get(quran::get_surah))
        .route("/api/quran/surahs/:surah/ayahs", get(quran::get_ayah_range))
        .route("/api/quran/ayahs/:surah/:ayah", get(quran::get_ayah))
        .route("/api/quran/ayahs/:surah/:ayah/similar", get(quran::similar))
        .route("/api/quran/search", get(quran::search));

    let protected_routes = Router::new()
        .route("/api/auth/password", post(auth::change_password))
        .route(
            "/api/me",
            get(profile::get_me)
                .patch(profile::update_me)
                .delete(profile::delete_me),
        )
        .route("/api/feedback", post(feedback::submit).get(feedback::list_all))
        .route("/api/feedback/mine", get(feedback::list_mine))
        .route("/api/feedback/:id", patch(feedback::set_status))
        .route("/api/quizzes", post(quiz::generate))
        .route("/api/quizzes/:id", get(quiz::get_quiz))
        .route("/api/quizzes/:id/submit", post(quiz::submit))
        .route("/api/quiz-attempts", get(quiz::list_attempts))
        .route(
            "/api/sessions",
            post(recitation::start_session).get(recitation::list_sessions),
        )
        .route("/api/sessions/:id", get(recitation::get_session))
        .route("/api/sessions/:id/mistakes", post(recitation::record_mistake))
        .route("/api/sessions/:id/finish", post(recitation::finish_session))
        .route("/api/sessions/:id/abandon", post(recitation::abandon_session))
        .route("/api/progress", get(recitation::progress))
        .route("/api/stats", get(recitation::stats))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store: SharedStore = Arc::new(Store::open(&config.database_path())?);

    let corpus = match &config.quran_data_path {
        Some(path) => QuranCorpus::load(path)?,
        None => {
            tracing::warn!("QURAN_DATA_PATH not set; ayah text lookups will return 404");
            QuranCorpus::empty()
        }
    };

    let llm: Option<Arc<dyn LlmClient>> = match &config.llm.api_key {
        Some(key) => {
            tracing::info!("AI quizzes enabled with model {}", config.llm.model);
            Some(Arc::new(OpenRouterClient::new(
                config.llm.api_url.clone(),
                key.clone(),
            )))
        }
        None => {
            tracing::info!("LLM_API_KEY not set; AI quizzes disabled");
            None
        }
    };

    if config.dev_mode {
        tracing::warn!("DEV_MODE enabled: authentication is disabled");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, store, Arc::new(corpus), llm));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Setup graceful shutdown on SIGTERM/SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dev_mode: state.config.dev_mode,
        database: state.store.ping().await,
        quran_surahs_loaded: state.corpus.loaded_surahs(),
        ai_quizzes: state.quiz.ai_enabled(),
    })
}
