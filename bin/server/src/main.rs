use frontdesk_conversation::{
    BusinessContext, FeedbackRecord, JsonFileRecorder, LeadRecord, OpenAiBackendFactory,
    SessionManager, ToolRegistry,
};
use frontdesk_server::{config::ServerConfig, state::AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        model = %config.provider.model,
        base_url = %config.provider.base_url,
        "Loaded configuration"
    );

    let leads = Arc::new(JsonFileRecorder::<LeadRecord>::open(&config.storage.leads_path).await);
    let feedback =
        Arc::new(JsonFileRecorder::<FeedbackRecord>::open(&config.storage.feedback_path).await);

    let context = BusinessContext::load(
        &config.knowledge.summary_path,
        &config.knowledge.documents,
        &config.knowledge.fallback,
    )
    .await
    .expect("failed to load business context");

    let persona = config.agent.persona();
    let tools = Arc::new(ToolRegistry::builtin(
        leads.clone(),
        feedback.clone(),
        &persona.business_name,
    ));
    let factory = Arc::new(OpenAiBackendFactory::new(config.provider.backend_config()));
    let sessions = SessionManager::new(factory, tools, persona.system_prompt(&context))
        .with_limits(config.session.limits());

    let state = Arc::new(AppState::new(sessions, leads, feedback));

    // Spawn periodic session cleanup task
    let cleanup_state = Arc::clone(&state);
    let cleanup_interval = config.session.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let evicted = cleanup_state.sessions.cleanup_expired().await;
            if evicted > 0 {
                tracing::debug!(evicted, "periodic session cleanup");
            }
        }
    });

    let app = frontdesk_server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
