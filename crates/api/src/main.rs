use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowdesk_api::config::ServerConfig;
use flowdesk_api::{routes, state::AppState};
use flowdesk_engine::sinks::{
    DisabledEmailSink, EmailConfig, EmailSink, PgCommentSink, PgNotificationSink, SmtpEmailSink,
};
use flowdesk_engine::store::{PgExecutionLog, PgRecurringRuleStore, PgTicketStore, TicketStore};
use flowdesk_engine::{
    ActionExecutor, AutomationDispatcher, EventBus, RecurringEngine, RecurringPoller,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowdesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = flowdesk_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    flowdesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    flowdesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Engines ---
    let tickets: Arc<dyn TicketStore> = Arc::new(PgTicketStore::new(pool.clone()));

    let recurring = Arc::new(RecurringEngine::new(
        Arc::new(PgRecurringRuleStore::new(pool.clone())),
        Arc::clone(&tickets),
        config.recurring_default_interval_minutes,
    ));

    let email: Arc<dyn EmailSink> = match EmailConfig::from_env() {
        Some(email_config) => Arc::new(SmtpEmailSink::new(email_config)),
        None => {
            tracing::info!("SMTP not configured, send_email actions will fail");
            Arc::new(DisabledEmailSink)
        }
    };

    let executor = Arc::new(ActionExecutor::new(
        Arc::clone(&tickets),
        Arc::new(PgNotificationSink::new(pool.clone())),
        email,
        Arc::new(PgCommentSink::new(pool.clone())),
        Arc::new(PgExecutionLog::new(pool.clone())),
    ));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // Spawn the automation dispatcher (matches ticket events against rules).
    let dispatcher = AutomationDispatcher::new(pool.clone(), Arc::clone(&executor));
    tokio::spawn(dispatcher.run(event_bus.subscribe()));

    // Spawn the recurring poller (executes due rules on an interval).
    let poller_cancel = tokio_util::sync::CancellationToken::new();
    let poller = RecurringPoller::new(
        Arc::clone(&recurring),
        Duration::from_secs(config.recurring_poll_interval_secs),
    );
    let poller_cancel_clone = poller_cancel.clone();
    let poller_handle = tokio::spawn(async move {
        poller.run(poller_cancel_clone).await;
    });

    tracing::info!("Engine services started (automation dispatcher, recurring poller)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        recurring,
        executor,
        tickets,
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    // --- Serve ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT combination");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Shutdown ---
    poller_cancel.cancel();
    let _ = poller_handle.await;
    tracing::info!("Shutdown complete");
}

/// Build the CORS layer from the configured origins.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Resolve when the process receives SIGINT.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
