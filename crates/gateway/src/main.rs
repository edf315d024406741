//! ScholarHub API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    extract::FromRef,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use scholarhub_common::{
    auth::JwtManager,
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository},
    metrics::{self, LATENCY_BUCKETS},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use handlers::{
    auth, datasets, health, keywords, library, papers, profile, publications, search, stats,
    venues,
};
use middleware::{metrics::track_metrics, rate_limit};

/// Application state shared across handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn repo(&self) -> Repository {
        Repository::new(self.db.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting ScholarHub API Gateway v{}",
        scholarhub_common::VERSION
    );

    let secret = config
        .auth
        .jwt_secret
        .clone()
        .filter(|s| !s.trim().is_empty())
        .context("auth.jwt_secret must be configured")?;
    let jwt = Arc::new(JwtManager::new(&secret, config.auth.jwt_expiration_secs));

    // Initialize metrics
    install_metrics_exporter(&config.observability)?;
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        db,
        jwt,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn install_metrics_exporter(config: &ObservabilityConfig) -> anyhow::Result<()> {
    if config.metrics_port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], config.metrics_port)))
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!(port = config.metrics_port, "Metrics exporter listening");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut api_routes = Router::new()
        // Health endpoints
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))

        // Auth
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))

        // Papers
        .route("/papers", get(papers::list_papers).post(papers::create_paper))
        .route("/papers/downloaded", get(papers::downloaded_papers))
        .route("/papers/by-slug/{slug}", get(papers::get_paper_by_slug))
        .route("/papers/{id}", get(papers::get_paper))
        .route(
            "/papers/{id}/interesting",
            post(papers::mark_interesting).delete(papers::unmark_interesting),
        )
        .route(
            "/papers/{id}/downloaded",
            post(papers::mark_downloaded).delete(papers::unmark_downloaded),
        )

        // Datasets
        .route("/datasets", get(datasets::list_datasets))
        .route("/datasets/interesting", get(datasets::interesting_datasets))
        .route("/datasets/{id}", get(datasets::get_dataset))
        .route("/datasets/{id}/similar", post(datasets::add_similar_dataset))
        .route(
            "/datasets/{id}/interesting",
            post(datasets::mark_interesting).delete(datasets::unmark_interesting),
        )

        // Venues
        .route("/journals", get(venues::list_journals).post(venues::create_journal))
        .route("/journals/{id}", get(venues::get_journal).put(venues::update_journal))
        .route(
            "/conferences",
            get(venues::list_conferences).post(venues::create_conference),
        )
        .route(
            "/conferences/{id}",
            get(venues::get_conference).put(venues::update_conference),
        )
        .route("/venues/counts", get(stats::venue_counts))

        // Keywords & search
        .route("/keywords", get(keywords::list_keywords))
        .route("/search", get(search::search))

        // Profile, publications, library
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/profile/avatar", put(profile::update_avatar))
        .route(
            "/publications",
            get(publications::list_publications).post(publications::create_publication),
        )
        .route(
            "/publications/{id}",
            get(publications::get_publication)
                .put(publications::update_publication)
                .delete(publications::delete_publication),
        )
        .route("/my-library", get(library::my_library))

        // Statistics
        .route("/stats", get(stats::overall_stats))
        .route("/stats/papers", get(stats::paper_stats))
        .route("/stats/dashboard", get(stats::dashboard_stats))
        .route("/stats/keywords", get(stats::keyword_stats))
        .route("/stats/datasets", get(stats::dataset_stats))
        .route("/stats/home", get(stats::home_stats))
        .route("/dashboard", get(stats::dashboard))
        .route_layer(axum_middleware::from_fn(track_metrics));

    let limits = &state.config.rate_limit;
    if limits.enabled {
        let limiter = rate_limit::create_rate_limiter(limits.requests_per_second, limits.burst);
        api_routes = api_routes.layer(axum_middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit_middleware,
        ));
    } else {
        warn!("Rate limiting disabled");
    }

    // Compose the app
    Router::new()
        .nest("/api", api_routes)
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
