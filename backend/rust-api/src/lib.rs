use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Operational endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Public API: auth + lesson catalog
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/lessons", get(handlers::lessons::list_lessons))
        .route("/api/lessons/{id}", get(handlers::lessons::get_lesson))
        .route(
            "/api/catalog/languages",
            get(handlers::lessons::language_counts),
        )
        .route("/api/catalog/topics", get(handlers::lessons::topic_counts))
        .route("/api/search", get(handlers::lessons::search))
        // Protected API (requires JWT)
        .merge(protected_routes(app_state.clone()))
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn protected_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route(
            "/api/lessons/{id}/start",
            post(handlers::progress::start_lesson),
        )
        .route(
            "/api/lessons/{id}/submit",
            post(handlers::progress::submit_lesson),
        )
        .route("/api/me/progress", get(handlers::progress::my_progress))
        .route(
            "/api/me/achievements",
            get(handlers::achievements::my_achievements),
        )
        .route(
            "/api/achievements/unlock",
            post(handlers::achievements::unlock),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ))
}
