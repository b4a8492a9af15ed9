use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kidcode_api::services::seed::seed_if_empty;
use kidcode_api::store::mongo::MongoStore;
use kidcode_api::{config::Config, create_router, services::AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kidcode_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting KidCode API");

    // Load configuration
    let config = Config::load().expect("Failed to load configuration");
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    // Initialize database connection
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to MongoDB");
    tracing::info!("MongoDB connected");

    let store = MongoStore::new(mongo_client.database(&config.mongo_database));
    store
        .ensure_indexes()
        .await
        .expect("Failed to create indexes");

    seed_if_empty(&store).await.expect("Failed to seed data");

    // Build application state
    let listen_addr = config.listen_addr.clone();
    let app_state = Arc::new(AppState::new(config, Arc::new(store)));

    // Build router
    let app = create_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .expect("Failed to bind listen address");

    tracing::info!(
        "Server listening on {}",
        listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or(listen_addr)
    );

    axum::serve(listener, app).await.expect("Server error");
}
