use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use townloop_server::config::Config;
use townloop_server::routes::create_routes;
use townloop_server::store::PgStore;
use townloop_server::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("townloop_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let store = PgStore::connect(&config.database)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    store.migrate().await.expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let addr = config.server.addr();
    let state = AppState::new(Arc::new(store), config);
    let app: Router = create_routes(state);

    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");
    tracing::info!("Server running at http://{}", addr);

    axum::serve(listener, app).await.expect("Server failed");
}
