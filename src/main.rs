mod config;
mod db;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use config::{ServerConfig, StoreBackend};
use store::MessageStore;
use store::memory::MemoryStore;
use store::postgres::PgDocumentStore;

#[tokio::main]
async fn main() {
    // A missing .env is normal in production; variables come from the host.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env().expect("invalid configuration");

    let store: Arc<dyn MessageStore> = match &config.backend {
        StoreBackend::Postgres { database_url, max_connections } => {
            let pool = db::init_pool(database_url, *max_connections)
                .await
                .expect("database init failed");
            let store = PgDocumentStore::new(pool, config.collection.clone());
            tracing::info!(collection = store.collection(), "postgres document store ready");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory message store; messages are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = state::AppState::new(store, config.upload_limit);
    let app = routes::app(state, &config.static_dir);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, upload_limit = config.upload_limit, "chatline listening");
    axum::serve(listener, app).await.expect("server failed");
}
