//! Lesson blog server: loads settings, connects the store, serves the API.
//!
//! Run from repo root: `cargo run -p lesson-blog-server`
//! Without `DATABASE_URL` the server runs on the in-memory store.

use lesson_blog::{
    app, builtin_config, ensure_collections, ensure_database_exists, ensure_unique_indexes, load_from_path, resolve,
    seed_posts, trim_trailing_slash, AppState, DocumentStore, InMemoryStore, PgDocumentStore, Settings,
};
use axum::{extract::Request, ServiceExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const DEFAULT_LOG_FILTER: &str = "lesson_blog=info,lesson_blog_server=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let settings = Settings::from_env();
    let config = match &settings.resource_config {
        Some(path) => load_from_path(path).await?,
        None => builtin_config()?,
    };
    let model = resolve(&config)?;

    let mut pool = None;
    let store: Arc<dyn DocumentStore> = match &settings.database_url {
        Some(url) => {
            ensure_database_exists(url).await?;
            let pg = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(url)
                .await?;
            pool = Some(pg.clone());
            let pg_store = PgDocumentStore::new(pg, settings.store_schema.clone());
            ensure_collections(&pg_store, &model).await?;
            tracing::info!(schema = %settings.store_schema, "using PostgreSQL document store");
            Arc::new(pg_store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };
    ensure_unique_indexes(store.as_ref(), &model).await?;

    if settings.seed_data {
        if let Some(posts) = model.resource_by_path("posts") {
            seed_posts(store.as_ref(), posts).await?;
        }
    }

    let state = AppState::new(store, model).with_exposed_errors(settings.expose_errors());
    let app = trim_trailing_slash(
        app(state, settings.body_limit).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        ),
    );

    let listener = TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!("Lesson blog API listening on http://{}", addr);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
