//! HTTP search endpoint
//!
//! Serves a search form at `/` and result pages at `/search?q=...`. Queries
//! run on the blocking pool since the store is synchronous.

mod render;

pub use render::escape_html;

use crate::search::{QueryEngine, QueryError};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

/// Builds the application router
pub fn router(engine: QueryEngine) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/search", get(search_handler))
        .with_state(engine)
}

/// Binds `address` and serves until the process is stopped
pub async fn serve(address: SocketAddr, engine: QueryEngine) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(engine)).await
}

async fn index_handler() -> Html<String> {
    Html(render::index_page())
}

async fn search_handler(
    State(engine): State<QueryEngine>,
    Query(params): Query<SearchParams>,
) -> Response {
    let raw = params.q.unwrap_or_default();
    if raw.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "no query provided").into_response();
    }

    let query = raw.clone();
    let searched = tokio::task::spawn_blocking(move || engine.search(&query)).await;

    match searched {
        Ok(Ok(results)) => {
            tracing::info!("Query {:?}: {} results", raw, results.len());
            Html(render::results_page(&raw, &results)).into_response()
        }
        Ok(Err(QueryError::EmptyQuery)) => {
            (StatusCode::BAD_REQUEST, "no query provided").into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("Query {:?} failed: {}", raw, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "search failed").into_response()
        }
        Err(e) => {
            tracing::error!("Query task for {:?} failed: {}", raw, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "search failed").into_response()
        }
    }
}
