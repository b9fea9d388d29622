//! Catalog node: owns a local [`BookStore`] and serves reads directly from
//! it. A stock-changing write invalidates the frontend cache, applies the
//! delta locally and then propagates the same delta to the peer catalog node
//! with a sync call whose outcome is ignored.

use crate::replica::propagate;
use crate::store::BookStore;
use crate::{BazarError, Result};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Delta applied by the update and sync endpoints. Purchases are always a
/// single copy; the store itself takes any signed delta.
const STOCK_DELTA: i64 = -1;

#[derive(Clone)]
pub struct CatalogNode {
    store: BookStore,
    /// Base URL of the peer catalog node receiving propagated writes.
    peer: String,
    /// Base URL of the frontend, for cache invalidation callbacks.
    frontend: String,
    http: reqwest::Client,
}

impl CatalogNode {
    pub fn new<P, F>(store: BookStore, peer: P, frontend: F) -> CatalogNode
    where
        P: Into<String>,
        F: Into<String>,
    {
        CatalogNode {
            store,
            peer: peer.into(),
            frontend: frontend.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/info/:id", get(info))
            .route("/search/:topic", get(search))
            .route("/update/:id", post(update))
            .route("/sync/:id", post(sync))
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }
}

async fn info(State(node): State<CatalogNode>, Path(id): Path<u64>) -> Result<Json<Value>> {
    let book = node.store.get(id).ok_or(BazarError::BookNotFound(id))?;
    Ok(Json(json!(book)))
}

async fn search(State(node): State<CatalogNode>, Path(topic): Path<String>) -> Json<Value> {
    Json(json!(node.store.search(&topic)))
}

/// Externally-triggered write: invalidate, apply locally, propagate to the
/// peer. Only the local delta can fail the request; both propagation calls
/// are fire and forget, and the response does not wait for the peer to
/// confirm convergence.
async fn update(State(node): State<CatalogNode>, Path(id): Path<u64>) -> Result<Json<Value>> {
    propagate(&node.http, format!("{}/invalidate/{id}", node.frontend)).await;
    node.store.apply_delta(id, STOCK_DELTA)?;
    propagate(&node.http, format!("{}/sync/{id}", node.peer)).await;
    debug!(id, "Updated stock and propagated to peer");
    Ok(Json(json!({ "status": "updated" })))
}

/// Receives a propagated write from the peer and applies the same delta.
/// There is no idempotency token: a replayed sync applies the delta again.
async fn sync(State(node): State<CatalogNode>, Path(id): Path<u64>) -> Result<Json<Value>> {
    node.store.apply_delta(id, STOCK_DELTA)?;
    debug!(id, "Applied peer sync");
    Ok(Json(json!({ "status": "replica synced" })))
}
