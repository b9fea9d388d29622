//! Order node: owns an append-only [`OrderStore`] ledger. A purchase
//! invalidates the frontend cache, records the order locally, triggers a
//! stock decrement on its designated catalog node (which replicates to the
//! catalog peer on its own) and propagates the order to the peer order node.
//!
//! Only the local insert can fail a purchase. Every remote step is fire and
//! forget, so an order can be recorded with no matching stock decrement when
//! the catalog call is lost. The replicated path also never checks that
//! stock is positive before decrementing, unlike the single-node design;
//! both gaps are deliberate and pinned by tests.

use crate::replica::propagate;
use crate::store::OrderStore;
use crate::Result;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Clone)]
pub struct OrderNode {
    store: OrderStore,
    /// Base URL of the peer order node receiving propagated orders.
    peer: String,
    /// Base URL of the designated catalog node for stock decrements.
    catalog: String,
    /// Base URL of the frontend, for cache invalidation callbacks.
    frontend: String,
    http: reqwest::Client,
}

impl OrderNode {
    pub fn new<P, C, F>(store: OrderStore, peer: P, catalog: C, frontend: F) -> OrderNode
    where
        P: Into<String>,
        C: Into<String>,
        F: Into<String>,
    {
        OrderNode {
            store,
            peer: peer.into(),
            catalog: catalog.into(),
            frontend: frontend.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/purchase/:id", post(purchase))
            .route("/sync/:id", post(sync))
            .route("/orders", get(orders))
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }
}

/// The four-step purchase sequence: invalidate, insert, catalog update,
/// order sync. The steps fail independently and only the insert is fatal.
async fn purchase(State(node): State<OrderNode>, Path(id): Path<u64>) -> Result<Json<Value>> {
    propagate(&node.http, format!("{}/invalidate/{id}", node.frontend)).await;
    let order = node.store.record(id, 1)?;
    propagate(&node.http, format!("{}/update/{id}", node.catalog)).await;
    propagate(&node.http, format!("{}/sync/{id}", node.peer)).await;
    debug!(order_id = order.order_id, item_id = id, "Purchase complete");
    Ok(Json(json!({ "status": "purchased" })))
}

/// Receives a propagated order from the peer and records it exactly as a
/// purchase would, without re-propagating.
async fn sync(State(node): State<OrderNode>, Path(id): Path<u64>) -> Result<Json<Value>> {
    node.store.record(id, 1)?;
    debug!(item_id = id, "Applied peer order sync");
    Ok(Json(json!({ "status": "replica synced" })))
}

async fn orders(State(node): State<OrderNode>) -> Json<Value> {
    Json(json!(node.store.all()))
}
