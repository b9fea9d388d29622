//! Frontend: the front door composing the LRU cache with replica selection.
//! Catalog reads are served from cache or a round-robin catalog replica;
//! purchases scan the order replicas in fixed order until one answers.

use crate::cache::LruCache;
use crate::replica::ReplicaSet;
use crate::store::Book;
use crate::{BazarError, Result, CACHE_SIZE};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Per-attempt bound on the purchase failover scan. A replica that does not
/// answer within this window is treated as down and the scan moves on.
const ORDER_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct Frontend {
    /// Book cache. The mutex serializes promote/evict sequences; writers
    /// keep it coherent through the /invalidate endpoint.
    cache: Arc<Mutex<LruCache<Book>>>,
    catalog_replicas: ReplicaSet,
    order_replicas: ReplicaSet,
    http: reqwest::Client,
}

impl Frontend {
    pub fn new(catalog_replicas: Vec<String>, order_replicas: Vec<String>) -> Frontend {
        Frontend {
            cache: Arc::new(Mutex::new(LruCache::new(CACHE_SIZE))),
            catalog_replicas: ReplicaSet::new(catalog_replicas),
            order_replicas: ReplicaSet::new(order_replicas),
            http: reqwest::Client::new(),
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/info/:id", get(info))
            .route("/search/:topic", get(search))
            .route("/purchase/:id", post(purchase))
            .route("/invalidate/:id", post(invalidate))
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }

    /// GET a catalog replica endpoint and parse the body, translating
    /// connect failures and non-JSON bodies into their boundary errors.
    async fn fetch_catalog(&self, path: &str) -> Result<(StatusCode, Value)> {
        let url = format!("{}{path}", self.catalog_replicas.next());
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| BazarError::UpstreamUnreachable {
                url: url.clone(),
                source,
            })?;
        let status = resp.status();
        let body = resp
            .json::<Value>()
            .await
            .map_err(|_| BazarError::NonJsonUpstream { url })?;
        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Ok((status, body))
    }
}

async fn info(
    State(frontend): State<Frontend>,
    Path(id): Path<u64>,
) -> Result<(StatusCode, Json<Value>)> {
    if let Some(book) = frontend.cache.lock().unwrap().get(id) {
        info!(id, "Cache hit");
        return Ok((StatusCode::OK, Json(json!(book))));
    }

    info!(id, "Cache miss");
    let (status, body) = frontend.fetch_catalog(&format!("/info/{id}")).await?;
    if status.is_success() {
        // Only well-formed book bodies are worth caching; error payloads
        // pass through uncached.
        if let Ok(book) = serde_json::from_value::<Book>(body.clone()) {
            frontend.cache.lock().unwrap().put(id, book);
        }
    }
    Ok((status, Json(body)))
}

/// Topic search is an uncached pass-through to a round-robin replica.
async fn search(
    State(frontend): State<Frontend>,
    Path(topic): Path<String>,
) -> Result<(StatusCode, Json<Value>)> {
    let (status, body) = frontend.fetch_catalog(&format!("/search/{topic}")).await?;
    Ok((status, Json(body)))
}

/// One pass over the order replicas in fixed order, returning the first
/// successful response verbatim. No retry, no backoff; every failure mode
/// on an attempt just advances the scan.
async fn purchase(
    State(frontend): State<Frontend>,
    Path(id): Path<u64>,
) -> Result<(StatusCode, Json<Value>)> {
    for addr in frontend.order_replicas.all() {
        let url = format!("{addr}/purchase/{id}");
        let resp = match frontend
            .http
            .post(&url)
            .timeout(ORDER_ATTEMPT_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%url, "Order replica unreachable: {e}");
                continue;
            }
        };
        let status = resp.status();
        match resp.json::<Value>().await {
            Ok(body) => {
                let status = StatusCode::from_u16(status.as_u16())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return Ok((status, Json(body)));
            }
            Err(e) => {
                warn!(%url, "Order replica returned non-JSON: {e}");
                continue;
            }
        }
    }
    Err(BazarError::AllReplicasDown)
}

async fn invalidate(State(frontend): State<Frontend>, Path(id): Path<u64>) -> Json<Value> {
    frontend.cache.lock().unwrap().invalidate(id);
    info!(id, "Cache invalidated");
    Json(json!({ "status": "cache invalidated" }))
}
