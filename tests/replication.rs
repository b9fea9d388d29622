use axum::Router;
use bazar::catalog::CatalogNode;
use bazar::frontend::Frontend;
use bazar::order::OrderNode;
use bazar::store::{BookStore, OrderStore};
use serde_json::Value;
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Nothing listens here; connections are refused immediately.
const DEAD: &str = "http://127.0.0.1:9";

/// Bind before constructing nodes so peers can be wired to each other's
/// address up front.
async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

fn spawn(listener: TcpListener, router: Router) {
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    addr
}

async fn post_json(client: &reqwest::Client, url: String) -> (u16, Value) {
    let resp = client.post(url).send().await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn catalog_write_propagates_to_the_peer() {
    let (dir_a, dir_b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let store_a = BookStore::open(dir_a.path()).unwrap();
    let store_b = BookStore::open(dir_b.path()).unwrap();

    let (listener_a, url_a) = bind().await;
    let (listener_b, url_b) = bind().await;
    spawn(listener_a, CatalogNode::new(store_a.clone(), url_b.clone(), DEAD).router());
    spawn(listener_b, CatalogNode::new(store_b.clone(), url_a.clone(), DEAD).router());

    let client = reqwest::Client::new();
    let (status, body) = post_json(&client, format!("{url_a}/update/5")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "updated");

    // The update response is only sent after the peer sync call completed.
    assert_eq!(store_a.get(5).unwrap().quantity, 9);
    assert_eq!(store_b.get(5).unwrap().quantity, 9);
}

#[tokio::test]
async fn replayed_sync_applies_the_delta_twice() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::open(dir.path()).unwrap();
    let addr = serve(CatalogNode::new(store.clone(), DEAD, DEAD).router()).await;

    let client = reqwest::Client::new();
    for _ in 0..2 {
        let (status, body) = post_json(&client, format!("http://{addr}/sync/5")).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "replica synced");
    }

    // Sync carries no idempotency token, so a replay is double-applied.
    assert_eq!(store.get(5).unwrap().quantity, 8);
}

#[tokio::test]
async fn update_succeeds_when_peer_and_frontend_are_down() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::open(dir.path()).unwrap();
    let addr = serve(CatalogNode::new(store.clone(), DEAD, DEAD).router()).await;

    let client = reqwest::Client::new();
    let (status, body) = post_json(&client, format!("http://{addr}/update/2")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "updated");
    assert_eq!(store.get(2).unwrap().quantity, 9);
}

#[tokio::test]
async fn purchase_succeeds_when_every_dependency_is_down() {
    let dir = TempDir::new().unwrap();
    let orders = OrderStore::open(dir.path()).unwrap();
    let addr = serve(OrderNode::new(orders.clone(), DEAD, DEAD, DEAD).router()).await;

    let client = reqwest::Client::new();
    let (status, body) = post_json(&client, format!("http://{addr}/purchase/4")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "purchased");

    // Only the local insert matters to the caller; the order now exists
    // with no corresponding stock decrement anywhere.
    let rows = orders.all();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].item_id, 4);
    assert_eq!(rows[0].quantity, 1);
}

#[tokio::test]
async fn orders_endpoint_lists_the_ledger_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let orders = OrderStore::open(dir.path()).unwrap();
    let addr = serve(OrderNode::new(orders, DEAD, DEAD, DEAD).router()).await;

    let client = reqwest::Client::new();
    post_json(&client, format!("http://{addr}/purchase/2")).await;
    post_json(&client, format!("http://{addr}/purchase/6")).await;

    let resp = client
        .get(format!("http://{addr}/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let rows: Value = resp.json().await.unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[0]["order_id"], 1);
    assert_eq!(rows[0]["item_id"], 2);
    assert_eq!(rows[1]["order_id"], 2);
    assert_eq!(rows[1]["item_id"], 6);
}

#[tokio::test]
async fn end_to_end_purchase_converges_every_replica() {
    let (cat_dir_a, cat_dir_b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let (ord_dir_x, ord_dir_y) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let books_a = BookStore::open(cat_dir_a.path()).unwrap();
    let books_b = BookStore::open(cat_dir_b.path()).unwrap();
    let orders_x = OrderStore::open(ord_dir_x.path()).unwrap();
    let orders_y = OrderStore::open(ord_dir_y.path()).unwrap();

    let (fe_listener, fe_url) = bind().await;
    let (cat_listener_a, cat_url_a) = bind().await;
    let (cat_listener_b, cat_url_b) = bind().await;
    let (ord_listener_x, ord_url_x) = bind().await;
    let (ord_listener_y, ord_url_y) = bind().await;

    spawn(
        cat_listener_a,
        CatalogNode::new(books_a.clone(), cat_url_b.clone(), fe_url.clone()).router(),
    );
    spawn(
        cat_listener_b,
        CatalogNode::new(books_b.clone(), cat_url_a.clone(), fe_url.clone()).router(),
    );
    spawn(
        ord_listener_x,
        OrderNode::new(orders_x.clone(), ord_url_y.clone(), cat_url_a.clone(), fe_url.clone())
            .router(),
    );
    spawn(
        ord_listener_y,
        OrderNode::new(orders_y.clone(), ord_url_x.clone(), cat_url_a.clone(), fe_url.clone())
            .router(),
    );
    let frontend = Frontend::new(
        vec![cat_url_a.clone(), cat_url_b.clone()],
        vec![ord_url_x.clone(), ord_url_y.clone()],
    );
    spawn(fe_listener, frontend.router());

    let client = reqwest::Client::new();

    // Warm the cache so the purchase path has something to invalidate.
    let resp = client
        .get(format!("{fe_url}/info/3"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["quantity"], 10);

    let (status, body) = post_json(&client, format!("{fe_url}/purchase/3")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "purchased");

    // Exactly one order on the primary and one replicated to the peer.
    let rows = orders_x.all();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].item_id, 3);
    assert_eq!(rows[0].quantity, 1);
    assert_eq!(orders_y.all().len(), 1);
    assert_eq!(orders_y.all()[0].item_id, 3);

    // One decrement on the designated catalog and one on its peer.
    assert_eq!(books_a.get(3).unwrap().quantity, 9);
    assert_eq!(books_b.get(3).unwrap().quantity, 9);

    // The purchase invalidated the cached entry, so the next read is fresh.
    let resp = client
        .get(format!("{fe_url}/info/3"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["quantity"], 9);
}
