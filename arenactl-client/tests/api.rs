use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use arenactl_client::ArenaClient;
use arenactl_core::{ArenaApi, ArenaError, BlockClass, BlockDraft};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Requests seen by the fake Are.na server
#[derive(Clone, Default)]
struct Seen {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer secret")
}

async fn channels(
    State(seen): State<Seen>,
    Path(user): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "unauthorized"})));
    }
    seen.queries.lock().unwrap().push(query.clone());

    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    if user == "flaky" && page == 3 {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "boom"})));
    }
    let total = if user == "solo" { 0 } else { 3 };
    (
        StatusCode::OK,
        Json(json!({
            "total_pages": total,
            "current_page": page,
            "channels": [{
                "id": page,
                "slug": format!("channel-{}", page),
                "title": format!("Channel {}", page),
                "length": 1,
                "status": "public"
            }]
        })),
    )
}

async fn contents(
    State(seen): State<Seen>,
    Path(slug): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    seen.queries.lock().unwrap().push(query);
    Json(json!({
        "slug": slug,
        "contents": [
            {"id": 1, "class": "Text", "title": "One", "content": "first", "position": 1},
            {"id": 2, "class": "Image", "generated_title": "Two", "content": null, "position": 2,
             "image": {"display": {"url": "https://img/2.png"}}}
        ]
    }))
}

async fn block(Path(id): Path<u64>) -> impl IntoResponse {
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "not found"})));
    }
    (
        StatusCode::OK,
        Json(json!({"id": id, "class": "Text", "title": "Idea", "content": "Hello"})),
    )
}

async fn create(
    State(seen): State<Seen>,
    Path(slug): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    seen.bodies.lock().unwrap().push(body.clone());
    if slug == "locked" {
        // Are.na reports some validation failures with a 200 status
        return Json(json!({"code": 422, "message": "Channel is closed"}));
    }
    Json(json!({
        "id": 77,
        "class": "Text",
        "title": body["title"],
        "content": body["content"]
    }))
}

async fn update(
    State(seen): State<Seen>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    seen.bodies.lock().unwrap().push(body);
    if id == 422 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"code": 422, "message": "Title is too long"})),
        )
            .into_response();
    }
    if id == 500 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn file() -> impl IntoResponse {
    b"%PDF-1.4".to_vec()
}

async fn start_server() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/v2/users/{user}/channels", get(channels))
        .route("/v2/channels/{slug}/contents", get(contents))
        .route("/v2/channels/{slug}/blocks", post(create))
        .route("/v2/blocks/{id}", get(block).put(update))
        .route("/files/paper.pdf", get(file))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, seen)
}

fn client(addr: SocketAddr) -> ArenaClient {
    ArenaClient::new(format!("http://{}/v2/", addr), "secret").unwrap()
}

#[tokio::test]
async fn test_channels_follow_pagination() {
    let (addr, seen) = start_server().await;

    let channels = client(addr).list_channels_for_user("ana").await.unwrap();

    let slugs: Vec<&str> = channels.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(slugs, vec!["channel-1", "channel-2", "channel-3"]);

    let queries = seen.queries.lock().unwrap();
    assert_eq!(queries.len(), 3);
    assert!(queries.iter().all(|q| q.contains_key("v")));
}

#[tokio::test]
async fn test_channels_zero_total_pages_is_single_page() {
    let (addr, seen) = start_server().await;

    let channels = client(addr).list_channels_for_user("solo").await.unwrap();

    assert_eq!(channels.len(), 1);
    assert_eq!(seen.queries.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_channels_keep_pages_before_failure() {
    let (addr, _) = start_server().await;

    let channels = client(addr).list_channels_for_user("flaky").await.unwrap();

    assert_eq!(channels.len(), 2);
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let (addr, _) = start_server().await;
    let client = ArenaClient::new(format!("http://{}/v2", addr), "wrong").unwrap();

    let err = client.list_channels_for_user("ana").await.unwrap_err();

    assert!(matches!(err, ArenaError::Unauthorized { status: 401 }));
}

#[tokio::test]
async fn test_channel_contents() {
    let (addr, seen) = start_server().await;

    let blocks = client(addr).list_blocks_in_channel("research").await.unwrap();

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].class, BlockClass::Image);
    assert_eq!(blocks[1].content, "");
    assert_eq!(
        seen.queries.lock().unwrap()[0].get("per").map(String::as_str),
        Some("1000")
    );
}

#[tokio::test]
async fn test_get_block_and_not_found() {
    let (addr, _) = start_server().await;
    let client = client(addr);

    let block = client.get_block(42).await.unwrap();
    assert_eq!(block.id, 42);
    assert_eq!(block.content, "Hello");

    assert!(matches!(
        client.get_block(404).await,
        Err(ArenaError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_create_strips_frontmatter() {
    let (addr, seen) = start_server().await;
    let draft = BlockDraft::new("Idea", "---\nblockid: 1\n---\nHello", Some("about"));

    let block = client(addr)
        .create_block("research", &draft)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(block.id, 77);
    let bodies = seen.bodies.lock().unwrap();
    assert_eq!(
        bodies[0],
        json!({"title": "Idea", "content": "Hello", "description": "about"})
    );
}

#[tokio::test]
async fn test_create_empty_draft_sends_nothing() {
    let (addr, seen) = start_server().await;
    let draft = BlockDraft::new("", "---\na: 1\n---\n", None::<String>);

    let created = client(addr).create_block("research", &draft).await.unwrap();

    assert!(created.is_none());
    assert!(seen.bodies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_in_body_with_ok_status() {
    let (addr, _) = start_server().await;
    let draft = BlockDraft::new("Idea", "Hello", None::<String>);

    let err = client(addr).create_block("locked", &draft).await.unwrap_err();

    match err {
        ArenaError::Validation { message } => assert_eq!(message, "Channel is closed"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_update_block() {
    let (addr, seen) = start_server().await;
    let client = client(addr);
    let draft = BlockDraft::new("Idea", "Hello", None::<String>);

    client.update_block(42, &draft).await.unwrap();
    {
        let bodies = seen.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0], json!({"title": "Idea", "content": "Hello"}));
    }

    match client.update_block(422, &draft).await.unwrap_err() {
        ArenaError::Validation { message } => assert_eq!(message, "Title is too long"),
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        client.update_block(500, &draft).await,
        Err(ArenaError::Http { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_download_and_transport_error() {
    let (addr, _) = start_server().await;
    let client = client(addr);

    let bytes = client
        .download(&format!("http://{}/files/paper.pdf", addr))
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-1.4");

    let dead = ArenaClient::new("http://127.0.0.1:1/v2", "secret").unwrap();
    assert!(matches!(
        dead.get_block(1).await,
        Err(ArenaError::Transport { .. })
    ));
}
