use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_pod::{app, app_with_store, new_store, EntryKind};
use tower::ServiceExt;

async fn body_text(response: axum::response::Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn put_text(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=UTF-8")
        .body(body.to_string())
        .unwrap()
}

fn put_container(uri: &str) -> Request<String> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "text/turtle")
        .body(String::new())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn etag(response: &axum::response::Response) -> String {
    response.headers()[http::header::ETAG]
        .to_str()
        .unwrap()
        .to_string()
}

async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

// --- containers ---

#[tokio::test]
async fn create_container_returns_201() {
    let resp = app().oneshot(put_container("/movies/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn create_container_twice_keeps_one_container() {
    let store = new_store();
    let app = app_with_store(store.clone());

    assert_eq!(send(&app, put_container("/movies/")).await.status(), StatusCode::CREATED);
    assert_eq!(send(&app, put_text("/movies/watched.txt", "Alien\n")).await.status(), StatusCode::CREATED);
    assert_eq!(send(&app, put_container("/movies/")).await.status(), StatusCode::NO_CONTENT);

    let entries = store.read().await;
    let containers = entries
        .iter()
        .filter(|(path, entry)| path.starts_with("/movies") && entry.kind == EntryKind::Container)
        .count();
    assert_eq!(containers, 1);
    assert!(entries.contains_key("/movies/watched.txt"), "children survive re-creation");
}

#[tokio::test]
async fn get_container_lists_children() {
    let app = app();
    send(&app, put_text("/health/sleep.txt", "7h\n")).await;

    let resp = send(&app, get("/health/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "text/turtle");
    let turtle = body_text(resp).await;
    assert!(turtle.contains("ldp:contains <sleep.txt>"));
}

#[tokio::test]
async fn head_container_without_body() {
    let app = app();
    send(&app, put_container("/movies/")).await;

    let resp = send(
        &app,
        Request::builder()
            .method("HEAD")
            .uri("/movies/")
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.is_empty());
}

#[tokio::test]
async fn head_missing_container_returns_404() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/nothing/")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- resources ---

#[tokio::test]
async fn put_then_get_resource() {
    let app = app();
    let resp = send(&app, put_text("/movies/watched.txt", "Alien\nHeat\n")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let written = etag(&resp);

    let resp = send(&app, get("/movies/watched.txt")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(etag(&resp), written);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "text/plain; charset=UTF-8"
    );
    assert_eq!(body_text(resp).await, "Alien\nHeat\n");
}

#[tokio::test]
async fn put_replaces_whole_resource() {
    let app = app();
    send(&app, put_text("/c/f.txt", "a\nb\n")).await;
    let resp = send(&app, put_text("/c/f.txt", "z\n")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, get("/c/f.txt")).await;
    assert_eq!(body_text(resp).await, "z\n");
}

#[tokio::test]
async fn put_resource_creates_parent_container() {
    let app = app();
    send(&app, put_text("/new/f.txt", "x\n")).await;
    let resp = send(&app, get("/new/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn get_missing_resource_returns_404() {
    let resp = app().oneshot(get("/movies/none.txt")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn every_write_changes_etag() {
    let app = app();
    let first = etag(&send(&app, put_text("/c/f.txt", "a\n")).await);
    let second = etag(&send(&app, put_text("/c/f.txt", "a\n")).await);
    assert_ne!(first, second);
}

// --- preconditions ---

#[tokio::test]
async fn if_match_with_current_etag_succeeds() {
    let app = app();
    let current = etag(&send(&app, put_text("/c/f.txt", "a\n")).await);

    let mut request = put_text("/c/f.txt", "a\nb\n");
    request
        .headers_mut()
        .insert(http::header::IF_MATCH, current.parse().unwrap());
    assert_eq!(send(&app, request).await.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn if_match_with_stale_etag_returns_412_and_keeps_content() {
    let app = app();
    let stale = etag(&send(&app, put_text("/c/f.txt", "a\n")).await);
    send(&app, put_text("/c/f.txt", "a\nother\n")).await;

    let mut request = put_text("/c/f.txt", "a\nmine\n");
    request
        .headers_mut()
        .insert(http::header::IF_MATCH, stale.parse().unwrap());
    assert_eq!(
        send(&app, request).await.status(),
        StatusCode::PRECONDITION_FAILED
    );

    let resp = send(&app, get("/c/f.txt")).await;
    assert_eq!(body_text(resp).await, "a\nother\n");
}

#[tokio::test]
async fn if_none_match_star_rejects_existing_resource() {
    let app = app();
    send(&app, put_text("/c/f.txt", "a\n")).await;

    let mut request = put_text("/c/f.txt", "b\n");
    request
        .headers_mut()
        .insert(http::header::IF_NONE_MATCH, "*".parse().unwrap());
    assert_eq!(
        send(&app, request).await.status(),
        StatusCode::PRECONDITION_FAILED
    );
}

#[tokio::test]
async fn if_none_match_star_allows_creation() {
    let mut request = put_text("/c/f.txt", "b\n");
    request
        .headers_mut()
        .insert(http::header::IF_NONE_MATCH, "*".parse().unwrap());
    let resp = app().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

// --- methods ---

#[tokio::test]
async fn unsupported_method_returns_405() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/c/f.txt")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers()[http::header::ALLOW], "GET, HEAD, PUT");
}
