//! In-memory LDP server standing in for a Solid pod.
//!
//! Paths ending in `/` are containers, everything else is a text resource.
//! `PUT` creates or replaces, `GET`/`HEAD` read, and every stored entry
//! carries an `ETag` that `If-Match` / `If-None-Match` are checked against.
//! Writing a resource creates any missing ancestor containers.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const CONTAINER_CONTENT_TYPE: &str = "text/turtle";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Container,
    Resource { body: String, content_type: String },
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub kind: EntryKind,
    pub etag: String,
}

impl Entry {
    fn container() -> Self {
        Self {
            kind: EntryKind::Container,
            etag: new_etag(),
        }
    }

    fn resource(body: String, content_type: String) -> Self {
        Self {
            kind: EntryKind::Resource { body, content_type },
            etag: new_etag(),
        }
    }
}

/// Entries keyed by request path. The root container `/` always exists.
pub type Store = Arc<RwLock<HashMap<String, Entry>>>;

pub fn new_store() -> Store {
    let mut entries = HashMap::new();
    entries.insert("/".to_string(), Entry::container());
    Arc::new(RwLock::new(entries))
}

pub fn app() -> Router {
    app_with_store(new_store())
}

/// Router over a caller-owned store, so tests can inspect what was written.
pub fn app_with_store(store: Store) -> Router {
    Router::new().fallback(handle).with_state(store)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn handle(
    State(store): State<Store>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    let response = match method {
        Method::GET => read(&store, &path, false).await,
        Method::HEAD => read(&store, &path, true).await,
        Method::PUT => write(&store, path.clone(), &headers, body).await,
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD, PUT")],
        )
            .into_response(),
    };
    debug!(%method, %path, status = response.status().as_u16(), "handled");
    response
}

async fn read(store: &Store, path: &str, head: bool) -> Response {
    let entries = store.read().await;
    let Some(entry) = entries.get(path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let (content_type, body) = match &entry.kind {
        EntryKind::Resource { body, content_type } => (content_type.clone(), body.clone()),
        EntryKind::Container => (
            CONTAINER_CONTENT_TYPE.to_string(),
            container_listing(&entries, path),
        ),
    };
    let body = if head { Body::empty() } else { Body::from(body) };
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::ETAG, entry.etag.clone()),
        ],
        body,
    )
        .into_response()
}

async fn write(store: &Store, path: String, headers: &HeaderMap, body: String) -> Response {
    let mut entries = store.write().await;
    if let Err(status) = check_preconditions(headers, entries.get(&path)) {
        return status.into_response();
    }
    let existed = entries.contains_key(&path);

    if path.ends_with('/') {
        // Re-creating a container leaves it and its children untouched.
        if existed {
            return StatusCode::NO_CONTENT.into_response();
        }
        create_ancestors(&mut entries, &path);
        let entry = Entry::container();
        let etag = entry.etag.clone();
        entries.insert(path, entry);
        return (StatusCode::CREATED, [(header::ETAG, etag)]).into_response();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    create_ancestors(&mut entries, &path);
    let entry = Entry::resource(body, content_type);
    let etag = entry.etag.clone();
    entries.insert(path, entry);

    let status = if existed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::CREATED
    };
    (status, [(header::ETAG, etag)]).into_response()
}

/// `Err(412)` when `If-Match` or `If-None-Match` rules out the write.
fn check_preconditions(headers: &HeaderMap, current: Option<&Entry>) -> Result<(), StatusCode> {
    if let Some(expected) = header_str(headers, header::IF_MATCH) {
        let matched = current.is_some_and(|entry| etag_listed(expected, &entry.etag));
        if !matched {
            return Err(StatusCode::PRECONDITION_FAILED);
        }
    }
    if let Some(excluded) = header_str(headers, header::IF_NONE_MATCH) {
        if current.is_some_and(|entry| etag_listed(excluded, &entry.etag)) {
            return Err(StatusCode::PRECONDITION_FAILED);
        }
    }
    Ok(())
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn etag_listed(list: &str, etag: &str) -> bool {
    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == etag)
}

fn create_ancestors(entries: &mut HashMap<String, Entry>, path: &str) {
    for ancestor in ancestors(path) {
        entries
            .entry(ancestor.to_string())
            .or_insert_with(Entry::container);
    }
}

/// Containers above `path`, outermost first: `/a/b/f` gives `/`, `/a/`, `/a/b/`.
fn ancestors(path: &str) -> Vec<&str> {
    path.char_indices()
        .filter(|&(i, c)| c == '/' && i + 1 < path.len())
        .map(|(i, _)| &path[..=i])
        .collect()
}

/// Minimal Turtle description of a container and its direct children.
fn container_listing(entries: &HashMap<String, Entry>, path: &str) -> String {
    let mut children: Vec<&str> = entries
        .keys()
        .filter_map(|key| key.strip_prefix(path))
        .filter(|rest| !rest.is_empty() && !rest.trim_end_matches('/').contains('/'))
        .collect();
    children.sort_unstable();

    let mut turtle = String::from("@prefix ldp: <http://www.w3.org/ns/ldp#>.\n\n");
    turtle.push_str("<> a ldp:Container, ldp:BasicContainer");
    if !children.is_empty() {
        let contains: Vec<String> = children.iter().map(|c| format!("<{c}>")).collect();
        turtle.push_str(";\n    ldp:contains ");
        turtle.push_str(&contains.join(", "));
    }
    turtle.push_str(".\n");
    turtle
}

fn new_etag() -> String {
    format!("\"{}\"", Uuid::new_v4().simple())
}
