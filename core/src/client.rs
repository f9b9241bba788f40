//! Stateless HTTP request builder and response parser for a Solid pod.
//!
//! # Design
//! `PodClient` holds only the pod root and carries no mutable state between
//! calls. Each LDP operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! `Pod` (see `pod.rs`) pairs the two with a `Transport`; anything else that
//! can move bytes can do the same.
//!
//! Addresses are formed by plain concatenation: a container is
//! `root/name/`, a resource is `root/container/file`. Names are not escaped;
//! callers pass path-safe names.

use std::fmt::Display;

use crate::codec::{decode_records, encode_records};
use crate::error::PodError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Media type sent when creating a container.
pub const CONTAINER_CONTENT_TYPE: &str = "text/turtle";
/// Media type of every resource this client writes.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";
/// Media type requested when reading a resource.
pub const TEXT_ACCEPT: &str = "text/plain";

/// Guard attached to a write so the server rejects it with 412 when the
/// resource changed since it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The resource must still carry this entity tag.
    IfMatch(String),
    /// The resource must still not exist.
    IfAbsent,
}

/// Decoded content of a resource plus the entity tag it was served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub records: Vec<String>,
    pub etag: Option<String>,
}

/// Synchronous, stateless request builder and response parser for one pod.
#[derive(Debug, Clone)]
pub struct PodClient {
    pod_url: String,
}

impl PodClient {
    pub fn new(pod_url: &str) -> Self {
        Self {
            pod_url: pod_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn pod_url(&self) -> &str {
        &self.pod_url
    }

    pub fn container_url(&self, container: &str) -> String {
        format!("{}/{container}/", self.pod_url)
    }

    pub fn resource_url(&self, container: &str, file: &str) -> String {
        format!("{}/{container}/{file}", self.pod_url)
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    /// PUT with an empty Turtle body. Replacing by identity makes a repeat
    /// call harmless.
    pub fn build_create_container(&self, container: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Put,
            url: self.container_url(container),
            headers: vec![content_type(CONTAINER_CONTENT_TYPE)],
            body: Some(String::new()),
        }
    }

    /// Accepts exactly 201 Created and 204 No Content.
    pub fn parse_create_container(&self, response: HttpResponse) -> Result<(), PodError> {
        match response.status {
            201 | 204 => Ok(()),
            _ => Err(status_error(response)),
        }
    }

    pub fn build_container_probe(&self, container: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Head,
            url: self.container_url(container),
            headers: Vec::new(),
            body: None,
        }
    }

    /// `Ok(true)` if the container exists, `Ok(false)` on 404.
    pub fn parse_container_probe(&self, response: HttpResponse) -> Result<bool, PodError> {
        if response.is_success() {
            return Ok(true);
        }
        match status_error(response) {
            PodError::NotFound => Ok(false),
            err => Err(err),
        }
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    /// Full-replace write of the encoded records.
    pub fn build_publish_data<T: Display>(
        &self,
        container: &str,
        file: &str,
        records: &[T],
    ) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Put,
            url: self.resource_url(container, file),
            headers: vec![content_type(TEXT_CONTENT_TYPE)],
            body: Some(encode_records(records)),
        }
    }

    /// `build_publish_data` guarded by `precondition`.
    pub fn build_conditional_publish<T: Display>(
        &self,
        container: &str,
        file: &str,
        records: &[T],
        precondition: &Precondition,
    ) -> HttpRequest {
        let mut request = self.build_publish_data(container, file, records);
        let guard = match precondition {
            Precondition::IfMatch(etag) => ("if-match".to_string(), etag.clone()),
            Precondition::IfAbsent => ("if-none-match".to_string(), "*".to_string()),
        };
        request.headers.push(guard);
        request
    }

    /// Any 2xx counts as published.
    pub fn parse_publish_data(&self, response: HttpResponse) -> Result<(), PodError> {
        if response.is_success() {
            return Ok(());
        }
        Err(status_error(response))
    }

    pub fn build_read_data(&self, container: &str, file: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.resource_url(container, file),
            headers: vec![("accept".to_string(), TEXT_ACCEPT.to_string())],
            body: None,
        }
    }

    /// Decodes a 200 body. An empty body decodes to `[""]`.
    pub fn parse_read_data(&self, response: HttpResponse) -> Result<Vec<String>, PodError> {
        self.parse_read_snapshot(response).map(|snapshot| snapshot.records)
    }

    /// As `parse_read_data`, keeping the `ETag` for a later conditional write.
    pub fn parse_read_snapshot(&self, response: HttpResponse) -> Result<Snapshot, PodError> {
        if response.status != 200 {
            return Err(status_error(response));
        }
        let etag = response.header("etag").map(str::to_string);
        Ok(Snapshot {
            records: decode_records(&response.body),
            etag,
        })
    }
}

fn content_type(value: &str) -> (String, String) {
    ("content-type".to_string(), value.to_string())
}

/// Map a rejected response to the matching `PodError` variant.
fn status_error(response: HttpResponse) -> PodError {
    if response.status == 404 {
        return PodError::NotFound;
    }
    PodError::Status {
        status: response.status,
        body: response.body,
    }
}
