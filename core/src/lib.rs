//! Blocking client for plain-text resources in a Solid pod.
//!
//! # Overview
//! Several independent agents share one LDP container hierarchy on a Solid
//! server. This crate lets each of them create containers and publish, read
//! and append newline-separated text records.
//!
//! # Design
//! - `PodClient` is stateless. It holds only the pod root and splits each
//!   operation into `build_*` (produces an `HttpRequest`) and `parse_*`
//!   (consumes an `HttpResponse`), so the I/O boundary is explicit.
//! - `Transport` executes one exchange. `UreqTransport` is the default,
//!   blocking and bounded by a timeout.
//! - `Pod` pairs the two. Its plain operations log failures and return
//!   defaults so a periodic agent never crashes on a network hiccup; the
//!   `try_*` operations return `PodError` instead.
//! - `update_data` is read-then-replace. Concurrent updates of one resource
//!   can lose writes unless `UpdateStrategy::Conditional` is configured.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod pod;
pub mod transport;

pub use client::{PodClient, Precondition, Snapshot};
pub use codec::{decode_records, encode_records};
pub use config::{PodConfig, UpdateStrategy};
pub use error::{ConfigError, PodError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pod::Pod;
pub use transport::{Transport, UreqTransport};
