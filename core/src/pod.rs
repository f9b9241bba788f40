//! Blocking pod operations over a `Transport`.
//!
//! # Design
//! Every operation exists twice:
//! - `try_*` returns `Result<_, PodError>` so callers can tell a missing
//!   resource from a failed request;
//! - the plain form (`create_container`, `publish_data`, `read_data`,
//!   `update_data`) never fails. It logs the error with `tracing` and
//!   returns `()` or an empty `Vec`. Callers of the plain `read_data`
//!   cannot distinguish "absent", "empty" and "request failed".
//!
//! `update_data` is a read followed by a full-replace write. With
//! `UpdateStrategy::Unconditional` nothing stops another writer from
//! publishing in between, and whichever write lands last wins. With
//! `UpdateStrategy::Conditional` the write is guarded by the `ETag` from
//! the read and the cycle restarts on 412.

use std::fmt::Display;

use tracing::{debug, info, warn};

use crate::client::{PodClient, Precondition, Snapshot};
use crate::config::{PodConfig, UpdateStrategy};
use crate::error::PodError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// A pod root plus the means to talk to it.
#[derive(Debug, Clone)]
pub struct Pod<T = UreqTransport> {
    client: PodClient,
    transport: T,
    update: UpdateStrategy,
    probe_before_create: bool,
}

impl Pod<UreqTransport> {
    pub fn from_config(config: &PodConfig) -> Self {
        Self::with_transport(config, UreqTransport::new(config.timeout()))
    }
}

impl<T: Transport> Pod<T> {
    pub fn with_transport(config: &PodConfig, transport: T) -> Self {
        Self {
            client: PodClient::new(&config.pod_url),
            transport,
            update: config.update,
            probe_before_create: config.probe_before_create,
        }
    }

    pub fn client(&self) -> &PodClient {
        &self.client
    }

    pub fn update_strategy(&self) -> UpdateStrategy {
        self.update
    }

    fn exchange(&self, request: HttpRequest) -> Result<HttpResponse, PodError> {
        debug!(method = request.method.as_str(), url = %request.url, "pod request");
        self.transport.execute(&request)
    }

    // -----------------------------------------------------------------------
    // Tagged results
    // -----------------------------------------------------------------------

    pub fn try_create_container(&self, container: &str) -> Result<(), PodError> {
        if self.probe_before_create {
            let probed = self
                .exchange(self.client.build_container_probe(container))
                .and_then(|response| self.client.parse_container_probe(response));
            match probed {
                Ok(true) => {
                    debug!(container, "container already exists, skipping create");
                    return Ok(());
                }
                Ok(false) => {}
                Err(err) => debug!(container, error = %err, "container probe failed, creating anyway"),
            }
        }
        let response = self.exchange(self.client.build_create_container(container))?;
        self.client.parse_create_container(response)
    }

    pub fn try_publish_data<R: Display>(
        &self,
        container: &str,
        file: &str,
        records: &[R],
    ) -> Result<(), PodError> {
        let response = self.exchange(self.client.build_publish_data(container, file, records))?;
        self.client.parse_publish_data(response)
    }

    pub fn try_read_data(&self, container: &str, file: &str) -> Result<Vec<String>, PodError> {
        let response = self.exchange(self.client.build_read_data(container, file))?;
        self.client.parse_read_data(response)
    }

    /// Append `records` to the resource and return everything published.
    ///
    /// A missing resource counts as empty. Any other read failure aborts
    /// the update before anything is written.
    pub fn try_update_data<R: Display>(
        &self,
        container: &str,
        file: &str,
        records: &[R],
    ) -> Result<Vec<String>, PodError> {
        match self.update {
            UpdateStrategy::Unconditional => self.update_unconditional(container, file, records),
            UpdateStrategy::Conditional { max_attempts } => {
                self.update_conditional(container, file, records, max_attempts)
            }
        }
    }

    fn update_unconditional<R: Display>(
        &self,
        container: &str,
        file: &str,
        records: &[R],
    ) -> Result<Vec<String>, PodError> {
        let existing = match self.try_read_data(container, file) {
            Ok(existing) => existing,
            Err(PodError::NotFound) => Vec::new(),
            Err(err) => return Err(err),
        };
        let combined = append(existing, records);
        self.try_publish_data(container, file, &combined)?;
        Ok(combined)
    }

    fn update_conditional<R: Display>(
        &self,
        container: &str,
        file: &str,
        records: &[R],
        max_attempts: u32,
    ) -> Result<Vec<String>, PodError> {
        // A zero budget still gets one attempt.
        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let response = self.exchange(self.client.build_read_data(container, file))?;
            let (existing, precondition) = match self.client.parse_read_snapshot(response) {
                Ok(Snapshot {
                    records: existing,
                    etag: Some(etag),
                }) => (existing, Some(Precondition::IfMatch(etag))),
                Ok(Snapshot {
                    records: existing,
                    etag: None,
                }) => {
                    warn!(container, file, "server sent no ETag, writing without a precondition");
                    (existing, None)
                }
                Err(PodError::NotFound) => (Vec::new(), Some(Precondition::IfAbsent)),
                Err(err) => return Err(err),
            };

            let combined = append(existing, records);
            let request = match &precondition {
                Some(precondition) => {
                    self.client
                        .build_conditional_publish(container, file, &combined, precondition)
                }
                None => self.client.build_publish_data(container, file, &combined),
            };
            let response = self.exchange(request)?;
            if response.status == 412 {
                debug!(container, file, attempt, "resource changed since read, retrying update");
                continue;
            }
            self.client.parse_publish_data(response)?;
            return Ok(combined);
        }
        Err(PodError::Conflict {
            attempts: max_attempts,
        })
    }

    // -----------------------------------------------------------------------
    // Fire and forget
    // -----------------------------------------------------------------------

    pub fn create_container(&self, container: &str) {
        let url = self.client.container_url(container);
        match self.try_create_container(container) {
            Ok(()) => info!(%url, "container ready"),
            Err(err) => warn!(%url, error = %err, "failed to create container"),
        }
    }

    pub fn publish_data<R: Display>(&self, container: &str, file: &str, records: &[R]) {
        let url = self.client.resource_url(container, file);
        match self.try_publish_data(container, file, records) {
            Ok(()) => info!(%url, records = records.len(), "data published"),
            Err(err) => warn!(%url, error = %err, "failed to publish data"),
        }
    }

    /// Records stored at `container/file`, or empty on any failure.
    pub fn read_data(&self, container: &str, file: &str) -> Vec<String> {
        self.try_read_data(container, file).unwrap_or_else(|err| {
            let url = self.client.resource_url(container, file);
            warn!(%url, error = %err, "failed to read data");
            Vec::new()
        })
    }

    /// Records published by the update, or empty on any failure.
    pub fn update_data<R: Display>(
        &self,
        container: &str,
        file: &str,
        records: &[R],
    ) -> Vec<String> {
        let url = self.client.resource_url(container, file);
        match self.try_update_data(container, file, records) {
            Ok(combined) => {
                info!(%url, records = combined.len(), "data updated");
                combined
            }
            Err(err) => {
                warn!(%url, error = %err, "failed to update data");
                Vec::new()
            }
        }
    }
}

fn append<R: Display>(mut existing: Vec<String>, records: &[R]) -> Vec<String> {
    existing.extend(records.iter().map(ToString::to_string));
    existing
}
