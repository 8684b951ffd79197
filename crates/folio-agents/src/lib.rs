//! Folio Agents - the model-backed roles of the section pipeline
//!
//! Each role makes at most one model call per invocation and returns a
//! typed result or a [`StageError`](folio_core::StageError):
//! - [`Extractor`] drafts a section from the documents
//! - [`Reviewer`] critiques a draft
//! - [`Writer`] revises a draft, after a local search for the critique's terms
//! - [`TableGenerator`] and [`GraphGenerator`] derive the section's table and charts
//!
//! All roles share one [`ModelGateway`]. Deadlines and retries belong to the
//! gateway ([`ResilientGateway`]), never to the roles.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod extractor;
pub mod gateway;
pub mod graph;
pub mod http;
mod prompt;
pub mod reviewer;
pub mod table;
pub mod writer;

pub use extractor::Extractor;
pub use gateway::{ModelGateway, ModelRequest, ResilientGateway, RetryPolicy};
pub use graph::GraphGenerator;
pub use http::HttpGateway;
pub use reviewer::Reviewer;
pub use table::TableGenerator;
pub use writer::{targeted_search, RewriteOutcome, Writer, NO_NEW_INFORMATION};

use std::sync::Arc;

/// The five roles wired to one gateway
#[derive(Clone)]
pub struct SectionAgents {
    pub extractor: Extractor,
    pub reviewer: Reviewer,
    pub writer: Writer,
    pub table: TableGenerator,
    pub graph: GraphGenerator,
}

impl SectionAgents {
    /// Build every role on a shared gateway
    #[must_use]
    pub fn new(gateway: Arc<dyn ModelGateway>, snippet_chars: usize) -> Self {
        Self {
            extractor: Extractor::new(Arc::clone(&gateway)),
            reviewer: Reviewer::new(Arc::clone(&gateway)),
            writer: Writer::new(Arc::clone(&gateway), snippet_chars),
            table: TableGenerator::new(Arc::clone(&gateway)),
            graph: GraphGenerator::new(gateway),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned gateway for the role tests

    use crate::gateway::{ModelGateway, ModelRequest};
    use async_trait::async_trait;
    use folio_core::GatewayError;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Replays queued responses in order, then fails with `EmptyResponse`
    pub(crate) struct CannedGateway {
        responses: Mutex<VecDeque<Result<String, GatewayError>>>,
        requests: Mutex<Vec<ModelRequest>>,
        delay: Option<Duration>,
    }

    impl CannedGateway {
        pub(crate) fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn requests(&self) -> Vec<ModelRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl ModelGateway for CannedGateway {
        async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
            self.requests.lock().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .pop_front()
                .unwrap_or(Err(GatewayError::EmptyResponse))
        }
    }
}
