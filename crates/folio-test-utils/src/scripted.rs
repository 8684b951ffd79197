//! Scripted stub gateway
//!
//! Answers each stage from its own FIFO queue, then from the stage's
//! fallback. Every request is logged so tests can count calls per stage.

use crate::responses;
use async_trait::async_trait;
use folio_agents::{ModelGateway, ModelRequest};
use folio_core::{GatewayError, Stage};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

#[derive(Default)]
pub struct ScriptedGateway {
    queues: Mutex<HashMap<Stage, VecDeque<Result<String, GatewayError>>>>,
    fallbacks: HashMap<Stage, String>,
    log: Mutex<Vec<ModelRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    /// Gateway with no scripted answers; every call fails with `EmptyResponse`
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallbacks that take a section straight through without rewrites:
    /// a one-line draft, an empty critique, the empty table and no graph
    pub fn happy_path() -> Self {
        Self::new()
            .with_fallback(Stage::Extraction, responses::draft(crate::SAMPLE_TEXT, &[("a.txt", "page 1")]))
            .with_fallback(Stage::Review, responses::empty_critique())
            .with_fallback(Stage::Rewrite, responses::draft(crate::SAMPLE_TEXT, &[("a.txt", "page 1")]))
            .with_fallback(Stage::Table, responses::empty_table())
            .with_fallback(Stage::Graph, responses::no_graph())
    }

    /// Queue one answer for a stage
    pub fn with_response(self, stage: Stage, text: impl Into<String>) -> Self {
        self.enqueue(stage, Ok(text.into()));
        self
    }

    /// Queue one failure for a stage
    pub fn with_failure(self, stage: Stage, error: GatewayError) -> Self {
        self.enqueue(stage, Err(error));
        self
    }

    /// Answer used once a stage's queue is drained
    pub fn with_fallback(mut self, stage: Stage, text: impl Into<String>) -> Self {
        self.fallbacks.insert(stage, text.into());
        self
    }

    /// Sleep before answering (pair with a paused tokio clock)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn enqueue(&self, stage: Stage, answer: Result<String, GatewayError>) {
        self.queues.lock().entry(stage).or_default().push_back(answer);
    }

    /// Calls made for one stage
    pub fn calls(&self, stage: Stage) -> usize {
        self.log.lock().iter().filter(|r| r.stage == stage).count()
    }

    /// Calls made for all stages
    pub fn total_calls(&self) -> usize {
        self.log.lock().len()
    }

    /// Requests received, in order
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.log.lock().clone()
    }

    /// Requests received for one stage, in order
    pub fn requests_for(&self, stage: Stage) -> Vec<ModelRequest> {
        self.log
            .lock()
            .iter()
            .filter(|r| r.stage == stage)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        self.log.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .queues
            .lock()
            .get_mut(&request.stage)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(answer) => answer,
            None => self
                .fallbacks
                .get(&request.stage)
                .cloned()
                .ok_or(GatewayError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
