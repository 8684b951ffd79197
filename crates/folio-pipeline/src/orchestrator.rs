//! Report orchestrator
//!
//! Runs the requested sections strictly in order, each from a fresh
//! [`SectionState`], and hands out every [`FinalizedSection`] as soon as it
//! is done. Nothing is shared between sections except the read-only
//! document set and, when enabled, the sections already finished.

use crate::cancel::CancellationToken;
use crate::error::PipelineError;
use crate::state_machine::SectionMachine;
use folio_agents::{ModelGateway, SectionAgents};
use folio_core::{DocumentSet, FinalizedSection, ReportConfig, SectionSpec, SectionState, Stage};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Result of a collected run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRun {
    /// Finished sections in request order
    pub sections: Vec<FinalizedSection>,
    /// True when the run stopped early on cancellation
    pub cancelled: bool,
}

/// Produces finalized sections, one at a time
#[derive(Clone)]
pub struct ReportOrchestrator {
    machine: SectionMachine,
    share_prior_sections: bool,
    cancel: CancellationToken,
}

struct Cursor {
    documents: DocumentSet,
    pending: std::vec::IntoIter<SectionSpec>,
    finished: Vec<FinalizedSection>,
}

impl ReportOrchestrator {
    /// Create new orchestrator
    #[must_use]
    pub fn new(machine: SectionMachine) -> Self {
        Self {
            machine,
            share_prior_sections: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Orchestrator wired from run settings and a gateway
    #[must_use]
    pub fn from_config(gateway: Arc<dyn ModelGateway>, config: &ReportConfig) -> Self {
        let agents = SectionAgents::new(gateway, config.snippet_chars);
        Self::new(SectionMachine::from_config(agents, config))
            .with_shared_prior_sections(config.share_prior_sections)
    }

    /// Offer finished sections to later extractions as context
    #[must_use]
    pub fn with_shared_prior_sections(mut self, share: bool) -> Self {
        self.share_prior_sections = share;
        self
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops this orchestrator
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Lazy, ordered stream of finalized sections
    ///
    /// Section *n+1* starts only when the consumer polls after section *n*
    /// was yielded. The stream ends early when the token fires; a section
    /// interrupted mid-way is not yielded. A section that fails any other
    /// way is yielded as an empty placeholder carrying the fault.
    pub fn stream(
        &self,
        documents: DocumentSet,
        sections: Vec<SectionSpec>,
    ) -> impl Stream<Item = FinalizedSection> + Send + '_ {
        let cursor = Cursor {
            documents,
            pending: sections.into_iter(),
            finished: Vec::new(),
        };

        stream::unfold(cursor, move |mut cursor| async move {
            let spec = cursor.pending.next()?;
            if self.cancel.is_cancelled() {
                tracing::info!(next_section = %spec.title, "run cancelled, stopping");
                return None;
            }

            let mut state = SectionState::new(cursor.documents.clone(), &spec);
            if self.share_prior_sections {
                state = state.with_prior_sections(Arc::from(cursor.finished.clone()));
            }

            let section = match self.machine.run(state, &self.cancel).await {
                Ok(done) => done.finalize(),
                Err(err) => {
                    let Some(placeholder) = failed_section(&cursor.documents, &spec, &err) else {
                        tracing::info!(section = %spec.title, error = %err, "section abandoned");
                        return None;
                    };
                    tracing::error!(section = %spec.title, error = %err, "section failed, continuing");
                    placeholder
                }
            };
            if self.share_prior_sections {
                cursor.finished.push(section.clone());
            }
            Some((section, cursor))
        })
    }

    /// Run every section and collect the results
    pub async fn run(&self, documents: DocumentSet, sections: Vec<SectionSpec>) -> ReportRun {
        let requested = sections.len();
        let sections: Vec<FinalizedSection> = self.stream(documents, sections).collect().await;
        let cancelled = sections.len() < requested && self.cancel.is_cancelled();

        tracing::info!(sections = sections.len(), requested, cancelled, "report run finished");
        ReportRun { sections, cancelled }
    }

    /// Run on a background task, delivering sections over a channel
    ///
    /// The channel holds one section, so the task never runs more than one
    /// section ahead of the consumer. Dropping the receiver stops the run
    /// after the current section. The task resolves to `true` when the run
    /// was cancelled.
    pub fn spawn(
        self,
        documents: DocumentSet,
        sections: Vec<SectionSpec>,
    ) -> (mpsc::Receiver<FinalizedSection>, JoinHandle<bool>) {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let requested = sections.len();
            let mut delivered = 0usize;
            let stream = self.stream(documents, sections);
            futures::pin_mut!(stream);

            while let Some(section) = stream.next().await {
                if tx.send(section).await.is_err() {
                    tracing::debug!("section receiver dropped, stopping");
                    break;
                }
                delivered += 1;
            }
            delivered < requested && self.cancel.is_cancelled()
        });
        (rx, handle)
    }
}

/// Stand-in for a section whose run failed without being cancelled
///
/// Cancellation yields `None`: the run is over and nothing is emitted.
fn failed_section(
    documents: &DocumentSet,
    spec: &SectionSpec,
    err: &PipelineError,
) -> Option<FinalizedSection> {
    if err.is_cancelled() {
        return None;
    }
    let mut state = SectionState::new(documents.clone(), spec);
    state.record_fault(err.stage().unwrap_or(Stage::Extraction), err.to_string());
    Some(state.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::SectionPhase;
    use pretty_assertions::assert_eq;

    #[test]
    fn cancellation_emits_nothing() {
        let err = PipelineError::Cancelled {
            section: "Risks".into(),
        };
        assert!(failed_section(&DocumentSet::default(), &SectionSpec::new("Risks", ""), &err).is_none());
    }

    #[test]
    fn other_failures_become_a_faulted_placeholder() {
        let spec = SectionSpec::new("Risks", "Key risks").with_table(true);
        let err = PipelineError::IllegalTransition {
            from: SectionPhase::Tabulating,
            to: SectionPhase::Rewriting,
        };

        let section = failed_section(&DocumentSet::default(), &spec, &err).unwrap();

        assert_eq!(section.section, "Risks");
        assert_eq!(section.instruction, "Key risks");
        assert!(section.include_table);
        assert_eq!(section.content, "");
        assert_eq!(section.faults.len(), 1);
        assert_eq!(section.faults[0].stage, Stage::Table);
        assert!(section.faults[0].message.contains("illegal phase transition"));
    }
}
