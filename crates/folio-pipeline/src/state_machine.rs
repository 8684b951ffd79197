//! Section state machine
//!
//! Drives one section through
//! `Extracting -> Reviewing -> {Rewriting -> Reviewing}* -> Tabulating -> Graphing -> Done`.
//!
//! Transitions are decided by [`next_phase`], a pure function of the current
//! phase, the section state and the loop budget. Stages only produce a
//! [`StageUpdate`]; merging it into the [`SectionState`] is the machine's job.
//! A failed stage contributes nothing except a recorded fault, and the
//! section always reaches `Done` unless the run is cancelled.

use crate::cancel::CancellationToken;
use crate::error::{PipelineError, Result};
use folio_agents::{RewriteOutcome, SectionAgents};
use folio_core::{ReportConfig, SectionState, Stage, StageError, StageUpdate};

/// Position of a section in its traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionPhase {
    /// Drafting content from the documents
    Extracting,
    /// Critiquing the current draft
    Reviewing,
    /// Revising the draft against the critique
    Rewriting,
    /// Deriving the section table
    Tabulating,
    /// Deriving chart specifications
    Graphing,
    /// Section complete
    Done,
}

impl SectionPhase {
    /// Every phase, in traversal order
    pub const ALL: [SectionPhase; 6] = [
        SectionPhase::Extracting,
        SectionPhase::Reviewing,
        SectionPhase::Rewriting,
        SectionPhase::Tabulating,
        SectionPhase::Graphing,
        SectionPhase::Done,
    ];

    /// Stage run in this phase
    #[must_use]
    pub fn stage(self) -> Option<Stage> {
        match self {
            SectionPhase::Extracting => Some(Stage::Extraction),
            SectionPhase::Reviewing => Some(Stage::Review),
            SectionPhase::Rewriting => Some(Stage::Rewrite),
            SectionPhase::Tabulating => Some(Stage::Table),
            SectionPhase::Graphing => Some(Stage::Graph),
            SectionPhase::Done => None,
        }
    }

    /// Update merged when this phase's stage fails
    ///
    /// A failed rewrite still counts as a cycle, a failed review reads as
    /// "no critique", and failed outputs stay distinguishable from empty ones.
    fn failure_update(self) -> Option<StageUpdate> {
        match self {
            SectionPhase::Extracting | SectionPhase::Done => None,
            SectionPhase::Reviewing => Some(StageUpdate::Reviewed(None)),
            SectionPhase::Rewriting => Some(StageUpdate::Rewritten(None)),
            SectionPhase::Tabulating => Some(StageUpdate::Tabulated(None)),
            SectionPhase::Graphing => Some(StageUpdate::Charted(Vec::new())),
        }
    }
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: SectionPhase) -> Vec<SectionPhase> {
    use SectionPhase::*;
    match from {
        Extracting => vec![Reviewing],
        Reviewing => vec![Rewriting, Tabulating],
        Rewriting => vec![Reviewing, Tabulating],
        Tabulating => vec![Graphing],
        Graphing => vec![Done],
        Done => vec![],
    }
}

/// Validates a phase transition.
///
/// # Errors
/// `PipelineError::IllegalTransition` when `to` is not reachable from `from`.
pub fn validate_transition(from: SectionPhase, to: SectionPhase) -> Result<()> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PipelineError::IllegalTransition { from, to })
    }
}

/// Next phase after `phase` has run and its update has been merged
///
/// Pure and total. `Done` maps to itself.
#[must_use]
pub fn next_phase(phase: SectionPhase, state: &SectionState, max_review_loops: u32) -> SectionPhase {
    let budget_left = state.loop_count < max_review_loops;
    match phase {
        SectionPhase::Extracting => SectionPhase::Reviewing,
        SectionPhase::Reviewing => {
            let actionable = state.critique.as_ref().is_some_and(|c| c.is_actionable());
            if actionable && budget_left {
                SectionPhase::Rewriting
            } else {
                SectionPhase::Tabulating
            }
        }
        SectionPhase::Rewriting if budget_left => SectionPhase::Reviewing,
        SectionPhase::Rewriting => SectionPhase::Tabulating,
        SectionPhase::Tabulating => SectionPhase::Graphing,
        SectionPhase::Graphing | SectionPhase::Done => SectionPhase::Done,
    }
}

/// Runs sections to completion against the five roles
#[derive(Clone)]
pub struct SectionMachine {
    agents: SectionAgents,
    max_review_loops: u32,
    gate_outputs_on_flags: bool,
}

impl SectionMachine {
    /// Create new machine with the given rewrite budget
    #[must_use]
    pub fn new(agents: SectionAgents, max_review_loops: u32) -> Self {
        Self {
            agents,
            max_review_loops,
            gate_outputs_on_flags: false,
        }
    }

    /// Machine configured from run settings
    #[must_use]
    pub fn from_config(agents: SectionAgents, config: &ReportConfig) -> Self {
        Self::new(agents, config.max_review_loops).with_output_gating(config.gate_outputs_on_flags)
    }

    /// Skip the table/graph model calls for sections that do not want them
    #[must_use]
    pub fn with_output_gating(mut self, gate: bool) -> Self {
        self.gate_outputs_on_flags = gate;
        self
    }

    /// Rewrite budget per section
    #[inline]
    #[must_use]
    pub fn max_review_loops(&self) -> u32 {
        self.max_review_loops
    }

    /// Drive `state` from `Extracting` to `Done`
    ///
    /// # Errors
    /// `PipelineError::Cancelled` when `cancel` fires before the section
    /// finishes; the partial state is dropped.
    pub async fn run(&self, mut state: SectionState, cancel: &CancellationToken) -> Result<SectionState> {
        tracing::info!(section = %state.title, max_review_loops = self.max_review_loops, "section started");
        let mut phase = SectionPhase::Extracting;

        while phase != SectionPhase::Done {
            let cancelled = || PipelineError::Cancelled {
                section: state.title.clone(),
            };
            if cancel.is_cancelled() {
                return Err(cancelled());
            }

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                outcome = self.execute(phase, &state) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                return Err(cancelled());
            };

            match outcome {
                Ok(Some(update)) => state.apply(update),
                Ok(None) => {}
                Err(err) => {
                    record_fault(&mut state, phase, &err);
                    if let Some(update) = phase.failure_update() {
                        state.apply(update);
                    }
                }
            }

            let next = next_phase(phase, &state, self.max_review_loops);
            validate_transition(phase, next)?;
            tracing::debug!(
                section = %state.title,
                from = ?phase,
                to = ?next,
                loop_count = state.loop_count,
                "phase transition"
            );
            phase = next;
        }

        tracing::info!(
            section = %state.title,
            loop_count = state.loop_count,
            faults = state.faults.len(),
            "section finished"
        );
        Ok(state)
    }

    /// Run the stage for `phase` against the current state
    ///
    /// `Ok(None)` means the stage was skipped and nothing is merged.
    async fn execute(
        &self,
        phase: SectionPhase,
        state: &SectionState,
    ) -> std::result::Result<Option<StageUpdate>, StageError> {
        let title = state.title.as_str();
        let update = match phase {
            SectionPhase::Extracting => StageUpdate::Drafted(
                self.agents
                    .extractor
                    .extract_with_context(&state.documents, title, &state.instruction, &state.prior_sections)
                    .await?,
            ),
            SectionPhase::Reviewing => StageUpdate::Reviewed(Some(
                self.agents
                    .reviewer
                    .review(title, state.content(), state.references())
                    .await?,
            )),
            SectionPhase::Rewriting => {
                let outcome = self
                    .agents
                    .writer
                    .rewrite(
                        title,
                        &state.instruction,
                        state.draft(),
                        state.critique.as_ref(),
                        &state.documents,
                    )
                    .await?;
                match outcome {
                    RewriteOutcome::Rewritten(draft) => StageUpdate::Rewritten(Some(draft)),
                    RewriteOutcome::Skipped => StageUpdate::Rewritten(None),
                }
            }
            SectionPhase::Tabulating => {
                if self.gate_outputs_on_flags && !state.include_table {
                    tracing::debug!(section = %title, "table not requested, skipping");
                    return Ok(None);
                }
                StageUpdate::Tabulated(Some(
                    self.agents
                        .table
                        .generate_table(&state.documents, title, state.content())
                        .await?,
                ))
            }
            SectionPhase::Graphing => {
                if self.gate_outputs_on_flags && !state.include_graph {
                    tracing::debug!(section = %title, "graph not requested, skipping");
                    return Ok(None);
                }
                StageUpdate::Charted(
                    self.agents
                        .graph
                        .generate_graph(&state.documents, title, state.content(), state.tabular_data.as_ref())
                        .await?,
                )
            }
            SectionPhase::Done => return Ok(None),
        };
        Ok(Some(update))
    }
}

fn record_fault(state: &mut SectionState, phase: SectionPhase, err: &StageError) {
    let Some(stage) = err.stage().or(phase.stage()) else {
        return;
    };
    tracing::warn!(section = %state.title, stage = ?stage, error = %err, "stage failed, continuing");
    state.record_fault(stage, err.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Critique, DocumentSet, SectionSpec};
    use proptest::prelude::*;

    fn state(loop_count: u32, critique: Option<Critique>) -> SectionState {
        let mut state = SectionState::new(DocumentSet::default(), &SectionSpec::new("Risks", ""));
        state.loop_count = loop_count;
        state.critique = critique;
        state
    }

    fn actionable() -> Critique {
        Critique {
            expand_on: vec!["more".into()],
            ..Critique::default()
        }
    }

    #[test]
    fn linear_phases_are_unconditional() {
        let s = state(0, None);
        assert_eq!(next_phase(SectionPhase::Extracting, &s, 2), SectionPhase::Reviewing);
        assert_eq!(next_phase(SectionPhase::Tabulating, &s, 2), SectionPhase::Graphing);
        assert_eq!(next_phase(SectionPhase::Graphing, &s, 2), SectionPhase::Done);
        assert_eq!(next_phase(SectionPhase::Done, &s, 2), SectionPhase::Done);
    }

    #[test]
    fn actionable_critique_within_budget_rewrites() {
        let s = state(0, Some(actionable()));
        assert_eq!(next_phase(SectionPhase::Reviewing, &s, 1), SectionPhase::Rewriting);
    }

    #[test]
    fn empty_critique_goes_to_tabulating() {
        let s = state(0, Some(Critique::default()));
        assert_eq!(next_phase(SectionPhase::Reviewing, &s, 5), SectionPhase::Tabulating);

        let search_only = Critique {
            search_terms: vec!["margin".into()],
            ..Critique::default()
        };
        let s = state(0, Some(search_only));
        assert_eq!(next_phase(SectionPhase::Reviewing, &s, 5), SectionPhase::Tabulating);
    }

    #[test]
    fn missing_critique_goes_to_tabulating() {
        let s = state(0, None);
        assert_eq!(next_phase(SectionPhase::Reviewing, &s, 5), SectionPhase::Tabulating);
    }

    #[test]
    fn zero_budget_never_rewrites() {
        let s = state(0, Some(actionable()));
        assert_eq!(next_phase(SectionPhase::Reviewing, &s, 0), SectionPhase::Tabulating);
    }

    #[test]
    fn rewrite_returns_to_review_until_budget_spent() {
        assert_eq!(next_phase(SectionPhase::Rewriting, &state(1, None), 2), SectionPhase::Reviewing);
        assert_eq!(next_phase(SectionPhase::Rewriting, &state(2, None), 2), SectionPhase::Tabulating);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert!(validate_transition(SectionPhase::Extracting, SectionPhase::Reviewing).is_ok());
        assert!(validate_transition(SectionPhase::Extracting, SectionPhase::Tabulating).is_err());
        assert!(validate_transition(SectionPhase::Done, SectionPhase::Extracting).is_err());
        assert!(validate_transition(SectionPhase::Graphing, SectionPhase::Reviewing).is_err());
    }

    fn any_phase() -> impl Strategy<Value = SectionPhase> {
        proptest::sample::select(SectionPhase::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_validate_matches_allowed(from in any_phase(), to in any_phase()) {
            let allowed = allowed_transitions(from);
            prop_assert_eq!(validate_transition(from, to).is_ok(), allowed.contains(&to));
        }

        #[test]
        fn prop_next_phase_is_always_allowed(
            from in any_phase(),
            loop_count in 0u32..6,
            max in 0u32..6,
            critique_kind in 0u8..3,
        ) {
            prop_assume!(from != SectionPhase::Done);
            let critique = match critique_kind {
                0 => None,
                1 => Some(Critique::default()),
                _ => Some(actionable()),
            };
            let next = next_phase(from, &state(loop_count, critique), max);
            prop_assert!(validate_transition(from, next).is_ok());
        }
    }
}
