use thiserror::Error;
use tracing::{info, warn};

use crate::approvals::{ApprovalPath, ApprovalPathSource, ApprovalRouter, RoutingError};
use crate::catalog::{CatalogDefinition, CatalogError};
use crate::domain::proposal::{HistoryAction, HistoryEntry, Proposal};
use crate::flows::states::{
    Decision, DecisionRequest, InitializeRequest, ResubmitRequest, Resubmission, WorkflowState,
    WorkflowTransition,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    NoMatch(#[from] RoutingError),
    #[error("stale decision: step {expected_step} targeted, proposal is at {current_step:?}")]
    StaleStepConflict { expected_step: usize, current_step: Option<usize> },
    #[error("proposal is still a draft")]
    NotSubmitted,
    #[error("proposal has already been submitted")]
    AlreadySubmitted,
    #[error("only rejected proposals can be resubmitted (current state: {state:?})")]
    NotRejected { state: WorkflowState },
    #[error("role `{actor_role}` cannot decide a step that requires `{required_role}`")]
    UnauthorizedApprover { actor_role: String, required_role: String },
}

/// Entries of the current approval cycle: everything after the latest
/// `Submitted` or `Resubmitted` marker. `None` while the proposal is a draft.
fn current_cycle(history: &[HistoryEntry]) -> Option<&[HistoryEntry]> {
    let marker = history.iter().rposition(|entry| entry.action.opens_cycle())?;
    Some(&history[marker + 1..])
}

/// Number of steps approved in the current cycle, which is also the index of
/// the step awaiting a decision. Approvals from cycles closed by a rejection
/// stay in the log but do not count.
pub fn current_step_index(history: &[HistoryEntry]) -> usize {
    current_cycle(history)
        .map(|cycle| cycle.iter().filter(|entry| entry.action == HistoryAction::Approved).count())
        .unwrap_or(0)
}

pub fn workflow_state(history: &[HistoryEntry]) -> WorkflowState {
    let Some(cycle) = current_cycle(history) else {
        return WorkflowState::Draft;
    };

    match cycle.last() {
        Some(entry) if entry.action == HistoryAction::Pending => WorkflowState::Pending {
            step_index: current_step_index(history),
            stage: entry.stage.clone(),
        },
        Some(entry) if entry.action == HistoryAction::Approved => WorkflowState::Approved,
        Some(entry) if entry.action == HistoryAction::Rejected => WorkflowState::Rejected,
        _ => WorkflowState::Submitted,
    }
}

/// Appends the single pending entry for the first step of `path`. A path with
/// no steps has nothing left to approve.
fn open_cycle(path: &ApprovalPath, entries: &mut Vec<HistoryEntry>) -> WorkflowState {
    match path.step(0) {
        Some(first) => {
            entries.push(HistoryEntry::pending(first));
            WorkflowState::Pending { step_index: 0, stage: first.stage_name.clone() }
        }
        None => WorkflowState::Approved,
    }
}

fn same_role(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Drives a proposal through its approval chain by reading and appending to
/// its history. Paths are recomputed on every call; nothing is cached.
pub struct WorkflowEngine<P> {
    paths: P,
}

impl<P> WorkflowEngine<P>
where
    P: ApprovalPathSource,
{
    pub fn new(paths: P) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &P {
        &self.paths
    }

    pub fn resolve_path(&self, proposal: &Proposal) -> Result<ApprovalPath, RoutingError> {
        self.paths.resolve_path(&proposal.routing)
    }

    /// `Created`, then for non-drafts `Submitted` and a pending entry for the
    /// first step only. Fails with `NoMatch` instead of inventing a chain.
    pub fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<WorkflowTransition, WorkflowError> {
        let mut entries = vec![HistoryEntry::created(&request.actor, &request.actor_role)];
        if request.is_draft {
            return Ok(WorkflowTransition { entries, state: WorkflowState::Draft });
        }

        let path = self.paths.resolve_path(&request.routing)?;
        entries.push(HistoryEntry::submitted(&request.actor, &request.actor_role));
        let state = open_cycle(&path, &mut entries);

        Ok(WorkflowTransition { entries, state })
    }

    /// Moves a draft into its approval chain.
    pub fn submit(
        &self,
        proposal: &Proposal,
        actor: &str,
        actor_role: &str,
    ) -> Result<WorkflowTransition, WorkflowError> {
        if workflow_state(&proposal.history) != WorkflowState::Draft {
            return Err(WorkflowError::AlreadySubmitted);
        }

        let path = self.resolve_path(proposal)?;
        let mut entries = vec![HistoryEntry::submitted(actor, actor_role)];
        let state = open_cycle(&path, &mut entries);

        Ok(WorkflowTransition { entries, state })
    }

    /// Applies a decision to the pending step.
    ///
    /// The current step is recomputed from history and compared against the
    /// step the caller decided on; any mismatch is a `StaleStepConflict` and
    /// nothing is appended.
    pub fn advance(
        &self,
        proposal: &Proposal,
        request: &DecisionRequest,
    ) -> Result<WorkflowTransition, WorkflowError> {
        let step_index = match workflow_state(&proposal.history) {
            WorkflowState::Pending { step_index, .. } => step_index,
            WorkflowState::Draft => return Err(WorkflowError::NotSubmitted),
            WorkflowState::Submitted | WorkflowState::Approved | WorkflowState::Rejected => {
                return Err(stale_step(proposal, request, None));
            }
        };

        let path = self.resolve_path(proposal)?;
        if step_index != request.expected_step_index {
            return Err(stale_step(proposal, request, Some(step_index)));
        }
        let Some(step) = path.step(step_index) else {
            return Err(stale_step(proposal, request, Some(step_index)));
        };

        if !same_role(&request.actor_role, step.role.as_str()) {
            return Err(WorkflowError::UnauthorizedApprover {
                actor_role: request.actor_role.clone(),
                required_role: step.role.0.clone(),
            });
        }

        let transition = match request.decision {
            Decision::Approve => {
                let mut entries = vec![HistoryEntry::decided(
                    step,
                    HistoryAction::Approved,
                    &request.actor,
                    &request.comment,
                )];
                let state = match path.step(step_index + 1) {
                    Some(next) => {
                        entries.push(HistoryEntry::pending(next));
                        WorkflowState::Pending {
                            step_index: step_index + 1,
                            stage: next.stage_name.clone(),
                        }
                    }
                    None => WorkflowState::Approved,
                };
                WorkflowTransition { entries, state }
            }
            Decision::Reject => WorkflowTransition {
                entries: vec![HistoryEntry::decided(
                    step,
                    HistoryAction::Rejected,
                    &request.actor,
                    &request.comment,
                )],
                state: WorkflowState::Rejected,
            },
        };

        info!(
            event_name = "workflow.decision_applied",
            proposal_id = %proposal.id.0,
            stage = %step.stage_name,
            step_index,
            decision = ?request.decision,
            next_state = transition.state.label(),
            "approval decision applied"
        );

        Ok(transition)
    }

    /// Re-enters a rejected proposal at step 1 of the path recomputed from the
    /// edited fields. Earlier decisions stay in the log.
    pub fn resubmit(
        &self,
        proposal: &Proposal,
        request: &ResubmitRequest,
    ) -> Result<Resubmission, WorkflowError> {
        let state = workflow_state(&proposal.history);
        if state != WorkflowState::Rejected {
            return Err(WorkflowError::NotRejected { state });
        }

        let routing = request.update.apply_to(&proposal.routing);
        let path = self.paths.resolve_path(&routing)?;
        let mut entries = vec![HistoryEntry::resubmitted(
            &request.actor,
            &request.actor_role,
            &request.comment,
        )];
        let state = open_cycle(&path, &mut entries);

        info!(
            event_name = "workflow.resubmitted",
            proposal_id = %proposal.id.0,
            range_code = %path.range_code,
            steps = path.len(),
            "rejected proposal resubmitted"
        );

        Ok(Resubmission { routing, transition: WorkflowTransition { entries, state } })
    }

    /// History-derived state, except that a submitted cycle whose freshly
    /// resolved path has no steps reads as `Approved`.
    pub fn state(&self, proposal: &Proposal) -> WorkflowState {
        match workflow_state(&proposal.history) {
            WorkflowState::Submitted
                if self.resolve_path(proposal).is_ok_and(|path| path.is_empty()) =>
            {
                WorkflowState::Approved
            }
            state => state,
        }
    }

    pub fn current_status_token(&self, proposal: &Proposal) -> String {
        self.state(proposal).status_token()
    }

    /// True once every step of the freshly resolved path has been approved in
    /// the current cycle.
    pub fn is_complete(&self, proposal: &Proposal) -> bool {
        if workflow_state(&proposal.history) == WorkflowState::Draft {
            return false;
        }

        match self.resolve_path(proposal) {
            Ok(path) => path.len() == current_step_index(&proposal.history),
            Err(_) => false,
        }
    }
}

impl WorkflowEngine<ApprovalRouter> {
    /// Engine over the built-in reference catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        CatalogDefinition::builtin().into_router().map(Self::new)
    }
}

fn stale_step(
    proposal: &Proposal,
    request: &DecisionRequest,
    current_step: Option<usize>,
) -> WorkflowError {
    warn!(
        event_name = "workflow.stale_step_conflict",
        proposal_id = %proposal.id.0,
        expected_step = request.expected_step_index,
        current_step = ?current_step,
        actor = %request.actor,
        "decision targets a step that is no longer pending"
    );
    WorkflowError::StaleStepConflict {
        expected_step: request.expected_step_index,
        current_step,
    }
}
