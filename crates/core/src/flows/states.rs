use serde::{Deserialize, Serialize};

use crate::domain::proposal::{HistoryEntry, ProposalUpdate, RoutingFields};

/// Workflow position derived from a proposal's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Draft,
    /// A cycle was opened but no step is pending. Only reachable when the
    /// resolved path has no applicable steps.
    Submitted,
    Pending {
        step_index: usize,
        stage: String,
    },
    Approved,
    Rejected,
}

impl WorkflowState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Pending { .. } => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeRequest {
    pub actor: String,
    pub actor_role: String,
    pub is_draft: bool,
    pub routing: RoutingFields,
}

/// A decision on the pending step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    /// Zero-based position in the resolved path the actor saw when deciding.
    pub expected_step_index: usize,
    pub actor: String,
    pub actor_role: String,
    pub comment: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResubmitRequest {
    pub update: ProposalUpdate,
    pub actor: String,
    pub actor_role: String,
    pub comment: String,
}

/// Entries to append plus the state they leave the proposal in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTransition {
    pub entries: Vec<HistoryEntry>,
    pub state: WorkflowState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resubmission {
    pub routing: RoutingFields,
    pub transition: WorkflowTransition,
}
