pub mod engine;
pub mod states;
pub mod status;

pub use engine::{current_step_index, workflow_state, WorkflowEngine, WorkflowError};
pub use states::{
    Decision, DecisionRequest, InitializeRequest, ResubmitRequest, Resubmission, WorkflowState,
    WorkflowTransition,
};
pub use status::{status_token_for_stage, FALLBACK_STATUS_TOKEN};
