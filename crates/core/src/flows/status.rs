use tracing::warn;

use super::states::{WorkflowState, WorkflowTransition};

pub const FALLBACK_STATUS_TOKEN: &str = "IN_APPROVAL";

const STAGE_TOKENS: &[(&str, &str)] = &[
    ("Unit Head Approval", "WAITING_UNIT_HEAD"),
    ("Section Head Approval", "WAITING_SECTION_HEAD"),
    ("Department Head Approval", "WAITING_DEPARTMENT_HEAD"),
    ("Manager Approval", "WAITING_MANAGER"),
    ("Division Head Approval", "WAITING_DIVISION_HEAD"),
    ("Regional Operations Approval", "WAITING_REGIONAL_OPERATIONS"),
    ("Director Approval", "WAITING_DIRECTOR"),
    ("Top Executive Approval", "WAITING_TOP_EXECUTIVE"),
    ("Sourcing Officer Review", "WAITING_SOURCING_OFFICER"),
    ("Sourcing Lead Review", "WAITING_SOURCING_LEAD"),
];

pub fn status_token_for_stage(stage: &str) -> Option<&'static str> {
    STAGE_TOKENS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(stage.trim()))
        .map(|(_, token)| *token)
}

impl WorkflowState {
    /// Human-facing status label. Unknown stage names fall back to
    /// [`FALLBACK_STATUS_TOKEN`] and are logged as catalog drift.
    pub fn status_token(&self) -> String {
        match self {
            Self::Draft => "DRAFT".to_owned(),
            Self::Submitted => "SUBMITTED".to_owned(),
            Self::Approved => "APPROVED".to_owned(),
            Self::Rejected => "REJECTED".to_owned(),
            Self::Pending { stage, .. } => match status_token_for_stage(stage) {
                Some(token) => token.to_owned(),
                None => {
                    warn!(
                        event_name = "workflow.unknown_stage",
                        stage = %stage,
                        fallback = FALLBACK_STATUS_TOKEN,
                        "stage name has no status token; catalog and token table have drifted"
                    );
                    FALLBACK_STATUS_TOKEN.to_owned()
                }
            },
        }
    }
}

impl WorkflowTransition {
    pub fn status_token(&self) -> String {
        self.state.status_token()
    }
}
