use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::approvals::ApprovalStep;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub String);

/// The proposal fields that decide which approval chain applies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingFields {
    pub amount: Decimal,
    pub creator_department: String,
    pub creator_worksite: String,
    /// Worksite receiving the goods. Only the regional operations step reads it;
    /// when unset the creator worksite stands in.
    pub destination_worksite: Option<String>,
}

/// Edits a rejected proposal may carry back into the chain on resubmission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalUpdate {
    pub amount: Option<Decimal>,
    pub creator_department: Option<String>,
    pub creator_worksite: Option<String>,
    pub destination_worksite: Option<String>,
}

impl ProposalUpdate {
    pub fn apply_to(&self, fields: &RoutingFields) -> RoutingFields {
        RoutingFields {
            amount: self.amount.unwrap_or(fields.amount),
            creator_department: self
                .creator_department
                .clone()
                .unwrap_or_else(|| fields.creator_department.clone()),
            creator_worksite: self
                .creator_worksite
                .clone()
                .unwrap_or_else(|| fields.creator_worksite.clone()),
            destination_worksite: self
                .destination_worksite
                .clone()
                .or_else(|| fields.destination_worksite.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub routing: RoutingFields,
    /// Human-facing status token, refreshed by the owning service after each transition.
    pub status: String,
    pub history: Vec<HistoryEntry>,
    /// Optimistic-concurrency guard maintained by the repository.
    pub version: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Submitted,
    Pending,
    Approved,
    Rejected,
    Resubmitted,
}

impl HistoryAction {
    /// Markers open a new approval cycle; step counting restarts after them.
    pub fn opens_cycle(self) -> bool {
        matches!(self, Self::Submitted | Self::Resubmitted)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub stage: String,
    /// Empty while the step is unresolved.
    pub actor: String,
    pub role: Option<String>,
    pub action: HistoryAction,
    pub timestamp: Option<DateTime<Utc>>,
    pub comment: String,
}

impl HistoryEntry {
    pub fn created(actor: impl Into<String>, actor_role: impl Into<String>) -> Self {
        Self::marker("Created", HistoryAction::Created, actor, actor_role, "")
    }

    pub fn submitted(actor: impl Into<String>, actor_role: impl Into<String>) -> Self {
        Self::marker("Submitted", HistoryAction::Submitted, actor, actor_role, "")
    }

    pub fn resubmitted(
        actor: impl Into<String>,
        actor_role: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self::marker("Resubmitted", HistoryAction::Resubmitted, actor, actor_role, comment)
    }

    pub fn pending(step: &ApprovalStep) -> Self {
        Self {
            stage: step.stage_name.clone(),
            actor: String::new(),
            role: Some(step.role.0.clone()),
            action: HistoryAction::Pending,
            timestamp: None,
            comment: String::new(),
        }
    }

    pub fn decided(
        step: &ApprovalStep,
        action: HistoryAction,
        actor: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            stage: step.stage_name.clone(),
            actor: actor.into(),
            role: Some(step.role.0.clone()),
            action,
            timestamp: Some(Utc::now()),
            comment: comment.into(),
        }
    }

    fn marker(
        stage: &str,
        action: HistoryAction,
        actor: impl Into<String>,
        actor_role: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        let actor_role = actor_role.into();
        Self {
            stage: stage.to_owned(),
            actor: actor.into(),
            role: (!actor_role.trim().is_empty()).then_some(actor_role),
            action,
            timestamp: Some(Utc::now()),
            comment: comment.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{HistoryAction, HistoryEntry, ProposalUpdate, RoutingFields};

    fn fields() -> RoutingFields {
        RoutingFields {
            amount: Decimal::new(25_000_000, 0),
            creator_department: "finance".to_owned(),
            creator_worksite: "SERA".to_owned(),
            destination_worksite: Some("KAL-BPN".to_owned()),
        }
    }

    #[test]
    fn update_only_replaces_the_fields_it_carries() {
        let update = ProposalUpdate {
            amount: Some(Decimal::new(5_000_000, 0)),
            ..ProposalUpdate::default()
        };

        let updated = update.apply_to(&fields());
        assert_eq!(updated.amount, Decimal::new(5_000_000, 0));
        assert_eq!(updated.creator_department, "finance");
        assert_eq!(updated.destination_worksite.as_deref(), Some("KAL-BPN"));
    }

    #[test]
    fn marker_entries_drop_blank_roles() {
        let entry = HistoryEntry::created("u-101", "  ");
        assert_eq!(entry.action, HistoryAction::Created);
        assert!(entry.role.is_none());
        assert!(entry.timestamp.is_some());
        assert!(HistoryAction::Resubmitted.opens_cycle());
        assert!(!HistoryAction::Pending.opens_cycle());
    }
}
