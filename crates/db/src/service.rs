use std::sync::Arc;

use tracing::{info, warn};

use procura_core::approvals::ApprovalPathSource;
use procura_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use procura_core::domain::proposal::{Proposal, ProposalId, RoutingFields};
use procura_core::errors::ApplicationError;
use procura_core::flows::{
    current_step_index, workflow_state, DecisionRequest, InitializeRequest, ResubmitRequest,
    WorkflowEngine, WorkflowError, WorkflowState, WorkflowTransition,
};

use crate::repositories::{HistoryAppend, ProposalRepository, RepositoryError};

/// Runs the read-decide-append cycle for proposals held in a repository.
///
/// The engine decides on a snapshot; the repository's version guard makes the
/// append fail if anything else was appended since that snapshot was read.
pub struct ProposalWorkflowService<R, P> {
    repository: Arc<R>,
    engine: WorkflowEngine<P>,
    audit: Arc<dyn AuditSink>,
}

impl<R, P> ProposalWorkflowService<R, P>
where
    R: ProposalRepository,
    P: ApprovalPathSource,
{
    pub fn new(repository: Arc<R>, engine: WorkflowEngine<P>, audit: Arc<dyn AuditSink>) -> Self {
        Self { repository, engine, audit }
    }

    pub fn engine(&self) -> &WorkflowEngine<P> {
        &self.engine
    }

    pub async fn find(&self, id: &ProposalId) -> Result<Proposal, ApplicationError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(persistence_error)?
            .ok_or_else(|| ApplicationError::NotFound(id.0.clone()))
    }

    pub async fn create(
        &self,
        id: ProposalId,
        request: &InitializeRequest,
    ) -> Result<Proposal, ApplicationError> {
        let transition = self.engine.initialize(request)?;
        let proposal = Proposal {
            id,
            routing: request.routing.clone(),
            status: transition.status_token(),
            history: transition.entries,
            version: 0,
        };

        self.repository.insert(proposal.clone()).await.map_err(persistence_error)?;
        info!(
            event_name = "proposal.created",
            proposal_id = %proposal.id.0,
            status = %proposal.status,
            "proposal stored"
        );

        Ok(proposal)
    }

    pub async fn submit(
        &self,
        id: &ProposalId,
        actor: &str,
        actor_role: &str,
    ) -> Result<Proposal, ApplicationError> {
        let proposal = self.find(id).await?;
        let transition = self.engine.submit(&proposal, actor, actor_role)?;
        self.commit(&proposal, transition, None, None).await
    }

    pub async fn decide(
        &self,
        id: &ProposalId,
        request: &DecisionRequest,
        audit: &AuditContext,
    ) -> Result<Proposal, ApplicationError> {
        let proposal = self.find(id).await?;
        let result = match self.engine.advance(&proposal, request) {
            Ok(transition) => {
                self.commit(&proposal, transition, None, Some(request.expected_step_index)).await
            }
            Err(error) => Err(error.into()),
        };
        self.record_decision(request, audit, &result);
        result
    }

    pub async fn resubmit(
        &self,
        id: &ProposalId,
        request: &ResubmitRequest,
    ) -> Result<Proposal, ApplicationError> {
        let proposal = self.find(id).await?;
        let resubmission = self.engine.resubmit(&proposal, request)?;
        self.commit(&proposal, resubmission.transition, Some(resubmission.routing), None).await
    }

    pub async fn status_token(&self, id: &ProposalId) -> Result<String, ApplicationError> {
        let proposal = self.find(id).await?;
        Ok(self.engine.current_status_token(&proposal))
    }

    pub async fn is_complete(&self, id: &ProposalId) -> Result<bool, ApplicationError> {
        let proposal = self.find(id).await?;
        Ok(self.engine.is_complete(&proposal))
    }

    async fn commit(
        &self,
        snapshot: &Proposal,
        transition: WorkflowTransition,
        routing: Option<RoutingFields>,
        expected_step: Option<usize>,
    ) -> Result<Proposal, ApplicationError> {
        let append = HistoryAppend {
            status: transition.status_token(),
            entries: transition.entries,
            routing,
        };

        match self.repository.append_history(&snapshot.id, snapshot.version, append).await {
            Ok(updated) => Ok(updated),
            Err(RepositoryError::VersionConflict { expected, actual, .. }) => {
                warn!(
                    event_name = "persistence.version_conflict",
                    proposal_id = %snapshot.id.0,
                    expected,
                    actual,
                    "proposal changed between read and append"
                );
                let expected_step =
                    expected_step.unwrap_or_else(|| current_step_index(&snapshot.history));
                let current_step = self.pending_step(&snapshot.id).await?;
                Err(WorkflowError::StaleStepConflict { expected_step, current_step }.into())
            }
            Err(error) => Err(persistence_error(error)),
        }
    }

    /// Audits a decision once its outcome, append included, is final.
    fn record_decision(
        &self,
        request: &DecisionRequest,
        audit: &AuditContext,
        result: &Result<Proposal, ApplicationError>,
    ) {
        let event = match result {
            Ok(updated) => AuditEvent::new(
                audit,
                "workflow.decision_applied",
                AuditCategory::Workflow,
                AuditOutcome::Success,
            )
            .with_metadata("decision", format!("{:?}", request.decision))
            .with_metadata("step_index", request.expected_step_index.to_string())
            .with_metadata("status", updated.status.clone()),
            Err(ApplicationError::Workflow(error)) => AuditEvent::new(
                audit,
                "workflow.decision_rejected",
                AuditCategory::Workflow,
                AuditOutcome::Rejected,
            )
            .with_metadata("error", error.to_string()),
            Err(error) => AuditEvent::new(
                audit,
                "persistence.decision_failed",
                AuditCategory::Persistence,
                AuditOutcome::Failed,
            )
            .with_metadata("error", error.to_string()),
        };
        self.audit.emit(event);
    }

    async fn pending_step(&self, id: &ProposalId) -> Result<Option<usize>, ApplicationError> {
        let latest = self.find(id).await?;
        Ok(match workflow_state(&latest.history) {
            WorkflowState::Pending { step_index, .. } => Some(step_index),
            _ => None,
        })
    }
}

fn persistence_error(error: RepositoryError) -> ApplicationError {
    match error {
        RepositoryError::NotFound(id) => ApplicationError::NotFound(id),
        other => ApplicationError::Persistence(other.to_string()),
    }
}
