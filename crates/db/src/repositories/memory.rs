use std::collections::HashMap;

use tokio::sync::RwLock;

use procura_core::domain::proposal::{Proposal, ProposalId};

use super::{HistoryAppend, ProposalRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryProposalRepository {
    proposals: RwLock<HashMap<String, Proposal>>,
}

#[async_trait::async_trait]
impl ProposalRepository for InMemoryProposalRepository {
    async fn find_by_id(&self, id: &ProposalId) -> Result<Option<Proposal>, RepositoryError> {
        let proposals = self.proposals.read().await;
        Ok(proposals.get(&id.0).cloned())
    }

    async fn insert(&self, proposal: Proposal) -> Result<(), RepositoryError> {
        let mut proposals = self.proposals.write().await;
        if proposals.contains_key(&proposal.id.0) {
            return Err(RepositoryError::Duplicate(proposal.id.0));
        }
        proposals.insert(proposal.id.0.clone(), proposal);
        Ok(())
    }

    async fn append_history(
        &self,
        id: &ProposalId,
        expected_version: u64,
        append: HistoryAppend,
    ) -> Result<Proposal, RepositoryError> {
        // The write guard spans the version check and the append.
        let mut proposals = self.proposals.write().await;
        let proposal =
            proposals.get_mut(&id.0).ok_or_else(|| RepositoryError::NotFound(id.0.clone()))?;

        if proposal.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                id: id.0.clone(),
                expected: expected_version,
                actual: proposal.version,
            });
        }

        if let Some(routing) = append.routing {
            proposal.routing = routing;
        }
        proposal.history.extend(append.entries);
        proposal.status = append.status;
        proposal.version += 1;

        Ok(proposal.clone())
    }
}
