use async_trait::async_trait;
use thiserror::Error;

use procura_core::domain::proposal::{HistoryEntry, Proposal, ProposalId, RoutingFields};

pub mod memory;

pub use memory::InMemoryProposalRepository;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("proposal `{0}` was not found")]
    NotFound(String),
    #[error("proposal `{0}` already exists")]
    Duplicate(String),
    #[error("proposal `{id}` is at version {actual}, expected {expected}")]
    VersionConflict { id: String, expected: u64, actual: u64 },
}

/// One atomic write against a proposal: history entries to append, the new
/// status token, and replacement routing fields when a resubmission edited them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryAppend {
    pub entries: Vec<HistoryEntry>,
    pub status: String,
    pub routing: Option<RoutingFields>,
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProposalId) -> Result<Option<Proposal>, RepositoryError>;

    async fn insert(&self, proposal: Proposal) -> Result<(), RepositoryError>;

    /// Applies `append` only if the stored proposal is still at
    /// `expected_version`, bumping the version by one. Existing history is
    /// never rewritten.
    async fn append_history(
        &self,
        id: &ProposalId,
        expected_version: u64,
        append: HistoryAppend,
    ) -> Result<Proposal, RepositoryError>;
}
