pub mod repositories;
pub mod service;

pub use repositories::{
    HistoryAppend, InMemoryProposalRepository, ProposalRepository, RepositoryError,
};
pub use service::ProposalWorkflowService;
