pub mod approvals;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;

pub use approvals::{
    ApprovalPath, ApprovalPathSource, ApprovalRouter, ApprovalStep, RegionalEntityMap,
    RoleResolver, RoutingError,
};
pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink};
pub use catalog::{AmountRange, CatalogDefinition, CatalogError, MatrixCatalog, MatrixEntry};
pub use domain::proposal::{
    HistoryAction, HistoryEntry, Proposal, ProposalId, ProposalUpdate, RoutingFields,
};
pub use domain::role::{RoleCode, RoleIdentifier, RoleScope};
pub use errors::{ApplicationError, InterfaceError};
pub use flows::{
    Decision, DecisionRequest, InitializeRequest, ResubmitRequest, WorkflowEngine, WorkflowError,
    WorkflowState, WorkflowTransition,
};
