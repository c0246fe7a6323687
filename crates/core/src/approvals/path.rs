use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::resolver::{ResolvedRole, RoleResolver, RoutingContext};
use super::RoutingError;
use crate::catalog::MatrixCatalog;
use crate::domain::proposal::RoutingFields;
use crate::domain::role::{RoleCode, RoleIdentifier};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Template step number. Not renumbered when inapplicable steps are dropped.
    pub step_number: u32,
    pub stage_name: String,
    pub role_code: RoleCode,
    pub role: RoleIdentifier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPath {
    pub entry_id: String,
    pub range_code: String,
    pub steps: Vec<ApprovalStep>,
}

impl ApprovalPath {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&ApprovalStep> {
        self.steps.get(index)
    }

    pub fn role_codes(&self) -> Vec<RoleCode> {
        self.steps.iter().map(|step| step.role_code).collect()
    }
}

/// Source of freshly computed approval paths. The workflow engine only depends
/// on this seam so it never holds on to a path between calls.
pub trait ApprovalPathSource {
    fn resolve_path(&self, fields: &RoutingFields) -> Result<ApprovalPath, RoutingError>;
}

#[derive(Clone, Debug)]
pub struct ApprovalRouter {
    catalog: MatrixCatalog,
    resolver: RoleResolver,
    sourcing: Vec<RoleCode>,
}

impl ApprovalRouter {
    pub fn new(catalog: MatrixCatalog, resolver: RoleResolver) -> Self {
        Self {
            catalog,
            resolver,
            sourcing: vec![RoleCode::SourcingOfficer, RoleCode::SourcingLead],
        }
    }

    pub fn with_sourcing_template(mut self, sourcing: Vec<RoleCode>) -> Self {
        self.sourcing = sourcing;
        self
    }

    pub fn catalog(&self) -> &MatrixCatalog {
        &self.catalog
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    /// Ordered, resolved approval chain for a proposal.
    ///
    /// Every step resolves against the creator's department and worksite except
    /// the regional operations step, which resolves against the destination
    /// worksite (falling back to the creator worksite when none is given). Steps
    /// resolving to "not applicable" are dropped; the rest keep template order.
    pub fn resolve_approval_path(
        &self,
        amount: Decimal,
        creator_department: &str,
        creator_worksite: &str,
        destination_worksite: Option<&str>,
    ) -> Result<ApprovalPath, RoutingError> {
        let Some(entry) = self.catalog.lookup(amount, creator_department, creator_worksite) else {
            warn!(
                event_name = "routing.no_match",
                department = creator_department,
                worksite = creator_worksite,
                amount = %amount,
                "no approval matrix entry matches proposal"
            );
            return Err(RoutingError::NoMatch {
                department: creator_department.to_owned(),
                worksite: creator_worksite.to_owned(),
                amount,
            });
        };

        let context = RoutingContext {
            department: creator_department,
            origin_worksite: creator_worksite,
            destination_worksite: destination_worksite.unwrap_or(creator_worksite),
        };

        let steps: Vec<ApprovalStep> = entry
            .steps
            .iter()
            .filter_map(|step| match self.resolver.resolve(step.role_code, &context) {
                ResolvedRole::Role(role) => Some(ApprovalStep {
                    step_number: step.step_number,
                    stage_name: step.step_name.clone(),
                    role_code: step.role_code,
                    role,
                }),
                ResolvedRole::NotApplicable => None,
            })
            .collect();

        debug!(
            event_name = "routing.path_resolved",
            entry_id = %entry.id,
            range_code = %entry.range.code,
            template_steps = entry.steps.len(),
            resolved_steps = steps.len(),
            "approval path resolved"
        );

        Ok(ApprovalPath {
            entry_id: entry.id.clone(),
            range_code: entry.range.code.clone(),
            steps,
        })
    }

    /// Fixed review chain for the sourcing sub-flow. Its roles are global, so
    /// it does not depend on amount or origin.
    pub fn resolve_sourcing_path(&self) -> Vec<ApprovalStep> {
        let context =
            RoutingContext { department: "", origin_worksite: "", destination_worksite: "" };
        self.sourcing
            .iter()
            .zip(1_u32..)
            .filter_map(|(role_code, step_number)| {
                match self.resolver.resolve(*role_code, &context) {
                    ResolvedRole::Role(role) => Some(ApprovalStep {
                        step_number,
                        stage_name: role_code.stage_name().to_owned(),
                        role_code: *role_code,
                        role,
                    }),
                    ResolvedRole::NotApplicable => None,
                }
            })
            .collect()
    }
}

impl ApprovalPathSource for ApprovalRouter {
    fn resolve_path(&self, fields: &RoutingFields) -> Result<ApprovalPath, RoutingError> {
        self.resolve_approval_path(
            fields.amount,
            &fields.creator_department,
            &fields.creator_worksite,
            fields.destination_worksite.as_deref(),
        )
    }
}
