pub mod path;
pub mod resolver;

use rust_decimal::Decimal;
use thiserror::Error;

pub use path::{ApprovalPath, ApprovalPathSource, ApprovalRouter, ApprovalStep};
pub use resolver::{
    RegionAuthority, RegionalEntityMap, ResolvedRole, RoleResolver, RoutingContext,
};

/// Raised when no matrix entry covers a proposal. Negative amounts that slip past
/// caller validation land here too.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error(
        "no approval matrix entry for department `{department}`, worksite `{worksite}` and amount {amount}"
    )]
    NoMatch { department: String, worksite: String, amount: Decimal },
}
