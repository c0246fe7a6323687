//! Build-once approval matrix: amount ranges, path templates and the
//! (department x worksite x range) cross product they expand into.

pub mod definition;
pub mod matrix;
pub mod range;

use rust_decimal::Decimal;
use thiserror::Error;

pub use definition::CatalogDefinition;
pub use matrix::{build_catalog, MatrixCatalog, MatrixEntry, PathTemplateCatalog, TemplateStep};
pub use range::{validate_coverage, AmountRange};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog defines no departments")]
    NoDepartments,
    #[error("catalog defines no worksites")]
    NoWorksites,
    #[error("duplicate department `{0}`")]
    DuplicateDepartment(String),
    #[error("duplicate worksite `{0}`")]
    DuplicateWorksite(String),
    #[error("catalog defines no amount ranges")]
    NoRanges,
    #[error("duplicate amount range code `{0}`")]
    DuplicateRangeCode(String),
    #[error("amount ranges must start at 0 but `{code}` starts at {min}")]
    DoesNotStartAtZero { code: String, min: Decimal },
    #[error("amount range `{code}` has max {max} not above its min {min}")]
    InvertedRange { code: String, min: Decimal, max: Decimal },
    #[error("amounts in [{from}, {to}) fall between `{after}` and `{before}`")]
    Gap { after: String, before: String, from: Decimal, to: Decimal },
    #[error("amount ranges `{first}` and `{second}` overlap in [{from}, {to})")]
    Overlap { first: String, second: String, from: Decimal, to: Decimal },
    #[error("amount range `{code}` is unbounded but is followed by `{next}`")]
    UnboundedBeforeEnd { code: String, next: String },
    #[error("top amount range `{code}` must be unbounded but ends at {max}")]
    BoundedTail { code: String, max: Decimal },
    #[error("amount range `{0}` has no approval path template")]
    MissingTemplate(String),
    #[error("approval path template for range `{0}` is empty")]
    EmptyTemplate(String),
    #[error("approval path template `{template}` names sourcing-only role `{role}`")]
    SourcingRoleInTemplate { template: String, role: String },
    #[error("approval path template `{0}` has no matching amount range")]
    OrphanTemplate(String),
    #[error("invalid regional prefix `{0}`")]
    InvalidRegionPrefix(String),
    #[error("could not read catalog definition `{path}`: {message}")]
    ReadDefinition { path: String, message: String },
    #[error("could not parse catalog definition `{path}`: {message}")]
    ParseDefinition { path: String, message: String },
}

pub(crate) fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
