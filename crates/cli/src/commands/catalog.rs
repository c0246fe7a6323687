use procura_core::approvals::{ApprovalRouter, ApprovalStep};
use procura_core::domain::role::RoleCode;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{load_router, CommandResult};

const COMMAND: &str = "catalog";

#[derive(Debug, Serialize)]
struct RangeSummary {
    code: String,
    min: Decimal,
    max: Option<Decimal>,
    template: Vec<RoleCode>,
}

#[derive(Debug, Serialize)]
struct CatalogSummary {
    command: &'static str,
    status: &'static str,
    departments: Vec<String>,
    worksites: Vec<String>,
    ranges: Vec<RangeSummary>,
    matrix_entries: usize,
    regional_prefixes: usize,
    sourcing_path: Vec<ApprovalStep>,
}

pub fn run() -> CommandResult {
    match load_router(COMMAND) {
        Ok(router) => CommandResult::report(COMMAND, &summarize(&router)),
        Err(failure) => failure,
    }
}

fn summarize(router: &ApprovalRouter) -> CatalogSummary {
    let catalog = router.catalog();
    let ranges = catalog
        .ranges()
        .iter()
        .map(|range| RangeSummary {
            code: range.code.clone(),
            min: range.min,
            max: range.max,
            template: catalog
                .templates()
                .get(&range.code)
                .map(<[RoleCode]>::to_vec)
                .unwrap_or_default(),
        })
        .collect();

    CatalogSummary {
        command: COMMAND,
        status: "ok",
        departments: catalog.departments().to_vec(),
        worksites: catalog.worksites().to_vec(),
        ranges,
        matrix_entries: catalog.entries().len(),
        regional_prefixes: router.resolver().regions().len(),
        sourcing_path: router.resolve_sourcing_path(),
    }
}
