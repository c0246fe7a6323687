use std::str::FromStr;

use clap::Args;
use procura_core::approvals::{ApprovalStep, RoutingError};
use procura_core::flows::{status_token_for_stage, FALLBACK_STATUS_TOKEN};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{load_router, CommandResult, EXIT_CONFIG, EXIT_ROUTING};

const COMMAND: &str = "route";

#[derive(Debug, Clone, Args)]
pub struct RouteArgs {
    #[arg(long, help = "Proposal amount in IDR (non-negative decimal)")]
    pub amount: String,
    #[arg(long, help = "Creator department")]
    pub department: String,
    #[arg(long, help = "Creator worksite")]
    pub worksite: String,
    #[arg(long, help = "Destination worksite for the regional operations step")]
    pub destination: Option<String>,
}

#[derive(Debug, Serialize)]
struct RouteStep {
    #[serde(flatten)]
    step: ApprovalStep,
    status_token: &'static str,
}

#[derive(Debug, Serialize)]
struct RouteReport {
    command: &'static str,
    status: &'static str,
    entry_id: String,
    range_code: String,
    steps: Vec<RouteStep>,
}

pub fn run(args: &RouteArgs) -> CommandResult {
    let amount = match parse_amount(&args.amount) {
        Ok(amount) => amount,
        Err(message) => {
            return CommandResult::failure(COMMAND, "invalid_amount", message, EXIT_CONFIG)
        }
    };

    let router = match load_router(COMMAND) {
        Ok(router) => router,
        Err(failure) => return failure,
    };

    match router.resolve_approval_path(
        amount,
        &args.department,
        &args.worksite,
        args.destination.as_deref(),
    ) {
        Ok(path) => {
            let report = RouteReport {
                command: COMMAND,
                status: "ok",
                entry_id: path.entry_id,
                range_code: path.range_code,
                steps: path
                    .steps
                    .into_iter()
                    .map(|step| RouteStep {
                        status_token: status_token_for_stage(&step.stage_name)
                            .unwrap_or(FALLBACK_STATUS_TOKEN),
                        step,
                    })
                    .collect(),
            };
            CommandResult::report(COMMAND, &report)
        }
        Err(error @ RoutingError::NoMatch { .. }) => {
            CommandResult::failure(COMMAND, "no_match", error.to_string(), EXIT_ROUTING)
        }
    }
}

fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| format!("amount `{raw}` is not a decimal number"))?;
    if amount < Decimal::ZERO {
        return Err(format!("amount `{raw}` must not be negative"));
    }
    Ok(amount)
}
