use std::collections::BTreeMap;

use procura_core::approvals::ApprovalRouter;
use procura_core::catalog::CatalogDefinition;
use procura_core::config::{AppConfig, LoadOptions};
use procura_core::domain::role::RoleCode;
use serde::Serialize;

use super::{CommandResult, EXIT_CATALOG, EXIT_CONFIG};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = exit_code_for(&report);

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_owned(),
            });
            checks.extend(catalog_checks(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_coverage", "template_determinism", "regional_authority"] {
                checks.push(skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all catalog checks passed".to_owned()
    } else {
        "doctor: one or more catalog checks failed".to_owned()
    };

    DoctorReport { overall_status, summary, checks }
}

fn catalog_checks(config: &AppConfig) -> Vec<DoctorCheck> {
    let source = match &config.catalog.definition_path {
        Some(path) => format!("`{}`", path.display()),
        None => "built-in catalog".to_owned(),
    };

    let router = config
        .catalog_definition()
        .map_err(|error| error.to_string())
        .and_then(|definition| match definition.into_router() {
            Ok(router) => Ok((definition, router)),
            Err(error) => Err(error.to_string()),
        });

    match router {
        Ok((definition, router)) => vec![
            DoctorCheck {
                name: "catalog_coverage",
                status: CheckStatus::Pass,
                details: format!(
                    "{source}: {} ranges cover [0, inf) for {} matrix entries",
                    router.catalog().ranges().len(),
                    router.catalog().entries().len()
                ),
            },
            check_template_determinism(&router),
            check_regional_authority(&definition, &router),
        ],
        Err(error) => vec![
            DoctorCheck {
                name: "catalog_coverage",
                status: CheckStatus::Fail,
                details: format!("{source}: {error}"),
            },
            skipped("template_determinism", "catalog did not build"),
            skipped("regional_authority", "catalog did not build"),
        ],
    }
}

/// Every entry of a range must carry that range's template, whatever its
/// department and worksite.
fn check_template_determinism(router: &ApprovalRouter) -> DoctorCheck {
    let mut sequences: BTreeMap<&str, Vec<RoleCode>> = BTreeMap::new();
    let mut drifted = Vec::new();

    for entry in router.catalog().entries() {
        let codes = entry.role_codes();
        match sequences.get(entry.range.code.as_str()) {
            Some(expected) if *expected != codes => drifted.push(entry.id.clone()),
            Some(_) => {}
            None => {
                sequences.insert(entry.range.code.as_str(), codes);
            }
        }
    }

    let shared = count_shared_templates(&sequences);
    if drifted.is_empty() {
        DoctorCheck {
            name: "template_determinism",
            status: CheckStatus::Pass,
            details: format!(
                "{} ranges resolve deterministically ({shared} share a template)",
                sequences.len()
            ),
        }
    } else {
        DoctorCheck {
            name: "template_determinism",
            status: CheckStatus::Fail,
            details: format!("entries diverge from their range template: {}", drifted.join(", ")),
        }
    }
}

fn count_shared_templates(sequences: &BTreeMap<&str, Vec<RoleCode>>) -> usize {
    sequences
        .iter()
        .filter(|(code, codes)| {
            sequences.iter().any(|(other, other_codes)| other != *code && other_codes == *codes)
        })
        .count()
}

fn check_regional_authority(
    definition: &CatalogDefinition,
    router: &ApprovalRouter,
) -> DoctorCheck {
    let regions = router.resolver().regions();
    let (covered, without): (Vec<&String>, Vec<&String>) = definition
        .worksites
        .iter()
        .partition(|worksite| regions.region_for(worksite).is_some());

    let details = if without.is_empty() {
        format!("all {} worksites map to a regional authority", covered.len())
    } else {
        let names: Vec<&str> = without.iter().map(|worksite| worksite.as_str()).collect();
        format!(
            "{} worksites map to a regional authority; regional step skipped for: {}",
            covered.len(),
            names.join(", ")
        )
    };

    DoctorCheck { name: "regional_authority", status: CheckStatus::Pass, details }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn exit_code_for(report: &DoctorReport) -> u8 {
    let failed = |name: &str| {
        report.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
    };

    if failed("config_validation") {
        EXIT_CONFIG
    } else if report.overall_status == CheckStatus::Fail {
        EXIT_CATALOG
    } else {
        0
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
