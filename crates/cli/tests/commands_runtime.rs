use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use procura_cli::commands::route::RouteArgs;
use procura_cli::commands::{catalog, config, doctor, route};
use serde_json::Value;
use tempfile::TempDir;

fn route_args(
    amount: &str,
    department: &str,
    worksite: &str,
    destination: Option<&str>,
) -> RouteArgs {
    RouteArgs {
        amount: amount.to_owned(),
        department: department.to_owned(),
        worksite: worksite.to_owned(),
        destination: destination.map(str::to_owned),
    }
}

fn roles(payload: &Value) -> Vec<String> {
    payload["steps"]
        .as_array()
        .map(|steps| {
            steps.iter().filter_map(|step| step["role"].as_str().map(str::to_owned)).collect()
        })
        .unwrap_or_default()
}

#[test]
fn route_returns_two_step_path_for_lowest_range() {
    with_env(&[], || {
        let result = route::run(&route_args("2500000", "finance", "SERA", None));
        assert_eq!(result.exit_code, 0, "expected successful route");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "route");
        assert_eq!(payload["range_code"], "R1");
        assert_eq!(roles(&payload), vec!["unit_head:finance:sera", "section_head:finance:sera"]);
        assert_eq!(payload["steps"][0]["stage_name"], "Unit Head Approval");
        assert_eq!(payload["steps"][0]["status_token"], "WAITING_UNIT_HEAD");
        assert_eq!(payload["steps"][1]["step_number"], 2);
    });
}

#[test]
fn route_uses_destination_region_for_regional_step() {
    with_env(&[], || {
        let result = route::run(&route_args("250000000", "operations", "SERA", Some("KAL-BPN")));
        assert_eq!(result.exit_code, 0, "expected successful route");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["range_code"], "R4");
        let roles = roles(&payload);
        assert_eq!(roles.len(), 6);
        assert_eq!(roles[0], "unit_head:operations:sera");
        assert_eq!(roles[3], "manager:sera");
        assert_eq!(roles[5], "regional_operations_approval:kal");
    });
}

#[test]
fn route_skips_regional_step_for_head_office_destination() {
    with_env(&[], || {
        let result = route::run(&route_args("750000000", "hse", "KAL-SMD", Some("HO")));
        assert_eq!(result.exit_code, 0, "expected successful route");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["range_code"], "R5");
        let roles = roles(&payload);
        assert_eq!(roles.len(), 7);
        assert!(roles.iter().all(|role| !role.starts_with("regional_operations_approval")));

        let step_numbers: Vec<u64> = payload["steps"]
            .as_array()
            .map(|steps| steps.iter().filter_map(|step| step["step_number"].as_u64()).collect())
            .unwrap_or_default();
        assert_eq!(step_numbers, vec![1, 2, 3, 4, 5, 7, 8]);
    });
}

#[test]
fn route_treats_range_boundary_as_half_open() {
    with_env(&[], || {
        let below = parse_payload(&route::run(&route_args("9999999.99", "hse", "DC", None)).output);
        let at = parse_payload(&route::run(&route_args("10000000", "hse", "DC", None)).output);

        assert_eq!(below["range_code"], "R1");
        assert_eq!(at["range_code"], "R2");
    });
}

#[test]
fn route_reports_no_match_for_unknown_department() {
    with_env(&[], || {
        let result = route::run(&route_args("1000", "legal", "SERA", None));
        assert_eq!(result.exit_code, 4, "expected routing failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "route");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "no_match");
    });
}

#[test]
fn route_rejects_negative_and_non_numeric_amounts() {
    with_env(&[], || {
        for amount in ["-1", "ten million"] {
            let result = route::run(&route_args(amount, "finance", "SERA", None));
            assert_eq!(result.exit_code, 2, "expected input validation failure for {amount}");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "invalid_amount");
        }
    });
}

#[test]
fn catalog_summarizes_builtin_definition() {
    with_env(&[], || {
        let result = catalog::run();
        assert_eq!(result.exit_code, 0, "expected catalog summary");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "catalog");
        assert_eq!(payload["matrix_entries"], 5 * 7 * 6);
        assert_eq!(payload["ranges"][3]["code"], "R3G");
        assert_eq!(payload["ranges"][3]["template"], payload["ranges"][2]["template"]);
        assert!(payload["ranges"][5]["max"].is_null());
        assert_eq!(payload["sourcing_path"][0]["role"], "sourcing_officer");
    });
}

#[test]
fn catalog_fails_fast_on_gapped_definition() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("catalog.toml");
    fs::write(
        &path,
        r#"
departments = ["finance"]
worksites = ["SERA"]

[[ranges]]
code = "R1"
min = 0
max = 1000

[[ranges]]
code = "R2"
min = 2000

[templates]
R1 = ["unit_head"]
R2 = ["unit_head", "section_head"]
"#,
    )
    .expect("write catalog");
    let path = path.display().to_string();

    with_env(&[("PROCURA_CATALOG_DEFINITION_PATH", path.as_str())], || {
        let result = catalog::run();
        assert_eq!(result.exit_code, 3, "expected catalog failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "catalog_validation");
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("R1"), "gap message should name the ranges: {message}");

        let doctor = parse_payload(&doctor::run(true).output);
        assert_eq!(doctor["overall_status"], "fail");
        assert_eq!(doctor["checks"][1]["name"], "catalog_coverage");
        assert_eq!(doctor["checks"][1]["status"], "fail");
        assert_eq!(doctor["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_json_passes_with_builtin_catalog() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected passing doctor run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        let names: Vec<&str> = payload["checks"]
            .as_array()
            .map(|checks| checks.iter().filter_map(|check| check["name"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(
            names,
            vec![
                "config_validation",
                "catalog_coverage",
                "template_determinism",
                "regional_authority"
            ]
        );
        let regional = payload["checks"][3]["details"].as_str().unwrap_or("");
        assert!(regional.contains("HO, DC"), "head office sites lack regional authority");
    });
}

#[test]
fn doctor_reports_config_failure() {
    with_env(&[("PROCURA_LOG_LEVEL", "loud")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 2, "expected config failure code");
        assert!(result.output.contains("[fail] config_validation"));
        assert!(result.output.contains("[skip] catalog_coverage"));
    });
}

#[test]
fn config_attributes_values_to_their_source() {
    with_env(&[("PROCURA_LOG_FORMAT", "json")], || {
        let output = config::run();

        assert!(output.contains("- catalog.definition_path = <built-in> (source: default)"));
        assert!(output.contains("- logging.level = info (source: default)"));
        assert!(output.contains("- logging.format = Json (source: env (PROCURA_LOG_FORMAT))"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PROCURA_CATALOG_DEFINITION_PATH",
        "PROCURA_LOGGING_LEVEL",
        "PROCURA_LOGGING_FORMAT",
        "PROCURA_LOG_LEVEL",
        "PROCURA_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
