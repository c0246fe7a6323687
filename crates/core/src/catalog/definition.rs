use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AmountRange, CatalogError, MatrixCatalog, PathTemplateCatalog};
use crate::approvals::{ApprovalRouter, RegionAuthority, RegionalEntityMap, RoleResolver};
use crate::domain::role::RoleCode;

const NO_REGION: &str = "none";

/// Static reference data the engine needs at startup, as loaded from TOML.
///
/// ```toml
/// departments = ["finance", "operations"]
/// worksites = ["SERA", "HO"]
///
/// [[ranges]]
/// code = "R1"
/// min = 0
/// max = 10000000
///
/// [[ranges]]
/// code = "R2"
/// min = 10000000
///
/// [templates]
/// R1 = ["unit_head", "section_head"]
/// R2 = ["unit_head", "section_head", "regional_operations_approval"]
///
/// [regions]
/// SERA = "SERA"
/// HO = "none"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub departments: Vec<String>,
    pub worksites: Vec<String>,
    pub ranges: Vec<AmountRange>,
    #[serde(default)]
    pub templates: BTreeMap<String, Vec<RoleCode>>,
    /// Worksite-name prefix -> region identifier, or `"none"` for worksites
    /// without a regional operations authority.
    #[serde(default)]
    pub regions: BTreeMap<String, String>,
    #[serde(default = "default_sourcing_template")]
    pub sourcing: Vec<RoleCode>,
}

impl CatalogDefinition {
    pub fn from_toml_str(raw: &str, origin: &str) -> Result<Self, CatalogError> {
        toml::from_str(raw).map_err(|error| CatalogError::ParseDefinition {
            path: origin.to_owned(),
            message: error.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|error| CatalogError::ReadDefinition {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;
        Self::from_toml_str(&raw, &path.display().to_string())
    }

    pub fn regional_map(&self) -> Result<RegionalEntityMap, CatalogError> {
        let mut entries = Vec::with_capacity(self.regions.len());
        for (prefix, region) in &self.regions {
            if prefix.trim().is_empty() {
                return Err(CatalogError::InvalidRegionPrefix(prefix.clone()));
            }
            let region = region.trim();
            let authority = if region.is_empty() || region.eq_ignore_ascii_case(NO_REGION) {
                RegionAuthority::NoAuthority
            } else {
                RegionAuthority::Region(region.to_owned())
            };
            entries.push((prefix.clone(), authority));
        }
        Ok(RegionalEntityMap::new(entries))
    }

    pub fn build_matrix(&self) -> Result<MatrixCatalog, CatalogError> {
        MatrixCatalog::build(
            self.departments.clone(),
            self.worksites.clone(),
            self.ranges.clone(),
            PathTemplateCatalog::new(self.templates.clone()),
        )
    }

    /// Validates the definition and produces the immutable router used for every
    /// path computation afterwards.
    pub fn into_router(&self) -> Result<ApprovalRouter, CatalogError> {
        let matrix = self.build_matrix()?;
        let resolver = RoleResolver::new(self.regional_map()?);
        Ok(ApprovalRouter::new(matrix, resolver).with_sourcing_template(self.sourcing.clone()))
    }

    /// Reference data shipped with the engine: five departments, seven
    /// worksites, three regional authorities and six amount ranges (IDR).
    pub fn builtin() -> Self {
        use RoleCode::*;

        let idr = |value: i64| Decimal::new(value, 0);
        let four_step = vec![UnitHead, SectionHead, DepartmentHead, Manager];

        let mut templates = BTreeMap::new();
        templates.insert("R1".to_owned(), vec![UnitHead, SectionHead]);
        templates.insert("R2".to_owned(), vec![UnitHead, SectionHead, DepartmentHead]);
        templates.insert("R3".to_owned(), four_step.clone());
        templates.insert("R3G".to_owned(), four_step);
        templates.insert(
            "R4".to_owned(),
            vec![
                UnitHead,
                SectionHead,
                DepartmentHead,
                Manager,
                DivisionHead,
                RegionalOperationsApproval,
            ],
        );
        templates.insert(
            "R5".to_owned(),
            vec![
                UnitHead,
                SectionHead,
                DepartmentHead,
                Manager,
                DivisionHead,
                RegionalOperationsApproval,
                Director,
                TopExecutiveApproval,
            ],
        );

        let regions = [
            ("SERA", "SERA"),
            ("KAL", "KAL"),
            ("SUM", "SUM"),
            ("HO", NO_REGION),
            ("DC", NO_REGION),
        ]
        .into_iter()
        .map(|(prefix, region)| (prefix.to_owned(), region.to_owned()))
        .collect();

        Self {
            departments: ["finance", "operations", "engineering", "procurement", "hse"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            worksites: ["SERA", "SERA-BTM", "KAL-BPN", "KAL-SMD", "SUM-MDN", "HO", "DC"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            ranges: vec![
                AmountRange::new("R1", idr(0), Some(idr(10_000_000))),
                AmountRange::new("R2", idr(10_000_000), Some(idr(50_000_000))),
                AmountRange::new("R3", idr(50_000_000), Some(idr(100_000_000))),
                // Closes the hole that used to sit between R3 and R4.
                AmountRange::new("R3G", idr(100_000_000), Some(idr(150_000_000))),
                AmountRange::new("R4", idr(150_000_000), Some(idr(500_000_000))),
                AmountRange::new("R5", idr(500_000_000), None),
            ],
            templates,
            regions,
            sourcing: default_sourcing_template(),
        }
    }
}

fn default_sourcing_template() -> Vec<RoleCode> {
    vec![RoleCode::SourcingOfficer, RoleCode::SourcingLead]
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::CatalogDefinition;
    use crate::catalog::CatalogError;
    use crate::domain::role::RoleCode;

    const SMALL_DEFINITION: &str = r#"
departments = ["finance"]
worksites = ["SERA", "HO"]

[[ranges]]
code = "R1"
min = 0
max = 1000

[[ranges]]
code = "R2"
min = 1000

[templates]
R1 = ["unit_head"]
R2 = ["unit_head", "regional_operations_approval"]

[regions]
SERA = "SERA"
HO = "none"
"#;

    #[test]
    fn toml_definition_parses_ranges_templates_and_regions() {
        let definition =
            CatalogDefinition::from_toml_str(SMALL_DEFINITION, "inline").expect("valid toml");

        assert_eq!(definition.ranges.len(), 2);
        assert_eq!(definition.ranges[0].max, Some(Decimal::new(1000, 0)));
        assert!(definition.ranges[1].max.is_none());
        assert_eq!(
            definition.templates.get("R2"),
            Some(&vec![RoleCode::UnitHead, RoleCode::RegionalOperationsApproval])
        );
        assert_eq!(definition.sourcing, vec![RoleCode::SourcingOfficer, RoleCode::SourcingLead]);

        let regions = definition.regional_map().expect("regional map");
        assert_eq!(regions.region_for("SERA"), Some("SERA"));
        assert_eq!(regions.region_for("HO"), None);
    }

    #[test]
    fn toml_definition_with_gap_fails_at_startup() {
        let gapped = SMALL_DEFINITION.replace("min = 1000\n", "min = 1001\n");
        let definition = CatalogDefinition::from_toml_str(&gapped, "inline").expect("valid toml");

        let error = definition.into_router().expect_err("gap must fail");
        assert!(matches!(error, CatalogError::Gap { .. }));
    }

    #[test]
    fn unknown_role_codes_are_parse_errors() {
        let broken = SMALL_DEFINITION.replace("\"unit_head\"]", "\"chief_of_staff\"]");
        let error = CatalogDefinition::from_toml_str(&broken, "inline").expect_err("bad role");
        assert!(matches!(
            error,
            CatalogError::ParseDefinition { ref path, .. } if path == "inline"
        ));
    }

    #[test]
    fn builtin_definition_builds() {
        let router = CatalogDefinition::builtin().into_router().expect("builtin is valid");
        assert_eq!(router.catalog().worksites().len(), 7);
        assert_eq!(router.catalog().ranges().len(), 6);
    }
}
