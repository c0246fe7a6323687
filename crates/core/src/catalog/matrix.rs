use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::range::{validate_coverage, AmountRange};
use super::{normalize_key, CatalogError};
use crate::domain::role::RoleCode;

/// Range code -> canonical role sequence. Distinct ranges may share a sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTemplateCatalog {
    templates: BTreeMap<String, Vec<RoleCode>>,
}

impl PathTemplateCatalog {
    pub fn new(templates: BTreeMap<String, Vec<RoleCode>>) -> Self {
        let templates =
            templates.into_iter().map(|(code, roles)| (normalize_key(&code), roles)).collect();
        Self { templates }
    }

    pub fn get(&self, range_code: &str) -> Option<&[RoleCode]> {
        self.templates.get(&normalize_key(range_code)).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RoleCode])> {
        self.templates.iter().map(|(code, roles)| (code.as_str(), roles.as_slice()))
    }

    fn validate(&self, ranges: &[AmountRange]) -> Result<(), CatalogError> {
        for range in ranges {
            let Some(roles) = self.get(&range.code) else {
                return Err(CatalogError::MissingTemplate(range.code.clone()));
            };
            if roles.is_empty() {
                return Err(CatalogError::EmptyTemplate(range.code.clone()));
            }
            if let Some(role) = roles.iter().find(|role| role.is_sourcing_only()) {
                return Err(CatalogError::SourcingRoleInTemplate {
                    template: range.code.clone(),
                    role: role.to_string(),
                });
            }
        }

        let range_codes: HashSet<String> =
            ranges.iter().map(|range| normalize_key(&range.code)).collect();
        if let Some(orphan) = self.templates.keys().find(|code| !range_codes.contains(*code)) {
            return Err(CatalogError::OrphanTemplate(orphan.clone()));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateStep {
    pub step_number: u32,
    pub step_name: String,
    pub role_code: RoleCode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub id: String,
    pub department: String,
    pub worksite: String,
    pub range: AmountRange,
    pub steps: Vec<TemplateStep>,
}

impl MatrixEntry {
    pub fn role_codes(&self) -> Vec<RoleCode> {
        self.steps.iter().map(|step| step.role_code).collect()
    }
}

/// Expands every (department, worksite, range) combination into a matrix entry
/// carrying its range's template. Entry ids follow generation order.
pub fn build_catalog(
    departments: &[String],
    worksites: &[String],
    ranges: &[AmountRange],
    templates: &PathTemplateCatalog,
) -> Result<Vec<MatrixEntry>, CatalogError> {
    let mut sorted_ranges = ranges.to_vec();
    sorted_ranges.sort_by(|left, right| left.min.cmp(&right.min));

    let mut entries =
        Vec::with_capacity(departments.len() * worksites.len() * sorted_ranges.len());
    for department in departments {
        for worksite in worksites {
            for range in &sorted_ranges {
                let roles = templates
                    .get(&range.code)
                    .ok_or_else(|| CatalogError::MissingTemplate(range.code.clone()))?;
                let steps = roles
                    .iter()
                    .zip(1_u32..)
                    .map(|(role_code, step_number)| TemplateStep {
                        step_number,
                        step_name: role_code.stage_name().to_owned(),
                        role_code: *role_code,
                    })
                    .collect();

                entries.push(MatrixEntry {
                    id: format!("MX-{:05}", entries.len() + 1),
                    department: department.clone(),
                    worksite: worksite.clone(),
                    range: range.clone(),
                    steps,
                });
            }
        }
    }

    Ok(entries)
}

/// Validated, read-only matrix indexed by (department, worksite).
#[derive(Clone, Debug)]
pub struct MatrixCatalog {
    departments: Vec<String>,
    worksites: Vec<String>,
    ranges: Vec<AmountRange>,
    templates: PathTemplateCatalog,
    entries: Vec<MatrixEntry>,
    by_origin: HashMap<(String, String), Vec<usize>>,
}

impl MatrixCatalog {
    /// Runs the startup invariant checks and generates the matrix. Fails on any
    /// coverage gap or overlap rather than letting amounts fall through at lookup.
    pub fn build(
        departments: Vec<String>,
        worksites: Vec<String>,
        ranges: Vec<AmountRange>,
        templates: PathTemplateCatalog,
    ) -> Result<Self, CatalogError> {
        if departments.is_empty() {
            return Err(CatalogError::NoDepartments);
        }
        if worksites.is_empty() {
            return Err(CatalogError::NoWorksites);
        }
        if let Some(duplicate) = first_duplicate(&departments) {
            return Err(CatalogError::DuplicateDepartment(duplicate));
        }
        if let Some(duplicate) = first_duplicate(&worksites) {
            return Err(CatalogError::DuplicateWorksite(duplicate));
        }

        validate_coverage(&ranges)?;
        templates.validate(&ranges)?;

        let entries = build_catalog(&departments, &worksites, &ranges, &templates)?;
        let mut by_origin: HashMap<(String, String), Vec<usize>> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_origin
                .entry((normalize_key(&entry.department), normalize_key(&entry.worksite)))
                .or_default()
                .push(index);
        }

        info!(
            event_name = "catalog.built",
            departments = departments.len(),
            worksites = worksites.len(),
            ranges = ranges.len(),
            entries = entries.len(),
            "approval matrix generated"
        );

        let mut ranges = ranges;
        ranges.sort_by(|left, right| left.min.cmp(&right.min));

        Ok(Self { departments, worksites, ranges, templates, entries, by_origin })
    }

    /// Entry whose range holds `amount` under `[min, max)` semantics. Negative
    /// amounts and unknown department/worksite pairs yield `None`.
    pub fn lookup(
        &self,
        amount: Decimal,
        department: &str,
        worksite: &str,
    ) -> Option<&MatrixEntry> {
        if amount < Decimal::ZERO {
            return None;
        }

        self.by_origin
            .get(&(normalize_key(department), normalize_key(worksite)))?
            .iter()
            .map(|index| &self.entries[*index])
            .find(|entry| entry.range.contains(amount))
    }

    pub fn entries(&self) -> &[MatrixEntry] {
        &self.entries
    }

    pub fn departments(&self) -> &[String] {
        &self.departments
    }

    pub fn worksites(&self) -> &[String] {
        &self.worksites
    }

    /// Ranges sorted by lower bound.
    pub fn ranges(&self) -> &[AmountRange] {
        &self.ranges
    }

    pub fn templates(&self) -> &PathTemplateCatalog {
        &self.templates
    }
}

fn first_duplicate(values: &[String]) -> Option<String> {
    let mut seen = HashSet::new();
    values.iter().find(|value| !seen.insert(normalize_key(value))).cloned()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use super::{build_catalog, MatrixCatalog, PathTemplateCatalog};
    use crate::catalog::{AmountRange, CatalogDefinition, CatalogError};
    use crate::domain::role::RoleCode::{self, *};

    fn idr(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn builtin() -> MatrixCatalog {
        let definition = CatalogDefinition::builtin();
        MatrixCatalog::build(
            definition.departments.clone(),
            definition.worksites.clone(),
            definition.ranges.clone(),
            PathTemplateCatalog::new(definition.templates.clone()),
        )
        .expect("built-in catalog is valid")
    }

    #[test]
    fn one_entry_per_department_worksite_and_range() {
        let catalog = builtin();
        let expected =
            catalog.departments().len() * catalog.worksites().len() * catalog.ranges().len();
        assert_eq!(catalog.entries().len(), expected);

        let first = &catalog.entries()[0];
        assert_eq!(first.id, "MX-00001");
        assert_eq!(first.range.code, "R1");
    }

    #[test]
    fn step_numbers_increase_from_one() {
        for entry in builtin().entries() {
            let numbers: Vec<u32> = entry.steps.iter().map(|step| step.step_number).collect();
            let expected: Vec<u32> = (1..=entry.steps.len() as u32).collect();
            assert_eq!(numbers, expected, "entry {} is not numbered from 1", entry.id);
        }
    }

    #[test]
    fn every_origin_pair_covers_the_amount_axis() {
        let catalog = builtin();
        let probes = [
            idr(0),
            idr(9_999_999),
            idr(10_000_000),
            idr(99_999_999),
            idr(100_000_000),
            idr(149_999_999),
            idr(150_000_000),
            idr(500_000_000),
            idr(75_000_000_000),
        ];

        for department in catalog.departments() {
            for worksite in catalog.worksites() {
                for amount in probes {
                    let matches = catalog
                        .entries()
                        .iter()
                        .filter(|entry| {
                            &entry.department == department
                                && &entry.worksite == worksite
                                && entry.range.contains(amount)
                        })
                        .count();
                    assert_eq!(matches, 1, "{department}/{worksite} at {amount}");
                }
            }
        }
    }

    #[test]
    fn shared_templates_yield_identical_role_sequences() {
        let catalog = builtin();
        for department in catalog.departments() {
            for worksite in catalog.worksites() {
                let r3 = catalog
                    .lookup(idr(60_000_000), department, worksite)
                    .expect("R3 entry");
                let gap_filler = catalog
                    .lookup(idr(120_000_000), department, worksite)
                    .expect("R3G entry");

                assert_eq!(r3.range.code, "R3");
                assert_eq!(gap_filler.range.code, "R3G");
                assert_eq!(r3.role_codes(), gap_filler.role_codes());
                assert_eq!(r3.role_codes().len(), 4);
            }
        }
    }

    #[test]
    fn lookup_uses_half_open_boundaries_and_ignores_case() {
        let catalog = builtin();
        let at_boundary =
            catalog.lookup(idr(10_000_000), "Finance", "sera").expect("boundary entry");
        assert_eq!(at_boundary.range.code, "R2");

        let below = catalog.lookup(idr(9_999_999), "finance", "SERA").expect("lower entry");
        assert_eq!(below.range.code, "R1");
    }

    #[test]
    fn lookup_misses_for_unknown_origin_and_negative_amounts() {
        let catalog = builtin();
        assert!(catalog.lookup(idr(1_000), "marketing", "SERA").is_none());
        assert!(catalog.lookup(idr(1_000), "finance", "ATLANTIS").is_none());
        assert!(catalog.lookup(idr(-1), "finance", "SERA").is_none());
    }

    #[test]
    fn build_rejects_ranges_without_templates() {
        let mut templates = BTreeMap::new();
        templates.insert("R1".to_owned(), vec![UnitHead]);

        let error = MatrixCatalog::build(
            vec!["finance".to_owned()],
            vec!["SERA".to_owned()],
            vec![
                AmountRange::new("R1", idr(0), Some(idr(10))),
                AmountRange::new("R2", idr(10), None),
            ],
            PathTemplateCatalog::new(templates),
        )
        .expect_err("missing template must fail");

        assert_eq!(error, CatalogError::MissingTemplate("R2".to_owned()));
    }

    #[test]
    fn build_rejects_sourcing_roles_and_duplicates() {
        let ranges = vec![AmountRange::new("R1", idr(0), None)];
        let mut templates = BTreeMap::new();
        templates.insert("R1".to_owned(), vec![UnitHead, SourcingLead]);

        let error = MatrixCatalog::build(
            vec!["finance".to_owned()],
            vec!["SERA".to_owned()],
            ranges.clone(),
            PathTemplateCatalog::new(templates),
        )
        .expect_err("sourcing role must fail");
        assert!(matches!(error, CatalogError::SourcingRoleInTemplate { .. }));

        let mut templates = BTreeMap::new();
        templates.insert("R1".to_owned(), vec![UnitHead]);
        let error = MatrixCatalog::build(
            vec!["finance".to_owned(), "FINANCE".to_owned()],
            vec!["SERA".to_owned()],
            ranges,
            PathTemplateCatalog::new(templates),
        )
        .expect_err("duplicate department must fail");
        assert_eq!(error, CatalogError::DuplicateDepartment("FINANCE".to_owned()));
    }

    #[test]
    fn build_rejects_templates_without_a_range() {
        let mut templates = BTreeMap::new();
        templates.insert("R1".to_owned(), vec![UnitHead]);
        templates.insert("r9".to_owned(), vec![UnitHead, SectionHead]);

        let error = MatrixCatalog::build(
            vec!["finance".to_owned()],
            vec!["SERA".to_owned()],
            vec![AmountRange::new("R1", idr(0), None)],
            PathTemplateCatalog::new(templates),
        )
        .expect_err("orphan template must fail");

        assert_eq!(error, CatalogError::OrphanTemplate("r9".to_owned()));
    }

    #[test]
    fn build_catalog_is_deterministic() {
        let definition = CatalogDefinition::builtin();
        let templates = PathTemplateCatalog::new(definition.templates.clone());
        let run = || {
            build_catalog(
                &definition.departments,
                &definition.worksites,
                &definition.ranges,
                &templates,
            )
            .expect("catalog")
        };

        assert_eq!(run(), run());
        let roles: Vec<RoleCode> = run()[0].role_codes();
        assert_eq!(roles, vec![UnitHead, SectionHead]);
    }
}
