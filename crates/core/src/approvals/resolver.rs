use serde::{Deserialize, Serialize};

use crate::domain::role::{RoleCode, RoleIdentifier, RoleScope};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionAuthority {
    Region(String),
    NoAuthority,
}

/// Worksite-name prefix -> regional operations authority. The longest matching
/// prefix wins, compared case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionalEntityMap {
    prefixes: Vec<(String, RegionAuthority)>,
}

impl RegionalEntityMap {
    pub fn new(entries: impl IntoIterator<Item = (String, RegionAuthority)>) -> Self {
        let mut prefixes: Vec<(String, RegionAuthority)> = entries
            .into_iter()
            .map(|(prefix, authority)| (prefix.trim().to_ascii_uppercase(), authority))
            .filter(|(prefix, _)| !prefix.is_empty())
            .collect();
        prefixes.sort_by(|left, right| {
            right.0.len().cmp(&left.0.len()).then_with(|| left.0.cmp(&right.0))
        });
        Self { prefixes }
    }

    pub fn region_for(&self, worksite: &str) -> Option<&str> {
        let worksite = worksite.trim().to_ascii_uppercase();
        match self.prefixes.iter().find(|(prefix, _)| worksite.starts_with(prefix.as_str()))? {
            (_, RegionAuthority::Region(region)) => Some(region.as_str()),
            (_, RegionAuthority::NoAuthority) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Organizational context for one resolution. The creator's department and
/// worksite govern the chain; the destination only feeds the regional step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutingContext<'a> {
    pub department: &'a str,
    pub origin_worksite: &'a str,
    pub destination_worksite: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedRole {
    Role(RoleIdentifier),
    NotApplicable,
}

#[derive(Clone, Debug, Default)]
pub struct RoleResolver {
    regions: RegionalEntityMap,
}

impl RoleResolver {
    pub fn new(regions: RegionalEntityMap) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &RegionalEntityMap {
        &self.regions
    }

    /// Total over its inputs: every role code yields an identifier or
    /// `NotApplicable`, never an error.
    pub fn resolve(&self, role_code: RoleCode, context: &RoutingContext<'_>) -> ResolvedRole {
        let label = role_code.as_str();
        let identifier = match role_code.scope() {
            RoleScope::DepartmentWorksite => format!(
                "{label}:{}:{}",
                slug(context.department),
                slug(context.origin_worksite)
            ),
            RoleScope::Department => format!("{label}:{}", slug(context.department)),
            RoleScope::Worksite => format!("{label}:{}", slug(context.origin_worksite)),
            RoleScope::Region => match self.regions.region_for(context.destination_worksite) {
                Some(region) => format!("{label}:{}", slug(region)),
                None => return ResolvedRole::NotApplicable,
            },
            RoleScope::Global => label.to_owned(),
        };

        ResolvedRole::Role(RoleIdentifier(identifier))
    }
}

fn slug(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("-").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{RegionAuthority, RegionalEntityMap, ResolvedRole, RoleResolver, RoutingContext};
    use crate::domain::role::{RoleCode, RoleIdentifier};

    fn regions() -> RegionalEntityMap {
        RegionalEntityMap::new(vec![
            ("SERA".to_owned(), RegionAuthority::Region("SERA".to_owned())),
            ("KAL".to_owned(), RegionAuthority::Region("KAL".to_owned())),
            ("SUM".to_owned(), RegionAuthority::Region("SUM".to_owned())),
            ("HO".to_owned(), RegionAuthority::NoAuthority),
            ("DC".to_owned(), RegionAuthority::NoAuthority),
        ])
    }

    fn context<'a>(origin: &'a str, destination: &'a str) -> RoutingContext<'a> {
        RoutingContext {
            department: "Finance",
            origin_worksite: origin,
            destination_worksite: destination,
        }
    }

    fn role(value: &str) -> ResolvedRole {
        ResolvedRole::Role(RoleIdentifier(value.to_owned()))
    }

    #[test]
    fn worksite_prefixes_map_to_regions() {
        let regions = regions();
        assert_eq!(regions.region_for("SERA"), Some("SERA"));
        assert_eq!(regions.region_for("sera-btm"), Some("SERA"));
        assert_eq!(regions.region_for("KAL-BPN"), Some("KAL"));
        assert_eq!(regions.region_for("SUM-MDN"), Some("SUM"));
        assert_eq!(regions.region_for("HO"), None);
        assert_eq!(regions.region_for("PAPUA"), None);
    }

    #[test]
    fn longest_prefix_wins() {
        let regions = RegionalEntityMap::new(vec![
            ("SERA".to_owned(), RegionAuthority::Region("SERA".to_owned())),
            ("SERA-X".to_owned(), RegionAuthority::NoAuthority),
        ]);
        assert_eq!(regions.region_for("SERA-BTM"), Some("SERA"));
        assert_eq!(regions.region_for("SERA-X1"), None);
    }

    #[test]
    fn scoped_roles_follow_their_templates() {
        let resolver = RoleResolver::new(regions());
        let context = context("SERA-BTM", "KAL-BPN");

        assert_eq!(
            resolver.resolve(RoleCode::UnitHead, &context),
            role("unit_head:finance:sera-btm")
        );
        assert_eq!(
            resolver.resolve(RoleCode::DepartmentHead, &context),
            role("department_head:finance")
        );
        assert_eq!(resolver.resolve(RoleCode::Manager, &context), role("manager:sera-btm"));
        assert_eq!(resolver.resolve(RoleCode::Director, &context), role("director"));
    }

    #[test]
    fn regional_role_resolves_against_destination() {
        let resolver = RoleResolver::new(regions());

        assert_eq!(
            resolver.resolve(RoleCode::RegionalOperationsApproval, &context("SERA", "KAL-SMD")),
            role("regional_operations_approval:kal")
        );
        assert_eq!(
            resolver.resolve(RoleCode::RegionalOperationsApproval, &context("SERA", "DC")),
            ResolvedRole::NotApplicable
        );
        assert_eq!(
            resolver.resolve(RoleCode::RegionalOperationsApproval, &context("HO", "SUM-MDN")),
            role("regional_operations_approval:sum")
        );
    }

    #[test]
    fn resolver_is_total_for_unknown_context() {
        let resolver = RoleResolver::default();
        let context = RoutingContext {
            department: "",
            origin_worksite: "  ",
            destination_worksite: "nowhere",
        };

        for code in RoleCode::ALL {
            let resolved = resolver.resolve(code, &context);
            if code == RoleCode::RegionalOperationsApproval {
                assert_eq!(resolved, ResolvedRole::NotApplicable);
            } else {
                assert!(matches!(resolved, ResolvedRole::Role(_)));
            }
        }
    }
}
