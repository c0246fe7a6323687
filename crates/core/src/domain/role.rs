use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Abstract approval level used by path templates. Concrete role identifiers are
/// produced from a role code by the role resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCode {
    UnitHead,
    SectionHead,
    DepartmentHead,
    Manager,
    DivisionHead,
    RegionalOperationsApproval,
    Director,
    TopExecutiveApproval,
    SourcingOfficer,
    SourcingLead,
}

/// Which slice of the organizational context a role identifier is keyed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    DepartmentWorksite,
    Department,
    Worksite,
    Region,
    Global,
}

impl RoleCode {
    pub const ALL: [RoleCode; 10] = [
        RoleCode::UnitHead,
        RoleCode::SectionHead,
        RoleCode::DepartmentHead,
        RoleCode::Manager,
        RoleCode::DivisionHead,
        RoleCode::RegionalOperationsApproval,
        RoleCode::Director,
        RoleCode::TopExecutiveApproval,
        RoleCode::SourcingOfficer,
        RoleCode::SourcingLead,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnitHead => "unit_head",
            Self::SectionHead => "section_head",
            Self::DepartmentHead => "department_head",
            Self::Manager => "manager",
            Self::DivisionHead => "division_head",
            Self::RegionalOperationsApproval => "regional_operations_approval",
            Self::Director => "director",
            Self::TopExecutiveApproval => "top_executive_approval",
            Self::SourcingOfficer => "sourcing_officer",
            Self::SourcingLead => "sourcing_lead",
        }
    }

    pub fn scope(self) -> RoleScope {
        match self {
            Self::UnitHead | Self::SectionHead => RoleScope::DepartmentWorksite,
            Self::DepartmentHead | Self::DivisionHead => RoleScope::Department,
            Self::Manager => RoleScope::Worksite,
            Self::RegionalOperationsApproval => RoleScope::Region,
            Self::Director
            | Self::TopExecutiveApproval
            | Self::SourcingOfficer
            | Self::SourcingLead => RoleScope::Global,
        }
    }

    /// Stage name written into history for a step carrying this role.
    pub fn stage_name(self) -> &'static str {
        match self {
            Self::UnitHead => "Unit Head Approval",
            Self::SectionHead => "Section Head Approval",
            Self::DepartmentHead => "Department Head Approval",
            Self::Manager => "Manager Approval",
            Self::DivisionHead => "Division Head Approval",
            Self::RegionalOperationsApproval => "Regional Operations Approval",
            Self::Director => "Director Approval",
            Self::TopExecutiveApproval => "Top Executive Approval",
            Self::SourcingOfficer => "Sourcing Officer Review",
            Self::SourcingLead => "Sourcing Lead Review",
        }
    }

    /// Sourcing roles are fixed and never appear in an amount-based approval template.
    pub fn is_sourcing_only(self) -> bool {
        matches!(self, Self::SourcingOfficer | Self::SourcingLead)
    }
}

impl fmt::Display for RoleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == key)
            .ok_or_else(|| format!("unknown role code `{value}`"))
    }
}

/// Canonical role identifier, e.g. `section_head:finance:sera-btm`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleIdentifier(pub String);

impl RoleIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{RoleCode, RoleScope};

    #[test]
    fn role_codes_parse_from_snake_kebab_and_spaced_forms() {
        assert_eq!("unit_head".parse::<RoleCode>(), Ok(RoleCode::UnitHead));
        assert_eq!("Division-Head".parse::<RoleCode>(), Ok(RoleCode::DivisionHead));
        assert_eq!(
            "regional operations approval".parse::<RoleCode>(),
            Ok(RoleCode::RegionalOperationsApproval)
        );
        assert!("chief_of_staff".parse::<RoleCode>().is_err());
    }

    #[test]
    fn every_role_code_round_trips_through_its_label() {
        for code in RoleCode::ALL {
            assert_eq!(code.as_str().parse::<RoleCode>(), Ok(code));
        }
    }

    #[test]
    fn regional_role_is_the_only_region_scoped_code() {
        let region_scoped: Vec<RoleCode> =
            RoleCode::ALL.into_iter().filter(|code| code.scope() == RoleScope::Region).collect();
        assert_eq!(region_scoped, vec![RoleCode::RegionalOperationsApproval]);
    }
}
