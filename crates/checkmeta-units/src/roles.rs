//! Role codes and roster sanity checks.
//!
//! A unit's role implies a division. Rosters are external data, so a
//! mismatch is reported back to the caller as a [`RoleIssue`] rather than
//! refusing the unit.

use serde::{Deserialize, Serialize};

use checkmeta_types::{Division, Unit, UnitId};

/// Canonical role codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Field Leader.
    #[serde(rename = "FL")]
    FieldLeader,
    /// Ranger.
    #[serde(rename = "RG")]
    Ranger,
    /// Vanguard.
    #[serde(rename = "VG")]
    Vanguard,
    /// Enforcer.
    #[serde(rename = "EN")]
    Enforcer,
    /// Ghost Operative.
    #[serde(rename = "GO")]
    GhostOperative,
    /// Psi Operative.
    #[serde(rename = "PO")]
    PsiOperative,
    /// Sovereign.
    #[serde(rename = "SV")]
    Sovereign,
}

impl Role {
    /// Every role, ops first.
    pub const ALL: [Self; 7] = [
        Self::FieldLeader,
        Self::Ranger,
        Self::Vanguard,
        Self::Enforcer,
        Self::GhostOperative,
        Self::PsiOperative,
        Self::Sovereign,
    ];

    /// Two-letter roster code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::FieldLeader => "FL",
            Self::Ranger => "RG",
            Self::Vanguard => "VG",
            Self::Enforcer => "EN",
            Self::GhostOperative => "GO",
            Self::PsiOperative => "PO",
            Self::Sovereign => "SV",
        }
    }

    /// Parse a roster code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    /// Division this role belongs to.
    pub const fn division(self) -> Division {
        match self {
            Self::FieldLeader | Self::Ranger | Self::Vanguard | Self::Enforcer => Division::Ops,
            Self::GhostOperative | Self::PsiOperative | Self::Sovereign => Division::Intel,
        }
    }
}

/// A roster problem with one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum RoleIssue {
    /// The role code is not canonical.
    UnknownRole {
        /// Offending unit.
        unit: UnitId,
        /// Role as given.
        role: String,
    },
    /// The unit's division differs from its role's division.
    DivisionMismatch {
        /// Offending unit.
        unit: UnitId,
        /// Division on the unit.
        division: Division,
        /// Division implied by the role.
        expected: Division,
    },
}

impl core::fmt::Display for RoleIssue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownRole { unit, role } => write!(f, "unit {unit} has unknown role {role}"),
            Self::DivisionMismatch {
                unit,
                division,
                expected,
            } => write!(
                f,
                "unit {unit} has division {division}, role implies {expected}"
            ),
        }
    }
}

/// Check one unit's role against its division.
///
/// A `both` unit is accepted for any known role.
pub fn check_unit(unit: &Unit) -> Option<RoleIssue> {
    let Some(role) = Role::from_code(&unit.role) else {
        return Some(RoleIssue::UnknownRole {
            unit: unit.id.clone(),
            role: unit.role.clone(),
        });
    };
    let expected = role.division();
    if unit.division == Division::Both || unit.division == expected {
        None
    } else {
        Some(RoleIssue::DivisionMismatch {
            unit: unit.id.clone(),
            division: unit.division,
            expected,
        })
    }
}
