//! Role and department vocabulary, and the role-access table.
//!
//! Roles and department tags are closed enums rather than strings: adding a
//! role is a compile-time-visible change, and an unknown role cannot reach
//! the pipeline at all. The access table is an exhaustive match, immutable
//! for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// A user's role, assigned upstream by the identity provider and trusted
/// unconditionally by the pipeline. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Finance,
    Marketing,
    Hr,
    Engineering,
    CLevel,
    Employee,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 6] = [
        Role::Finance,
        Role::Marketing,
        Role::Hr,
        Role::Engineering,
        Role::CLevel,
        Role::Employee,
    ];

    /// Canonical lowercase name, matching the identity provider's vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Finance => "finance",
            Role::Marketing => "marketing",
            Role::Hr => "hr",
            Role::Engineering => "engineering",
            Role::CLevel => "c-level",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finance" => Ok(Role::Finance),
            "marketing" => Ok(Role::Marketing),
            "hr" => Ok(Role::Hr),
            "engineering" => Ok(Role::Engineering),
            "c-level" | "clevel" => Ok(Role::CLevel),
            "employee" => Ok(Role::Employee),
            _ => Err(AppError::Config(format!(
                "Unknown role: '{}'. Supported: finance, marketing, hr, engineering, c-level, employee",
                s
            ))),
        }
    }
}

/// Department tag attached to every document fragment at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Finance,
    Marketing,
    Hr,
    Engineering,
    General,
}

impl Department {
    /// All department tags, in declaration order.
    pub const ALL: [Department; 5] = [
        Department::Finance,
        Department::Marketing,
        Department::Hr,
        Department::Engineering,
        Department::General,
    ];

    /// Canonical lowercase tag, as stored alongside fragments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Finance => "finance",
            Department::Marketing => "marketing",
            Department::Hr => "hr",
            Department::Engineering => "engineering",
            Department::General => "general",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finance" => Ok(Department::Finance),
            "marketing" => Ok(Department::Marketing),
            "hr" => Ok(Department::Hr),
            "engineering" => Ok(Department::Engineering),
            "general" => Ok(Department::General),
            _ => Err(AppError::Index(format!("Malformed department tag: '{}'", s))),
        }
    }
}

/// The role → department access table.
///
/// Pure, deterministic, and exhaustive: every role maps to a fixed set of
/// departments, `general` is visible to everyone, and `c-level` sees the
/// full universe. There is no error path; the closed `Role` enum makes an
/// unknown role unrepresentable.
pub struct AccessPolicy;

impl AccessPolicy {
    /// Departments a role may consult. The returned slice is the hard
    /// retrieval filter: content outside it must never reach retrieval
    /// results, generation context, or citations for this role.
    pub fn allowed_departments(role: Role) -> &'static [Department] {
        use Department::*;

        match role {
            Role::Finance => &[General, Finance],
            Role::Marketing => &[General, Marketing],
            Role::Hr => &[General, Hr],
            Role::Engineering => &[General, Engineering],
            Role::CLevel => &[Finance, Marketing, Hr, Engineering, General],
            Role::Employee => &[General],
        }
    }

    /// Whether a role may see fragments tagged with a department.
    pub fn is_allowed(role: Role, department: Department) -> bool {
        Self::allowed_departments(role).contains(&department)
    }
}
