//! Roles and the per-request caller context

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{AccountId, EmployerId, InstructorId, StudentId};

/// Discrete role tag carried by every account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Instructor,
    Student,
    Employer,
}

impl Role {
    /// All roles
    pub const ALL: [Role; 4] = [Role::Admin, Role::Instructor, Role::Student, Role::Employer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
            Role::Employer => "employer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            "employer" => Ok(Role::Employer),
            _ => Err(format!("{:?} is not a valid role", s)),
        }
    }
}

/// Who is making the request.
///
/// Built once per request from the verified token and handed to every policy
/// check. Profile-bearing roles carry their profile id when one exists; a
/// `student` account without a Student profile is `Student { profile: None }`
/// and owns nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Admin {
        account: AccountId,
    },
    Instructor {
        account: AccountId,
        profile: Option<InstructorId>,
    },
    Student {
        account: AccountId,
        profile: Option<StudentId>,
    },
    Employer {
        account: AccountId,
        profile: Option<EmployerId>,
    },
}

impl Caller {
    pub fn role(&self) -> Option<Role> {
        match self {
            Caller::Anonymous => None,
            Caller::Admin { .. } => Some(Role::Admin),
            Caller::Instructor { .. } => Some(Role::Instructor),
            Caller::Student { .. } => Some(Role::Student),
            Caller::Employer { .. } => Some(Role::Employer),
        }
    }

    pub fn account(&self) -> Option<AccountId> {
        match *self {
            Caller::Anonymous => None,
            Caller::Admin { account }
            | Caller::Instructor { account, .. }
            | Caller::Student { account, .. }
            | Caller::Employer { account, .. } => Some(account),
        }
    }

    pub fn student(&self) -> Option<StudentId> {
        match *self {
            Caller::Student { profile, .. } => profile,
            _ => None,
        }
    }

    pub fn employer(&self) -> Option<EmployerId> {
        match *self {
            Caller::Employer { profile, .. } => profile,
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin { .. })
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Caller::Anonymous)
    }
}
