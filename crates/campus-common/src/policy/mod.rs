//! Access policy
//!
//! Visibility and mutation rights are declared once per entity kind in
//! [`table::POLICY`]; [`scope`] turns a caller into the record subset they may
//! see, and [`table::authorize`] gates create/update/delete and named
//! transitions.

pub mod scope;
pub mod table;

pub use scope::{read_scope, write_scope, Owner, Scope, Scoped};
pub use table::{authorize, authorize_transition, requires_authentication, Action, ReadRule};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use crate::identity::Role;

/// Every record class the service stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Account,
    BackgroundCheck,
    CourseCategory,
    Course,
    CourseModule,
    InstructorProfile,
    Assessment,
    StudentProfile,
    Enrollment,
    Attendance,
    AssessmentResult,
    ProgressReport,
    Placement,
    EmployerProfile,
    JobPosting,
    JobApplication,
    RehireRequest,
    EmployerFeedback,
    Certificate,
    CompetencyAssessment,
    TuitionFee,
    Payment,
    PlacementFee,
    Payroll,
    Expense,
    Invoice,
    FinancialReport,
}

impl EntityKind {
    pub const ALL: [EntityKind; 27] = [
        EntityKind::Account,
        EntityKind::BackgroundCheck,
        EntityKind::CourseCategory,
        EntityKind::Course,
        EntityKind::CourseModule,
        EntityKind::InstructorProfile,
        EntityKind::Assessment,
        EntityKind::StudentProfile,
        EntityKind::Enrollment,
        EntityKind::Attendance,
        EntityKind::AssessmentResult,
        EntityKind::ProgressReport,
        EntityKind::Placement,
        EntityKind::EmployerProfile,
        EntityKind::JobPosting,
        EntityKind::JobApplication,
        EntityKind::RehireRequest,
        EntityKind::EmployerFeedback,
        EntityKind::Certificate,
        EntityKind::CompetencyAssessment,
        EntityKind::TuitionFee,
        EntityKind::Payment,
        EntityKind::PlacementFee,
        EntityKind::Payroll,
        EntityKind::Expense,
        EntityKind::Invoice,
        EntityKind::FinancialReport,
    ];

    /// URL segment, as used by the REST routes and pages
    pub fn slug(&self) -> &'static str {
        match self {
            EntityKind::Account => "users",
            EntityKind::BackgroundCheck => "background-checks",
            EntityKind::CourseCategory => "categories",
            EntityKind::Course => "courses",
            EntityKind::CourseModule => "modules",
            EntityKind::InstructorProfile => "instructors",
            EntityKind::Assessment => "assessments",
            EntityKind::StudentProfile => "students",
            EntityKind::Enrollment => "enrollments",
            EntityKind::Attendance => "attendance",
            EntityKind::AssessmentResult => "assessment-results",
            EntityKind::ProgressReport => "progress-reports",
            EntityKind::Placement => "placements",
            EntityKind::EmployerProfile => "employers",
            EntityKind::JobPosting => "job-postings",
            EntityKind::JobApplication => "job-applications",
            EntityKind::RehireRequest => "rehire-requests",
            EntityKind::EmployerFeedback => "feedback",
            EntityKind::Certificate => "certificates",
            EntityKind::CompetencyAssessment => "competency-assessments",
            EntityKind::TuitionFee => "tuition-fees",
            EntityKind::Payment => "payments",
            EntityKind::PlacementFee => "placement-fees",
            EntityKind::Payroll => "payroll",
            EntityKind::Expense => "expenses",
            EntityKind::Invoice => "invoices",
            EntityKind::FinancialReport => "financial-reports",
        }
    }

    /// Human-readable singular name
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Account => "user",
            EntityKind::BackgroundCheck => "background check",
            EntityKind::CourseCategory => "course category",
            EntityKind::Course => "course",
            EntityKind::CourseModule => "course module",
            EntityKind::InstructorProfile => "instructor",
            EntityKind::Assessment => "assessment",
            EntityKind::StudentProfile => "student",
            EntityKind::Enrollment => "enrollment",
            EntityKind::Attendance => "attendance record",
            EntityKind::AssessmentResult => "assessment result",
            EntityKind::ProgressReport => "progress report",
            EntityKind::Placement => "placement",
            EntityKind::EmployerProfile => "employer",
            EntityKind::JobPosting => "job posting",
            EntityKind::JobApplication => "job application",
            EntityKind::RehireRequest => "rehire request",
            EntityKind::EmployerFeedback => "employer feedback",
            EntityKind::Certificate => "certificate",
            EntityKind::CompetencyAssessment => "competency assessment",
            EntityKind::TuitionFee => "tuition fee",
            EntityKind::Payment => "payment",
            EntityKind::PlacementFee => "placement fee",
            EntityKind::Payroll => "payroll entry",
            EntityKind::Expense => "expense",
            EntityKind::Invoice => "invoice",
            EntityKind::FinancialReport => "financial report",
        }
    }

    /// Module the kind belongs to, for navigation
    pub fn area(&self) -> &'static str {
        match self {
            EntityKind::Account | EntityKind::BackgroundCheck => "accounts",
            EntityKind::CourseCategory
            | EntityKind::Course
            | EntityKind::CourseModule
            | EntityKind::InstructorProfile
            | EntityKind::Assessment => "courses",
            EntityKind::StudentProfile
            | EntityKind::Enrollment
            | EntityKind::Attendance
            | EntityKind::AssessmentResult
            | EntityKind::ProgressReport
            | EntityKind::Placement => "students",
            EntityKind::EmployerProfile
            | EntityKind::JobPosting
            | EntityKind::JobApplication
            | EntityKind::RehireRequest
            | EntityKind::EmployerFeedback => "employers",
            EntityKind::Certificate | EntityKind::CompetencyAssessment => "certifications",
            EntityKind::TuitionFee
            | EntityKind::Payment
            | EntityKind::PlacementFee
            | EntityKind::Payroll
            | EntityKind::Expense
            | EntityKind::Invoice
            | EntityKind::FinancialReport => "financials",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("unknown entity {:?}", s))
    }
}

/// Set of roles, as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const NONE: RoleSet = RoleSet(0);
    pub const ADMIN: RoleSet = RoleSet(1);
    pub const INSTRUCTOR: RoleSet = RoleSet(1 << 1);
    pub const STUDENT: RoleSet = RoleSet(1 << 2);
    pub const EMPLOYER: RoleSet = RoleSet(1 << 3);
    pub const STAFF: RoleSet = RoleSet(Self::ADMIN.0 | Self::INSTRUCTOR.0);
    pub const ANY: RoleSet = RoleSet(0b1111);

    pub const fn union(self, other: RoleSet) -> RoleSet {
        RoleSet(self.0 | other.0)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & RoleSet::of(role).0 != 0
    }

    pub const fn of(role: Role) -> RoleSet {
        match role {
            Role::Admin => RoleSet::ADMIN,
            Role::Instructor => RoleSet::INSTRUCTOR,
            Role::Student => RoleSet::STUDENT,
            Role::Employer => RoleSet::EMPLOYER,
        }
    }
}

impl BitOr for RoleSet {
    type Output = RoleSet;

    fn bitor(self, rhs: RoleSet) -> RoleSet {
        self.union(rhs)
    }
}

/// Named state change on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Approve,
    Reject,
    Complete,
    MarkPaid,
}

impl Transition {
    pub fn slug(&self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Complete => "complete",
            Transition::MarkPaid => "mark-paid",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Transition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Transition::Approve),
            "reject" => Ok(Transition::Reject),
            "complete" => Ok(Transition::Complete),
            "mark-paid" => Ok(Transition::MarkPaid),
            _ => Err(format!("unknown transition {:?}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs_are_unique_and_parse_back() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.slug().parse::<EntityKind>().unwrap(), kind);
        }
        let mut slugs: Vec<_> = EntityKind::ALL.iter().map(|k| k.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), EntityKind::ALL.len());
    }

    #[test]
    fn test_role_set() {
        let staff = RoleSet::STAFF;
        assert!(staff.contains(Role::Admin));
        assert!(staff.contains(Role::Instructor));
        assert!(!staff.contains(Role::Student));
        assert!((RoleSet::ADMIN | RoleSet::EMPLOYER).contains(Role::Employer));
        assert!(!RoleSet::NONE.contains(Role::Admin));
    }
}
