//! Declarative policy table
//!
//! One row per entity kind: who may read it (as a [`ReadRule`]) and which
//! roles may create, update, or delete it. Named transitions have their own
//! table. Delete is admin-only everywhere.

use super::{EntityKind, RoleSet, Transition};
use crate::error::{CampusError, CampusResult};
use crate::identity::Caller;

/// How the read scope of an entity is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRule {
    /// Everyone, including anonymous callers
    Public,
    /// Every authenticated caller
    Authenticated,
    /// Staff see everything; students see their own
    Academic,
    /// Admin sees everything; others see records they are a party to
    Owned,
    /// Account visibility rules
    Accounts,
    /// Admin sees everything; others see active listings and their own
    Directory,
    /// Admin only
    AdminOnly,
}

/// Mutating action on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

/// Policy row for one entity kind
#[derive(Debug, Clone, Copy)]
pub struct PolicyRow {
    pub kind: EntityKind,
    pub read: ReadRule,
    pub create: RoleSet,
    pub update: RoleSet,
    pub delete: RoleSet,
}

const ADMIN: RoleSet = RoleSet::ADMIN;
const STAFF: RoleSet = RoleSet::STAFF;
const ADMIN_EMPLOYER: RoleSet = RoleSet::ADMIN.union(RoleSet::EMPLOYER);
const ADMIN_STUDENT: RoleSet = RoleSet::ADMIN.union(RoleSet::STUDENT);

const fn row(
    kind: EntityKind,
    read: ReadRule,
    create: RoleSet,
    update: RoleSet,
) -> PolicyRow {
    PolicyRow {
        kind,
        read,
        create,
        update,
        delete: ADMIN,
    }
}

use EntityKind as K;
use ReadRule as R;

/// The policy table
pub static POLICY: [PolicyRow; 27] = [
    row(K::Account, R::Accounts, ADMIN, ADMIN),
    row(K::BackgroundCheck, R::Owned, ADMIN_STUDENT, ADMIN),
    row(K::CourseCategory, R::Public, STAFF, STAFF),
    row(K::Course, R::Public, STAFF, STAFF),
    row(K::CourseModule, R::Public, STAFF, STAFF),
    row(K::InstructorProfile, R::Directory, ADMIN, ADMIN),
    row(K::Assessment, R::Authenticated, STAFF, STAFF),
    row(K::StudentProfile, R::Academic, ADMIN, ADMIN),
    row(K::Enrollment, R::Academic, STAFF, STAFF),
    row(K::Attendance, R::Academic, STAFF, STAFF),
    row(K::AssessmentResult, R::Academic, STAFF, STAFF),
    row(K::ProgressReport, R::Academic, STAFF, STAFF),
    row(K::Placement, R::Owned, ADMIN, ADMIN),
    row(K::EmployerProfile, R::Directory, ADMIN, ADMIN),
    row(K::JobPosting, R::Authenticated, ADMIN_EMPLOYER, ADMIN_EMPLOYER),
    row(K::JobApplication, R::Owned, ADMIN, ADMIN),
    row(K::RehireRequest, R::Owned, ADMIN_EMPLOYER, ADMIN_EMPLOYER),
    row(K::EmployerFeedback, R::Owned, ADMIN_EMPLOYER, ADMIN_EMPLOYER),
    row(K::Certificate, R::Academic, ADMIN, ADMIN),
    row(K::CompetencyAssessment, R::Owned, STAFF, STAFF),
    row(K::TuitionFee, R::Authenticated, ADMIN, ADMIN),
    row(K::Payment, R::Owned, ADMIN, ADMIN),
    row(K::PlacementFee, R::Owned, ADMIN, ADMIN),
    row(K::Payroll, R::Owned, ADMIN, ADMIN),
    row(K::Expense, R::AdminOnly, ADMIN, ADMIN),
    row(K::Invoice, R::AdminOnly, ADMIN, ADMIN),
    row(K::FinancialReport, R::AdminOnly, ADMIN, ADMIN),
];

/// Roles allowed to run each named transition
pub static TRANSITIONS: [(EntityKind, Transition, RoleSet); 8] = [
    (K::BackgroundCheck, Transition::Approve, ADMIN),
    (K::BackgroundCheck, Transition::Reject, ADMIN),
    (K::Enrollment, Transition::Complete, STAFF),
    (K::JobApplication, Transition::Approve, ADMIN_EMPLOYER),
    (K::JobApplication, Transition::Reject, ADMIN_EMPLOYER),
    (K::RehireRequest, Transition::Approve, ADMIN),
    (K::RehireRequest, Transition::Reject, ADMIN),
    (K::Payment, Transition::MarkPaid, ADMIN),
];

/// Policy row for a kind
pub fn rule(kind: EntityKind) -> &'static PolicyRow {
    // POLICY is declared in EntityKind order
    &POLICY[kind as usize]
}

/// Anonymous callers may only read public kinds
pub fn requires_authentication(kind: EntityKind) -> bool {
    rule(kind).read != ReadRule::Public
}

/// Role gate for a mutating action.
///
/// Anonymous callers fail authentication; authenticated callers outside the
/// allowed roles are denied. Ownership of the target is checked separately
/// against the write scope.
pub fn authorize(caller: &Caller, kind: EntityKind, action: Action) -> CampusResult<()> {
    let Some(role) = caller.role() else {
        return Err(CampusError::AuthFailed("authentication required".into()));
    };

    let row = rule(kind);
    let allowed = match action {
        Action::Create => row.create,
        Action::Update => row.update,
        Action::Delete => row.delete,
    };

    if allowed.contains(role) {
        Ok(())
    } else {
        tracing::warn!(entity = %kind, ?action, %role, "mutation denied");
        Err(CampusError::PermissionDenied)
    }
}

/// Role gate for a named transition
pub fn authorize_transition(
    caller: &Caller,
    kind: EntityKind,
    transition: Transition,
) -> CampusResult<()> {
    let Some(role) = caller.role() else {
        return Err(CampusError::AuthFailed("authentication required".into()));
    };

    let allowed = TRANSITIONS
        .iter()
        .filter(|(k, t, _)| *k == kind && *t == transition)
        .any(|(_, _, roles)| roles.contains(role));

    if allowed {
        Ok(())
    } else {
        tracing::warn!(entity = %kind, %transition, %role, "transition denied");
        Err(CampusError::PermissionDenied)
    }
}

/// Transitions defined for a kind, for rendering action buttons
pub fn transitions_for(kind: EntityKind) -> Vec<Transition> {
    let mut found: Vec<Transition> = Vec::new();
    for (k, t, _) in TRANSITIONS.iter() {
        if *k == kind && !found.contains(t) {
            found.push(*t);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, EmployerId, StudentId};

    fn student() -> Caller {
        Caller::Student { account: AccountId::new(), profile: Some(StudentId::new()) }
    }

    #[test]
    fn test_table_is_in_kind_order() {
        for kind in EntityKind::ALL {
            assert_eq!(rule(kind).kind, kind);
        }
    }

    #[test]
    fn test_delete_is_admin_only_everywhere() {
        let admin = Caller::Admin { account: AccountId::new() };
        let instructor = Caller::Instructor { account: AccountId::new(), profile: None };
        for kind in EntityKind::ALL {
            assert!(authorize(&admin, kind, Action::Delete).is_ok());
            assert_eq!(
                authorize(&instructor, kind, Action::Delete),
                Err(CampusError::PermissionDenied)
            );
        }
    }

    #[test]
    fn test_relaxations() {
        let instructor = Caller::Instructor { account: AccountId::new(), profile: None };
        let employer = Caller::Employer { account: AccountId::new(), profile: Some(EmployerId::new()) };

        assert!(authorize(&instructor, K::Course, Action::Create).is_ok());
        assert!(authorize(&instructor, K::Attendance, Action::Update).is_ok());
        assert!(authorize(&instructor, K::Payment, Action::Create).is_err());
        assert!(authorize(&employer, K::JobPosting, Action::Create).is_ok());
        assert!(authorize(&employer, K::RehireRequest, Action::Create).is_ok());
        assert!(authorize(&employer, K::Course, Action::Create).is_err());
        assert!(authorize(&student(), K::BackgroundCheck, Action::Create).is_ok());
        assert!(authorize(&student(), K::BackgroundCheck, Action::Update).is_err());
    }

    #[test]
    fn test_anonymous_writes_need_authentication() {
        assert!(matches!(
            authorize(&Caller::Anonymous, K::Course, Action::Create),
            Err(CampusError::AuthFailed(_))
        ));
        assert!(!requires_authentication(K::Course));
        assert!(requires_authentication(K::JobPosting));
    }

    #[test]
    fn test_transition_roles() {
        let employer = Caller::Employer { account: AccountId::new(), profile: Some(EmployerId::new()) };
        assert!(authorize_transition(&employer, K::JobApplication, Transition::Reject).is_ok());
        assert!(authorize_transition(&employer, K::BackgroundCheck, Transition::Approve).is_err());
        assert!(authorize_transition(&student(), K::Enrollment, Transition::Complete).is_err());
        assert_eq!(transitions_for(K::Payment), vec![Transition::MarkPaid]);
        assert!(transitions_for(K::Course).is_empty());
    }
}
