//! Queryset scoper
//!
//! Maps (caller, entity kind) to a [`Scope`] and filters record collections
//! through it. The result is a [`Scoped`] collection, which only this crate
//! can construct.

use super::table::{rule, ReadRule};
use super::{EntityKind, RoleSet};
use crate::domain::{AccountId, EmployerId, StudentId};
use crate::identity::{Caller, Role};

/// Accountable parties of a record, used as the scoping key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Owner {
    /// Owning student profile
    pub student: Option<StudentId>,
    /// Owning employer profile
    pub employer: Option<EmployerId>,
    /// Owning account
    pub account: Option<AccountId>,
    /// Staff account attached to the record (assessor, employee)
    pub staff: Option<AccountId>,
    /// Role of the record itself, for accounts
    pub role: Option<Role>,
    /// Shown in public directories
    pub listed: bool,
}

impl Owner {
    pub fn student(student: StudentId) -> Self {
        Self { student: Some(student), ..Default::default() }
    }

    pub fn employer(employer: EmployerId) -> Self {
        Self { employer: Some(employer), ..Default::default() }
    }

    pub fn account(account: AccountId) -> Self {
        Self { account: Some(account), ..Default::default() }
    }
}

/// Visible subset of an entity kind for one caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Nothing,
    /// Records the caller is a party to
    Party(Caller),
    /// Accounts holding one of the roles, plus the caller's own
    Roles(RoleSet, Caller),
    /// Listed directory entries, plus the caller's own
    Listed(Caller),
}

fn is_party(caller: &Caller, owner: &Owner) -> bool {
    let Some(account) = caller.account() else {
        return false;
    };

    if owner.account == Some(account) || owner.staff == Some(account) {
        return true;
    }
    match (caller.student(), caller.employer()) {
        (Some(student), _) if owner.student == Some(student) => true,
        (_, Some(employer)) if owner.employer == Some(employer) => true,
        _ => false,
    }
}

impl Scope {
    pub fn permits(&self, owner: &Owner) -> bool {
        match self {
            Scope::All => true,
            Scope::Nothing => false,
            Scope::Party(caller) => is_party(caller, owner),
            Scope::Roles(roles, caller) => {
                owner.role.map(|r| roles.contains(r)).unwrap_or(false) || is_party(caller, owner)
            }
            Scope::Listed(caller) => owner.listed || is_party(caller, owner),
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Scope::Nothing)
    }
}

/// Read scope of `kind` for `caller`
pub fn read_scope(caller: &Caller, kind: EntityKind) -> Scope {
    let read = rule(kind).read;

    match (caller, read) {
        (_, ReadRule::Public) => Scope::All,
        (Caller::Anonymous, _) => Scope::Nothing,
        (Caller::Admin { .. }, _) => Scope::All,
        (_, ReadRule::Authenticated) => Scope::All,
        (_, ReadRule::AdminOnly) => Scope::Nothing,
        (_, ReadRule::Directory) => Scope::Listed(*caller),
        (Caller::Instructor { .. }, ReadRule::Academic) => Scope::All,
        (Caller::Instructor { .. }, ReadRule::Accounts) => {
            Scope::Roles(RoleSet::STUDENT | RoleSet::INSTRUCTOR, *caller)
        }
        (_, ReadRule::Academic | ReadRule::Owned | ReadRule::Accounts) => Scope::Party(*caller),
    }
}

/// Records `caller` may update or delete among `kind`.
///
/// Admin reaches everything; instructors reach what they can read; students
/// and employers reach only records they are a party to, even on kinds that
/// are readable by every authenticated caller.
pub fn write_scope(caller: &Caller, kind: EntityKind) -> Scope {
    match caller {
        Caller::Anonymous => Scope::Nothing,
        Caller::Admin { .. } => Scope::All,
        Caller::Instructor { .. } => read_scope(caller, kind),
        Caller::Student { .. } | Caller::Employer { .. } => Scope::Party(*caller),
    }
}

/// A collection that has been through the scoper.
///
/// The constructor is crate-private: reporters and responses only ever see
/// records the caller is allowed to read.
#[derive(Debug, Clone)]
pub struct Scoped<T> {
    items: Vec<T>,
}

impl<T> Scoped<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Narrow further; still scoped
    pub fn filter(self, mut keep: impl FnMut(&T) -> bool) -> Self {
        Self {
            items: self.items.into_iter().filter(|item| keep(item)).collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Scoped<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
