//! In-process record store
//!
//! All tables live behind one `parking_lot::RwLock`. Every mutating
//! operation runs under a single write guard, so multi-row effects (such as
//! background check approval verifying its account) are never observed half
//! applied.

mod accounts;
mod cascade;
pub mod dynamic;
pub mod filter;
mod reporting;

pub use filter::Filter;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tracing::info;
use uuid::Uuid;

use crate::domain::*;
use crate::error::{CampusError, CampusResult};
use crate::identity::Caller;
use crate::policy::{self, Action, EntityKind, Owner, Scoped, Transition};

/// Rows of one kind, keyed by id
pub type Table<T> = HashMap<Uuid, T>;

/// Every table in the store
#[derive(Debug, Default)]
pub struct Tables {
    pub accounts: Table<Account>,
    pub background_checks: Table<BackgroundCheck>,
    pub categories: Table<CourseCategory>,
    pub courses: Table<Course>,
    pub modules: Table<CourseModule>,
    pub instructors: Table<InstructorProfile>,
    pub assessments: Table<Assessment>,
    pub students: Table<StudentProfile>,
    pub enrollments: Table<Enrollment>,
    pub attendance: Table<Attendance>,
    pub results: Table<AssessmentResult>,
    pub progress_reports: Table<ProgressReport>,
    pub placements: Table<Placement>,
    pub employers: Table<EmployerProfile>,
    pub postings: Table<JobPosting>,
    pub applications: Table<JobApplication>,
    pub rehire_requests: Table<RehireRequest>,
    pub feedback: Table<EmployerFeedback>,
    pub certificates: Table<Certificate>,
    pub competency_assessments: Table<CompetencyAssessment>,
    pub tuition_fees: Table<TuitionFee>,
    pub payments: Table<Payment>,
    pub placement_fees: Table<PlacementFee>,
    pub payroll: Table<Payroll>,
    pub expenses: Table<Expense>,
    pub invoices: Table<Invoice>,
    pub financial_reports: Table<FinancialReport>,
}

impl Tables {
    /// Any role profile linked to the account
    pub fn has_profile(&self, account: AccountId) -> bool {
        self.students.values().any(|p| p.user == account)
            || self.instructors.values().any(|p| p.user == account)
            || self.employers.values().any(|p| p.user == account)
    }

    pub fn account_by_email(&self, email: &str) -> Option<&Account> {
        let email = normalize_email(email);
        self.accounts.values().find(|a| a.email == email)
    }
}

/// A stored record kind.
pub trait Record: Clone + Serialize + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    fn table(db: &Tables) -> &Table<Self>;

    fn table_mut(db: &mut Tables) -> &mut Table<Self>;

    /// Parties the record belongs to, for scoping
    fn owner(&self, db: &Tables) -> Owner;

    /// List filter support; unsupported filter fields are ignored
    fn matches(&self, _filter: &Filter, _db: &Tables) -> bool {
        true
    }

    /// Referential and uniqueness checks before a write
    fn check(&self, _db: &Tables) -> CampusResult<()> {
        Ok(())
    }

    /// Listing order; newest first unless a kind says otherwise
    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    }
}

/// Inputs available while building or changing a record
pub struct WriteContext<'a> {
    pub caller: &'a Caller,
    pub db: &'a Tables,
    pub now: DateTime<Utc>,
}

impl WriteContext<'_> {
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Caller's account, for audit fields
    pub fn account(&self) -> Option<AccountId> {
        self.caller.account()
    }
}

/// A record kind exposed for create and update.
///
/// The same input shape serves both; owner fields are forced from the
/// caller where the kind requires it.
pub trait Resource: Record {
    type Input: DeserializeOwned + Send + 'static;

    /// Runs before the store lock is taken; slow input work goes here
    fn prepare(input: Self::Input) -> CampusResult<Self::Input> {
        Ok(input)
    }

    fn create(input: Self::Input, ctx: &WriteContext<'_>) -> CampusResult<Self>;

    fn update(&mut self, input: Self::Input, ctx: &WriteContext<'_>) -> CampusResult<()>;
}

/// A record kind with named state transitions
pub trait Stateful: Record {
    type Status: Copy + PartialEq + fmt::Display;

    fn status(&self) -> Self::Status;

    /// State a transition leads to, if the kind supports it
    fn target(transition: Transition) -> Option<Self::Status>;

    /// Whether a transition may start from `from`
    fn can_leave(from: Self::Status) -> bool;

    fn enter(&mut self, to: Self::Status, ctx: &WriteContext<'_>);

    /// Writes to other rows, under the same guard
    fn side_effect(&self, _db: &mut Tables) {}
}

/// Result of a transition request
#[derive(Debug, Clone)]
pub struct TransitionOutcome<T> {
    pub record: T,
    /// False when the record was already in the target state
    pub changed: bool,
}

pub(crate) fn exists<T: Record>(db: &Tables, id: Uuid) -> bool {
    T::table(db).contains_key(&id)
}

/// Conflict when another row of the kind satisfies `same`
pub(crate) fn ensure_unique<T: Record>(
    db: &Tables,
    this: &T,
    message: &str,
    same: impl Fn(&T) -> bool,
) -> CampusResult<()> {
    let id = this.id();
    if T::table(db).values().any(|other| other.id() != id && same(other)) {
        Err(CampusError::Conflict(message.to_string()))
    } else {
        Ok(())
    }
}

fn ensure_readable(caller: &Caller, kind: EntityKind) -> CampusResult<()> {
    if caller.is_anonymous() && policy::requires_authentication(kind) {
        Err(CampusError::AuthFailed("authentication required".into()))
    } else {
        Ok(())
    }
}

/// Scoped, filtered, ordered rows of `T`
pub(crate) fn scoped<T: Record>(caller: &Caller, db: &Tables, filter: &Filter) -> Scoped<T> {
    let scope = policy::read_scope(caller, T::KIND);
    if scope.is_nothing() {
        return Scoped::new(Vec::new());
    }
    let mut items: Vec<T> = T::table(db)
        .values()
        .filter(|r| scope.permits(&r.owner(db)) && r.matches(filter, db))
        .cloned()
        .collect();
    items.sort_by(T::ordering);
    Scoped::new(items)
}

/// One row of `T` inside the caller's read scope
pub(crate) fn visible<T: Record>(caller: &Caller, db: &Tables, id: Uuid) -> CampusResult<T> {
    let scope = policy::read_scope(caller, T::KIND);
    T::table(db)
        .get(&id)
        .filter(|r| scope.permits(&r.owner(db)))
        .cloned()
        .ok_or(CampusError::NotFound)
}

fn writable<T: Record>(caller: &Caller, db: &Tables, id: Uuid) -> CampusResult<T> {
    let scope = policy::write_scope(caller, T::KIND);
    T::table(db)
        .get(&id)
        .filter(|r| scope.permits(&r.owner(db)))
        .cloned()
        .ok_or(CampusError::NotFound)
}

/// The record store
#[derive(Debug, Default)]
pub struct Store {
    db: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scoped list of `T`
    pub fn list<T: Record>(&self, caller: &Caller, filter: &Filter) -> CampusResult<Scoped<T>> {
        ensure_readable(caller, T::KIND)?;
        let db = self.db.read();
        Ok(scoped(caller, &db, filter))
    }

    /// One `T`; missing and out-of-scope are both not-found
    pub fn get<T: Record>(&self, caller: &Caller, id: Uuid) -> CampusResult<T> {
        ensure_readable(caller, T::KIND)?;
        let db = self.db.read();
        visible(caller, &db, id)
    }

    /// Children of a visible parent
    pub fn list_under<P: Record, C: Record>(
        &self,
        caller: &Caller,
        parent: Uuid,
        filter: &Filter,
    ) -> CampusResult<Scoped<C>> {
        ensure_readable(caller, P::KIND)?;
        ensure_readable(caller, C::KIND)?;
        let db = self.db.read();
        visible::<P>(caller, &db, parent)?;
        Ok(scoped(caller, &db, filter))
    }

    pub fn create<T: Resource>(&self, caller: &Caller, input: T::Input) -> CampusResult<T> {
        policy::authorize(caller, T::KIND, Action::Create)?;
        let input = T::prepare(input)?;
        let mut db = self.db.write();

        let ctx = WriteContext { caller, db: &db, now: Utc::now() };
        let record = T::create(input, &ctx)?;
        record.check(&db)?;
        if !policy::write_scope(caller, T::KIND).permits(&record.owner(&db)) {
            tracing::warn!(entity = %T::KIND, "create outside caller's scope");
            return Err(CampusError::PermissionDenied);
        }

        T::table_mut(&mut db).insert(record.id(), record.clone());
        info!(entity = %T::KIND, id = %record.id(), "created");
        Ok(record)
    }

    pub fn update<T: Resource>(&self, caller: &Caller, id: Uuid, input: T::Input) -> CampusResult<T> {
        policy::authorize(caller, T::KIND, Action::Update)?;
        let input = T::prepare(input)?;
        let mut db = self.db.write();
        let mut record = writable::<T>(caller, &db, id)?;

        let ctx = WriteContext { caller, db: &db, now: Utc::now() };
        record.update(input, &ctx)?;
        record.check(&db)?;
        if !policy::write_scope(caller, T::KIND).permits(&record.owner(&db)) {
            tracing::warn!(entity = %T::KIND, %id, "update would move record out of caller's scope");
            return Err(CampusError::PermissionDenied);
        }

        T::table_mut(&mut db).insert(id, record.clone());
        info!(entity = %T::KIND, %id, "updated");
        Ok(record)
    }

    /// Delete a record and everything that hangs off it
    pub fn delete<T: Record>(&self, caller: &Caller, id: Uuid) -> CampusResult<()> {
        policy::authorize(caller, T::KIND, Action::Delete)?;
        let mut db = self.db.write();
        writable::<T>(caller, &db, id)?;
        cascade::remove(&mut db, T::KIND, id)?;
        info!(entity = %T::KIND, %id, "deleted");
        Ok(())
    }

    /// Run a named transition.
    ///
    /// A record already in the target state is returned unchanged and its
    /// side effect is not re-applied.
    pub fn transition<T: Stateful>(
        &self,
        caller: &Caller,
        id: Uuid,
        transition: Transition,
    ) -> CampusResult<TransitionOutcome<T>> {
        let target = T::target(transition).ok_or_else(|| {
            CampusError::invalid(
                "transition",
                format!("{} does not support {}", T::KIND.label(), transition),
            )
        })?;
        policy::authorize_transition(caller, T::KIND, transition)?;

        let mut db = self.db.write();
        let mut record = writable::<T>(caller, &db, id)?;

        let from = record.status();
        if from == target {
            info!(entity = %T::KIND, %id, %transition, "already {}", target);
            return Ok(TransitionOutcome { record, changed: false });
        }
        if !T::can_leave(from) {
            return Err(CampusError::InvalidTransition {
                entity: T::KIND.label(),
                transition: transition.slug(),
                from: from.to_string(),
            });
        }

        let ctx = WriteContext { caller, db: &db, now: Utc::now() };
        record.enter(target, &ctx);
        record.side_effect(&mut db);
        T::table_mut(&mut db).insert(id, record.clone());

        info!(entity = %T::KIND, %id, %transition, %from, to = %target, "transition applied");
        Ok(TransitionOutcome { record, changed: true })
    }

    /// Student applies to a job posting
    pub fn apply(&self, caller: &Caller, posting: Uuid, input: ApplyInput) -> CampusResult<JobApplication> {
        ensure_readable(caller, EntityKind::JobPosting)?;
        let Caller::Student { profile, .. } = *caller else {
            tracing::warn!(role = ?caller.role(), "apply denied");
            return Err(CampusError::PermissionDenied);
        };
        let student = profile
            .ok_or_else(|| CampusError::invalid("student", "a student profile is required"))?;

        let mut db = self.db.write();
        let posting = visible::<JobPosting>(caller, &db, posting)?;
        if posting.status != PostingStatus::Active {
            return Err(CampusError::invalid("posting", "this posting is not accepting applications"));
        }

        let application = JobApplication::submit(posting.id, student, input.cover_letter, Utc::now());
        application.check(&db)?;
        db.applications.insert(application.id, application.clone());
        info!(posting = %posting.id, %student, "application submitted");
        Ok(application)
    }

    /// Public certificate lookup by verification code
    pub fn verify_certificate(&self, code: &str) -> CampusResult<CertificateVerification> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CampusError::invalid("code", "a verification code is required"));
        }
        let db = self.db.read();
        let certificate = db
            .certificates
            .values()
            .find(|c| c.verification_code == code)
            .ok_or(CampusError::NotFound)?;
        Ok(CertificateVerification::of(certificate, &db, Utc::now().date_naive()))
    }
}

#[cfg(test)]
pub(crate) mod tests;
