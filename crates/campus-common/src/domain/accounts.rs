//! Accounts and background checks

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::value_objects::{check_reference, is_valid_email, normalize_email, AccountId};
use crate::error::{CampusError, CampusResult, FieldErrors};
use crate::identity::Role;
use crate::password::{hash_password, MIN_PASSWORD_LEN};
use crate::policy::{EntityKind, Owner, Transition};
use crate::store::{ensure_unique, exists, Filter, Record, Resource, Stateful, Table, Tables, WriteContext};

/// Login identity.
///
/// `username` always equals the normalized email.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_verified: bool,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub(crate) fn new(
        email: &str,
        role: Role,
        first_name: &str,
        last_name: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        let email = normalize_email(email);
        Self {
            id: AccountId::new(),
            username: email.clone(),
            email,
            role,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            phone: None,
            address: None,
            date_of_birth: None,
            is_verified: false,
            is_active: true,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    fn set_email(&mut self, email: &str) {
        self.email = normalize_email(email);
        self.username = self.email.clone();
    }
}

/// Admin create/update body for accounts
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInput {
    pub email: String,
    /// Required on create; unchanged when absent on update
    pub password: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    /// Filled from `password` before the store is locked
    #[serde(skip)]
    pub(crate) password_hash: Option<String>,
}

fn check_identity(errors: &mut FieldErrors, email: &str, first_name: &str, last_name: &str) {
    errors.check(!is_valid_email(&normalize_email(email)), "email", "enter a valid email address");
    errors.check(first_name.trim().is_empty(), "first_name", "this field is required");
    errors.check(last_name.trim().is_empty(), "last_name", "this field is required");
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    errors.check(
        password.chars().count() < MIN_PASSWORD_LEN,
        "password",
        "password must be at least 8 characters",
    );
}

/// Self-service registration
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[schema(value_type = String, example = "student")]
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
    /// Employer registrations only
    pub company_name: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        check_identity(&mut errors, &self.email, &self.first_name, &self.last_name);
        check_password(&mut errors, &self.password);
        errors.check(self.password != self.password_confirm, "password_confirm", "passwords do not match");
        errors.check(self.role == Role::Admin, "role", "admin accounts cannot self-register");
        errors.into_result()
    }
}

/// Fields a caller may change on their own account
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl ProfileUpdate {
    pub(crate) fn apply(self, account: &mut Account, now: DateTime<Utc>) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(first) = self.first_name {
            errors.check(first.trim().is_empty(), "first_name", "may not be blank");
            account.first_name = first.trim().to_string();
        }
        if let Some(last) = self.last_name {
            errors.check(last.trim().is_empty(), "last_name", "may not be blank");
            account.last_name = last.trim().to_string();
        }
        if self.phone.is_some() {
            account.phone = self.phone;
        }
        if self.address.is_some() {
            account.address = self.address;
        }
        if self.date_of_birth.is_some() {
            account.date_of_birth = self.date_of_birth;
        }
        errors.into_result()?;
        account.updated_at = now;
        Ok(())
    }
}

impl Record for Account {
    const KIND: EntityKind = EntityKind::Account;

    fn id(&self) -> Uuid {
        self.id.0
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.accounts
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.accounts
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner {
            role: Some(self.role),
            ..Owner::account(self.id)
        }
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.first_name, &self.last_name, &self.email])
            && filter.kind_is(self.role.as_str())
            && filter.status_is(if self.is_active { "active" } else { "inactive" })
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        ensure_unique(db, self, "a user with this email already exists", |other| {
            other.email == self.email
        })
    }
}

impl Resource for Account {
    type Input = AccountInput;

    /// Hashes the password outside the write lock
    fn prepare(mut input: AccountInput) -> CampusResult<AccountInput> {
        if let Some(password) = input.password.take() {
            let mut errors = FieldErrors::new();
            check_password(&mut errors, &password);
            errors.into_result()?;
            input.password_hash = Some(hash_password(&password)?);
        }
        Ok(input)
    }

    fn create(input: AccountInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let mut errors = FieldErrors::new();
        check_identity(&mut errors, &input.email, &input.first_name, &input.last_name);
        errors.check(input.password_hash.is_none(), "password", "this field is required");
        errors.into_result()?;

        let hash = input.password_hash.unwrap_or_default();
        let mut account = Account::new(
            &input.email,
            input.role,
            &input.first_name,
            &input.last_name,
            hash,
            ctx.now,
        );
        account.phone = input.phone;
        account.address = input.address;
        account.date_of_birth = input.date_of_birth;
        account.is_active = input.is_active.unwrap_or(true);
        account.is_verified = input.is_verified.unwrap_or(false);
        Ok(account)
    }

    fn update(&mut self, input: AccountInput, ctx: &WriteContext<'_>) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        check_identity(&mut errors, &input.email, &input.first_name, &input.last_name);
        errors.check(
            input.role != self.role && ctx.db.has_profile(self.id),
            "role",
            "role cannot change while a profile is attached",
        );
        errors.into_result()?;

        if let Some(hash) = input.password_hash {
            self.password_hash = hash;
        }
        self.set_email(&input.email);
        self.role = input.role;
        self.first_name = input.first_name.trim().to_string();
        self.last_name = input.last_name.trim().to_string();
        self.phone = input.phone;
        self.address = input.address;
        self.date_of_birth = input.date_of_birth;
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        if let Some(verified) = input.is_verified {
            self.is_verified = verified;
        }
        self.updated_at = ctx.now;
        Ok(())
    }
}

labelled_enum! {
    /// Background check lifecycle
    pub enum CheckStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Passed => "passed",
        Failed => "failed",
        Expired => "expired",
    }
    default = Pending
}

labelled_enum! {
    pub enum CheckType {
        Criminal => "criminal",
        Employment => "employment",
        Education => "education",
        Reference => "reference",
        DrugScreening => "drug_screening",
    }
    default = Criminal
}

/// Screening record owned by an account
#[derive(Debug, Clone, Serialize)]
pub struct BackgroundCheck {
    pub id: Uuid,
    pub user: AccountId,
    pub check_type: CheckType,
    pub status: CheckStatus,
    pub reference_number: String,
    pub provider: Option<String>,
    pub notes: Option<String>,
    pub expires_on: Option<NaiveDate>,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackgroundCheckInput {
    /// Ignored for non-admin callers, who always submit for themselves
    pub user: Option<AccountId>,
    pub check_type: Option<CheckType>,
    pub reference_number: Option<String>,
    pub provider: Option<String>,
    pub notes: Option<String>,
    pub expires_on: Option<NaiveDate>,
    pub status: Option<CheckStatus>,
}

/// Statuses reachable only through approve/reject
fn check_status_is_decision(status: CheckStatus) -> bool {
    matches!(status, CheckStatus::Passed | CheckStatus::Failed)
}

impl Record for BackgroundCheck {
    const KIND: EntityKind = EntityKind::BackgroundCheck;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn table(db: &Tables) -> &Table<Self> {
        &db.background_checks
    }

    fn table_mut(db: &mut Tables) -> &mut Table<Self> {
        &mut db.background_checks
    }

    fn owner(&self, _db: &Tables) -> Owner {
        Owner::account(self.user)
    }

    fn matches(&self, filter: &Filter, _db: &Tables) -> bool {
        filter.text(&[&self.reference_number, self.provider.as_deref().unwrap_or_default()])
            && filter.status_is(self.status.as_str())
            && filter.kind_is(self.check_type.as_str())
    }

    fn check(&self, db: &Tables) -> CampusResult<()> {
        let mut errors = FieldErrors::new();
        errors.check(!exists::<Account>(db, self.user.0), "user", "user does not exist");
        errors.into_result()?;
        ensure_unique(db, self, "a background check with this reference number already exists", |o| {
            o.reference_number == self.reference_number
        })
    }
}

impl Resource for BackgroundCheck {
    type Input = BackgroundCheckInput;

    fn create(input: BackgroundCheckInput, ctx: &WriteContext<'_>) -> CampusResult<Self> {
        let user = if ctx.caller.is_admin() {
            input.user.or(ctx.account())
        } else {
            ctx.account()
        };
        let user = user.ok_or_else(|| CampusError::invalid("user", "this field is required"))?;

        let status = match input.status {
            Some(status) if ctx.caller.is_admin() => status,
            _ => CheckStatus::Pending,
        };
        if check_status_is_decision(status) {
            return Err(CampusError::invalid("status", "use the approve or reject action"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user,
            check_type: input.check_type.unwrap_or_default(),
            status,
            reference_number: input
                .reference_number
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(check_reference),
            provider: input.provider,
            notes: input.notes,
            expires_on: input.expires_on,
            submitted_at: ctx.now,
            completed_at: None,
            created_at: ctx.now,
        })
    }

    fn update(&mut self, input: BackgroundCheckInput, _ctx: &WriteContext<'_>) -> CampusResult<()> {
        if let Some(status) = input.status {
            if status != self.status && check_status_is_decision(status) {
                return Err(CampusError::invalid("status", "use the approve or reject action"));
            }
            self.status = status;
        }
        if let Some(user) = input.user {
            self.user = user;
        }
        if let Some(check_type) = input.check_type {
            self.check_type = check_type;
        }
        if let Some(reference) = input.reference_number.filter(|r| !r.trim().is_empty()) {
            self.reference_number = reference;
        }
        self.provider = input.provider;
        self.notes = input.notes;
        self.expires_on = input.expires_on;
        Ok(())
    }
}

impl Stateful for BackgroundCheck {
    type Status = CheckStatus;

    fn status(&self) -> CheckStatus {
        self.status
    }

    fn target(transition: Transition) -> Option<CheckStatus> {
        match transition {
            Transition::Approve => Some(CheckStatus::Passed),
            Transition::Reject => Some(CheckStatus::Failed),
            _ => None,
        }
    }

    fn can_leave(from: CheckStatus) -> bool {
        matches!(from, CheckStatus::Pending | CheckStatus::InProgress | CheckStatus::Expired)
    }

    fn enter(&mut self, to: CheckStatus, ctx: &WriteContext<'_>) {
        self.status = to;
        self.completed_at = Some(ctx.now);
    }

    fn side_effect(&self, db: &mut Tables) {
        if self.status == CheckStatus::Passed {
            if let Some(account) = db.accounts.get_mut(&self.user.0) {
                account.is_verified = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            email: "Ada@Example.com".into(),
            password: "s3cret-pass".into(),
            password_confirm: "s3cret-pass".into(),
            role: Role::Student,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone: None,
            company_name: None,
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(registration().validate().is_ok());

        let mismatch = Registration { password_confirm: "other-pass".into(), ..registration() };
        match mismatch.validate() {
            Err(CampusError::Validation(errors)) => assert!(errors.get("password_confirm").is_some()),
            other => panic!("unexpected {:?}", other),
        }

        let admin = Registration { role: Role::Admin, ..registration() };
        assert!(admin.validate().is_err());

        let short = Registration {
            password: "short".into(),
            password_confirm: "short".into(),
            ..registration()
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_username_follows_email() {
        let mut account = Account::new(" Ada@Example.com", Role::Student, "Ada", "L", String::new(), Utc::now());
        assert_eq!(account.username, "ada@example.com");
        assert_eq!(account.username, account.email);

        account.set_email("ada.l@example.com");
        assert_eq!(account.username, "ada.l@example.com");
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let account = Account::new("a@b.io", Role::Admin, "A", "B", "$argon2id$secret".into(), Utc::now());
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_check_transitions() {
        assert_eq!(BackgroundCheck::target(Transition::Approve), Some(CheckStatus::Passed));
        assert_eq!(BackgroundCheck::target(Transition::MarkPaid), None);
        assert!(BackgroundCheck::can_leave(CheckStatus::InProgress));
        assert!(!BackgroundCheck::can_leave(CheckStatus::Failed));
    }
}
