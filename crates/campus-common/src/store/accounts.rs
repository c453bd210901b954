//! Account lifecycle: registration, credentials, caller resolution

use chrono::Utc;
use tracing::{info, warn};

use super::{Record, Store, Tables};
use crate::domain::*;
use crate::error::{CampusError, CampusResult};
use crate::identity::{Caller, Role};
use crate::password::{hash_password, verify_absent, verify_password, MIN_PASSWORD_LEN};

fn invalid_credentials() -> CampusError {
    CampusError::AuthFailed("invalid credentials".into())
}

/// Builds the per-request caller for an account, attaching its profile
fn caller_for(db: &Tables, account: &Account) -> Caller {
    let id = account.id;
    match account.role {
        Role::Admin => Caller::Admin { account: id },
        Role::Instructor => Caller::Instructor {
            account: id,
            profile: db.instructors.values().find(|p| p.user == id).map(|p| p.id),
        },
        Role::Student => Caller::Student {
            account: id,
            profile: db.students.values().find(|p| p.user == id).map(|p| p.id),
        },
        Role::Employer => Caller::Employer {
            account: id,
            profile: db.employers.values().find(|p| p.user == id).map(|p| p.id),
        },
    }
}

impl Store {
    /// Self-service registration; creates the role profile with the account
    pub fn register(&self, registration: Registration) -> CampusResult<Account> {
        registration.validate()?;
        let password_hash = hash_password(&registration.password)?;
        let now = Utc::now();

        let mut db = self.db.write();
        if db.account_by_email(&registration.email).is_some() {
            return Err(CampusError::Conflict("an account with this email already exists".into()));
        }

        let mut account = Account::new(
            &registration.email,
            registration.role,
            &registration.first_name,
            &registration.last_name,
            password_hash,
            now,
        );
        account.phone = registration.phone;

        match account.role {
            Role::Student => {
                let profile = StudentProfile::for_account(account.id, now);
                db.students.insert(profile.id.0, profile);
            }
            Role::Instructor => {
                let profile = InstructorProfile::for_account(account.id, now);
                db.instructors.insert(profile.id.0, profile);
            }
            Role::Employer => {
                let company = registration
                    .company_name
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| account.full_name());
                let profile = EmployerProfile::for_account(account.id, company, now);
                db.employers.insert(profile.id.0, profile);
            }
            Role::Admin => {}
        }

        db.accounts.insert(account.id(), account.clone());
        info!(account = %account.id, role = %account.role, "account registered");
        Ok(account)
    }

    /// Checks credentials; unknown email, wrong password and inactive
    /// accounts all fail the same way
    pub fn authenticate(&self, email: &str, password: &str) -> CampusResult<Account> {
        let found = self.db.read().account_by_email(email).cloned();
        let Some(account) = found else {
            verify_absent(password);
            warn!("login for unknown email rejected");
            return Err(invalid_credentials());
        };

        if !verify_password(&account.password_hash, password) {
            warn!(account = %account.id, "login rejected");
            return Err(invalid_credentials());
        }
        if !account.is_active {
            warn!(account = %account.id, "login to inactive account");
            return Err(invalid_credentials());
        }
        Ok(account)
    }

    /// Resolves a token subject to a caller; deleted or deactivated
    /// accounts no longer authenticate
    pub fn caller(&self, account: AccountId) -> CampusResult<Caller> {
        let db = self.db.read();
        let record = db
            .accounts
            .get(&account.0)
            .filter(|a| a.is_active)
            .ok_or_else(|| CampusError::AuthFailed("account is not active".into()))?;
        Ok(caller_for(&db, record))
    }

    /// The caller's own account
    pub fn me(&self, caller: &Caller) -> CampusResult<Account> {
        let account = caller
            .account()
            .ok_or_else(|| CampusError::AuthFailed("authentication required".into()))?;
        self.db
            .read()
            .accounts
            .get(&account.0)
            .cloned()
            .ok_or(CampusError::NotFound)
    }

    /// Self-service profile edit
    pub fn update_profile(&self, caller: &Caller, update: ProfileUpdate) -> CampusResult<Account> {
        let account = caller
            .account()
            .ok_or_else(|| CampusError::AuthFailed("authentication required".into()))?;
        let mut db = self.db.write();
        let mut record = db.accounts.get(&account.0).cloned().ok_or(CampusError::NotFound)?;
        update.apply(&mut record, Utc::now())?;
        db.accounts.insert(account.0, record.clone());
        info!(%account, "profile updated");
        Ok(record)
    }

    /// Creates the bootstrap admin unless an account with the email exists.
    /// Returns whether an account was created.
    pub fn ensure_admin(&self, email: &str, password: &str) -> CampusResult<bool> {
        if !is_valid_email(&normalize_email(email)) {
            return Err(CampusError::invalid("email", "enter a valid email address"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CampusError::invalid("password", "password must be at least 8 characters"));
        }
        if self.db.read().account_by_email(email).is_some() {
            return Ok(false);
        }

        let password_hash = hash_password(password)?;
        let mut db = self.db.write();
        if db.account_by_email(email).is_some() {
            return Ok(false);
        }
        let mut account = Account::new(email, Role::Admin, "Campus", "Administrator", password_hash, Utc::now());
        account.is_verified = true;
        db.accounts.insert(account.id(), account.clone());
        info!(account = %account.id, "bootstrap admin created");
        Ok(true)
    }
}
