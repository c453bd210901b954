//! Value Objects - typed identifiers and generated reference codes

use chrono::{Datelike, NaiveDate};
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::FieldErrors;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Account identifier (Value Object)
    AccountId
);
entity_id!(
    /// Student profile identifier (Value Object)
    StudentId
);
entity_id!(
    /// Instructor profile identifier (Value Object)
    InstructorId
);
entity_id!(
    /// Employer profile identifier (Value Object)
    EmployerId
);

/// Length of certificate verification codes
pub const VERIFICATION_CODE_LEN: usize = 32;

fn random_upper(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}

/// Unguessable public verification code for a certificate
pub fn verification_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_CODE_LEN)
        .map(char::from)
        .collect()
}

/// `STU2026AB12CD`
pub fn student_number(today: NaiveDate) -> String {
    format!("STU{}{}", today.year(), random_upper(6))
}

/// `EMP2026AB12CD`
pub fn employee_number(today: NaiveDate) -> String {
    format!("EMP{}{}", today.year(), random_upper(6))
}

/// `CERT-2026-AB12CD34`
pub fn certificate_number(today: NaiveDate) -> String {
    format!("CERT-{}-{}", today.year(), random_upper(8))
}

/// `INV-202610-AB12CD`
pub fn invoice_number(today: NaiveDate) -> String {
    format!("INV-{}{:02}-{}", today.year(), today.month(), random_upper(6))
}

/// `BGC-AB12CD34EF`
pub fn check_reference() -> String {
    format!("BGC-{}", random_upper(10))
}

/// Largest accepted monetary amount: ten digits, two of them decimal
pub const MAX_MONEY: Decimal = dec!(99999999.99);

/// Largest accepted hourly rate
pub const MAX_HOURLY_RATE: Decimal = dec!(999999.99);

fn check_amount(errors: &mut FieldErrors, field: &str, amount: Decimal, max: Decimal) {
    if amount.is_sign_negative() {
        errors.add(field, "may not be negative");
    } else if amount > max {
        errors.add(field, format!("must be at most {max}"));
    } else if amount.normalize().scale() > 2 {
        errors.add(field, "at most 2 decimal places");
    }
}

/// Non-negative currency amount bounded by [`MAX_MONEY`].
///
/// Every stored amount passes through here, so sums over a bounded
/// number of records cannot overflow `Decimal`.
pub fn check_money(errors: &mut FieldErrors, field: &str, amount: Decimal) {
    check_amount(errors, field, amount, MAX_MONEY);
}

pub fn check_rate(errors: &mut FieldErrors, field: &str, amount: Decimal) {
    check_amount(errors, field, amount, MAX_HOURLY_RATE);
}

/// Trimmed, lower-cased email; also the account username.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
