//! Campus Common - domain model and access policy for the school
//! administration service
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        campus-common                             │
//! │                                                                  │
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────────────────┐  │
//! │  │  identity  │──▶│    policy    │──▶│  store (one RwLock)    │  │
//! │  │ Role/Caller│   │ table, scope │   │  Tables, Record,       │  │
//! │  └────────────┘   │ gatekeeper   │   │  Resource, Stateful    │  │
//! │                   └──────────────┘   └───────────┬────────────┘  │
//! │  ┌────────────────────────────────┐              │ Scoped<T>     │
//! │  │ domain: accounts, courses,     │              ▼               │
//! │  │ students, employers,           │   ┌────────────────────────┐ │
//! │  │ certifications, financials     │   │  reports (aggregation) │ │
//! │  └────────────────────────────────┘   └────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read goes through the scoper and produces a [`Scoped`] collection;
//! reporters only accept scoped collections, so aggregates can never see
//! records the caller is not allowed to read.

#![warn(clippy::all)]

pub mod domain;
pub mod error;
pub mod identity;
pub mod password;
pub mod policy;
pub mod reports;
pub mod store;

pub use domain::*;
pub use error::*;
pub use identity::{Caller, Role};
pub use policy::{EntityKind, Scoped, Transition};
pub use store::{Filter, Record, Resource, Stateful, Store, Tables, TransitionOutcome};
