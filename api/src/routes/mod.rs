//! API Routes

pub mod accounts;
pub mod certifications;
pub mod courses;
pub mod crud;
pub mod dashboard;
pub mod employers;
pub mod financials;
pub mod health;
pub mod index;
pub mod students;
