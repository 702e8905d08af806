//! readiness-core: Progress tracking, assessment attempts, and alert filtering.
//!
//! This crate defines the data model, the persistence ports, and the state
//! machines (progress ledger, attempt governor) that the rest of readiness
//! builds on.

pub mod alerts;
pub mod eligibility;
pub mod error;
pub mod governor;
pub mod ledger;
pub mod model;
pub mod parser;
pub mod protocols;
pub mod statistics;
pub mod traits;

pub use error::{CoreError, StoreError};
