//! Core business logic for Lavo.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `cash` - Cash movements, reconciliation and closure planning
//! - `clock` - Time source injected into the persistence layer

pub mod cash;
pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};
