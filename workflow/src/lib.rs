//! Verification status rules shared by the repositories and the API crates.
//!
//! Nothing in here touches storage: callers load the current state, ask for a
//! decision and persist the result.

pub mod access;
pub mod transition;
