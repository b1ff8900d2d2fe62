//! Medic library crate
//!
//! Exposes the diagnostic pipeline so integration tooling can drive
//! analysis, sandboxed runs, and remediation without going through
//! CLI startup.

pub mod analysis;
pub mod fixer;
pub mod report;
pub mod sandbox;
pub mod score;
pub mod session;
pub mod util;
