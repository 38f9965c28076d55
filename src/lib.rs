//! Scheduling and scoring engine for COPUS classroom observations.
//!
//! The observation workflow lives in [`workflows::observation`]; the CSV
//! interval-sheet importer in [`workflows::sheet`]. Everything else here is
//! service plumbing consumed by the binary.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
