//! Risk-aware reroute advisory core.
//!
//! Candidate routes are scored against a multi-source risk picture, compared
//! with the shipment's current route, explained, and gated behind approval
//! policy before a recommendation is emitted to the surrounding system.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
