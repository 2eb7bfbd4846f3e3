//! Follow-up contact workflow engine for clinical study recruitment.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
