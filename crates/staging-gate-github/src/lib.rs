//! Shared helpers for the staging deploy gate.
//! This crate provides GitHub transport helpers, workflow-run models, and the
//! active-run filter consumed by the polling runtime.

pub mod active_runs;
pub mod github_transport_helpers;
pub mod workflow_runs;
