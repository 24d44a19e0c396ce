//! Investigation lifecycle engine and workflow orchestration.
//!
//! The [`engine::InvestigationEngine`] runs one investigation through plan,
//! collect, process, analyze, report and evaluate, consulting a
//! [`gateway::ReasoningGateway`] and a [`tool::ToolRegistry`] and recording
//! every step in an [`audit::AuditLog`]. The [`workflow::Orchestrator`]
//! drives many investigations as one-time, scheduled or continuous
//! workflows and multi-target campaigns, raising alerts on the results.

pub mod audit;
pub mod bundle;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod intel;
pub mod investigation;
pub mod io;
pub mod paths;
pub mod tool;
pub mod types;
pub mod workflow;

pub(crate) mod lenient;

#[cfg(test)]
mod testing;

pub use error::{OsintError, Result};
