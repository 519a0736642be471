//! Financial Report Orchestrator
//!
//! Turns a month of transactions and savings goals into a narrative report:
//! - Aggregates totals locally (deterministic, no provider involved)
//! - Renders the movement list in input order
//! - Composes a prompt document for the generation provider
//! - Extracts text from whichever response shape the provider returns
//! - Maps every outcome to a JSON response
//!
//! PIPELINE:
//! VALIDATE → AGGREGATE → FORMAT → PROMPT → GENERATE → RESPOND

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod formatter;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod provider;

pub use error::Result;

// Re-export common types
pub use aggregator::AggregateTotals;
pub use models::*;
pub use orchestrator::{ReportOrchestrator, ReportResponse};
