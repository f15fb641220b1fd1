//! Download module for content downloading.
//!
//! This module provides:
//! - Batch download orchestration
//! - Download statistics

pub mod orchestrator;
pub mod state;

pub use orchestrator::DownloadOrchestrator;
pub use state::{BatchReport, DownloadFailure, GlobalState};
