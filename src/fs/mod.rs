//! Filesystem module.
//!
//! Provides:
//! - Per-year download directories
//! - Safe target filenames

pub mod naming;
pub mod paths;

pub use naming::{sanitize_filename, target_path};
pub use paths::{create_year_directory, ensure_dir, year_directory};
