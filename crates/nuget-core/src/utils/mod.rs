//! Utility functions for common operations.

pub mod filename;
pub mod text;

pub use filename::{nupkg_file_name, nupkg_file_name_for};
pub use text::contains_any;
