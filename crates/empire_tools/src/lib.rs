//! # Empire Development Tools
//!
//! Command-line tools for development:
//! - Ruleset validation
//! - Scripted headless simulation
//! - Save game inspection

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod inspect;
pub mod simulate;
pub mod validate;

use std::path::Path;

use empire_core::error::{GameError, Result};
use serde::de::DeserializeOwned;

/// Read and parse a RON file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read and `DataParseError` if it is
/// not valid RON for `T`.
pub fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| GameError::Io {
        path: path.display().to_string(),
        source,
    })?;
    ron::from_str(&text).map_err(|e| GameError::DataParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
