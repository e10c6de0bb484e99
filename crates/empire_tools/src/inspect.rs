//! Save game inspection.

use std::path::Path;

use empire_core::error::{GameError, Result};
use empire_core::save::SaveGame;

/// Load a save file and render it as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the save cannot be loaded or rendered.
pub fn inspect_save(path: &Path) -> Result<String> {
    let save = SaveGame::load(path)?;
    tracing::debug!(turn = save.turn, version = save.version, "Save loaded");
    serde_json::to_string_pretty(&save)
        .map_err(|e| GameError::Serialization(format!("Failed to render save as JSON: {e}")))
}
