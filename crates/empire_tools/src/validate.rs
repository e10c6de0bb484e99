//! Ruleset validation.

use std::path::Path;

use empire_core::data::Ruleset;
use empire_core::error::Result;
use serde::Serialize;

/// Counts of what a valid ruleset defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RulesetSummary {
    /// Unit types.
    pub units: usize,
    /// Building types.
    pub buildings: usize,
    /// Technologies.
    pub technologies: usize,
    /// Camp advantages.
    pub advantages: usize,
}

impl RulesetSummary {
    /// Summarize a loaded ruleset.
    #[must_use]
    pub fn of(ruleset: &Ruleset) -> Self {
        let data = ruleset.to_data();
        Self {
            units: data.units.len(),
            buildings: data.buildings.len(),
            technologies: data.technologies.len(),
            advantages: data.advantages.len(),
        }
    }
}

/// Load a ruleset file and run every validation check on it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or lists every
/// validation problem found.
pub fn validate_ruleset_file(path: &Path) -> Result<RulesetSummary> {
    let ruleset = Ruleset::load(path)?;
    let summary = RulesetSummary::of(&ruleset);
    tracing::debug!(?summary, path = %path.display(), "Ruleset loaded");
    Ok(summary)
}
