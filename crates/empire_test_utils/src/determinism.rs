//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the engine produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Save games, replays of command scripts and multi-host setups all rely
//! on the engine being fully deterministic. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`empire_core::math::Fixed`] throughout.
//!
//! - **`HashMap` iteration order**: Engine state only uses `BTreeMap` and
//!   `BTreeSet`, so encoded snapshots are byte-stable.
//!
//! - **System randomness**: The engine has none; camp placement comes from
//!   the config.


use empire_core::command::Command;
use empire_core::save::SaveGame;
use empire_core::Engine;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the engine was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Engine is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a setup-and-step loop multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of independent runs
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for i in 0..steps {
            step(&mut state, i);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Apply the same command script to `runs` fresh engines and compare the
/// final state hashes. Rejected commands are part of the script's outcome
/// and are ignored.
pub fn verify_script_determinism<F>(runs: usize, setup: F, script: &[Command]) -> DeterminismResult
where
    F: Fn() -> Engine,
{
    verify_determinism(
        runs,
        script.len() as u64,
        setup,
        |engine, i| {
            let command = usize::try_from(i).ok().and_then(|i| script.get(i));
            if let Some(command) = command {
                let _ = engine.apply(command.clone());
            }
        },
        Engine::state_hash,
    )
}

/// Compare two runs command by command, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(i)` if they differ after
/// applying `i` commands.
pub fn find_first_divergence<F>(setup: F, script: &[Command]) -> Option<usize>
where
    F: Fn() -> Engine,
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for (i, command) in script.iter().enumerate() {
        let a = first.apply(command.clone());
        let b = second.apply(command.clone());

        if a != b || first.state_hash() != second.state_hash() {
            tracing::warn!(step = i + 1, ?command, "Runs diverged");
            return Some(i + 1);
        }
    }

    None
}

/// Verify that a save round trip preserves engine state exactly.
///
/// Encodes the engine, decodes and restores it with the same ruleset and
/// config, and compares state hashes and derived values.
#[must_use]
pub fn verify_save_roundtrip(engine: &Engine) -> bool {
    let Ok(bytes) = engine.save_game().to_bytes() else {
        return false;
    };
    let Ok(save) = SaveGame::from_bytes(&bytes) else {
        return false;
    };
    let Ok(restored) = Engine::from_save(save, engine.ruleset().clone(), engine.config().clone())
    else {
        return false;
    };

    restored.state_hash() == engine.state_hash()
        && restored.ledger().capacity() == engine.ledger().capacity()
        && restored.bonuses() == engine.bonuses()
}
