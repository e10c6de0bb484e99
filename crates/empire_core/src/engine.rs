//! The empire simulation context.
//!
//! [`Engine`] owns all mutable game state and is the only way to change it.
//! Start operations validate and pay up front, so a rejected command leaves
//! the engine exactly as it was. [`Engine::tick`] never fails.
//!
//! Per tick the three queues advance in a fixed order (construction,
//! training, research), then production runs with the bonus vector as it
//! stands after any research that just completed.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use tracing::{debug, info, warn};

use crate::buildings::Buildings;
use crate::combat::{self, AttackPreview, CombatReport, Outcome};
use crate::command::{Command, CommandOutcome};
use crate::config::EngineConfig;
use crate::data::{BuildingKind, BuildingRequirement, Ruleset, TechKey, UnitKind};
use crate::error::{CommandError, CommandResult, GameError, Result};
use crate::events::GameEvent;
use crate::map::{Camp, Cell, Coord, GameMap};
use crate::math::{ratio, Fixed};
use crate::queue::{JobPayload, JobQueue, QueueEntry, QueueKind};
use crate::resources::{Cost, ResourceDelta, ResourceKind, ResourceLedger};
use crate::save::{SaveGame, SAVE_VERSION};
use crate::technology::{BonusVector, TechTree};
use crate::units::UnitCounts;

/// Production rates are per minute; ticks are in seconds.
const SECONDS_PER_MINUTE: i32 = 60;

/// A single empire and the world around it.
#[derive(Debug, Clone)]
pub struct Engine {
    ruleset: Ruleset,
    config: EngineConfig,
    turn: u64,
    ledger: ResourceLedger,
    buildings: Buildings,
    units: UnitCounts,
    tech: TechTree,
    map: GameMap,
    construction: JobQueue,
    training: JobQueue,
    research: JobQueue,
    reports: VecDeque<CombatReport>,
    events: Vec<GameEvent>,
}

impl Engine {
    /// Create a new game from the configured starting state.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] for an empty map and
    /// [`GameError::Validation`] listing every bad starting building, camp
    /// or technology.
    pub fn new(ruleset: Ruleset, config: EngineConfig) -> Result<Self> {
        let start = config.start.clone();
        check_map_size(start.map_width, start.map_height)?;

        let mut errors = Vec::new();
        let mut map = GameMap::new(start.map_width, start.map_height);
        let mut buildings = Buildings::new();
        for b in &start.buildings {
            let max_level = ruleset.building(b.kind).max_level;
            if buildings.get(b.kind).is_some() {
                errors.push(format!("{} placed more than once", b.kind));
            } else if b.level == 0 || b.level > max_level {
                errors.push(format!("{} level {} is outside 1..={max_level}", b.kind, b.level));
            } else if map.cell(b.position) != Some(Cell::Empty) {
                errors.push(format!("{} at {} is off the map or overlaps", b.kind, b.position));
            } else {
                map.set_cell(b.position, Cell::Building(b.kind));
                buildings.set(b.kind, b.level, b.position);
            }
        }

        for placement in &start.camps {
            if !map.place_camp(placement.position, placement.camp) {
                errors.push(format!("camp at {} is off the map or overlaps", placement.position));
            }
        }

        let mut tech = TechTree::new();
        for key in &start.technologies {
            if ruleset.technology(key).is_some() {
                tech.mark_researched(key.clone());
            } else {
                errors.push(format!("unknown starting technology {key}"));
            }
        }

        if !errors.is_empty() {
            return Err(GameError::Validation { errors });
        }

        let max_len = config.max_queue_len;
        let mut engine = Self {
            ruleset,
            turn: 0,
            ledger: ResourceLedger::new(Cost::ZERO, 0),
            buildings,
            units: start.units,
            tech,
            map,
            construction: JobQueue::new(QueueKind::Construction, max_len),
            training: JobQueue::new(QueueKind::Training, max_len),
            research: JobQueue::new(QueueKind::Research, max_len),
            reports: VecDeque::new(),
            events: Vec::new(),
            config,
        };
        engine.refresh_derived();
        engine.ledger.produce(ResourceDelta::from(start.resources));

        info!(
            width = engine.map.width(),
            height = engine.map.height(),
            camps = engine.map.camps().count(),
            "New empire created"
        );
        Ok(engine)
    }

    /// Restore a saved game, re-deriving capacity and bonuses.
    ///
    /// Queue length limits and the report history limit come from `config`;
    /// its starting state is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on a version mismatch or an inconsistent snapshot.
    pub fn from_save(save: SaveGame, ruleset: Ruleset, config: EngineConfig) -> Result<Self> {
        if save.version != SAVE_VERSION {
            return Err(GameError::VersionMismatch {
                expected: SAVE_VERSION,
                found: save.version,
            });
        }
        if !save.map.is_well_formed() {
            return Err(GameError::InvalidState(
                "saved map dimensions do not match its cells".to_string(),
            ));
        }

        let mut queues = [save.construction, save.training, save.research];
        for (queue, kind) in queues.iter_mut().zip(QueueKind::ALL) {
            if queue.kind() != kind || queue.iter().any(|e| e.payload.queue_kind() != kind) {
                return Err(GameError::InvalidState(format!(
                    "saved {kind} queue holds foreign entries"
                )));
            }
            queue.set_max_len(config.max_queue_len);
        }
        let [construction, training, research] = queues;

        let mut reports: VecDeque<CombatReport> = save.reports.into();
        while reports.len() > config.report_history_limit {
            reports.pop_front();
        }

        let mut engine = Self {
            ruleset,
            config,
            turn: save.turn,
            ledger: save.ledger,
            buildings: save.buildings,
            units: save.units,
            tech: save.technologies,
            map: save.map,
            construction,
            training,
            research,
            reports,
            events: Vec::new(),
        };
        engine.refresh_derived();

        info!(turn = engine.turn, "Loaded empire from save");
        Ok(engine)
    }

    /// Snapshot every persisted field.
    #[must_use]
    pub fn save_game(&self) -> SaveGame {
        SaveGame {
            version: SAVE_VERSION,
            turn: self.turn,
            ledger: self.ledger.clone(),
            buildings: self.buildings.clone(),
            units: self.units.clone(),
            technologies: self.tech.clone(),
            map: self.map.clone(),
            construction: self.construction.clone(),
            training: self.training.clone(),
            research: self.research.clone(),
            reports: self.reports.iter().cloned().collect(),
        }
    }

    // ------------------------------------------------------------------
    // Start operations
    // ------------------------------------------------------------------

    /// Queue construction of a new building, or the next level of one.
    ///
    /// The target level counts upgrades already queued, so two orders for a
    /// level 1 farm produce levels 2 and 3. Existing or queued buildings
    /// must be addressed at their own cell; new ones need an empty cell.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidPlacement`, `MaxLevelReached`,
    /// `PrerequisiteNotMet`, `InsufficientResources` or `QueueFull`.
    pub fn start_construction(&mut self, building: BuildingKind, at: Coord) -> CommandResult<()> {
        let def = self.ruleset.building(building);
        let queued: Vec<Coord> = self
            .construction
            .iter()
            .filter_map(|e| match e.payload {
                JobPayload::Construction { building: b, position, .. } if b == building => {
                    Some(position)
                }
                _ => None,
            })
            .collect();

        let site = self
            .buildings
            .get(building)
            .map(|b| b.position)
            .or_else(|| queued.first().copied());
        match site {
            Some(position) if position != at => {
                return Err(CommandError::InvalidPlacement { building, at });
            }
            Some(_) => {}
            None => {
                if self.map.cell(at) != Some(Cell::Empty) || self.is_site_reserved(at) {
                    return Err(CommandError::InvalidPlacement { building, at });
                }
            }
        }

        let next_level = usize::from(self.buildings.level(building)) + queued.len() + 1;
        let target_level = match u8::try_from(next_level) {
            Ok(level) if level <= def.max_level => level,
            _ => {
                return Err(CommandError::MaxLevelReached {
                    building,
                    max_level: def.max_level,
                });
            }
        };

        self.buildings.check_requirements(&def.requires)?;
        let cost = def.cost_at(target_level);
        self.ledger.check_affordable(cost)?;

        let duration =
            self.job_duration(def.build_time_at(target_level), 1, BuildingKind::TownHall);
        let payload = JobPayload::Construction {
            building,
            target_level,
            position: at,
        };
        self.enqueue(cost, QueueEntry::new(payload, duration))?;

        info!(%building, target_level, %at, "Construction started");
        self.events.push(GameEvent::ConstructionStarted {
            building,
            target_level,
            position: at,
            duration,
        });
        Ok(())
    }

    /// Queue a batch of units at the barracks.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidQuantity`, `UnsupportedBuilding` (no barracks),
    /// `PrerequisiteNotMet`, `InsufficientResources` or `QueueFull`.
    pub fn start_training(&mut self, unit: UnitKind, quantity: u32) -> CommandResult<()> {
        if quantity == 0 {
            return Err(CommandError::InvalidQuantity);
        }
        if self.buildings.level(BuildingKind::Barracks) == 0 {
            return Err(CommandError::UnsupportedBuilding(BuildingKind::Barracks));
        }

        let def = self.ruleset.unit(unit);
        self.buildings.check_requirements(&[BuildingRequirement::new(
            BuildingKind::Barracks,
            def.barracks_level,
        )])?;
        let cost = def.cost.times(quantity);
        self.ledger.check_affordable(cost)?;

        let duration = self.job_duration(def.train_time, quantity, BuildingKind::Barracks);
        self.enqueue(cost, QueueEntry::new(JobPayload::Training { unit, quantity }, duration))?;

        info!(%unit, quantity, "Training started");
        self.events.push(GameEvent::TrainingStarted {
            unit,
            quantity,
            duration,
        });
        Ok(())
    }

    /// Queue a technology at the library.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownTechnology`, `AlreadyResearched`,
    /// `ResearchInProgress`, `UnsupportedBuilding` (no library),
    /// `PrerequisiteNotMet`, `InsufficientResources` or `QueueFull`.
    pub fn start_research(&mut self, tech: &TechKey) -> CommandResult<()> {
        if self.ruleset.technology(tech).is_none() {
            return Err(CommandError::UnknownTechnology(tech.clone()));
        }
        if self.tech.is_researched(tech) {
            return Err(CommandError::AlreadyResearched(tech.clone()));
        }
        if self.is_research_queued(tech) {
            return Err(CommandError::ResearchInProgress(tech.clone()));
        }
        if self.buildings.level(BuildingKind::Library) == 0 {
            return Err(CommandError::UnsupportedBuilding(BuildingKind::Library));
        }

        let def = self
            .tech
            .check_research(tech, &self.ruleset, &self.buildings, &self.ledger)?;
        let cost = def.cost;
        let duration = self.job_duration(def.research_time, 1, BuildingKind::Library);
        self.enqueue(cost, QueueEntry::new(JobPayload::Research { tech: tech.clone() }, duration))?;

        info!(%tech, "Research started");
        self.events.push(GameEvent::ResearchStarted {
            tech: tech.clone(),
            duration,
        });
        Ok(())
    }

    /// True iff the technology could be queued right now.
    #[must_use]
    pub fn can_research(&self, tech: &TechKey) -> bool {
        self.buildings.level(BuildingKind::Library) > 0
            && !self.is_research_queued(tech)
            && self
                .tech
                .can_research(tech, &self.ruleset, &self.buildings, &self.ledger)
    }

    fn is_research_queued(&self, tech: &TechKey) -> bool {
        self.research
            .iter()
            .any(|e| matches!(&e.payload, JobPayload::Research { tech: queued } if queued == tech))
    }

    fn is_site_reserved(&self, at: Coord) -> bool {
        self.construction
            .iter()
            .any(|e| {
                matches!(e.payload, JobPayload::Construction { position, .. } if position == at)
            })
    }

    /// `base × quantity` seconds, shortened by the host building's speed.
    fn job_duration(&self, base_secs: u32, quantity: u32, host: BuildingKind) -> Fixed {
        let speed = self.buildings.speed_percent(host, self.ruleset.economy());
        let work = i64::from(base_secs)
            .saturating_mul(i64::from(quantity))
            .saturating_mul(100);
        ratio(work, i64::from(speed))
    }

    fn enqueue(&mut self, cost: Cost, entry: QueueEntry) -> CommandResult<()> {
        let kind = entry.payload.queue_kind();
        if self.queue(kind).is_full() {
            return Err(CommandError::QueueFull(kind));
        }
        self.ledger.deduct(cost)?;
        self.queue_mut(kind).push(entry)
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation by `delta` seconds.
    ///
    /// Negative deltas are treated as zero. Returns the events produced
    /// during this tick.
    pub fn tick(&mut self, delta: Fixed) -> Vec<GameEvent> {
        let delta = delta.max(Fixed::ZERO);
        let policy = self.config.residual_policy;
        let mut events = Vec::new();
        self.turn += 1;

        for entry in self.construction.advance(delta, policy) {
            self.complete(entry, &mut events);
        }
        for entry in self.training.advance(delta, policy) {
            self.complete(entry, &mut events);
        }
        for entry in self.research.advance(delta, policy) {
            self.complete(entry, &mut events);
        }

        self.run_production(delta, &mut events);

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            debug!(turn = self.turn, state_hash = hash, "Engine state hash");
        }

        events
    }

    fn complete(&mut self, entry: QueueEntry, events: &mut Vec<GameEvent>) {
        match entry.payload {
            JobPayload::Construction {
                building,
                target_level,
                position,
            } => {
                if target_level <= self.buildings.level(building) {
                    warn!(
                        %building,
                        target_level,
                        "Construction finished below current level; ignored"
                    );
                    return;
                }
                self.buildings.set(building, target_level, position);
                self.map.set_cell(position, Cell::Building(building));
                self.refresh_capacity();
                info!(%building, level = target_level, "Construction completed");
                events.push(GameEvent::ConstructionCompleted {
                    building,
                    level: target_level,
                    position,
                });
            }
            JobPayload::Training { unit, quantity } => {
                self.units.add(unit, quantity);
                info!(%unit, quantity, "Training completed");
                events.push(GameEvent::TrainingCompleted { unit, quantity });
            }
            JobPayload::Research { tech } => {
                if !self.tech.mark_researched(tech.clone()) {
                    warn!(%tech, "Research finished for a known technology; ignored");
                    return;
                }
                self.refresh_derived();
                info!(%tech, "Research completed");
                events.push(GameEvent::ResearchCompleted { tech });
            }
        }
    }

    fn run_production(&mut self, delta: Fixed, events: &mut Vec<GameEvent>) {
        let before = (
            self.ledger.amount(ResourceKind::Food),
            self.ledger.amount(ResourceKind::Ore),
        );
        let rates = self.production_rates();
        let minute = Fixed::from_num(SECONDS_PER_MINUTE);
        let change = ResourceDelta::new(
            rates.food.saturating_mul(delta) / minute,
            rates.ore.saturating_mul(delta) / minute,
        );
        self.ledger.produce(change);

        let after = (self.ledger.amount(ResourceKind::Food), self.ledger.amount(ResourceKind::Ore));
        if after != before {
            debug!(food = %after.0, ore = %after.1, "Production applied");
            events.push(GameEvent::ResourcesChanged {
                food: after.0,
                ore: after.1,
                capacity: self.ledger.capacity(),
            });
        }
    }

    /// Net resource change per minute: building output with research
    /// bonuses, minus army food upkeep.
    #[must_use]
    pub fn production_rates(&self) -> ResourceDelta {
        let economy = self.ruleset.economy();
        let bonuses = self.tech.bonuses();
        let food = boosted(self.buildings.food_per_minute(economy), bonuses.food_production_percent)
            .saturating_sub(self.upkeep_per_minute().saturating_mul(100));
        let ore = boosted(self.buildings.ore_per_minute(economy), bonuses.ore_production_percent);
        ResourceDelta::new(ratio(food, 100), ratio(ore, 100))
    }

    fn upkeep_per_minute(&self) -> i64 {
        self.units
            .iter()
            .map(|(unit, count)| {
                let upkeep = i64::from(self.ruleset.unit(unit).upkeep_per_minute);
                i64::from(count).saturating_mul(upkeep)
            })
            .fold(0, i64::saturating_add)
    }

    fn refresh_derived(&mut self) {
        self.tech.recompute_bonuses(&self.ruleset);
        self.refresh_capacity();
    }

    fn refresh_capacity(&mut self) {
        let base = self.buildings.base_capacity(self.ruleset.economy());
        self.ledger
            .recompute_capacity(base, self.tech.bonuses().storage_capacity);
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// Predict an attack without changing anything.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidTarget`, `EmptyCommitment` or `InsufficientUnits`.
    pub fn preview_attack(
        &self,
        target: Coord,
        units: &UnitCounts,
    ) -> CommandResult<AttackPreview> {
        let camp = self.validate_attack(target, units)?;
        Ok(combat::compute_attack(
            &self.ruleset,
            self.tech.bonuses(),
            target,
            &camp,
            units,
        ))
    }

    /// Resolve an attack: apply losses, take loot and clear the camp on
    /// victory, and record a report.
    ///
    /// # Errors
    ///
    /// Fails like [`Engine::preview_attack`], leaving state unchanged.
    pub fn commit_attack(
        &mut self,
        target: Coord,
        units: &UnitCounts,
    ) -> CommandResult<CombatReport> {
        let camp = self.validate_attack(target, units)?;
        let preview =
            combat::compute_attack(&self.ruleset, self.tech.bonuses(), target, &camp, units);
        let losses = combat::compute_losses(self.ruleset.combat(), self.tech.bonuses(), &preview);

        for (unit, lost) in losses.iter() {
            if !self.units.remove(unit, lost) {
                warn!(%unit, lost, "Losses exceed owned units");
            }
        }

        let loot = match preview.outcome {
            Outcome::Victory => {
                self.ledger.produce(ResourceDelta::from(camp.loot));
                self.map.remove_camp(target);
                camp.loot
            }
            Outcome::Defeat => Cost::ZERO,
        };

        let report = CombatReport {
            turn: self.turn,
            target,
            camp: camp.kind,
            difficulty: camp.difficulty,
            committed: units.clone(),
            losses,
            total_attack_power: preview.total_attack_power,
            target_defense: preview.target_defense,
            outcome: preview.outcome,
            loot,
        };

        info!(
            %target,
            camp = %camp.kind,
            power = %report.total_attack_power,
            defense = report.target_defense,
            outcome = %report.outcome,
            "Attack resolved"
        );
        self.reports.push_back(report.clone());
        while self.reports.len() > self.config.report_history_limit {
            self.reports.pop_front();
        }
        self.events.push(GameEvent::CombatResolved(report.clone()));
        Ok(report)
    }

    fn validate_attack(&self, target: Coord, units: &UnitCounts) -> CommandResult<Camp> {
        let camp = self
            .map
            .camp_at(target)
            .ok_or(CommandError::InvalidTarget(target))?;
        if units.total() == 0 {
            return Err(CommandError::EmptyCommitment);
        }
        for (unit, requested) in units.iter() {
            let available = self.units.get(unit);
            if requested > available {
                return Err(CommandError::InsufficientUnits {
                    unit,
                    requested,
                    available,
                });
            }
        }
        Ok(camp)
    }

    /// Defensive strength of the empire: unit defense with research
    /// bonuses, plus walls.
    #[must_use]
    pub fn defense_power(&self) -> Fixed {
        let bonuses = self.tech.bonuses();
        let percent = (100 + i64::from(bonuses.unit_defense_percent)).max(0);
        let troops: i64 = self
            .units
            .iter()
            .map(|(unit, count)| {
                i64::from(count).saturating_mul(i64::from(self.ruleset.unit(unit).defense))
            })
            .fold(0, i64::saturating_add);

        let walls = if self.buildings.level(BuildingKind::Wall) > 0 {
            (i64::from(self.buildings.wall_defense(self.ruleset.economy()))
                + i64::from(bonuses.wall_defense))
            .max(0)
        } else {
            0
        };

        ratio(troops.saturating_mul(percent), 100).saturating_add(Fixed::saturating_from_num(walls))
    }

    // ------------------------------------------------------------------
    // Commands and events
    // ------------------------------------------------------------------

    /// Apply a command.
    ///
    /// # Errors
    ///
    /// Returns the command's rejection; `Tick` never fails.
    pub fn apply(&mut self, command: Command) -> CommandResult<CommandOutcome> {
        match command {
            Command::StartConstruction { building, at } => {
                self.start_construction(building, at).map(|()| CommandOutcome::Queued)
            }
            Command::StartTraining { unit, quantity } => {
                self.start_training(unit, quantity).map(|()| CommandOutcome::Queued)
            }
            Command::StartResearch { tech } => {
                self.start_research(&tech).map(|()| CommandOutcome::Queued)
            }
            Command::Tick { delta } => Ok(CommandOutcome::Ticked(self.tick(delta))),
            Command::CommitAttack { target, units } => {
                self.commit_attack(target, &units).map(CommandOutcome::Attacked)
            }
        }
    }

    /// Take the events queued by start and attack operations.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hash of the persisted state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self.save_game().to_bytes() {
            Ok(bytes) => bytes.hash(&mut hasher),
            Err(e) => warn!("State hash without snapshot: {e}"),
        }
        hasher.finish()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Game definitions.
    #[must_use]
    pub const fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ticks elapsed.
    #[must_use]
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Stockpiles and capacity.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Current aggregated research bonuses.
    #[must_use]
    pub const fn bonuses(&self) -> &BonusVector {
        self.tech.bonuses()
    }

    /// Research state.
    #[must_use]
    pub const fn tech_tree(&self) -> &TechTree {
        &self.tech
    }

    /// Researched technologies in key order.
    pub fn researched(&self) -> impl Iterator<Item = &TechKey> {
        self.tech.researched()
    }

    /// Owned buildings.
    #[must_use]
    pub const fn buildings(&self) -> &Buildings {
        &self.buildings
    }

    /// Army.
    #[must_use]
    pub const fn units(&self) -> &UnitCounts {
        &self.units
    }

    /// World map.
    #[must_use]
    pub const fn map(&self) -> &GameMap {
        &self.map
    }

    /// One of the three job queues.
    #[must_use]
    pub const fn queue(&self, kind: QueueKind) -> &JobQueue {
        match kind {
            QueueKind::Construction => &self.construction,
            QueueKind::Training => &self.training,
            QueueKind::Research => &self.research,
        }
    }

    fn queue_mut(&mut self, kind: QueueKind) -> &mut JobQueue {
        match kind {
            QueueKind::Construction => &mut self.construction,
            QueueKind::Training => &mut self.training,
            QueueKind::Research => &mut self.research,
        }
    }

    /// Combat history, oldest first.
    pub fn reports(&self) -> impl Iterator<Item = &CombatReport> {
        self.reports.iter()
    }
}

fn check_map_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(GameError::InvalidState(format!(
            "map size {width}x{height} must be positive"
        )));
    }
    Ok(())
}

/// `rate × (100 + percent)`, never negative, in hundredths.
fn boosted(rate: u32, percent: i32) -> i64 {
    i64::from(rate).saturating_mul((100 + i64::from(percent)).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StartingState;
    use crate::data::{TechCategory, TechData, TechEffect};
    use crate::map::CampKind;
    use crate::queue::ResidualPolicy;

    fn engine_with(start: StartingState) -> Engine {
        Engine::new(Ruleset::standard(), EngineConfig::default().with_start(start)).unwrap()
    }

    fn town(resources: Cost) -> StartingState {
        StartingState::bare(10, 10)
            .with_resources(resources)
            .with_building(BuildingKind::TownHall, 1, Coord::new(5, 5))
    }

    #[test]
    fn test_new_rejects_empty_map() {
        let config = EngineConfig::default().with_start(StartingState::bare(0, 4));
        assert!(matches!(
            Engine::new(Ruleset::standard(), config),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_new_collects_bad_placements() {
        let start = StartingState::bare(4, 4)
            .with_building(BuildingKind::Farm, 1, Coord::new(9, 9))
            .with_building(BuildingKind::Mine, 0, Coord::new(1, 1))
            .with_camp(Coord::new(1, 1), Camp::new(CampKind::GoblinCamp, 1, Cost::ZERO))
            .with_camp(Coord::new(1, 1), Camp::new(CampKind::GoblinCamp, 1, Cost::ZERO));
        match Engine::new(Ruleset::standard(), EngineConfig::default().with_start(start)) {
            Err(GameError::Validation { errors }) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_starting_resources_clamp_to_capacity() {
        let engine = engine_with(town(Cost::new(5000, 10)));
        assert_eq!(engine.ledger().capacity(), Fixed::from_num(1000));
        assert_eq!(engine.ledger().whole_amount(ResourceKind::Food), 1000);
    }

    #[test]
    fn test_construction_targets_count_queued_levels() {
        let mut engine = engine_with(town(Cost::new(1000, 1000)));
        let farm = Coord::new(4, 5);
        engine.start_construction(BuildingKind::Farm, farm).unwrap();
        engine.start_construction(BuildingKind::Farm, farm).unwrap();

        let targets: Vec<u8> = engine
            .queue(QueueKind::Construction)
            .iter()
            .filter_map(|e| match e.payload {
                JobPayload::Construction { target_level, .. } => Some(target_level),
                _ => None,
            })
            .collect();
        assert_eq!(targets, vec![1, 2]);

        assert_eq!(
            engine.start_construction(BuildingKind::Farm, Coord::new(0, 0)),
            Err(CommandError::InvalidPlacement {
                building: BuildingKind::Farm,
                at: Coord::new(0, 0),
            })
        );
    }

    #[test]
    fn test_queued_site_is_reserved() {
        let mut engine = engine_with(town(Cost::new(1000, 1000)));
        let at = Coord::new(2, 2);
        engine.start_construction(BuildingKind::Farm, at).unwrap();
        assert_eq!(
            engine.start_construction(BuildingKind::Mine, at),
            Err(CommandError::InvalidPlacement {
                building: BuildingKind::Mine,
                at,
            })
        );
    }

    #[test]
    fn test_construction_completion_places_building() {
        let mut engine = engine_with(town(Cost::new(1000, 1000)));
        let at = Coord::new(1, 1);
        engine.start_construction(BuildingKind::Warehouse, at).unwrap();
        let events = engine.tick(Fixed::from_num(40));

        assert_eq!(engine.buildings().level(BuildingKind::Warehouse), 1);
        assert_eq!(engine.map().cell(at), Some(Cell::Building(BuildingKind::Warehouse)));
        assert_eq!(engine.ledger().capacity(), Fixed::from_num(1500));
        assert!(events.contains(&GameEvent::ConstructionCompleted {
            building: BuildingKind::Warehouse,
            level: 1,
            position: at,
        }));
    }

    #[test]
    fn test_training_needs_barracks() {
        let mut engine = engine_with(town(Cost::new(1000, 1000)));
        assert_eq!(
            engine.start_training(UnitKind::Spearman, 1),
            Err(CommandError::UnsupportedBuilding(BuildingKind::Barracks))
        );
        assert_eq!(
            engine.start_training(UnitKind::Spearman, 0),
            Err(CommandError::InvalidQuantity)
        );
    }

    #[test]
    fn test_research_needs_library() {
        let mut engine = engine_with(town(Cost::new(1000, 1000)));
        let irrigation = TechKey::new(TechCategory::Economy, "irrigation");
        assert_eq!(
            engine.start_research(&irrigation),
            Err(CommandError::UnsupportedBuilding(BuildingKind::Library))
        );
        assert!(!engine.can_research(&irrigation));
    }

    #[test]
    fn test_production_and_upkeep() {
        let start = town(Cost::new(100, 100))
            .with_building(BuildingKind::Farm, 1, Coord::new(4, 5))
            .with_units(UnitCounts::new().with(UnitKind::Cavalry, 5));
        let mut engine = engine_with(start);

        // town hall 30 + farm 60 - cavalry upkeep 10 = 80 food per minute
        assert_eq!(
            engine.production_rates(),
            ResourceDelta::new(Fixed::from_num(80), Fixed::from_num(30))
        );
        engine.tick(Fixed::from_num(30));
        assert_eq!(engine.ledger().amount(ResourceKind::Food), Fixed::from_num(140));
        assert_eq!(engine.ledger().amount(ResourceKind::Ore), Fixed::from_num(115));
    }

    #[test]
    fn test_negative_delta_still_counts_a_turn() {
        let mut engine = engine_with(town(Cost::new(100, 100)));
        let events = engine.tick(Fixed::from_num(-10));
        assert!(events.is_empty());
        assert_eq!(engine.turn(), 1);
        assert_eq!(engine.ledger().whole_amount(ResourceKind::Food), 100);
    }

    #[test]
    fn test_carry_forward_completes_several_jobs() {
        let start = town(Cost::new(1000, 1000))
            .with_building(BuildingKind::Barracks, 1, Coord::new(6, 5));
        let config = EngineConfig::default()
            .with_residual_policy(ResidualPolicy::CarryForward)
            .with_start(start);
        let mut engine = Engine::new(Ruleset::standard(), config).unwrap();
        engine.start_training(UnitKind::Spearman, 1).unwrap();
        engine.start_training(UnitKind::Spearman, 1).unwrap();

        engine.tick(Fixed::from_num(40));
        assert_eq!(engine.units().get(UnitKind::Spearman), 2);
    }

    #[test]
    fn test_drain_events_empties_outbox() {
        let mut engine = engine_with(town(Cost::new(1000, 1000)));
        engine.start_construction(BuildingKind::Farm, Coord::new(0, 0)).unwrap();
        assert_eq!(engine.drain_events().len(), 1);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_defense_power_counts_walls() {
        let start = town(Cost::ZERO)
            .with_building(BuildingKind::Wall, 2, Coord::new(0, 0))
            .with_units(UnitCounts::new().with(UnitKind::Spearman, 10));
        let engine = engine_with(start);
        assert_eq!(engine.defense_power(), Fixed::from_num(80 + 50));
    }

    #[test]
    fn test_extreme_ruleset_saturates_instead_of_overflowing() {
        let mut data = Ruleset::standard().to_data();
        data.economy.food_per_farm_level = u32::MAX;
        data.economy.wall_defense_per_level = u32::MAX;
        for unit in &mut data.units {
            unit.upkeep_per_minute = u32::MAX;
            unit.defense = u32::MAX;
        }
        for id in ["harvest_a", "harvest_b"] {
            data.technologies.push(TechData {
                key: TechKey::new(TechCategory::Economy, id),
                name: id.to_string(),
                cost: Cost::ZERO,
                research_time: 1,
                required_buildings: Vec::new(),
                prerequisites: Vec::new(),
                effects: vec![TechEffect::FoodProductionPercent(i32::MAX)],
            });
        }
        let ruleset = Ruleset::new(data).unwrap();

        let start = town(Cost::new(500, 500))
            .with_building(BuildingKind::Farm, 10, Coord::new(0, 0))
            .with_building(BuildingKind::Wall, 10, Coord::new(1, 0))
            .with_units(UnitCounts::new().with(UnitKind::Spearman, u32::MAX))
            .with_technology(TechKey::new(TechCategory::Economy, "harvest_a"))
            .with_technology(TechKey::new(TechCategory::Economy, "harvest_b"));
        let mut engine =
            Engine::new(ruleset, EngineConfig::default().with_start(start)).unwrap();

        assert_eq!(engine.bonuses().food_production_percent, i32::MAX);
        let _ = engine.production_rates();
        assert!(engine.defense_power() > Fixed::ZERO);
        engine.tick(Fixed::from_num(60));
        assert_eq!(engine.turn(), 1);
    }
}
