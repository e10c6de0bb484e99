//! World map: a grid of cells holding player buildings and NPC camps.
//!
//! Terrain generation lives outside the engine; scenarios place camps
//! explicitly and construction places buildings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::BuildingKind;
use crate::resources::Cost;

/// Grid coordinate of a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Kinds of NPC camps that can be attacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CampKind {
    /// Goblin camp; spearmen hold the advantage.
    GoblinCamp,
    /// Bandit hideout; archers hold the advantage.
    BanditHideout,
}

impl fmt::Display for CampKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoblinCamp => f.write_str("goblin camp"),
            Self::BanditHideout => f.write_str("bandit hideout"),
        }
    }
}

/// Defense points per difficulty level.
pub const DEFENSE_PER_DIFFICULTY: u32 = 10;

/// An NPC camp occupying a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camp {
    /// Camp type, which decides unit advantages.
    pub kind: CampKind,
    /// Difficulty rating.
    pub difficulty: u32,
    /// Resources granted on defeat.
    #[serde(default)]
    pub loot: Cost,
}

impl Camp {
    /// Create a new camp.
    #[must_use]
    pub const fn new(kind: CampKind, difficulty: u32, loot: Cost) -> Self {
        Self {
            kind,
            difficulty,
            loot,
        }
    }

    /// Defense strength, always derived from difficulty.
    #[must_use]
    pub const fn defense(&self) -> u32 {
        self.difficulty.saturating_mul(DEFENSE_PER_DIFFICULTY)
    }
}

/// Contents of a single map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Free land.
    #[default]
    Empty,
    /// A player building.
    Building(BuildingKind),
    /// An NPC camp.
    Camp(Camp),
}

/// Rectangular world map stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl GameMap {
    /// Create a new map with every cell empty.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "GameMap width must be positive");
        assert!(height > 0, "GameMap height must be positive");

        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::Empty; cell_count],
        }
    }

    /// Map width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// True iff the dimensions are positive and match the cell storage.
    ///
    /// Always true for maps built with [`GameMap::new`]; decoded maps are
    /// checked with this before use.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.cells.len() == (self.width as usize) * (self.height as usize)
    }

    #[inline]
    fn index(&self, at: Coord) -> usize {
        (at.y as usize) * (self.width as usize) + (at.x as usize)
    }

    /// Check if a coordinate lies on the map.
    #[must_use]
    pub const fn in_bounds(&self, at: Coord) -> bool {
        at.x < self.width && at.y < self.height
    }

    /// Cell contents, or `None` when out of bounds.
    #[must_use]
    pub fn cell(&self, at: Coord) -> Option<Cell> {
        self.in_bounds(at).then(|| self.cells[self.index(at)])
    }

    /// Overwrite a cell. Returns `false` if out of bounds.
    pub fn set_cell(&mut self, at: Coord, cell: Cell) -> bool {
        if !self.in_bounds(at) {
            return false;
        }
        let idx = self.index(at);
        self.cells[idx] = cell;
        true
    }

    /// The camp at a cell, if any.
    #[must_use]
    pub fn camp_at(&self, at: Coord) -> Option<Camp> {
        match self.cell(at)? {
            Cell::Camp(camp) => Some(camp),
            _ => None,
        }
    }

    /// Place a camp on an empty cell. Returns `false` if out of bounds or occupied.
    pub fn place_camp(&mut self, at: Coord, camp: Camp) -> bool {
        if self.cell(at) != Some(Cell::Empty) {
            return false;
        }
        self.set_cell(at, Cell::Camp(camp))
    }

    /// Clear a camp, returning it.
    pub fn remove_camp(&mut self, at: Coord) -> Option<Camp> {
        let camp = self.camp_at(at)?;
        self.set_cell(at, Cell::Empty);
        Some(camp)
    }

    /// All camps in row-major order.
    pub fn camps(&self) -> impl Iterator<Item = (Coord, Camp)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| match cell {
            Cell::Camp(camp) => {
                let i = u32::try_from(i).ok()?;
                Some((Coord::new(i % width, i / width), *camp))
            }
            _ => None,
        })
    }
}
