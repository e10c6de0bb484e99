//! Proptest strategies for engine testing.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of engine invariants and determinism.

use empire_core::prelude::*;
use proptest::prelude::*;

/// Generate a unit type.
pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
    prop::sample::select(UnitKind::ALL.to_vec())
}

/// Generate a building type.
pub fn arb_building_kind() -> impl Strategy<Value = BuildingKind> {
    prop::sample::select(BuildingKind::ALL.to_vec())
}

/// Generate a technology key from the standard ruleset.
pub fn arb_tech_key() -> impl Strategy<Value = TechKey> {
    let keys: Vec<TechKey> = Ruleset::standard()
        .technologies()
        .map(|t| t.key.clone())
        .collect();
    prop::sample::select(keys)
}

/// Generate a coordinate inside a `width` × `height` map.
pub fn arb_coord(width: u32, height: u32) -> impl Strategy<Value = Coord> {
    (0..width, 0..height).prop_map(|(x, y)| Coord::new(x, y))
}

/// Generate a tick delta between 0 and 120 seconds in tenths.
pub fn arb_delta() -> impl Strategy<Value = Fixed> {
    (0i32..=1200).prop_map(|tenths| Fixed::from_num(tenths) / Fixed::from_num(10))
}

/// Generate a cost of up to 2000 of each resource.
pub fn arb_cost() -> impl Strategy<Value = Cost> {
    (0u32..=2000, 0u32..=2000).prop_map(|(food, ore)| Cost::new(food, ore))
}

/// Generate a signed resource delta of up to ±3000 per resource.
pub fn arb_resource_delta() -> impl Strategy<Value = ResourceDelta> {
    (-3000i32..=3000, -3000i32..=3000)
        .prop_map(|(food, ore)| ResourceDelta::new(Fixed::from_num(food), Fixed::from_num(ore)))
}

/// Generate a small army, possibly empty.
pub fn arb_unit_counts() -> impl Strategy<Value = UnitCounts> {
    prop::collection::vec((arb_unit_kind(), 0u32..20), 0..4)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Generate any command for a map of the given size.
pub fn arb_command(width: u32, height: u32) -> impl Strategy<Value = Command> {
    prop_oneof![
        1 => (arb_building_kind(), arb_coord(width, height))
            .prop_map(|(building, at)| Command::StartConstruction { building, at }),
        1 => (arb_unit_kind(), 0u32..8)
            .prop_map(|(unit, quantity)| Command::StartTraining { unit, quantity }),
        1 => arb_tech_key().prop_map(|tech| Command::StartResearch { tech }),
        3 => arb_delta().prop_map(|delta| Command::Tick { delta }),
        1 => (arb_coord(width, height), arb_unit_counts())
            .prop_map(|(target, units)| Command::CommitAttack { target, units }),
    ]
}

/// Generate a command script of up to `max_len` commands.
pub fn arb_script(width: u32, height: u32, max_len: usize) -> impl Strategy<Value = Vec<Command>> {
    prop::collection::vec(arb_command(width, height), 0..max_len)
}
