//! Territory valuation.
//!
//! Scores every territory from one player's point of view so that attack,
//! defence and purchase decisions can be ranked against each other.

pub mod targets;
pub mod value;

pub use targets::{
    find_enemy_capitals_and_factories_value, find_max_land_mass_size,
    find_nearby_enemy_capitals_and_factories, live_enemy_capitals,
};
pub use value::{
    find_sea_territory_values, find_territory_attack_value, find_territory_values, Valuation,
};
