//! Board representation and the board-query layer.
//!
//! Contains territories, players, the unit-type catalog, the unit arena,
//! adjacency queries and the composable predicates every planning component
//! filters with.

pub mod adjacency;
pub mod matches;
pub mod route;
pub mod state;
pub mod territory;
pub mod unit;

#[cfg(test)]
pub(crate) mod fixtures;

pub use matches::{Match, TerritoryMatch, UnitMatch};
pub use route::Route;
pub use state::{BoardState, GameRules};
pub use territory::{Canal, Player, PlayerId, TerrainEffect, Territory, TerritoryId};
pub use unit::{ConstructionRule, Domain, SupportRule, Unit, UnitId, UnitType, UnitTypeId};
