//! Territories, players, and the identifiers that address them.
//!
//! Territories are nodes of the adjacency graph. Each holds an ordered index
//! set of the units standing in it; the unit records themselves live in the
//! arena owned by [`BoardState`](super::BoardState).

use serde::{Deserialize, Serialize};

use super::unit::UnitId;

/// Index of a territory in the board's territory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerritoryId(pub u32);

impl TerritoryId {
    /// Returns the table index for this territory.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a player in the board's player table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u16);

impl PlayerId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A participant in the game.
///
/// Players sharing an `alliance` number are allied; every other pairing is at
/// war.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub alliance: u16,
    /// Spendable production resources.
    pub resources: i32,
}

/// Per-territory modifiers applied to combat values of non-air units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainEffect {
    pub attack_modifier: i32,
    pub defense_modifier: i32,
    /// Blitzing units lose their blitz when entering this territory.
    pub stops_blitz: bool,
}

/// A single node of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Territory {
    pub name: String,
    pub is_water: bool,
    pub impassable: bool,
    /// Production value of the territory (zero for most sea zones).
    pub production: i32,
    /// Controlling player. `None` is unowned water or neutral land.
    pub owner: Option<PlayerId>,
    /// Set when this territory is the capital of the given player.
    pub capital_of: Option<PlayerId>,
    pub terrain: TerrainEffect,
    pub(crate) units: Vec<UnitId>,
}

impl Territory {
    /// Creates an unowned, passable territory with no production.
    pub fn new(name: impl Into<String>, is_water: bool) -> Self {
        Territory {
            name: name.into(),
            is_water,
            impassable: false,
            production: 0,
            owner: None,
            capital_of: None,
            terrain: TerrainEffect::default(),
            units: Vec::new(),
        }
    }

    /// Returns true for land that no player controls.
    #[inline]
    pub fn is_neutral_land(&self) -> bool {
        !self.is_water && self.owner.is_none()
    }

    /// Ids of the units currently standing here, in insertion order.
    #[inline]
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }
}

/// A water passage whose use depends on control of adjacent land.
///
/// Sea units may cross between the two sea zones only when every territory in
/// `controlled_by` is held by the moving player or an ally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canal {
    pub name: String,
    pub sea_zones: [TerritoryId; 2],
    pub controlled_by: Vec<TerritoryId>,
}

impl Canal {
    /// Returns true if this canal governs the edge between `a` and `b`.
    pub fn connects(&self, a: TerritoryId, b: TerritoryId) -> bool {
        (self.sea_zones[0] == a && self.sea_zones[1] == b)
            || (self.sea_zones[0] == b && self.sea_zones[1] == a)
    }
}
