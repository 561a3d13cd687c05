//! Unit types and unit records.
//!
//! A [`UnitType`] carries the static combat and logistics attributes shared
//! by every unit of that type. A [`Unit`] is one entry in the board's unit
//! arena, addressed by a stable [`UnitId`].

use serde::{Deserialize, Serialize};

use super::territory::{PlayerId, TerritoryId};

/// Stable identifier of a unit in the board's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl UnitId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the board's unit-type catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTypeId(pub u16);

impl UnitTypeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The movement domain of a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Land,
    Sea,
    Air,
}

/// A combat bonus one unit type grants to others on the same side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportRule {
    /// Strength added to each supported unit.
    pub bonus: i32,
    /// How many units one supporter can boost.
    pub count: u32,
    pub offence: bool,
    pub defence: bool,
    /// Unit types eligible to receive the bonus.
    pub targets: Vec<UnitTypeId>,
}

/// Limits on building a construction-type unit into a territory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionRule {
    pub construction_type: String,
    /// Maximum constructions of this type per territory per turn.
    pub per_turn: u32,
    /// Maximum constructions of this type standing in one territory.
    pub max_per_territory: u32,
}

/// Static attributes of a unit type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitType {
    pub name: String,
    pub domain: Domain,
    pub attack: i32,
    pub defense: i32,
    pub attack_rolls: i32,
    pub defense_rolls: i32,
    pub movement: u32,
    pub hit_points: u32,
    /// Production cost, also used as the unit's value in value-swing sums.
    pub cost: i32,
    pub is_infrastructure: bool,
    /// Units may be produced in a territory holding one of these.
    pub can_produce: bool,
    pub is_aa: bool,
    /// May submerge or retreat before a battle is fought.
    pub can_evade: bool,
    /// Denies evasion to enemy evaders.
    pub is_destroyer: bool,
    pub can_blitz: bool,
    pub can_bombard: bool,
    pub transport_capacity: u32,
    /// A land unit that carries other land units along when it moves.
    pub land_transport: bool,
    /// Space taken aboard a transport, zero if not transportable.
    pub transport_cost: u32,
    /// A transport that fights and can be chosen as a casualty like any warship.
    pub combat_transport: bool,
    pub carrier_capacity: u32,
    pub carrier_cost: u32,
    pub support: Option<SupportRule>,
    /// Maximum units of this type one player may own, `-1` for no limit.
    pub max_built_per_player: i32,
    pub construction: Option<ConstructionRule>,
    /// Units that are used up when one of these is placed.
    pub consumes: Vec<(UnitTypeId, u32)>,
}

impl UnitType {
    /// Creates a one-hit-point unit type with no combat values.
    pub fn new(name: impl Into<String>, domain: Domain, cost: i32) -> Self {
        UnitType {
            name: name.into(),
            domain,
            attack: 0,
            defense: 0,
            attack_rolls: 1,
            defense_rolls: 1,
            movement: 0,
            hit_points: 1,
            cost,
            is_infrastructure: false,
            can_produce: false,
            is_aa: false,
            can_evade: false,
            is_destroyer: false,
            can_blitz: false,
            can_bombard: false,
            transport_capacity: 0,
            land_transport: false,
            transport_cost: 0,
            combat_transport: false,
            carrier_capacity: 0,
            carrier_cost: 0,
            support: None,
            max_built_per_player: -1,
            construction: None,
            consumes: Vec::new(),
        }
    }

    #[inline]
    pub fn is_land(&self) -> bool {
        self.domain == Domain::Land
    }

    #[inline]
    pub fn is_sea(&self) -> bool {
        self.domain == Domain::Sea
    }

    #[inline]
    pub fn is_air(&self) -> bool {
        self.domain == Domain::Air
    }

    #[inline]
    pub fn is_transport(&self) -> bool {
        self.transport_capacity > 0
    }

    #[inline]
    pub fn is_carrier(&self) -> bool {
        self.carrier_capacity > 0
    }

    /// A sea transport that does not fight on its own.
    pub fn is_non_combat_sea_transport(&self) -> bool {
        self.is_sea() && self.is_transport() && !self.combat_transport
    }

    /// Attack plus the largest offensive bonus this type grants.
    pub fn attack_with_support(&self) -> i32 {
        let bonus = self
            .support
            .as_ref()
            .filter(|s| s.offence)
            .map_or(0, |s| s.bonus);
        self.attack + bonus
    }
}

/// One unit in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub unit_type: UnitTypeId,
    pub owner: PlayerId,
    pub territory: TerritoryId,
    /// Damage already taken.
    pub hits: u32,
    pub movement_left: u32,
    /// Transport carrying this unit, if any.
    pub transported_by: Option<UnitId>,
}
