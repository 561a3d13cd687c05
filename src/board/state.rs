//! Board state snapshot.
//!
//! Holds the territory table, adjacency lists, player table, unit-type
//! catalog and the unit arena. Units are addressed by [`UnitId`] and each
//! territory holds an index set of the ids standing in it, so moving a unit
//! between territories never aliases a shared container.

use serde::{Deserialize, Serialize};

use super::territory::{Canal, Player, PlayerId, Territory, TerritoryId};
use super::unit::{Unit, UnitId, UnitType, UnitTypeId};

/// Game-wide rule switches that change how battles are estimated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub dice_sides: u32,
    /// Non-combat transports can only be chosen as casualties last.
    pub transport_casualties_restricted: bool,
    /// Evading units may leave before the first round is fought.
    pub evade_before_battle: bool,
    /// Construction caps are ignored.
    pub unlimited_constructions: bool,
    /// Territories holding a factory allow as many constructions as their production.
    pub more_constructions_with_factory: bool,
    /// Ships may only enter enemy-controlled sea zones during combat moves.
    pub naval_may_not_non_combat_into_controlled: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        GameRules {
            dice_sides: 6,
            transport_casualties_restricted: true,
            evade_before_battle: true,
            unlimited_constructions: false,
            more_constructions_with_factory: false,
            naval_may_not_non_combat_into_controlled: false,
        }
    }
}

/// Complete, read-only snapshot consumed by the planner.
#[derive(Debug, Clone)]
pub struct BoardState {
    pub round: u32,
    pub rules: GameRules,
    pub players: Vec<Player>,
    pub unit_types: Vec<UnitType>,
    pub territories: Vec<Territory>,
    pub canals: Vec<Canal>,
    pub(crate) adjacency: Vec<Vec<TerritoryId>>,
    pub(crate) units: Vec<Unit>,
}

impl BoardState {
    /// Creates an empty board with the given rules.
    pub fn new(rules: GameRules) -> Self {
        BoardState {
            round: 1,
            rules,
            players: Vec::new(),
            unit_types: Vec::new(),
            territories: Vec::new(),
            canals: Vec::new(),
            adjacency: Vec::new(),
            units: Vec::new(),
        }
    }

    // --- construction ---

    pub fn add_player(&mut self, name: impl Into<String>, alliance: u16, resources: i32) -> PlayerId {
        self.players.push(Player {
            name: name.into(),
            alliance,
            resources,
        });
        PlayerId((self.players.len() - 1) as u16)
    }

    pub fn add_territory(&mut self, territory: Territory) -> TerritoryId {
        self.territories.push(territory);
        self.adjacency.push(Vec::new());
        TerritoryId((self.territories.len() - 1) as u32)
    }

    pub fn add_unit_type(&mut self, unit_type: UnitType) -> UnitTypeId {
        self.unit_types.push(unit_type);
        UnitTypeId((self.unit_types.len() - 1) as u16)
    }

    /// Connects two territories in both directions. Duplicate edges are ignored.
    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) {
        if a == b {
            return;
        }
        if !self.adjacency[a.index()].contains(&b) {
            self.adjacency[a.index()].push(b);
        }
        if !self.adjacency[b.index()].contains(&a) {
            self.adjacency[b.index()].push(a);
        }
    }

    /// Adds a unit to the arena and places it in `territory`.
    pub fn add_unit(&mut self, unit_type: UnitTypeId, owner: PlayerId, territory: TerritoryId) -> UnitId {
        let id = self.spawn_unit(unit_type, owner, territory);
        self.territories[territory.index()].units.push(id);
        id
    }

    /// Adds a unit to the arena without placing it on the map.
    ///
    /// Used for units that are only planned, such as purchases waiting to be
    /// placed. The unit reports `territory` as its location but is not part of
    /// that territory's unit set.
    pub fn spawn_unit(&mut self, unit_type: UnitTypeId, owner: PlayerId, territory: TerritoryId) -> UnitId {
        let movement = self.unit_types[unit_type.index()].movement;
        self.units.push(Unit {
            unit_type,
            owner,
            territory,
            hits: 0,
            movement_left: movement,
            transported_by: None,
        });
        UnitId((self.units.len() - 1) as u32)
    }

    /// Spawns `quantity` planned units of one type.
    pub fn spawn_units(
        &mut self,
        unit_type: UnitTypeId,
        quantity: u32,
        owner: PlayerId,
        territory: TerritoryId,
    ) -> Vec<UnitId> {
        (0..quantity)
            .map(|_| self.spawn_unit(unit_type, owner, territory))
            .collect()
    }

    /// Spawns `quantity` units for the duration of `f` only.
    ///
    /// The units are removed from the arena again when `f` returns, so any
    /// ids spawned inside `f` must not outlive it.
    pub fn with_temp_units<R>(
        &mut self,
        unit_type: UnitTypeId,
        quantity: u32,
        owner: PlayerId,
        territory: TerritoryId,
        f: impl FnOnce(&BoardState, &[UnitId]) -> R,
    ) -> R {
        let mark = self.units.len();
        let units = self.spawn_units(unit_type, quantity, owner, territory);
        let result = f(self, &units);
        self.units.truncate(mark);
        result
    }

    /// Marks `cargo` as aboard `transport`.
    pub fn load(&mut self, cargo: UnitId, transport: UnitId) {
        self.units[cargo.index()].transported_by = Some(transport);
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.index()]
    }

    pub fn territory_mut(&mut self, id: TerritoryId) -> &mut Territory {
        &mut self.territories[id.index()]
    }

    // --- lookups ---

    #[inline]
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    /// Static attributes of the given unit's type.
    #[inline]
    pub fn unit_type(&self, id: UnitId) -> &UnitType {
        &self.unit_types[self.units[id.index()].unit_type.index()]
    }

    #[inline]
    pub fn type_info(&self, id: UnitTypeId) -> &UnitType {
        &self.unit_types[id.index()]
    }

    #[inline]
    pub fn territory(&self, id: TerritoryId) -> &Territory {
        &self.territories[id.index()]
    }

    #[inline]
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    #[inline]
    pub fn units_in(&self, t: TerritoryId) -> &[UnitId] {
        &self.territories[t.index()].units
    }

    #[inline]
    pub fn unit_territory(&self, id: UnitId) -> TerritoryId {
        self.units[id.index()].territory
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn territory_ids(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        (0..self.territories.len() as u32).map(TerritoryId)
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        (0..self.players.len() as u16).map(PlayerId)
    }

    pub fn find_territory(&self, name: &str) -> Option<TerritoryId> {
        self.territories
            .iter()
            .position(|t| t.name == name)
            .map(|i| TerritoryId(i as u32))
    }

    pub fn find_unit_type(&self, name: &str) -> Option<UnitTypeId> {
        self.unit_types
            .iter()
            .position(|u| u.name == name)
            .map(|i| UnitTypeId(i as u16))
    }

    pub fn find_player(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .map(|i| PlayerId(i as u16))
    }

    /// Current resource stockpile of a player.
    #[inline]
    pub fn resources(&self, player: PlayerId) -> i32 {
        self.players[player.index()].resources
    }

    // --- relationships ---

    /// Players are allied with themselves and with members of their alliance.
    #[inline]
    pub fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        a == b || self.players[a.index()].alliance == self.players[b.index()].alliance
    }

    #[inline]
    pub fn is_enemy_unit(&self, unit: UnitId, player: PlayerId) -> bool {
        !self.is_allied(self.units[unit.index()].owner, player)
    }

    /// Land controlled by an ally of `player`. Unowned water counts as allied.
    pub fn is_allied_territory(&self, t: TerritoryId, player: PlayerId) -> bool {
        match self.territories[t.index()].owner {
            Some(owner) => self.is_allied(owner, player),
            None => self.territories[t.index()].is_water,
        }
    }

    /// Land held by an enemy of `player`, including neutral land.
    pub fn is_enemy_territory(&self, t: TerritoryId, player: PlayerId) -> bool {
        let territory = &self.territories[t.index()];
        if territory.is_water {
            return territory.owner.is_some_and(|o| !self.is_allied(o, player));
        }
        match territory.owner {
            Some(owner) => !self.is_allied(owner, player),
            None => true,
        }
    }

    pub fn has_enemy_units(&self, t: TerritoryId, player: PlayerId) -> bool {
        self.units_in(t).iter().any(|&u| self.is_enemy_unit(u, player))
    }

    /// Enemy units standing in `t` from `player`'s point of view.
    pub fn enemy_units_in(&self, t: TerritoryId, player: PlayerId) -> Vec<UnitId> {
        self.units_in(t)
            .iter()
            .copied()
            .filter(|&u| self.is_enemy_unit(u, player))
            .collect()
    }

    /// Returns true if `t` holds an infrastructure unit that produces units.
    pub fn has_factory(&self, t: TerritoryId) -> bool {
        self.units_in(t).iter().any(|&u| self.unit_type(u).can_produce)
    }

    /// Total production of every territory `player` controls.
    pub fn player_production(&self, player: PlayerId) -> i32 {
        self.territories
            .iter()
            .filter(|t| t.owner == Some(player))
            .map(|t| t.production)
            .sum()
    }

    /// The capital of `player`, if any is marked on the map.
    pub fn capital_of(&self, player: PlayerId) -> Option<TerritoryId> {
        self.territory_ids()
            .find(|&t| self.territories[t.index()].capital_of == Some(player))
    }

    // --- transport state ---

    /// Units currently aboard `transport`.
    pub fn cargo_of(&self, transport: UnitId) -> Vec<UnitId> {
        let territory = self.unit_territory(transport);
        self.units_in(territory)
            .iter()
            .copied()
            .filter(|&u| self.units[u.index()].transported_by == Some(transport))
            .collect()
    }

    pub fn is_transporting(&self, transport: UnitId) -> bool {
        let territory = self.unit_territory(transport);
        self.units_in(territory)
            .iter()
            .any(|&u| self.units[u.index()].transported_by == Some(transport))
    }

    /// Remaining hit points of a unit.
    pub fn hit_points_left(&self, unit: UnitId) -> u32 {
        self.unit_type(unit)
            .hit_points
            .saturating_sub(self.units[unit.index()].hits)
    }

    /// Sum of production costs, used as unit value in value-swing arithmetic.
    pub fn units_value(&self, units: &[UnitId]) -> i32 {
        units.iter().map(|&u| self.unit_type(u).cost).sum()
    }
}
