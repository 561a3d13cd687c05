//! Composable predicates over units and territories.
//!
//! A [`Match`] wraps a closure and can be combined with `and`, `or` and
//! `negate` at runtime. The free functions below build the predicates the
//! planner uses repeatedly; most borrow the board for their lifetime.

use super::state::BoardState;
use super::territory::{PlayerId, TerritoryId};
use super::unit::UnitId;

/// A boxed boolean predicate.
pub struct Match<'a, T> {
    test: Box<dyn Fn(T) -> bool + 'a>,
}

impl<'a, T: Copy + 'a> Match<'a, T> {
    pub fn new(test: impl Fn(T) -> bool + 'a) -> Self {
        Match {
            test: Box::new(test),
        }
    }

    /// A predicate that accepts everything.
    pub fn always() -> Self {
        Match::new(|_| true)
    }

    #[inline]
    pub fn test(&self, value: T) -> bool {
        (self.test)(value)
    }

    pub fn and(self, other: Match<'a, T>) -> Self {
        Match::new(move |v| self.test(v) && other.test(v))
    }

    pub fn or(self, other: Match<'a, T>) -> Self {
        Match::new(move |v| self.test(v) || other.test(v))
    }

    pub fn negate(self) -> Self {
        Match::new(move |v| !self.test(v))
    }

    /// Keeps the values that match, preserving order.
    pub fn filter(&self, values: &[T]) -> Vec<T> {
        values.iter().copied().filter(|&v| self.test(v)).collect()
    }

    pub fn any(&self, values: &[T]) -> bool {
        values.iter().any(|&v| self.test(v))
    }

    pub fn all(&self, values: &[T]) -> bool {
        values.iter().all(|&v| self.test(v))
    }

    pub fn count(&self, values: &[T]) -> usize {
        values.iter().filter(|&&v| self.test(v)).count()
    }
}

pub type UnitMatch<'a> = Match<'a, UnitId>;
pub type TerritoryMatch<'a> = Match<'a, TerritoryId>;

// --- units ---

pub fn unit_is_owned_by(board: &BoardState, player: PlayerId) -> UnitMatch<'_> {
    Match::new(move |u| board.unit(u).owner == player)
}

pub fn unit_is_allied(board: &BoardState, player: PlayerId) -> UnitMatch<'_> {
    Match::new(move |u| board.is_allied(board.unit(u).owner, player))
}

pub fn unit_is_enemy(board: &BoardState, player: PlayerId) -> UnitMatch<'_> {
    Match::new(move |u| board.is_enemy_unit(u, player))
}

pub fn unit_is_land(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).is_land())
}

pub fn unit_is_sea(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).is_sea())
}

pub fn unit_is_air(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).is_air())
}

pub fn unit_is_infrastructure(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).is_infrastructure)
}

pub fn unit_is_carrier(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).is_carrier())
}

pub fn unit_can_land_on_carrier(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).carrier_cost > 0)
}

pub fn unit_is_transport(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).is_transport())
}

pub fn unit_can_evade(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).can_evade)
}

pub fn unit_is_destroyer(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit_type(u).is_destroyer)
}

pub fn unit_has_movement_left(board: &BoardState) -> UnitMatch<'_> {
    Match::new(move |u| board.unit(u).movement_left > 0)
}

/// Owned land units that fit aboard a transport and are not already loaded.
pub fn unit_is_owned_transportable(board: &BoardState, player: PlayerId) -> UnitMatch<'_> {
    Match::new(move |u| {
        let unit = board.unit(u);
        let ty = board.unit_type(u);
        unit.owner == player && ty.is_land() && ty.transport_cost > 0 && unit.transported_by.is_none()
    })
}

/// Units that take part in a battle in `t`.
///
/// Infrastructure never fights. Sea units do not fight on land and land
/// units do not fight at sea. When transport casualties are restricted, sea
/// transports that are not combat transports are left out as well.
pub fn unit_can_be_in_battle(board: &BoardState, t: TerritoryId) -> UnitMatch<'_> {
    let water = board.territory(t).is_water;
    let restricted = board.rules.transport_casualties_restricted;
    Match::new(move |u| {
        let ty = board.unit_type(u);
        if ty.is_infrastructure {
            return false;
        }
        if water && ty.is_land() {
            return false;
        }
        if !water && ty.is_sea() {
            return false;
        }
        !(restricted && ty.is_non_combat_sea_transport())
    })
}

// --- territories ---

pub fn territory_is_water(board: &BoardState) -> TerritoryMatch<'_> {
    Match::new(move |t| board.territory(t).is_water)
}

pub fn territory_is_land(board: &BoardState) -> TerritoryMatch<'_> {
    Match::new(move |t| !board.territory(t).is_water)
}

pub fn territory_is_passable(board: &BoardState) -> TerritoryMatch<'_> {
    Match::new(move |t| !board.territory(t).impassable)
}

pub fn territory_is_allied(board: &BoardState, player: PlayerId) -> TerritoryMatch<'_> {
    Match::new(move |t| board.is_allied_territory(t, player))
}

pub fn territory_is_enemy(board: &BoardState, player: PlayerId) -> TerritoryMatch<'_> {
    Match::new(move |t| board.is_enemy_territory(t, player))
}

pub fn territory_has_enemy_units(board: &BoardState, player: PlayerId) -> TerritoryMatch<'_> {
    Match::new(move |t| board.has_enemy_units(t, player))
}

pub fn territory_has_factory(board: &BoardState) -> TerritoryMatch<'_> {
    Match::new(move |t| board.has_factory(t))
}

pub fn territory_is_in(list: &[TerritoryId]) -> TerritoryMatch<'_> {
    Match::new(move |t| list.contains(&t))
}

/// Land a land unit could ever enter: passable and not water.
pub fn territory_can_potentially_move_land_units(board: &BoardState) -> TerritoryMatch<'_> {
    territory_is_land(board).and(territory_is_passable(board))
}

/// Enemy-held territory, or territory the player has written off as unholdable.
pub fn territory_is_enemy_or_cant_be_held<'a>(
    board: &'a BoardState,
    player: PlayerId,
    cant_be_held: &'a [TerritoryId],
) -> TerritoryMatch<'a> {
    territory_is_enemy(board, player).or(territory_is_in(cant_be_held))
}

/// Allied land with no adjacent enemy land.
pub fn territory_is_allied_land_without_enemy_neighbors(
    board: &BoardState,
    player: PlayerId,
) -> TerritoryMatch<'_> {
    Match::new(move |t| {
        let territory = board.territory(t);
        !territory.is_water
            && board.is_allied_territory(t, player)
            && !board
                .neighbors(t)
                .iter()
                .any(|&n| !board.territory(n).is_water && board.is_enemy_territory(n, player))
    })
}

// --- movement ---

/// True if `t` holds an enemy unit that would stop movement.
fn has_blocking_enemy(board: &BoardState, t: TerritoryId, player: PlayerId) -> bool {
    board
        .units_in(t)
        .iter()
        .any(|&u| board.is_enemy_unit(u, player) && !board.unit_type(u).is_infrastructure)
}

/// Passable water free of enemy units other than infrastructure.
///
/// Outside combat moves, enemy-owned sea zones are closed when the rules
/// forbid non-combat naval moves into controlled waters. Canals are edge
/// properties and are checked with [`no_canal_between`].
pub fn territory_can_move_sea_units_through(
    board: &BoardState,
    player: PlayerId,
    is_combat_move: bool,
) -> TerritoryMatch<'_> {
    let closes_controlled = !is_combat_move && board.rules.naval_may_not_non_combat_into_controlled;
    Match::new(move |t| {
        let territory = board.territory(t);
        if closes_controlled && territory.owner.is_some_and(|o| !board.is_allied(o, player)) {
            return false;
        }
        territory.is_water && !territory.impassable && !has_blocking_enemy(board, t, player)
    })
}

/// Enemy land a blitzing unit may race through: owned by an enemy, empty of
/// enemy fighting units and not in blitz-stopping terrain.
pub fn territory_is_blitzable(board: &BoardState, player: PlayerId) -> TerritoryMatch<'_> {
    Match::new(move |t| {
        let territory = board.territory(t);
        !territory.is_water
            && !territory.impassable
            && !territory.terrain.stops_blitz
            && territory.owner.is_some_and(|o| !board.is_allied(o, player))
            && !has_blocking_enemy(board, t, player)
    })
}

/// Land `unit` may pass through on its way to a target.
///
/// Always allied passable land without enemy units. In a combat move a
/// blitz unit whose starting terrain does not stop blitzing may also pass
/// through blitzable enemy land.
pub fn territory_can_move_land_units_through(
    board: &BoardState,
    player: PlayerId,
    unit: UnitId,
    start: TerritoryId,
    is_combat_move: bool,
) -> TerritoryMatch<'_> {
    let can_blitz = is_combat_move
        && board.unit_type(unit).can_blitz
        && !board.territory(start).terrain.stops_blitz;
    let blitzable = territory_is_blitzable(board, player);
    Match::new(move |t| {
        let territory = board.territory(t);
        let friendly = !territory.is_water
            && !territory.impassable
            && board.is_allied_territory(t, player)
            && !has_blocking_enemy(board, t, player);
        friendly || (can_blitz && blitzable.test(t))
    })
}

/// Passable territory without enemy anti-aircraft units.
pub fn territory_can_move_air_units_and_no_aa(board: &BoardState, player: PlayerId) -> TerritoryMatch<'_> {
    Match::new(move |t| {
        !board.territory(t).impassable
            && !board
                .units_in(t)
                .iter()
                .any(|&u| board.is_enemy_unit(u, player) && board.unit_type(u).is_aa)
    })
}

/// Returns false if a canal lies between `from` and `to` that `player` may not use.
pub fn no_canal_between(board: &BoardState, player: PlayerId, from: TerritoryId, to: TerritoryId) -> bool {
    board.canals.iter().filter(|c| c.connects(from, to)).all(|canal| {
        canal
            .controlled_by
            .iter()
            .all(|&land| board.is_allied_territory(land, player))
    })
}
