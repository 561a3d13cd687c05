//! Local superiority checks.
//!
//! Used by purchasing to decide whether a territory or sea zone is already
//! safe enough that resources can go elsewhere.

use std::collections::BTreeMap;

use tracing::trace;

use super::odds::OddsCalculator;
use super::power::{estimate_strength, estimate_strength_difference};
use crate::board::matches::{
    no_canal_between, territory_can_potentially_move_land_units, unit_is_allied, unit_is_land,
};
use crate::board::{BoardState, PlayerId, TerritoryId, UnitId};

/// Units already queued for placement, keyed by the territory they go to.
pub type PlaceUnits = BTreeMap<TerritoryId, Vec<UnitId>>;

/// Returns true if no enemy land force within `distance` hops outclasses
/// the allied units that could reach `t` one move sooner.
///
/// Radii are tested from 2 up to `distance`. At radius `i` enemy units come
/// from land within `i` hops and allied units from land within `i - 1` hops,
/// plus anything queued for placement there.
pub fn territory_has_local_land_superiority(
    board: &BoardState,
    t: TerritoryId,
    distance: u32,
    player: PlayerId,
    place_units: &PlaceUnits,
) -> bool {
    let can_move_land = territory_can_potentially_move_land_units(board);
    let allied = unit_is_allied(board, player);
    for i in 2..=distance {
        let mut enemy_area = board.neighbors_within(t, i, |n| can_move_land.test(n));
        enemy_area.insert(t);
        let enemy_units: Vec<UnitId> = enemy_area
            .iter()
            .flat_map(|&n| board.units_in(n))
            .copied()
            .filter(|&u| board.is_enemy_unit(u, player))
            .collect();

        let mut allied_area = board.neighbors_within(t, i - 1, |n| can_move_land.test(n));
        allied_area.insert(t);
        let mut allied_units: Vec<UnitId> = allied_area
            .iter()
            .flat_map(|&n| board.units_in(n))
            .copied()
            .filter(|&u| allied.test(u))
            .collect();
        for (place, units) in place_units {
            if allied_area.contains(place) {
                allied_units.extend_from_slice(units);
            }
        }

        let difference = estimate_strength_difference(board, t, &enemy_units, &allied_units);
        trace!(
            territory = %board.territory(t).name,
            difference,
            radius = i,
            enemy = enemy_units.len(),
            allied = allied_units.len(),
            "local land strength"
        );
        if difference > 50.0 {
            return false;
        }
    }
    true
}

/// Hops from sea zone `t` to the nearest enemy-held land, moving over water.
pub fn closest_enemy_land_distance_over_water(
    board: &BoardState,
    player: PlayerId,
    t: TerritoryId,
) -> Option<u32> {
    let enemy_land = |n: TerritoryId| {
        let territory = board.territory(n);
        !territory.is_water && territory.owner.is_some_and(|o| !board.is_allied(o, player))
    };
    let touches_enemy = |sea: TerritoryId| board.neighbors(sea).iter().any(|&n| enemy_land(n));
    if touches_enemy(t) {
        return Some(1);
    }
    let mut closest = None;
    board.breadth_first(
        t,
        |n| board.territory(n).is_water,
        |sea, distance| {
            if closest.is_none() && touches_enemy(sea) {
                closest = Some(distance + 1);
            }
            closest.is_none()
        },
    );
    closest
}

/// Returns true if the player's fleet around sea zone `t` can both hold
/// off and strike the nearby enemy fleet.
///
/// Three tests, all required: the enemy's combined sea and air attack does
/// not beat the local fleet; the local fleet plus half the weight of allied
/// ships outclasses the enemy ships; and an attack on the strongest single
/// enemy fleet in range is estimated to gain value.
pub fn territory_has_local_naval_superiority(
    calc: &OddsCalculator,
    board: &BoardState,
    t: TerritoryId,
    player: PlayerId,
    place_units: &PlaceUnits,
    units_to_place: &[UnitId],
) -> bool {
    let land_distance = closest_enemy_land_distance_over_water(board, player, t).unwrap_or(10);
    let enemy_distance = 3.max(land_distance + 1);
    let allied_distance = (enemy_distance + 1) / 2;
    let is_water = |n: TerritoryId| board.territory(n).is_water;

    let nearby = board.neighbors_within(t, enemy_distance, |_| true);
    let mut enemy_seas = board.neighbors_within(t, enemy_distance, is_water);
    enemy_seas.insert(t);
    let mut allied_seas = board.neighbors_within(t, allied_distance, is_water);
    allied_seas.insert(t);

    let is_land = unit_is_land(board);
    let mut my_units = units_to_place.to_vec();
    let mut allied_not_owned = Vec::new();
    for &sea in &allied_seas {
        for &u in board.units_in(sea) {
            let owner = board.unit(u).owner;
            if owner == player && !is_land.test(u) {
                my_units.push(u);
            } else if owner != player && board.is_allied(owner, player) {
                allied_not_owned.push(u);
            }
        }
        if let Some(queued) = place_units.get(&sea) {
            my_units.extend_from_slice(queued);
        }
    }
    my_units.extend_from_slice(&allied_not_owned);

    let enemy_air: Vec<UnitId> = nearby
        .iter()
        .filter(|&&n| !is_water(n))
        .flat_map(|&n| board.units_in(n))
        .copied()
        .filter(|&u| board.is_enemy_unit(u, player) && board.unit_type(u).is_air())
        .collect();

    let mut enemy_sea_units = Vec::new();
    let mut strongest_fleet: Option<Vec<UnitId>> = None;
    let mut strongest = f64::NEG_INFINITY;
    for &sea in &enemy_seas {
        let fleet: Vec<UnitId> = board
            .units_in(sea)
            .iter()
            .copied()
            .filter(|&u| board.is_enemy_unit(u, player) && !is_land.test(u))
            .collect();
        let Some(&first) = fleet.first() else {
            continue;
        };
        let owner = board.unit(first).owner;
        let Some(route) = board.route_with_steps(t, sea, |from, to| {
            is_water(to) && no_canal_between(board, owner, from, to)
        }) else {
            continue;
        };
        if route.len() as u32 <= enemy_distance {
            let strength = estimate_strength(board, t, &my_units, &fleet, false);
            if strength > strongest {
                strongest = strength;
                strongest_fleet = Some(fleet.clone());
            }
            enemy_sea_units.extend(fleet);
        }
    }

    let enemy_attackers = [enemy_sea_units.as_slice(), enemy_air.as_slice()].concat();
    let defense_difference = estimate_strength_difference(board, t, &enemy_attackers, &my_units);
    trace!(
        territory = %board.territory(t).name,
        enemy_distance,
        allied_distance,
        defense_difference,
        "enemy naval attack strength"
    );
    if defense_difference >= 50.0 {
        return false;
    }

    let attack_difference = estimate_strength_difference(board, t, &my_units, &enemy_sea_units)
        + 0.5 * estimate_strength_difference(board, t, &allied_not_owned, &enemy_sea_units);
    trace!(
        territory = %board.territory(t).name,
        attack_difference,
        "allied naval attack strength"
    );
    if attack_difference <= 50.0 {
        return false;
    }

    match strongest_fleet {
        Some(fleet) => {
            let result = calc.estimate_attack_battle_results(board, t, &my_units, &fleet, &[]);
            result.value_swing > 0.0
        }
        None => true,
    }
}
