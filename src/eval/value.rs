//! Territory valuation.
//!
//! A land territory is worth what it brings into reach: enemy capitals and
//! factories decayed by `1/2^distance` (and by `1/2^rank` for every target
//! after the nearest), plus the production of nearby enemy land. A sea zone
//! is worth the land targets a fleet there could reach.
//!
//! Land values only read the board, so they are computed in parallel.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use super::targets::{
    find_enemy_capitals_and_factories_value, find_max_land_mass_size,
    find_nearby_enemy_capitals_and_factories,
};
use crate::board::matches::{
    no_canal_between, territory_can_potentially_move_land_units,
    territory_is_allied_land_without_enemy_neighbors, territory_is_enemy_or_cant_be_held,
};
use crate::board::{BoardState, PlayerId, TerritoryId};
use crate::combat::estimate_strength;
use crate::config::PlannerConfig;

/// Relative value of conquering `t`.
///
/// `3 × production`, doubled when an enemy factory stands there. Neutral
/// land subtracts the expected cost of beating its garrison, estimated as
/// one casualty per 8 points of garrison strength at `min_cost_per_hit_point`
/// each.
pub fn find_territory_attack_value(
    board: &BoardState,
    player: PlayerId,
    t: TerritoryId,
    min_cost_per_hit_point: f64,
) -> f64 {
    let territory = board.territory(t);
    let enemy_factory = !territory.is_water
        && board.is_enemy_territory(t, player)
        && board.has_factory(t);
    let mut value = 3.0 * territory.production as f64 * if enemy_factory { 2.0 } else { 1.0 };
    if territory.is_neutral_land() {
        let strength = estimate_strength(board, t, board.units_in(t), &[], false);
        value -= strength / 8.0 * min_cost_per_hit_point;
    }
    value
}

/// Inputs shared by every valuation within one call.
pub struct Valuation<'a> {
    board: &'a BoardState,
    config: &'a PlannerConfig,
    player: PlayerId,
    cant_be_held: &'a [TerritoryId],
    to_attack: &'a [TerritoryId],
    min_cost_per_hit_point: f64,
    max_land_mass: usize,
    targets: BTreeMap<TerritoryId, f64>,
}

impl<'a> Valuation<'a> {
    pub fn new(
        board: &'a BoardState,
        config: &'a PlannerConfig,
        player: PlayerId,
        cant_be_held: &'a [TerritoryId],
        to_attack: &'a [TerritoryId],
        min_cost_per_hit_point: f64,
    ) -> Self {
        let max_land_mass = find_max_land_mass_size(board);
        let targets = find_enemy_capitals_and_factories_value(
            board,
            player,
            max_land_mass,
            config.land_mass_distance,
            cant_be_held,
            to_attack,
        );
        Valuation {
            board,
            config,
            player,
            cant_be_held,
            to_attack,
            min_cost_per_hit_point,
            max_land_mass,
            targets,
        }
    }

    /// Enemy capitals and factories with their base values.
    pub fn targets(&self) -> &BTreeMap<TerritoryId, f64> {
        &self.targets
    }

    pub fn max_land_mass(&self) -> usize {
        self.max_land_mass
    }

    fn land_step(&self) -> impl Fn(TerritoryId, TerritoryId) -> bool + '_ {
        let can_move_land = territory_can_potentially_move_land_units(self.board);
        move |from, to| can_move_land.test(to) && no_canal_between(self.board, self.player, from, to)
    }

    fn sea_step(&self, end: TerritoryId) -> impl Fn(TerritoryId, TerritoryId) -> bool + '_ {
        move |from, to| {
            let territory = self.board.territory(to);
            (to == end || (territory.is_water && !territory.impassable))
                && no_canal_between(self.board, self.player, from, to)
        }
    }

    /// Sums decayed target values, halving each one after the best.
    fn capital_term(&self, mut values: Vec<f64>) -> f64 {
        values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        values
            .iter()
            .enumerate()
            .map(|(i, v)| v / 2f64.powi(i as i32))
            .sum()
    }

    fn nearby_targets(&self, t: TerritoryId) -> Vec<TerritoryId> {
        find_nearby_enemy_capitals_and_factories(
            self.board,
            t,
            &self.targets,
            self.config.target_search_distance,
        )
    }

    pub fn find_land_value(&self, t: TerritoryId) -> f64 {
        if self.cant_be_held.contains(&t) {
            return 0.0;
        }
        let board = self.board;
        let step = self.land_step();

        let values: Vec<f64> = self
            .nearby_targets(t)
            .into_iter()
            .filter_map(|target| {
                let distance = board.distance_with_steps(t, target, &step)?;
                (distance > 0).then(|| self.targets[&target] / 2f64.powi(distance as i32))
            })
            .collect();
        let capital_value = self.capital_term(values);

        let can_move_land = territory_can_potentially_move_land_units(board);
        let enemy_or_cant_be_held =
            territory_is_enemy_or_cant_be_held(board, self.player, self.cant_be_held);
        let quiet_allied = territory_is_allied_land_without_enemy_neighbors(board, self.player);
        let mut nearby_enemy_value = 0.0;
        for n in board.neighbors_within(t, self.config.nearby_land_distance, |n| can_move_land.test(n)) {
            if !enemy_or_cant_be_held.test(n) || self.to_attack.contains(&n) {
                continue;
            }
            let Some(distance) = board.distance_with_steps(t, n, &step) else {
                continue;
            };
            if distance == 0 {
                continue;
            }
            let mut value = board.territory(n).production as f64;
            if board.territory(n).is_neutral_land() {
                value = find_territory_attack_value(board, self.player, n, self.min_cost_per_hit_point)
                    / 3.0;
            } else if quiet_allied.test(n) {
                value *= 0.1;
            }
            if value > 0.0 {
                nearby_enemy_value += value / 2f64.powi(distance as i32);
            }
        }

        let land_mass = 1 + board
            .neighbors_within(t, self.config.land_mass_distance, |n| can_move_land.test(n))
            .len();
        let mut value =
            nearby_enemy_value * land_mass as f64 / self.max_land_mass as f64 + capital_value;
        if board.has_factory(t) {
            value *= 1.1;
        }
        value
    }

    /// Value of a sea zone. Land values computed along the way are cached in
    /// `land_values`.
    pub fn find_water_value(&self, t: TerritoryId, land_values: &mut BTreeMap<TerritoryId, f64>) -> f64 {
        let board = self.board;
        let has_water_neighbor = board.neighbors(t).iter().any(|&n| board.territory(n).is_water);
        if self.cant_be_held.contains(&t) || !has_water_neighbor {
            return 0.0;
        }

        let values: Vec<f64> = self
            .nearby_targets(t)
            .into_iter()
            .filter_map(|target| {
                let route = board.route_with_steps(t, target, self.sea_step(target))?;
                let distance = route.len() as i32;
                (distance > 0).then(|| self.targets[&target] / 2f64.powi(distance))
            })
            .collect();
        let capital_value = self.capital_term(values);

        let can_move_sea = |n: TerritoryId| {
            let territory = board.territory(n);
            territory.is_water && !territory.impassable
        };
        let can_move_land = territory_can_potentially_move_land_units(board);
        let enemy_or_cant_be_held =
            territory_is_enemy_or_cant_be_held(board, self.player, self.cant_be_held);
        let radius = self.config.nearby_water_distance;
        let mut nearby_land_value = 0.0;
        for n in board.neighbors_within_ignore_end(t, radius, can_move_sea) {
            if !can_move_land.test(n) || self.to_attack.contains(&n) {
                continue;
            }
            let Some(route) = board.route_with_steps(t, n, self.sea_step(n)) else {
                continue;
            };
            let distance = route.len() as u32;
            if distance == 0 || distance > radius {
                continue;
            }
            if enemy_or_cant_be_held.test(n) {
                nearby_land_value += if board.territory(n).is_neutral_land() {
                    find_territory_attack_value(board, self.player, n, self.min_cost_per_hit_point)
                } else {
                    board.territory(n).production as f64
                };
            }
            let land_value = *land_values
                .entry(n)
                .or_insert_with(|| self.find_land_value(n));
            nearby_land_value += land_value;
        }

        capital_value / 100.0 + nearby_land_value / 10.0
    }
}

/// Values every territory for `player`: land first, then water.
pub fn find_territory_values(
    board: &BoardState,
    config: &PlannerConfig,
    player: PlayerId,
    cant_be_held: &[TerritoryId],
    to_attack: &[TerritoryId],
    min_cost_per_hit_point: f64,
) -> BTreeMap<TerritoryId, f64> {
    let valuation = Valuation::new(
        board,
        config,
        player,
        cant_be_held,
        to_attack,
        min_cost_per_hit_point,
    );
    let land: Vec<TerritoryId> = board
        .territory_ids()
        .filter(|&t| !board.territory(t).is_water)
        .collect();
    let mut values: BTreeMap<TerritoryId, f64> = land
        .par_iter()
        .map(|&t| (t, valuation.find_land_value(t)))
        .collect();
    for t in board.territory_ids().filter(|&t| board.territory(t).is_water) {
        let value = valuation.find_water_value(t, &mut values);
        values.insert(t, value);
    }
    debug!(
        territories = values.len(),
        targets = valuation.targets().len(),
        "territory values computed"
    );
    values
}

/// Values sea zones by the convoy production and enemy fleets around them.
///
/// Sea zones within `sea_value_distance` hops feed two sums: one over the
/// enemy or unholdable zones (their production) and one over zones holding
/// enemy units (their unit count). Both sums also add the enemy unit count
/// of each target and decay by `1/2^distance`. Production is weighted by 100.
pub fn find_sea_territory_values(
    board: &BoardState,
    config: &PlannerConfig,
    player: PlayerId,
    cant_be_held: &[TerritoryId],
) -> BTreeMap<TerritoryId, f64> {
    let can_move_sea = |n: TerritoryId| {
        let territory = board.territory(n);
        territory.is_water && !territory.impassable
    };
    let enemy_or_cant_be_held = territory_is_enemy_or_cant_be_held(board, player, cant_be_held);
    let enemy_count = |n: TerritoryId| board.enemy_units_in(n, player).len() as f64;
    board
        .territory_ids()
        .filter(|&t| board.territory(t).is_water)
        .map(|t| {
            let has_water_neighbor = board.neighbors(t).iter().any(|&n| can_move_sea(n));
            if cant_be_held.contains(&t) || !has_water_neighbor {
                return (t, 0.0);
            }
            let nearby: Vec<TerritoryId> = board
                .neighbors_within(t, config.sea_value_distance, can_move_sea)
                .into_iter()
                .collect();
            let enemy_seas = enemy_or_cant_be_held.filter(&nearby);
            let production = value_to_targets(board, player, t, &enemy_seas, |n| {
                board.territory(n).production as f64
            });
            let fleets: Vec<TerritoryId> = nearby
                .iter()
                .copied()
                .filter(|&n| board.has_enemy_units(n, player))
                .collect();
            let fleet_value = value_to_targets(board, player, t, &fleets, enemy_count);
            (t, 100.0 * production + fleet_value)
        })
        .collect()
}

/// Sums `value(target)` over targets reachable by sea, each decayed by
/// `1/2^distance`.
fn value_to_targets(
    board: &BoardState,
    player: PlayerId,
    t: TerritoryId,
    targets: &[TerritoryId],
    value: impl Fn(TerritoryId) -> f64,
) -> f64 {
    let can_move_sea = |n: TerritoryId| {
        let territory = board.territory(n);
        territory.is_water && !territory.impassable
    };
    targets
        .iter()
        .filter_map(|&target| {
            let route = board.route_with_steps(t, target, |from, to| {
                can_move_sea(to) && no_canal_between(board, player, from, to)
            })?;
            let distance = route.len() as i32;
            (distance > 0).then(|| value(target) / 2f64.powi(distance))
        })
        .sum()
}
