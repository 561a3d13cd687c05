//! Spending the production budget.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info, trace};

use super::option::{PurchaseOption, PurchaseOptions};
use super::validate::{
    find_purchase_options_for_territory, remove_invalid_purchase_options, units_to_consume,
    PlacementValidator, PurchaseLimits,
};
use crate::board::{BoardState, PlayerId, TerritoryId, UnitId};
use crate::error::PlanError;
use crate::planning::PlanningPass;

/// A territory units can be placed in, with its placement limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseTerritory {
    pub territory: TerritoryId,
    pub unit_production: u32,
}

/// Units `player` may produce in `t` this turn.
///
/// Land holding an owned factory produces up to its production value,
/// anything else produces nothing.
pub fn unit_production(board: &BoardState, t: TerritoryId, player: PlayerId) -> u32 {
    let territory = board.territory(t);
    let has_factory = board.units_in(t).iter().any(|&u| {
        let unit = board.unit(u);
        unit.owner == player && unit.transported_by.is_none() && board.unit_type(u).can_produce
    });
    if territory.is_water || territory.owner != Some(player) || !has_factory {
        return 0;
    }
    territory.production.max(0) as u32
}

/// Owned passable land with an owned factory, in territory order.
pub fn find_purchase_territories(board: &BoardState, player: PlayerId) -> Vec<PurchaseTerritory> {
    board
        .territory_ids()
        .filter(|&t| !board.territory(t).impassable)
        .filter_map(|t| {
            let unit_production = unit_production(board, t, player);
            (unit_production > 0).then_some(PurchaseTerritory { territory: t, unit_production })
        })
        .collect()
}

/// Every passable territory `player` owns or has units in, each allowing a
/// single bid unit to start with.
pub fn find_bid_territories(board: &BoardState, player: PlayerId) -> Vec<PurchaseTerritory> {
    info!(player = %board.player(player).name, "finding bid territories");
    board
        .territory_ids()
        .filter(|&t| {
            let territory = board.territory(t);
            !territory.impassable
                && (territory.owner == Some(player)
                    || board.units_in(t).iter().any(|&u| board.unit(u).owner == player))
        })
        .map(|territory| PurchaseTerritory { territory, unit_production: 1 })
        .collect()
}

/// Raises every bid territory's limit by one for the next bid round.
pub fn increment_bid_production(territories: &mut [PurchaseTerritory]) {
    for pt in territories {
        pt.unit_production += 1;
    }
}

/// Constructions that may be placed per territory in one turn, summed over
/// the distinct construction types among `options`.
pub fn max_constructions(options: &[PurchaseOption]) -> u32 {
    let mut per_type: BTreeMap<&str, u32> = BTreeMap::new();
    for rule in options.iter().filter_map(|o| o.construction.as_ref()) {
        per_type.insert(rule.construction_type.as_str(), rule.per_turn);
    }
    per_type.values().sum()
}

/// Buys as many of the best affordable defender as `t` can produce.
///
/// The option with the highest defense efficiency among those placeable in
/// `t` and within the player's resources is chosen. The bought units are
/// spawned as planned units owned by `player` and returned; they are not
/// charged against the resources.
pub fn find_max_purchase_defenders(
    board: &mut BoardState,
    validator: &dyn PlacementValidator,
    player: PlayerId,
    t: TerritoryId,
    land_options: &[PurchaseOption],
) -> Vec<UnitId> {
    let resources = board.resources(player);
    let options = find_purchase_options_for_territory(board, validator, player, land_options, t);
    let mut best: Option<&PurchaseOption> = None;
    let mut max_efficiency = 0.0;
    for o in &options {
        if o.defense_efficiency > max_efficiency && o.cost <= resources {
            best = Some(o);
            max_efficiency = o.defense_efficiency;
        }
    }
    let Some(best) = best else {
        return Vec::new();
    };
    debug!(territory = %board.territory(t).name, option = %best.name, "best defense option");

    let mut remaining_production = unit_production(board, t, player);
    let mut spent = 0;
    let mut units = Vec::new();
    // A free option would otherwise never exhaust the resources.
    while best.cost <= resources - spent && remaining_production >= best.quantity && best.quantity > 0 {
        spent += best.cost.max(1);
        remaining_production -= best.quantity;
        units.extend(board.spawn_units(best.unit_type, best.quantity, player, t));
    }
    debug!(territory = %board.territory(t).name, defenders = units.len(), "potential purchased defenders");
    units
}

/// Picks one entry at random, weighted by its efficiency.
///
/// Builds a cumulative percentage table in order and returns the first
/// entry whose upper bound exceeds the sampled value, or the first
/// entry if rounding leaves the sample above every bound. Returns `None`
/// when the weights sum to zero.
pub fn randomize_purchase_option<'a, T>(
    weighted: &'a [(T, f64)],
    rng: &mut impl Rng,
) -> Option<&'a T> {
    let total: f64 = weighted.iter().map(|(_, w)| w).sum();
    if total == 0.0 || weighted.is_empty() {
        return None;
    }
    let mut upper = 0.0;
    let bounds: Vec<f64> = weighted
        .iter()
        .map(|(_, w)| {
            upper += w / total * 100.0;
            upper
        })
        .collect();
    let sample = rng.gen::<f64>() * 100.0;
    trace!(sample, "purchase option roll");
    let index = bounds.iter().position(|&b| sample < b).unwrap_or(0);
    Some(&weighted[index].0)
}

/// Hop distance from `t` to the nearest enemy-held land over land.
fn closest_enemy_land_distance(board: &BoardState, player: PlayerId, t: TerritoryId) -> Option<u32> {
    let mut found = None;
    board.breadth_first(
        t,
        |n| {
            let territory = board.territory(n);
            !territory.is_water && !territory.impassable
        },
        |n, distance| {
            if found.is_none() && board.is_enemy_territory(n, player) {
                found = Some(distance);
            }
            found.is_none()
        },
    );
    found
}

/// Sharpens an efficiency so the best options dominate the random pick.
pub(crate) fn sharpen(efficiency: f64, quantity: u32) -> f64 {
    efficiency.powi(30) / f64::from(quantity.max(1))
}

/// Randomized land purchasing for one purchase territory.
///
/// Alternates between cheap fodder and stronger units: fodder is bought
/// while its share of the purchase stays under `80 − 5 × enemy distance`
/// percent. Otherwise defense-heavy options are preferred once the bought
/// units attack better than they defend, attack-heavy options before that.
/// Options are re-filtered after every pick, so the purchase never exceeds
/// `resources`, the territory's production or any build cap. Units already
/// queued for placement there count against its production. Consumed units
/// are queued on the pass and the bought units are queued for placement.
pub fn purchase_land_units(
    board: &mut BoardState,
    pass: &mut PlanningPass,
    validator: &dyn PlacementValidator,
    territory: &PurchaseTerritory,
    options: &PurchaseOptions,
    resources: &mut i32,
    rng: &mut impl Rng,
) -> Result<Vec<UnitId>, PlanError> {
    let player = pass.player();
    let t = territory.territory;
    let mut remaining_production = territory
        .unit_production
        .saturating_sub(pass.place_units(t).len() as u32);
    if remaining_production == 0 || *resources <= 0 {
        return Ok(Vec::new());
    }
    let mut land = find_purchase_options_for_territory(board, validator, player, &options.land, t);

    let enemy_distance = closest_enemy_land_distance(board, player, t)
        .filter(|&d| d > 0)
        .unwrap_or(10);
    let fodder_percent = 80.0 - f64::from(enemy_distance) * 5.0;
    let fodder_efficiency = land
        .iter()
        .map(|o| o.hit_point_efficiency)
        .fold(0.0, f64::max);

    let mut bought: Vec<UnitId> = Vec::new();
    let mut fodder_units = 0u32;
    let mut attack_minus_defense = 0.0;
    let mut select_fodder = true;
    loop {
        let limits = PurchaseLimits {
            resources: *resources,
            remaining_production,
            remaining_constructions: 0,
            units_to_place: &bought,
            territory: Some(t),
        };
        remove_invalid_purchase_options(board, pass, player, &mut land, &limits);
        if land.is_empty() {
            break;
        }

        let (kind, weighted): (&str, Vec<(usize, f64)>) = if select_fodder {
            let fodder = land
                .iter()
                .enumerate()
                .filter(|(_, o)| o.hit_point_efficiency >= fodder_efficiency * 0.9)
                .map(|(i, o)| (i, sharpen(o.hit_point_efficiency, o.quantity)))
                .collect();
            ("fodder", fodder)
        } else if attack_minus_defense > 0.0 {
            let defense = land
                .iter()
                .enumerate()
                .map(|(i, o)| (i, sharpen(o.defense_efficiency, o.quantity)))
                .collect();
            ("defense", defense)
        } else {
            let attack = land
                .iter()
                .enumerate()
                .map(|(i, o)| (i, sharpen(o.attack_efficiency, o.quantity)))
                .collect();
            ("attack", attack)
        };
        let Some(&index) = randomize_purchase_option(&weighted, rng) else {
            break;
        };
        let option = land[index].clone();
        trace!(territory = %board.territory(t).name, kind, option = %option.name, "unit selected");

        let units = board.spawn_units(option.unit_type, option.quantity, player, t);
        if option.consumes_units() {
            let consumed = units_to_consume(board, pass, player, t, &units)?;
            pass.queue_consumption(&consumed);
        }
        *resources -= option.cost;
        remaining_production -= option.quantity;
        if select_fodder {
            fodder_units += option.quantity;
        }
        attack_minus_defense += option.attack - option.defense;
        bought.extend(units);
        select_fodder = f64::from(fodder_units) / bought.len() as f64 * 100.0 <= fodder_percent;
    }

    if !bought.is_empty() {
        info!(
            territory = %board.territory(t).name,
            units = bought.len(),
            resources_left = *resources,
            "land units purchased"
        );
        pass.add_place_units(t, &bought);
    }
    Ok(bought)
}
