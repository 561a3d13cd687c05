//! Turn planning.
//!
//! The [`Planner`] runs one whole pass for a player: it values the map,
//! collects what each unit can attack, assigns attackers greedily until the
//! most valuable targets are won, adds amphibious landings and bombardment,
//! routes everything through the move validator and finally spends the
//! budget, defenders first.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, trace};

use crate::board::matches::territory_can_potentially_move_land_units;
use crate::board::{BoardState, PlayerId, TerritoryId, UnitId};
use crate::combat::{BattleOracle, DiceOracle, OddsCalculator};
use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::eval::{find_territory_attack_value, find_territory_values};
use crate::logistics::routes::route_for_group;
use crate::logistics::{
    calculate_amphib_routes, calculate_bombard_routes, calculate_move_routes,
    check_transport_defense, do_move, merge_moves, sea_route, units_to_transport_from_territories,
};
use crate::planning::{sort_unit_needed_options_then_attack, PlanningPass, PlanningTerritory, UnitOptions};
use crate::protocol::{purchase_commands, BattleSummary, TurnPlan};
use crate::purchase::allocate::sharpen;
use crate::purchase::{
    find_purchase_options_for_territory, find_purchase_territories, min_cost_per_hit_point,
    purchase_land_units, randomize_purchase_option, remove_invalid_purchase_options,
    units_to_consume, PlacementValidator, PurchaseLimits, PurchaseOption, PurchaseOptions,
    PurchaseTerritory,
};

/// A transport, its cargo and the sea zone it unloads from.
struct Landing {
    transport: UnitId,
    cargo: Vec<UnitId>,
    unload_from: TerritoryId,
}

/// Plans whole turns for one player at a time.
pub struct Planner {
    calc: OddsCalculator,
    rng: SmallRng,
}

impl Planner {
    /// Creates a planner backed by the dice oracle.
    ///
    /// A non-zero `config.seed` makes both the oracle and the purchase
    /// choices reproducible.
    pub fn new(config: PlannerConfig) -> Self {
        let oracle = if config.seed == 0 {
            DiceOracle::from_entropy()
        } else {
            DiceOracle::new(config.seed)
        };
        Planner::with_oracle(oracle, config)
    }

    pub fn with_oracle(oracle: impl BattleOracle + 'static, config: PlannerConfig) -> Self {
        let rng = if config.seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(config.seed)
        };
        Planner {
            calc: OddsCalculator::new(oracle, config),
            rng,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        self.calc.config()
    }

    pub fn calculator(&self) -> &OddsCalculator {
        &self.calc
    }

    /// Flag another thread can raise to stop the pass early.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.calc.stop_handle()
    }

    /// Plans `player`'s turn.
    ///
    /// Purchased units are added to the board's unit arena as planned units
    /// but never placed. A stopped pass returns what was decided so far with
    /// `cancelled` set.
    pub fn plan_turn(
        &mut self,
        board: &mut BoardState,
        player: PlayerId,
        catalog: &[PurchaseOption],
        validator: &mut dyn PlacementValidator,
    ) -> Result<TurnPlan, PlanError> {
        let config = self.calc.config().clone();
        info!(player = %board.player(player).name, round = board.round, "planning turn");
        let mut plan = TurnPlan {
            player: board.player(player).name.clone(),
            round: board.round,
            resources_left: board.resources(player),
            ..TurnPlan::default()
        };
        let mut pass = PlanningPass::new(player);
        let options = PurchaseOptions::new(catalog);

        // --- values ---
        let min_cost = min_cost_per_hit_point(&options.land);
        let min_cost = if min_cost.is_finite() { min_cost } else { 0.0 };
        let candidates = find_targets(board, player);
        let values = find_territory_values(board, &config, player, &[], &candidates, min_cost);
        let target_values: BTreeMap<TerritoryId, f64> = candidates
            .iter()
            .map(|&t| {
                let value = find_territory_attack_value(board, player, t, min_cost)
                    + values.get(&t).copied().unwrap_or(0.0);
                (t, value)
            })
            .collect();

        // --- attack options ---
        let unit_options = attack_options(board, player, &candidates);
        let targets = self.prioritize_targets(board, player, &unit_options, &target_values);
        if self.calc.is_cancelled() {
            plan.cancelled = true;
            return Ok(plan);
        }

        // --- assignment ---
        self.assign_attackers(board, &mut pass, &targets, unit_options)?;
        self.assign_amphibious(board, &mut pass, &targets)?;
        self.drop_lost_attacks(board, &mut pass, &targets);
        if self.calc.is_cancelled() {
            plan.cancelled = true;
            return Ok(plan);
        }

        // --- routes ---
        let mut moves = calculate_move_routes(board, &pass, true);
        moves.append(calculate_amphib_routes(board, &mut pass, true));
        moves.append(calculate_bombard_routes(board, &pass));
        merge_moves(&mut moves.moves);
        plan.moves_performed = do_move(board, validator, moves.moves.clone());
        plan.moves = moves.moves;
        plan.unroutable = moves.unroutable;
        plan.battles = self.battle_summaries(board, &mut pass, &targets)?;

        // --- purchases ---
        let mut resources = board.resources(player);
        let territories = find_purchase_territories(board, player);
        for territory in &territories {
            self.purchase_defenders(board, &mut pass, &*validator, territory, &options, &mut resources)?;
        }
        for territory in &territories {
            if self.calc.is_cancelled() {
                plan.cancelled = true;
                break;
            }
            purchase_land_units(
                board,
                &mut pass,
                &*validator,
                territory,
                &options,
                &mut resources,
                &mut self.rng,
            )?;
        }
        plan.purchases = purchase_commands(board, &pass.place_units_map());
        plan.consumed = pass.queued_consumption().iter().copied().collect();
        plan.resources_left = resources;

        info!(
            battles = plan.battles.len(),
            moves = plan.moves.len(),
            unroutable = plan.unroutable.len(),
            purchased = plan.units_purchased(),
            resources_left = resources,
            "turn planned"
        );
        Ok(plan)
    }

    /// Targets worth attacking, most valuable first.
    ///
    /// Targets the reachable units could not win even all together are
    /// dropped, as are neutrals whose garrison costs more than they are
    /// worth. Targets no unit reaches directly stay for amphibious landings.
    fn prioritize_targets(
        &self,
        board: &BoardState,
        player: PlayerId,
        unit_options: &UnitOptions,
        values: &BTreeMap<TerritoryId, f64>,
    ) -> Vec<TerritoryId> {
        let min_win = self.calc.config().min_win_percentage;
        let mut targets: Vec<(TerritoryId, f64)> = Vec::new();
        for (&t, &value) in values {
            if value < 0.0 {
                trace!(territory = %board.territory(t).name, value, "target not worth attacking");
                continue;
            }
            let attackers: Vec<UnitId> = unit_options
                .iter()
                .filter(|(_, reach)| reach.contains(&t))
                .map(|(u, _)| *u)
                .collect();
            if !attackers.is_empty() {
                let defenders = board.enemy_units_in(t, player);
                let result =
                    self.calc
                        .estimate_attack_battle_results(board, t, &attackers, &defenders, &[]);
                if result.win_percentage < min_win {
                    debug!(
                        territory = %board.territory(t).name,
                        win_percentage = result.win_percentage,
                        "target cannot be won"
                    );
                    continue;
                }
            }
            targets.push((t, value));
        }
        targets.sort_by(|a, b| b.1.total_cmp(&a.1));
        targets.into_iter().map(|(t, _)| t).collect()
    }

    /// Adds one unit at a time to the most valuable target it can still help
    /// win, re-ranking the units after every assignment.
    fn assign_attackers(
        &self,
        board: &BoardState,
        pass: &mut PlanningPass,
        targets: &[TerritoryId],
        unit_options: UnitOptions,
    ) -> Result<(), PlanError> {
        let win = self.calc.config().win_percentage;
        for &t in targets {
            pass.entry(t);
        }
        let mut options: UnitOptions = unit_options
            .into_iter()
            .filter_map(|(unit, reach)| {
                let ranked: Vec<TerritoryId> =
                    targets.iter().copied().filter(|t| reach.contains(t)).collect();
                (!ranked.is_empty()).then_some((unit, ranked))
            })
            .collect();

        while !options.is_empty() && !self.calc.is_cancelled() {
            sort_unit_needed_options_then_attack(board, &self.calc, pass, &mut options);
            let mut choice = None;
            for (i, (unit, reach)) in options.iter().enumerate() {
                if let Some(&t) = reach.iter().find(|&&t| !pass.is_won(&self.calc, board, t, win)) {
                    choice = Some((i, *unit, t));
                    break;
                }
            }
            let Some((i, unit, t)) = choice else {
                break;
            };
            options.remove(i);
            pass.assign_units(t, &[unit])?;
            trace!(unit = ?unit, territory = %board.territory(t).name, "attacker assigned");
        }
        Ok(())
    }

    /// Lands transported units on targets the direct attackers do not win.
    ///
    /// Convoys are gathered one transport at a time until the combined
    /// attack reaches the win percentage; they are committed only if it
    /// reaches at least the minimum win percentage. Ships that can bombard
    /// then join every landing they can reach.
    fn assign_amphibious(
        &self,
        board: &BoardState,
        pass: &mut PlanningPass,
        targets: &[TerritoryId],
    ) -> Result<(), PlanError> {
        let config = self.calc.config();
        let player = pass.player();
        for &t in targets {
            if board.territory(t).is_water || pass.is_won(&self.calc, board, t, config.win_percentage) {
                continue;
            }
            let zones: Vec<TerritoryId> = board
                .neighbors(t)
                .iter()
                .copied()
                .filter(|&n| board.territory(n).is_water && !board.has_enemy_units(n, player))
                .collect();
            if zones.is_empty() {
                continue;
            }

            let defenders = board.enemy_units_in(t, player);
            let mut attackers = pass.get(t).map(|pt| pt.units().to_vec()).unwrap_or_default();
            let mut claimed: Vec<UnitId> = pass.commitments().keys().copied().collect();
            let mut landings = Vec::new();
            let mut best = None;
            for transport in free_transports(board, pass) {
                let Some(landing) = self.plan_landing(board, player, transport, &zones, &claimed) else {
                    continue;
                };
                claimed.push(landing.transport);
                claimed.extend(&landing.cargo);
                attackers.extend(&landing.cargo);
                landings.push(landing);
                let result =
                    self.calc
                        .estimate_attack_battle_results(board, t, &attackers, &defenders, &[]);
                let done = result.is_won(config.win_percentage);
                best = Some(result);
                if done {
                    break;
                }
            }
            if !best.is_some_and(|r| r.is_won(config.min_win_percentage)) {
                continue;
            }

            debug!(
                territory = %board.territory(t).name,
                transports = landings.len(),
                "amphibious attack planned"
            );
            for landing in &landings {
                pass.assign_amphib(t, landing.transport, &landing.cargo, landing.unload_from)?;
            }
            self.assign_bombardment(board, pass, t, &zones)?;
        }
        Ok(())
    }

    /// A landing for `transport` on a target next to `zones`, if it can
    /// reach one of them with cargo and stand there safely.
    fn plan_landing(
        &self,
        board: &BoardState,
        player: PlayerId,
        transport: UnitId,
        zones: &[TerritoryId],
        claimed: &[UnitId],
    ) -> Option<Landing> {
        let start = board.unit_territory(transport);
        let movement = board.unit(transport).movement_left as usize;
        let unload_from = zones.iter().copied().find(|&z| {
            z == start || sea_route(board, player, start, z, true).is_some_and(|r| r.len() <= movement)
        })?;

        let shores: Vec<TerritoryId> = board
            .neighbors(start)
            .iter()
            .copied()
            .filter(|&n| !board.territory(n).is_water)
            .collect();
        let cargo = units_to_transport_from_territories(board, player, transport, &shores, claimed);
        if cargo.is_empty() || cargo.iter().any(|u| claimed.contains(u)) {
            return None;
        }

        let mut standing = PlanningTerritory::new(unload_from);
        standing.add_units(&[transport]);
        standing.set_max_enemy_units(enemy_attackers_near(board, player, unload_from, 2));
        if check_transport_defense(&self.calc, board, &mut standing) {
            debug!(
                transport = ?transport,
                zone = %board.territory(unload_from).name,
                "transport would need escorts"
            );
            return None;
        }
        Some(Landing {
            transport,
            cargo,
            unload_from,
        })
    }

    fn assign_bombardment(
        &self,
        board: &BoardState,
        pass: &mut PlanningPass,
        t: TerritoryId,
        zones: &[TerritoryId],
    ) -> Result<(), PlanError> {
        let player = pass.player();
        let ships: Vec<UnitId> = board
            .territory_ids()
            .flat_map(|z| board.units_in(z))
            .copied()
            .filter(|&u| {
                let unit = board.unit(u);
                let ty = board.unit_type(u);
                unit.owner == player
                    && ty.is_sea()
                    && ty.can_bombard
                    && unit.movement_left > 0
                    && !pass.is_committed(u)
            })
            .collect();
        for ship in ships {
            let start = board.unit_territory(ship);
            let movement = board.unit(ship).movement_left as usize;
            let from = zones.iter().copied().find(|&z| {
                z == start || sea_route(board, player, start, z, true).is_some_and(|r| r.len() <= movement)
            });
            if let Some(from) = from {
                pass.assign_bombard(t, ship, from)?;
            }
        }
        Ok(())
    }

    /// Releases the attackers of targets that end below the minimum win
    /// percentage. Targets with landings are kept.
    fn drop_lost_attacks(&self, board: &BoardState, pass: &mut PlanningPass, targets: &[TerritoryId]) {
        let min_win = self.calc.config().min_win_percentage;
        for &t in targets {
            let units = match pass.get(t) {
                Some(pt) if !pt.units().is_empty() && pt.amphib_attack_map().is_empty() => pt.units().to_vec(),
                _ => continue,
            };
            if pass.is_won(&self.calc, board, t, min_win) {
                continue;
            }
            debug!(territory = %board.territory(t).name, units = units.len(), "attack abandoned");
            for u in units {
                pass.release(u);
            }
        }
    }

    fn battle_summaries(
        &self,
        board: &BoardState,
        pass: &mut PlanningPass,
        targets: &[TerritoryId],
    ) -> Result<Vec<BattleSummary>, PlanError> {
        let mut summaries = Vec::new();
        for &t in targets {
            let (attackers, amphibious, bombarding) = match pass.get(t) {
                Some(pt) if !pt.units().is_empty() => (
                    pt.units().len(),
                    pt.amphib_attack_map().values().map(Vec::len).sum(),
                    pt.bombard_territory_map().len(),
                ),
                _ => continue,
            };
            let result = pass.estimate_attack(&self.calc, board, t)?;
            summaries.push(BattleSummary::new(board, t, result, attackers, amphibious, bombarding));
        }
        Ok(summaries)
    }

    /// Buys defenders for `territory` one pick at a time until it holds
    /// against the enemy units nearby.
    ///
    /// Options are re-filtered against the remaining resources, production,
    /// build caps and consumables before every pick, and each pick is a
    /// defense-weighted random choice. The purchase is dropped when it ends
    /// below the minimum win percentage for the defender.
    fn purchase_defenders(
        &mut self,
        board: &mut BoardState,
        pass: &mut PlanningPass,
        validator: &dyn PlacementValidator,
        territory: &PurchaseTerritory,
        options: &PurchaseOptions,
        resources: &mut i32,
    ) -> Result<(), PlanError> {
        let config = self.calc.config();
        let (win_percentage, min_win_percentage) = (config.win_percentage, config.min_win_percentage);
        let player = pass.player();
        let t = territory.territory;
        let enemy = enemy_attackers_near(board, player, t, config.nearby_land_distance);
        if enemy.is_empty() {
            return Ok(());
        }
        let mut defenders: Vec<UnitId> = board
            .units_in(t)
            .iter()
            .copied()
            .filter(|&u| {
                board.is_allied(board.unit(u).owner, player)
                    && pass.committed_to(u).map_or(true, |to| to == t)
            })
            .collect();
        defenders.extend_from_slice(pass.place_units(t));

        let holds = |enemy_win: f64| enemy_win <= 100.0 - win_percentage;
        let mut result =
            self.calc
                .estimate_defend_battle_results(board, t, &enemy, &defenders, &[]);
        if holds(result.win_percentage) {
            trace!(territory = %board.territory(t).name, "territory holds without purchases");
            return Ok(());
        }

        let mut land = find_purchase_options_for_territory(board, validator, player, &options.land, t);
        let mut remaining_production = territory
            .unit_production
            .saturating_sub(pass.place_units(t).len() as u32);
        let mut left = *resources;
        let mut bought: Vec<UnitId> = Vec::new();
        let mut consumed: Vec<UnitId> = Vec::new();
        while !holds(result.win_percentage) {
            let limits = PurchaseLimits {
                resources: left,
                remaining_production,
                remaining_constructions: 0,
                units_to_place: &bought,
                territory: Some(t),
            };
            remove_invalid_purchase_options(board, pass, player, &mut land, &limits);
            let weighted: Vec<(usize, f64)> = land
                .iter()
                .enumerate()
                .map(|(i, o)| (i, sharpen(o.defense_efficiency, o.quantity)))
                .collect();
            let Some(&index) = randomize_purchase_option(&weighted, &mut self.rng) else {
                break;
            };
            let option = land[index].clone();
            trace!(territory = %board.territory(t).name, option = %option.name, "defender selected");

            let units = board.spawn_units(option.unit_type, option.quantity, player, t);
            if option.consumes_units() {
                let taken = units_to_consume(board, pass, player, t, &units)?;
                pass.queue_consumption(&taken);
                consumed.extend(taken);
            }
            left -= option.cost;
            remaining_production -= option.quantity;
            bought.extend(units);

            let mut all = defenders.clone();
            all.extend(&bought);
            result = self.calc.estimate_defend_battle_results(board, t, &enemy, &all, &[]);
        }
        if bought.is_empty() {
            return Ok(());
        }
        if !holds(result.win_percentage) && result.win_percentage > 100.0 - min_win_percentage {
            pass.release_consumption(&consumed);
            info!(territory = %board.territory(t).name, "territory cannot be held, no defenders bought");
            return Ok(());
        }

        *resources = left;
        pass.add_place_units(t, &bought);
        info!(
            territory = %board.territory(t).name,
            defenders = bought.len(),
            resources_left = *resources,
            "defenders purchased"
        );
        Ok(())
    }
}

/// Enemy-held land and sea zones holding enemy units.
fn find_targets(board: &BoardState, player: PlayerId) -> Vec<TerritoryId> {
    board
        .territory_ids()
        .filter(|&t| {
            let territory = board.territory(t);
            if territory.impassable {
                false
            } else if territory.is_water {
                board.has_enemy_units(t, player)
            } else {
                board.is_enemy_territory(t, player)
            }
        })
        .collect()
}

/// Targets each of the player's combat units can reach this turn.
///
/// Air units must be able to fly back the same distance. Units aboard
/// transports, unarmed units and units without movement have no options.
fn attack_options(board: &BoardState, player: PlayerId, targets: &[TerritoryId]) -> UnitOptions {
    let mut options = UnitOptions::new();
    for from in board.territory_ids() {
        for &u in board.units_in(from) {
            let unit = board.unit(u);
            let ty = board.unit_type(u);
            if unit.owner != player
                || unit.movement_left == 0
                || unit.transported_by.is_some()
                || ty.is_infrastructure
                || ty.attack <= 0
                || ty.is_non_combat_sea_transport()
            {
                continue;
            }
            let reach: Vec<TerritoryId> = targets
                .iter()
                .copied()
                .filter(|&t| {
                    let water = board.territory(t).is_water;
                    if (ty.is_land() && water) || (ty.is_sea() && !water) {
                        return false;
                    }
                    route_for_group(board, player, &[u], u, from, t, true).is_some_and(|route| {
                        let len = route.len() as u32;
                        if ty.is_air() {
                            2 * len <= unit.movement_left
                        } else {
                            len <= unit.movement_left
                        }
                    })
                })
                .collect();
            if !reach.is_empty() {
                options.push((u, reach));
            }
        }
    }
    options
}

/// Mobile enemy units that could strike `t`: land units within `distance`
/// land hops and air units within `distance + 2` hops.
fn enemy_attackers_near(board: &BoardState, player: PlayerId, t: TerritoryId, distance: u32) -> Vec<UnitId> {
    let can_move_land = territory_can_potentially_move_land_units(board);
    let mut land_area = board.neighbors_within(t, distance, |n| can_move_land.test(n));
    land_area.insert(t);
    let air_area = board.neighbors_within(t, distance + 2, |_| true);

    let mobile_enemy = |u: &UnitId| {
        let unit = board.unit(*u);
        board.is_enemy_unit(*u, player)
            && unit.movement_left > 0
            && !board.unit_type(*u).is_infrastructure
    };
    let mut units: Vec<UnitId> = land_area
        .iter()
        .flat_map(|&n| board.units_in(n))
        .copied()
        .filter(|u| mobile_enemy(u) && board.unit_type(*u).is_land())
        .collect();
    units.extend(
        air_area
            .iter()
            .flat_map(|&n| board.units_in(n))
            .copied()
            .filter(|u| mobile_enemy(u) && board.unit_type(*u).is_air()),
    );
    units
}

/// The player's sea transports not yet given a task.
fn free_transports(board: &BoardState, pass: &PlanningPass) -> Vec<UnitId> {
    let player = pass.player();
    board
        .territory_ids()
        .filter(|&t| board.territory(t).is_water)
        .flat_map(|t| board.units_in(t))
        .copied()
        .filter(|&u| {
            let unit = board.unit(u);
            let ty = board.unit_type(u);
            unit.owner == player
                && ty.is_sea()
                && ty.is_transport()
                && unit.movement_left > 0
                && !pass.is_committed(u)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::board::fixtures::fixture;
    use crate::combat::oracle::{AggregateResults, BattleRequest};
    use crate::combat::total_power;
    use crate::purchase::{default_catalog, RulesValidator};

    /// The side with more total power always wins, losing nothing.
    struct PowerOracle;

    impl BattleOracle for PowerOracle {
        fn simulate(&self, request: &BattleRequest<'_>) -> AggregateResults {
            let (board, t) = (request.board, request.territory);
            let attack = total_power(board, t, request.attacking_units, request.defending_units, true);
            let defence = total_power(board, t, request.defending_units, request.attacking_units, false);
            if attack > defence {
                AggregateResults {
                    attacker_win_probability: 1.0,
                    attackers_remaining: request.attacking_units.to_vec(),
                    value_swing: board.units_value(request.defending_units) as f64,
                    rounds_fought: 1.0,
                    ..AggregateResults::default()
                }
            } else {
                AggregateResults {
                    defenders_remaining: request.defending_units.to_vec(),
                    value_swing: -board.units_value(request.attacking_units) as f64,
                    rounds_fought: 1.0,
                    ..AggregateResults::default()
                }
            }
        }
    }

    fn planner() -> Planner {
        let config = PlannerConfig {
            seed: 11,
            ..PlannerConfig::default()
        };
        Planner::with_oracle(PowerOracle, config)
    }

    #[test]
    fn attacks_weak_neighbours_and_buys() {
        let mut f = fixture();
        f.add(f.ty.infantry, f.blue, f.map.border, 1);
        let tanks = f.add(f.ty.tank, f.red, f.map.plains, 3);
        let catalog = default_catalog(&f.board);

        let plan = planner()
            .plan_turn(&mut f.board, f.red, &catalog, &mut RulesValidator)
            .unwrap();

        assert!(!plan.cancelled);
        let border = plan.battles.iter().find(|b| b.territory == "border").unwrap();
        assert_eq!(border.win_percentage, 100.0);
        assert!(plan.battles.iter().any(|b| b.territory == "wastes"));
        assert!(plan.unroutable.is_empty());
        assert_eq!(plan.moves_performed, plan.moves.len());
        let moved: Vec<UnitId> = plan.moves.iter().flat_map(|m| m.units.clone()).collect();
        assert!(moved.iter().all(|u| tanks.contains(u)));
        assert!(moved.len() < tanks.len(), "one tank is enough for each target");

        // One defender against the infantry two hops away, the rest random.
        let spent: i32 = plan
            .purchases
            .iter()
            .map(|p| {
                let ty = f.board.find_unit_type(&p.unit_type).unwrap();
                f.board.type_info(ty).cost * p.quantity as i32
            })
            .sum();
        assert_eq!(plan.resources_left, 40 - spent);
        assert!(plan.resources_left >= 0);
        assert!(plan.units_purchased() <= 10);
        assert!(plan.resources_left < 3 || plan.units_purchased() == 10);
        assert!(plan.purchases.iter().all(|p| p.territory == "home"));
    }

    #[test]
    fn lands_cargo_on_undefended_coast() {
        let mut f = fixture();
        f.add(f.ty.infantry, f.red, f.map.home, 1);
        let transport = f.add(f.ty.transport, f.red, f.map.sz_home, 1)[0];
        let catalog = default_catalog(&f.board);

        let plan = planner()
            .plan_turn(&mut f.board, f.red, &catalog, &mut RulesValidator)
            .unwrap();

        // Both the enemy capital and the island are only reachable by sea.
        let landing = plan.battles.iter().find(|b| b.amphibious == 1).unwrap();
        assert!(landing.territory == "enemy_cap" || landing.territory == "island");
        let unload = plan.moves.iter().rev().find(|m| !m.units.contains(&transport)).unwrap();
        assert_eq!(f.board.territory(unload.route.end()).name, landing.territory);
        assert!(plan.moves.iter().any(|m| m.is_transport_load()));
        assert_eq!(plan.moves_performed, plan.moves.len());
    }

    #[test]
    fn hopeless_attacks_are_not_planned() {
        let mut f = fixture();
        f.add(f.ty.infantry, f.blue, f.map.border, 4);
        f.add(f.ty.infantry, f.red, f.map.plains, 1);
        let catalog = default_catalog(&f.board);

        let plan = planner()
            .plan_turn(&mut f.board, f.red, &catalog, &mut RulesValidator)
            .unwrap();
        assert!(plan.battles.iter().all(|b| b.territory != "border"));
    }

    #[test]
    fn stopped_pass_returns_early() {
        let mut f = fixture();
        f.add(f.ty.tank, f.red, f.map.plains, 2);
        let catalog = default_catalog(&f.board);
        let mut planner = planner();
        planner.stop_handle().store(true, Ordering::Relaxed);

        let plan = planner
            .plan_turn(&mut f.board, f.red, &catalog, &mut RulesValidator)
            .unwrap();
        assert!(plan.cancelled);
        assert!(plan.moves.is_empty());
        assert!(plan.purchases.is_empty());
        assert_eq!(plan.resources_left, 40);
    }

    #[test]
    fn threatened_factory_gets_defenders_first() {
        let mut f = fixture();
        f.add(f.ty.infantry, f.blue, f.map.plains, 1);
        f.board.territory_mut(f.map.plains).owner = Some(f.blue);
        f.board.players[f.red.index()].resources = 6;
        let catalog = default_catalog(&f.board);
        let options = PurchaseOptions::new(&catalog);
        let mut planner = planner();
        let mut pass = PlanningPass::new(f.red);
        let home = find_purchase_territories(&f.board, f.red)[0];
        let mut resources = 6;

        planner
            .purchase_defenders(&mut f.board, &mut pass, &RulesValidator, &home, &options, &mut resources)
            .unwrap();
        // Any single land defender holds against one infantry.
        let placed = pass.place_units(f.map.home);
        assert_eq!(placed.len(), 1);
        assert!(f.board.unit_type(placed[0]).is_land());
        assert_eq!(resources, 6 - f.board.units_value(placed));
    }

    #[test]
    fn defenders_respect_build_caps() {
        let mut f = fixture();
        f.add(f.ty.infantry, f.blue, f.map.plains, 1);
        f.board.territory_mut(f.map.plains).owner = Some(f.blue);
        f.board.players[f.red.index()].resources = 6;
        f.board.unit_types[f.ty.infantry.index()].max_built_per_player = 0;
        let catalog = default_catalog(&f.board);
        let options = PurchaseOptions::new(&catalog);
        let mut planner = planner();
        let mut pass = PlanningPass::new(f.red);
        let home = find_purchase_territories(&f.board, f.red)[0];
        let mut resources = 6;

        planner
            .purchase_defenders(&mut f.board, &mut pass, &RulesValidator, &home, &options, &mut resources)
            .unwrap();
        let placed = pass.place_units(f.map.home);
        assert_eq!(placed.len(), 1);
        assert_ne!(f.board.unit(placed[0]).unit_type, f.ty.infantry);
        assert_eq!(resources, 6 - f.board.units_value(placed));
    }

    #[test]
    fn fully_capped_catalog_buys_no_defenders() {
        let mut f = fixture();
        f.add(f.ty.infantry, f.blue, f.map.plains, 1);
        f.board.territory_mut(f.map.plains).owner = Some(f.blue);
        f.board.players[f.red.index()].resources = 6;
        for ty in [f.ty.infantry, f.ty.artillery, f.ty.tank] {
            f.board.unit_types[ty.index()].max_built_per_player = 0;
        }
        let catalog = default_catalog(&f.board);
        let options = PurchaseOptions::new(&catalog);
        let mut planner = planner();
        let mut pass = PlanningPass::new(f.red);
        let home = find_purchase_territories(&f.board, f.red)[0];
        let mut resources = 6;

        planner
            .purchase_defenders(&mut f.board, &mut pass, &RulesValidator, &home, &options, &mut resources)
            .unwrap();
        assert!(pass.place_units(f.map.home).is_empty());
        assert_eq!(resources, 6);
    }

    #[test]
    fn hopeless_defense_is_not_bought() {
        let mut f = fixture();
        f.add(f.ty.tank, f.blue, f.map.plains, 6);
        f.board.territory_mut(f.map.plains).owner = Some(f.blue);
        f.board.players[f.red.index()].resources = 6;
        let catalog = default_catalog(&f.board);
        let options = PurchaseOptions::new(&catalog);
        let mut planner = planner();
        let mut pass = PlanningPass::new(f.red);
        let home = find_purchase_territories(&f.board, f.red)[0];
        let mut resources = 6;

        planner
            .purchase_defenders(&mut f.board, &mut pass, &RulesValidator, &home, &options, &mut resources)
            .unwrap();
        assert!(pass.place_units(f.map.home).is_empty());
        assert_eq!(resources, 6);
    }
}
