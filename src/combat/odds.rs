//! Battle-odds estimation around the oracle.
//!
//! Full simulation is slow, so the estimators first try the cheap cases:
//! empty sides, defenders that slip away before the battle, and fights the
//! strength index already calls one way. Only the rest reach the oracle,
//! whose averages are then adjusted for neutral territories, cargo lost with
//! its transport and units that evade.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use super::oracle::{BattleOracle, BattleRequest};
use super::power::{estimate_strength_difference, UNOPPOSED_DIFFERENCE};
use super::result::BattleResult;
use crate::board::matches::{
    unit_can_be_in_battle, unit_can_evade, unit_is_air, unit_is_destroyer, unit_is_infrastructure,
    unit_is_land,
};
use crate::board::{BoardState, TerritoryId, UnitId};
use crate::config::PlannerConfig;

/// Wraps a battle oracle with the planner's gating heuristics and a
/// cooperative stop flag.
pub struct OddsCalculator {
    oracle: Box<dyn BattleOracle>,
    config: PlannerConfig,
    stop: Arc<AtomicBool>,
}

impl OddsCalculator {
    pub fn new(oracle: impl BattleOracle + 'static, config: PlannerConfig) -> Self {
        OddsCalculator {
            oracle: Box::new(oracle),
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an externally owned stop flag.
    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Handle a supervising thread can set to abandon the current pass.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Estimates an attack, skipping the oracle when the attackers are
    /// clearly outmatched.
    pub fn estimate_attack_battle_results(
        &self,
        board: &BoardState,
        t: TerritoryId,
        attackers: &[UnitId],
        defenders: &[UnitId],
        bombarding: &[UnitId],
    ) -> BattleResult {
        if self.is_cancelled() {
            return BattleResult::default();
        }
        if let Some(result) = check_if_no_attackers_or_defenders(board, t, attackers, defenders) {
            return result;
        }
        let difference = estimate_strength_difference(board, t, attackers, defenders);
        if difference >= UNOPPOSED_DIFFERENCE {
            debug!(territory = %board.territory(t).name, "attack unopposed");
            let fighting = unit_can_be_in_battle(board, t).filter(defenders);
            let holds = board.territory(t).is_water || unit_is_land(board).any(attackers);
            return BattleResult::new(
                100.0,
                board.units_value(&fighting) as f64,
                holds,
                attackers.to_vec(),
                Vec::new(),
                1.0,
            );
        }
        if difference < self.config.attack_gate {
            debug!(
                territory = %board.territory(t).name,
                difference,
                "attack skipped, attackers have no chance"
            );
            return BattleResult::new(0.0, -999.0, false, Vec::new(), defenders.to_vec(), 1.0);
        }
        self.call_battle_calc(board, t, attackers, defenders, bombarding)
    }

    /// Estimates a defence, skipping the oracle when the defenders are
    /// clearly outmatched.
    pub fn estimate_defend_battle_results(
        &self,
        board: &BoardState,
        t: TerritoryId,
        attackers: &[UnitId],
        defenders: &[UnitId],
        bombarding: &[UnitId],
    ) -> BattleResult {
        if self.is_cancelled() {
            return BattleResult::default();
        }
        if let Some(result) = check_if_no_attackers_or_defenders(board, t, attackers, defenders) {
            return result;
        }
        let difference = estimate_strength_difference(board, t, attackers, defenders);
        if difference > self.config.defend_gate {
            debug!(
                territory = %board.territory(t).name,
                difference,
                "defence skipped, defenders have no chance"
            );
            let only_air = !board.territory(t).is_water && unit_is_air(board).all(attackers);
            return BattleResult::new(
                100.0 + difference,
                999.0 + difference,
                !only_air,
                attackers.to_vec(),
                Vec::new(),
                1.0,
            );
        }
        self.call_battle_calc(board, t, attackers, defenders, bombarding)
    }

    /// Estimates a battle with only the empty-side shortcuts applied.
    pub fn calculate_battle_results(
        &self,
        board: &BoardState,
        t: TerritoryId,
        attackers: &[UnitId],
        defenders: &[UnitId],
        bombarding: &[UnitId],
    ) -> BattleResult {
        if self.is_cancelled() {
            return BattleResult::default();
        }
        if let Some(result) = check_if_no_attackers_or_defenders(board, t, attackers, defenders) {
            return result;
        }
        self.call_battle_calc(board, t, attackers, defenders, bombarding)
    }

    pub fn call_battle_calc(
        &self,
        board: &BoardState,
        t: TerritoryId,
        attackers: &[UnitId],
        defenders: &[UnitId],
        bombarding: &[UnitId],
    ) -> BattleResult {
        self.call_battle_calc_with_retreat(
            board,
            t,
            attackers,
            defenders,
            bombarding,
            self.config.retreat_when_only_air_left,
        )
    }

    /// Runs the oracle and post-processes its averages.
    pub fn call_battle_calc_with_retreat(
        &self,
        board: &BoardState,
        t: TerritoryId,
        attackers: &[UnitId],
        defenders: &[UnitId],
        bombarding: &[UnitId],
        retreat_when_only_air_left: bool,
    ) -> BattleResult {
        if self.is_cancelled() || attackers.is_empty() || defenders.is_empty() {
            return BattleResult::default();
        }
        let territory = board.territory(t);
        let runs = self.config.battle_runs(attackers.len(), defenders.len());
        let request = BattleRequest {
            board,
            attacker: board.unit(attackers[0]).owner,
            defender: board.unit(defenders[0]).owner,
            territory: t,
            attacking_units: attackers,
            defending_units: defenders,
            bombarding_units: bombarding,
            terrain: territory.terrain,
            retreat_when_only_air_left,
            runs,
        };
        let results = self.oracle.simulate(&request);

        let win_percentage = results.attacker_win_probability * 100.0;
        let mut value_swing = results.value_swing;
        if territory.is_neutral_land() {
            let main_attackers = unit_can_be_in_battle(board, t).filter(attackers);
            value_swing =
                results.attacker_value_remaining - board.units_value(&main_attackers) as f64;
        }
        if territory.is_water {
            let cargo: Vec<UnitId> = defenders
                .iter()
                .copied()
                .filter(|&u| board.unit(u).transported_by.is_some())
                .collect();
            if !cargo.is_empty() {
                value_swing += board.units_value(&cargo) as f64 * win_percentage / 100.0;
            }
        }
        if board.rules.evade_before_battle && !unit_is_destroyer(board).any(attackers) {
            let evaders = unit_can_evade(board).filter(defenders);
            if !evaders.is_empty() {
                value_swing -= board.units_value(&evaders) as f64 * win_percentage / 100.0;
            }
        }

        let has_land_unit_remaining = if territory.is_water {
            !results.attackers_remaining.is_empty()
        } else {
            unit_is_land(board).any(&results.attackers_remaining)
        };
        trace!(
            territory = %territory.name,
            runs,
            win_percentage,
            value_swing,
            "battle simulated"
        );
        BattleResult::new(
            win_percentage,
            value_swing,
            has_land_unit_remaining,
            results.attackers_remaining,
            results.defenders_remaining,
            results.rounds_fought,
        )
    }
}

/// Settles battles that need no estimate at all.
///
/// Checked in order: no attackers; no real defenders on land that only air
/// attacks; no real defenders; defenders that all evade before the battle
/// with no destroyer among the attackers.
pub fn check_if_no_attackers_or_defenders(
    board: &BoardState,
    t: TerritoryId,
    attackers: &[UnitId],
    defenders: &[UnitId],
) -> Option<BattleResult> {
    let has_no_defenders = !unit_is_infrastructure(board).negate().any(defenders);
    let only_air_on_land = !board.territory(t).is_water && unit_is_air(board).all(attackers);
    if attackers.is_empty() {
        Some(BattleResult::default())
    } else if has_no_defenders && only_air_on_land {
        Some(BattleResult::default())
    } else if has_no_defenders {
        Some(BattleResult::new(100.0, 0.1, true, attackers.to_vec(), Vec::new(), 0.0))
    } else if board.rules.evade_before_battle
        && unit_can_evade(board).all(defenders)
        && !unit_is_destroyer(board).any(attackers)
    {
        Some(BattleResult::default())
    } else {
        None
    }
}
