//! Boundary to the battle-resolution collaborator.
//!
//! The planner never resolves combat itself. It hands a [`BattleRequest`] to
//! a [`BattleOracle`], which runs the battle as many times as asked and
//! reports averages.

use crate::board::{BoardState, PlayerId, TerrainEffect, TerritoryId, UnitId};

/// One battle to simulate.
#[derive(Debug, Clone, Copy)]
pub struct BattleRequest<'a> {
    pub board: &'a BoardState,
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub territory: TerritoryId,
    pub attacking_units: &'a [UnitId],
    pub defending_units: &'a [UnitId],
    pub bombarding_units: &'a [UnitId],
    pub terrain: TerrainEffect,
    pub retreat_when_only_air_left: bool,
    pub runs: u32,
}

/// Averages over every simulated run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResults {
    /// Fraction of runs the attacker won, 0 to 1.
    pub attacker_win_probability: f64,
    /// Survivors of a representative run.
    pub attackers_remaining: Vec<UnitId>,
    pub defenders_remaining: Vec<UnitId>,
    /// Average defender value lost minus attacker value lost.
    pub value_swing: f64,
    /// Average value of the attacking units still alive.
    pub attacker_value_remaining: f64,
    pub rounds_fought: f64,
}

/// A battle simulator.
///
/// Implementations must be usable from a shared reference; the planner may
/// hold one oracle for a whole turn.
pub trait BattleOracle: Send + Sync {
    fn simulate(&self, request: &BattleRequest<'_>) -> AggregateResults;
}

impl<O: BattleOracle + ?Sized> BattleOracle for Box<O> {
    fn simulate(&self, request: &BattleRequest<'_>) -> AggregateResults {
        (**self).simulate(request)
    }
}

impl<O: BattleOracle + ?Sized> BattleOracle for std::sync::Arc<O> {
    fn simulate(&self, request: &BattleRequest<'_>) -> AggregateResults {
        (**self).simulate(request)
    }
}

/// Test oracle that answers every request with the same averages.
///
/// When the attacker is given any chance of winning and no survivors are
/// set, every attacking unit is reported as surviving.
#[cfg(test)]
pub(crate) struct FixedOracle(pub AggregateResults);

#[cfg(test)]
impl BattleOracle for FixedOracle {
    fn simulate(&self, request: &BattleRequest<'_>) -> AggregateResults {
        let mut outcome = self.0.clone();
        if outcome.attackers_remaining.is_empty() && outcome.attacker_win_probability > 0.0 {
            outcome.attackers_remaining = request.attacking_units.to_vec();
        }
        outcome
    }
}

#[cfg(test)]
impl FixedOracle {
    pub(crate) fn swing(win_probability: f64, value_swing: f64) -> Self {
        FixedOracle(AggregateResults {
            attacker_win_probability: win_probability,
            value_swing,
            rounds_fought: 1.0,
            ..AggregateResults::default()
        })
    }
}
