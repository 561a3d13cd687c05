//! Outcome of an estimated battle.

use serde::Serialize;

use crate::board::UnitId;

/// Expected outcome of one battle, from the attacker's point of view.
///
/// The default value is the empty result: nothing fought, nothing won.
/// Cancelled evaluations and battles with nobody to fight return it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BattleResult {
    /// Chance the attacker takes the territory, 0 to 100. Canned optimistic
    /// results may exceed 100 to rank lopsided fights.
    pub win_percentage: f64,
    /// Defender value lost minus attacker value lost.
    pub value_swing: f64,
    pub has_land_unit_remaining: bool,
    pub average_attackers_remaining: Vec<UnitId>,
    pub average_defenders_remaining: Vec<UnitId>,
    pub battle_rounds: f64,
}

impl BattleResult {
    pub fn new(
        win_percentage: f64,
        value_swing: f64,
        has_land_unit_remaining: bool,
        average_attackers_remaining: Vec<UnitId>,
        average_defenders_remaining: Vec<UnitId>,
        battle_rounds: f64,
    ) -> Self {
        BattleResult {
            win_percentage,
            value_swing,
            has_land_unit_remaining,
            average_attackers_remaining,
            average_defenders_remaining,
            battle_rounds,
        }
    }

    /// Returns true for the all-zero result.
    pub fn is_empty(&self) -> bool {
        *self == BattleResult::default()
    }

    /// A battle the attacker is expected to win at `min_win_percentage` or
    /// better while keeping a unit that can hold the territory.
    pub fn is_won(&self, min_win_percentage: f64) -> bool {
        self.win_percentage >= min_win_percentage && self.has_land_unit_remaining
    }
}
