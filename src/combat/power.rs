//! Closed-form strength estimates.
//!
//! Nothing here simulates a battle. Each estimate is one pass over the
//! units that can take part in a fight in the given territory, scaled so
//! that results are comparable across games with different dice.

use crate::board::matches::{unit_can_be_in_battle, unit_is_infrastructure};
use crate::board::{BoardState, TerritoryId, UnitId};

/// Returned by [`estimate_strength_difference`] when the defenders cannot
/// fight back at all.
pub const UNOPPOSED_DIFFERENCE: f64 = 99999.0;

/// Strength and roll count of one unit once support and terrain apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPower {
    pub unit: UnitId,
    /// Die faces that score a hit, already clamped to `0..=dice_sides`.
    pub strength: i32,
    pub rolls: i32,
}

/// Per-unit combat values of every unit in `units` that can fight in `t`.
///
/// Each unit's strength is `clamp(base + support + terrain, 0, dice)` where
/// base is attack or defense depending on `attacking`. Friendly supporters
/// hand out positive bonuses in order until their count is spent;
/// supporters among `enemy_units` hand out negative ones.
pub fn unit_powers(
    board: &BoardState,
    t: TerritoryId,
    units: &[UnitId],
    enemy_units: &[UnitId],
    attacking: bool,
) -> Vec<UnitPower> {
    let can_fight = unit_can_be_in_battle(board, t);
    let fighters = can_fight.filter(units);
    if fighters.is_empty() {
        return Vec::new();
    }
    let enemy_fighters = can_fight.filter(enemy_units);

    let mut bonus = vec![0i32; fighters.len()];
    assign_support(board, &fighters, &fighters, attacking, false, &mut bonus);
    assign_support(board, &enemy_fighters, &fighters, attacking, true, &mut bonus);

    let dice = board.rules.dice_sides as i32;
    let terrain = board.territory(t).terrain;
    fighters
        .iter()
        .zip(&bonus)
        .map(|(&unit, &b)| {
            let ty = board.unit_type(unit);
            let (base, rolls, modifier) = if attacking {
                (ty.attack, ty.attack_rolls, terrain.attack_modifier)
            } else {
                (ty.defense, ty.defense_rolls, terrain.defense_modifier)
            };
            let modifier = if ty.is_air() { 0 } else { modifier };
            UnitPower {
                unit,
                strength: (base + b + modifier).clamp(0, dice),
                rolls: rolls.max(0),
            }
        })
        .collect()
}

/// Sum of `strength × rolls` over [`unit_powers`].
pub fn total_power(
    board: &BoardState,
    t: TerritoryId,
    units: &[UnitId],
    enemy_units: &[UnitId],
    attacking: bool,
) -> i32 {
    unit_powers(board, t, units, enemy_units, attacking)
        .iter()
        .map(|p| p.strength * p.rolls)
        .sum()
}

/// Hands out support bonuses from `supporters` to eligible `targets`.
///
/// With `negative` unset only positive rules are applied, otherwise only
/// negative ones. Each target takes at most one bonus per call.
fn assign_support(
    board: &BoardState,
    supporters: &[UnitId],
    targets: &[UnitId],
    attacking: bool,
    negative: bool,
    bonus: &mut [i32],
) {
    let mut supported = vec![false; targets.len()];
    for &s in supporters {
        let Some(rule) = board.unit_type(s).support.as_ref() else {
            continue;
        };
        if (rule.bonus < 0) != negative {
            continue;
        }
        let active = if attacking { rule.offence } else { rule.defence };
        if !active {
            continue;
        }
        let mut left = rule.count;
        for (i, &target) in targets.iter().enumerate() {
            if left == 0 {
                break;
            }
            if supported[i] || !rule.targets.contains(&board.unit(target).unit_type) {
                continue;
            }
            supported[i] = true;
            bonus[i] += rule.bonus;
            left -= 1;
        }
    }
}

/// Power normalised to a six-sided die.
pub fn estimate_power(
    board: &BoardState,
    t: TerritoryId,
    units: &[UnitId],
    enemy_units: &[UnitId],
    attacking: bool,
) -> f64 {
    let power = total_power(board, t, units, enemy_units, attacking);
    power as f64 * 6.0 / board.rules.dice_sides as f64
}

/// `2 × hit points + power` of the units that can fight in `t`.
pub fn estimate_strength(
    board: &BoardState,
    t: TerritoryId,
    my_units: &[UnitId],
    enemy_units: &[UnitId],
    attacking: bool,
) -> f64 {
    let fighters = unit_can_be_in_battle(board, t).filter(my_units);
    let hit_points: u32 = fighters.iter().map(|&u| board.hit_points_left(u)).sum();
    2.0 * hit_points as f64 + estimate_power(board, t, my_units, enemy_units, attacking)
}

/// Strength index of an attack on `t`: 50 is parity, 0 means the attackers
/// cannot do anything, above 100 means the defenders are swept away.
///
/// The curve divides by `defender^0.85` so big armies are not weighed
/// linearly.
pub fn estimate_strength_difference(
    board: &BoardState,
    t: TerritoryId,
    attackers: &[UnitId],
    defenders: &[UnitId],
) -> f64 {
    let infra = unit_is_infrastructure(board);
    if infra.all(attackers) || estimate_power(board, t, attackers, defenders, true) <= 0.0 {
        return 0.0;
    }
    if infra.all(defenders) || estimate_power(board, t, defenders, attackers, false) <= 0.0 {
        return UNOPPOSED_DIFFERENCE;
    }
    let attacker_strength = estimate_strength(board, t, attackers, defenders, true);
    let defender_strength = estimate_strength(board, t, defenders, attackers, false);
    (attacker_strength - defender_strength) / defender_strength.powf(0.85) * 50.0 + 50.0
}

/// Returns true if the attackers should win without losses or within one round.
///
/// With no attackers there is nothing to win, so this is false even when the
/// defenders are empty too.
pub fn check_for_overwhelming_win(
    board: &BoardState,
    t: TerritoryId,
    attackers: &[UnitId],
    defenders: &[UnitId],
) -> bool {
    if attackers.is_empty() {
        return false;
    }
    if defenders.is_empty() {
        return true;
    }
    if estimate_power(board, t, defenders, attackers, false) == 0.0 {
        return true;
    }
    let attack_power = total_power(board, t, attackers, defenders, true);
    let defender_hit_points: u32 = unit_is_infrastructure(board)
        .negate()
        .filter(defenders)
        .iter()
        .map(|&u| board.hit_points_left(u))
        .sum();
    (attack_power / board.rules.dice_sides as i32) as i64 >= defender_hit_points as i64
}
