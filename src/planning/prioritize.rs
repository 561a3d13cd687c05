//! Orderings of the unit-to-target assignment space.
//!
//! Each function reorders a list of `(unit, candidate targets)` pairs in
//! place with a stable sort, so ties keep their incoming order. The greedy
//! assignment then walks the list front to back.

use std::cmp::Ordering;

use super::pass::PlanningPass;
use crate::board::matches::territory_can_move_air_units_and_no_aa;
use crate::board::{BoardState, TerritoryId, UnitId};
use crate::combat::{total_power, OddsCalculator};

/// Candidate targets per unit, in priority order.
pub type UnitOptions = Vec<(UnitId, Vec<TerritoryId>)>;

/// Fewest options first, then cheapest, then by unit-type name.
pub fn sort_unit_move_options(board: &BoardState, options: &mut UnitOptions) {
    options.sort_by(|(u1, t1), (u2, t2)| {
        let (ty1, ty2) = (board.unit_type(*u1), board.unit_type(*u2));
        t1.len()
            .cmp(&t2.len())
            .then(ty1.cost.cmp(&ty2.cost))
            .then_with(|| ty1.name.cmp(&ty2.name))
    });
}

/// Candidate targets of each option that are not yet won, in option order.
fn needed_targets(
    board: &BoardState,
    calc: &OddsCalculator,
    pass: &mut PlanningPass,
    options: &UnitOptions,
) -> Vec<Vec<TerritoryId>> {
    let win_percentage = calc.config().win_percentage;
    options
        .iter()
        .map(|(_, targets)| {
            targets
                .iter()
                .copied()
                .filter(|&t| !pass.is_won(calc, board, t, win_percentage))
                .collect()
        })
        .collect()
}

/// Fewest targets still needing units first, then cheapest, then by name.
///
/// Battle estimates missing from the pass are computed and cached on the
/// way.
pub fn sort_unit_needed_options(
    board: &BoardState,
    calc: &OddsCalculator,
    pass: &mut PlanningPass,
    options: &mut UnitOptions,
) {
    let needed = needed_targets(board, calc, pass, options);
    let mut keyed: Vec<(usize, (UnitId, Vec<TerritoryId>))> = needed
        .iter()
        .map(Vec::len)
        .zip(options.drain(..))
        .collect();
    keyed.sort_by(|(n1, (u1, _)), (n2, (u2, _))| {
        let (ty1, ty2) = (board.unit_type(*u1), board.unit_type(*u2));
        n1.cmp(n2)
            .then(ty1.cost.cmp(&ty2.cost))
            .then_with(|| ty1.name.cmp(&ty2.name))
    });
    options.extend(keyed.into_iter().map(|(_, option)| option));
}

struct AttackKey {
    needed: usize,
    efficiency: f64,
    air_distance: u32,
}

/// Smallest power `unit` adds to any of `targets`, ×10 for air, per unit cost.
fn attack_efficiency(
    board: &BoardState,
    pass: &PlanningPass,
    unit: UnitId,
    targets: &[TerritoryId],
) -> f64 {
    let player = pass.player();
    let mut min_power = i32::MAX;
    for &t in targets {
        let mut attackers = pass.get(t).map(|pt| pt.units().to_vec()).unwrap_or_default();
        let defenders = board.enemy_units_in(t, player);
        let without = total_power(board, t, &attackers, &defenders, true);
        attackers.push(unit);
        let with = total_power(board, t, &attackers, &defenders, true);
        min_power = min_power.min(with - without);
    }
    let ty = board.unit_type(unit);
    let mut power = min_power as f64;
    if ty.is_air() {
        power *= 10.0;
    }
    power / ty.cost.max(1) as f64
}

/// Units needed by the fewest unfinished battles first; among those the
/// units adding the most power per cost; air units of one type nearest
/// first; then by name. Units every one of whose targets is already won
/// are all equal.
pub fn sort_unit_needed_options_then_attack(
    board: &BoardState,
    calc: &OddsCalculator,
    pass: &mut PlanningPass,
    options: &mut UnitOptions,
) {
    let needed = needed_targets(board, calc, pass, options);
    let player = pass.player();
    let air_route = territory_can_move_air_units_and_no_aa(board, player);

    let mut keyed: Vec<(AttackKey, (UnitId, Vec<TerritoryId>))> = needed
        .iter()
        .zip(options.drain(..))
        .map(|(targets, option)| {
            let unit = option.0;
            let key = if targets.is_empty() {
                AttackKey {
                    needed: 0,
                    efficiency: 0.0,
                    air_distance: 0,
                }
            } else {
                let start = board.unit_territory(unit);
                let air_distance = if board.unit_type(unit).is_air() {
                    targets
                        .iter()
                        .filter_map(|&t| board.distance_ignore_end(start, t, |n| air_route.test(n)))
                        .sum::<u32>()
                } else {
                    0
                };
                AttackKey {
                    needed: targets.len(),
                    efficiency: attack_efficiency(board, pass, unit, targets),
                    air_distance,
                }
            };
            (key, option)
        })
        .collect();

    keyed.sort_by(|(k1, (u1, _)), (k2, (u2, _))| {
        if k1.needed != k2.needed {
            return k1.needed.cmp(&k2.needed);
        }
        if k1.needed == 0 {
            return Ordering::Equal;
        }
        let (ty1, ty2) = (board.unit_type(*u1), board.unit_type(*u2));
        k2.efficiency
            .partial_cmp(&k1.efficiency)
            .unwrap_or(Ordering::Equal)
            .then_with(|| ty1.name.cmp(&ty2.name))
            .then(k1.air_distance.cmp(&k2.air_distance))
    });
    options.extend(keyed.into_iter().map(|(_, option)| option));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::{fixture, Fixture};
    use crate::combat::oracle::FixedOracle;
    use crate::config::PlannerConfig;

    fn units(options: &UnitOptions) -> Vec<UnitId> {
        options.iter().map(|(u, _)| *u).collect()
    }

    #[test]
    fn move_options_by_count_then_cost() {
        let mut f = fixture();
        let tank = f.add(f.ty.tank, f.red, f.map.plains, 1)[0];
        let inf = f.add(f.ty.infantry, f.red, f.map.plains, 2);
        let mut options: UnitOptions = vec![
            (inf[0], vec![f.map.border, f.map.wastes]),
            (tank, vec![f.map.border]),
            (inf[1], vec![f.map.border]),
        ];
        sort_unit_move_options(&f.board, &mut options);
        assert_eq!(units(&options), vec![inf[1], tank, inf[0]]);
    }

    /// Border is attacked by three tanks and won; island has no attackers.
    fn won_border(f: &mut Fixture) -> (OddsCalculator, PlanningPass) {
        f.add(f.ty.infantry, f.blue, f.map.border, 1);
        let tanks = f.add(f.ty.tank, f.red, f.map.plains, 3);
        let calc = OddsCalculator::new(FixedOracle::swing(0.95, 5.0), PlannerConfig::default());
        let mut pass = PlanningPass::new(f.red);
        pass.assign_units(f.map.border, &tanks).unwrap();
        pass.entry(f.map.island);
        (calc, pass)
    }

    #[test]
    fn needed_options_skip_won_targets() {
        let mut f = fixture();
        let (calc, mut pass) = won_border(&mut f);
        let tank = f.add(f.ty.tank, f.red, f.map.plains, 1)[0];
        let inf = f.add(f.ty.infantry, f.red, f.map.plains, 2);
        let mut options: UnitOptions = vec![
            (tank, vec![f.map.island]),
            (inf[0], vec![f.map.border, f.map.island]),
            (inf[1], vec![f.map.border]),
        ];
        sort_unit_needed_options(&f.board, &calc, &mut pass, &mut options);
        assert_eq!(units(&options), vec![inf[1], inf[0], tank]);
        assert!(pass.get(f.map.border).unwrap().battle_result().is_some());
    }

    #[test]
    fn needed_then_attack_prefers_efficient_and_near_units() {
        let mut f = fixture();
        let (calc, mut pass) = won_border(&mut f);
        let inf = f.add(f.ty.infantry, f.red, f.map.plains, 1)[0];
        let art = f.add(f.ty.artillery, f.red, f.map.plains, 1)[0];
        let tank = f.add(f.ty.tank, f.red, f.map.plains, 1)[0];
        let far_fighter = f.add(f.ty.fighter, f.red, f.map.home, 1)[0];
        let near_fighter = f.add(f.ty.fighter, f.red, f.map.border, 1)[0];
        let idle = f.add(f.ty.bomber, f.red, f.map.home, 1)[0];
        let island = f.map.island;
        let mut options: UnitOptions = vec![
            (inf, vec![island]),
            (tank, vec![island]),
            (far_fighter, vec![island]),
            (art, vec![island]),
            (near_fighter, vec![island]),
            (idle, vec![f.map.border]),
        ];
        sort_unit_needed_options_then_attack(&f.board, &calc, &mut pass, &mut options);
        // Fighters add 3 × 10 / 10; artillery and tank 0.5; infantry 1 / 3.
        assert_eq!(
            units(&options),
            vec![idle, near_fighter, far_fighter, art, tank, inf]
        );
    }
}
