//! Choosing cargo for transports and judging whether transports are safe.

use std::cmp::Ordering;

use tracing::trace;

use crate::board::matches::{unit_has_movement_left, unit_is_land, unit_is_owned_transportable};
use crate::board::{BoardState, PlayerId, TerritoryId, UnitId};
use crate::combat::OddsCalculator;
use crate::planning::PlanningTerritory;

/// Stronger attackers first, counting the best offensive support a unit
/// grants.
fn decreasing_attack(board: &BoardState, a: UnitId, b: UnitId) -> Ordering {
    let attack = |u: UnitId| board.unit_type(u).attack_with_support();
    attack(b).cmp(&attack(a))
}

/// Picks the cargo for `transport` from `units`, which the caller has
/// already put in preference order.
///
/// Units are taken greedily while they fit. If room is left afterwards, the
/// last unit taken is swapped for the first strictly stronger leftover unit
/// that still fits. Land transports prefer slower units before stronger
/// ones. The selected transport cost never exceeds the capacity.
pub fn select_units_to_transport(
    board: &BoardState,
    transport: UnitId,
    units: &[UnitId],
) -> Vec<UnitId> {
    let transport_type = board.unit_type(transport);
    let capacity = transport_type.transport_capacity;
    let cost = |u: UnitId| board.unit_type(u).transport_cost;

    let mut selected = Vec::new();
    let mut used = 0;
    for &u in units {
        if cost(u) <= capacity - used {
            selected.push(u);
            used += cost(u);
            if used >= capacity {
                break;
            }
        }
    }

    let Some(&last) = selected.last() else {
        return selected;
    };
    if used >= capacity {
        return selected;
    }

    let land_transport = transport_type.land_transport;
    let compare = |a: UnitId, b: UnitId| {
        let by_movement = if land_transport {
            board.unit(a).movement_left.cmp(&board.unit(b).movement_left)
        } else {
            Ordering::Equal
        };
        by_movement.then_with(|| decreasing_attack(board, a, b))
    };
    let mut rest: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|u| !selected.contains(u))
        .collect();
    rest.sort_by(|&a, &b| compare(a, b));
    for u in rest {
        if compare(u, last) != Ordering::Less {
            break;
        }
        if used - cost(last) + cost(u) <= capacity {
            selected.pop();
            selected.push(u);
            break;
        }
    }
    selected
}

/// Cargo for `transport` gathered from `territories`.
///
/// A transport already carrying units keeps its cargo. Otherwise the
/// player's loadable land units in the territories, minus `ignore`, are
/// ordered cheapest to carry first and strongest first within a cost, and
/// the best load is picked with [`select_units_to_transport`].
pub fn units_to_transport_from_territories(
    board: &BoardState,
    player: PlayerId,
    transport: UnitId,
    territories: &[TerritoryId],
    ignore: &[UnitId],
) -> Vec<UnitId> {
    let cargo = board.cargo_of(transport);
    if !cargo.is_empty() {
        return cargo;
    }
    let loadable = unit_is_owned_transportable(board, player).and(unit_has_movement_left(board));
    let mut units: Vec<UnitId> = territories
        .iter()
        .flat_map(|&t| board.units_in(t))
        .copied()
        .filter(|&u| loadable.test(u) && !ignore.contains(&u))
        .collect();
    units.sort_by(|&a, &b| {
        board
            .unit_type(a)
            .transport_cost
            .cmp(&board.unit_type(b).transport_cost)
            .then_with(|| decreasing_attack(board, a, b))
    });
    select_units_to_transport(board, transport, &units)
}

/// Returns true if the transports standing in `pt` still need escorts.
///
/// The non-land units there are matched against the enemy units that can
/// reach the territory. The estimate is cached on the planning territory.
pub fn check_transport_defense(
    calc: &OddsCalculator,
    board: &BoardState,
    pt: &mut PlanningTerritory,
) -> bool {
    let is_land = unit_is_land(board);
    let defenders: Vec<UnitId> = pt
        .all_defenders()
        .into_iter()
        .filter(|&u| !is_land.test(u))
        .collect();
    let t = pt.territory();
    let result = pt.battle_result_or_insert_with(|pt| {
        calc.estimate_defend_battle_results(board, t, pt.max_enemy_units(), &defenders, &[])
    });
    trace!(
        territory = %board.territory(t).name,
        value_swing = result.value_swing,
        win_percentage = result.win_percentage,
        defenders = defenders.len(),
        "transport defence"
    );
    result.win_percentage > 100.0 - calc.config().win_percentage || result.value_swing > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::fixture;
    use crate::combat::oracle::FixedOracle;
    use crate::config::PlannerConfig;

    #[test]
    fn greedy_fill_stops_at_capacity() {
        let mut f = fixture();
        let transport = f.add(f.ty.transport, f.red, f.map.sz_home, 1)[0];
        let inf = f.add(f.ty.infantry, f.red, f.map.home, 3);
        // Capacity 5, infantry cost 2 each: two fit.
        let selected = select_units_to_transport(&f.board, transport, &inf);
        assert_eq!(selected, inf[..2].to_vec());
    }

    #[test]
    fn spare_room_swaps_last_unit_for_stronger() {
        let mut f = fixture();
        let transport = f.add(f.ty.transport, f.red, f.map.sz_home, 1)[0];
        let inf = f.add(f.ty.infantry, f.red, f.map.home, 1)[0];
        let tanks = f.add(f.ty.tank, f.red, f.map.home, 2);
        // Tank (3) then infantry (2) fills all 5.
        let selected = select_units_to_transport(&f.board, transport, &[tanks[0], inf, tanks[1]]);
        assert_eq!(selected, vec![tanks[0], inf]);

        // Artillery alone leaves 2 spare; tanks are no stronger, so no swap.
        let art = f.add(f.ty.artillery, f.red, f.map.home, 1)[0];
        let selected = select_units_to_transport(&f.board, transport, &[art, tanks[0], tanks[1]]);
        assert_eq!(selected, vec![art]);
        let selected = select_units_to_transport(&f.board, transport, &[inf, art]);
        assert_eq!(selected, vec![inf, art]);
    }

    #[test]
    fn swap_replaces_weak_last_unit() {
        let mut f = fixture();
        let transport = f.add(f.ty.transport, f.red, f.map.sz_home, 1)[0];
        let tank = f.add(f.ty.tank, f.red, f.map.home, 1)[0];
        let art = f.add(f.ty.artillery, f.red, f.map.home, 1)[0];
        let inf = f.add(f.ty.infantry, f.red, f.map.home, 1)[0];
        // Art (3) taken, tank (3) does not fit, infantry (2) fills it to 5.
        assert_eq!(
            select_units_to_transport(&f.board, transport, &[art, tank, inf]),
            vec![art, inf]
        );
        // Two infantry leave 1 spare; the tank is stronger and fits in place
        // of the second.
        let inf2 = f.add(f.ty.infantry, f.red, f.map.home, 1)[0];
        assert_eq!(
            select_units_to_transport(&f.board, transport, &[inf, inf2, tank]),
            vec![inf, tank]
        );
    }

    #[test]
    fn collected_cargo_prefers_cheap_then_strong() {
        let mut f = fixture();
        let transport = f.add(f.ty.transport, f.red, f.map.sz_home, 1)[0];
        let tank = f.add(f.ty.tank, f.red, f.map.home, 1)[0];
        let inf = f.add(f.ty.infantry, f.red, f.map.plains, 2);
        f.add(f.ty.infantry, f.green, f.map.home, 1);
        let selected = units_to_transport_from_territories(
            &f.board,
            f.red,
            transport,
            &[f.map.home, f.map.plains],
            &[inf[1]],
        );
        assert_eq!(selected, vec![inf[0], tank]);
    }

    #[test]
    fn loaded_transport_keeps_cargo() {
        let mut f = fixture();
        let transport = f.add(f.ty.transport, f.red, f.map.sz_home, 1)[0];
        let cargo = f.add(f.ty.infantry, f.red, f.map.sz_home, 1)[0];
        f.board.load(cargo, transport);
        f.add(f.ty.tank, f.red, f.map.home, 1);
        let selected =
            units_to_transport_from_territories(&f.board, f.red, transport, &[f.map.home], &[]);
        assert_eq!(selected, vec![cargo]);
    }

    #[test]
    fn transport_defence_uses_enemy_reach() {
        let mut f = fixture();
        let transport = f.add(f.ty.transport, f.red, f.map.sz_mid, 1)[0];
        let destroyer = f.add(f.ty.destroyer, f.red, f.map.sz_mid, 1)[0];
        let enemy = f.add(f.ty.destroyer, f.blue, f.map.sz_enemy, 1);

        let mut pt = PlanningTerritory::new(f.map.sz_mid);
        pt.add_cant_move_units(&[transport, destroyer]);
        pt.set_max_enemy_units(enemy.clone());
        let threatened = OddsCalculator::new(FixedOracle::swing(0.3, -4.0), PlannerConfig::default());
        assert!(check_transport_defense(&threatened, &f.board, &mut pt));
        assert!(pt.battle_result().is_some());

        let mut pt = PlanningTerritory::new(f.map.sz_mid);
        pt.add_cant_move_units(&[transport, destroyer]);
        pt.set_max_enemy_units(enemy);
        let safe = OddsCalculator::new(FixedOracle::swing(0.05, -4.0), PlannerConfig::default());
        assert!(!check_transport_defense(&safe, &f.board, &mut pt));
    }
}
