//! Amphibious convoy scheduling.
//!
//! Each transport assigned to an amphibious landing is walked one sea zone
//! at a time. Cargo adjacent to the transport boards whenever the zone is
//! free of enemies, and the transport heads for the zone that keeps the
//! remaining cargo closest while still reaching its unload zone in time.

use tracing::{debug, warn};

use super::batch::MoveBatcher;
use super::command::MovePlan;
use crate::board::matches::{
    no_canal_between, territory_can_move_sea_units_through, TerritoryMatch,
};
use crate::board::{BoardState, PlayerId, Route, TerritoryId, UnitId};
use crate::planning::PlanningPass;

/// Distance used when no path exists.
const FAR: i64 = i64::MAX / 4;

struct Convoy {
    target: TerritoryId,
    transport: UnitId,
    cargo: Vec<UnitId>,
    unload: Option<TerritoryId>,
}

/// Sea zone the transport moves to next, if any.
fn next_zone(
    board: &BoardState,
    player: PlayerId,
    current: TerritoryId,
    target: TerritoryId,
    unload: Option<TerritoryId>,
    remaining: &[UnitId],
    moves_left: i64,
    through: &TerritoryMatch<'_>,
) -> Option<TerritoryId> {
    let target_is_water = i64::from(board.territory(target).is_water);
    let mut chosen = None;
    let mut min_unit_distance = i64::MAX;
    let mut max_distance_from_end = i64::MIN;

    for n in board.neighbors_matching(current, |n| through.test(n)) {
        if !no_canal_between(board, player, current, n) {
            continue;
        }
        let distance_from_unload = match unload {
            Some(unload) => match board.distance_ignore_end(n, unload, |t| through.test(t)) {
                Some(d) => i64::from(d),
                None => continue,
            },
            None => 0,
        };
        let Some(from_end) = board.distance_ignore_end(n, target, |t| through.test(t)) else {
            continue;
        };
        let from_end = i64::from(from_end) + target_is_water;
        let mut max_unit_distance = 0;
        let mut reachable = true;
        for &u in remaining {
            match board.distance(n, board.unit_territory(u)) {
                Some(d) => max_unit_distance = max_unit_distance.max(i64::from(d)),
                None => reachable = false,
            }
        }
        if !reachable {
            continue;
        }

        if from_end <= moves_left
            && max_unit_distance <= min_unit_distance
            && distance_from_unload < moves_left
            && (max_unit_distance < min_unit_distance
                || (max_unit_distance > 1 && from_end > max_distance_from_end)
                || (max_unit_distance <= 1 && from_end < max_distance_from_end))
        {
            chosen = Some(n);
            min_unit_distance = max_unit_distance;
            max_distance_from_end = max_distance_from_end.max(from_end);
        }
    }
    chosen
}

/// Plans loading, sailing and unloading for every amphibious assignment in
/// `pass`.
///
/// Loads are emitted as transport-load moves, each sea step as a move of
/// the transport with its cargo, and a final unload into land targets.
/// Convoys sharing the same path are batched together. The zone each
/// transport ends in is written back to the pass as its unload zone.
pub fn calculate_amphib_routes(
    board: &BoardState,
    pass: &mut PlanningPass,
    is_combat_move: bool,
) -> MovePlan {
    let player = pass.player();
    let convoys: Vec<Convoy> = pass
        .territories()
        .flat_map(|pt| {
            pt.amphib_attack_map().iter().map(|(&transport, cargo)| Convoy {
                target: pt.territory(),
                transport,
                cargo: cargo.clone(),
                unload: pt.transport_territory_map().get(&transport).copied(),
            })
        })
        .collect();

    let through = territory_can_move_sea_units_through(board, player, is_combat_move);
    let mut batcher = MoveBatcher::new();
    for convoy in convoys {
        let Convoy { target, transport, cargo, unload } = convoy;
        let target_is_water = board.territory(target).is_water;
        let mut moves_left = i64::from(board.unit(transport).movement_left);
        let mut current = board.unit_territory(transport);
        batcher.new_sequence();

        let (mut loaded, mut remaining) = if board.is_transporting(transport) {
            (cargo, Vec::new())
        } else {
            (Vec::new(), cargo)
        };

        while moves_left >= 0 {
            if !board.has_enemy_units(current, player) {
                remaining.retain(|&u| {
                    let from = board.unit_territory(u);
                    if board.distance(current, from) != Some(1) {
                        return true;
                    }
                    batcher.add_transport_load(u, Route::between(from, current), transport);
                    loaded.push(u);
                    false
                });
            }

            let distance_from_end = board
                .distance(current, target)
                .map_or(FAR, |d| i64::from(d) + i64::from(target_is_water));
            let must_move = distance_from_end > 1
                || !remaining.is_empty()
                || unload.is_some_and(|u| u != current);
            if moves_left > 0 && must_move {
                if let Some(next) =
                    next_zone(board, player, current, target, unload, &remaining, moves_left, &through)
                {
                    let mut units = vec![transport];
                    units.extend(&loaded);
                    batcher.add_move(units, Route::between(current, next));
                    current = next;
                }
            }
            moves_left -= 1;
        }

        if !remaining.is_empty() {
            warn!(
                target = %board.territory(target).name,
                transport = ?transport,
                remaining = ?remaining,
                "cargo left behind"
            );
        }
        debug!(
            target = %board.territory(target).name,
            transport = ?transport,
            unload_from = %board.territory(current).name,
            loaded = loaded.len(),
            combat = is_combat_move,
            "convoy scheduled"
        );
        pass.entry(target).set_transport_territory(transport, current);

        if !loaded.is_empty() && !target_is_water {
            batcher.add_move(loaded, Route::between(current, target));
        }
    }

    MovePlan {
        moves: batcher.batch_moves(),
        unroutable: Vec::new(),
    }
}
