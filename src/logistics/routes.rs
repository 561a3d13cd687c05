//! Route computation for planned attacks and bombardments.

use std::collections::BTreeSet;

use tracing::warn;

use super::carrier::carrier_must_move_with;
use super::command::{MoveCommand, MovePlan, Unroutable};
use crate::board::matches::{
    no_canal_between, territory_can_move_air_units_and_no_aa,
    territory_can_move_land_units_through, territory_can_move_sea_units_through,
};
use crate::board::{BoardState, PlayerId, Route, TerritoryId, UnitId};
use crate::planning::PlanningPass;

/// Shortest sea route from `from` to `to`. The end may hold enemies; canals
/// closed to `player` are never crossed.
pub fn sea_route(
    board: &BoardState,
    player: PlayerId,
    from: TerritoryId,
    to: TerritoryId,
    is_combat_move: bool,
) -> Option<Route> {
    let through = territory_can_move_sea_units_through(board, player, is_combat_move);
    board.route_with_steps(from, to, |a, b| {
        (b == to || through.test(b)) && no_canal_between(board, player, a, b)
    })
}

/// Route for a group of units moving together.
///
/// Any sea unit makes it a sea move, carriers with their planes included.
/// All-land groups path through friendly land or, when `land_filter_unit` is
/// a blitzer in a combat move, blitzable land. All-air groups avoid enemy
/// anti-air. Mixed land and air groups get no route.
pub(crate) fn route_for_group(
    board: &BoardState,
    player: PlayerId,
    units: &[UnitId],
    land_filter_unit: UnitId,
    from: TerritoryId,
    to: TerritoryId,
    is_combat_move: bool,
) -> Option<Route> {
    if units.iter().any(|&u| board.unit_type(u).is_sea()) {
        sea_route(board, player, from, to, is_combat_move)
    } else if units.iter().all(|&u| board.unit_type(u).is_land()) {
        let through =
            territory_can_move_land_units_through(board, player, land_filter_unit, from, is_combat_move);
        board.route_ignore_end(from, to, |t| through.test(t))
    } else if units.iter().all(|&u| board.unit_type(u).is_air()) {
        let through = territory_can_move_air_units_and_no_aa(board, player);
        board.route_ignore_end(from, to, |t| through.test(t))
    } else {
        None
    }
}

/// Transports and cargo handled by the amphibious scheduler.
fn amphib_units(pass: &PlanningPass) -> BTreeSet<UnitId> {
    pass.territories()
        .flat_map(|pt| pt.amphib_attack_map())
        .flat_map(|(&transport, cargo)| std::iter::once(transport).chain(cargo.iter().copied()))
        .collect()
}

/// One move per unit assigned in `pass`, in territory then assignment order.
///
/// Amphibious units and units already in their target are skipped. A land
/// unit with no route of its own from the same start as the last land
/// transport seen for the target retries with that transport's filter.
pub fn calculate_move_routes(board: &BoardState, pass: &PlanningPass, is_combat_move: bool) -> MovePlan {
    let player = pass.player();
    let amphib = amphib_units(pass);
    let mut plan = MovePlan::default();

    for pt in pass.territories() {
        let t = pt.territory();
        let mut last_land_transport: Option<(TerritoryId, UnitId)> = None;
        for &u in pt.units() {
            if amphib.contains(&u) {
                continue;
            }
            let start = board.unit_territory(u);
            if start == t {
                continue;
            }

            let mut units = vec![u];
            if board.unit_type(u).land_transport {
                last_land_transport = Some((start, u));
            }
            if board.unit_type(u).is_carrier() {
                if let Some(planes) = carrier_must_move_with(board, start, player).get(&u) {
                    units.extend(planes);
                }
            }

            let mut route = route_for_group(board, player, &units, u, start, t, is_combat_move);
            if route.is_none() && board.unit_type(u).is_land() {
                if let Some((transport_start, transport)) = last_land_transport {
                    if transport_start == start {
                        route =
                            route_for_group(board, player, &units, transport, start, t, is_combat_move);
                    }
                }
            }

            match route {
                Some(route) => plan.moves.push(MoveCommand::new(units, route)),
                None => {
                    warn!(
                        from = %board.territory(start).name,
                        to = %board.territory(t).name,
                        units = ?units,
                        "could not calculate route"
                    );
                    plan.unroutable.push(Unroutable { units, from: start, to: t });
                }
            }
        }
    }
    plan
}

/// Sea moves taking bombarding units to the zone they fire from.
pub fn calculate_bombard_routes(board: &BoardState, pass: &PlanningPass) -> MovePlan {
    let player = pass.player();
    let mut plan = MovePlan::default();
    for pt in pass.territories() {
        for (&u, &from) in pt.bombard_territory_map() {
            let start = board.unit_territory(u);
            if start == from {
                continue;
            }
            match sea_route(board, player, start, from, true) {
                Some(route) => plan.moves.push(MoveCommand::new(vec![u], route)),
                None => {
                    warn!(
                        from = %board.territory(start).name,
                        to = %board.territory(from).name,
                        unit = ?u,
                        "could not calculate bombard route"
                    );
                    plan.unroutable.push(Unroutable { units: vec![u], from: start, to: from });
                }
            }
        }
    }
    plan
}
