//! Carrier capacity bookkeeping and casualty ordering of carriers and planes.

use std::collections::BTreeMap;

use crate::board::matches::{territory_is_passable, unit_can_land_on_carrier, unit_is_carrier};
use crate::board::{BoardState, PlayerId, TerritoryId, UnitId};

/// Total carrier capacity of the carriers among `units`.
pub fn carrier_capacity(board: &BoardState, units: &[UnitId]) -> i32 {
    units
        .iter()
        .map(|&u| board.unit_type(u).carrier_capacity as i32)
        .sum()
}

fn carrier_cost(board: &BoardState, unit: UnitId) -> i32 {
    board.unit_type(unit).carrier_cost as i32
}

fn is_allied_air(board: &BoardState, player: PlayerId, unit: UnitId) -> bool {
    board.unit_type(unit).is_air() && board.is_allied(board.unit(unit).owner, player)
}

fn is_owned_air(board: &BoardState, player: PlayerId, unit: UnitId) -> bool {
    board.unit_type(unit).is_air() && board.unit(unit).owner == player
}

/// Allied carrier-capable planes among `units` that do not fit on the
/// carriers among `units`, taken in order.
pub fn air_that_cant_land_on_carrier(
    board: &BoardState,
    player: PlayerId,
    units: &[UnitId],
) -> Vec<UnitId> {
    let mut capacity = carrier_capacity(board, units);
    let mut cant_land = Vec::new();
    for &u in units {
        if !is_allied_air(board, player, u) {
            continue;
        }
        let cost = carrier_cost(board, u);
        if cost == 0 {
            continue;
        }
        if cost <= capacity {
            capacity -= cost;
        } else {
            cant_land.push(u);
        }
    }
    cant_land
}

/// Returns true if the carriers among `existing` can hold every allied
/// plane among them plus `new_unit`.
pub fn validate_carrier_capacity(
    board: &BoardState,
    player: PlayerId,
    existing: &[UnitId],
    new_unit: UnitId,
) -> bool {
    let capacity = carrier_capacity(board, existing);
    let needed: i32 = existing
        .iter()
        .copied()
        .filter(|&u| is_allied_air(board, player, u))
        .chain(std::iter::once(new_unit))
        .map(|u| carrier_cost(board, u))
        .sum();
    capacity >= needed
}

/// Carrier capacity left in `t` after the player's own planes, counting
/// the units about to be placed there.
pub fn unused_carrier_capacity(
    board: &BoardState,
    player: PlayerId,
    t: TerritoryId,
    units_to_place: &[UnitId],
) -> i32 {
    let mut units = units_to_place.to_vec();
    units.extend_from_slice(board.units_in(t));
    let owned_air: i32 = units
        .iter()
        .filter(|&&u| is_owned_air(board, player, u))
        .map(|&u| carrier_cost(board, u))
        .sum();
    carrier_capacity(board, &units) - owned_air
}

/// Like [`unused_carrier_capacity`] but over every territory planes could
/// reach within two moves of `t`, counting only the player's own units.
pub fn unused_local_carrier_capacity(
    board: &BoardState,
    player: PlayerId,
    t: TerritoryId,
    units_to_place: &[UnitId],
) -> i32 {
    let passable = territory_is_passable(board);
    let mut nearby = board.neighbors_within(t, 2, |n| passable.test(n));
    nearby.insert(t);
    let mut owned = Vec::new();
    for &n in &nearby {
        owned.extend(board.units_in(n).iter().copied().filter(|&u| board.unit(u).owner == player));
        if n == t {
            owned.extend_from_slice(units_to_place);
        }
    }
    let owned_air: i32 = owned
        .iter()
        .filter(|&&u| is_owned_air(board, player, u))
        .map(|&u| carrier_cost(board, u))
        .sum();
    carrier_capacity(board, &owned) - owned_air
}

/// Allied planes in `start` that ride on each of the player's carriers
/// there.
///
/// Planes belonging to allies are carried by allied carriers first; what
/// remains is shared out over the player's carriers in order, each taking
/// planes while they fit.
pub fn carrier_must_move_with(
    board: &BoardState,
    start: TerritoryId,
    player: PlayerId,
) -> BTreeMap<UnitId, Vec<UnitId>> {
    let lands_on_carrier = unit_can_land_on_carrier(board);
    let carriers = unit_is_carrier(board);
    let units = board.units_in(start);
    let mut allied_air: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|&u| {
            let owner = board.unit(u).owner;
            owner != player && board.is_allied(owner, player) && lands_on_carrier.test(u)
        })
        .collect();
    let mut mapping = BTreeMap::new();
    if allied_air.is_empty() {
        return mapping;
    }

    let take = |carrier: UnitId, air: &mut Vec<UnitId>| {
        let mut space = board.unit_type(carrier).carrier_capacity as i32;
        let mut carried = Vec::new();
        air.retain(|&plane| {
            let cost = carrier_cost(board, plane);
            if cost <= space {
                space -= cost;
                carried.push(plane);
                false
            } else {
                true
            }
        });
        carried
    };
    for &u in units {
        let owner = board.unit(u).owner;
        if carriers.test(u) && owner != player && board.is_allied(owner, player) {
            take(u, &mut allied_air);
        }
    }
    for &u in units {
        if carriers.test(u) && board.unit(u).owner == player {
            mapping.insert(u, take(u, &mut allied_air));
        }
    }
    mapping
}

/// Index of the last carrier in `units` not yet in `filled`.
fn last_unfilled_carrier(board: &BoardState, units: &[UnitId], filled: &[UnitId]) -> Option<usize> {
    units
        .iter()
        .rposition(|&u| board.unit_type(u).carrier_capacity > 0 && !filled.contains(&u))
}

/// Reorders a casualty list so carriers sit right after the planes they
/// would carry.
///
/// Works from the back of the list. The last `planes_that_dont_need_to_land`
/// planes are left alone. For each further group of planes the last unfilled
/// carrier is found: a carrier earlier in the list is moved up behind the
/// group, otherwise the group's planes are moved down in front of the
/// carrier. Lists without both carriers and carrier planes are returned
/// unchanged. The result is always a permutation of `units`.
///
/// When the planes outnumber the carriers' room, every carrier still
/// follows only the planes it can hold and the planes that fit nowhere stay
/// ahead of the first carrier.
pub fn interleave_carriers_and_planes(
    board: &BoardState,
    units: &[UnitId],
    planes_that_dont_need_to_land: usize,
) -> Vec<UnitId> {
    let plane_cost = |u: UnitId| carrier_cost(board, u);
    let capacity = |u: UnitId| board.unit_type(u).carrier_capacity as i32;
    if !units.iter().any(|&u| capacity(u) > 0) || !units.iter().any(|&u| plane_cost(u) > 0) {
        return units.to_vec();
    }

    let mut result = units.to_vec();
    let mut seeked: Option<UnitId> = None;
    let mut index_to_place: isize = -1;
    let mut space_left: i32 = -1;
    let mut processed_planes = 0;
    let mut filled: Vec<UnitId> = Vec::new();

    let mut i = result.len() as isize - 1;
    while i >= 0 {
        let Some(&unit) = result.get(i as usize) else {
            break;
        };
        let cost = plane_cost(unit);
        if cost > 0 || i == 0 {
            if processed_planes < planes_that_dont_need_to_land && i > 0 {
                processed_planes += 1;
                i -= 1;
                continue;
            }

            if seeked.is_none() && i > 0 {
                let Some(index) = last_unfilled_carrier(board, &result, &filled) else {
                    break;
                };
                seeked = Some(result[index]);
                index_to_place = i + 1;
                space_left = capacity(result[index]);
            }
            if cost > 0 {
                space_left -= cost;
            }

            if index_to_place > 0 && (space_left <= 0 || i == 0) {
                if space_left < 0 {
                    // The plane did not fit; look at it again for the next carrier.
                    i += 1;
                }
                let Some(carrier) = seeked else {
                    break;
                };
                let Some(carrier_index) = result.iter().position(|&u| u == carrier) else {
                    break;
                };
                let carrier_index = carrier_index as isize;

                if carrier_index < i {
                    result.remove(carrier_index as usize);
                    let at = ((index_to_place - 1).max(0) as usize).min(result.len());
                    result.insert(at, carrier);
                    i -= 1;
                    filled.push(carrier);

                    let Some(next) = last_unfilled_carrier(board, &result, &filled) else {
                        break;
                    };
                    seeked = Some(result[next]);
                    index_to_place = i;
                    space_left = capacity(result[next]);
                } else {
                    let mut place = index_to_place;
                    result.remove(carrier_index as usize);
                    if carrier_index < index_to_place {
                        place -= 1;
                    }
                    let at = (place.max(0) as usize).min(result.len());
                    result.insert(at, carrier);
                    filled.push(carrier);

                    let from = i.max(0) as usize;
                    let mut planes: Vec<UnitId> = result
                        .get(from..at)
                        .unwrap_or(&[])
                        .iter()
                        .copied()
                        .filter(|&u| plane_cost(u) > 0)
                        .collect();
                    planes.reverse();
                    let mut moved = 0;
                    for plane in planes {
                        if let Some(p) = result.iter().position(|&u| u == plane) {
                            result.remove(p);
                            let to = ((place - 1).max(0) as usize).min(result.len());
                            result.insert(to, plane);
                            moved += 1;
                        }
                    }

                    let Some(next) = last_unfilled_carrier(board, &result, &filled) else {
                        break;
                    };
                    seeked = Some(result[next]);
                    index_to_place = place - moved;
                    space_left = capacity(result[next]);
                }
            }
        }
        i -= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::fixture;

    #[test]
    fn planes_beyond_capacity_cant_land() {
        let mut f = fixture();
        let sz = f.map.sz_mid;
        let mut units = f.add(f.ty.carrier, f.red, sz, 1);
        units.extend(f.add(f.ty.fighter, f.red, sz, 2));
        let extra = f.add(f.ty.fighter, f.green, sz, 1);
        units.extend(&extra);
        units.extend(f.add(f.ty.bomber, f.red, sz, 1));
        assert_eq!(air_that_cant_land_on_carrier(&f.board, f.red, &units), extra);
        assert!(!validate_carrier_capacity(&f.board, f.red, &units[..3], extra[0]));
        assert!(validate_carrier_capacity(&f.board, f.red, &units[..2], extra[0]));
    }

    #[test]
    fn unused_capacity_counts_placements_and_neighbors() {
        let mut f = fixture();
        f.add(f.ty.fighter, f.red, f.map.sz_home, 1);
        let placed = f.board.spawn_units(f.ty.carrier, 1, f.red, f.map.sz_home);
        assert_eq!(unused_carrier_capacity(&f.board, f.red, f.map.sz_home, &[]), -1);
        assert_eq!(unused_carrier_capacity(&f.board, f.red, f.map.sz_home, &placed), 1);

        f.add(f.ty.carrier, f.red, f.map.sz_enemy, 1);
        f.add(f.ty.fighter, f.red, f.map.home, 2);
        // sz_enemy is two hops from sz_home; home is one.
        assert_eq!(unused_local_carrier_capacity(&f.board, f.red, f.map.sz_home, &placed), 1);
    }

    #[test]
    fn ally_planes_ride_with_owned_carrier() {
        let mut f = fixture();
        let sz = f.map.sz_mid;
        let carrier = f.add(f.ty.carrier, f.red, sz, 1)[0];
        let own = f.add(f.ty.fighter, f.red, sz, 1);
        let allied = f.add(f.ty.fighter, f.green, sz, 3);
        let map = carrier_must_move_with(&f.board, sz, f.red);
        assert_eq!(map[&carrier], allied[..2].to_vec());
        assert!(!map[&carrier].contains(&own[0]));
        assert!(carrier_must_move_with(&f.board, f.map.sz_home, f.red).is_empty());
    }

    #[test]
    fn interleave_moves_carrier_behind_its_planes() {
        let mut f = fixture();
        let sz = f.map.sz_mid;
        let carrier = f.add(f.ty.carrier, f.red, sz, 1)[0];
        let destroyer = f.add(f.ty.destroyer, f.red, sz, 1)[0];
        let fighters = f.add(f.ty.fighter, f.red, sz, 2);
        let units = vec![carrier, destroyer, fighters[0], fighters[1]];
        let result = interleave_carriers_and_planes(&f.board, &units, 0);
        assert_eq!(result, vec![destroyer, fighters[0], fighters[1], carrier]);
    }

    #[test]
    fn interleave_leaves_lists_without_planes_alone() {
        let mut f = fixture();
        let sz = f.map.sz_mid;
        let units = [f.add(f.ty.destroyer, f.red, sz, 2), f.add(f.ty.carrier, f.red, sz, 1)].concat();
        assert_eq!(interleave_carriers_and_planes(&f.board, &units, 0), units);
    }
}
