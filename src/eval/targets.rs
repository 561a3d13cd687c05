//! Strategic targets: enemy capitals, factories and land-mass size.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::matches::territory_can_potentially_move_land_units;
use crate::board::{BoardState, PlayerId, TerritoryId};

/// Size of the largest connected body of passable land, at least 1.
pub fn find_max_land_mass_size(board: &BoardState) -> usize {
    let can_move_land = territory_can_potentially_move_land_units(board);
    let mut visited = vec![false; board.territories.len()];
    let mut max_size = 1;
    for t in board.territory_ids() {
        if visited[t.index()] || !can_move_land.test(t) {
            continue;
        }
        visited[t.index()] = true;
        let mut size = 1;
        board.breadth_first(
            t,
            |n| can_move_land.test(n),
            |n, _| {
                visited[n.index()] = true;
                size += 1;
                true
            },
        );
        max_size = max_size.max(size);
    }
    max_size
}

/// Territories of `player`'s enemies that are still held by their owner and
/// marked as that owner's capital.
pub fn live_enemy_capitals(board: &BoardState, player: PlayerId) -> Vec<TerritoryId> {
    board
        .territory_ids()
        .filter(|&t| {
            let territory = board.territory(t);
            match (territory.capital_of, territory.owner) {
                (Some(capital), Some(owner)) => capital == owner && !board.is_allied(owner, player),
                _ => false,
            }
        })
        .collect()
}

/// Scores every enemy capital and factory the player may aim for.
///
/// Factories count when an enemy owns them or their territory is written
/// off as unholdable. If at least half of the enemy's territories hold a
/// factory, factories stop being special and the list is cleared. Live
/// enemy capitals are always added back, and territories already being
/// attacked are removed.
///
/// Each target is worth
/// `sqrt(factory production + sqrt(owner production)) × 32 / (1 + 3 × neutral)`,
/// scaled by the land reachable within `land_mass_distance` hops relative
/// to `max_land_mass`.
pub fn find_enemy_capitals_and_factories_value(
    board: &BoardState,
    player: PlayerId,
    max_land_mass: usize,
    land_mass_distance: u32,
    cant_be_held: &[TerritoryId],
    to_attack: &[TerritoryId],
) -> BTreeMap<TerritoryId, f64> {
    let enemy_owned = |t: TerritoryId| {
        board
            .territory(t)
            .owner
            .is_some_and(|o| !board.is_allied(o, player))
    };
    let mut targets: BTreeSet<TerritoryId> = board
        .territory_ids()
        .filter(|&t| board.has_factory(t) && (enemy_owned(t) || cant_be_held.contains(&t)))
        .collect();
    let enemy_territories = board.territory_ids().filter(|&t| enemy_owned(t)).count();
    if targets.len() * 2 >= enemy_territories {
        targets.clear();
    }
    targets.extend(live_enemy_capitals(board, player));
    for t in to_attack {
        targets.remove(t);
    }

    let can_move_land = territory_can_potentially_move_land_units(board);
    let max_land_mass = max_land_mass.max(1) as f64;
    targets
        .into_iter()
        .map(|t| {
            let territory = board.territory(t);
            let factory_production = if !territory.is_water && board.has_factory(t) {
                territory.production
            } else {
                0
            };
            let player_production = match (territory.capital_of, territory.owner) {
                (Some(_), Some(owner)) => board.player_production(owner) as f64,
                _ => 0.0,
            };
            let neutral = if territory.is_neutral_land() { 1.0 } else { 0.0 };
            let land_mass =
                1 + board.neighbors_within(t, land_mass_distance, |n| can_move_land.test(n)).len();
            let value = (factory_production as f64 + player_production.sqrt()).sqrt() * 32.0
                / (1.0 + 3.0 * neutral)
                * land_mass as f64
                / max_land_mass;
            (t, value)
        })
        .collect()
}

/// Targets from `targets` found by a breadth-first search from `start`.
///
/// Every layer up to `search_distance` is searched. Past that the search
/// goes on layer by layer only until something has been found, and stops
/// when the graph is exhausted.
pub fn find_nearby_enemy_capitals_and_factories(
    board: &BoardState,
    start: TerritoryId,
    targets: &BTreeMap<TerritoryId, f64>,
    search_distance: u32,
) -> Vec<TerritoryId> {
    let mut found = Vec::new();
    board.breadth_first(
        start,
        |_| true,
        |t, distance| {
            if targets.contains_key(&t) {
                found.push(t);
            }
            distance < search_distance || found.is_empty()
        },
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::fixture;
    use crate::board::{GameRules, Territory};

    #[test]
    fn max_land_mass_counts_largest_continent() {
        let f = fixture();
        // home, plains, border, enemy_cap, wastes; island stands alone.
        assert_eq!(find_max_land_mass_size(&f.board), 5);
    }

    #[test]
    fn capitals_and_factories() {
        let f = fixture();
        assert_eq!(live_enemy_capitals(&f.board, f.red), vec![f.map.enemy_cap]);
        assert_eq!(live_enemy_capitals(&f.board, f.blue), vec![f.map.home]);

        let values = find_enemy_capitals_and_factories_value(&f.board, f.red, 5, 6, &[], &[]);
        assert_eq!(values.len(), 1);
        // Factory production 8, Blue production 8 + 2 + 2 = 12.
        // Land reachable within 6 hops of enemy_cap: the other 4 territories.
        let expected = (8.0 + 12f64.sqrt()).sqrt() * 32.0 * 5.0 / 5.0;
        assert!((values[&f.map.enemy_cap] - expected).abs() < 1e-9);

        let attacked =
            find_enemy_capitals_and_factories_value(&f.board, f.red, 5, 6, &[], &[f.map.enemy_cap]);
        assert!(attacked.is_empty());
    }

    #[test]
    fn factory_heavy_enemy_clears_factory_targets() {
        let mut f = fixture();
        // Blue owns border, enemy_cap and island; factories in two of three.
        f.add(f.ty.factory, f.blue, f.map.border, 1);
        let values = find_enemy_capitals_and_factories_value(&f.board, f.red, 5, 6, &[], &[]);
        assert_eq!(values.keys().copied().collect::<Vec<_>>(), vec![f.map.enemy_cap]);

        let mut g = fixture();
        g.board.territory_mut(g.map.enemy_cap).capital_of = None;
        g.add(g.ty.factory, g.blue, g.map.border, 1);
        let values = find_enemy_capitals_and_factories_value(&g.board, g.red, 5, 6, &[], &[]);
        assert!(values.is_empty(), "two of three enemy territories have factories");
    }

    /// A chain of 14 land territories, t0..t13.
    fn chain() -> (BoardState, Vec<TerritoryId>) {
        let mut board = BoardState::new(GameRules::default());
        let ids: Vec<TerritoryId> = (0..14)
            .map(|i| board.add_territory(Territory::new(format!("t{}", i), false)))
            .collect();
        for pair in ids.windows(2) {
            board.connect(pair[0], pair[1]);
        }
        (board, ids)
    }

    #[test]
    fn nearby_search_stops_once_something_is_found_past_radius() {
        let (board, ids) = chain();
        let targets: BTreeMap<TerritoryId, f64> =
            [(ids[3], 1.0), (ids[12], 1.0)].into_iter().collect();
        assert_eq!(
            find_nearby_enemy_capitals_and_factories(&board, ids[0], &targets, 9),
            vec![ids[3]]
        );

        let far: BTreeMap<TerritoryId, f64> = [(ids[12], 1.0), (ids[13], 1.0)].into_iter().collect();
        assert_eq!(
            find_nearby_enemy_capitals_and_factories(&board, ids[0], &far, 9),
            vec![ids[12]],
            "widens one layer at a time"
        );

        let none: BTreeMap<TerritoryId, f64> = BTreeMap::new();
        assert!(find_nearby_enemy_capitals_and_factories(&board, ids[0], &none, 9).is_empty());
    }
}
