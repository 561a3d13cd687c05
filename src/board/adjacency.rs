//! Graph queries over the territory adjacency lists.
//!
//! Every search is a plain breadth-first walk over a `VecDeque`, so distances
//! are hop counts. Filters are ordinary closures: a territory filter decides
//! whether a territory may be entered, and a step filter sees both ends of an
//! edge (needed for canal checks).
//!
//! Unless named otherwise, a filter applies to every territory entered,
//! including the end. The `_ignore_end` variants only constrain the
//! territories passed through.

use std::collections::{BTreeSet, VecDeque};

use super::route::Route;
use super::state::BoardState;
use super::territory::TerritoryId;

const UNREACHED: u32 = u32::MAX;

impl BoardState {
    /// Territories directly adjacent to `t`.
    #[inline]
    pub fn neighbors(&self, t: TerritoryId) -> &[TerritoryId] {
        &self.adjacency[t.index()]
    }

    pub fn neighbors_matching(
        &self,
        t: TerritoryId,
        cond: impl Fn(TerritoryId) -> bool,
    ) -> Vec<TerritoryId> {
        self.neighbors(t).iter().copied().filter(|&n| cond(n)).collect()
    }

    pub fn is_adjacent(&self, a: TerritoryId, b: TerritoryId) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Territories reachable from `t` within `distance` steps through
    /// territories matching `cond`. The start is not included.
    pub fn neighbors_within(
        &self,
        t: TerritoryId,
        distance: u32,
        cond: impl Fn(TerritoryId) -> bool,
    ) -> BTreeSet<TerritoryId> {
        self.collect_within(t, distance, |_, n| cond(n), true)
    }

    /// Like [`neighbors_within`](Self::neighbors_within) but territories that
    /// fail `cond` are still reported; the search just does not continue
    /// through them.
    pub fn neighbors_within_ignore_end(
        &self,
        t: TerritoryId,
        distance: u32,
        cond: impl Fn(TerritoryId) -> bool,
    ) -> BTreeSet<TerritoryId> {
        self.collect_within(t, distance, |_, n| cond(n), false)
    }

    fn collect_within(
        &self,
        start: TerritoryId,
        distance: u32,
        step: impl Fn(TerritoryId, TerritoryId) -> bool,
        filter_ends: bool,
    ) -> BTreeSet<TerritoryId> {
        let mut found = BTreeSet::new();
        let mut dist = vec![UNREACHED; self.territories.len()];
        let mut queue = VecDeque::new();
        dist[start.index()] = 0;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let d = dist[current.index()];
            if d >= distance {
                continue;
            }
            for &n in self.neighbors(current) {
                if dist[n.index()] != UNREACHED {
                    continue;
                }
                let passable = step(current, n);
                if !passable && filter_ends {
                    continue;
                }
                dist[n.index()] = d + 1;
                found.insert(n);
                if passable {
                    queue.push_back(n);
                }
            }
        }
        found
    }

    /// Hop distance ignoring all restrictions.
    pub fn distance(&self, from: TerritoryId, to: TerritoryId) -> Option<u32> {
        self.shortest_path(from, to, |_, _| true).map(|p| p.len() as u32 - 1)
    }

    pub fn distance_with(
        &self,
        from: TerritoryId,
        to: TerritoryId,
        cond: impl Fn(TerritoryId) -> bool,
    ) -> Option<u32> {
        self.route(from, to, cond).map(|r| r.len() as u32)
    }

    /// Distance using a step filter that sees both ends of each edge.
    pub fn distance_with_steps(
        &self,
        from: TerritoryId,
        to: TerritoryId,
        step: impl Fn(TerritoryId, TerritoryId) -> bool,
    ) -> Option<u32> {
        self.shortest_path(from, to, step).map(|p| p.len() as u32 - 1)
    }

    pub fn distance_ignore_end(
        &self,
        from: TerritoryId,
        to: TerritoryId,
        cond: impl Fn(TerritoryId) -> bool,
    ) -> Option<u32> {
        self.route_ignore_end(from, to, cond).map(|r| r.len() as u32)
    }

    /// Shortest route where every entered territory matches `cond`.
    pub fn route(
        &self,
        from: TerritoryId,
        to: TerritoryId,
        cond: impl Fn(TerritoryId) -> bool,
    ) -> Option<Route> {
        self.route_with_steps(from, to, |_, n| cond(n))
    }

    /// Shortest route where only the intermediate territories must match `cond`.
    pub fn route_ignore_end(
        &self,
        from: TerritoryId,
        to: TerritoryId,
        cond: impl Fn(TerritoryId) -> bool,
    ) -> Option<Route> {
        self.route_with_steps(from, to, |_, n| n == to || cond(n))
    }

    pub fn route_with_steps(
        &self,
        from: TerritoryId,
        to: TerritoryId,
        step: impl Fn(TerritoryId, TerritoryId) -> bool,
    ) -> Option<Route> {
        self.shortest_path(from, to, step)
            .and_then(|path| Route::from_path(&path))
    }

    /// Breadth-first shortest path including both endpoints.
    ///
    /// Neighbors are expanded in adjacency-list order, so ties resolve to the
    /// first edge added to the board.
    fn shortest_path(
        &self,
        from: TerritoryId,
        to: TerritoryId,
        step: impl Fn(TerritoryId, TerritoryId) -> bool,
    ) -> Option<Vec<TerritoryId>> {
        if from == to {
            return Some(vec![from]);
        }
        let mut prev: Vec<Option<TerritoryId>> = vec![None; self.territories.len()];
        let mut seen = vec![false; self.territories.len()];
        let mut queue = VecDeque::new();
        seen[from.index()] = true;
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for &n in self.neighbors(current) {
                if seen[n.index()] || !step(current, n) {
                    continue;
                }
                seen[n.index()] = true;
                prev[n.index()] = Some(current);
                if n == to {
                    let mut path = vec![to];
                    let mut cursor = current;
                    path.push(cursor);
                    while let Some(p) = prev[cursor.index()] {
                        path.push(p);
                        cursor = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(n);
            }
        }
        None
    }

    /// Layered breadth-first traversal from `start` through territories
    /// matching `cond`.
    ///
    /// `visit` is called once per reached territory (the start excluded) with
    /// its distance, and returns whether the search should go on. Returning
    /// false stops the traversal after the current layer is finished.
    pub fn breadth_first(
        &self,
        start: TerritoryId,
        cond: impl Fn(TerritoryId) -> bool,
        mut visit: impl FnMut(TerritoryId, u32) -> bool,
    ) {
        let mut seen = vec![false; self.territories.len()];
        seen[start.index()] = true;
        let mut layer = vec![start];
        let mut distance = 0;

        while !layer.is_empty() {
            distance += 1;
            let mut next = Vec::new();
            let mut keep_going = true;
            for &t in &layer {
                for &n in self.neighbors(t) {
                    if seen[n.index()] || !cond(n) {
                        continue;
                    }
                    seen[n.index()] = true;
                    next.push(n);
                    keep_going &= visit(n, distance);
                }
            }
            if !keep_going {
                break;
            }
            layer = next;
        }
    }

    /// Size of the connected component containing `start` under `cond`,
    /// counting the start itself.
    pub fn connected_size(&self, start: TerritoryId, cond: impl Fn(TerritoryId) -> bool) -> usize {
        let mut size = 1;
        self.breadth_first(start, cond, |_, _| {
            size += 1;
            true
        });
        size
    }
}
