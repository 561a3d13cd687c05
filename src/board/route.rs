//! Paths through the adjacency graph.

use serde::Serialize;

use super::territory::TerritoryId;

/// A start territory followed by the territories entered, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub start: TerritoryId,
    pub steps: Vec<TerritoryId>,
}

impl Route {
    pub fn new(start: TerritoryId, steps: Vec<TerritoryId>) -> Self {
        Route { start, steps }
    }

    /// A single-step route between two adjacent territories.
    pub fn between(from: TerritoryId, to: TerritoryId) -> Self {
        Route {
            start: from,
            steps: vec![to],
        }
    }

    /// Builds a route from a full path including the start. Returns `None` for an empty path.
    pub fn from_path(path: &[TerritoryId]) -> Option<Self> {
        let (&start, rest) = path.split_first()?;
        Some(Route {
            start,
            steps: rest.to_vec(),
        })
    }

    /// The final territory, which is the start for a zero-step route.
    pub fn end(&self) -> TerritoryId {
        self.steps.last().copied().unwrap_or(self.start)
    }

    /// Number of steps taken.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Territories entered before the end.
    pub fn middle(&self) -> &[TerritoryId] {
        match self.steps.split_last() {
            Some((_, middle)) => middle,
            None => &[],
        }
    }

    /// Every territory on the route, start included.
    pub fn territories(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        std::iter::once(self.start).chain(self.steps.iter().copied())
    }
}
