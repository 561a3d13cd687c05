//! Move commands handed to the execution collaborator.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::board::{Route, TerritoryId, UnitId};

/// One group of units moving along one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveCommand {
    pub units: Vec<UnitId>,
    pub route: Route,
    /// Cargo boarding a sea transport on this move, mapped to the transport.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub units_to_sea_transports: BTreeMap<UnitId, UnitId>,
}

impl MoveCommand {
    pub fn new(units: Vec<UnitId>, route: Route) -> Self {
        MoveCommand {
            units,
            route,
            units_to_sea_transports: BTreeMap::new(),
        }
    }

    /// A single unit boarding `transport` at the end of `route`.
    pub fn load(unit: UnitId, route: Route, transport: UnitId) -> Self {
        MoveCommand {
            units: vec![unit],
            route,
            units_to_sea_transports: BTreeMap::from([(unit, transport)]),
        }
    }

    pub fn is_transport_load(&self) -> bool {
        !self.units_to_sea_transports.is_empty()
    }
}

/// Units dropped from a plan because no legal route was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unroutable {
    pub units: Vec<UnitId>,
    pub from: TerritoryId,
    pub to: TerritoryId,
}

/// Moves to perform, in order, and the units that could not be routed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovePlan {
    pub moves: Vec<MoveCommand>,
    pub unroutable: Vec<Unroutable>,
}

impl MovePlan {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.unroutable.is_empty()
    }

    pub fn append(&mut self, mut other: MovePlan) {
        self.moves.append(&mut other.moves);
        self.unroutable.append(&mut other.unroutable);
    }
}
