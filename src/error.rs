//! Error types.
//!
//! Only contract violations and input loading fail with an error. Routing
//! gaps and infeasible purchases are ordinary outcomes handled where they
//! occur, and cancellation yields empty results.

use crate::board::{TerritoryId, UnitId};

/// A caller broke a precondition the planner relies on.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("unit {unit:?} is already committed to {existing:?}, cannot also move to {requested:?}")]
    UnitAlreadyCommitted {
        unit: UnitId,
        existing: TerritoryId,
        requested: TerritoryId,
    },

    #[error("placing {unit_type} needs {required} {consumed} to consume, only {available} available")]
    MissingConsumables {
        unit_type: String,
        consumed: String,
        required: u32,
        available: u32,
    },

    #[error("no planning entry for territory {0:?}")]
    UnknownPlanningTerritory(TerritoryId),
}

/// Errors raised while loading a scenario or configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown territory '{0}'")]
    UnknownTerritory(String),

    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("unknown player '{0}'")]
    UnknownPlayer(String),

    #[error("duplicate name '{0}'")]
    Duplicate(String),

    #[error("invalid scenario: {0}")]
    Invalid(String),
}

impl ScenarioError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ScenarioError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
