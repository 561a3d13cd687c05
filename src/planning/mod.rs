//! Per-pass planning state and move prioritization.

pub mod pass;
pub mod prioritize;
pub mod territory;

pub use pass::PlanningPass;
pub use prioritize::{
    sort_unit_move_options, sort_unit_needed_options, sort_unit_needed_options_then_attack,
    UnitOptions,
};
pub use territory::PlanningTerritory;
