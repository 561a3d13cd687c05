//! Input and output formats.
//!
//! Scenario snapshots come in as JSON and are resolved into a board; turn
//! plans go out as JSON.

pub mod plan;
pub mod scenario;

pub use plan::{purchase_commands, BattleSummary, PurchaseCommand, TurnPlan};
pub use scenario::Scenario;
