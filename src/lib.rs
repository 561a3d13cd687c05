//! Quartermaster turn planner library.
//!
//! Exposes the board query layer, combat estimation, territory valuation,
//! logistics, purchasing and the turn planner for use by integration tests
//! and the binary entry point.

pub mod board;
pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod logistics;
pub mod planning;
pub mod protocol;
pub mod purchase;
