//! Combat evaluation.
//!
//! Cheap strength estimates, the gated calls into the battle oracle and the
//! local superiority checks built on both.

pub mod dice;
pub mod odds;
pub mod oracle;
pub mod power;
pub mod result;
pub mod superiority;

pub use dice::DiceOracle;
pub use odds::{check_if_no_attackers_or_defenders, OddsCalculator};
pub use oracle::{AggregateResults, BattleOracle, BattleRequest};
pub use power::{
    check_for_overwhelming_win, estimate_power, estimate_strength, estimate_strength_difference,
    total_power, unit_powers, UnitPower, UNOPPOSED_DIFFERENCE,
};
pub use result::BattleResult;
pub use superiority::{
    territory_has_local_land_superiority, territory_has_local_naval_superiority, PlaceUnits,
};
