//! Purchase planning.
//!
//! Rates the buyable production rules, prunes them against the budget and
//! placement rules, then spends the budget on defenders and randomized
//! land purchases.

pub mod allocate;
pub mod option;
pub mod validate;

pub use allocate::{
    find_bid_territories, find_max_purchase_defenders, find_purchase_territories,
    increment_bid_production, max_constructions, purchase_land_units, randomize_purchase_option,
    unit_production, PurchaseTerritory,
};
pub use option::{
    default_catalog, find_max_movement_for_transports, min_cost_per_hit_point, purchase_catalog,
    PurchaseOption, PurchaseOptions,
};
pub use validate::{
    find_purchase_options_for_territory, remove_invalid_purchase_options, units_to_consume,
    PlacementValidator, PurchaseLimits, RulesValidator,
};
