//! Planner configuration.
//!
//! Every threshold the planner tunes on lives here with its customary
//! default. Values can be overridden from a JSON object; missing keys keep
//! their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Win percentage an attack should reach before more units stop being added.
    pub win_percentage: f64,
    /// Win percentage below which a territory is not considered won.
    pub min_win_percentage: f64,
    /// Attacks whose strength-difference index falls below this skip the oracle.
    pub attack_gate: f64,
    /// Defences whose strength-difference index rises above this skip the oracle.
    pub defend_gate: f64,
    /// Floor on oracle runs for very large battles.
    pub min_battle_runs: u32,
    /// Runs used for the smallest battles; larger battles use fewer.
    pub max_battle_runs: u32,
    /// Radius searched for enemy capitals and factories before widening.
    pub target_search_distance: u32,
    /// Land hops considered when summing nearby enemy production.
    pub nearby_land_distance: u32,
    /// Sea hops considered when valuing land reachable from a sea zone.
    pub nearby_water_distance: u32,
    /// Land hops counted towards a territory's land mass.
    pub land_mass_distance: u32,
    /// Sea hops considered for convoy and enemy fleet value.
    pub sea_value_distance: u32,
    /// Attackers retreat once only air units remain.
    pub retreat_when_only_air_left: bool,
    /// Moves a transport is assumed to have when none can be derived.
    pub default_transport_movement: u32,
    /// Seed for the planner's random choices, 0 for entropy.
    pub seed: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            win_percentage: 90.0,
            min_win_percentage: 75.0,
            attack_gate: 45.0,
            defend_gate: 55.0,
            min_battle_runs: 16,
            max_battle_runs: 100,
            target_search_distance: 9,
            nearby_land_distance: 2,
            nearby_water_distance: 3,
            land_mass_distance: 6,
            sea_value_distance: 4,
            retreat_when_only_air_left: false,
            default_transport_movement: 2,
            seed: 0,
        }
    }
}

impl PlannerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ScenarioError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Number of oracle runs for a battle between the given army sizes.
    pub fn battle_runs(&self, attackers: usize, defenders: usize) -> u32 {
        let smaller = attackers.min(defenders) as i64;
        (self.max_battle_runs as i64 - smaller).max(self.min_battle_runs as i64) as u32
    }
}
