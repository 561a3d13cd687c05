//! Turn plan output.
//!
//! Everything a turn pass decided, in a shape that serializes to JSON for
//! whoever executes it. Unit ids refer to the scenario's unit arena;
//! territories and unit types are named.

use serde::Serialize;

use crate::board::{BoardState, TerritoryId, UnitId};
use crate::combat::{BattleResult, PlaceUnits};
use crate::logistics::{MoveCommand, Unroutable};

/// Units of one type to buy and where they are placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseCommand {
    pub unit_type: String,
    pub quantity: u32,
    pub territory: String,
}

/// The estimated outcome of one planned attack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleSummary {
    pub territory: String,
    pub win_percentage: f64,
    pub value_swing: f64,
    pub attackers: usize,
    /// Attackers landing from transports.
    pub amphibious: usize,
    pub bombarding: usize,
}

impl BattleSummary {
    pub fn new(
        board: &BoardState,
        t: TerritoryId,
        result: &BattleResult,
        attackers: usize,
        amphibious: usize,
        bombarding: usize,
    ) -> Self {
        BattleSummary {
            territory: board.territory(t).name.clone(),
            win_percentage: result.win_percentage,
            value_swing: result.value_swing,
            attackers,
            amphibious,
            bombarding,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnPlan {
    pub player: String,
    pub round: u32,
    /// The pass was stopped early; the plan holds what was decided so far.
    pub cancelled: bool,
    pub battles: Vec<BattleSummary>,
    pub moves: Vec<MoveCommand>,
    pub unroutable: Vec<Unroutable>,
    /// Moves the validator accepted.
    pub moves_performed: usize,
    pub purchases: Vec<PurchaseCommand>,
    /// Units used up by the purchased units.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumed: Vec<UnitId>,
    pub resources_left: i32,
}

impl TurnPlan {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn units_purchased(&self) -> u32 {
        self.purchases.iter().map(|p| p.quantity).sum()
    }
}

/// Groups queued placements into purchase commands.
///
/// One command per territory and unit type, in territory order and then in
/// order of first appearance.
pub fn purchase_commands(board: &BoardState, placements: &PlaceUnits) -> Vec<PurchaseCommand> {
    let mut commands = Vec::new();
    for (&t, units) in placements {
        let mut counts: Vec<(String, u32)> = Vec::new();
        for &u in units {
            let name = &board.unit_type(u).name;
            match counts.iter_mut().find(|(n, _)| n == name) {
                Some((_, quantity)) => *quantity += 1,
                None => counts.push((name.clone(), 1)),
            }
        }
        commands.extend(counts.into_iter().map(|(unit_type, quantity)| PurchaseCommand {
            unit_type,
            quantity,
            territory: board.territory(t).name.clone(),
        }));
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::fixture;

    #[test]
    fn placements_group_by_type() {
        let mut f = fixture();
        let mut units = f.board.spawn_units(f.ty.tank, 1, f.red, f.map.home);
        units.extend(f.board.spawn_units(f.ty.infantry, 2, f.red, f.map.home));
        units.extend(f.board.spawn_units(f.ty.tank, 1, f.red, f.map.home));
        let placements = PlaceUnits::from([(f.map.home, units)]);

        let commands = purchase_commands(&f.board, &placements);
        assert_eq!(
            commands,
            vec![
                PurchaseCommand { unit_type: "tank".into(), quantity: 2, territory: "home".into() },
                PurchaseCommand { unit_type: "infantry".into(), quantity: 2, territory: "home".into() },
            ]
        );
    }

    #[test]
    fn plan_serializes_names_and_ids() {
        let plan = TurnPlan {
            player: "red".into(),
            round: 3,
            purchases: vec![PurchaseCommand {
                unit_type: "infantry".into(),
                quantity: 4,
                territory: "home".into(),
            }],
            ..TurnPlan::default()
        };
        assert_eq!(plan.units_purchased(), 4);
        let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert_eq!(json["player"], "red");
        assert_eq!(json["purchases"][0]["quantity"], 4);
        assert!(json.get("consumed").is_none());
    }
}
