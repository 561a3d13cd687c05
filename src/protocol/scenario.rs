//! Scenario snapshots.
//!
//! A scenario is a JSON document describing one moment of a game: rules,
//! players, the unit-type catalog, the map, the units on it and optionally
//! the production rules players can buy from. Everything refers to other
//! entries by name; loading resolves names to ids and builds a
//! [`BoardState`].
//!
//! ```json
//! {
//!   "players": [{ "name": "red", "alliance": 0, "resources": 30 }],
//!   "unit_types": [{ "name": "infantry", "domain": "land", "attack": 1, "defense": 2, "movement": 1, "cost": 3 }],
//!   "territories": [{ "name": "home", "production": 5, "owner": "red", "capital_of": "red" }],
//!   "connections": [],
//!   "units": [{ "type": "infantry", "owner": "red", "territory": "home", "count": 2 }]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::board::{
    BoardState, Canal, ConstructionRule, Domain, GameRules, PlayerId, SupportRule, TerrainEffect,
    Territory, TerritoryId, UnitType, UnitTypeId,
};
use crate::error::ScenarioError;
use crate::purchase::{default_catalog, purchase_catalog, PurchaseOption};

// --- wire format ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    #[serde(default = "first_round")]
    round: u32,
    #[serde(default)]
    rules: GameRules,
    players: Vec<PlayerSpec>,
    unit_types: Vec<UnitTypeSpec>,
    territories: Vec<TerritorySpec>,
    #[serde(default)]
    connections: Vec<[String; 2]>,
    #[serde(default)]
    canals: Vec<CanalSpec>,
    #[serde(default)]
    units: Vec<UnitSpec>,
    #[serde(default)]
    production: Vec<ProductionSpec>,
}

fn first_round() -> u32 {
    1
}

fn one() -> u32 {
    1
}

fn minus_one() -> i32 {
    -1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerSpec {
    name: String,
    #[serde(default)]
    alliance: u16,
    #[serde(default)]
    resources: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitTypeSpec {
    name: String,
    domain: Domain,
    #[serde(default)]
    cost: i32,
    #[serde(default)]
    attack: i32,
    #[serde(default)]
    defense: i32,
    #[serde(default = "one_roll")]
    attack_rolls: i32,
    #[serde(default = "one_roll")]
    defense_rolls: i32,
    #[serde(default)]
    movement: u32,
    #[serde(default = "one")]
    hit_points: u32,
    #[serde(default)]
    infrastructure: bool,
    #[serde(default)]
    can_produce: bool,
    #[serde(default)]
    aa: bool,
    #[serde(default)]
    can_evade: bool,
    #[serde(default)]
    destroyer: bool,
    #[serde(default)]
    can_blitz: bool,
    #[serde(default)]
    can_bombard: bool,
    #[serde(default)]
    transport_capacity: u32,
    #[serde(default)]
    land_transport: bool,
    #[serde(default)]
    transport_cost: u32,
    #[serde(default)]
    combat_transport: bool,
    #[serde(default)]
    carrier_capacity: u32,
    #[serde(default)]
    carrier_cost: u32,
    #[serde(default)]
    support: Option<SupportSpec>,
    #[serde(default = "minus_one")]
    max_built_per_player: i32,
    #[serde(default)]
    construction: Option<ConstructionSpec>,
    #[serde(default)]
    consumes: BTreeMap<String, u32>,
}

fn one_roll() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SupportSpec {
    bonus: i32,
    #[serde(default = "one")]
    count: u32,
    #[serde(default)]
    offence: bool,
    #[serde(default)]
    defence: bool,
    #[serde(default)]
    targets: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstructionSpec {
    construction_type: String,
    #[serde(default = "one")]
    per_turn: u32,
    #[serde(default = "one")]
    max_per_territory: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TerritorySpec {
    name: String,
    #[serde(default)]
    water: bool,
    #[serde(default)]
    impassable: bool,
    #[serde(default)]
    production: i32,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    capital_of: Option<String>,
    #[serde(default)]
    terrain: TerrainEffect,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CanalSpec {
    name: String,
    sea_zones: [String; 2],
    #[serde(default)]
    controlled_by: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitSpec {
    #[serde(rename = "type")]
    unit_type: String,
    owner: String,
    territory: String,
    #[serde(default = "one")]
    count: u32,
    #[serde(default)]
    hits: u32,
    #[serde(default)]
    movement_left: Option<u32>,
    /// Units aboard each of these transports.
    #[serde(default)]
    cargo: Vec<CargoSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CargoSpec {
    #[serde(rename = "type")]
    unit_type: String,
    /// Defaults to the transport's owner.
    #[serde(default)]
    owner: Option<String>,
    #[serde(default = "one")]
    count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProductionSpec {
    unit_type: String,
    #[serde(default = "one")]
    quantity: u32,
}

// --- loading ---

/// A loaded scenario: the board plus the production rules on offer.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub board: BoardState,
    /// `(unit type, quantity)` rules. Empty means every type with a cost
    /// is buyable singly.
    pub production: Vec<(UnitTypeId, u32)>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        let file: ScenarioFile = serde_json::from_str(json)?;
        build(file)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ScenarioError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// The purchase catalog for this scenario.
    pub fn catalog(&self) -> Vec<PurchaseOption> {
        if self.production.is_empty() {
            default_catalog(&self.board)
        } else {
            purchase_catalog(&self.board, &self.production)
        }
    }
}

fn check_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<(), ScenarioError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            debug!(kind, name, "duplicate scenario entry");
            return Err(ScenarioError::Duplicate(name.to_string()));
        }
    }
    Ok(())
}

fn player_id(board: &BoardState, name: &str) -> Result<PlayerId, ScenarioError> {
    board
        .find_player(name)
        .ok_or_else(|| ScenarioError::UnknownPlayer(name.to_string()))
}

fn territory_id(board: &BoardState, name: &str) -> Result<TerritoryId, ScenarioError> {
    board
        .find_territory(name)
        .ok_or_else(|| ScenarioError::UnknownTerritory(name.to_string()))
}

fn unit_type_id(board: &BoardState, name: &str) -> Result<UnitTypeId, ScenarioError> {
    board
        .find_unit_type(name)
        .ok_or_else(|| ScenarioError::UnknownUnitType(name.to_string()))
}

fn build(file: ScenarioFile) -> Result<Scenario, ScenarioError> {
    if file.rules.dice_sides == 0 {
        return Err(ScenarioError::Invalid("dice_sides must be positive".into()));
    }
    check_unique("player", file.players.iter().map(|p| p.name.as_str()))?;
    check_unique("unit type", file.unit_types.iter().map(|u| u.name.as_str()))?;
    check_unique("territory", file.territories.iter().map(|t| t.name.as_str()))?;

    let mut board = BoardState::new(file.rules);
    board.round = file.round;
    for p in &file.players {
        board.add_player(p.name.clone(), p.alliance, p.resources);
    }

    // Types first so support targets and consumables can refer to any type.
    for spec in &file.unit_types {
        board.add_unit_type(UnitType::new(spec.name.clone(), spec.domain, spec.cost));
    }
    for (i, spec) in file.unit_types.iter().enumerate() {
        let support = spec
            .support
            .as_ref()
            .map(|s| -> Result<SupportRule, ScenarioError> {
                Ok(SupportRule {
                    bonus: s.bonus,
                    count: s.count,
                    offence: s.offence,
                    defence: s.defence,
                    targets: s
                        .targets
                        .iter()
                        .map(|t| unit_type_id(&board, t))
                        .collect::<Result<_, _>>()?,
                })
            })
            .transpose()?;
        let consumes = spec
            .consumes
            .iter()
            .map(|(name, n)| -> Result<_, ScenarioError> { Ok((unit_type_id(&board, name)?, *n)) })
            .collect::<Result<Vec<_>, ScenarioError>>()?;

        let ty = &mut board.unit_types[i];
        ty.attack = spec.attack;
        ty.defense = spec.defense;
        ty.attack_rolls = spec.attack_rolls;
        ty.defense_rolls = spec.defense_rolls;
        ty.movement = spec.movement;
        ty.hit_points = spec.hit_points;
        ty.is_infrastructure = spec.infrastructure;
        ty.can_produce = spec.can_produce;
        ty.is_aa = spec.aa;
        ty.can_evade = spec.can_evade;
        ty.is_destroyer = spec.destroyer;
        ty.can_blitz = spec.can_blitz;
        ty.can_bombard = spec.can_bombard;
        ty.transport_capacity = spec.transport_capacity;
        ty.land_transport = spec.land_transport;
        ty.transport_cost = spec.transport_cost;
        ty.combat_transport = spec.combat_transport;
        ty.carrier_capacity = spec.carrier_capacity;
        ty.carrier_cost = spec.carrier_cost;
        ty.support = support;
        ty.max_built_per_player = spec.max_built_per_player;
        ty.construction = spec.construction.as_ref().map(|c| ConstructionRule {
            construction_type: c.construction_type.clone(),
            per_turn: c.per_turn,
            max_per_territory: c.max_per_territory,
        });
        ty.consumes = consumes;
    }

    for spec in &file.territories {
        let mut territory = Territory::new(spec.name.clone(), spec.water);
        territory.impassable = spec.impassable;
        territory.production = spec.production;
        territory.terrain = spec.terrain;
        territory.owner = spec.owner.as_deref().map(|o| player_id(&board, o)).transpose()?;
        territory.capital_of = spec
            .capital_of
            .as_deref()
            .map(|o| player_id(&board, o))
            .transpose()?;
        board.add_territory(territory);
    }
    for [a, b] in &file.connections {
        let (a, b) = (territory_id(&board, a)?, territory_id(&board, b)?);
        board.connect(a, b);
    }
    for canal in &file.canals {
        let sea_zones = [
            territory_id(&board, &canal.sea_zones[0])?,
            territory_id(&board, &canal.sea_zones[1])?,
        ];
        let controlled_by = canal
            .controlled_by
            .iter()
            .map(|t| territory_id(&board, t))
            .collect::<Result<_, _>>()?;
        board.canals.push(Canal {
            name: canal.name.clone(),
            sea_zones,
            controlled_by,
        });
    }

    for spec in &file.units {
        let unit_type = unit_type_id(&board, &spec.unit_type)?;
        let owner = player_id(&board, &spec.owner)?;
        let territory = territory_id(&board, &spec.territory)?;
        for _ in 0..spec.count {
            let id = board.add_unit(unit_type, owner, territory);
            let unit = board.unit_mut(id);
            unit.hits = spec.hits;
            if let Some(left) = spec.movement_left {
                unit.movement_left = left;
            }
            for cargo in &spec.cargo {
                let cargo_type = unit_type_id(&board, &cargo.unit_type)?;
                let cargo_owner = match &cargo.owner {
                    Some(name) => player_id(&board, name)?,
                    None => owner,
                };
                for _ in 0..cargo.count {
                    let c = board.add_unit(cargo_type, cargo_owner, territory);
                    board.load(c, id);
                }
            }
        }
    }

    let production = file
        .production
        .iter()
        .map(|p| -> Result<_, ScenarioError> { Ok((unit_type_id(&board, &p.unit_type)?, p.quantity)) })
        .collect::<Result<Vec<_>, ScenarioError>>()?;

    debug!(
        territories = board.territories.len(),
        units = board.unit_count(),
        "scenario loaded"
    );
    Ok(Scenario { board, production })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "players": [
            { "name": "red", "alliance": 0, "resources": 12 },
            { "name": "blue", "alliance": 1 }
        ],
        "unit_types": [
            { "name": "infantry", "domain": "land", "attack": 1, "defense": 2, "movement": 1, "cost": 3, "transport_cost": 2 },
            { "name": "artillery", "domain": "land", "attack": 2, "defense": 2, "movement": 1, "cost": 4,
              "support": { "bonus": 1, "offence": true, "targets": ["infantry"] } },
            { "name": "transport", "domain": "sea", "movement": 2, "cost": 7, "transport_capacity": 5 }
        ],
        "territories": [
            { "name": "home", "production": 4, "owner": "red", "capital_of": "red" },
            { "name": "coast", "water": true },
            { "name": "far", "production": 2, "owner": "blue" }
        ],
        "connections": [["home", "coast"], ["coast", "far"]],
        "units": [
            { "type": "infantry", "owner": "red", "territory": "home", "count": 2 },
            { "type": "transport", "owner": "red", "territory": "coast",
              "cargo": [{ "type": "artillery" }] }
        ],
        "production": [{ "unit_type": "infantry", "quantity": 2 }]
    }"#;

    #[test]
    fn loads_board_from_names() {
        let scenario = Scenario::from_json_str(SMALL).unwrap();
        let board = &scenario.board;
        let red = board.find_player("red").unwrap();
        let home = board.find_territory("home").unwrap();
        let coast = board.find_territory("coast").unwrap();
        let far = board.find_territory("far").unwrap();

        assert_eq!(board.resources(red), 12);
        assert_eq!(board.capital_of(red), Some(home));
        assert_eq!(board.units_in(home).len(), 2);
        assert!(board.is_adjacent(home, coast));
        assert_eq!(board.distance(home, far), Some(2));

        let transport = board.units_in(coast)[0];
        assert_eq!(board.cargo_of(transport).len(), 1);
        let artillery = board.type_info(board.find_unit_type("artillery").unwrap());
        assert_eq!(
            artillery.support.as_ref().unwrap().targets,
            vec![board.find_unit_type("infantry").unwrap()]
        );
    }

    #[test]
    fn production_rules_build_the_catalog() {
        let scenario = Scenario::from_json_str(SMALL).unwrap();
        let catalog = scenario.catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].quantity, 2);
        assert_eq!(catalog[0].cost, 6);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let json = SMALL.replace(r#""territory": "home", "count": 2"#, r#""territory": "nowhere""#);
        assert!(matches!(
            Scenario::from_json_str(&json),
            Err(ScenarioError::UnknownTerritory(name)) if name == "nowhere"
        ));

        let json = SMALL.replace(r#""owner": "blue""#, r#""owner": "green""#);
        assert!(matches!(Scenario::from_json_str(&json), Err(ScenarioError::UnknownPlayer(_))));
    }

    #[test]
    fn duplicates_and_bad_rules_are_rejected() {
        let json = SMALL.replace(r#""name": "far""#, r#""name": "home""#);
        assert!(matches!(Scenario::from_json_str(&json), Err(ScenarioError::Duplicate(_))));

        let json = SMALL.replacen('{', r#"{ "rules": { "dice_sides": 0 },"#, 1);
        assert!(matches!(Scenario::from_json_str(&json), Err(ScenarioError::Invalid(_))));

        assert!(matches!(Scenario::from_json_str("{"), Err(ScenarioError::Json(_))));
    }
}
