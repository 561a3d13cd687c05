//! Property tests for the capacity and budget invariants.

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::json;

use quartermaster::board::UnitId;
use quartermaster::config::PlannerConfig;
use quartermaster::engine::Planner;
use quartermaster::logistics::{
    air_that_cant_land_on_carrier, interleave_carriers_and_planes, select_units_to_transport,
};
use quartermaster::planning::PlanningPass;
use quartermaster::protocol::Scenario;
use quartermaster::purchase::{
    find_purchase_territories, purchase_land_units, randomize_purchase_option, PurchaseOptions,
    RulesValidator,
};

/// One transport in a sea zone next to a beach holding one unit per entry
/// of `cargo`, each of its own type with the given `(transport cost, attack)`.
fn transport_board(capacity: u32, cargo: &[(u32, i32)]) -> Scenario {
    let mut unit_types = vec![json!({
        "name": "transport", "domain": "sea", "movement": 2, "cost": 7, "transport_capacity": capacity
    })];
    let mut units = vec![json!({ "type": "transport", "owner": "red", "territory": "sea" })];
    for (i, &(cost, attack)) in cargo.iter().enumerate() {
        let name = format!("cargo{}", i);
        unit_types.push(json!({
            "name": name.clone(), "domain": "land", "attack": attack, "defense": 1, "movement": 1,
            "cost": 3, "transport_cost": cost
        }));
        units.push(json!({ "type": name, "owner": "red", "territory": "beach" }));
    }
    let scenario = json!({
        "players": [{ "name": "red" }],
        "unit_types": unit_types,
        "territories": [{ "name": "beach", "owner": "red" }, { "name": "sea", "water": true }],
        "connections": [["beach", "sea"]],
        "units": units
    });
    Scenario::from_json_str(&scenario.to_string()).unwrap()
}

fn carrier_board(carriers: u32, fighters: u32) -> Scenario {
    fleet_board(carriers, fighters, 0)
}

fn fleet_board(carriers: u32, fighters: u32, destroyers: u32) -> Scenario {
    let scenario = json!({
        "players": [{ "name": "red" }],
        "unit_types": [
            { "name": "carrier", "domain": "sea", "defense": 2, "movement": 2, "cost": 14, "carrier_capacity": 2 },
            { "name": "fighter", "domain": "air", "attack": 3, "defense": 4, "movement": 4, "cost": 10, "carrier_cost": 1 },
            { "name": "destroyer", "domain": "sea", "attack": 2, "defense": 2, "movement": 2, "cost": 8 }
        ],
        "territories": [{ "name": "sea", "water": true }],
        "units": [
            { "type": "carrier", "owner": "red", "territory": "sea", "count": carriers },
            { "type": "fighter", "owner": "red", "territory": "sea", "count": fighters },
            { "type": "destroyer", "owner": "red", "territory": "sea", "count": destroyers }
        ]
    });
    Scenario::from_json_str(&scenario.to_string()).unwrap()
}

/// A factory territory facing `guards` enemy infantry across the border,
/// with a capped elite unit in the catalog.
fn factory_board(resources: i32, production: i32, elite_cap: i32, guards: u32) -> Scenario {
    let scenario = json!({
        "players": [
            { "name": "red", "alliance": 0, "resources": resources },
            { "name": "blue", "alliance": 1 }
        ],
        "unit_types": [
            { "name": "infantry", "domain": "land", "attack": 1, "defense": 2, "movement": 1, "cost": 3 },
            { "name": "artillery", "domain": "land", "attack": 2, "defense": 2, "movement": 1, "cost": 4 },
            { "name": "armour", "domain": "land", "attack": 3, "defense": 3, "movement": 2, "cost": 6 },
            { "name": "elite", "domain": "land", "attack": 4, "defense": 4, "movement": 1, "cost": 5,
              "max_built_per_player": elite_cap },
            { "name": "factory", "domain": "land", "cost": 15, "infrastructure": true, "can_produce": true }
        ],
        "territories": [
            { "name": "home", "production": production, "owner": "red", "capital_of": "red" },
            { "name": "front", "production": 2, "owner": "blue" }
        ],
        "connections": [["home", "front"]],
        "units": [
            { "type": "factory", "owner": "red", "territory": "home" },
            { "type": "infantry", "owner": "blue", "territory": "front", "count": guards }
        ],
        "production": [
            { "unit_type": "infantry" },
            { "unit_type": "artillery" },
            { "unit_type": "armour" },
            { "unit_type": "elite" }
        ]
    });
    Scenario::from_json_str(&scenario.to_string()).unwrap()
}

proptest! {
    #[test]
    fn transport_load_fits_capacity(
        capacity in 1u32..8,
        cargo in prop::collection::vec((1u32..4, 0i32..5), 0..8),
    ) {
        let scenario = transport_board(capacity, &cargo);
        let board = &scenario.board;
        let sea = board.find_territory("sea").unwrap();
        let beach = board.find_territory("beach").unwrap();
        let transport = board.units_in(sea)[0];
        let candidates = board.units_in(beach).to_vec();

        let selected = select_units_to_transport(board, transport, &candidates);
        let used: u32 = selected.iter().map(|&u| board.unit_type(u).transport_cost).sum();
        prop_assert!(used <= capacity);
        for u in &selected {
            prop_assert!(candidates.contains(u));
        }
        let mut unique = selected.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), selected.len());
    }

    #[test]
    fn planes_beyond_carrier_room_are_left_over(carriers in 0u32..4, fighters in 0u32..10) {
        let scenario = carrier_board(carriers, fighters);
        let board = &scenario.board;
        let red = board.find_player("red").unwrap();
        let sea = board.find_territory("sea").unwrap();
        let units: Vec<UnitId> = board.units_in(sea).to_vec();

        let cant_land = air_that_cant_land_on_carrier(board, red, &units);
        prop_assert_eq!(cant_land.len() as u32, fighters.saturating_sub(2 * carriers));
        for u in &cant_land {
            prop_assert!(board.unit_type(*u).is_air());
        }
    }

    #[test]
    fn carriers_follow_the_planes_they_carry(
        carriers in 1u32..5,
        fighters in 0u32..12,
        destroyers in 0u32..4,
        seed in any::<u64>(),
    ) {
        let scenario = fleet_board(carriers, fighters, destroyers);
        let board = &scenario.board;
        let sea = board.find_territory("sea").unwrap();
        let mut units: Vec<UnitId> = board.units_in(sea).to_vec();
        units.shuffle(&mut SmallRng::seed_from_u64(seed));

        let ordered = interleave_carriers_and_planes(board, &units, 0);
        let mut sorted_in = units.clone();
        sorted_in.sort();
        let mut sorted_out = ordered.clone();
        sorted_out.sort();
        prop_assert_eq!(sorted_in, sorted_out);

        // Planes in front of each carrier, back to the previous one, fit on
        // it. Only the first carrier takes the planes that fit nowhere.
        let fits = fighters <= 2 * carriers;
        let mut group = 0;
        let mut first = true;
        for &u in &ordered {
            let ty = board.unit_type(u);
            if ty.carrier_capacity > 0 {
                if fits || !first {
                    prop_assert!(group <= ty.carrier_capacity, "{} planes ahead of a carrier", group);
                }
                first = false;
                group = 0;
            } else {
                group += ty.carrier_cost;
            }
        }
    }

    #[test]
    fn land_purchases_respect_every_limit(
        resources in 0i32..60,
        production in 1i32..10,
        elite_cap in 0i32..3,
        seed in any::<u64>(),
    ) {
        let mut scenario = factory_board(resources, production, elite_cap, 1);
        let catalog = scenario.catalog();
        let board = &mut scenario.board;
        let red = board.find_player("red").unwrap();
        let options = PurchaseOptions::new(&catalog);
        let home = find_purchase_territories(board, red)[0];
        let mut pass = PlanningPass::new(red);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut left = resources;

        let bought = purchase_land_units(
            board, &mut pass, &RulesValidator, &home, &options, &mut left, &mut rng,
        ).unwrap();

        prop_assert!(left >= 0);
        prop_assert_eq!(board.units_value(&bought), resources - left);
        prop_assert!(bought.len() as i32 <= production);
        let elite = board.find_unit_type("elite").unwrap();
        let elites = bought.iter().filter(|&&u| board.unit(u).unit_type == elite).count();
        prop_assert!(elites as i32 <= elite_cap);
        // Stops only once the cheapest unit no longer fits.
        prop_assert!(left < 3 || bought.len() as i32 == production);
    }

    #[test]
    fn weighted_pick_never_returns_zero_weight(
        weights in prop::collection::vec(prop_oneof![Just(0.0f64), 0.1f64..5.0], 1..6),
        seed in any::<u64>(),
    ) {
        let entries: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
        let mut rng = SmallRng::seed_from_u64(seed);
        match randomize_purchase_option(&entries, &mut rng) {
            Some(&i) => prop_assert!(weights[i] > 0.0),
            None => prop_assert!(weights.iter().all(|&w| w == 0.0)),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn threatened_factory_purchases_respect_every_limit(
        resources in 0i32..40,
        production in 1i32..6,
        elite_cap in 0i32..3,
        guards in 1u32..6,
        seed in 1u64..1000,
    ) {
        let mut scenario = factory_board(resources, production, elite_cap, guards);
        let catalog = scenario.catalog();
        let red = scenario.board.find_player("red").unwrap();
        let config = PlannerConfig { seed, ..PlannerConfig::default() };
        let mut planner = Planner::new(config);

        let plan = planner
            .plan_turn(&mut scenario.board, red, &catalog, &mut RulesValidator)
            .unwrap();

        let board = &scenario.board;
        prop_assert!(plan.resources_left >= 0);
        prop_assert!(plan.units_purchased() as i32 <= production);
        let spent: i32 = plan
            .purchases
            .iter()
            .map(|p| {
                let ty = board.find_unit_type(&p.unit_type).unwrap();
                board.type_info(ty).cost * p.quantity as i32
            })
            .sum();
        prop_assert_eq!(spent, resources - plan.resources_left);
        let elites: u32 = plan
            .purchases
            .iter()
            .filter(|p| p.unit_type == "elite")
            .map(|p| p.quantity)
            .sum();
        prop_assert!(elites as i32 <= elite_cap);
    }
}

#[test]
fn capped_elite_is_never_bought_to_defend() {
    let mut scenario = factory_board(30, 6, 0, 4);
    let catalog = scenario.catalog();
    let red = scenario.board.find_player("red").unwrap();
    let config = PlannerConfig { seed: 5, ..PlannerConfig::default() };

    let plan = Planner::new(config)
        .plan_turn(&mut scenario.board, red, &catalog, &mut RulesValidator)
        .unwrap();

    assert!(plan.units_purchased() > 0);
    assert!(plan.purchases.iter().all(|p| p.unit_type != "elite"));
    assert!(plan.resources_left >= 0);
}
