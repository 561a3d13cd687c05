//! Small test map shared by unit tests across the crate.
//!
//! Land: home (Red capital, 10), plains (Red, 3), border (Blue, 2),
//! enemy_cap (Blue capital, 8), wastes (neutral, 1), island (Blue, 2).
//! Sea: sz_home, sz_mid, sz_enemy.
//!
//! Land edges run home - plains - border - enemy_cap with wastes hanging off
//! plains. Sea zones chain sz_home - sz_mid - sz_enemy; sz_home touches home
//! and plains, sz_enemy touches border, enemy_cap and island.
//!
//! Red and Green are allied against Blue. Home and enemy_cap hold factories.
//! No other units are placed.

use super::state::{BoardState, GameRules};
use super::territory::{PlayerId, Territory, TerritoryId};
use super::unit::{ConstructionRule, Domain, SupportRule, UnitId, UnitType, UnitTypeId};

pub(crate) struct Types {
    pub infantry: UnitTypeId,
    pub artillery: UnitTypeId,
    pub tank: UnitTypeId,
    pub fighter: UnitTypeId,
    pub bomber: UnitTypeId,
    pub transport: UnitTypeId,
    pub destroyer: UnitTypeId,
    pub submarine: UnitTypeId,
    pub carrier: UnitTypeId,
    pub factory: UnitTypeId,
}

pub(crate) struct Map {
    pub home: TerritoryId,
    pub plains: TerritoryId,
    pub border: TerritoryId,
    pub enemy_cap: TerritoryId,
    pub wastes: TerritoryId,
    pub island: TerritoryId,
    pub sz_home: TerritoryId,
    pub sz_mid: TerritoryId,
    pub sz_enemy: TerritoryId,
}

pub(crate) struct Fixture {
    pub board: BoardState,
    pub red: PlayerId,
    pub green: PlayerId,
    pub blue: PlayerId,
    pub ty: Types,
    pub map: Map,
}

impl Fixture {
    pub fn add(&mut self, ty: UnitTypeId, owner: PlayerId, t: TerritoryId, n: u32) -> Vec<UnitId> {
        (0..n).map(|_| self.board.add_unit(ty, owner, t)).collect()
    }
}

fn land(name: &str, owner: Option<PlayerId>, production: i32) -> Territory {
    let mut t = Territory::new(name, false);
    t.owner = owner;
    t.production = production;
    t
}

pub(crate) fn fixture() -> Fixture {
    let mut board = BoardState::new(GameRules::default());
    let red = board.add_player("Red", 0, 40);
    let green = board.add_player("Green", 0, 10);
    let blue = board.add_player("Blue", 1, 30);

    let infantry = {
        let mut u = UnitType::new("infantry", Domain::Land, 3);
        u.attack = 1;
        u.defense = 2;
        u.movement = 1;
        u.transport_cost = 2;
        board.add_unit_type(u)
    };
    let artillery = {
        let mut u = UnitType::new("artillery", Domain::Land, 4);
        u.attack = 2;
        u.defense = 2;
        u.movement = 1;
        u.transport_cost = 3;
        u.support = Some(SupportRule {
            bonus: 1,
            count: 1,
            offence: true,
            defence: false,
            targets: vec![infantry],
        });
        board.add_unit_type(u)
    };
    let tank = {
        let mut u = UnitType::new("tank", Domain::Land, 6);
        u.attack = 3;
        u.defense = 3;
        u.movement = 2;
        u.transport_cost = 3;
        u.can_blitz = true;
        board.add_unit_type(u)
    };
    let fighter = {
        let mut u = UnitType::new("fighter", Domain::Air, 10);
        u.attack = 3;
        u.defense = 4;
        u.movement = 4;
        u.carrier_cost = 1;
        board.add_unit_type(u)
    };
    let bomber = {
        let mut u = UnitType::new("bomber", Domain::Air, 12);
        u.attack = 4;
        u.defense = 1;
        u.movement = 6;
        board.add_unit_type(u)
    };
    let transport = {
        let mut u = UnitType::new("transport", Domain::Sea, 7);
        u.movement = 2;
        u.transport_capacity = 5;
        board.add_unit_type(u)
    };
    let destroyer = {
        let mut u = UnitType::new("destroyer", Domain::Sea, 8);
        u.attack = 2;
        u.defense = 2;
        u.movement = 2;
        u.is_destroyer = true;
        board.add_unit_type(u)
    };
    let submarine = {
        let mut u = UnitType::new("submarine", Domain::Sea, 6);
        u.attack = 2;
        u.defense = 1;
        u.movement = 2;
        u.can_evade = true;
        board.add_unit_type(u)
    };
    let carrier = {
        let mut u = UnitType::new("carrier", Domain::Sea, 14);
        u.attack = 1;
        u.defense = 2;
        u.movement = 2;
        u.carrier_capacity = 2;
        board.add_unit_type(u)
    };
    let factory = {
        let mut u = UnitType::new("factory", Domain::Land, 15);
        u.is_infrastructure = true;
        u.can_produce = true;
        u.construction = Some(ConstructionRule {
            construction_type: "factory".into(),
            per_turn: 1,
            max_per_territory: 1,
        });
        board.add_unit_type(u)
    };

    let home = board.add_territory({
        let mut t = land("home", Some(red), 10);
        t.capital_of = Some(red);
        t
    });
    let plains = board.add_territory(land("plains", Some(red), 3));
    let border = board.add_territory(land("border", Some(blue), 2));
    let enemy_cap = board.add_territory({
        let mut t = land("enemy_cap", Some(blue), 8);
        t.capital_of = Some(blue);
        t
    });
    let wastes = board.add_territory(land("wastes", None, 1));
    let island = board.add_territory(land("island", Some(blue), 2));
    let sz_home = board.add_territory(Territory::new("sz_home", true));
    let sz_mid = board.add_territory(Territory::new("sz_mid", true));
    let sz_enemy = board.add_territory(Territory::new("sz_enemy", true));

    for (a, b) in [
        (home, plains),
        (plains, border),
        (border, enemy_cap),
        (plains, wastes),
        (home, sz_home),
        (plains, sz_home),
        (sz_home, sz_mid),
        (sz_mid, sz_enemy),
        (sz_enemy, enemy_cap),
        (sz_enemy, island),
        (sz_enemy, border),
    ] {
        board.connect(a, b);
    }

    board.add_unit(factory, red, home);
    board.add_unit(factory, blue, enemy_cap);

    Fixture {
        board,
        red,
        green,
        blue,
        ty: Types {
            infantry,
            artillery,
            tank,
            fighter,
            bomber,
            transport,
            destroyer,
            submarine,
            carrier,
            factory,
        },
        map: Map {
            home,
            plains,
            border,
            enemy_cap,
            wastes,
            island,
            sz_home,
            sz_mid,
            sz_enemy,
        },
    }
}
