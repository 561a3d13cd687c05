//! Purchase options and their efficiency ratings.

use crate::board::{BoardState, ConstructionRule, UnitTypeId};

/// One buyable production rule: `quantity` units of one type for `cost`.
///
/// Combat totals cover the whole quantity. Infrastructure counts as having
/// no hit points.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOption {
    pub unit_type: UnitTypeId,
    pub name: String,
    pub quantity: u32,
    pub cost: i32,
    pub movement: u32,
    pub hit_points: u32,
    pub attack: f64,
    pub defense: f64,
    pub transport_cost: u32,
    pub carrier_cost: u32,
    pub carrier_capacity: u32,
    pub is_land: bool,
    pub is_sea: bool,
    pub is_air: bool,
    pub is_sub: bool,
    pub is_destroyer: bool,
    pub is_transport: bool,
    pub is_land_transport: bool,
    pub is_carrier: bool,
    pub is_infrastructure: bool,
    pub is_attack_support: bool,
    pub is_defense_support: bool,
    pub construction: Option<ConstructionRule>,
    /// `-1` for no limit.
    pub max_built_per_player: i32,
    pub consumes: Vec<(UnitTypeId, u32)>,
    pub transport_efficiency: f64,
    pub cost_per_hit_point: f64,
    pub hit_point_efficiency: f64,
    pub attack_efficiency: f64,
    pub defense_efficiency: f64,
}

impl PurchaseOption {
    pub fn new(board: &BoardState, unit_type: UnitTypeId, quantity: u32) -> Self {
        let ty = board.type_info(unit_type);
        let cost = ty.cost * quantity as i32;
        let q = f64::from(quantity);
        let hit_points = if ty.is_infrastructure {
            0
        } else {
            ty.hit_points * quantity
        };
        let attack = f64::from(ty.attack) * q;
        let defense = f64::from(ty.defense) * q;
        let dice = 6.0 / f64::from(board.rules.dice_sides.max(1));
        let hp = f64::from(hit_points);
        // Free units are rated as if they cost one.
        let price = f64::from(cost.max(1));

        PurchaseOption {
            unit_type,
            name: ty.name.clone(),
            quantity,
            cost,
            movement: ty.movement,
            hit_points,
            attack,
            defense,
            transport_cost: ty.transport_cost * quantity,
            carrier_cost: ty.carrier_cost * quantity,
            carrier_capacity: ty.carrier_capacity * quantity,
            is_land: ty.is_land(),
            is_sea: ty.is_sea(),
            is_air: ty.is_air(),
            is_sub: ty.can_evade,
            is_destroyer: ty.is_destroyer,
            is_transport: ty.is_transport(),
            is_land_transport: ty.land_transport,
            is_carrier: ty.is_carrier(),
            is_infrastructure: ty.is_infrastructure,
            is_attack_support: ty.support.as_ref().is_some_and(|s| s.offence),
            is_defense_support: ty.support.as_ref().is_some_and(|s| s.defence),
            construction: ty.construction.clone(),
            max_built_per_player: ty.max_built_per_player,
            consumes: ty.consumes.clone(),
            transport_efficiency: f64::from(ty.transport_capacity) / price,
            cost_per_hit_point: if hit_points == 0 {
                f64::INFINITY
            } else {
                f64::from(cost) / hp
            },
            hit_point_efficiency: (hp + 0.2 * attack * dice + 0.2 * defense * dice) / price,
            attack_efficiency: (1.0 + hp) * (hp + attack * dice + 0.5 * defense * dice) / price,
            defense_efficiency: (1.0 + hp) * (hp + 0.5 * attack * dice + defense * dice) / price,
        }
    }

    #[inline]
    pub fn is_construction(&self) -> bool {
        self.construction.is_some()
    }

    #[inline]
    pub fn consumes_units(&self) -> bool {
        !self.consumes.is_empty()
    }
}

/// Builds the purchase catalog from `(unit type, quantity)` production rules.
pub fn purchase_catalog(board: &BoardState, rules: &[(UnitTypeId, u32)]) -> Vec<PurchaseOption> {
    rules
        .iter()
        .filter(|&&(_, quantity)| quantity > 0)
        .map(|&(unit_type, quantity)| PurchaseOption::new(board, unit_type, quantity))
        .collect()
}

/// A catalog with one single-unit option per unit type that has a cost.
pub fn default_catalog(board: &BoardState) -> Vec<PurchaseOption> {
    let rules: Vec<(UnitTypeId, u32)> = board
        .unit_types
        .iter()
        .enumerate()
        .filter(|(_, ty)| ty.cost > 0)
        .map(|(i, _)| (UnitTypeId(i as u16), 1))
        .collect();
    purchase_catalog(board, &rules)
}

/// Cheapest cost per hit point over `options`, infinite if none has hit points.
pub fn min_cost_per_hit_point(options: &[PurchaseOption]) -> f64 {
    options
        .iter()
        .map(|o| o.cost_per_hit_point)
        .fold(f64::INFINITY, f64::min)
}

/// Movement of the most transport-efficient sea transport option.
///
/// Ties keep the earlier option. Falls back to `default_movement` when no
/// option can carry anything.
pub fn find_max_movement_for_transports(options: &[PurchaseOption], default_movement: u32) -> u32 {
    let mut movement = default_movement;
    let mut best = 0.0;
    for o in options.iter().filter(|o| o.is_transport && o.is_sea) {
        if o.transport_efficiency > best {
            best = o.transport_efficiency;
            movement = o.movement;
        }
    }
    movement
}

/// Options split by movement domain, the way purchase decisions use them.
#[derive(Debug, Clone, Default)]
pub struct PurchaseOptions {
    pub land: Vec<PurchaseOption>,
    pub air: Vec<PurchaseOption>,
    pub sea: Vec<PurchaseOption>,
    pub factory: Vec<PurchaseOption>,
}

impl PurchaseOptions {
    pub fn new(catalog: &[PurchaseOption]) -> Self {
        let mut options = PurchaseOptions::default();
        for o in catalog {
            if o.is_construction() && o.is_infrastructure {
                options.factory.push(o.clone());
            } else if o.is_air {
                options.air.push(o.clone());
            } else if o.is_sea {
                options.sea.push(o.clone());
            } else if o.is_land && !o.is_infrastructure {
                options.land.push(o.clone());
            }
        }
        options
    }

    pub fn sea_transports(&self) -> impl Iterator<Item = &PurchaseOption> {
        self.sea.iter().filter(|o| o.is_transport)
    }

    pub fn all(&self) -> impl Iterator<Item = &PurchaseOption> {
        self.land
            .iter()
            .chain(&self.air)
            .chain(&self.sea)
            .chain(&self.factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::fixture;

    #[test]
    fn efficiencies_follow_combat_values() {
        let f = fixture();
        let inf = PurchaseOption::new(&f.board, f.ty.infantry, 1);
        // hp 1, attack 1, defense 2, cost 3.
        assert!((inf.defense_efficiency - 2.0 * 3.5 / 3.0).abs() < 1e-9);
        assert!((inf.attack_efficiency - 2.0 * 3.0 / 3.0).abs() < 1e-9);
        assert!((inf.hit_point_efficiency - 1.6 / 3.0).abs() < 1e-9);
        assert_eq!(inf.cost_per_hit_point, 3.0);

        let pair = PurchaseOption::new(&f.board, f.ty.infantry, 2);
        assert_eq!(pair.cost, 6);
        assert_eq!(pair.hit_points, 2);
        assert_eq!(pair.transport_cost, 4);
    }

    #[test]
    fn infrastructure_has_no_hit_points() {
        let f = fixture();
        let factory = PurchaseOption::new(&f.board, f.ty.factory, 1);
        assert_eq!(factory.hit_points, 0);
        assert!(factory.cost_per_hit_point.is_infinite());
        assert!(factory.is_construction());
    }

    #[test]
    fn cheapest_hit_point_and_transport_movement() {
        let f = fixture();
        let catalog = default_catalog(&f.board);
        assert_eq!(min_cost_per_hit_point(&catalog), 3.0);
        assert_eq!(find_max_movement_for_transports(&catalog, 9), 2);
        assert_eq!(find_max_movement_for_transports(&catalog[..3], 9), 9);
    }

    #[test]
    fn options_split_by_domain() {
        let f = fixture();
        let options = PurchaseOptions::new(&default_catalog(&f.board));
        assert_eq!(options.land.len(), 3);
        assert_eq!(options.air.len(), 2);
        assert_eq!(options.sea.len(), 4);
        assert_eq!(options.factory.len(), 1);
        assert_eq!(options.sea_transports().count(), 1);
        assert_eq!(options.all().count(), 10);
    }
}
