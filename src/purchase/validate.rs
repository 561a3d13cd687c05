//! Placement and move legality, and pruning of the purchase catalog.

use std::collections::BTreeSet;

use tracing::trace;

use super::option::PurchaseOption;
use crate::board::{BoardState, PlayerId, TerritoryId, UnitId, UnitTypeId};
use crate::error::PlanError;
use crate::logistics::MoveCommand;
use crate::planning::PlanningPass;

/// The game engine's legality checks the planner relies on.
///
/// Both methods return `None` when the action is allowed and a reason
/// otherwise.
pub trait PlacementValidator {
    fn can_place(
        &self,
        board: &BoardState,
        t: TerritoryId,
        units: &[UnitId],
        player: PlayerId,
    ) -> Option<String>;

    fn perform_move(&mut self, board: &BoardState, mv: &MoveCommand) -> Option<String>;
}

/// Validator enforcing basic ownership, factory and adjacency rules.
///
/// Land and air units need an owned factory in an owned land territory,
/// constructions only need owned land. Sea units and air units bought with
/// carriers go to sea zones next to an owned factory. Moves must follow
/// adjacent, passable territories.
#[derive(Debug, Default, Clone, Copy)]
pub struct RulesValidator;

fn has_owned_factory(board: &BoardState, t: TerritoryId, player: PlayerId) -> bool {
    board.territory(t).owner == Some(player)
        && board
            .units_in(t)
            .iter()
            .any(|&u| board.unit(u).owner == player && board.unit_type(u).can_produce)
}

impl PlacementValidator for RulesValidator {
    fn can_place(
        &self,
        board: &BoardState,
        t: TerritoryId,
        units: &[UnitId],
        player: PlayerId,
    ) -> Option<String> {
        let territory = board.territory(t);
        if territory.impassable {
            return Some(format!("{} is impassable", territory.name));
        }
        if territory.is_water {
            if units.iter().any(|&u| board.unit_type(u).is_land()) {
                return Some("land units cannot be placed at sea".into());
            }
            let carriers = units.iter().any(|&u| board.unit_type(u).is_carrier());
            if !carriers && units.iter().any(|&u| board.unit_type(u).is_air()) {
                return Some("air units need a carrier to be placed at sea".into());
            }
            if !board
                .neighbors(t)
                .iter()
                .any(|&n| has_owned_factory(board, n, player))
            {
                return Some(format!("{} is not next to an owned factory", territory.name));
            }
            return None;
        }

        if territory.owner != Some(player) {
            return Some(format!("{} is not owned", territory.name));
        }
        if units.iter().any(|&u| board.unit_type(u).is_sea()) {
            return Some("sea units cannot be placed on land".into());
        }
        let all_constructions = units
            .iter()
            .all(|&u| board.unit_type(u).construction.is_some());
        if !all_constructions && !has_owned_factory(board, t, player) {
            return Some(format!("{} has no factory", territory.name));
        }
        None
    }

    fn perform_move(&mut self, board: &BoardState, mv: &MoveCommand) -> Option<String> {
        if mv.units.is_empty() {
            return Some("no units to move".into());
        }
        if mv.route.is_empty() {
            return Some("route has no steps".into());
        }
        let mut from = mv.route.start;
        for &to in &mv.route.steps {
            if !board.is_adjacent(from, to) {
                return Some(format!(
                    "{} is not adjacent to {}",
                    board.territory(from).name,
                    board.territory(to).name
                ));
            }
            if board.territory(to).impassable {
                return Some(format!("{} is impassable", board.territory(to).name));
            }
            from = to;
        }
        None
    }
}

/// Options whose units the validator allows in `t`.
pub fn find_purchase_options_for_territory(
    board: &mut BoardState,
    validator: &dyn PlacementValidator,
    player: PlayerId,
    options: &[PurchaseOption],
    t: TerritoryId,
) -> Vec<PurchaseOption> {
    options
        .iter()
        .filter(|o| {
            board.with_temp_units(o.unit_type, o.quantity, player, t, |board, units| {
                validator.can_place(board, t, units, player).is_none()
            })
        })
        .cloned()
        .collect()
}

/// What is left to spend while options are filtered.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseLimits<'a> {
    pub resources: i32,
    pub remaining_production: u32,
    pub remaining_constructions: u32,
    /// Units already bought this turn but not yet queued in the pass.
    pub units_to_place: &'a [UnitId],
    /// Territory the options are for. Construction caps apply only with one.
    pub territory: Option<TerritoryId>,
}

fn count_of_type(board: &BoardState, units: &[UnitId], ty: UnitTypeId) -> usize {
    units.iter().filter(|&&u| board.unit(u).unit_type == ty).count()
}

fn count_owned_of_type(board: &BoardState, units: &[UnitId], ty: UnitTypeId, player: PlayerId) -> usize {
    units
        .iter()
        .filter(|&&u| board.unit(u).unit_type == ty && board.unit(u).owner == player)
        .count()
}

fn has_enough_resources_and_production(option: &PurchaseOption, limits: &PurchaseLimits<'_>) -> bool {
    let slots = if option.is_construction() {
        limits.remaining_constructions
    } else {
        limits.remaining_production
    };
    option.cost <= limits.resources && option.quantity <= slots
}

fn has_reached_max_built(
    board: &BoardState,
    pass: &PlanningPass,
    player: PlayerId,
    option: &PurchaseOption,
    limits: &PurchaseLimits<'_>,
) -> bool {
    let max = option.max_built_per_player;
    if max < 0 {
        return false;
    }
    if max == 0 {
        return true;
    }
    let ty = option.unit_type;
    let on_board: usize = board
        .territory_ids()
        .map(|t| count_owned_of_type(board, board.units_in(t), ty, player))
        .sum();
    let queued: usize = pass
        .territories()
        .map(|pt| count_owned_of_type(board, pt.place_units(), ty, player))
        .sum();
    let built = on_board + queued + count_owned_of_type(board, limits.units_to_place, ty, player);
    (max as i64) - (built as i64) - i64::from(option.quantity) < 0
}

fn has_reached_construction_limits(
    board: &BoardState,
    pass: &PlanningPass,
    option: &PurchaseOption,
    limits: &PurchaseLimits<'_>,
) -> bool {
    let (Some(rule), Some(t)) = (option.construction.as_ref(), limits.territory) else {
        return false;
    };
    let ty = option.unit_type;
    let to_place =
        count_of_type(board, limits.units_to_place, ty) + count_of_type(board, pass.place_units(t), ty);
    if to_place >= rule.per_turn as usize {
        return true;
    }

    let mut max = rule.max_per_territory as usize;
    let kind = rule.construction_type.as_str();
    if kind != "factory" && !kind.ends_with("structure") {
        if board.rules.unlimited_constructions {
            max = usize::MAX;
        } else if board.rules.more_constructions_with_factory {
            max = max.max(board.territory(t).production.max(0) as usize);
        }
    }
    to_place + count_of_type(board, board.units_in(t), ty) >= max
}

/// Units of `ty` owned by `player` that are free to be consumed.
fn consumable_units(
    board: &BoardState,
    player: PlayerId,
    ty: UnitTypeId,
    t: Option<TerritoryId>,
    taken: &BTreeSet<UnitId>,
) -> Vec<UnitId> {
    let owned = |u: &UnitId| {
        let unit = board.unit(*u);
        unit.owner == player && unit.unit_type == ty && !taken.contains(u)
    };
    match t {
        Some(t) => board.units_in(t).iter().copied().filter(owned).collect(),
        None => board
            .territory_ids()
            .flat_map(|t| board.units_in(t).iter().copied())
            .filter(owned)
            .collect(),
    }
}

fn lacks_consumables(
    board: &BoardState,
    pass: &PlanningPass,
    player: PlayerId,
    option: &PurchaseOption,
    limits: &PurchaseLimits<'_>,
) -> bool {
    option.consumes.iter().any(|&(ty, per_unit)| {
        let needed = per_unit as usize * option.quantity as usize;
        consumable_units(board, player, ty, limits.territory, pass.queued_consumption()).len() < needed
    })
}

/// Drops options that cannot be bought with what is left.
///
/// An option goes when it costs more than the resources or slots left, when
/// buying it would pass the per-player build cap counting units on the
/// board and every queued placement, when it would pass a construction cap
/// in `limits.territory`, or when the units it consumes are not available
/// after the consumption already queued in `pass`.
pub fn remove_invalid_purchase_options(
    board: &BoardState,
    pass: &PlanningPass,
    player: PlayerId,
    options: &mut Vec<PurchaseOption>,
    limits: &PurchaseLimits<'_>,
) {
    options.retain(|o| {
        let keep = has_enough_resources_and_production(o, limits)
            && !has_reached_max_built(board, pass, player, o, limits)
            && !has_reached_construction_limits(board, pass, o, limits)
            && !lacks_consumables(board, pass, player, o, limits);
        if !keep {
            trace!(option = %o.name, "purchase option removed");
        }
        keep
    });
}

/// Picks the existing units consumed by placing `units` in `t`.
///
/// Undamaged units are used first. Units in `pass`'s queued consumption are
/// never picked twice. Fails if the territory does not hold enough.
pub fn units_to_consume(
    board: &BoardState,
    pass: &PlanningPass,
    player: PlayerId,
    t: TerritoryId,
    units: &[UnitId],
) -> Result<Vec<UnitId>, PlanError> {
    let mut taken: BTreeSet<UnitId> = pass.queued_consumption().clone();
    let mut result = Vec::new();
    for &u in units {
        let placed = board.unit_type(u);
        for &(ty, count) in &placed.consumes {
            let mut candidates = consumable_units(board, player, ty, Some(t), &taken);
            if candidates.len() < count as usize {
                return Err(PlanError::MissingConsumables {
                    unit_type: placed.name.clone(),
                    consumed: board.type_info(ty).name.clone(),
                    required: count,
                    available: candidates.len() as u32,
                });
            }
            candidates.sort_by_key(|&c| board.unit(c).hits);
            for c in candidates.into_iter().take(count as usize) {
                taken.insert(c);
                result.push(c);
            }
        }
    }
    Ok(result)
}
