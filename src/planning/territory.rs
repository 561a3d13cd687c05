//! One territory's entry in the planning scratchpad.

use std::collections::BTreeMap;

use crate::board::{BoardState, PlayerId, TerritoryId, UnitId};
use crate::combat::{BattleResult, OddsCalculator};

/// Everything a planning pass has decided or assumed about one territory.
///
/// The memoized battle result is dropped whenever one of the unit
/// collections that produced it changes, so a cached result always reflects
/// the current candidates.
#[derive(Debug, Clone)]
pub struct PlanningTerritory {
    territory: TerritoryId,
    /// Strategic value assigned by territory valuation.
    pub value: f64,
    /// Units planned to move in (attackers, or reinforcements when defending).
    units: Vec<UnitId>,
    /// Friendly units already here that will not move.
    cant_move_units: Vec<UnitId>,
    /// Enemy units that could reach this territory on their turn.
    max_enemy_units: Vec<UnitId>,
    /// Purchased units tentatively placed here.
    place_units: Vec<UnitId>,
    /// Transport to the cargo it lands here.
    amphib_attack_map: BTreeMap<UnitId, Vec<UnitId>>,
    /// Transport to the sea zone it unloads from.
    transport_territory_map: BTreeMap<UnitId, TerritoryId>,
    /// Bombarding ship to the sea zone it fires from.
    bombard_territory_map: BTreeMap<UnitId, TerritoryId>,
    battle_result: Option<BattleResult>,
}

impl PlanningTerritory {
    pub fn new(territory: TerritoryId) -> Self {
        PlanningTerritory {
            territory,
            value: 0.0,
            units: Vec::new(),
            cant_move_units: Vec::new(),
            max_enemy_units: Vec::new(),
            place_units: Vec::new(),
            amphib_attack_map: BTreeMap::new(),
            transport_territory_map: BTreeMap::new(),
            bombard_territory_map: BTreeMap::new(),
            battle_result: None,
        }
    }

    pub fn territory(&self) -> TerritoryId {
        self.territory
    }

    // --- candidate units ---

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn add_unit(&mut self, unit: UnitId) {
        self.units.push(unit);
        self.battle_result = None;
    }

    pub fn add_units(&mut self, units: &[UnitId]) {
        self.units.extend_from_slice(units);
        self.battle_result = None;
    }

    /// Removes `unit` from the moving units. Returns true if it was there.
    pub fn remove_unit(&mut self, unit: UnitId) -> bool {
        let before = self.units.len();
        self.units.retain(|&u| u != unit);
        let removed = self.units.len() != before;
        if removed {
            self.battle_result = None;
        }
        removed
    }

    pub fn cant_move_units(&self) -> &[UnitId] {
        &self.cant_move_units
    }

    pub fn add_cant_move_units(&mut self, units: &[UnitId]) {
        self.cant_move_units.extend_from_slice(units);
        self.battle_result = None;
    }

    pub fn max_enemy_units(&self) -> &[UnitId] {
        &self.max_enemy_units
    }

    pub fn set_max_enemy_units(&mut self, units: Vec<UnitId>) {
        self.max_enemy_units = units;
        self.battle_result = None;
    }

    pub fn place_units(&self) -> &[UnitId] {
        &self.place_units
    }

    pub fn add_place_units(&mut self, units: &[UnitId]) {
        self.place_units.extend_from_slice(units);
        self.battle_result = None;
    }

    /// Units that would stand here when the enemy attacks.
    pub fn all_defenders(&self) -> Vec<UnitId> {
        let mut defenders = self.cant_move_units.clone();
        defenders.extend_from_slice(&self.units);
        defenders.extend_from_slice(&self.place_units);
        defenders
    }

    /// Enemy units standing in the territory now.
    pub fn max_enemy_defenders(&self, board: &BoardState, player: PlayerId) -> Vec<UnitId> {
        board.enemy_units_in(self.territory, player)
    }

    // --- amphibious and bombard assignments ---

    pub fn amphib_attack_map(&self) -> &BTreeMap<UnitId, Vec<UnitId>> {
        &self.amphib_attack_map
    }

    /// Records `cargo` landing here from `transport` and adds the cargo to
    /// the moving units.
    pub fn add_amphib_attack(&mut self, transport: UnitId, cargo: Vec<UnitId>) {
        self.units.extend_from_slice(&cargo);
        self.amphib_attack_map.insert(transport, cargo);
        self.battle_result = None;
    }

    pub fn transport_territory_map(&self) -> &BTreeMap<UnitId, TerritoryId> {
        &self.transport_territory_map
    }

    pub fn set_transport_territory(&mut self, transport: UnitId, sea: TerritoryId) {
        self.transport_territory_map.insert(transport, sea);
    }

    pub fn bombard_territory_map(&self) -> &BTreeMap<UnitId, TerritoryId> {
        &self.bombard_territory_map
    }

    pub fn add_bombard(&mut self, unit: UnitId, from: TerritoryId) {
        self.bombard_territory_map.insert(unit, from);
        self.battle_result = None;
    }

    pub fn bombarding_units(&self) -> Vec<UnitId> {
        self.bombard_territory_map.keys().copied().collect()
    }

    // --- battle result memo ---

    /// The cached result, if one is still valid.
    pub fn battle_result(&self) -> Option<&BattleResult> {
        self.battle_result.as_ref()
    }

    /// Returns the cached result, computing it with `compute` first if needed.
    pub fn battle_result_or_insert_with(
        &mut self,
        compute: impl FnOnce(&PlanningTerritory) -> BattleResult,
    ) -> &BattleResult {
        if self.battle_result.is_none() {
            let result = compute(self);
            self.battle_result = Some(result);
        }
        self.battle_result.get_or_insert_with(BattleResult::default)
    }

    pub fn clear_battle_result(&mut self) {
        self.battle_result = None;
    }

    /// Attack estimate of the planned units against the current garrison.
    pub fn estimate_attack(
        &mut self,
        calc: &OddsCalculator,
        board: &BoardState,
        player: PlayerId,
    ) -> &BattleResult {
        self.battle_result_or_insert_with(|pt| {
            calc.estimate_attack_battle_results(
                board,
                pt.territory,
                &pt.units,
                &pt.max_enemy_defenders(board, player),
                &pt.bombarding_units(),
            )
        })
    }

    /// Defence estimate of everything standing here against the enemy units
    /// that could reach it.
    pub fn estimate_defend(&mut self, calc: &OddsCalculator, board: &BoardState) -> &BattleResult {
        self.battle_result_or_insert_with(|pt| {
            calc.estimate_defend_battle_results(
                board,
                pt.territory,
                &pt.max_enemy_units,
                &pt.all_defenders(),
                &[],
            )
        })
    }

    /// Returns true if the cached attack estimate reaches `win_percentage`
    /// with a land unit left. False when nothing is cached.
    pub fn is_currently_wins(&self, win_percentage: f64) -> bool {
        self.battle_result
            .as_ref()
            .is_some_and(|r| r.is_won(win_percentage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::fixture;
    use crate::combat::oracle::FixedOracle;
    use crate::config::PlannerConfig;

    #[test]
    fn new_entry_starts_empty() {
        let pt = PlanningTerritory::new(TerritoryId(4));
        assert_eq!(pt.territory(), TerritoryId(4));
        assert_eq!(pt.value, 0.0);
        assert!(pt.all_defenders().is_empty());
        assert!(pt.max_enemy_units().is_empty());
        assert!(pt.amphib_attack_map().is_empty());
        assert!(pt.bombard_territory_map().is_empty());
        assert!(pt.battle_result().is_none());
    }

    #[test]
    fn cached_result_is_reused_until_units_change() {
        let mut f = fixture();
        let attackers = f.add(f.ty.infantry, f.red, f.map.plains, 3);
        f.add(f.ty.infantry, f.blue, f.map.border, 3);
        let calc = OddsCalculator::new(FixedOracle::swing(0.6, 2.0), PlannerConfig::default());

        let mut pt = PlanningTerritory::new(f.map.border);
        pt.add_units(&attackers[..2]);
        let first = pt.estimate_attack(&calc, &f.board, f.red).clone();
        let second = pt.estimate_attack(&calc, &f.board, f.red).clone();
        assert_eq!(first, second);
        assert_eq!(pt.battle_result(), Some(&first));

        pt.add_unit(attackers[2]);
        assert!(pt.battle_result().is_none(), "adding a unit invalidates the memo");
    }

    #[test]
    fn memo_is_not_recomputed() {
        let f = fixture();
        let mut pt = PlanningTerritory::new(f.map.border);
        let mut calls = 0;
        for _ in 0..3 {
            pt.battle_result_or_insert_with(|_| {
                calls += 1;
                BattleResult::new(80.0, 1.0, true, Vec::new(), Vec::new(), 2.0)
            });
        }
        assert_eq!(calls, 1);
        assert!(pt.is_currently_wins(75.0));
        assert!(!pt.is_currently_wins(90.0));
    }

    #[test]
    fn amphib_cargo_joins_the_attack() {
        let mut f = fixture();
        let transport = f.add(f.ty.transport, f.red, f.map.sz_enemy, 1)[0];
        let cargo = f.add(f.ty.infantry, f.red, f.map.sz_enemy, 2);
        let mut pt = PlanningTerritory::new(f.map.island);
        pt.add_amphib_attack(transport, cargo.clone());
        pt.set_transport_territory(transport, f.map.sz_enemy);
        assert_eq!(pt.units(), cargo.as_slice());
        assert_eq!(pt.amphib_attack_map()[&transport], cargo);
        assert_eq!(pt.transport_territory_map()[&transport], f.map.sz_enemy);
    }

    #[test]
    fn all_defenders_combines_every_source() {
        let mut pt = PlanningTerritory::new(TerritoryId(0));
        pt.add_cant_move_units(&[UnitId(1)]);
        pt.add_units(&[UnitId(2)]);
        pt.add_place_units(&[UnitId(3)]);
        assert_eq!(pt.all_defenders(), vec![UnitId(1), UnitId(2), UnitId(3)]);
        assert!(pt.remove_unit(UnitId(2)));
        assert!(!pt.remove_unit(UnitId(2)));
    }
}
