//! The per-pass planning scratchpad.
//!
//! A [`PlanningPass`] is created at the start of a planning pass, handed by
//! reference to every component and dropped when the pass ends. It owns the
//! [`PlanningTerritory`] entries and the unit commitments, so no planning
//! state outlives the pass.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::territory::PlanningTerritory;
use crate::board::{BoardState, PlayerId, TerritoryId, UnitId};
use crate::combat::{BattleResult, OddsCalculator, PlaceUnits};
use crate::error::PlanError;

pub struct PlanningPass {
    player: PlayerId,
    territories: BTreeMap<TerritoryId, PlanningTerritory>,
    /// Unit to the one territory it moves to this pass.
    commitments: BTreeMap<UnitId, TerritoryId>,
    /// Units already earmarked to be consumed by queued placements.
    consumed: BTreeSet<UnitId>,
}

impl PlanningPass {
    pub fn new(player: PlayerId) -> Self {
        PlanningPass {
            player,
            territories: BTreeMap::new(),
            commitments: BTreeMap::new(),
            consumed: BTreeSet::new(),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    // --- territory entries ---

    /// The entry for `t`, created empty on first use.
    pub fn entry(&mut self, t: TerritoryId) -> &mut PlanningTerritory {
        self.territories
            .entry(t)
            .or_insert_with(|| PlanningTerritory::new(t))
    }

    pub fn get(&self, t: TerritoryId) -> Option<&PlanningTerritory> {
        self.territories.get(&t)
    }

    pub fn try_get(&self, t: TerritoryId) -> Result<&PlanningTerritory, PlanError> {
        self.territories
            .get(&t)
            .ok_or(PlanError::UnknownPlanningTerritory(t))
    }

    pub fn try_get_mut(&mut self, t: TerritoryId) -> Result<&mut PlanningTerritory, PlanError> {
        self.territories
            .get_mut(&t)
            .ok_or(PlanError::UnknownPlanningTerritory(t))
    }

    pub fn territories(&self) -> impl Iterator<Item = &PlanningTerritory> {
        self.territories.values()
    }

    pub fn territory_ids(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        self.territories.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.territories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    // --- commitments ---

    pub fn committed_to(&self, unit: UnitId) -> Option<TerritoryId> {
        self.commitments.get(&unit).copied()
    }

    pub fn is_committed(&self, unit: UnitId) -> bool {
        self.commitments.contains_key(&unit)
    }

    pub fn commitments(&self) -> &BTreeMap<UnitId, TerritoryId> {
        &self.commitments
    }

    fn check_free(&self, unit: UnitId, t: TerritoryId) -> Result<(), PlanError> {
        match self.commitments.get(&unit) {
            Some(&existing) if existing != t => Err(PlanError::UnitAlreadyCommitted {
                unit,
                existing,
                requested: t,
            }),
            _ => Ok(()),
        }
    }

    /// Records that `unit` moves to `t`. Returns false if it already did.
    ///
    /// A unit may only ever be committed to one territory per pass.
    pub fn commit(&mut self, unit: UnitId, t: TerritoryId) -> Result<bool, PlanError> {
        self.check_free(unit, t)?;
        Ok(self.commitments.insert(unit, t).is_none())
    }

    /// Commits `units` to `t` and adds them to its moving units.
    ///
    /// Either every unit is assigned or, on a conflict, none is.
    pub fn assign_units(&mut self, t: TerritoryId, units: &[UnitId]) -> Result<(), PlanError> {
        for &u in units {
            self.check_free(u, t)?;
        }
        let mut fresh = Vec::with_capacity(units.len());
        for &u in units {
            if self.commit(u, t)? {
                fresh.push(u);
            }
        }
        trace!(territory = ?t, units = fresh.len(), "units assigned");
        self.entry(t).add_units(&fresh);
        Ok(())
    }

    /// Commits a transport and its cargo to an amphibious landing in `t`,
    /// unloading from sea zone `unload_from`.
    pub fn assign_amphib(
        &mut self,
        t: TerritoryId,
        transport: UnitId,
        cargo: &[UnitId],
        unload_from: TerritoryId,
    ) -> Result<(), PlanError> {
        self.check_free(transport, t)?;
        for &u in cargo {
            self.check_free(u, t)?;
        }
        self.commit(transport, t)?;
        for &u in cargo {
            self.commit(u, t)?;
        }
        let entry = self.entry(t);
        entry.add_amphib_attack(transport, cargo.to_vec());
        entry.set_transport_territory(transport, unload_from);
        Ok(())
    }

    /// Commits a ship to bombard `t` from sea zone `from`.
    pub fn assign_bombard(
        &mut self,
        t: TerritoryId,
        unit: UnitId,
        from: TerritoryId,
    ) -> Result<(), PlanError> {
        self.commit(unit, t)?;
        self.entry(t).add_bombard(unit, from);
        Ok(())
    }

    /// Undoes the commitment of `unit`, removing it from its territory.
    pub fn release(&mut self, unit: UnitId) -> Option<TerritoryId> {
        let t = self.commitments.remove(&unit)?;
        if let Some(entry) = self.territories.get_mut(&t) {
            entry.remove_unit(unit);
        }
        Some(t)
    }

    // --- placements ---

    /// Purchased units queued for placement in `t`.
    pub fn place_units(&self, t: TerritoryId) -> &[UnitId] {
        self.territories
            .get(&t)
            .map(|pt| pt.place_units())
            .unwrap_or(&[])
    }

    pub fn add_place_units(&mut self, t: TerritoryId, units: &[UnitId]) {
        self.entry(t).add_place_units(units);
    }

    /// Every queued placement keyed by territory, empty entries skipped.
    pub fn place_units_map(&self) -> PlaceUnits {
        self.territories
            .iter()
            .filter(|(_, pt)| !pt.place_units().is_empty())
            .map(|(&t, pt)| (t, pt.place_units().to_vec()))
            .collect()
    }

    pub fn queued_consumption(&self) -> &BTreeSet<UnitId> {
        &self.consumed
    }

    pub fn queue_consumption(&mut self, units: &[UnitId]) {
        self.consumed.extend(units.iter().copied());
    }

    /// Returns units queued for consumption by a purchase that was dropped.
    pub fn release_consumption(&mut self, units: &[UnitId]) {
        for u in units {
            self.consumed.remove(u);
        }
    }

    // --- battle estimates ---

    /// Memoized attack estimate for an existing entry.
    pub fn estimate_attack(
        &mut self,
        calc: &OddsCalculator,
        board: &BoardState,
        t: TerritoryId,
    ) -> Result<&BattleResult, PlanError> {
        let player = self.player;
        Ok(self.try_get_mut(t)?.estimate_attack(calc, board, player))
    }

    /// Returns true if the memoized attack estimate for `t` is a win,
    /// computing it when missing. Territories not in the pass never count.
    pub fn is_won(
        &mut self,
        calc: &OddsCalculator,
        board: &BoardState,
        t: TerritoryId,
        win_percentage: f64,
    ) -> bool {
        self.estimate_attack(calc, board, t)
            .map(|r| r.is_won(win_percentage))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::fixture;

    #[test]
    fn unit_cannot_be_committed_twice() {
        let f = fixture();
        let mut pass = PlanningPass::new(f.red);
        pass.assign_units(f.map.border, &[UnitId(5), UnitId(6)]).unwrap();
        let err = pass
            .assign_units(f.map.wastes, &[UnitId(7), UnitId(6)])
            .unwrap_err();
        match err {
            PlanError::UnitAlreadyCommitted {
                unit,
                existing,
                requested,
            } => {
                assert_eq!(unit, UnitId(6));
                assert_eq!(existing, f.map.border);
                assert_eq!(requested, f.map.wastes);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!pass.is_committed(UnitId(7)), "failed assignment leaves no trace");
        assert!(pass.get(f.map.wastes).is_none());
    }

    #[test]
    fn recommitting_to_same_target_is_harmless() {
        let f = fixture();
        let mut pass = PlanningPass::new(f.red);
        pass.assign_units(f.map.border, &[UnitId(5)]).unwrap();
        pass.assign_units(f.map.border, &[UnitId(5)]).unwrap();
        assert_eq!(pass.try_get(f.map.border).unwrap().units(), &[UnitId(5)]);

        assert_eq!(pass.release(UnitId(5)), Some(f.map.border));
        assert!(pass.try_get(f.map.border).unwrap().units().is_empty());
        pass.assign_units(f.map.wastes, &[UnitId(5)]).unwrap();
    }

    #[test]
    fn unknown_territory_is_an_error() {
        let f = fixture();
        let pass = PlanningPass::new(f.red);
        assert!(matches!(
            pass.try_get(f.map.island),
            Err(PlanError::UnknownPlanningTerritory(t)) if t == f.map.island
        ));
    }

    #[test]
    fn dropped_purchase_releases_its_consumption() {
        let f = fixture();
        let mut pass = PlanningPass::new(f.red);
        pass.queue_consumption(&[UnitId(3), UnitId(4)]);
        pass.queue_consumption(&[UnitId(9)]);
        pass.release_consumption(&[UnitId(9)]);
        assert_eq!(pass.queued_consumption().iter().copied().collect::<Vec<_>>(), vec![UnitId(3), UnitId(4)]);
    }

    #[test]
    fn placements_are_collected_per_territory() {
        let f = fixture();
        let mut pass = PlanningPass::new(f.red);
        pass.entry(f.map.plains);
        pass.add_place_units(f.map.home, &[UnitId(10), UnitId(11)]);
        let map = pass.place_units_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&f.map.home], vec![UnitId(10), UnitId(11)]);
        assert!(pass.place_units(f.map.plains).is_empty());
        assert!(pass.place_units(f.map.island).is_empty());
    }

    #[test]
    fn amphib_assignment_commits_transport_and_cargo() {
        let f = fixture();
        let mut pass = PlanningPass::new(f.red);
        pass.assign_amphib(f.map.island, UnitId(20), &[UnitId(21)], f.map.sz_enemy)
            .unwrap();
        assert_eq!(pass.committed_to(UnitId(20)), Some(f.map.island));
        assert_eq!(pass.committed_to(UnitId(21)), Some(f.map.island));
        assert!(pass.assign_bombard(f.map.border, UnitId(20), f.map.sz_enemy).is_err());
    }
}
