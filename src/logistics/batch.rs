//! Grouping of move commands before execution.

use tracing::{debug, warn};

use super::command::MoveCommand;
use crate::board::{BoardState, Route, UnitId};
use crate::purchase::PlacementValidator;

/// Collects moves in sequences, one per transport convoy, and merges
/// convoys that take exactly the same path.
#[derive(Debug, Default)]
pub struct MoveBatcher {
    sequences: Vec<Vec<MoveCommand>>,
}

impl MoveBatcher {
    pub fn new() -> Self {
        MoveBatcher::default()
    }

    /// Starts a new sequence. Later moves are appended to it.
    pub fn new_sequence(&mut self) {
        self.sequences.push(Vec::new());
    }

    fn current(&mut self) -> &mut Vec<MoveCommand> {
        if self.sequences.is_empty() {
            self.sequences.push(Vec::new());
        }
        let last = self.sequences.len() - 1;
        &mut self.sequences[last]
    }

    pub fn add_move(&mut self, units: Vec<UnitId>, route: Route) {
        self.current().push(MoveCommand::new(units, route));
    }

    pub fn add_transport_load(&mut self, unit: UnitId, route: Route, transport: UnitId) {
        self.current().push(MoveCommand::load(unit, route, transport));
    }

    /// Flattens the sequences into one move list.
    ///
    /// A later sequence whose routes equal an earlier one step by step is
    /// folded into it: each of its moves joins the earlier move at the same
    /// position, so both convoys sail together.
    pub fn batch_moves(mut self) -> Vec<MoveCommand> {
        for i in 0..self.sequences.len() {
            if self.sequences[i].is_empty() {
                continue;
            }
            for j in i + 1..self.sequences.len() {
                if !same_routes(&self.sequences[i], &self.sequences[j]) {
                    continue;
                }
                let later = std::mem::take(&mut self.sequences[j]);
                for (target, mv) in self.sequences[i].iter_mut().zip(later) {
                    target.units.extend(mv.units);
                    target.units_to_sea_transports.extend(mv.units_to_sea_transports);
                }
            }
        }
        self.sequences.into_iter().flatten().collect()
    }
}

fn same_routes(a: &[MoveCommand], b: &[MoveCommand]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.route == y.route)
}

/// Merges moves that share a route, unless any move boards a transport.
///
/// Each move is folded into the first later move with the same route, the
/// later move's units first.
pub fn merge_moves(moves: &mut Vec<MoveCommand>) {
    if moves.iter().any(MoveCommand::is_transport_load) {
        return;
    }
    let mut i = 0;
    while i < moves.len() {
        let Some(j) = (i + 1..moves.len()).find(|&j| moves[j].route == moves[i].route) else {
            i += 1;
            continue;
        };
        let earlier = moves.remove(i);
        moves[j - 1].units.extend(earlier.units);
    }
}

/// Merges `moves` and hands each to the validator in order.
///
/// Rejected moves are logged and skipped. Returns the number performed.
pub fn do_move(
    board: &BoardState,
    validator: &mut dyn PlacementValidator,
    mut moves: Vec<MoveCommand>,
) -> usize {
    merge_moves(&mut moves);
    let mut performed = 0;
    for mv in &moves {
        match validator.perform_move(board, mv) {
            Some(reason) => warn!(units = ?mv.units, route = ?mv.route, %reason, "could not move"),
            None => performed += 1,
        }
    }
    debug!(performed, total = moves.len(), "moves performed");
    performed
}
