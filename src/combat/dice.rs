//! A small Monte Carlo battle oracle.
//!
//! Rolls plain dice rounds until one side is gone: every unit rolls its
//! strength on each of its rolls, hits land simultaneously and each side
//! loses its cheapest units first. It does not model first strike, anti-air
//! fire or retreat decisions beyond the air-only rule, which keeps it fast
//! enough to drive benches and the demo binary.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::oracle::{AggregateResults, BattleOracle, BattleRequest};
use super::power::{unit_powers, UnitPower};
use crate::board::matches::{unit_can_evade, unit_is_destroyer};
use crate::board::{BoardState, UnitId};

/// Rounds after which an undecided battle counts as a defender hold.
const MAX_ROUNDS: u32 = 30;

/// Odd constant mixed into the seed per call so consecutive calls draw
/// unrelated streams.
const CALL_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct DiceOracle {
    seed: u64,
    calls: AtomicU64,
}

impl DiceOracle {
    /// Creates an oracle whose n-th call is reproducible from `seed`.
    pub fn new(seed: u64) -> Self {
        DiceOracle {
            seed,
            calls: AtomicU64::new(0),
        }
    }

    /// Seeds from the operating system.
    pub fn from_entropy() -> Self {
        DiceOracle::new(rand::random())
    }

    fn rng_for_next_call(&self) -> SmallRng {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        SmallRng::seed_from_u64(self.seed ^ call.wrapping_add(1).wrapping_mul(CALL_MIX))
    }
}

/// A unit still standing, with the hit points it has left.
#[derive(Debug, Clone, Copy)]
struct Fighter {
    power: UnitPower,
    hit_points: u32,
    cost: i32,
}

fn line_up(board: &BoardState, powers: Vec<UnitPower>) -> Vec<Fighter> {
    let mut fighters: Vec<Fighter> = powers
        .into_iter()
        .map(|power| Fighter {
            power,
            hit_points: board.hit_points_left(power.unit),
            cost: board.unit_type(power.unit).cost,
        })
        .filter(|f| f.hit_points > 0)
        .collect();
    // Casualty order: cheapest first, weakest first among equal cost.
    fighters.sort_by_key(|f| (f.cost, f.power.strength));
    fighters
}

fn roll_hits(rng: &mut SmallRng, fighters: &[Fighter], dice: i32) -> u32 {
    if dice <= 0 {
        return 0;
    }
    let mut hits = 0;
    for f in fighters {
        for _ in 0..f.power.rolls {
            if rng.gen_range(0..dice) < f.power.strength {
                hits += 1;
            }
        }
    }
    hits
}

/// Applies `hits` to the front of the line and returns the value destroyed.
fn take_hits(fighters: &mut Vec<Fighter>, mut hits: u32) -> i32 {
    let mut lost = 0;
    while hits > 0 && !fighters.is_empty() {
        let absorbed = hits.min(fighters[0].hit_points);
        fighters[0].hit_points -= absorbed;
        hits -= absorbed;
        if fighters[0].hit_points == 0 {
            lost += fighters[0].cost;
            fighters.remove(0);
        }
    }
    lost
}

struct RunOutcome {
    attacker_won: bool,
    swing: i32,
    attackers: Vec<UnitId>,
    defenders: Vec<UnitId>,
    attacker_value: i32,
    rounds: u32,
}

fn run_once(
    rng: &mut SmallRng,
    request: &BattleRequest<'_>,
    attack_line: &[Fighter],
    defense_line: &[Fighter],
    bombard: &[Fighter],
) -> RunOutcome {
    let board = request.board;
    let dice = board.rules.dice_sides as i32;
    let water = board.territory(request.territory).is_water;
    let mut attackers = attack_line.to_vec();
    let mut defenders = defense_line.to_vec();
    let mut swing = 0;
    let mut rounds = 0;

    if !bombard.is_empty() && !water {
        let hits = roll_hits(rng, bombard, dice);
        swing += take_hits(&mut defenders, hits);
    }

    while !attackers.is_empty() && !defenders.is_empty() && rounds < MAX_ROUNDS {
        rounds += 1;
        let attacker_hits = roll_hits(rng, &attackers, dice);
        let defender_hits = roll_hits(rng, &defenders, dice);
        swing += take_hits(&mut defenders, attacker_hits);
        swing -= take_hits(&mut attackers, defender_hits);

        let only_air = attackers
            .iter()
            .all(|f| board.unit_type(f.power.unit).is_air());
        if request.retreat_when_only_air_left && !water && only_air && !defenders.is_empty() {
            break;
        }
    }

    RunOutcome {
        attacker_won: defenders.is_empty() && !attackers.is_empty(),
        swing,
        attacker_value: attackers.iter().map(|f| f.cost).sum(),
        attackers: attackers.iter().map(|f| f.power.unit).collect(),
        defenders: defenders.iter().map(|f| f.power.unit).collect(),
        rounds,
    }
}

impl BattleOracle for DiceOracle {
    fn simulate(&self, request: &BattleRequest<'_>) -> AggregateResults {
        let board = request.board;
        let t = request.territory;
        let runs = request.runs.max(1);
        let mut rng = self.rng_for_next_call();

        let mut defending: Vec<UnitId> = request.defending_units.to_vec();
        if board.rules.evade_before_battle
            && !unit_is_destroyer(board).any(request.attacking_units)
        {
            let evades = unit_can_evade(board);
            defending.retain(|&u| !evades.test(u));
        }

        let attack_line = line_up(
            board,
            unit_powers(board, t, request.attacking_units, &defending, true),
        );
        let defense_line = line_up(
            board,
            unit_powers(board, t, &defending, request.attacking_units, false),
        );
        // Bombarding ships fire from the sea, so they skip the battle filter.
        let dice = board.rules.dice_sides as i32;
        let bombard_powers = request
            .bombarding_units
            .iter()
            .map(|&unit| {
                let ty = board.unit_type(unit);
                UnitPower {
                    unit,
                    strength: ty.attack.clamp(0, dice),
                    rolls: ty.attack_rolls.max(0),
                }
            })
            .collect();
        let bombard = line_up(board, bombard_powers);

        let outcomes: Vec<RunOutcome> = (0..runs)
            .map(|_| run_once(&mut rng, request, &attack_line, &defense_line, &bombard))
            .collect();

        let n = outcomes.len() as f64;
        let wins = outcomes.iter().filter(|o| o.attacker_won).count() as f64;
        let swing = outcomes.iter().map(|o| o.swing as f64).sum::<f64>() / n;
        let value = outcomes.iter().map(|o| o.attacker_value as f64).sum::<f64>() / n;
        let rounds = outcomes.iter().map(|o| o.rounds as f64).sum::<f64>() / n;
        let average_survivors = outcomes.iter().map(|o| o.attackers.len() as f64).sum::<f64>() / n;

        // Report the survivors of the run closest to the average outcome.
        let representative = outcomes.iter().min_by(|a, b| {
            let da = (a.attackers.len() as f64 - average_survivors).abs();
            let db = (b.attackers.len() as f64 - average_survivors).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });

        AggregateResults {
            attacker_win_probability: wins / n,
            attackers_remaining: representative.map(|o| o.attackers.clone()).unwrap_or_default(),
            defenders_remaining: representative.map(|o| o.defenders.clone()).unwrap_or_default(),
            value_swing: swing,
            attacker_value_remaining: value,
            rounds_fought: rounds,
        }
    }
}
