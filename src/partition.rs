use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::action::Index;
use crate::anneal::{anneal, AnnealObserver, AnnealSummary};
use crate::cache::{pair_cost, CostMatrix};
use crate::config::{Method, OptimizerConfig};
use crate::model::condition::{PairWeights, Score};
use crate::model::entity::{self, Id};
use crate::model::group::Table;
use crate::weighted::weighted_random;

pub const MIN_ANNEAL_PARTICIPANTS: usize = 8;

/// Groups of four are the default, fives absorb a remainder, and a three
/// is used only when no mix of fours and fives adds up to `n`.
pub fn sizes_for(n: usize) -> Vec<usize> {
    match n {
        0 => vec![],
        1..=5 => vec![n],
        6 => vec![3, 3],
        7 => vec![4, 3],
        _ => {
            let q = n / 4;
            match n % 4 {
                0 => vec![4; q],
                1 => fours_then_fives(q - 1, 1),
                2 => fours_then_fives(q - 2, 2),
                _ => match fewest_fives(n) {
                    Some(sizes) => sizes,
                    None => {
                        let mut sizes = vec![4; (n - 3) / 4];
                        sizes.push(3);
                        sizes
                    }
                },
            }
        }
    }
}

fn fours_then_fives(fours: usize, fives: usize) -> Vec<usize> {
    let mut sizes = vec![4; fours];
    sizes.extend(std::iter::repeat(5).take(fives));
    sizes
}

fn fewest_fives(n: usize) -> Option<Vec<usize>> {
    (0..=n / 5)
        .find(|fives| (n - 5 * fives) % 4 == 0)
        .map(|fives| fours_then_fives((n - 5 * fives) / 4, fives))
}

/// Method actually run for `n` participants. Annealing needs at least eight.
pub fn effective_method(n: usize, requested: Method) -> Method {
    if n < MIN_ANNEAL_PARTICIPANTS {
        Method::WeightedRandom
    } else {
        requested
    }
}

pub fn initial_partition<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Vec<Index>> {
    let mut shuffled: Vec<Index> = (0..n).collect();
    shuffled.shuffle(rng);
    let mut rest = shuffled.as_slice();
    sizes_for(n)
        .into_iter()
        .map(|size| {
            let (group, tail) = rest.split_at(size);
            rest = tail;
            group.to_vec()
        })
        .collect()
}

/// Annealing cost of a partition; pairs missing from `weights` count as 0.
pub fn total_cost(table: &Table, weights: &PairWeights, lam: f64) -> Score {
    table
        .groups
        .iter()
        .map(|group| {
            let members = &group.members;
            let mut cost = 0.0;
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    cost += pair_cost(weights.get_pair(a, b).unwrap_or(0.0), lam);
                }
            }
            cost
        })
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionOutcome {
    pub table: Table,
    pub method_used: Method,
    pub anneal: Option<AnnealSummary>,
}

fn to_table(ids: &[Id], groups: Vec<Vec<Index>>) -> Table {
    groups
        .into_iter()
        .map(|g| g.into_iter().map(|i| ids[i].clone()).collect::<Vec<Id>>())
        .collect::<Vec<_>>()
        .into()
}

pub fn partition<R: Rng + ?Sized>(
    participants: &[Id],
    weights: &PairWeights,
    config: &OptimizerConfig,
    rng: &mut R,
) -> PartitionOutcome {
    partition_with(participants, weights, config, rng, &mut ())
}

pub fn partition_with<R, O>(
    participants: &[Id],
    weights: &PairWeights,
    config: &OptimizerConfig,
    rng: &mut R,
    observer: &mut O,
) -> PartitionOutcome
where
    R: Rng + ?Sized,
    O: AnnealObserver + ?Sized,
{
    let ids = entity::dedup(participants);
    if ids.len() != participants.len() {
        warn!(dropped = participants.len() - ids.len(), "duplicate participants ignored");
    }
    let n = ids.len();
    let method_used = effective_method(n, config.method);
    info!(n, requested = %config.method, used = %method_used, "partitioning participants");

    if n == 0 {
        return PartitionOutcome { table: Table::default(), method_used, anneal: None };
    }

    let (groups, summary) = match method_used {
        Method::WeightedRandom => {
            let matrix = CostMatrix::build(&ids, weights, |w| w);
            (weighted_random(&matrix, config.lam, rng), None)
        }
        Method::SimulatedAnnealing => {
            let lam = config.lam;
            let matrix = CostMatrix::build(&ids, weights, |w| pair_cost(w, lam));
            let initial = initial_partition(n, rng);
            let (best, summary) = anneal(&matrix, &initial, &config.anneal, rng, observer);
            (best, Some(summary))
        }
    };
    let table = to_table(&ids, groups);
    debug!(sizes = ?table.sizes(), "partition ready");
    PartitionOutcome { table, method_used, anneal: summary }
}
