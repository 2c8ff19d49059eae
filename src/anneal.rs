use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::seq::index;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::action::{Index, Position, Swap};
use crate::cache::{CostMatrix, TableCache};
use crate::config::AnnealParams;
use crate::model::condition::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cooled,
    MaxIterations,
    NoSwapPossible,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealStep {
    pub iteration: usize,
    pub temperature: f64,
    pub delta: Score,
    pub accepted: bool,
    pub current_cost: Score,
    pub best_cost: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnealSummary {
    pub initial_cost: Score,
    pub best_cost: Score,
    pub iterations: usize,
    pub accepted: usize,
    pub improved: usize,
    pub stop: StopReason,
}

/// Hook into the annealing loop. Returning `Break` from `on_step` stops the search.
pub trait AnnealObserver {
    fn on_step(&mut self, _step: &AnnealStep) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn on_finish(&mut self, _summary: &AnnealSummary) {}
}

impl AnnealObserver for () {}

/// Stops the search once the flag is raised.
pub struct CancelFlag<'a>(pub &'a AtomicBool);

impl AnnealObserver for CancelFlag<'_> {
    fn on_step(&mut self, _step: &AnnealStep) -> ControlFlow<()> {
        if self.0.load(Ordering::Relaxed) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

struct State {
    table: TableCache,
    n_iterations: usize,
    temperature: f64,
}

struct SwapGenerator {
    sizes: Vec<Index>,
    candidates: Vec<Index>,
}

impl SwapGenerator {
    fn init(sizes: Vec<Index>) -> SwapGenerator {
        let candidates = sizes
            .iter()
            .enumerate()
            .filter(|(_, size)| **size > 0)
            .map(|(group_index, _)| group_index)
            .collect();
        SwapGenerator { sizes, candidates }
    }

    fn can_swap(&self) -> bool {
        self.candidates.len() > 1
    }

    fn next<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Swap> {
        if !self.can_swap() {
            return None;
        }
        let picked = index::sample(rng, self.candidates.len(), 2);
        let (g1, g2) = (self.candidates[picked.index(0)], self.candidates[picked.index(1)]);
        let pos1 = Position { group_index: g1, member_index: rng.gen_range(0..self.sizes[g1]) };
        let pos2 = Position { group_index: g2, member_index: rng.gen_range(0..self.sizes[g2]) };
        Some(Swap(pos1, pos2))
    }
}

fn accept<R: Rng + ?Sized>(delta: Score, temperature: f64, rng: &mut R) -> bool {
    delta < 0.0 || rng.gen::<f64>() < (-delta / temperature).exp()
}

pub fn anneal<R, O>(
    costs: &CostMatrix,
    initial: &[Vec<Index>],
    params: &AnnealParams,
    rng: &mut R,
    observer: &mut O,
) -> (Vec<Vec<Index>>, AnnealSummary)
where
    R: Rng + ?Sized,
    O: AnnealObserver + ?Sized,
{
    let mut state = State {
        table: TableCache::create(initial, costs),
        n_iterations: 0,
        temperature: params.initial_temp,
    };
    let generator = SwapGenerator::init(state.table.group_sizes());
    let initial_cost = state.table.penalty_score;
    let mut best = initial.to_vec();
    let mut best_cost = initial_cost;
    let (mut accepted, mut improved) = (0, 0);
    let mut stop = StopReason::MaxIterations;

    debug!(
        groups = initial.len(),
        initial_cost,
        temperature = params.initial_temp,
        max_iter = params.max_iter,
        "annealing start"
    );

    while state.n_iterations < params.max_iter {
        if state.temperature < params.temp_min {
            stop = StopReason::Cooled;
            break;
        }
        let Some(swap) = generator.next(rng) else {
            stop = StopReason::NoSwapPossible;
            break;
        };
        let delta = state.table.simulate(&swap, costs).score_diff().unwrap_or(Score::INFINITY);
        let took = delta.is_finite() && accept(delta, state.temperature, rng);
        if took && state.table.act(&swap, costs).is_ok() {
            accepted += 1;
            if state.table.penalty_score < best_cost {
                best_cost = state.table.penalty_score;
                best = state.table.to_indices();
                improved += 1;
            }
        }
        state.temperature *= params.cooling_rate;
        state.n_iterations += 1;

        let step = AnnealStep {
            iteration: state.n_iterations,
            temperature: state.temperature,
            delta,
            accepted: took,
            current_cost: state.table.penalty_score,
            best_cost,
        };
        if observer.on_step(&step).is_break() {
            stop = StopReason::Cancelled;
            break;
        }
    }

    let summary = AnnealSummary {
        initial_cost,
        best_cost,
        iterations: state.n_iterations,
        accepted,
        improved,
        stop,
    };
    debug!(
        best_cost,
        iterations = summary.iterations,
        accepted,
        improved,
        stop = ?summary.stop,
        "annealing done"
    );
    observer.on_finish(&summary);
    (best, summary)
}
