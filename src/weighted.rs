use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::action::Index;
use crate::cache::CostMatrix;
use crate::model::condition::Score;
use crate::partition::sizes_for;

/// Log of the sampling weight for a summed affinity `total`. Bonuses are not scaled by `lam`.
pub fn draw_exponent(total: Score, lam: f64) -> f64 {
    if total < 0.0 {
        -total
    } else {
        -lam * total
    }
}

fn pick<R: Rng + ?Sized>(remaining: &[Index], group: &[Index], weights: &CostMatrix, lam: f64, rng: &mut R) -> usize {
    let exponents: Vec<f64> = remaining
        .iter()
        .map(|cand| draw_exponent(group.iter().map(|m| weights.get(*m, *cand)).sum(), lam))
        .collect();
    // Shift by the largest exponent so the strongest candidate draws exp(0) = 1.
    let top = exponents.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if top.is_finite() {
        let draws: Vec<f64> = exponents.iter().map(|e| (e - top).exp()).collect();
        if let Ok(dist) = WeightedIndex::new(&draws) {
            return dist.sample(rng);
        }
    }
    rng.gen_range(0..remaining.len())
}

/// `weights` holds raw affinity weights, not annealing costs.
pub fn weighted_random<R: Rng + ?Sized>(weights: &CostMatrix, lam: f64, rng: &mut R) -> Vec<Vec<Index>> {
    let mut sizes = sizes_for(weights.len());
    sizes.shuffle(rng);

    let mut remaining: Vec<Index> = (0..weights.len()).collect();
    let mut groups = Vec::with_capacity(sizes.len());
    for size in sizes {
        if remaining.is_empty() {
            break;
        }
        let seed = remaining.swap_remove(rng.gen_range(0..remaining.len()));
        let mut group = vec![seed];
        while group.len() < size && !remaining.is_empty() {
            let chosen = pick(&remaining, &group, weights, lam, rng);
            group.push(remaining.swap_remove(chosen));
        }
        groups.push(group);
    }
    groups
}
