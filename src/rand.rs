use nannou::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::util::PriorityQueue;

/// The RNG used by stochastic erosion. ChaCha keeps seeded sequences stable across platforms.
pub type SimRng = ChaCha8Rng;

/// Returns an explicitly seeded RNG, or one seeded from entropy if no seed is given.
pub fn seeded_rng(seed: Option<u64>) -> SimRng {
    match seed {
        Some(seed) => SimRng::seed_from_u64(seed),
        None => SimRng::from_entropy(),
    }
}

/// Returns [k] distinct indices into [weights], sampled without replacement with probability
/// proportional to weight.
///
/// Draws exactly one uniform value per weight, in order. Indices are returned in the order they
/// were selected.
pub fn weighted_sample(rand: &mut SimRng, weights: &[f32], k: usize) -> Vec<usize> {
    // Efraimidis-Spirakis sampling [0]: each item gets the key u^(1/w) and the k largest keys
    // win. The keys are compared in log space, ln(u) / w, so tiny weights don't underflow.
    //
    // [0] https://doi.org/10.1016/j.ipl.2005.11.003

    let k = k.min(weights.len());

    if k == 0 {
        return vec![];
    }

    let mut queue = PriorityQueue::with_capacity(weights.len());

    for (i, w) in weights.iter().enumerate() {
        let u = 1.0 - rand.gen::<f64>(); // (0, 1]

        let key = if *w > 0.0 {
            u.ln() / *w as f64
        } else {
            f64::NEG_INFINITY
        };

        queue.push(i, key);
    }

    let mut selected = Vec::with_capacity(k);

    while selected.len() < k {
        match queue.pop() {
            Some(i) => selected.push(i),
            None => break,
        }
    }

    selected
}
