//! Optional reductions of the candidate set after cutoff filtering.

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Random sample then prefix limit, each optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// Keep a random subset of this size.
    pub sample: Option<usize>,
    /// Seed for the sample; entropy when absent.
    pub seed: Option<u64>,
    /// Keep at most this many, from the front.
    pub limit: Option<usize>,
}

impl Selection {
    /// Apply the sample, then the limit.
    ///
    /// The sampled subset keeps the input order, so a limit after a sample
    /// takes the earliest of the sampled items.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let mut items = match self.sample {
            Some(n) if n < items.len() => {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let mut picked = rand::seq::index::sample(&mut rng, items.len(), n).into_vec();
                picked.sort_unstable();
                let mut picked = picked.into_iter().peekable();
                items
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        if picked.peek() == Some(&i) {
                            picked.next();
                            Some(item)
                        } else {
                            None
                        }
                    })
                    .collect()
            }
            _ => items,
        };
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
        items
    }
}
