//! Restorable shuffling for index-aligned collections.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A permutation source whose random state can be snapshotted and restored.
///
/// Shuffling two equal-length sequences as
/// `shuffle(a); reset_state(); shuffle(b)` applies the same permutation to
/// both, so elements that shared an index before still share one after.
pub trait Shuffler {
    /// Permutes `items` in place.
    fn shuffle<T>(&mut self, items: &mut [T]);

    /// Makes the current random state the restore point.
    fn keep_state(&mut self);

    /// Restores the random state saved by the last [`keep_state`](Self::keep_state).
    ///
    /// Calling this more than once in a row has the same effect as calling it once.
    fn reset_state(&mut self);

    /// Draws a permutation of `0..len`.
    ///
    /// Position `i` of the result holds the pre-shuffle index of the element
    /// that [`shuffle`](Self::shuffle) would move to position `i`.
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        self.shuffle(&mut indices);
        indices
    }
}

/// [`Shuffler`] backed by a seedable [`StdRng`].
///
/// The restore point is a seed: `keep_state` draws a fresh seed from the
/// generator and reseeds it, `reset_state` reseeds from the kept seed.
#[derive(Debug)]
pub struct RandomShuffler {
    rng: StdRng,
    kept: u64,
}

impl RandomShuffler {
    /// Creates a deterministic shuffler.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            kept: seed,
        }
    }

    /// Creates a shuffler seeded from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self::seeded(rand::rng().next_u64())
    }

    /// Creates a seeded shuffler when `seed` is given, an entropy-seeded one otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl Shuffler for RandomShuffler {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    fn keep_state(&mut self) {
        self.kept = self.rng.next_u64();
        self.rng = StdRng::seed_from_u64(self.kept);
    }

    fn reset_state(&mut self) {
        self.rng = StdRng::seed_from_u64(self.kept);
    }
}
