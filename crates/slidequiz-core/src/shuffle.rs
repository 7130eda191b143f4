//! Order randomization that remembers where everything went.
//!
//! [`shuffle`] permutes a sequence uniformly (Fisher–Yates, via
//! [`SliceRandom::shuffle`]) and returns the index map needed to relocate a
//! known position, typically the correct answer, in the permuted sequence.

use rand::seq::SliceRandom;
use rand::Rng;

/// A permuted sequence and the map from original to new positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shuffled<T> {
    items: Vec<T>,
    /// `index_map[original] == new`
    index_map: Vec<usize>,
}

impl<T> Shuffled<T> {
    /// Wrap a sequence without permuting it.
    pub fn identity(items: Vec<T>) -> Self {
        let index_map = (0..items.len()).collect();
        Self { items, index_map }
    }

    /// The permuted items.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// `index_map()[original]` is the item's position in [`items`](Self::items).
    pub fn index_map(&self) -> &[usize] {
        &self.index_map
    }

    /// New position of the item originally at `original`.
    pub fn relocate(&self, original: usize) -> Option<usize> {
        self.index_map.get(original).copied()
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<usize>) {
        (self.items, self.index_map)
    }
}

/// Uniformly permute `items`.
///
/// Sequences of zero or one element come back unchanged and consume no
/// randomness.
pub fn shuffle<T, R: Rng + ?Sized>(items: Vec<T>, rng: &mut R) -> Shuffled<T> {
    if items.len() < 2 {
        return Shuffled::identity(items);
    }

    // order[new] == original
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.shuffle(rng);

    let mut index_map = vec![0; order.len()];
    for (new, &original) in order.iter().enumerate() {
        index_map[original] = new;
    }

    let mut placed: Vec<(usize, T)> = items
        .into_iter()
        .enumerate()
        .map(|(original, item)| (index_map[original], item))
        .collect();
    placed.sort_unstable_by_key(|(new, _)| *new);

    Shuffled {
        items: placed.into_iter().map(|(_, item)| item).collect(),
        index_map,
    }
}
