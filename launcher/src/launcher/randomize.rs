//! Level order randomization

use rand::Rng;
use rand::seq::SliceRandom;

use crate::store::DedicatedItem;

/// Which level transform a descriptor asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelRandomization {
    None,
    /// Uniformly random permutation of all levels
    Shuffle,
    /// Random start level, cyclic order otherwise kept
    RotateStart,
}

impl LevelRandomization {
    /// Level order randomization wins over start level randomization
    pub fn for_item(item: &DedicatedItem) -> Self {
        if item.random_level_order {
            LevelRandomization::Shuffle
        } else if item.random_start_level {
            LevelRandomization::RotateStart
        } else {
            LevelRandomization::None
        }
    }
}

/// Replace the level order with a uniformly random permutation
pub fn shuffle_levels<T, R: Rng + ?Sized>(levels: &mut [T], rng: &mut R) {
    levels.shuffle(rng);
}

/// Move the levels before a random index `k` to the end, keeping their order
///
/// Afterwards `levels[i]` is the former `levels[(i + k) % len]`. Returns the
/// chosen `k`, or `None` for an empty list.
pub fn rotate_start_level<T, R: Rng + ?Sized>(levels: &mut [T], rng: &mut R) -> Option<usize> {
    if levels.is_empty() {
        return None;
    }
    let start = rng.random_range(0..levels.len());
    levels.rotate_left(start);
    Some(start)
}
