use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::index;

/// Which repeats of each trial type are catch trials in one main block.
///
/// Repeats are numbered from 1. Every trial type gets exactly `repetitions / 3` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchAssignment {
    repetitions: u32,
    designated: Vec<BTreeSet<u32>>,
}

impl CatchAssignment {
    pub fn draw<R: Rng + ?Sized>(trial_types: usize, repetitions: u32, rng: &mut R) -> Self {
        let per_type = (repetitions / 3) as usize;
        let designated = (0..trial_types)
            .map(|_| {
                index::sample(&mut *rng, repetitions as usize, per_type)
                    .into_iter()
                    .map(|i| i as u32 + 1)
                    .collect()
            })
            .collect();
        Self {
            repetitions,
            designated,
        }
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    pub fn trial_types(&self) -> usize {
        self.designated.len()
    }

    /// Designated repeats of the trial type at `index` (0-based).
    pub fn designated(&self, index: usize) -> Option<&BTreeSet<u32>> {
        self.designated.get(index)
    }

    pub fn is_designated(&self, index: usize, repeat: u32) -> bool {
        self.designated
            .get(index)
            .is_some_and(|set| set.contains(&repeat))
    }
}
