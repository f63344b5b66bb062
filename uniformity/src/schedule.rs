//! Trial order and per-trial timing of a trial set.

use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::TrialDefinition;
use crate::catch::CatchAssignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOrder {
    Sequential,
    /// Each repetition is a fresh shuffle of the trial list.
    Random,
}

/// Where a trial falls in the schedule. All indices are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTrial {
    /// Index into the trial list.
    pub index: usize,
    pub repetition: u32,
    /// Position within its repetition.
    pub position: u32,
}

pub fn schedule<R: Rng + ?Sized>(
    trial_types: usize,
    repetitions: u32,
    order: TrialOrder,
    rng: &mut R,
) -> Vec<ScheduledTrial> {
    let mut trials = Vec::with_capacity(trial_types * repetitions as usize);
    for repetition in 0..repetitions {
        let mut indices: Vec<usize> = (0..trial_types).collect();
        if order == TrialOrder::Random {
            indices.shuffle(&mut *rng);
        }
        trials.extend(
            indices
                .into_iter()
                .enumerate()
                .map(|(position, index)| ScheduledTrial {
                    index,
                    repetition,
                    position: position as u32,
                }),
        );
    }
    trials
}

/// A trial that will run, with the stimulus duration it runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTrial {
    pub slot: ScheduledTrial,
    pub stimulus_duration: Duration,
    /// Shown for the short duration to probe how quickly the illusion is reported.
    pub latency_catch: bool,
}

/// Decides which scheduled trials run and for how long.
///
/// With a catch table, catch trial types only run on their designated repeats and
/// experimental types use the short duration on theirs. Without one every trial runs long.
pub fn plan(
    definitions: &[TrialDefinition],
    slots: &[ScheduledTrial],
    catches: Option<&CatchAssignment>,
    stimulus: Duration,
    latency_catch: Duration,
) -> Vec<PlannedTrial> {
    slots
        .iter()
        .filter_map(|&slot| {
            let Some(catches) = catches else {
                return Some(PlannedTrial {
                    slot,
                    stimulus_duration: stimulus,
                    latency_catch: false,
                });
            };
            let designated = catches.is_designated(slot.index, slot.repetition + 1);
            let is_catch = definitions
                .get(slot.index)
                .is_some_and(|d| d.condition.is_catch());
            match (is_catch, designated) {
                (true, false) => None,
                (true, true) | (false, false) => Some(PlannedTrial {
                    slot,
                    stimulus_duration: stimulus,
                    latency_catch: false,
                }),
                (false, true) => Some(PlannedTrial {
                    slot,
                    stimulus_duration: latency_catch,
                    latency_catch: true,
                }),
            }
        })
        .collect()
}
