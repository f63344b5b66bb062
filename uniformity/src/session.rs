//! The whole experiment as one context object, advanced once per frame.

use std::sync::Arc;
use std::time::Duration;

use engine::app::InputFrame;
use engine::{FrameControl, FrameLogic};
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, TrialDefinition};
use crate::catch::CatchAssignment;
use crate::condition::BlockType;
use crate::config::{ExperimentConfig, KeyBindings};
use crate::demo::{DemoOutcome, DemoState};
use crate::error::{ConfigError, Result};
use crate::noise::NoiseField;
use crate::recorder::{DataRecorder, TrialRecord};
use crate::schedule::{self, PlannedTrial, TrialOrder};
use crate::trial::{TrialResponse, TrialRun, TrialTiming};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    /// Short sequential run-through without catch trials.
    Practice,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    /// The quit key was pressed.
    Aborted,
    /// Data could not be written.
    Failed,
}

#[derive(Debug)]
pub struct TrialSet {
    kind: SetKind,
    definitions: Arc<[TrialDefinition]>,
    plan: Vec<PlannedTrial>,
    cursor: usize,
    current: Option<TrialRun>,
}

enum SetStep {
    Running,
    Completed(PlannedTrial, TrialResponse),
    Finished,
}

impl TrialSet {
    pub fn kind(&self) -> SetKind {
        self.kind
    }

    pub fn plan(&self) -> &[PlannedTrial] {
        &self.plan
    }

    /// Trials finished so far.
    pub fn completed(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&TrialRun> {
        self.current.as_ref()
    }

    fn step(
        &mut self,
        input: &InputFrame,
        dt: Duration,
        config: &ExperimentConfig,
        block: BlockType,
    ) -> SetStep {
        if self.current.is_none() {
            let Some(planned) = self.plan.get(self.cursor) else {
                return SetStep::Finished;
            };
            let definition = &self.definitions[planned.slot.index];
            debug!(
                index = planned.slot.index + 1,
                repetition = planned.slot.repetition + 1,
                condition = %definition.condition.tag_string(),
                latency_catch = planned.latency_catch,
                "trial started"
            );
            let timing = TrialTiming::new(&config.timing, planned.stimulus_duration);
            self.current = Some(TrialRun::new(
                definition,
                block,
                timing,
                &config.stimulus,
            ));
        }

        let Some(run) = self.current.as_mut() else {
            return SetStep::Finished;
        };
        run.step(input, dt);
        match run.response() {
            Some(response) => {
                let planned = self.plan[self.cursor];
                self.current = None;
                self.cursor += 1;
                SetStep::Completed(planned, response)
            }
            None => SetStep::Running,
        }
    }
}

#[derive(Debug)]
pub enum Screen {
    Welcome,
    Demo(DemoState),
    /// Waits for the experimenter before the block starts.
    SetupNotice,
    BlockIntro,
    Trials(TrialSet),
    PracticeComplete,
    EndOfBlock,
    Complete,
    Finished,
}

enum Next {
    Stay,
    Demo,
    SetupNotice,
    BlockIntro,
    StartSet(SetKind),
    PracticeComplete,
    EndOfBlock,
    NextBlock,
    Finish,
}

pub struct Session {
    config: ExperimentConfig,
    keys: KeyBindings,
    catalog: Catalog,
    participant: String,
    rng: StdRng,
    recorder: DataRecorder,
    noise: NoiseField,
    screen: Screen,
    block_index: usize,
    status: SessionStatus,
}

impl Session {
    pub fn new(
        config: ExperimentConfig,
        catalog: Catalog,
        participant: impl Into<String>,
        recorder: DataRecorder,
        mut rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        let keys = config.keys.resolve()?;
        if let Some(&missing) = config
            .blocks
            .iter()
            .find(|&&block| catalog.block(block).is_none())
        {
            return Err(ConfigError::NoTrials(missing).into());
        }
        let noise = NoiseField::new(&mut rng);
        Ok(Self {
            config,
            keys,
            catalog,
            participant: participant.into(),
            rng,
            recorder,
            noise,
            screen: Screen::Welcome,
            block_index: 0,
            status: SessionStatus::Running,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn keys(&self) -> KeyBindings {
        self.keys
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn recorder(&self) -> &DataRecorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> DataRecorder {
        self.recorder
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// 0-based position in the block list.
    pub fn block_index(&self) -> usize {
        self.block_index
    }

    pub fn current_block(&self) -> BlockType {
        block_at(&self.config, self.block_index)
    }

    pub fn trial_set(&self) -> Option<&TrialSet> {
        match &self.screen {
            Screen::Trials(set) => Some(set),
            _ => None,
        }
    }

    pub fn active_trial(&self) -> Option<&TrialRun> {
        self.trial_set().and_then(TrialSet::current)
    }

    fn update(&mut self, input: &InputFrame, dt: Duration) -> Result<FrameControl> {
        let advance = input.pressed(self.keys.advance);
        let on_advance = |next: Next| if advance { next } else { Next::Stay };

        let next = match &mut self.screen {
            Screen::Welcome => on_advance(Next::Demo),
            Screen::Demo(demo) => match demo.step(input, dt, advance) {
                DemoOutcome::Dismissed => Next::SetupNotice,
                DemoOutcome::Continue => Next::Stay,
            },
            Screen::SetupNotice => on_advance(Next::BlockIntro),
            Screen::BlockIntro => on_advance(Next::StartSet(SetKind::Practice)),
            Screen::Trials(set) => {
                let block = block_at(&self.config, self.block_index);
                let step = set.step(input, dt, &self.config, block);
                if set.current().is_some_and(|t| t.phase().shows_noise()) {
                    self.noise.advance();
                }
                match step {
                    SetStep::Running => Next::Stay,
                    SetStep::Completed(planned, response) => {
                        let definition = &set.definitions[planned.slot.index];
                        let record = TrialRecord {
                            participant: self.participant.clone(),
                            block_number: (set.kind == SetKind::Main)
                                .then_some(self.block_index as u32 + 1),
                            block_type: block,
                            trial_number: self.recorder.len() as u32 + 1,
                            trial_in_repetition: planned.slot.position + 1,
                            repetition: planned.slot.repetition + 1,
                            trial_index: planned.slot.index as u32 + 1,
                            condition: definition.condition,
                            latency_catch: planned.latency_catch,
                            reference_size: definition.reference_size(),
                            reference_opacity: definition.reference_opacity(),
                            reaction_time: response.reaction_time,
                            reproduction: response.reproduction,
                            uniformity_seen: response.uniformity_seen,
                        };
                        debug!(
                            trial = record.trial_number,
                            rt = ?record.reaction_time,
                            reproduction = ?record.reproduction,
                            uniformity = record.uniformity_seen,
                            "trial recorded"
                        );
                        self.recorder.record(record)?;
                        Next::Stay
                    }
                    SetStep::Finished => match set.kind {
                        SetKind::Practice => Next::PracticeComplete,
                        SetKind::Main => Next::EndOfBlock,
                    },
                }
            }
            Screen::PracticeComplete => on_advance(Next::StartSet(SetKind::Main)),
            Screen::EndOfBlock => on_advance(Next::NextBlock),
            Screen::Complete => on_advance(Next::Finish),
            Screen::Finished => return Ok(FrameControl::Exit),
        };
        self.apply(next)
    }

    fn apply(&mut self, next: Next) -> Result<FrameControl> {
        match next {
            Next::Stay => {}
            Next::Demo => {
                let block = self.current_block();
                info!(
                    block = %block,
                    number = self.block_index + 1,
                    of = self.config.blocks.len(),
                    "block instructions"
                );
                let demo = DemoState::new(
                    block,
                    self.config.stimulus.demo_opacity_step,
                    &mut self.rng,
                )?;
                self.screen = Screen::Demo(demo);
            }
            Next::SetupNotice => self.screen = Screen::SetupNotice,
            Next::BlockIntro => self.screen = Screen::BlockIntro,
            Next::StartSet(kind) => self.begin_set(kind),
            Next::PracticeComplete => self.screen = Screen::PracticeComplete,
            Next::EndOfBlock => {
                self.recorder.flush_csv()?;
                info!(block = %self.current_block(), rows = self.recorder.len(), "block finished");
                self.screen = Screen::EndOfBlock;
            }
            Next::NextBlock => {
                self.block_index += 1;
                if self.block_index < self.config.blocks.len() {
                    return self.apply(Next::Demo);
                }
                self.block_index = self.config.blocks.len() - 1;
                self.recorder.flush_csv()?;
                info!(
                    rows = self.recorder.len(),
                    csv = %self.recorder.csv_path().display(),
                    "experiment complete"
                );
                self.screen = Screen::Complete;
            }
            Next::Finish => {
                self.status = SessionStatus::Completed;
                self.screen = Screen::Finished;
                return Ok(FrameControl::Exit);
            }
        }
        Ok(FrameControl::Continue)
    }

    fn begin_set(&mut self, kind: SetKind) {
        let block = self.current_block();
        let Some(lists) = self.catalog.block(block) else {
            // Checked in `new`.
            return;
        };
        let (definitions, repetitions, order, catches) = match kind {
            SetKind::Practice => (
                Arc::clone(&lists.practice),
                self.config.practice_repetitions,
                TrialOrder::Sequential,
                None,
            ),
            SetKind::Main => {
                let table =
                    CatchAssignment::draw(lists.main.len(), self.config.repetitions, &mut self.rng);
                (
                    Arc::clone(&lists.main),
                    self.config.repetitions,
                    TrialOrder::Random,
                    Some(table),
                )
            }
        };

        let slots = schedule::schedule(definitions.len(), repetitions, order, &mut self.rng);
        let plan = schedule::plan(
            &definitions,
            &slots,
            catches.as_ref(),
            self.config.timing.stimulus,
            self.config.timing.latency_catch,
        );
        if kind == SetKind::Practice && plan.is_empty() {
            debug!(block = %block, "no practice trials");
            return self.begin_set(SetKind::Main);
        }

        info!(block = %block, set = ?kind, trials = plan.len(), "trial set started");
        self.screen = Screen::Trials(TrialSet {
            kind,
            definitions,
            plan,
            cursor: 0,
            current: None,
        });
    }
}

fn block_at(config: &ExperimentConfig, index: usize) -> BlockType {
    config.blocks[index.min(config.blocks.len().saturating_sub(1))]
}

impl FrameLogic for Session {
    fn advance(&mut self, input: &InputFrame, dt: Duration) -> FrameControl {
        if self.status != SessionStatus::Running {
            return FrameControl::Exit;
        }
        if input.pressed(self.keys.quit) {
            warn!(rows = self.recorder.len(), "session aborted with the quit key");
            self.status = SessionStatus::Aborted;
            return FrameControl::Exit;
        }
        match self.update(input, dt) {
            Ok(control) => control,
            Err(err) => {
                error!("session stopped: {err}");
                self.status = SessionStatus::Failed;
                FrameControl::Exit
            }
        }
    }
}
