//! One trial, frame by frame.
//!
//! A [`TrialRun`] owns working copies of its definition's grids, so ramps and the
//! participant's adjustments never leak into the next trial.

use std::time::Duration;

use engine::app::InputFrame;
use tracing::debug;

use crate::catalog::TrialDefinition;
use crate::condition::{BlockType, StimulusFamily, TrialCondition};
use crate::config::{StimulusConfig, TimingConfig};
use crate::grid::{Aperture, Layer, Region, StimulusGrid};
use crate::phase_timer::PhaseTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    InterTrialNoise,
    Stimulus,
    Mask,
    CentreChange,
    InterStimulusNoise,
    Reproduction,
    Done,
}

impl TrialPhase {
    pub fn shows_noise(self) -> bool {
        matches!(
            self,
            TrialPhase::InterTrialNoise | TrialPhase::InterStimulusNoise
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialTiming {
    pub inter_trial: Duration,
    pub stimulus: Duration,
    pub mask: Duration,
    pub centre_change_wait: Duration,
    pub inter_stimulus: Duration,
    pub response_timeout: Option<Duration>,
}

impl TrialTiming {
    pub fn new(config: &TimingConfig, stimulus: Duration) -> Self {
        Self {
            inter_trial: config.inter_trial,
            stimulus,
            mask: config.mask,
            centre_change_wait: config.centre_change_wait,
            inter_stimulus: config.inter_stimulus,
            response_timeout: config.response_timeout,
        }
    }
}

/// How one scroll notch changes the reproduction grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub step: f32,
    pub min: f32,
    pub max: f32,
}

impl Adjustment {
    pub fn for_family(values: &StimulusConfig, family: StimulusFamily) -> Self {
        match family {
            StimulusFamily::Size => {
                let (min, max) = values.size_bounds();
                Self {
                    step: values.size_step,
                    min,
                    max,
                }
            }
            StimulusFamily::Colour => Self {
                step: values.opacity_step,
                min: 0.0,
                max: 1.0,
            },
        }
    }

    pub fn apply(&self, value: f32, notches: i32) -> f32 {
        (value + self.step * notches as f32).clamp(self.min, self.max)
    }
}

/// What the participant did in one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResponse {
    /// Seconds from centre change to click, rounded to 4 decimals.
    pub reaction_time: Option<f64>,
    pub reproduction: Option<f32>,
    pub uniformity_seen: bool,
}

#[derive(Debug, Clone)]
pub struct TrialRun {
    phase: TrialPhase,
    timer: PhaseTimer,
    block: BlockType,
    condition: TrialCondition,
    timing: TrialTiming,
    adjustment: Adjustment,
    centre: StimulusGrid,
    periphery: StimulusGrid,
    centre_new: StimulusGrid,
    catch_overlay: Option<StimulusGrid>,
    reproduction: StimulusGrid,
    /// Periphery size at the start and end of a size catch ramp.
    size_ramp: Option<(f32, f32)>,
    uniformity_seen: bool,
    reaction_time: Option<Duration>,
    reproduction_value: Option<f32>,
}

impl TrialRun {
    pub fn new(
        definition: &TrialDefinition,
        block: BlockType,
        timing: TrialTiming,
        values: &StimulusConfig,
    ) -> Self {
        let stimuli = definition.stimuli.clone();
        let condition = definition.condition;
        let size_ramp = (condition.is_catch() && condition.family() == StimulusFamily::Size)
            .then_some((stimuli.periphery.size, stimuli.centre.size));
        Self {
            phase: TrialPhase::InterTrialNoise,
            timer: PhaseTimer::new(timing.inter_trial),
            block,
            condition,
            timing,
            adjustment: Adjustment::for_family(values, condition.family()),
            centre: stimuli.centre,
            periphery: stimuli.periphery,
            centre_new: stimuli.centre_new,
            catch_overlay: stimuli.catch_overlay,
            reproduction: stimuli.reproduction,
            size_ramp,
            uniformity_seen: false,
            reaction_time: None,
            reproduction_value: None,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == TrialPhase::Done
    }

    pub fn condition(&self) -> TrialCondition {
        self.condition
    }

    pub fn elapsed_in_phase(&self) -> Duration {
        self.timer.elapsed()
    }

    pub fn uniformity_seen(&self) -> bool {
        self.uniformity_seen
    }

    pub fn periphery(&self) -> &StimulusGrid {
        &self.periphery
    }

    pub fn catch_overlay(&self) -> Option<&StimulusGrid> {
        self.catch_overlay.as_ref()
    }

    pub fn reproduction(&self) -> &StimulusGrid {
        &self.reproduction
    }

    /// The value the participant is adjusting: size for size trials, opacity for colour.
    pub fn reproduction_value(&self) -> f32 {
        match self.condition.family() {
            StimulusFamily::Size => self.reproduction.size,
            StimulusFamily::Colour => self.reproduction.opacity,
        }
    }

    /// Available once the trial is done.
    pub fn response(&self) -> Option<TrialResponse> {
        self.is_done().then(|| TrialResponse {
            reaction_time: self
                .reaction_time
                .map(|rt| (rt.as_secs_f64() * 10_000.0).round() / 10_000.0),
            reproduction: self.reproduction_value,
            uniformity_seen: self.uniformity_seen,
        })
    }

    /// Grids visible this frame, back to front.
    pub fn layers(&self) -> Vec<Layer<'_>> {
        let outside = Region::Outside(Aperture::CENTRE);
        let inside = Region::Inside(Aperture::CENTRE);
        let mut layers = Vec::with_capacity(3);
        match self.phase {
            TrialPhase::Stimulus => {
                layers.push(Layer::new(&self.periphery, outside));
                if let Some(overlay) = &self.catch_overlay {
                    layers.push(Layer::new(overlay, outside));
                }
                layers.push(Layer::new(&self.centre, inside));
            }
            TrialPhase::CentreChange => {
                layers.push(Layer::new(&self.periphery, outside));
                layers.push(Layer::new(&self.centre_new, inside));
            }
            TrialPhase::Reproduction => {
                if self.condition.family() == StimulusFamily::Colour {
                    layers.push(Layer::new(&self.periphery, outside));
                }
                layers.push(Layer::new(&self.reproduction, outside));
            }
            TrialPhase::InterTrialNoise
            | TrialPhase::Mask
            | TrialPhase::InterStimulusNoise
            | TrialPhase::Done => {}
        }
        layers
    }

    /// Advances by one frame. Returns the phase after the step.
    pub fn step(&mut self, input: &InputFrame, dt: Duration) -> TrialPhase {
        match self.phase {
            TrialPhase::InterTrialNoise => {
                self.timer.tick(dt);
                if self.timer.is_up() {
                    self.enter(TrialPhase::Stimulus);
                }
            }
            TrialPhase::Stimulus => {
                if input.mouse_down || input.mouse_held {
                    self.uniformity_seen = true;
                }
                self.timer.tick(dt);
                self.apply_catch_ramp(self.timer.progress());
                if self.timer.is_up() {
                    self.enter(TrialPhase::Mask);
                }
            }
            TrialPhase::Mask => {
                self.timer.tick(dt);
                if self.timer.is_up() {
                    self.enter(TrialPhase::CentreChange);
                }
            }
            TrialPhase::CentreChange => {
                self.timer.tick(dt);
                if self.block.measures_reaction_time() {
                    if input.mouse_down {
                        self.reaction_time = Some(self.timer.elapsed());
                        self.enter(TrialPhase::Done);
                    } else if self.timer.is_up() {
                        debug!(
                            timeout = ?self.timer.limit(),
                            "no response to the centre change"
                        );
                        self.enter(TrialPhase::Done);
                    }
                } else if self.timer.is_up() {
                    self.enter(TrialPhase::InterStimulusNoise);
                }
            }
            TrialPhase::InterStimulusNoise => {
                self.timer.tick(dt);
                if self.timer.is_up() {
                    self.enter(TrialPhase::Reproduction);
                }
            }
            TrialPhase::Reproduction => {
                let notches = input.wheel_notches();
                if notches != 0 {
                    self.adjust(notches);
                }
                if input.mouse_down {
                    self.reproduction_value = Some(self.reproduction_value());
                    self.enter(TrialPhase::Done);
                }
            }
            TrialPhase::Done => {}
        }
        self.phase
    }

    fn enter(&mut self, phase: TrialPhase) {
        let t = &self.timing;
        self.timer = match phase {
            TrialPhase::InterTrialNoise => PhaseTimer::new(t.inter_trial),
            TrialPhase::Stimulus => PhaseTimer::new(t.stimulus),
            TrialPhase::Mask => PhaseTimer::new(t.mask),
            TrialPhase::CentreChange if self.block.measures_reaction_time() => {
                PhaseTimer::open_ended(t.response_timeout)
            }
            TrialPhase::CentreChange => PhaseTimer::new(t.centre_change_wait),
            TrialPhase::InterStimulusNoise => PhaseTimer::new(t.inter_stimulus),
            TrialPhase::Reproduction | TrialPhase::Done => PhaseTimer::open_ended(None),
        };
        self.phase = phase;
    }

    fn apply_catch_ramp(&mut self, progress: f32) {
        if let Some((from, to)) = self.size_ramp {
            self.periphery.size = from + (to - from) * progress;
        }
        if let Some(overlay) = &mut self.catch_overlay {
            overlay.set_opacity(progress);
        }
    }

    fn adjust(&mut self, notches: i32) {
        let value = self.adjustment.apply(self.reproduction_value(), notches);
        match self.condition.family() {
            StimulusFamily::Size => self.reproduction.size = value,
            StimulusFamily::Colour => self.reproduction.set_opacity(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StimulusFactory;
    use crate::condition::{CentreChange, ColourPattern, SizeContrast, TrialKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const FRAME: Duration = Duration::from_millis(10);

    fn definition(condition: TrialCondition) -> TrialDefinition {
        let values = StimulusConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        StimulusFactory::new(&values, &mut rng)
            .unwrap()
            .definition(condition)
    }

    fn run(condition: TrialCondition, block: BlockType) -> TrialRun {
        let timing = TrialTiming::new(&TimingConfig::default(), Duration::from_secs(8));
        TrialRun::new(
            &definition(condition),
            block,
            timing,
            &StimulusConfig::default(),
        )
    }

    fn idle_until(trial: &mut TrialRun, phase: TrialPhase) -> usize {
        let idle = InputFrame::idle();
        let mut frames = 0;
        while trial.phase() != phase {
            trial.step(&idle, FRAME);
            frames += 1;
            assert!(frames < 10_000, "never reached {phase:?}");
        }
        frames
    }

    const SIZE_EXP: TrialCondition = TrialCondition::Size {
        kind: TrialKind::Experimental,
        contrast: SizeContrast::SmallCentre,
    };

    const COLOUR_CATCH: TrialCondition = TrialCondition::Colour {
        kind: TrialKind::Catch,
        pattern: ColourPattern::GreenOnRed,
        change: CentreChange::Fill,
    };

    #[test]
    fn phases_follow_configured_durations() {
        let mut trial = run(SIZE_EXP, BlockType::CentreFillReproduction);
        assert_eq!(idle_until(&mut trial, TrialPhase::Stimulus), 150);
        assert_eq!(idle_until(&mut trial, TrialPhase::Mask), 800);
        assert_eq!(idle_until(&mut trial, TrialPhase::CentreChange), 10);
        assert_eq!(idle_until(&mut trial, TrialPhase::InterStimulusNoise), 170);
        assert_eq!(idle_until(&mut trial, TrialPhase::Reproduction), 100);

        // Reproduction waits for a click however long it takes.
        for _ in 0..1000 {
            trial.step(&InputFrame::idle(), FRAME);
        }
        assert_eq!(trial.phase(), TrialPhase::Reproduction);
        trial.step(&InputFrame::click(), FRAME);
        assert!(trial.is_done());

        let response = trial.response().unwrap();
        assert_eq!(response.reaction_time, None);
        assert_eq!(response.reproduction, Some(StimulusConfig::default().reproduction_size()));
        assert!(!response.uniformity_seen);
    }

    #[test]
    fn reaction_block_records_time_to_click() {
        let mut trial = run(SIZE_EXP, BlockType::CentreFillReaction);
        idle_until(&mut trial, TrialPhase::CentreChange);
        for _ in 0..49 {
            trial.step(&InputFrame::idle(), FRAME);
        }
        trial.step(&InputFrame::click(), FRAME);
        let response = trial.response().expect("trial should be done");
        assert_eq!(response.reaction_time, Some(0.5));
        assert_eq!(response.reproduction, None);
    }

    #[test]
    fn reaction_block_can_time_out() {
        let mut timing = TrialTiming::new(&TimingConfig::default(), Duration::from_secs(8));
        timing.response_timeout = Some(Duration::from_secs(1));
        let mut trial = TrialRun::new(
            &definition(SIZE_EXP),
            BlockType::CentreFillReaction,
            timing,
            &StimulusConfig::default(),
        );
        idle_until(&mut trial, TrialPhase::CentreChange);
        assert_eq!(idle_until(&mut trial, TrialPhase::Done), 100);
        assert_eq!(trial.response().unwrap().reaction_time, None);
    }

    #[test]
    fn clicks_outside_the_stimulus_do_not_report_uniformity() {
        let mut trial = run(SIZE_EXP, BlockType::CentreFillReaction);
        trial.step(&InputFrame::click(), FRAME);
        idle_until(&mut trial, TrialPhase::Mask);
        assert!(!trial.uniformity_seen());

        let mut trial = run(SIZE_EXP, BlockType::CentreFillReaction);
        idle_until(&mut trial, TrialPhase::Stimulus);
        trial.step(&InputFrame::click(), FRAME);
        idle_until(&mut trial, TrialPhase::CentreChange);
        assert!(trial.uniformity_seen());
    }

    #[test]
    fn reproduction_clamps_at_bounds() {
        let values = StimulusConfig::default();
        let (min, max) = values.size_bounds();
        let mut trial = run(SIZE_EXP, BlockType::CentreFillReproduction);
        idle_until(&mut trial, TrialPhase::Reproduction);

        for _ in 0..100 {
            trial.step(&InputFrame::scroll(1.0), FRAME);
        }
        assert_eq!(trial.reproduction_value(), max);
        for _ in 0..100 {
            trial.step(&InputFrame::scroll(-1.0), FRAME);
        }
        assert_eq!(trial.reproduction_value(), min);

        let mut colour = run(
            TrialCondition::Colour {
                kind: TrialKind::Experimental,
                pattern: ColourPattern::BlueOnTeal,
                change: CentreChange::BlackOut,
            },
            BlockType::BlackOut,
        );
        idle_until(&mut colour, TrialPhase::Reproduction);
        colour.step(&InputFrame::scroll(60.0), FRAME);
        assert_eq!(colour.reproduction_value(), 1.0);
        colour.step(&InputFrame::scroll(-60.0), FRAME);
        assert_eq!(colour.reproduction_value(), 0.0);
        colour.step(&InputFrame::click(), FRAME);
        assert_eq!(colour.response().unwrap().reproduction, Some(0.0));
    }

    #[test]
    fn catch_overlay_ramps_in_during_stimulus() {
        let mut trial = run(COLOUR_CATCH, BlockType::CentreFillReproduction);
        idle_until(&mut trial, TrialPhase::Stimulus);
        assert_eq!(trial.catch_overlay().unwrap().opacity, 0.0);
        for _ in 0..400 {
            trial.step(&InputFrame::idle(), FRAME);
        }
        let halfway = trial.catch_overlay().unwrap().opacity;
        assert!((halfway - 0.5).abs() < 0.01, "overlay at {halfway}");
        idle_until(&mut trial, TrialPhase::Mask);
        assert_eq!(trial.catch_overlay().unwrap().opacity, 1.0);
    }

    #[test]
    fn size_catch_grows_periphery_to_centre_size() {
        let values = StimulusConfig::default();
        let mut trial = run(
            TrialCondition::Size {
                kind: TrialKind::Catch,
                contrast: SizeContrast::BigCentre,
            },
            BlockType::CentreFillReaction,
        );
        assert_eq!(trial.periphery().size, values.small_size);
        idle_until(&mut trial, TrialPhase::Mask);
        assert!((trial.periphery().size - values.big_size).abs() < 1e-6);
    }

    #[test]
    fn layers_split_centre_and_periphery() {
        let mut trial = run(COLOUR_CATCH, BlockType::CentreFillReproduction);
        assert!(trial.layers().is_empty());
        idle_until(&mut trial, TrialPhase::Stimulus);
        let regions: Vec<Region> = trial.layers().iter().map(|l| l.region).collect();
        assert_eq!(
            regions,
            vec![
                Region::Outside(Aperture::CENTRE),
                Region::Outside(Aperture::CENTRE),
                Region::Inside(Aperture::CENTRE),
            ]
        );
        idle_until(&mut trial, TrialPhase::Reproduction);
        assert_eq!(trial.layers().len(), 2);
    }
}
