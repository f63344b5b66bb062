//! The small looping example shown with each block's instructions.

use std::time::Duration;

use engine::app::InputFrame;
use rand::Rng;

use crate::condition::{BlockType, CentreChange};
use crate::error::GridError;
use crate::grid::{Aperture, ElementStyle, GridSpec, Layer, Region, Rgb, StimulusGrid};

const DEMO_DOT_SIZE: f32 = 0.045;
const CENTRE_CHANGES_AT: Duration = Duration::from_secs(4);
const PERIPHERY_ENDS_AT: Duration = Duration::from_secs(7);
const LOOP_LENGTH: Duration = Duration::from_millis(7500);
const ADJUST_START_OPACITY: f32 = 0.5;

/// The "Ok, got it!" button, in norm units.
pub const BUTTON: Aperture = Aperture {
    cx: 0.7,
    cy: -0.7,
    w: 0.2,
    h: 0.1,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoStage {
    /// The example loops: centre, centre change, blank, again.
    Viewing,
    /// The participant scrolls the centre colour's opacity over the periphery.
    Adjusting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoOutcome {
    Continue,
    Dismissed,
}

#[derive(Debug, Clone)]
pub struct DemoState {
    block: BlockType,
    stage: DemoStage,
    clock: Duration,
    periphery: StimulusGrid,
    centre: StimulusGrid,
    /// Centre colour laid over the whole demo grid while adjusting.
    overlay: StimulusGrid,
    step: f32,
}

impl DemoState {
    pub fn new<R: Rng + ?Sized>(
        block: BlockType,
        opacity_step: f32,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        let xys: std::sync::Arc<[[f32; 2]]> = GridSpec::demo().coords()?.into();
        let green = Rgb([0.0, 1.0, 0.0]);
        let red = Rgb([1.0, 0.0, 0.0]);
        let centre = StimulusGrid::new(
            xys.clone(),
            ElementStyle::dots(DEMO_DOT_SIZE, green),
            &mut *rng,
        );
        let overlay = centre.restyled(DEMO_DOT_SIZE, green, ADJUST_START_OPACITY);
        Ok(Self {
            block,
            stage: DemoStage::Viewing,
            clock: Duration::ZERO,
            periphery: StimulusGrid::new(xys, ElementStyle::dots(DEMO_DOT_SIZE, red), &mut *rng),
            centre,
            overlay,
            step: opacity_step,
        })
    }

    pub fn block(&self) -> BlockType {
        self.block
    }

    pub fn stage(&self) -> DemoStage {
        self.stage
    }

    pub fn overlay_opacity(&self) -> f32 {
        self.overlay.opacity
    }

    pub fn step(&mut self, input: &InputFrame, dt: Duration, advance_pressed: bool) -> DemoOutcome {
        if input.mouse_down
            && input
                .mouse_norm
                .is_some_and(|(x, y)| BUTTON.contains(x, y))
        {
            return DemoOutcome::Dismissed;
        }

        match self.stage {
            DemoStage::Viewing => {
                self.clock = self.clock.saturating_add(dt);
                if self.clock > LOOP_LENGTH {
                    self.clock = Duration::ZERO;
                }
                if advance_pressed && self.block.has_reproduction() {
                    self.overlay.set_opacity(ADJUST_START_OPACITY);
                    self.stage = DemoStage::Adjusting;
                }
            }
            DemoStage::Adjusting => {
                let notches = input.wheel_notches();
                if notches != 0 {
                    let value = self.overlay.opacity + self.step * notches as f32;
                    self.overlay.set_opacity(value);
                }
                if advance_pressed {
                    self.clock = Duration::ZERO;
                    self.stage = DemoStage::Viewing;
                }
            }
        }
        DemoOutcome::Continue
    }

    /// Grids visible this frame, back to front.
    pub fn layers(&self) -> Vec<Layer<'_>> {
        let outside = Region::Outside(Aperture::DEMO);
        let inside = Region::Inside(Aperture::DEMO);
        let mut layers = Vec::with_capacity(2);
        match self.stage {
            DemoStage::Adjusting => {
                layers.push(Layer::new(&self.periphery, outside));
                layers.push(Layer::new(&self.overlay, outside));
            }
            DemoStage::Viewing if !self.block.has_reproduction() => {
                if self.clock < PERIPHERY_ENDS_AT {
                    layers.push(Layer::new(&self.periphery, Region::Everywhere));
                }
            }
            DemoStage::Viewing => {
                if self.clock < PERIPHERY_ENDS_AT {
                    layers.push(Layer::new(&self.periphery, outside));
                }
                if self.clock < CENTRE_CHANGES_AT {
                    layers.push(Layer::new(&self.centre, inside));
                } else if self.clock < PERIPHERY_ENDS_AT
                    && self.block.centre_change() == CentreChange::Fill
                {
                    layers.push(Layer::new(&self.periphery, inside));
                }
            }
        }
        layers
    }
}
