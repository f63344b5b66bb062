//! The trial definitions each block draws from.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;

use crate::condition::{
    BlockType, CentreChange, ColourPattern, SizeContrast, StimulusFamily, TrialCondition,
    TrialKind,
};
use crate::config::StimulusConfig;
use crate::error::GridError;
use crate::grid::{ElementStyle, GridSpec, Rgb, StimulusGrid};

const SIZE_DOT: Rgb = Rgb([1.0, 1.0, 0.0]);
const REPRODUCTION_OPACITY: f32 = 0.5;

impl ColourPattern {
    pub fn centre(self) -> Rgb {
        match self {
            ColourPattern::GreenOnRed => Rgb([0.0, 1.0, 0.0]),
            ColourPattern::BlueOnTeal => Rgb([0.0, 0.0, 1.0]),
            ColourPattern::MagentaOnAmber => Rgb([1.0, 0.0, 1.0]),
        }
    }

    pub fn periphery(self) -> Rgb {
        match self {
            ColourPattern::GreenOnRed => Rgb([1.0, 0.0, 0.0]),
            ColourPattern::BlueOnTeal => Rgb([0.0, 0.75, 0.7]),
            ColourPattern::MagentaOnAmber => Rgb([0.91, 0.78, 0.0]),
        }
    }
}

/// The grids a trial shows, in the order it shows them.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialStimuli {
    pub centre: StimulusGrid,
    pub periphery: StimulusGrid,
    pub centre_new: StimulusGrid,
    /// Starting state of the adjustable grid; every run starts from this.
    pub reproduction: StimulusGrid,
    /// Centre-coloured copy of the periphery that fades in on colour catch trials.
    pub catch_overlay: Option<StimulusGrid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialDefinition {
    pub condition: TrialCondition,
    pub stimuli: TrialStimuli,
}

impl TrialDefinition {
    pub fn family(&self) -> StimulusFamily {
        self.condition.family()
    }

    /// Size of the dots the participant saw in the centre, for size trials.
    pub fn reference_size(&self) -> Option<f32> {
        match self.family() {
            StimulusFamily::Size => Some(self.stimuli.centre.size),
            StimulusFamily::Colour => None,
        }
    }

    /// Opacity of the centre, for colour trials.
    pub fn reference_opacity(&self) -> Option<f32> {
        match self.family() {
            StimulusFamily::Size => None,
            StimulusFamily::Colour => Some(self.stimuli.centre.opacity),
        }
    }
}

/// Builds [`TrialDefinition`]s on shared grid positions.
pub struct StimulusFactory<'a, R: Rng + ?Sized> {
    values: &'a StimulusConfig,
    size_xys: Arc<[[f32; 2]]>,
    colour_xys: Arc<[[f32; 2]]>,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> StimulusFactory<'a, R> {
    pub fn new(values: &'a StimulusConfig, rng: &'a mut R) -> Result<Self, GridError> {
        Ok(Self {
            values,
            size_xys: GridSpec::full_screen(StimulusFamily::Size).coords()?.into(),
            colour_xys: GridSpec::full_screen(StimulusFamily::Colour).coords()?.into(),
            rng,
        })
    }

    fn grid(&mut self, family: StimulusFamily, style: ElementStyle) -> StimulusGrid {
        let xys = match family {
            StimulusFamily::Size => Arc::clone(&self.size_xys),
            StimulusFamily::Colour => Arc::clone(&self.colour_xys),
        };
        StimulusGrid::new(xys, style, &mut *self.rng)
    }

    pub fn definition(&mut self, condition: TrialCondition) -> TrialDefinition {
        let stimuli = match condition {
            TrialCondition::Size { kind, contrast } => self.size_stimuli(kind, contrast),
            TrialCondition::Colour {
                kind,
                pattern,
                change,
            } => self.colour_stimuli(kind, pattern, change),
        };
        TrialDefinition { condition, stimuli }
    }

    fn size_stimuli(&mut self, kind: TrialKind, contrast: SizeContrast) -> TrialStimuli {
        let v = self.values;
        let (centre, periphery, centre_new) = match (kind, contrast) {
            // Catch trials ramp the periphery up to the centre, which stays put.
            (TrialKind::Catch, _) => (v.big_size, v.small_size, v.big_size),
            (TrialKind::Experimental, SizeContrast::BigCentre) => {
                (v.big_size, v.small_size, v.small_size)
            }
            (TrialKind::Experimental, SizeContrast::SmallCentre) => {
                (v.small_size, v.big_size, v.big_size)
            }
            (TrialKind::Experimental, SizeContrast::NoIllusion) => {
                (v.no_illusion_size, v.big_size, v.big_size)
            }
        };
        let family = StimulusFamily::Size;
        TrialStimuli {
            centre: self.grid(family, ElementStyle::dots(centre, SIZE_DOT)),
            periphery: self.grid(family, ElementStyle::dots(periphery, SIZE_DOT)),
            centre_new: self.grid(family, ElementStyle::dots(centre_new, SIZE_DOT)),
            reproduction: self.grid(family, ElementStyle::dots(v.reproduction_size(), SIZE_DOT)),
            catch_overlay: None,
        }
    }

    fn colour_stimuli(
        &mut self,
        kind: TrialKind,
        pattern: ColourPattern,
        change: CentreChange,
    ) -> TrialStimuli {
        let size = self.values.colour_size;
        let family = StimulusFamily::Colour;
        let centre_new = match change {
            CentreChange::Fill => ElementStyle::dots(size, pattern.periphery()),
            CentreChange::BlackOut => ElementStyle::dots(size, Rgb::BLACK),
        };
        let catch_overlay = match kind {
            TrialKind::Catch => Some(self.grid(
                family,
                ElementStyle::dots(size, pattern.centre()).with_opacity(0.0),
            )),
            TrialKind::Experimental => None,
        };
        TrialStimuli {
            centre: self.grid(family, ElementStyle::dots(size, pattern.centre())),
            periphery: self.grid(family, ElementStyle::dots(size, pattern.periphery())),
            centre_new: self.grid(family, centre_new),
            reproduction: self.grid(
                family,
                ElementStyle::dots(size, pattern.centre()).with_opacity(REPRODUCTION_OPACITY),
            ),
            catch_overlay,
        }
    }
}

/// Practice and main trial lists of one block type.
#[derive(Debug, Clone)]
pub struct BlockCatalog {
    pub practice: Arc<[TrialDefinition]>,
    pub main: Arc<[TrialDefinition]>,
}

impl BlockCatalog {
    pub fn new(practice: Vec<TrialDefinition>, main: Vec<TrialDefinition>) -> Self {
        Self {
            practice: practice.into(),
            main: main.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    blocks: HashMap<BlockType, BlockCatalog>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The experiment's trial lists for every block type.
    pub fn standard<R: Rng + ?Sized>(
        values: &StimulusConfig,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        let mut factory = StimulusFactory::new(values, rng)?;
        let mut catalog = Self::empty();
        for block in [
            BlockType::CentreFillReaction,
            BlockType::CentreFillReproduction,
            BlockType::BlackOut,
        ] {
            let practice = practice_conditions(block)
                .into_iter()
                .map(|c| factory.definition(c))
                .collect();
            let main = main_conditions(block)
                .into_iter()
                .map(|c| factory.definition(c))
                .collect();
            catalog = catalog.with_block(block, BlockCatalog::new(practice, main));
        }
        Ok(catalog)
    }

    pub fn with_block(mut self, block: BlockType, lists: BlockCatalog) -> Self {
        self.blocks.insert(block, lists);
        self
    }

    pub fn block(&self, block: BlockType) -> Option<&BlockCatalog> {
        self.blocks.get(&block)
    }
}

pub fn practice_conditions(block: BlockType) -> Vec<TrialCondition> {
    match block.centre_change() {
        CentreChange::Fill => vec![
            TrialCondition::Size {
                kind: TrialKind::Experimental,
                contrast: SizeContrast::SmallCentre,
            },
            colour(TrialKind::Experimental, ColourPattern::BlueOnTeal, CentreChange::Fill),
        ],
        CentreChange::BlackOut => vec![
            colour(
                TrialKind::Experimental,
                ColourPattern::GreenOnRed,
                CentreChange::BlackOut,
            ),
            colour(
                TrialKind::Experimental,
                ColourPattern::BlueOnTeal,
                CentreChange::BlackOut,
            ),
        ],
    }
}

pub fn main_conditions(block: BlockType) -> Vec<TrialCondition> {
    let change = block.centre_change();
    let mut conditions = Vec::new();
    if change == CentreChange::Fill {
        for contrast in [
            SizeContrast::BigCentre,
            SizeContrast::SmallCentre,
            SizeContrast::NoIllusion,
        ] {
            conditions.push(TrialCondition::Size {
                kind: TrialKind::Experimental,
                contrast,
            });
        }
        conditions.push(TrialCondition::Size {
            kind: TrialKind::Catch,
            contrast: SizeContrast::BigCentre,
        });
    }
    use ColourPattern::*;
    for pattern in [GreenOnRed, BlueOnTeal, MagentaOnAmber] {
        conditions.push(colour(TrialKind::Experimental, pattern, change));
    }
    for pattern in [BlueOnTeal, GreenOnRed, MagentaOnAmber] {
        conditions.push(colour(TrialKind::Catch, pattern, change));
    }
    conditions
}

fn colour(kind: TrialKind, pattern: ColourPattern, change: CentreChange) -> TrialCondition {
    TrialCondition::Colour {
        kind,
        pattern,
        change,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog() -> Catalog {
        let mut rng = StdRng::seed_from_u64(3);
        Catalog::standard(&StimulusConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn block_lists_have_expected_lengths() {
        let catalog = catalog();
        let fill = catalog.block(BlockType::CentreFillReaction).unwrap();
        assert_eq!(fill.practice.len(), 2);
        assert_eq!(fill.main.len(), 10);
        let black = catalog.block(BlockType::BlackOut).unwrap();
        assert_eq!(black.main.len(), 6);
        assert!(black.main.iter().all(|d| d.family() == StimulusFamily::Colour));
    }

    #[test]
    fn blackout_centre_goes_black() {
        let catalog = catalog();
        let black = catalog.block(BlockType::BlackOut).unwrap();
        for def in black.main.iter().chain(black.practice.iter()) {
            assert_eq!(def.stimuli.centre_new.colour, Rgb::BLACK);
        }
    }

    #[test]
    fn colour_catch_trials_carry_a_hidden_overlay() {
        let catalog = catalog();
        let fill = catalog.block(BlockType::CentreFillReproduction).unwrap();
        for def in fill.main.iter() {
            let overlay = def.stimuli.catch_overlay.as_ref();
            match (def.family(), def.condition.is_catch()) {
                (StimulusFamily::Colour, true) => {
                    let overlay = overlay.expect("colour catch needs an overlay");
                    assert_eq!(overlay.opacity, 0.0);
                    assert_eq!(overlay.colour, def.stimuli.centre.colour);
                }
                _ => assert!(overlay.is_none()),
            }
        }
    }

    #[test]
    fn reference_values_follow_family() {
        let values = StimulusConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut factory = StimulusFactory::new(&values, &mut rng).unwrap();

        let shrinking = factory.definition(TrialCondition::Size {
            kind: TrialKind::Experimental,
            contrast: SizeContrast::BigCentre,
        });
        assert_eq!(shrinking.reference_size(), Some(values.big_size));
        assert_eq!(shrinking.reference_opacity(), None);
        assert_eq!(shrinking.stimuli.centre_new.size, values.small_size);

        let no_ui = factory.definition(TrialCondition::Size {
            kind: TrialKind::Experimental,
            contrast: SizeContrast::NoIllusion,
        });
        assert_eq!(no_ui.reference_size(), Some(values.no_illusion_size));

        let colour = factory.definition(colour(
            TrialKind::Experimental,
            ColourPattern::GreenOnRed,
            CentreChange::Fill,
        ));
        assert_eq!(colour.reference_size(), None);
        assert_eq!(colour.reference_opacity(), Some(1.0));
        assert_eq!(colour.stimuli.centre_new.colour, ColourPattern::GreenOnRed.periphery());
        assert_eq!(colour.stimuli.reproduction.opacity, REPRODUCTION_OPACITY);
    }
}
