//! Typed trial conditions.
//!
//! Everything a trial shows follows from its [`TrialCondition`]; the tag strings written to the
//! data file are derived from it only when a row is recorded.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    /// Click as soon as the centre changes.
    #[serde(rename = "centFill_RT")]
    CentreFillReaction,
    /// Watch the centre change, then reproduce the centre.
    #[serde(rename = "centFill_Repro")]
    CentreFillReproduction,
    /// The centre goes black; reproduce what was seen before.
    #[serde(rename = "blackOut")]
    BlackOut,
}

impl BlockType {
    pub fn label(self) -> &'static str {
        match self {
            BlockType::CentreFillReaction => "centFill_RT",
            BlockType::CentreFillReproduction => "centFill_Repro",
            BlockType::BlackOut => "blackOut",
        }
    }

    pub fn measures_reaction_time(self) -> bool {
        matches!(self, BlockType::CentreFillReaction)
    }

    pub fn has_reproduction(self) -> bool {
        !self.measures_reaction_time()
    }

    pub fn centre_change(self) -> CentreChange {
        match self {
            BlockType::BlackOut => CentreChange::BlackOut,
            _ => CentreChange::Fill,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StimulusFamily {
    Size,
    Colour,
}

impl StimulusFamily {
    pub fn label(self) -> &'static str {
        match self {
            StimulusFamily::Size => "Size",
            StimulusFamily::Colour => "Colour",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialKind {
    Experimental,
    /// The illusion is forced by ramping the periphery into the centre.
    Catch,
}

/// Centre and periphery colours of a colour trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColourPattern {
    /// Green centre, red periphery.
    GreenOnRed,
    /// Blue centre, teal periphery.
    BlueOnTeal,
    /// Magenta centre, amber periphery.
    MagentaOnAmber,
}

impl ColourPattern {
    pub fn label(self) -> &'static str {
        match self {
            ColourPattern::GreenOnRed => "010",
            ColourPattern::BlueOnTeal => "001",
            ColourPattern::MagentaOnAmber => "101",
        }
    }
}

/// Centre and periphery dot sizes of a size trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeContrast {
    /// Big centre dots in small periphery dots; the centre fills in small.
    BigCentre,
    /// Small centre dots in big periphery dots; the centre fills in big.
    SmallCentre,
    /// Centre dots too small to fill in.
    NoIllusion,
}

impl SizeContrast {
    pub fn label(self) -> &'static str {
        match self {
            SizeContrast::BigCentre => "Cent_small",
            SizeContrast::SmallCentre => "Cent_big",
            SizeContrast::NoIllusion => "no_UI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CentreChange {
    /// The centre takes on the periphery's value.
    Fill,
    /// The centre disappears.
    BlackOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialCondition {
    Size {
        kind: TrialKind,
        contrast: SizeContrast,
    },
    Colour {
        kind: TrialKind,
        pattern: ColourPattern,
        change: CentreChange,
    },
}

impl TrialCondition {
    pub fn family(&self) -> StimulusFamily {
        match self {
            TrialCondition::Size { .. } => StimulusFamily::Size,
            TrialCondition::Colour { .. } => StimulusFamily::Colour,
        }
    }

    pub fn kind(&self) -> TrialKind {
        match *self {
            TrialCondition::Size { kind, .. } | TrialCondition::Colour { kind, .. } => kind,
        }
    }

    pub fn is_catch(&self) -> bool {
        self.kind() == TrialKind::Catch
    }

    pub fn is_experimental(&self) -> bool {
        self.kind() == TrialKind::Experimental
    }

    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags = Vec::with_capacity(3);
        tags.push(match self.kind() {
            TrialKind::Experimental => "Exp",
            TrialKind::Catch => "Catch",
        });
        match *self {
            TrialCondition::Size { kind, contrast } => {
                // Size catch trials are all of one contrast and only carry the kind.
                if kind == TrialKind::Experimental {
                    tags.push(contrast.label());
                }
            }
            TrialCondition::Colour {
                pattern, change, ..
            } => {
                tags.push(pattern.label());
                if change == CentreChange::BlackOut {
                    tags.push("blackOut");
                }
            }
        }
        tags
    }

    pub fn tag_string(&self) -> String {
        self.tags().join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_follow_condition() {
        let size = TrialCondition::Size {
            kind: TrialKind::Experimental,
            contrast: SizeContrast::BigCentre,
        };
        assert_eq!(size.tag_string(), "Exp|Cent_small");

        let size_catch = TrialCondition::Size {
            kind: TrialKind::Catch,
            contrast: SizeContrast::BigCentre,
        };
        assert_eq!(size_catch.tag_string(), "Catch");

        let colour = TrialCondition::Colour {
            kind: TrialKind::Catch,
            pattern: ColourPattern::MagentaOnAmber,
            change: CentreChange::BlackOut,
        };
        assert_eq!(colour.tag_string(), "Catch|101|blackOut");
        assert_eq!(colour.family(), StimulusFamily::Colour);
        assert!(colour.is_catch());
    }

    #[test]
    fn only_reaction_blocks_skip_reproduction() {
        assert!(!BlockType::CentreFillReaction.has_reproduction());
        assert!(BlockType::CentreFillReproduction.has_reproduction());
        assert_eq!(BlockType::BlackOut.centre_change(), CentreChange::BlackOut);
        assert_eq!(
            BlockType::CentreFillReaction.centre_change(),
            CentreChange::Fill
        );
    }
}
