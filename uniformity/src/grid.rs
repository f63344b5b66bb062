//! Dot grids and the apertures that split them into centre and periphery.

use std::sync::Arc;

use rand::Rng;

use crate::condition::StimulusFamily;
use crate::error::GridError;

/// A colour with channels in `[-1, 1]`; `0` is mid grey and `-1` black.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([-1.0, -1.0, -1.0]);
    pub const WHITE: Rgb = Rgb([1.0, 1.0, 1.0]);

    pub fn to_rgba8(self) -> [u8; 4] {
        let [r, g, b] = self.0.map(signed_to_u8);
        [r, g, b, 255]
    }
}

pub fn signed_to_u8(v: f32) -> u8 {
    (((v.clamp(-1.0, 1.0) + 1.0) * 0.5) * 255.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementMask {
    Circle,
    Square,
    /// Gaussian blob fading out towards the element's edge.
    Gauss,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    Fixed(f32),
    /// A random whole number of degrees in `0..80`, drawn per element.
    Random,
}

/// Where grid points go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Size grids stagger every other row.
    pub family: StimulusFamily,
    pub columns: u32,
    pub rows: u32,
    pub x_start: f32,
    pub x_end: f32,
    pub y_start: f32,
    pub y_end: f32,
}

impl GridSpec {
    /// The full-screen grid used by the experiment trials.
    pub fn full_screen(family: StimulusFamily) -> Self {
        Self {
            family,
            columns: 18,
            rows: 12,
            x_start: -0.95,
            x_end: 0.975,
            y_start: 0.95,
            y_end: -1.05,
        }
    }

    /// The small grid shown under the instructions.
    pub fn demo() -> Self {
        Self {
            family: StimulusFamily::Colour,
            columns: 10,
            rows: 8,
            x_start: -0.3,
            x_end: 0.3,
            y_start: -0.2,
            y_end: -0.75,
        }
    }

    fn validate(&self) -> Result<(), GridError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(GridError::Empty {
                columns: self.columns,
                rows: self.rows,
            });
        }
        let bounds = [self.x_start, self.x_end, self.y_start, self.y_end];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(GridError::NonFinite);
        }
        if self.x_start == self.x_end {
            return Err(GridError::ZeroLength { axis: 'x' });
        }
        if self.y_start == self.y_end {
            return Err(GridError::ZeroLength { axis: 'y' });
        }
        if self.x_start > self.x_end {
            return Err(GridError::Direction {
                axis: 'x',
                start: self.x_start,
                end: self.x_end,
            });
        }
        if self.y_start < self.y_end {
            return Err(GridError::Direction {
                axis: 'y',
                start: self.y_start,
                end: self.y_end,
            });
        }
        Ok(())
    }

    pub fn x_step(&self) -> f32 {
        (self.x_start.abs() + self.x_end.abs()) / self.columns as f32
    }

    pub fn y_step(&self) -> f32 {
        (self.y_start - self.y_end).abs() / self.rows as f32
    }

    /// Grid points in norm units, column by column from the top left.
    pub fn coords(&self) -> Result<Vec<[f32; 2]>, GridError> {
        self.validate()?;
        let x_step = self.x_step();
        let y_step = self.y_step();

        // Colour grids include the right edge, size grids stop short of it.
        let x_count = match self.family {
            StimulusFamily::Colour => self.columns + 1,
            StimulusFamily::Size => self.columns,
        };
        let stagger = match self.family {
            StimulusFamily::Size => 0.7 * x_step,
            StimulusFamily::Colour => 0.0,
        };

        let mut coords = Vec::with_capacity((x_count * self.rows) as usize);
        for col in 0..x_count {
            let x = self.x_start + col as f32 * x_step;
            for row in 0..self.rows {
                let y = self.y_start - row as f32 * y_step;
                let shift = if row % 2 == 1 { stagger } else { 0.0 };
                coords.push([x + shift, y]);
            }
        }
        Ok(coords)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementStyle {
    pub opacity: f32,
    /// Element height in norm units.
    pub size: f32,
    pub colour: Rgb,
    pub mask: ElementMask,
    pub orientation: Orientation,
}

impl ElementStyle {
    pub fn dots(size: f32, colour: Rgb) -> Self {
        Self {
            opacity: 1.0,
            size,
            colour,
            mask: ElementMask::Circle,
            orientation: Orientation::Fixed(0.0),
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

/// A set of identical elements at fixed positions.
///
/// Positions and orientations are shared between clones; opacity, size and colour are
/// per-instance so a trial can animate its own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusGrid {
    xys: Arc<[[f32; 2]]>,
    orientations: Arc<[f32]>,
    pub opacity: f32,
    pub size: f32,
    pub colour: Rgb,
    pub mask: ElementMask,
}

impl StimulusGrid {
    pub fn new<R: Rng + ?Sized>(xys: Arc<[[f32; 2]]>, style: ElementStyle, rng: &mut R) -> Self {
        let orientations: Arc<[f32]> = match style.orientation {
            Orientation::Fixed(deg) => vec![deg; xys.len()].into(),
            Orientation::Random => (0..xys.len())
                .map(|_| rng.gen_range(0..80) as f32)
                .collect(),
        };
        Self {
            xys,
            orientations,
            opacity: style.opacity.clamp(0.0, 1.0),
            size: style.size,
            colour: style.colour,
            mask: style.mask,
        }
    }

    pub fn build<R: Rng + ?Sized>(
        spec: &GridSpec,
        style: ElementStyle,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        Ok(Self::new(spec.coords()?.into(), style, rng))
    }

    pub fn len(&self) -> usize {
        self.xys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xys.is_empty()
    }

    pub fn xys(&self) -> &[[f32; 2]] {
        &self.xys
    }

    pub fn orientations(&self) -> &[f32] {
        &self.orientations
    }

    /// Same positions, different look.
    pub fn restyled(&self, size: f32, colour: Rgb, opacity: f32) -> Self {
        Self {
            size,
            colour,
            opacity: opacity.clamp(0.0, 1.0),
            ..self.clone()
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && !self.is_empty()
    }
}

/// A rectangular window in norm units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aperture {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl Aperture {
    /// Splits the trial screen into centre and periphery.
    pub const CENTRE: Aperture = Aperture {
        cx: 0.0,
        cy: 0.0,
        w: 0.97,
        h: 1.0,
    };

    /// The centre of the instruction demo grid.
    pub const DEMO: Aperture = Aperture {
        cx: 0.0,
        cy: -0.475,
        w: 0.3,
        h: 0.3,
    };

    pub fn contains(&self, x: f32, y: f32) -> bool {
        (x - self.cx).abs() <= self.w * 0.5 && (y - self.cy).abs() <= self.h * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    Everywhere,
    Inside(Aperture),
    Outside(Aperture),
}

/// One grid to draw this frame, restricted to a region of the screen.
#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    pub grid: &'a StimulusGrid,
    pub region: Region,
}

impl<'a> Layer<'a> {
    pub fn new(grid: &'a StimulusGrid, region: Region) -> Self {
        Self { grid, region }
    }
}
