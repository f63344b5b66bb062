use crate::{surface::SurfaceSize, ui::Rect};

pub type Color = [u8; 4];

pub const BLACK: Color = [0, 0, 0, 255];
pub const WHITE: Color = [255, 255, 255, 255];

// 3x5 block font, one row per 3 bits, top row in the high bits.
pub const DEFAULT_TEXT_SCALE: u32 = 3;
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

fn glyph_advance_x(scale: u32) -> u32 {
    (GLYPH_W + 1) * scale.max(1)
}

fn line_advance_y(scale: u32) -> u32 {
    (GLYPH_H + 2) * scale.max(1)
}

/// Pixel extent of `text` (multi-line) at `scale`.
pub fn text_extent(text: &str, scale: u32) -> (u32, u32) {
    let mut widest = 0u32;
    let mut lines = 0u32;
    for line in text.split('\n') {
        lines += 1;
        let chars = line.chars().count() as u32;
        widest = widest.max(chars.saturating_mul(glyph_advance_x(scale)));
    }
    (widest, lines.saturating_mul(line_advance_y(scale)))
}

/// Which pixels a draw call may touch.
///
/// `Outside` is an inverted aperture: everything except the rect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clip {
    #[default]
    None,
    Inside(Rect),
    Outside(Rect),
}

impl Clip {
    pub fn allows(&self, x: u32, y: u32) -> bool {
        match self {
            Clip::None => true,
            Clip::Inside(r) => r.contains(x, y),
            Clip::Outside(r) => !r.contains(x, y),
        }
    }
}

/// Unified 2D rendering interface.
///
/// Coordinates are pixels with the origin at the top-left corner.
pub trait Renderer2d {
    fn begin_frame(&mut self, size: SurfaceSize);
    fn size(&self) -> SurfaceSize;

    fn set_clip(&mut self, clip: Clip);
    fn clip(&self) -> Clip;

    /// Opaque fill.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Alpha-blended rect over existing content.
    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8);

    /// Axis-aligned filled ellipse centred on `(cx, cy)`.
    fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Color, alpha: u8);

    /// Ellipse whose alpha falls off with a gaussian profile from the centre.
    fn fill_soft_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Color, alpha: u8);

    /// Rect rotated clockwise by `degrees` around its centre.
    fn fill_rotated_rect(
        &mut self,
        cx: f32,
        cy: f32,
        half_w: f32,
        half_h: f32,
        degrees: f32,
        color: Color,
        alpha: u8,
    );

    fn draw_text_scaled(&mut self, x: u32, y: u32, text: &str, color: Color, scale: u32);

    fn draw_text(&mut self, x: u32, y: u32, text: &str, color: Color) {
        self.draw_text_scaled(x, y, text, color, DEFAULT_TEXT_SCALE);
    }

    /// Fills the whole surface, ignoring the clip region.
    fn clear(&mut self, color: Color) {
        let previous = self.clip();
        self.set_clip(Clip::None);
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
        self.set_clip(previous);
    }
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
    clip: Clip,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self {
            frame,
            size,
            clip: Clip::None,
        }
    }

    fn buffer_ok(&self) -> bool {
        let expected = self.size.rgba_len();
        expected != 0 && self.frame.len() >= expected
    }

    fn blend_px(&mut self, x: u32, y: u32, color: Color, alpha: u8) {
        if alpha == 0 || x >= self.size.width || y >= self.size.height {
            return;
        }
        if !self.clip.allows(x, y) {
            return;
        }
        let idx = ((y as usize) * (self.size.width as usize) + x as usize) * 4;
        let Some(px) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };
        blend_into(px, color, alpha);
    }

    /// Pixel bounds `[x0, x1) x [y0, y1)` covering a centred box, clamped to the surface.
    fn bounds(&self, cx: f32, cy: f32, rx: f32, ry: f32) -> Option<(u32, u32, u32, u32)> {
        if !(rx > 0.0 && ry > 0.0) || !cx.is_finite() || !cy.is_finite() {
            return None;
        }
        let x0 = (cx - rx).floor().max(0.0) as u32;
        let y0 = (cy - ry).floor().max(0.0) as u32;
        let x1 = ((cx + rx).ceil().max(0.0) as u32).min(self.size.width);
        let y1 = ((cy + ry).ceil().max(0.0) as u32).min(self.size.height);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

fn blend_into(px: &mut [u8], color: Color, alpha: u8) {
    if alpha == 255 {
        px.copy_from_slice(&color);
        return;
    }
    let a = alpha as u32;
    let inv = 255 - a;
    for c in 0..3 {
        px[c] = ((px[c] as u32 * inv + color[c] as u32 * a + 127) / 255) as u8;
    }
    px[3] = 255;
}

impl Renderer2d for CpuRenderer<'_> {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
        self.clip = Clip::None;
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn set_clip(&mut self, clip: Clip) {
        self.clip = clip;
    }

    fn clip(&self) -> Clip {
        self.clip
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.blend_rect(rect, color, 255);
    }

    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        if alpha == 0 || !self.buffer_ok() {
            return;
        }
        let max_x = rect.x.saturating_add(rect.w).min(self.size.width);
        let max_y = rect.y.saturating_add(rect.h).min(self.size.height);
        if rect.x >= max_x || rect.y >= max_y {
            return;
        }

        let stride = self.size.width as usize * 4;
        for y in rect.y..max_y {
            let row_start = y as usize * stride;
            if self.clip == Clip::None {
                let start = row_start + rect.x as usize * 4;
                let end = row_start + max_x as usize * 4;
                for px in self.frame[start..end].chunks_exact_mut(4) {
                    blend_into(px, color, alpha);
                }
            } else {
                for x in rect.x..max_x {
                    self.blend_px(x, y, color, alpha);
                }
            }
        }
    }

    fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Color, alpha: u8) {
        if alpha == 0 || !self.buffer_ok() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.bounds(cx, cy, rx, ry) else {
            return;
        };
        for y in y0..y1 {
            let dy = (y as f32 + 0.5 - cy) / ry;
            for x in x0..x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                if dx * dx + dy * dy <= 1.0 {
                    self.blend_px(x, y, color, alpha);
                }
            }
        }
    }

    fn fill_soft_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Color, alpha: u8) {
        if alpha == 0 || !self.buffer_ok() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.bounds(cx, cy, rx, ry) else {
            return;
        };
        // sigma of a third of the radius puts the edge at ~1% intensity
        let inv_two_sigma_sq = 1.0 / (2.0 * (1.0f32 / 3.0).powi(2));
        for y in y0..y1 {
            let dy = (y as f32 + 0.5 - cy) / ry;
            for x in x0..x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let r2 = dx * dx + dy * dy;
                if r2 > 1.0 {
                    continue;
                }
                let weight = (-r2 * inv_two_sigma_sq).exp();
                let a = (alpha as f32 * weight).round() as u8;
                self.blend_px(x, y, color, a);
            }
        }
    }

    fn fill_rotated_rect(
        &mut self,
        cx: f32,
        cy: f32,
        half_w: f32,
        half_h: f32,
        degrees: f32,
        color: Color,
        alpha: u8,
    ) {
        if alpha == 0 || !self.buffer_ok() {
            return;
        }
        let reach = (half_w * half_w + half_h * half_h).sqrt();
        let Some((x0, y0, x1, y1)) = self.bounds(cx, cy, reach, reach) else {
            return;
        };
        let (sin, cos) = (-degrees.to_radians()).sin_cos();
        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cy;
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let lx = dx * cos - dy * sin;
                let ly = dx * sin + dy * cos;
                if lx.abs() <= half_w && ly.abs() <= half_h {
                    self.blend_px(x, y, color, alpha);
                }
            }
        }
    }

    fn draw_text_scaled(&mut self, x: u32, y: u32, text: &str, color: Color, scale: u32) {
        let scale = scale.max(1);
        let adv_x = glyph_advance_x(scale);
        let adv_y = line_advance_y(scale);

        let mut cursor_x = x;
        let mut cursor_y = y;
        for ch in text.chars() {
            match ch {
                '\n' => {
                    cursor_x = x;
                    cursor_y = cursor_y.saturating_add(adv_y);
                    if cursor_y >= self.size.height {
                        break;
                    }
                    continue;
                }
                ' ' => {
                    cursor_x = cursor_x.saturating_add(adv_x);
                    continue;
                }
                _ => {}
            }
            if cursor_x < self.size.width {
                self.draw_glyph(cursor_x, cursor_y, ch, color, scale);
            }
            cursor_x = cursor_x.saturating_add(adv_x);
        }
    }
}

impl CpuRenderer<'_> {
    fn draw_glyph(&mut self, x: u32, y: u32, ch: char, color: Color, scale: u32) {
        let bits = glyph_bits(ch);
        for row in 0..GLYPH_H {
            let shift = (GLYPH_H - 1 - row) * GLYPH_W;
            let row_bits = (bits >> shift) & 0b111;
            for col in 0..GLYPH_W {
                if row_bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let px = x.saturating_add(col * scale);
                let py = y.saturating_add(row * scale);
                self.blend_rect(Rect::new(px, py, scale, scale), color, color[3]);
            }
        }
    }
}

fn glyph_bits(ch: char) -> u16 {
    match ch.to_ascii_uppercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_001_001_001,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b010_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b011_100_100_100_011,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_110_100_111,
        'F' => 0b111_100_110_100_100,
        'G' => 0b011_100_101_101_011,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_010,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101,
        'N' => 0b110_101_101_101_101,
        'O' => 0b010_101_101_101_010,
        'P' => 0b110_101_110_100_100,
        'Q' => 0b010_101_101_110_011,
        'R' => 0b110_101_110_101_101,
        'S' => 0b011_100_010_001_110,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_010_010,
        'W' => 0b101_101_111_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '.' => 0b000_000_000_000_010,
        ',' => 0b000_000_000_010_100,
        ':' => 0b000_010_000_010_000,
        '-' => 0b000_000_111_000_000,
        '_' => 0b000_000_000_000_111,
        '(' => 0b001_010_010_010_001,
        ')' => 0b100_010_010_010_100,
        '!' => 0b010_010_010_000_010,
        '\'' => 0b010_010_000_000_000,
        '/' => 0b001_001_010_100_100,
        '+' => 0b000_010_111_010_000,
        _ => 0b110_001_010_000_010,
    }
}
