//! Draws the session's current frame.

use engine::app::FrameApp;
use engine::graphics::{BLACK, Clip, Renderer2d, WHITE, text_extent};
use engine::surface::SurfaceSize;
use engine::ui::{Anchor, Rect, Size};
use tracing::info;

use crate::demo::{self, DemoStage};
use crate::grid::{Aperture, ElementMask, Layer, Region, signed_to_u8};
use crate::noise::NoiseField;
use crate::session::{Screen, Session, SessionStatus};
use crate::text;

const TEXT_BOX: Aperture = Aperture {
    cx: 0.0,
    cy: 0.2,
    w: 1.0,
    h: 1.0,
};
const FIXATION_HEIGHT: f32 = 0.09;
const FIXATION_ALPHA: u8 = 128;

/// Block-font scale giving roughly 38 text lines per screen height.
pub fn text_scale(size: SurfaceSize) -> u32 {
    (size.height / 270).max(1)
}

pub fn aperture_rect(size: SurfaceSize, aperture: Aperture) -> Rect {
    Rect::from_norm_box(size, aperture.cx, aperture.cy, aperture.w, aperture.h)
}

pub fn render_session(session: &Session, gfx: &mut dyn Renderer2d) {
    gfx.clear(BLACK);
    let aspect = session.config().stimulus.aspect_scale;
    match session.screen() {
        Screen::Welcome => draw_text_box(gfx, text::WELCOME),
        Screen::Demo(demo) => {
            let block = demo.block();
            match demo.stage() {
                DemoStage::Viewing => draw_text_box(gfx, &text::demo_viewing(block)),
                DemoStage::Adjusting => draw_text_box(gfx, text::demo_adjusting(block)),
            }
            draw_button(gfx);
            for layer in demo.layers() {
                draw_layer(gfx, &layer, aspect);
            }
        }
        Screen::SetupNotice => draw_text_box(gfx, text::SETUP_NOTICE),
        Screen::BlockIntro => draw_text_box(gfx, text::START_OF_BLOCK),
        Screen::Trials(set) => {
            if let Some(trial) = set.current() {
                if trial.phase().shows_noise() {
                    draw_noise(gfx, session.noise());
                }
                for layer in trial.layers() {
                    draw_layer(gfx, &layer, aspect);
                }
            }
            draw_fixation(gfx);
        }
        Screen::PracticeComplete => {
            draw_text_box(gfx, text::PRACTICE_COMPLETE);
            draw_fixation(gfx);
        }
        Screen::EndOfBlock => draw_text_box(gfx, text::END_OF_BLOCK),
        Screen::Complete => draw_text_box(gfx, text::END_OF_EXPERIMENT),
        Screen::Finished => {}
    }
}

pub fn draw_layer(gfx: &mut dyn Renderer2d, layer: &Layer<'_>, aspect_scale: f32) {
    let grid = layer.grid;
    if !grid.is_visible() {
        return;
    }
    let size = gfx.size();
    let previous = gfx.clip();
    gfx.set_clip(match layer.region {
        Region::Everywhere => Clip::None,
        Region::Inside(a) => Clip::Inside(aperture_rect(size, a)),
        Region::Outside(a) => Clip::Outside(aperture_rect(size, a)),
    });

    let (w, h) = size.norm_extent(grid.size * aspect_scale, grid.size);
    let (rx, ry) = (w * 0.5, h * 0.5);
    let color = grid.colour.to_rgba8();
    let alpha = (grid.opacity * 255.0).round() as u8;
    for (xy, &ori) in grid.xys().iter().zip(grid.orientations()) {
        let (cx, cy) = size.norm_to_pixel(xy[0], xy[1]);
        match grid.mask {
            ElementMask::Circle => gfx.fill_ellipse(cx, cy, rx, ry, color, alpha),
            ElementMask::Gauss => gfx.fill_soft_ellipse(cx, cy, rx, ry, color, alpha),
            ElementMask::Square => gfx.fill_rotated_rect(cx, cy, rx, ry, ori, color, alpha),
        }
    }
    gfx.set_clip(previous);
}

/// Fills the screen with the noise texture, one block per texel.
pub fn draw_noise(gfx: &mut dyn Renderer2d, noise: &NoiseField) {
    let size = gfx.size();
    let n = noise.texels() as u64;
    let (w, h) = (size.width as u64, size.height as u64);
    for row in 0..n {
        let y0 = (row * h / n) as u32;
        let y1 = ((row + 1) * h / n) as u32;
        if y1 == y0 {
            continue;
        }
        for col in 0..n {
            let x0 = (col * w / n) as u32;
            let x1 = ((col + 1) * w / n) as u32;
            if x1 == x0 {
                continue;
            }
            let v = signed_to_u8(noise.sample(col as usize, row as usize));
            gfx.fill_rect(Rect::new(x0, y0, x1 - x0, y1 - y0), [v, v, v, 255]);
        }
    }
}

pub fn draw_fixation(gfx: &mut dyn Renderer2d) {
    let size = gfx.size();
    let (_, arm) = size.norm_extent(0.0, FIXATION_HEIGHT);
    let arm = arm.round().max(3.0) as u32;
    let thickness = (arm / 6).max(1);
    let cx = size.width / 2;
    let cy = size.height / 2;
    let left = cx.saturating_sub(arm / 2);
    let top = cy.saturating_sub(arm / 2);
    let bar_y = cy.saturating_sub(thickness / 2);
    let bar_x = cx.saturating_sub(thickness / 2);

    // Three pieces so the crossing is only blended once.
    gfx.blend_rect(Rect::new(left, bar_y, arm, thickness), WHITE, FIXATION_ALPHA);
    gfx.blend_rect(
        Rect::new(bar_x, top, thickness, bar_y.saturating_sub(top)),
        WHITE,
        FIXATION_ALPHA,
    );
    let below = bar_y + thickness;
    gfx.blend_rect(
        Rect::new(bar_x, below, thickness, (top + arm).saturating_sub(below)),
        WHITE,
        FIXATION_ALPHA,
    );
}

pub fn draw_text_box(gfx: &mut dyn Renderer2d, body: &str) {
    let size = gfx.size();
    let area = aperture_rect(size, TEXT_BOX);
    let scale = text_scale(size);
    let (glyph_w, line_h) = text_extent("M", scale);
    let cols = (area.w / glyph_w.max(1)).max(1) as usize;

    let mut y = area.y;
    for line in text::wrap(body, cols) {
        if y.saturating_add(line_h) > area.y.saturating_add(area.h) {
            break;
        }
        if !line.is_empty() {
            let (w, h) = text_extent(&line, scale);
            let slot = Rect::new(area.x, y, area.w, line_h);
            let placed = slot.place(Size::new(w, h), Anchor::TopCenter);
            gfx.draw_text_scaled(placed.x, placed.y, &line, WHITE, scale);
        }
        y += line_h;
    }
}

pub fn draw_button(gfx: &mut dyn Renderer2d) {
    let size = gfx.size();
    let rect = aperture_rect(size, demo::BUTTON);
    gfx.fill_rect(rect, WHITE);

    let label = text::BUTTON_LABEL;
    let (unit_w, _) = text_extent(label, 1);
    let scale = text_scale(size).min(rect.w / unit_w.max(1)).max(1);
    let (w, h) = text_extent(label, scale);
    let placed = rect.place(Size::new(w, h), Anchor::Center);
    gfx.draw_text_scaled(placed.x, placed.y, label, BLACK, scale);
}

impl FrameApp for Session {
    fn render(&self, gfx: &mut dyn Renderer2d) {
        render_session(self, gfx);
    }

    fn cursor_visible(&self) -> bool {
        matches!(
            self.screen(),
            Screen::Welcome | Screen::Demo(_) | Screen::SetupNotice | Screen::BlockIntro
        )
    }

    fn on_exit(&mut self) {
        let rows = self.recorder().len();
        match self.status() {
            SessionStatus::Completed => info!(rows, "session completed"),
            SessionStatus::Running => info!(rows, "window closed mid-session"),
            SessionStatus::Aborted | SessionStatus::Failed => {
                info!(rows, backup = %self.recorder().backup_path().display(), "session ended early");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::graphics::CpuRenderer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::condition::StimulusFamily;
    use crate::grid::{ElementStyle, GridSpec, Rgb, StimulusGrid};

    fn px(frame: &[u8], size: SurfaceSize, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * size.width + x) * 4) as usize;
        [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
    }

    #[test]
    fn layer_regions_respect_the_aperture() {
        let size = SurfaceSize::new(400, 400);
        let mut frame = vec![0u8; size.rgba_len()];
        let mut rng = StdRng::seed_from_u64(0);
        let grid = StimulusGrid::build(
            &GridSpec::full_screen(StimulusFamily::Colour),
            ElementStyle::dots(0.1, Rgb([1.0, -1.0, -1.0])),
            &mut rng,
        )
        .unwrap();

        let mut gfx = CpuRenderer::new(&mut frame, size);
        gfx.clear(BLACK);
        draw_layer(&mut gfx, &Layer::new(&grid, Region::Outside(Aperture::CENTRE)), 1.0);

        // First dot at (-0.95, 0.95) lies outside the centre aperture.
        let (x, y) = size.norm_to_pixel(-0.95, 0.95);
        assert_eq!(px(&frame, size, x as u32, y as u32), [255, 0, 0, 255]);
        // Nothing drawn inside the aperture.
        let inside = frame
            .chunks_exact(4)
            .enumerate()
            .filter(|(i, _)| {
                let (x, y) = ((*i as u32) % size.width, (*i as u32) / size.width);
                aperture_rect(size, Aperture::CENTRE).contains(x, y)
            })
            .all(|(_, p)| p == [0, 0, 0, 255]);
        assert!(inside);
    }

    #[test]
    fn fixation_is_half_transparent_white() {
        let size = SurfaceSize::new(200, 200);
        let mut frame = vec![0u8; size.rgba_len()];
        let mut gfx = CpuRenderer::new(&mut frame, size);
        gfx.clear(BLACK);
        draw_fixation(&mut gfx);
        assert_eq!(px(&frame, size, 100, 100), [128, 128, 128, 255]);
        assert_eq!(px(&frame, size, 10, 10), [0, 0, 0, 255]);
    }

    #[test]
    fn text_box_draws_something_in_the_box() {
        let size = SurfaceSize::new(640, 360);
        let mut frame = vec![0u8; size.rgba_len()];
        let mut gfx = CpuRenderer::new(&mut frame, size);
        gfx.clear(BLACK);
        draw_text_box(&mut gfx, text::END_OF_BLOCK);
        let area = aperture_rect(size, TEXT_BOX);
        let lit = frame
            .chunks_exact(4)
            .enumerate()
            .filter(|(_, p)| p[0] == 255)
            .all(|(i, _)| area.contains((i as u32) % size.width, (i as u32) / size.width));
        assert!(lit);
        assert!(frame.chunks_exact(4).any(|p| p[0] == 255));
    }
}
