use std::collections::HashSet;
use std::error::Error;
use std::time::{Duration, Instant};

use pixels::{PixelsBuilder, SurfaceTexture};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode,
    WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Fullscreen, WindowBuilder};

use crate::graphics::Renderer2d;
use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::SurfaceSize;
use crate::{FrameControl, FrameLogic};

// Trackpads report pixel deltas; treat this many pixels as one wheel notch.
const PIXELS_PER_WHEEL_LINE: f64 = 40.0;

pub struct AppConfig {
    pub title: String,
    pub desired_size: PhysicalSize<u32>,
    pub fullscreen: bool,
    pub vsync: bool,
}

/// Collects wheel motion between frames and hands it out in whole notches.
///
/// The fractional rest carries over to later frames, so slow trackpad motion still adds up
/// to a notch instead of each tiny delta counting as one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelAccumulator {
    pending: f32,
}

impl WheelAccumulator {
    pub fn add(&mut self, lines: f32) {
        if !lines.is_finite() {
            return;
        }
        // Reversing drops whatever was still owed in the old direction.
        if self.pending * lines < 0.0 {
            self.pending = 0.0;
        }
        self.pending += lines;
    }

    /// Whole notches collected so far; the fraction stays pending.
    pub fn take_notches(&mut self) -> f32 {
        let whole = self.pending.trunc();
        self.pending -= whole;
        whole
    }

    pub fn pending(&self) -> f32 {
        self.pending
    }
}

/// Input collected between two rendered frames.
///
/// Edge fields (`mouse_down`, `mouse_up`, `wheel_lines`, `keys_pressed`) describe what happened
/// since the previous frame; `mouse_held` and `mouse_norm` are levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    /// Cursor position in norm units (`[-1, 1]`, +y up).
    pub mouse_norm: Option<(f32, f32)>,
    pub mouse_down: bool,
    pub mouse_up: bool,
    pub mouse_held: bool,
    /// Wheel notches; positive is away from the user.
    pub wheel_lines: f32,
    pub keys_pressed: HashSet<VirtualKeyCode>,
}

impl InputFrame {
    pub fn idle() -> Self {
        Self::default()
    }

    /// A left-button press at the current cursor position.
    pub fn click() -> Self {
        Self {
            mouse_down: true,
            mouse_held: true,
            ..Self::default()
        }
    }

    pub fn click_at(x: f32, y: f32) -> Self {
        Self {
            mouse_norm: Some((x, y)),
            ..Self::click()
        }
    }

    pub fn scroll(lines: f32) -> Self {
        Self {
            wheel_lines: lines,
            ..Self::default()
        }
    }

    pub fn key(key: VirtualKeyCode) -> Self {
        let mut frame = Self::default();
        frame.keys_pressed.insert(key);
        frame
    }

    pub fn pressed(&self, key: VirtualKeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Whole wheel notches this frame. Fractions are left to [`WheelAccumulator`].
    pub fn wheel_notches(&self) -> i32 {
        if !self.wheel_lines.is_finite() {
            return 0;
        }
        self.wheel_lines.trunc() as i32
    }

    fn end_frame(&mut self) {
        self.mouse_down = false;
        self.mouse_up = false;
        self.wheel_lines = 0.0;
        self.keys_pressed.clear();
    }
}

/// A [`FrameLogic`] that can also draw itself.
pub trait FrameApp: FrameLogic {
    fn render(&self, gfx: &mut dyn Renderer2d);

    fn cursor_visible(&self) -> bool {
        true
    }

    /// Called once when the loop is about to stop, for any reason.
    fn on_exit(&mut self) {}
}

/// Opens the window and drives `app` once per redraw until it asks to exit.
pub fn run_app<A: FrameApp + 'static>(config: AppConfig, mut app: A) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new();
    let mut builder = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(config.desired_size);
    if config.fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = builder.build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_size = SurfaceSize::new(window_size.width.max(1), window_size.height.max(1));
    let surface_texture = SurfaceTexture::new(surface_size.width, surface_size.height, &window);
    let pixels = PixelsBuilder::new(surface_size.width, surface_size.height, surface_texture)
        .enable_vsync(config.vsync)
        .build()?;
    let mut renderer = PixelsRenderer2d::new(pixels, surface_size)?;
    debug!(width = surface_size.width, height = surface_size.height, "window opened");

    let mut input = InputFrame::default();
    let mut wheel = WheelAccumulator::default();
    let mut keys_held: HashSet<VirtualKeyCode> = HashSet::new();
    let mut cursor_visible: Option<bool> = None;
    let mut last_frame = Instant::now();
    let mut exiting = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        if exiting {
            *control_flow = ControlFlow::Exit;
            return;
        }

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    app.on_exit();
                    exiting = true;
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    if let Err(err) = renderer.resize(SurfaceSize::new(size.width, size.height)) {
                        warn!("resize failed: {err}");
                    }
                    window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let px = position.x.max(0.0) as u32;
                    let py = position.y.max(0.0) as u32;
                    input.mouse_norm = Some(renderer.size().pixel_to_norm(px, py));
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => match state {
                    ElementState::Pressed => {
                        input.mouse_down = true;
                        input.mouse_held = true;
                    }
                    ElementState::Released => {
                        input.mouse_up = true;
                        input.mouse_held = false;
                    }
                },
                WindowEvent::MouseWheel { delta, .. } => {
                    wheel.add(match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_WHEEL_LINE) as f32,
                    });
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => match state {
                    // OS key repeat sends repeated presses; only the first one counts.
                    ElementState::Pressed => {
                        if keys_held.insert(key) {
                            input.keys_pressed.insert(key);
                        }
                    }
                    ElementState::Released => {
                        keys_held.remove(&key);
                    }
                },
                _ => {}
            },
            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(last_frame);
                last_frame = now;

                input.wheel_lines = wheel.take_notches();
                let control = app.advance(&input, dt);
                input.end_frame();
                if control == FrameControl::Exit {
                    app.on_exit();
                    exiting = true;
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                let visible = app.cursor_visible();
                if cursor_visible != Some(visible) {
                    window.set_cursor_visible(visible);
                    cursor_visible = Some(visible);
                }

                renderer.draw_frame(|gfx| app.render(gfx));
                if let Err(err) = renderer.present() {
                    warn!("present failed: {err}");
                }
            }
            Event::MainEventsCleared => {
                window.request_redraw();
            }
            _ => {}
        }
    });
}

/// Frame interval used by headless runs and tests.
pub const NOMINAL_FRAME: Duration = Duration::from_micros(16_667);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_notches_count_whole_lines_only() {
        assert_eq!(InputFrame::scroll(0.2).wheel_notches(), 0);
        assert_eq!(InputFrame::scroll(-1.5).wheel_notches(), -1);
        assert_eq!(InputFrame::scroll(3.0).wheel_notches(), 3);
        assert_eq!(InputFrame::idle().wheel_notches(), 0);
    }

    #[test]
    fn small_trackpad_deltas_add_up_to_one_notch() {
        let mut wheel = WheelAccumulator::default();
        // One pixel of trackpad motion is far less than a notch.
        wheel.add((1.0 / PIXELS_PER_WHEEL_LINE) as f32);
        assert_eq!(wheel.take_notches(), 0.0);

        let mut wheel = WheelAccumulator::default();
        let mut notches = Vec::new();
        for _ in 0..4 {
            wheel.add(0.25);
            notches.push(wheel.take_notches());
        }
        assert_eq!(notches, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(wheel.pending(), 0.0);
    }

    #[test]
    fn wheel_reversal_drops_the_pending_fraction() {
        let mut wheel = WheelAccumulator::default();
        wheel.add(0.75);
        assert_eq!(wheel.take_notches(), 0.0);
        wheel.add(-0.5);
        assert_eq!(wheel.take_notches(), 0.0);
        assert_eq!(wheel.pending(), -0.5);
        wheel.add(-0.5);
        assert_eq!(wheel.take_notches(), -1.0);
    }

    #[test]
    fn end_frame_keeps_levels_and_clears_edges() {
        let mut frame = InputFrame::click_at(0.1, -0.2);
        frame.keys_pressed.insert(VirtualKeyCode::Space);
        frame.wheel_lines = 3.0;
        frame.end_frame();

        assert!(frame.mouse_held);
        assert_eq!(frame.mouse_norm, Some((0.1, -0.2)));
        assert!(!frame.mouse_down);
        assert_eq!(frame.wheel_lines, 0.0);
        assert!(frame.keys_pressed.is_empty());
    }
}
