pub mod app;
pub mod graphics;
pub mod pixels_renderer;
pub mod surface;
pub mod ui;

use std::time::Duration;

use app::InputFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Exit,
}

/// Anything that advances once per rendered frame.
///
/// `dt` is the wall-clock time since the previous frame. Implementations must not block:
/// waiting is expressed as state that is re-checked on the next frame.
pub trait FrameLogic {
    fn advance(&mut self, input: &InputFrame, dt: Duration) -> FrameControl;
}

/// Drives a [`FrameLogic`] without a window, using a fixed frame interval.
#[derive(Debug)]
pub struct HeadlessRunner<L: FrameLogic> {
    logic: L,
    frame_interval: Duration,
    frame: usize,
    elapsed: Duration,
    exited: bool,
}

impl<L: FrameLogic> HeadlessRunner<L> {
    pub fn new(logic: L) -> Self {
        Self::with_frame_interval(logic, app::NOMINAL_FRAME)
    }

    pub fn with_frame_interval(logic: L, frame_interval: Duration) -> Self {
        Self {
            logic,
            frame_interval,
            frame: 0,
            elapsed: Duration::ZERO,
            exited: false,
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    pub fn logic(&self) -> &L {
        &self.logic
    }

    pub fn logic_mut(&mut self) -> &mut L {
        &mut self.logic
    }

    pub fn into_inner(self) -> L {
        self.logic
    }

    /// Advances one frame. Once the logic has asked to exit, further steps are ignored.
    pub fn step(&mut self, input: &InputFrame) -> FrameControl {
        if self.exited {
            return FrameControl::Exit;
        }
        let control = self.logic.advance(input, self.frame_interval);
        self.frame += 1;
        self.elapsed = self.elapsed.saturating_add(self.frame_interval);
        if control == FrameControl::Exit {
            self.exited = true;
        }
        control
    }

    /// Advances frames with no input for at least `duration`.
    pub fn idle_for(&mut self, duration: Duration) -> FrameControl {
        let idle = InputFrame::idle();
        let target = self.elapsed.saturating_add(duration);
        let mut control = FrameControl::Continue;
        while self.elapsed < target && !self.exited {
            control = self.step(&idle);
        }
        control
    }

    /// Feeds idle frames until `done` holds, giving up after `max_frames`.
    ///
    /// Returns the number of frames stepped when `done` became true.
    pub fn run_until<F>(&mut self, max_frames: usize, mut done: F) -> Option<usize>
    where
        F: FnMut(&L) -> bool,
    {
        let idle = InputFrame::idle();
        for n in 0..max_frames {
            if done(&self.logic) {
                return Some(n);
            }
            if self.step(&idle) == FrameControl::Exit {
                return done(&self.logic).then_some(n + 1);
            }
        }
        done(&self.logic).then_some(max_frames)
    }

    pub fn run<'a, I>(&mut self, inputs: I) -> FrameControl
    where
        I: IntoIterator<Item = &'a InputFrame>,
    {
        let mut control = FrameControl::Continue;
        for input in inputs {
            control = self.step(input);
            if control == FrameControl::Exit {
                break;
            }
        }
        control
    }
}
