//! Layout primitives in pixel space.
//!
//! `Rect` plus helpers to build rects from norm-unit boxes and to anchor text blocks.

use crate::surface::SurfaceSize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    /// Pixel rect covering a norm-unit box centred at `(cx, cy)` with extent `(w, h)`.
    ///
    /// Parts falling left of or above the surface are cut off.
    pub fn from_norm_box(size: SurfaceSize, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        let (left, top) = size.norm_to_pixel(cx - w * 0.5, cy + h * 0.5);
        let (right, bottom) = size.norm_to_pixel(cx + w * 0.5, cy - h * 0.5);
        let x0 = left.round().max(0.0);
        let y0 = top.round().max(0.0);
        let x1 = right.round().max(x0);
        let y1 = bottom.round().max(y0);
        Self {
            x: x0 as u32,
            y: y0 as u32,
            w: (x1 - x0) as u32,
            h: (y1 - y0) as u32,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.w,
            h: self.h,
        }
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x
            && px < self.x.saturating_add(self.w)
            && py >= self.y
            && py < self.y.saturating_add(self.h)
    }

    /// Places a child of `size` inside this rect using the requested `anchor`.
    ///
    /// If `size` exceeds this rect, it is clamped to fit.
    pub fn place(&self, size: Size, anchor: Anchor) -> Self {
        let w = size.w.min(self.w);
        let h = size.h.min(self.h);

        let x = match anchor {
            Anchor::TopLeft | Anchor::CenterLeft => self.x,
            Anchor::TopCenter | Anchor::Center => {
                self.x.saturating_add(self.w.saturating_sub(w) / 2)
            }
        };

        let y = match anchor {
            Anchor::TopLeft | Anchor::TopCenter => self.y,
            Anchor::CenterLeft | Anchor::Center => {
                self.y.saturating_add(self.h.saturating_sub(h) / 2)
            }
        };

        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    CenterLeft,
    Center,
}
