use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }

    /// Maps a point in norm units (x and y in `[-1, 1]`, +y up) to pixel space.
    ///
    /// The result is not clamped; points outside the window map outside the buffer.
    pub fn norm_to_pixel(self, x: f32, y: f32) -> (f32, f32) {
        let px = (x + 1.0) * 0.5 * self.width as f32;
        let py = (1.0 - y) * 0.5 * self.height as f32;
        (px, py)
    }

    /// Inverse of [`SurfaceSize::norm_to_pixel`] for integer cursor positions.
    pub fn pixel_to_norm(self, px: u32, py: u32) -> (f32, f32) {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        let x = (px as f32 + 0.5) / w * 2.0 - 1.0;
        let y = 1.0 - (py as f32 + 0.5) / h * 2.0;
        (x, y)
    }

    /// Converts a norm-unit extent (width, height) into pixels.
    pub fn norm_extent(self, w: f32, h: f32) -> (f32, f32) {
        (
            w * 0.5 * self.width as f32,
            h * 0.5 * self.height as f32,
        )
    }
}

/// SHA-256 of an RGBA frame, hex encoded.
pub fn frame_digest(rgba: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rgba);
    hex::encode(hasher.finalize())
}
