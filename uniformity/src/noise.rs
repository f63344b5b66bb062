use rand::Rng;

pub const NOISE_TEXELS: usize = 300;

/// How far the texture drifts each frame, as a fraction of its size.
const PHASE_STEP: (f32, f32) = (0.005, 0.0025);

/// A square random-noise texture that slides across the screen between stimuli.
#[derive(Debug, Clone)]
pub struct NoiseField {
    texels: usize,
    values: Vec<f32>,
    phase: (f32, f32),
}

impl NoiseField {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_texels(NOISE_TEXELS, rng)
    }

    pub fn with_texels<R: Rng + ?Sized>(texels: usize, rng: &mut R) -> Self {
        let texels = texels.max(1);
        let values = (0..texels * texels)
            .map(|_| rng.gen_range(-1.0..=1.0))
            .collect();
        Self {
            texels,
            values,
            phase: (0.0, 0.0),
        }
    }

    pub fn texels(&self) -> usize {
        self.texels
    }

    pub fn phase(&self) -> (f32, f32) {
        self.phase
    }

    pub fn advance(&mut self) {
        self.phase.0 = (self.phase.0 + PHASE_STEP.0).fract();
        self.phase.1 = (self.phase.1 + PHASE_STEP.1).fract();
    }

    /// Signed intensity of the texel drawn at column `col`, row `row` of the screen grid.
    pub fn sample(&self, col: usize, row: usize) -> f32 {
        let n = self.texels;
        let dx = (self.phase.0 * n as f32) as usize;
        let dy = (self.phase.1 * n as f32) as usize;
        self.values[((row + dy) % n) * n + (col + dx) % n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn values_are_signed_intensities() {
        let mut rng = StdRng::seed_from_u64(9);
        let noise = NoiseField::with_texels(16, &mut rng);
        for row in 0..16 {
            for col in 0..16 {
                assert!((-1.0..=1.0).contains(&noise.sample(col, row)));
            }
        }
    }

    #[test]
    fn advancing_slides_the_texture() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut noise = NoiseField::with_texels(20, &mut rng);
        let mut before: Vec<f32> = noise.values.clone();
        for _ in 0..30 {
            noise.advance();
        }
        assert!(noise.phase().0 > noise.phase().1);

        // A full period still shows every texel exactly once.
        let mut after: Vec<f32> = (0..20)
            .flat_map(|row| (0..20).map(move |col| (col, row)))
            .map(|(col, row)| noise.sample(col, row))
            .collect();
        before.sort_by(f32::total_cmp);
        after.sort_by(f32::total_cmp);
        assert_eq!(before, after);
    }

    #[test]
    fn phase_wraps() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut noise = NoiseField::with_texels(4, &mut rng);
        for _ in 0..1000 {
            noise.advance();
        }
        let (u, v) = noise.phase();
        assert!((0.0..1.0).contains(&u) && (0.0..1.0).contains(&v));
    }
}
