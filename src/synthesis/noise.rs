//! Noise primitives shared by the texture recipes: a uniform white source
//! and the one-pole brown / seven-state pink filters that shape it.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform white noise in [-1.0, 1.0).
///
/// Each synthesized channel owns one of these, so the two channels of a
/// stereo buffer are fully uncorrelated. Seeded from the OS; the recipes
/// are deterministic in distribution, not bit-reproducible.
pub struct WhiteSource {
    rng: SmallRng,
}

impl WhiteSource {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Fixed-seed variant for statistical tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Next white sample in [-1.0, 1.0).
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.rng.random_range(-1.0..1.0)
    }

    /// Next value in [0.0, 1.0), for probability gates.
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        self.rng.random()
    }
}

impl Default for WhiteSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Brown noise via a leaky integrator over white noise:
/// `out = (prev + k * white) / (1 + k)` for small k.
pub struct BrownFilter {
    prev: f32,
    leak: f32,
}

impl BrownFilter {
    const DEFAULT_LEAK: f32 = 0.02;

    pub fn new() -> Self {
        Self {
            prev: 0.0,
            leak: Self::DEFAULT_LEAK,
        }
    }

    #[inline]
    pub fn process(&mut self, white: f32) -> f32 {
        let out = (self.prev + self.leak * white) / (1.0 + self.leak);
        self.prev = out;
        out
    }
}

impl Default for BrownFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Pink noise using Paul Kellett's seven-state approximation: a weighted
/// sum of one-pole filters with staggered decay rates. The coefficient
/// ordering matters for the audible result more than the exact values.
pub struct PinkFilter {
    b: [f32; 7],
}

impl PinkFilter {
    pub fn new() -> Self {
        Self { b: [0.0; 7] }
    }

    #[inline]
    pub fn process(&mut self, white: f32) -> f32 {
        self.b[0] = 0.99886 * self.b[0] + white * 0.0555179;
        self.b[1] = 0.99332 * self.b[1] + white * 0.0750759;
        self.b[2] = 0.96900 * self.b[2] + white * 0.1538520;
        self.b[3] = 0.86650 * self.b[3] + white * 0.3104856;
        self.b[4] = 0.55000 * self.b[4] + white * 0.5329522;
        self.b[5] = -0.7616 * self.b[5] - white * 0.0168980;

        let pink = self.b.iter().sum::<f32>() + white * 0.5362;
        self.b[6] = white * 0.115926;

        pink * 0.11
    }
}

impl Default for PinkFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_stays_in_range() {
        let mut white = WhiteSource::from_seed(7);
        for _ in 0..10_000 {
            let s = white.next_sample();
            assert!((-1.0..1.0).contains(&s));
        }
    }

    #[test]
    fn brown_moves_slower_than_white() {
        let mut white = WhiteSource::from_seed(11);
        let mut brown = BrownFilter::new();

        let mut white_step = 0.0;
        let mut brown_step = 0.0;
        let mut prev_w = 0.0;
        let mut prev_b = 0.0;
        for _ in 0..50_000 {
            let w = white.next_sample();
            let b = brown.process(w);
            white_step += (w - prev_w).abs();
            brown_step += (b - prev_b).abs();
            prev_w = w;
            prev_b = b;
        }
        // Integration smooths the walk; successive samples barely move.
        assert!(brown_step < white_step * 0.1);
    }

    #[test]
    fn pink_has_bounded_amplitude() {
        let mut white = WhiteSource::from_seed(13);
        let mut pink = PinkFilter::new();
        for _ in 0..100_000 {
            let p = pink.process(white.next_sample());
            assert!(p.abs() < 1.5, "pink sample {p} out of expected envelope");
        }
    }
}
