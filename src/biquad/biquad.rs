use std::f32::consts::PI;

/// Trait defining the basic filter interface.
pub trait Filter {
    fn process(&mut self, input: f32) -> f32;
    fn reset(&mut self);
}

/// A second-order notch filter using Direct Form I.
///
/// Coefficients follow the Audio EQ Cookbook by Robert Bristow-Johnson.
/// The notch carves a narrow band around `frequency`; `q` controls how
/// narrow the band is (the therapy chain runs this at Q ≈ 30).
#[derive(Clone, Copy, Debug)]
pub struct Biquad {
    // Parameters
    pub sample_rate: f32,
    frequency: f32,
    q: f32,
    // Coefficients (a0 normalized to 1)
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    // State variables (Direct Form I)
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new notch filter instance.
    pub fn new(sample_rate: f32, frequency: f32, q: f32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        let mut filter = Self {
            sample_rate,
            frequency: frequency.clamp(10.0, sample_rate * 0.499),
            q: q.max(0.01),
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    /// Retunes the notch center. State is kept so a live retune does not
    /// restart the filter.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.clamp(10.0, self.sample_rate * 0.499);
        self.update_coefficients();
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q.max(0.01);
        self.update_coefficients();
    }

    /// Recalculates the notch coefficients from the current parameters.
    fn update_coefficients(&mut self) {
        let omega = 2.0 * PI * self.frequency / self.sample_rate;
        let sn = omega.sin();
        let cs = omega.cos();
        let alpha = sn / (2.0 * self.q);

        let a0 = 1.0 + alpha;
        let b0 = 1.0;
        let b1 = -2.0 * cs;
        let b2 = 1.0;
        let a1 = -2.0 * cs;
        let a2 = 1.0 - alpha;

        // Normalize by a0; a0 > 0 for any valid frequency/Q
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }
}

impl Filter for Biquad {
    /// Processes one sample using Direct Form I.
    #[inline(always)]
    fn process(&mut self, input: f32) -> f32 {
        // y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        // Flush denormals; tiny recursive state hurts on some platforms
        if output.abs() < 1e-18 {
            0.0
        } else {
            output
        }
    }

    /// Resets the filter's internal state variables to zero.
    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
