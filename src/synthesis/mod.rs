//! Procedural ambient texture synthesis.
//!
//! Each texture is a deterministic recipe over uniform white noise,
//! rendered once into a fixed-length stereo [`SampleBuffer`] that the
//! playback source loops. The synthesizer performs no clamping or
//! normalization; several recipes exceed ±1 transiently and rely on the
//! downstream gain stages for headroom (a production playback path would
//! want an explicit limiter here).

pub mod noise;
pub mod textures;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::audio::SampleBuffer;
use noise::WhiteSource;

/// The six ambient textures the engine can synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundTexture {
    WhiteNoise,
    Rain,
    Wave,
    Forest,
    Night,
    Temple,
}

static TEXTURE_IDS: Lazy<FxHashMap<&'static str, SoundTexture>> = Lazy::new(|| {
    SoundTexture::ALL
        .iter()
        .map(|&texture| (texture.id(), texture))
        .collect()
});

impl SoundTexture {
    pub const ALL: [SoundTexture; 6] = [
        SoundTexture::WhiteNoise,
        SoundTexture::Rain,
        SoundTexture::Wave,
        SoundTexture::Forest,
        SoundTexture::Night,
        SoundTexture::Temple,
    ];

    /// Stable string identifier used at the UI boundary.
    pub fn id(&self) -> &'static str {
        match self {
            SoundTexture::WhiteNoise => "whitenoise",
            SoundTexture::Rain => "rain",
            SoundTexture::Wave => "wave",
            SoundTexture::Forest => "forest",
            SoundTexture::Night => "night",
            SoundTexture::Temple => "temple",
        }
    }

    /// Resolves a UI identifier. Unknown identifiers fall back to
    /// `WhiteNoise` rather than erroring.
    pub fn from_id(id: &str) -> SoundTexture {
        TEXTURE_IDS
            .get(id)
            .copied()
            .unwrap_or(SoundTexture::WhiteNoise)
    }

    /// Length of the looping buffer synthesized for this texture.
    pub fn default_duration_secs(&self) -> f32 {
        match self {
            SoundTexture::WhiteNoise => 2.0,
            SoundTexture::Rain => 3.0,
            SoundTexture::Forest => 4.0,
            SoundTexture::Night => 5.0,
            SoundTexture::Temple => 5.0,
            SoundTexture::Wave => 6.0,
        }
    }
}

/// Synthesizes a stereo buffer of `duration_secs` seconds of `texture`.
///
/// Both channels run the same recipe over independent noise sources, so
/// the result has no inter-channel correlation.
pub fn synthesize(texture: SoundTexture, duration_secs: f32, sample_rate: f32) -> SampleBuffer {
    let frames = (sample_rate * duration_secs).round().max(0.0) as usize;
    let mut buffer = SampleBuffer::new(frames, sample_rate);
    for channel in buffer.channels_mut() {
        let mut white = WhiteSource::new();
        fill_channel(texture, channel, sample_rate, &mut white);
    }
    buffer
}

/// Synthesizes `texture` at its default loop duration.
pub fn synthesize_default(texture: SoundTexture, sample_rate: f32) -> SampleBuffer {
    synthesize(texture, texture.default_duration_secs(), sample_rate)
}

fn fill_channel(
    texture: SoundTexture,
    channel: &mut [f32],
    sample_rate: f32,
    white: &mut WhiteSource,
) {
    match texture {
        SoundTexture::WhiteNoise => textures::fill_white(channel, white),
        SoundTexture::Rain => textures::fill_rain(channel, white),
        SoundTexture::Wave => textures::fill_wave(channel, white),
        SoundTexture::Forest => textures::fill_forest(channel, white),
        SoundTexture::Night => textures::fill_night(channel, sample_rate, white),
        SoundTexture::Temple => textures::fill_temple(channel, sample_rate, white),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::num_complex::Complex;
    use rustfft::FftPlanner;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn buffers_have_exactly_sample_rate_times_duration_frames() {
        for texture in SoundTexture::ALL {
            for duration in [0.5_f32, 2.0, 3.7] {
                let buffer = synthesize(texture, duration, SAMPLE_RATE);
                let expected = (SAMPLE_RATE * duration).round() as usize;
                assert_eq!(buffer.frames(), expected, "{texture:?} at {duration}s");
                assert_eq!(buffer.left().len(), expected);
                assert_eq!(buffer.right().len(), expected);
            }
        }
    }

    #[test]
    fn default_durations_are_within_spec_range() {
        for texture in SoundTexture::ALL {
            let d = texture.default_duration_secs();
            assert!((2.0..=6.0).contains(&d), "{texture:?} duration {d}");
        }
    }

    #[test]
    fn unknown_texture_id_falls_back_to_white_noise() {
        assert_eq!(SoundTexture::from_id("rain"), SoundTexture::Rain);
        assert_eq!(SoundTexture::from_id("wave"), SoundTexture::Wave);
        assert_eq!(SoundTexture::from_id("ocean"), SoundTexture::WhiteNoise);
        assert_eq!(SoundTexture::from_id(""), SoundTexture::WhiteNoise);
    }

    #[test]
    fn texture_ids_round_trip() {
        for texture in SoundTexture::ALL {
            assert_eq!(SoundTexture::from_id(texture.id()), texture);
        }
    }

    #[test]
    fn white_noise_is_zero_mean_and_uniform() {
        let mut white = WhiteSource::from_seed(42);
        let mut channel = vec![0.0_f32; 200_000];
        textures::fill_white(&mut channel, &mut white);

        let n = channel.len() as f64;
        let mean: f64 = channel.iter().map(|&s| s as f64).sum::<f64>() / n;
        let variance: f64 = channel.iter().map(|&s| (s as f64 - mean).powi(2)).sum::<f64>() / n;

        assert!(mean.abs() < 0.01, "mean {mean}");
        // Uniform on [-1, 1] has variance 1/3.
        assert!((variance - 1.0 / 3.0).abs() < 0.02, "variance {variance}");
        assert!(channel.iter().all(|s| (-1.0..1.0).contains(s)));
    }

    /// Ratio of spectral energy below 300 Hz to energy in 4–12 kHz.
    fn low_high_ratio(samples: &[f32]) -> f64 {
        let n = samples.len();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let mut spectrum: Vec<Complex<f32>> = samples
            .iter()
            .map(|&s| Complex { re: s, im: 0.0 })
            .collect();
        fft.process(&mut spectrum);

        let bin_hz = SAMPLE_RATE as f64 / n as f64;
        let low_max = (300.0 / bin_hz) as usize;
        let high_min = (4_000.0 / bin_hz) as usize;
        let high_max = (12_000.0 / bin_hz) as usize;

        let energy = |range: std::ops::Range<usize>| -> f64 {
            spectrum[range]
                .iter()
                .map(|c| (c.norm_sqr()) as f64)
                .sum::<f64>()
        };

        // Skip DC; brown noise carries a slow drift there.
        energy(1..low_max) / energy(high_min..high_max)
    }

    #[test]
    fn shaped_textures_are_biased_toward_low_frequencies() {
        const FRAMES: usize = 32_768;

        let mut white = WhiteSource::from_seed(1);
        let mut reference = vec![0.0_f32; FRAMES];
        textures::fill_white(&mut reference, &mut white);
        let white_ratio = low_high_ratio(&reference);

        let shaped = [
            SoundTexture::Rain,
            SoundTexture::Wave,
            SoundTexture::Forest,
            SoundTexture::Night,
            SoundTexture::Temple,
        ];
        for (i, texture) in shaped.into_iter().enumerate() {
            let mut source = WhiteSource::from_seed(100 + i as u64);
            let mut channel = vec![0.0_f32; FRAMES];
            fill_channel(texture, &mut channel, SAMPLE_RATE, &mut source);
            let ratio = low_high_ratio(&channel);
            assert!(
                ratio > white_ratio * 2.0,
                "{texture:?}: ratio {ratio} vs white {white_ratio}"
            );
        }
    }

    #[test]
    fn stereo_channels_are_uncorrelated() {
        let buffer = synthesize(SoundTexture::WhiteNoise, 1.0, SAMPLE_RATE);
        let n = buffer.frames() as f64;
        let correlation: f64 = buffer
            .left()
            .iter()
            .zip(buffer.right())
            .map(|(&l, &r)| (l as f64) * (r as f64))
            .sum::<f64>()
            / n;
        // Normalized by the ~1/3 variance this stays near zero.
        assert!(correlation.abs() < 0.01, "correlation {correlation}");
    }
}
