use std::any::Any;
use std::collections::HashMap;
use std::f32::consts::TAU;

use crate::traits::{AudioNode, PortId};

/// A phase-accumulating sine oscillator used for the tinnitus test tone.
///
/// Retunes are smoothed toward the target frequency per sample so a live
/// frequency change glides instead of stepping.
pub struct TestToneOscillator {
    sample_rate: f32,
    phase: f32,
    frequency: f32,
    target_frequency: f32,
    smoothing_factor: f32,
    active: bool,
}

impl TestToneOscillator {
    const FREQ_SMOOTHING: f32 = 0.001;

    pub fn new(sample_rate: f32, frequency: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            frequency,
            target_frequency: frequency,
            smoothing_factor: Self::FREQ_SMOOTHING,
            active: true,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.target_frequency
    }

    /// Live retune; the audible frequency ramps to the new value.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.target_frequency = frequency.max(0.0);
    }
}

impl AudioNode for TestToneOscillator {
    fn get_ports(&self) -> HashMap<PortId, bool> {
        let mut ports = HashMap::new();
        ports.insert(PortId::AudioOutput0, true);
        ports.insert(PortId::AudioOutput1, true);
        ports
    }

    fn process(
        &mut self,
        _inputs: &HashMap<PortId, &[f32]>,
        outputs: &mut HashMap<PortId, &mut [f32]>,
        buffer_size: usize,
    ) {
        let mut samples = vec![0.0; buffer_size];
        for sample in samples.iter_mut() {
            self.frequency += self.smoothing_factor * (self.target_frequency - self.frequency);
            *sample = self.phase.sin();
            self.phase += TAU * self.frequency / self.sample_rate;
            if self.phase >= TAU {
                self.phase -= TAU;
            }
        }

        // Same tone on both channels.
        if let Some(out) = outputs.get_mut(&PortId::AudioOutput0) {
            out[..buffer_size].copy_from_slice(&samples);
        }
        if let Some(out) = outputs.get_mut(&PortId::AudioOutput1) {
            out[..buffer_size].copy_from_slice(&samples);
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.frequency = self.target_frequency;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn node_type(&self) -> &str {
        "test_tone"
    }
}
