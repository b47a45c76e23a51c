use std::any::Any;
use std::collections::HashMap;

use crate::traits::{AudioNode, PortId};

/// A stereo gain stage with per-sample level smoothing.
///
/// Level changes ramp toward their target to avoid zipper noise when the
/// volume slider moves while audio is running.
pub struct GainNode {
    level: f32,
    target_level: f32,
    smoothing_factor: f32,
    active: bool,
}

impl GainNode {
    const LEVEL_SMOOTHING: f32 = 0.01;

    pub fn new(level: f32) -> Self {
        let level = level.max(0.0);
        Self {
            level,
            target_level: level,
            smoothing_factor: Self::LEVEL_SMOOTHING,
            active: true,
        }
    }

    pub fn level(&self) -> f32 {
        self.target_level
    }

    pub fn set_level(&mut self, level: f32) {
        self.target_level = level.max(0.0);
    }
}

impl AudioNode for GainNode {
    fn get_ports(&self) -> HashMap<PortId, bool> {
        let mut ports = HashMap::new();
        ports.insert(PortId::AudioInput0, false);
        ports.insert(PortId::AudioInput1, false);
        ports.insert(PortId::AudioOutput0, true);
        ports.insert(PortId::AudioOutput1, true);
        ports
    }

    fn process(
        &mut self,
        inputs: &HashMap<PortId, &[f32]>,
        outputs: &mut HashMap<PortId, &mut [f32]>,
        buffer_size: usize,
    ) {
        // Precompute the ramp once, then apply it to both channels so the
        // stereo image does not wobble during a level change.
        let mut ramp = vec![0.0; buffer_size];
        for value in ramp.iter_mut() {
            self.level += self.smoothing_factor * (self.target_level - self.level);
            *value = self.level;
        }

        let pairs = [
            (PortId::AudioInput0, PortId::AudioOutput0),
            (PortId::AudioInput1, PortId::AudioOutput1),
        ];
        for (input_port, output_port) in pairs {
            let Some(out) = outputs.get_mut(&output_port) else {
                continue;
            };
            match inputs.get(&input_port) {
                Some(input) => {
                    for i in 0..buffer_size {
                        out[i] = input[i] * ramp[i];
                    }
                }
                None => out[..buffer_size].fill(0.0),
            }
        }
    }

    fn reset(&mut self) {
        self.level = self.target_level;
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
        "gain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_block(node: &mut GainNode, input: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; input.len()];
        let mut inputs = HashMap::new();
        inputs.insert(PortId::AudioInput0, input);
        let mut outputs = HashMap::new();
        outputs.insert(PortId::AudioOutput0, out.as_mut_slice());
        node.process(&inputs, &mut outputs, input.len());
        out
    }

    #[test]
    fn applies_its_level() {
        let mut node = GainNode::new(0.5);
        let out = run_block(&mut node, &[1.0; 256]);
        assert!((out[255] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn level_changes_ramp() {
        let mut node = GainNode::new(1.0);
        run_block(&mut node, &[1.0; 64]);
        node.set_level(0.0);
        let out = run_block(&mut node, &[1.0; 64]);
        // First sample after the change has barely moved; no hard step.
        assert!(out[0] > 0.9, "stepped to {}", out[0]);
        assert!(out[63] < out[0]);
    }

    #[test]
    fn missing_input_yields_silence() {
        let mut node = GainNode::new(1.0);
        let mut out = vec![1.0; 32];
        let mut outputs = HashMap::new();
        outputs.insert(PortId::AudioOutput0, out.as_mut_slice());
        node.process(&HashMap::new(), &mut outputs, 32);
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
