use std::any::Any;
use std::collections::HashMap;

use crate::biquad::{Biquad, Filter};
use crate::traits::{AudioNode, PortId};

/// The therapy notch: one biquad per channel, both tuned to the same
/// center frequency. This node is long-lived across sound switches so the
/// filter state never restarts mid-session.
pub struct NotchFilterNode {
    left: Biquad,
    right: Biquad,
    active: bool,
}

impl NotchFilterNode {
    pub fn new(sample_rate: f32, frequency: f32, q: f32) -> Self {
        Self {
            left: Biquad::new(sample_rate, frequency, q),
            right: Biquad::new(sample_rate, frequency, q),
            active: true,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.left.frequency()
    }

    /// Live retune of both channels.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.left.set_frequency(frequency);
        self.right.set_frequency(frequency);
    }
}

impl AudioNode for NotchFilterNode {
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
        let channels = [
            (PortId::AudioInput0, PortId::AudioOutput0),
            (PortId::AudioInput1, PortId::AudioOutput1),
        ];
        for (input_port, output_port) in channels {
            let Some(out) = outputs.get_mut(&output_port) else {
                continue;
            };
            let filter = if input_port == PortId::AudioInput0 {
                &mut self.left
            } else {
                &mut self.right
            };
            match inputs.get(&input_port) {
                Some(input) => {
                    for i in 0..buffer_size {
                        out[i] = filter.process(input[i]);
                    }
                }
                None => out[..buffer_size].fill(0.0),
            }
        }
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
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
        "notch_filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn both_channels_are_filtered() {
        let sample_rate = 48_000.0;
        let mut node = NotchFilterNode::new(sample_rate, 1_000.0, 30.0);

        let input: Vec<f32> = (0..48_000)
            .map(|i| (TAU * 1_000.0 * i as f32 / sample_rate).sin())
            .collect();
        let mut left = vec![0.0; input.len()];
        let mut right = vec![0.0; input.len()];

        // Feed in blocks the way the graph does.
        for (block, (out_l, out_r)) in input
            .chunks(512)
            .zip(left.chunks_mut(512).zip(right.chunks_mut(512)))
        {
            let mut inputs = HashMap::new();
            inputs.insert(PortId::AudioInput0, block);
            inputs.insert(PortId::AudioInput1, block);
            let mut outputs = HashMap::new();
            outputs.insert(PortId::AudioOutput0, out_l);
            outputs.insert(PortId::AudioOutput1, out_r);
            node.process(&inputs, &mut outputs, block.len());
        }

        for channel in [&left, &right] {
            let tail = &channel[24_000..];
            let rms = (tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32).sqrt();
            assert!(rms < 0.05, "rms {rms}");
        }
    }
}
