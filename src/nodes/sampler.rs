use std::any::Any;
use std::collections::HashMap;

use crate::audio::SampleBuffer;
use crate::traits::{AudioNode, PortId};

/// Plays back an owned [`SampleBuffer`], wrapping at the end when looping.
///
/// This is the replaceable stage of the therapy chain: a new sampler is
/// created for every start and every live sound switch, and removing it
/// from the graph drops the buffer with it.
pub struct LoopingSampler {
    buffer: SampleBuffer,
    playhead: usize,
    looping: bool,
    finished: bool,
    active: bool,
}

impl LoopingSampler {
    pub fn new(buffer: SampleBuffer, looping: bool) -> Self {
        let finished = buffer_is_unplayable(&buffer);
        Self {
            buffer,
            playhead: 0,
            looping,
            finished,
            active: true,
        }
    }

    /// True once a non-looping playback has consumed its buffer.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn frames(&self) -> usize {
        self.buffer.frames()
    }
}

fn buffer_is_unplayable(buffer: &SampleBuffer) -> bool {
    buffer.is_empty()
}

impl AudioNode for LoopingSampler {
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
        let frames = self.buffer.frames();
        let mut left = vec![0.0; buffer_size];
        let mut right = vec![0.0; buffer_size];

        if !self.finished && frames > 0 {
            for i in 0..buffer_size {
                if self.finished {
                    break;
                }
                let (l, r) = self.buffer.frame_wrapped(self.playhead);
                left[i] = l;
                right[i] = r;
                self.playhead += 1;
                if self.playhead >= frames {
                    if self.looping {
                        self.playhead = 0;
                    } else {
                        self.finished = true;
                    }
                }
            }
        }

        if let Some(out) = outputs.get_mut(&PortId::AudioOutput0) {
            out[..buffer_size].copy_from_slice(&left);
        }
        if let Some(out) = outputs.get_mut(&PortId::AudioOutput1) {
            out[..buffer_size].copy_from_slice(&right);
        }
    }

    fn reset(&mut self) {
        self.playhead = 0;
        self.finished = buffer_is_unplayable(&self.buffer);
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
        "looping_sampler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(frames: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::new(frames, 48_000.0);
        let [left, right] = buffer.channels_mut();
        for i in 0..frames {
            left[i] = i as f32;
            right[i] = -(i as f32);
        }
        buffer
    }

    fn render(sampler: &mut LoopingSampler, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        let mut outputs = HashMap::new();
        outputs.insert(PortId::AudioOutput0, left.as_mut_slice());
        outputs.insert(PortId::AudioOutput1, right.as_mut_slice());
        sampler.process(&HashMap::new(), &mut outputs, frames);
        (left, right)
    }

    #[test]
    fn looping_wraps_to_the_start() {
        let mut sampler = LoopingSampler::new(ramp_buffer(4), true);
        let (left, right) = render(&mut sampler, 10);
        assert_eq!(left, vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0, 1.0]);
        assert_eq!(right[3], -3.0);
        assert!(!sampler.is_finished());
    }

    #[test]
    fn one_shot_playback_finishes_with_silence() {
        let mut sampler = LoopingSampler::new(ramp_buffer(4), false);
        let (left, _) = render(&mut sampler, 8);
        assert_eq!(left, vec![0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(sampler.is_finished());
    }
}
