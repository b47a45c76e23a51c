/// An owned, fixed-length stereo sample buffer.
///
/// Sample values are nominally in [-1, 1], but the synthesis recipes may
/// exceed that range transiently; downstream gain staging is expected to
/// provide the headroom. The buffer is created once per playback start or
/// sound switch and handed to the playback source, which owns it until the
/// source node is removed.
#[derive(Clone)]
pub struct SampleBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: f32,
}

impl SampleBuffer {
    /// Creates a silent stereo buffer of `frames` samples per channel.
    pub fn new(frames: usize, sample_rate: f32) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
            sample_rate,
        }
    }

    /// Number of samples per channel.
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Buffer duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate > 0.0 {
            self.frames() as f32 / self.sample_rate
        } else {
            0.0
        }
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Mutable access to both channels at once, for the synthesis fill loops.
    pub fn channels_mut(&mut self) -> [&mut [f32]; 2] {
        [&mut self.left, &mut self.right]
    }

    /// Sample pair at `frame`, wrapping around the end of the buffer.
    pub fn frame_wrapped(&self, frame: usize) -> (f32, f32) {
        if self.is_empty() {
            return (0.0, 0.0);
        }
        let i = frame % self.frames();
        (self.left[i], self.right[i])
    }
}

impl std::fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("frames", &self.frames())
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_wrapped_loops_past_the_end() {
        let mut buffer = SampleBuffer::new(4, 48_000.0);
        let [left, right] = buffer.channels_mut();
        for (i, sample) in left.iter_mut().enumerate() {
            *sample = i as f32;
        }
        right.copy_from_slice(&[10.0, 11.0, 12.0, 13.0]);

        assert_eq!(buffer.frame_wrapped(1), (1.0, 11.0));
        assert_eq!(buffer.frame_wrapped(5), (1.0, 11.0));
        assert_eq!(buffer.frame_wrapped(8), (0.0, 10.0));
    }

    #[test]
    fn duration_matches_frame_count() {
        let buffer = SampleBuffer::new(24_000, 48_000.0);
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-6);
    }
}
