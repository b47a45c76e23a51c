//! Audio renderer trait for playback hosts.

/// Implemented by anything a playback host can pull audio from: the cpal
/// host and the offline WAV renderer both drive a session through this.
pub trait AudioRenderer: Send + 'static {
    /// Process a block of audio, filling the provided buffers
    fn process_block(&mut self, output_left: &mut [f32], output_right: &mut [f32]);
}
