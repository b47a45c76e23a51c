use soundmask::AudioRenderer;

/// Carry buffer between the renderer's fixed block size and whatever
/// frame counts the cpal callback asks for.
pub struct HostBuffer<R: AudioRenderer> {
    pub renderer: R,
    pub carry_left: Vec<f32>,
    pub carry_right: Vec<f32>,
    pub carry_index: usize,
    pub carry_available: usize,
    pub engine_block_size: usize,
}

impl<R: AudioRenderer> HostBuffer<R> {
    pub fn new(renderer: R, engine_block_size: usize) -> Self {
        Self {
            renderer,
            carry_left: vec![0.0; engine_block_size],
            carry_right: vec![0.0; engine_block_size],
            carry_index: 0,
            carry_available: 0,
            engine_block_size,
        }
    }
}
