/// Time-domain analyser tap on the master bus.
///
/// Keeps the most recent [`Analyser::SIZE`] mono-mixed samples in a ring
/// and exports them Web-Audio style: bytes centered on 128, oldest first.
/// Reading a snapshot is side-effect-free and cheap enough to call once
/// per rendered frame.
pub struct Analyser {
    ring: Vec<f32>,
    write_pos: usize,
}

impl Analyser {
    pub const SIZE: usize = 2048;

    pub fn new() -> Self {
        Self {
            ring: vec![0.0; Self::SIZE],
            write_pos: 0,
        }
    }

    /// Feeds one rendered block, mono-mixing the two channels.
    pub fn push_block(&mut self, left: &[f32], right: &[f32]) {
        for (&l, &r) in left.iter().zip(right) {
            self.ring[self.write_pos] = 0.5 * (l + r);
            self.write_pos = (self.write_pos + 1) % Self::SIZE;
        }
    }

    /// The last `SIZE` samples as unsigned bytes, oldest first. Silence
    /// maps to 128; full scale maps to 0/255.
    pub fn snapshot(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        for i in 0..Self::SIZE {
            let sample = self.ring[(self.write_pos + i) % Self::SIZE];
            out.push(((sample + 1.0) * 128.0).clamp(0.0, 255.0) as u8);
        }
        out
    }

    pub fn clear(&mut self) {
        self.ring.fill(0.0);
        self.write_pos = 0;
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_maps_to_center_bytes() {
        let analyser = Analyser::new();
        assert!(analyser.snapshot().iter().all(|&b| b == 128));
    }

    #[test]
    fn extremes_are_clamped() {
        let mut analyser = Analyser::new();
        analyser.push_block(&[1.5, -1.5], &[1.5, -1.5]);
        let snapshot = analyser.snapshot();
        let newest = &snapshot[Analyser::SIZE - 2..];
        assert_eq!(newest, &[255, 0]);
    }

    #[test]
    fn snapshot_is_oldest_first() {
        let mut analyser = Analyser::new();
        let block: Vec<f32> = (0..Analyser::SIZE + 4).map(|i| i as f32 * 1e-4).collect();
        analyser.push_block(&block, &block);
        let snapshot = analyser.snapshot();
        // Monotonic ramp survives the ring wrap.
        assert!(snapshot.windows(2).all(|w| w[0] <= w[1]));
    }
}
