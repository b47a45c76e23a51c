//! The therapy session controller.
//!
//! Owns the audio device and the live node handles, and exposes the whole
//! control surface the UI layer calls: frequency/volume updates, sound
//! selection, the test tone, therapy start/stop/switch, the visualization
//! pull, and the 30-minute auto-stop.
//!
//! Lifecycle rules the handles encode:
//! - the notch filter and therapy gain are created lazily and survive a
//!   live sound switch, so switching never clicks and never restarts the
//!   filter state;
//! - the buffer source is replaced on every start and every switch;
//! - every stop path is idempotent and releases exactly the nodes it owns.

use crate::device::{AudioDevice, DeviceConfig};
use crate::graph::NodeId;
use crate::render::AudioRenderer;
use crate::synthesis::{self, SoundTexture};

pub const MIN_FREQUENCY_HZ: u32 = 250;
pub const MAX_FREQUENCY_HZ: u32 = 16_000;

/// Narrowness of the masking notch.
pub const NOTCH_Q: f32 = 30.0;
/// Fixed therapy-chain gain; leaves headroom for unclamped synthesis peaks.
pub const THERAPY_GAIN: f32 = 0.7;
/// Fixed test-tone gain ahead of the master volume.
pub const TEST_TONE_GAIN: f32 = 0.3;
/// Therapy auto-stops after 30 minutes.
pub const AUTO_STOP_SECS: u32 = 1_800;

const DEFAULT_FREQUENCY_HZ: u32 = 4_000;
const DEFAULT_VOLUME: f32 = 0.5;

/// The single source of truth the UI renders from.
#[derive(Debug, Clone, Copy)]
pub struct TherapyState {
    pub frequency_hz: u32,
    pub volume: f32,
    pub sound: SoundTexture,
    pub test_tone_playing: bool,
    pub therapy_playing: bool,
    /// Device time at the last non-switching therapy start.
    pub started_at: f64,
    pub elapsed_secs: u32,
}

impl Default for TherapyState {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            volume: DEFAULT_VOLUME,
            sound: SoundTexture::WhiteNoise,
            test_tone_playing: false,
            therapy_playing: false,
            started_at: 0.0,
            elapsed_secs: 0,
        }
    }
}

/// Live device handles. `None` means the stage does not currently exist.
#[derive(Default)]
struct GraphHandles {
    test_tone: Option<NodeId>,
    test_gain: Option<NodeId>,
    source: Option<NodeId>,
    notch: Option<NodeId>,
    therapy_gain: Option<NodeId>,
}

type AutoStopCallback = Box<dyn FnMut() + Send>;

pub struct TherapySession {
    /// `None` when device creation failed; every playback operation then
    /// degrades to a silent no-op.
    device: Option<AudioDevice>,
    state: TherapyState,
    handles: GraphHandles,
    auto_stop: Option<AutoStopCallback>,
    auto_stop_fired: bool,
    /// Frames rendered toward the next one-second tick.
    tick_phase: u64,
}

impl TherapySession {
    pub fn new(config: DeviceConfig) -> Self {
        let device = match AudioDevice::new(config) {
            Ok(device) => {
                tracing::info!(
                    sample_rate = device.sample_rate(),
                    block_size = device.block_size(),
                    "therapy session ready"
                );
                Some(device)
            }
            Err(err) => {
                // Reported once; afterwards the controls go quiet instead
                // of erroring on every call.
                tracing::warn!(error = %err, "audio device unavailable, playback disabled");
                None
            }
        };

        Self {
            device,
            state: TherapyState::default(),
            handles: GraphHandles::default(),
            auto_stop: None,
            auto_stop_fired: false,
            tick_phase: 0,
        }
    }

    pub fn with_default_device() -> Self {
        Self::new(DeviceConfig::default())
    }

    /// True when device creation failed and playback is disabled.
    pub fn is_degraded(&self) -> bool {
        self.device.is_none()
    }

    pub fn state(&self) -> &TherapyState {
        &self.state
    }

    pub fn sample_rate(&self) -> Option<f32> {
        self.device.as_ref().map(AudioDevice::sample_rate)
    }

    /// Registers the auto-stop notification. A later registration replaces
    /// the earlier one.
    pub fn on_auto_stop(&mut self, callback: impl FnMut() + Send + 'static) {
        self.auto_stop = Some(Box::new(callback));
    }

    /// Sets the masking frequency, clamped to [250, 16000] Hz. A running
    /// test tone and notch filter are retuned live.
    pub fn set_frequency(&mut self, frequency_hz: i64) {
        let clamped = frequency_hz.clamp(MIN_FREQUENCY_HZ as i64, MAX_FREQUENCY_HZ as i64) as u32;
        self.state.frequency_hz = clamped;

        if let Some(device) = &mut self.device {
            if let Some(id) = self.handles.test_tone {
                device.set_tone_frequency(id, clamped as f32);
            }
            if let Some(id) = self.handles.notch {
                device.set_notch_frequency(id, clamped as f32);
            }
        }
    }

    /// Sets the output volume, clamped to [0, 1], applied live.
    pub fn set_volume(&mut self, volume: f32) {
        let clamped = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.state.volume = clamped;
        if let Some(device) = &mut self.device {
            device.set_master_level(clamped);
        }
    }

    /// Selects a texture; if therapy is running the new sound is switched
    /// in without stopping the session or its timer.
    pub fn select_sound(&mut self, texture: SoundTexture) {
        self.state.sound = texture;
        if self.state.therapy_playing {
            self.start_therapy_internal(texture, true);
        }
    }

    /// UI-boundary variant taking a string id; unknown ids play white noise.
    pub fn select_sound_id(&mut self, id: &str) {
        self.select_sound(SoundTexture::from_id(id));
    }

    /// Starts the test tone at the current frequency. Independent of the
    /// therapy chain; both can run at once. No-op if already sounding or
    /// if the device is unavailable.
    pub fn play_test_tone(&mut self) {
        let Some(device) = &mut self.device else {
            return;
        };
        if self.state.test_tone_playing {
            return;
        }

        device.resume();
        let tone = device.create_test_tone(self.state.frequency_hz as f32);
        let gain = device.create_gain(TEST_TONE_GAIN);
        device.connect(tone, gain);
        device.connect_to_master(gain);

        self.handles.test_tone = Some(tone);
        self.handles.test_gain = Some(gain);
        self.state.test_tone_playing = true;
        tracing::debug!(frequency_hz = self.state.frequency_hz, "test tone on");
    }

    /// Stops the test tone. Safe to call when it never started.
    pub fn stop_test_tone(&mut self) {
        self.state.test_tone_playing = false;
        let tone = self.handles.test_tone.take();
        let gain = self.handles.test_gain.take();
        if let Some(device) = &mut self.device {
            for id in [tone, gain].into_iter().flatten() {
                device.remove_node(id);
            }
        }
    }

    /// Starts therapy with `texture`. If therapy is already running this
    /// is a no-op; use [`toggle_therapy`](Self::toggle_therapy) or
    /// [`select_sound`](Self::select_sound) for stop/switch behavior.
    pub fn start_therapy(&mut self, texture: SoundTexture) {
        if self.state.therapy_playing {
            return;
        }
        self.start_therapy_internal(texture, false);
    }

    /// UI-level toggle: stops when playing, starts otherwise.
    pub fn toggle_therapy(&mut self, texture: SoundTexture) {
        if self.state.therapy_playing {
            self.stop_therapy();
        } else {
            self.start_therapy(texture);
        }
    }

    fn start_therapy_internal(&mut self, texture: SoundTexture, switching: bool) {
        let Some(device) = &mut self.device else {
            return;
        };

        device.resume();
        self.state.sound = texture;

        if switching {
            // Only the source is replaced; filter and gain keep running so
            // the swap does not click.
            if let Some(source) = self.handles.source.take() {
                device.remove_node(source);
            }
        }

        // Synchronous synthesis; a short pause on switch is accepted.
        let buffer = synthesis::synthesize_default(texture, device.sample_rate());
        tracing::debug!(
            sound = texture.id(),
            frames = buffer.frames(),
            switching,
            "therapy source built"
        );
        let source = device.create_buffer_source(buffer, true);

        let notch = match self.handles.notch {
            Some(id) => id,
            None => {
                let id = device.create_notch(self.state.frequency_hz as f32, NOTCH_Q);
                self.handles.notch = Some(id);
                id
            }
        };
        if self.handles.therapy_gain.is_none() {
            let gain = device.create_gain(THERAPY_GAIN);
            device.connect(notch, gain);
            device.connect_to_master(gain);
            self.handles.therapy_gain = Some(gain);
        }

        device.connect(source, notch);
        self.handles.source = Some(source);
        self.state.therapy_playing = true;

        if !switching {
            self.state.started_at = device.current_time();
            self.state.elapsed_secs = 0;
            self.auto_stop_fired = false;
            self.tick_phase = 0;
            tracing::info!(sound = texture.id(), "therapy started");
        }
    }

    /// Stops therapy and releases the source, notch and gain nodes.
    /// Idempotent: stopping twice, or before any start, does nothing.
    pub fn stop_therapy(&mut self) {
        let was_playing = self.state.therapy_playing;
        self.state.therapy_playing = false;

        let source = self.handles.source.take();
        let notch = self.handles.notch.take();
        let gain = self.handles.therapy_gain.take();
        if let Some(device) = &mut self.device {
            for id in [source, notch, gain].into_iter().flatten() {
                device.remove_node(id);
            }
        }

        if was_playing {
            tracing::info!(elapsed_secs = self.state.elapsed_secs, "therapy stopped");
        }
    }

    /// Most recent time-domain snapshot for waveform drawing, or `None`
    /// while therapy is not playing. Safe to call once per rendered frame.
    pub fn visualization_snapshot(&self) -> Option<Vec<u8>> {
        if !self.state.therapy_playing {
            return None;
        }
        self.device.as_ref().map(AudioDevice::analyser_snapshot)
    }

    /// Advances the session clock by one second. At 30 minutes of
    /// continuous therapy the session stops itself and fires the
    /// registered callback exactly once.
    pub fn tick(&mut self) {
        if !self.state.therapy_playing {
            return;
        }
        self.state.elapsed_secs += 1;

        if self.state.elapsed_secs >= AUTO_STOP_SECS && !self.auto_stop_fired {
            self.auto_stop_fired = true;
            tracing::info!("therapy auto-stop reached");
            self.stop_therapy();
            if let Some(callback) = &mut self.auto_stop {
                callback();
            }
        }
    }

    /// Releases every device resource. The session stays usable as a
    /// state record but cannot play afterwards.
    pub fn shutdown(&mut self) {
        self.stop_test_tone();
        self.stop_therapy();
        if let Some(mut device) = self.device.take() {
            device.shutdown();
        }
    }

    #[cfg(test)]
    pub(crate) fn handles_for_tests(&self) -> (Option<NodeId>, Option<NodeId>, Option<NodeId>) {
        (
            self.handles.source,
            self.handles.notch,
            self.handles.therapy_gain,
        )
    }
}

impl AudioRenderer for TherapySession {
    /// Renders one block and advances the session clock with it, ticking
    /// once per second of rendered audio.
    fn process_block(&mut self, output_left: &mut [f32], output_right: &mut [f32]) {
        let frames = output_left.len() as u64;
        match &mut self.device {
            Some(device) => device.render(output_left, output_right),
            None => {
                output_left.fill(0.0);
                output_right.fill(0.0);
            }
        }

        if !self.state.therapy_playing {
            return;
        }
        let rate = match &self.device {
            Some(device) => device.sample_rate() as u64,
            None => return,
        };
        self.tick_phase += frames;
        while self.tick_phase >= rate {
            self.tick_phase -= rate;
            self.tick();
        }
    }
}

impl Drop for TherapySession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn session() -> TherapySession {
        TherapySession::new(DeviceConfig {
            sample_rate: 48_000.0,
            block_size: 256,
        })
    }

    fn degraded_session() -> TherapySession {
        TherapySession::new(DeviceConfig {
            sample_rate: 0.0,
            block_size: 256,
        })
    }

    #[test]
    fn frequency_is_clamped() {
        let mut s = session();
        s.set_frequency(-100);
        assert_eq!(s.state().frequency_hz, 250);
        s.set_frequency(99_999);
        assert_eq!(s.state().frequency_hz, 16_000);
        s.set_frequency(4_000);
        assert_eq!(s.state().frequency_hz, 4_000);
    }

    #[test]
    fn volume_is_clamped() {
        let mut s = session();
        s.set_volume(1.7);
        assert_eq!(s.state().volume, 1.0);
        s.set_volume(-0.3);
        assert_eq!(s.state().volume, 0.0);
        s.set_volume(f32::NAN);
        assert_eq!(s.state().volume, 0.0);
    }

    #[test]
    fn toggle_starts_then_stops() {
        let mut s = session();
        s.toggle_therapy(SoundTexture::Rain);
        assert!(s.state().therapy_playing);
        s.toggle_therapy(SoundTexture::Rain);
        assert!(!s.state().therapy_playing);
    }

    #[test]
    fn redundant_start_does_not_stop() {
        let mut s = session();
        s.start_therapy(SoundTexture::Rain);
        s.start_therapy(SoundTexture::Rain);
        assert!(s.state().therapy_playing);
    }

    #[test]
    fn switch_keeps_filter_and_gain_but_replaces_source() {
        let mut s = session();
        s.start_therapy(SoundTexture::Rain);
        s.state.elapsed_secs = 42;
        let (source_before, notch_before, gain_before) = s.handles_for_tests();

        s.select_sound(SoundTexture::Forest);

        assert!(s.state().therapy_playing);
        assert_eq!(s.state().sound, SoundTexture::Forest);
        // The timer keeps counting through a switch.
        assert_eq!(s.state().elapsed_secs, 42);

        let (source_after, notch_after, gain_after) = s.handles_for_tests();
        assert_ne!(source_before, source_after);
        assert_eq!(notch_before, notch_after);
        assert_eq!(gain_before, gain_after);
    }

    #[test]
    fn double_stop_is_harmless() {
        let mut s = session();
        s.start_therapy(SoundTexture::Temple);
        s.stop_therapy();
        assert!(!s.state().therapy_playing);
        s.stop_therapy();
        assert!(!s.state().therapy_playing);
    }

    #[test]
    fn stop_without_start_is_harmless() {
        let mut s = session();
        s.stop_therapy();
        s.stop_test_tone();
        assert!(!s.state().therapy_playing);
    }

    #[test]
    fn auto_stop_fires_exactly_once_at_thirty_minutes() {
        let mut s = session();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        s.on_auto_stop(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        s.start_therapy(SoundTexture::Night);
        for _ in 0..AUTO_STOP_SECS + 10 {
            s.tick();
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!s.state().therapy_playing);
    }

    #[test]
    fn switch_does_not_reset_the_auto_stop_timer() {
        let mut s = session();
        s.start_therapy(SoundTexture::Rain);
        for _ in 0..AUTO_STOP_SECS - 1 {
            s.tick();
        }
        s.select_sound(SoundTexture::Wave);
        assert_eq!(s.state().elapsed_secs, AUTO_STOP_SECS - 1);
        s.tick();
        assert!(!s.state().therapy_playing);
    }

    #[test]
    fn test_tone_is_orthogonal_to_therapy() {
        let mut s = session();
        s.play_test_tone();
        s.start_therapy(SoundTexture::WhiteNoise);
        assert!(s.state().test_tone_playing);
        assert!(s.state().therapy_playing);

        s.stop_therapy();
        assert!(s.state().test_tone_playing);
        s.stop_test_tone();
        assert!(!s.state().test_tone_playing);
    }

    #[test]
    fn snapshot_is_none_unless_playing() {
        let mut s = session();
        assert!(s.visualization_snapshot().is_none());
        s.start_therapy(SoundTexture::Rain);
        assert!(s.visualization_snapshot().is_some());
        s.stop_therapy();
        assert!(s.visualization_snapshot().is_none());
    }

    #[test]
    fn degraded_session_no_ops() {
        let mut s = degraded_session();
        assert!(s.is_degraded());

        s.play_test_tone();
        assert!(!s.state().test_tone_playing);

        s.start_therapy(SoundTexture::Rain);
        assert!(!s.state().therapy_playing);
        assert!(s.visualization_snapshot().is_none());

        // Parameter updates still track state for the UI.
        s.set_frequency(500);
        assert_eq!(s.state().frequency_hz, 500);
    }

    #[test]
    fn process_block_ticks_once_per_second_of_audio() {
        let mut s = session();
        s.start_therapy(SoundTexture::WhiteNoise);

        let mut left = vec![0.0; 256];
        let mut right = vec![0.0; 256];
        // Enough 256-frame blocks to cross three seconds of audio.
        let blocks = (3 * 48_000) / 256 + 1;
        for _ in 0..blocks {
            s.process_block(&mut left, &mut right);
        }
        assert_eq!(s.state().elapsed_secs, 3);
    }

    #[test]
    fn therapy_audio_reaches_the_output() {
        let mut s = session();
        s.set_volume(1.0);
        s.start_therapy(SoundTexture::WhiteNoise);

        let mut left = vec![0.0; 256];
        let mut right = vec![0.0; 256];
        let mut energy = 0.0;
        for _ in 0..32 {
            s.process_block(&mut left, &mut right);
            energy += left.iter().map(|s| s * s).sum::<f32>();
        }
        assert!(energy > 0.0);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut s = session();
        s.play_test_tone();
        s.start_therapy(SoundTexture::Rain);
        s.shutdown();

        assert!(!s.state().therapy_playing);
        assert!(!s.state().test_tone_playing);
        assert!(s.is_degraded());
    }
}
