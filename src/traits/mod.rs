use std::any::Any;
use std::collections::HashMap;

/// Port identifiers for the audio graph. The therapy graph is a plain
/// stereo signal chain, so only audio ports exist; parameter changes go
/// through typed node accessors instead of modulation inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortId {
    AudioInput0,
    AudioInput1,
    AudioOutput0,
    AudioOutput1,
}

impl PortId {
    pub fn is_audio_input(&self) -> bool {
        matches!(self, PortId::AudioInput0 | PortId::AudioInput1)
    }

    pub fn is_audio_output(&self) -> bool {
        matches!(self, PortId::AudioOutput0 | PortId::AudioOutput1)
    }
}

// Send so a session owning a graph can live on a playback host's audio
// thread.
pub trait AudioNode: Any + Send {
    fn get_ports(&self) -> HashMap<PortId, bool>;

    fn process(
        &mut self,
        inputs: &HashMap<PortId, &[f32]>,
        outputs: &mut HashMap<PortId, &mut [f32]>,
        buffer_size: usize,
    );

    fn reset(&mut self);

    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn as_any(&self) -> &dyn Any;

    // Active state management
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);

    fn node_type(&self) -> &str;

    // Helper to determine if node should be processed
    fn should_process(&self) -> bool {
        self.is_active()
    }
}
