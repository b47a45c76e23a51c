//! The audio device: the capability surface the therapy session drives.
//!
//! Owns the processing graph, a long-lived master gain (the output sink),
//! and the analyser tap. Mirrors the shape of a browser audio context:
//! node factories, a connect primitive, a current-time reference, and a
//! `resume` gate. The device renders silence and its clock holds until
//! the host resumes it.

use thiserror::Error;

use crate::audio::SampleBuffer;
use crate::graph::{AudioGraph, Connection, NodeId};
use crate::nodes::{Analyser, GainNode, LoopingSampler, NotchFilterNode, TestToneOscillator};
use crate::traits::PortId;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unsupported sample rate {0}")]
    UnsupportedSampleRate(f32),
    #[error("unsupported block size {0}")]
    UnsupportedBlockSize(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct DeviceConfig {
    pub sample_rate: f32,
    pub block_size: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            block_size: 512,
        }
    }
}

pub struct AudioDevice {
    graph: AudioGraph,
    master: NodeId,
    analyser: Analyser,
    sample_rate: f32,
    block_size: usize,
    samples_rendered: u64,
    running: bool,
}

impl AudioDevice {
    pub fn new(config: DeviceConfig) -> Result<Self, DeviceError> {
        if !config.sample_rate.is_finite() || config.sample_rate <= 0.0 {
            return Err(DeviceError::UnsupportedSampleRate(config.sample_rate));
        }
        if config.block_size == 0 {
            return Err(DeviceError::UnsupportedBlockSize(config.block_size));
        }

        let mut graph = AudioGraph::new(config.block_size);
        let master = graph.add_node(Box::new(GainNode::new(1.0)));
        graph.set_output_node(master);

        Ok(Self {
            graph,
            master,
            analyser: Analyser::new(),
            sample_rate: config.sample_rate,
            block_size: config.block_size,
            samples_rendered: 0,
            running: false,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Seconds of audio rendered so far; the scheduling time reference.
    pub fn current_time(&self) -> f64 {
        self.samples_rendered as f64 / self.sample_rate as f64
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts the device clock. Until this is called the device renders
    /// silence, the analog of a suspended context waiting on a user
    /// gesture. Calling it again is a no-op.
    pub fn resume(&mut self) {
        if !self.running {
            tracing::debug!("audio device resumed");
            self.running = true;
        }
    }

    pub fn create_test_tone(&mut self, frequency: f32) -> NodeId {
        self.graph
            .add_node(Box::new(TestToneOscillator::new(self.sample_rate, frequency)))
    }

    pub fn create_gain(&mut self, level: f32) -> NodeId {
        self.graph.add_node(Box::new(GainNode::new(level)))
    }

    pub fn create_notch(&mut self, frequency: f32, q: f32) -> NodeId {
        self.graph
            .add_node(Box::new(NotchFilterNode::new(self.sample_rate, frequency, q)))
    }

    pub fn create_buffer_source(&mut self, buffer: SampleBuffer, looping: bool) -> NodeId {
        self.graph
            .add_node(Box::new(LoopingSampler::new(buffer, looping)))
    }

    /// Connects both stereo channels of `from` into `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        for (from_port, to_port) in [
            (PortId::AudioOutput0, PortId::AudioInput0),
            (PortId::AudioOutput1, PortId::AudioInput1),
        ] {
            self.graph.connect(Connection {
                from_node: from,
                from_port,
                to_node: to,
                to_port,
                amount: 1.0,
            });
        }
    }

    /// Connects a node into the long-lived output sink.
    pub fn connect_to_master(&mut self, from: NodeId) {
        self.connect(from, self.master);
    }

    /// Removes a node and everything routed through it. Safe to call with
    /// an id that was already removed.
    pub fn remove_node(&mut self, node_id: NodeId) {
        self.graph.remove_node(node_id);
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.graph.contains(node_id)
    }

    /// Master output level, i.e. the session volume.
    pub fn set_master_level(&mut self, level: f32) {
        let master = self.master;
        if let Some(gain) = self.graph.node_mut::<GainNode>(master) {
            gain.set_level(level);
        }
    }

    /// Live-retunes a test tone oscillator. Unknown ids are ignored.
    pub fn set_tone_frequency(&mut self, node_id: NodeId, frequency: f32) {
        if let Some(osc) = self.graph.node_mut::<TestToneOscillator>(node_id) {
            osc.set_frequency(frequency);
        }
    }

    /// Live-retunes a notch filter. Unknown ids are ignored.
    pub fn set_notch_frequency(&mut self, node_id: NodeId, frequency: f32) {
        if let Some(notch) = self.graph.node_mut::<NotchFilterNode>(node_id) {
            notch.set_frequency(frequency);
        }
    }

    pub fn set_gain_level(&mut self, node_id: NodeId, level: f32) {
        if let Some(gain) = self.graph.node_mut::<GainNode>(node_id) {
            gain.set_level(level);
        }
    }

    /// Most recent time-domain bytes from the master bus.
    pub fn analyser_snapshot(&self) -> Vec<u8> {
        self.analyser.snapshot()
    }

    /// Renders one block. Before `resume()` this produces silence and the
    /// device clock does not advance.
    pub fn render(&mut self, output_left: &mut [f32], output_right: &mut [f32]) {
        if !self.running {
            output_left.fill(0.0);
            output_right.fill(0.0);
            return;
        }

        self.graph.process_block(output_left, output_right);
        self.analyser.push_block(output_left, output_right);
        self.samples_rendered += output_left.len() as u64;
    }

    /// Releases every graph resource. The device is inert afterwards; a
    /// new one must be created to play again.
    pub fn shutdown(&mut self) {
        tracing::debug!("audio device shut down");
        self.graph.clear();
        self.analyser.clear();
        self.running = false;
    }
}
