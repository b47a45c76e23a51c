//! The audio processing graph: nodes, connections, and buffer routing.
//!
//! Nodes are processing units behind the [`AudioNode`] trait; connections
//! route audio between their ports, with every input summing its sources
//! additively. Each port owns a block buffer from a shared pool, and nodes
//! run in a topologically sorted order so upstream signal is always ready.
//!
//! Unlike a build-once synth patch, the therapy graph is edited while it
//! runs: the playback source is replaced on every sound switch while the
//! filter and gain stages stay put. `remove_node` therefore returns the
//! node's buffers to the pool, sweeps its connections, and is a no-op for
//! ids that are already gone, so teardown paths can never double-fault.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::HashMap;

use super::buffer_pool::AudioBufferPool;
use super::types::{Connection, ConnectionKey, NodeId};
use crate::{AudioNode, PortId};

pub struct AudioGraph {
    nodes: FxHashMap<NodeId, Box<dyn AudioNode>>,
    connections: FxHashMap<ConnectionKey, Connection>,
    processing_order: Vec<NodeId>,
    buffer_size: usize,
    buffer_pool: AudioBufferPool,
    node_buffers: FxHashMap<(NodeId, PortId), usize>,
    input_connections: FxHashMap<NodeId, Vec<(PortId, usize, f32)>>,
    output_node: Option<NodeId>,
    next_node_id: u64,
}

impl AudioGraph {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            nodes: FxHashMap::default(),
            connections: FxHashMap::default(),
            processing_order: Vec::new(),
            buffer_size,
            buffer_pool: AudioBufferPool::new(buffer_size, 32),
            node_buffers: FxHashMap::default(),
            input_connections: FxHashMap::default(),
            output_node: None,
            next_node_id: 0,
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn processing_order(&self) -> &[NodeId] {
        &self.processing_order
    }

    pub fn output_node(&self) -> Option<NodeId> {
        self.output_node
    }

    pub fn set_output_node(&mut self, node: NodeId) {
        self.output_node = Some(node);
        self.update_processing_order();
    }

    pub fn add_node(&mut self, node: Box<dyn AudioNode>) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        // Allocate a block buffer for each port
        for (port, _) in node.get_ports() {
            let buffer_idx = self.buffer_pool.acquire(self.buffer_size);
            self.node_buffers.insert((id, port), buffer_idx);
        }

        self.nodes.insert(id, node);
        self.update_processing_order();
        id
    }

    /// Removes a node, its buffers, and every connection touching it.
    /// Removing an id that is not in the graph is a no-op.
    pub fn remove_node(&mut self, node_id: NodeId) {
        if self.nodes.remove(&node_id).is_none() {
            return;
        }

        let ports: Vec<(NodeId, PortId)> = self
            .node_buffers
            .keys()
            .filter(|(id, _)| *id == node_id)
            .copied()
            .collect();
        for key in ports {
            if let Some(buffer_idx) = self.node_buffers.remove(&key) {
                self.buffer_pool.release(buffer_idx);
            }
        }

        self.connections
            .retain(|_, conn| conn.from_node != node_id && conn.to_node != node_id);

        if self.output_node == Some(node_id) {
            self.output_node = None;
        }

        self.rebuild_input_connections();
        self.update_processing_order();
    }

    pub fn connect(&mut self, connection: Connection) -> ConnectionKey {
        let key = ConnectionKey::from(&connection);
        self.connections.insert(key, connection);
        self.rebuild_input_connections();
        self.update_processing_order();
        key
    }

    /// Typed access to a node for live parameter updates.
    pub fn node_mut<T: AudioNode>(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.nodes
            .get_mut(&node_id)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub fn node_ref<T: AudioNode>(&self, node_id: NodeId) -> Option<&T> {
        self.nodes.get(&node_id)?.as_any().downcast_ref::<T>()
    }

    /// Drops every node and connection and returns all buffers to the pool.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.input_connections.clear();
        self.processing_order.clear();
        self.output_node = None;

        let indices: Vec<usize> = self.node_buffers.values().copied().collect();
        for buffer_idx in indices {
            self.buffer_pool.release(buffer_idx);
        }
        self.node_buffers.clear();
    }

    fn rebuild_input_connections(&mut self) {
        self.input_connections.clear();
        for conn in self.connections.values() {
            if let Some(&source_idx) = self.node_buffers.get(&(conn.from_node, conn.from_port)) {
                self.input_connections.entry(conn.to_node).or_default().push((
                    conn.to_port,
                    source_idx,
                    conn.amount,
                ));
            }
        }
    }

    fn update_processing_order(&mut self) {
        self.processing_order.clear();
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();

        let mut visited = FxHashSet::default();
        for id in ids {
            self.visit_node(id, &mut visited);
        }
    }

    fn visit_node(&mut self, node_id: NodeId, visited: &mut FxHashSet<NodeId>) {
        if !visited.insert(node_id) {
            return;
        }

        // Visit all nodes that feed into this one first
        let mut upstream: Vec<NodeId> = self
            .connections
            .values()
            .filter(|conn| conn.to_node == node_id)
            .map(|conn| conn.from_node)
            .collect();
        upstream.sort();
        upstream.dedup();

        for from_id in upstream {
            if self.nodes.contains_key(&from_id) {
                self.visit_node(from_id, visited);
            }
        }

        self.processing_order.push(node_id);
    }

    /// Renders one block into the output slices. The designated output
    /// node's stereo ports feed the result; with no output node (or an
    /// inactive one) the block is silence.
    pub fn process_block(&mut self, output_left: &mut [f32], output_right: &mut [f32]) {
        let buffer_size = self.buffer_size;

        for &buffer_idx in self.node_buffers.values() {
            self.buffer_pool.clear(buffer_idx);
        }

        let order = self.processing_order.clone();
        for node_id in order {
            let Some(node) = self.nodes.get(&node_id) else {
                continue;
            };
            // Inactive nodes keep their cleared (silent) output buffers.
            if !node.should_process() {
                continue;
            }
            let ports = node.get_ports();

            // Sum every connection into its destination port.
            let mut input_data: HashMap<PortId, Vec<f32>> = HashMap::new();
            if let Some(connections) = self.input_connections.get(&node_id) {
                for &(port, source_idx, amount) in connections {
                    let source = self.buffer_pool.copy_out(source_idx);
                    let accum = input_data
                        .entry(port)
                        .or_insert_with(|| vec![0.0; buffer_size]);
                    for (acc, &sample) in accum.iter_mut().zip(source) {
                        *acc += sample * amount;
                    }
                }
            }
            let inputs: HashMap<PortId, &[f32]> = input_data
                .iter()
                .map(|(&port, data)| (port, data.as_slice()))
                .collect();

            let output_ports: Vec<(PortId, usize)> = ports
                .iter()
                .filter(|(_, &is_output)| is_output)
                .filter_map(|(&port, _)| {
                    self.node_buffers
                        .get(&(node_id, port))
                        .map(|&idx| (port, idx))
                })
                .collect();
            let indices: Vec<usize> = output_ports.iter().map(|&(_, idx)| idx).collect();

            let mut output_buffers = self.buffer_pool.get_multiple_buffers_mut(&indices);
            let mut outputs: HashMap<PortId, &mut [f32]> = HashMap::new();
            for ((port, _), (_, buffer)) in output_ports.iter().zip(output_buffers.iter_mut()) {
                outputs.insert(*port, &mut **buffer);
            }

            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.process(&inputs, &mut outputs, buffer_size);
            }
        }

        output_left.fill(0.0);
        output_right.fill(0.0);

        let Some(output_node) = self.output_node else {
            return;
        };
        if !self
            .nodes
            .get(&output_node)
            .is_some_and(|node| node.is_active())
        {
            return;
        }
        if let Some(&left_idx) = self.node_buffers.get(&(output_node, PortId::AudioOutput0)) {
            let frames = output_left.len().min(buffer_size);
            let left = self.buffer_pool.copy_out(left_idx);
            output_left[..frames].copy_from_slice(&left[..frames]);

            if let Some(&right_idx) = self.node_buffers.get(&(output_node, PortId::AudioOutput1)) {
                let right = self.buffer_pool.copy_out(right_idx);
                output_right[..frames].copy_from_slice(&right[..frames]);
            } else {
                output_right[..frames].copy_from_slice(&left[..frames]);
            }
        }
    }
}

impl std::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraph")
            .field("buffer_size", &self.buffer_size)
            .field("num_nodes", &self.nodes.len())
            .field("num_connections", &self.connections.len())
            .finish()
    }
}
