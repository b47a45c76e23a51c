use crate::PortId;

/// Identifies a node for the lifetime of a graph. Ids are handed out from
/// a monotonic counter and never reused, so a stale handle to a removed
/// node can never alias a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// A signal route between two node ports. Multiple connections into the
/// same input port sum additively, each scaled by its `amount`.
#[derive(Clone, Copy, Debug)]
pub struct Connection {
    pub from_node: NodeId,
    pub from_port: PortId,
    pub to_node: NodeId,
    pub to_port: PortId,
    pub amount: f32,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ConnectionKey {
    pub from_node: NodeId,
    pub from_port: PortId,
    pub to_node: NodeId,
    pub to_port: PortId,
}

impl ConnectionKey {
    pub fn new(from_node: NodeId, from_port: PortId, to_node: NodeId, to_port: PortId) -> Self {
        Self {
            from_node,
            from_port,
            to_node,
            to_port,
        }
    }
}

impl From<&Connection> for ConnectionKey {
    fn from(connection: &Connection) -> Self {
        Self::new(
            connection.from_node,
            connection.from_port,
            connection.to_node,
            connection.to_port,
        )
    }
}
