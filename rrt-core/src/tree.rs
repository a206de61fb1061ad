use std::collections::HashMap;

use glam::DVec2;

use crate::types::{ConnectionId, NodeId};

/// A sampled point of the search tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub location: DVec2,
    /// Simulated time at which the node was created.
    pub t: f64,
    /// Travel time from the root along the tree.
    pub len: f64,
    /// Cleared when the path from the root to this node is blocked.
    pub valid: bool,
}

/// A directed edge of the search tree.
///
/// `start` is `None` only for the synthetic entry edge into the root.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub start: Option<NodeId>,
    pub end: NodeId,
    pub t: f64,
    /// Travel time from the root to `end`.
    pub len: f64,
    pub valid: bool,
}

/// Canonical `start -> end` key used to detect duplicate edges.
pub type EdgeKey = (Option<NodeId>, NodeId);

impl Node {
    fn new(id: NodeId, location: DVec2, t: f64) -> Self {
        Self {
            id,
            location,
            t,
            len: 0.0,
            valid: true,
        }
    }

    /// Simulated time at which the robot can first stand on this node.
    #[inline]
    pub fn arrival_time(&self) -> f64 {
        self.t + self.len
    }

    /// Whether the node has been reached by simulated time `t`.
    #[inline]
    pub fn is_reached(&self, t: f64) -> bool {
        self.arrival_time() <= t
    }
}

impl Connection {
    fn new(id: ConnectionId, start: Option<NodeId>, end: NodeId, t: f64) -> Self {
        Self {
            id,
            start,
            end,
            t,
            len: 0.0,
            valid: true,
        }
    }

    /// Key of this edge in the tree's duplicate index.
    #[inline]
    pub fn key(&self) -> EdgeKey {
        (self.start, self.end)
    }

    /// Simulated time at which `end` is reached through this edge.
    #[inline]
    pub fn arrival_time(&self) -> f64 {
        self.t + self.len
    }

    #[inline]
    pub fn is_reached(&self, t: f64) -> bool {
        self.arrival_time() <= t
    }
}

/// Arena-backed rooted search tree.
///
/// Nodes and connections are only ever appended; ids are stable handles into
/// `nodes` and `connections`. Node `0` is the root and the only node without
/// an incoming connection. The synthetic `None -> root` entry edge is kept
/// apart from the arena so that `connections.len() == nodes.len() - 1`.
#[derive(Debug)]
pub struct Tree {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    /// Outgoing connections per node, in insertion order.
    children: Vec<Vec<ConnectionId>>,
    /// The single incoming connection per node; `None` for the root.
    incoming: Vec<Option<ConnectionId>>,
    by_key: HashMap<EdgeKey, ConnectionId>,
    root_entry: Connection,
}

impl Tree {
    /// Id of the root node.
    pub const ROOT: NodeId = 0;

    /// Creates a tree holding only the root at `root_location`.
    pub fn new(root_location: DVec2, t: f64) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            children: Vec::new(),
            incoming: Vec::new(),
            by_key: HashMap::new(),
            root_entry: Connection::new(ConnectionId::MAX, None, Self::ROOT, 0.0),
        };
        tree.add_node(root_location, &[], t);
        tree
    }

    /// The start node.
    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    /// The synthetic, always-valid edge leading into the root.
    pub fn root_entry(&self) -> &Connection {
        &self.root_entry
    }

    /// Node by id.
    ///
    /// ### Panics
    /// If `id` was not handed out by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Connection by id. Panics like [`Tree::node`] on a foreign id.
    pub fn connection(&self, id: ConnectionId) -> &Connection {
        &self.connections[id]
    }

    /// Outgoing connections of `id`, in insertion order.
    pub fn children_of(&self, id: NodeId) -> &[ConnectionId] {
        &self.children[id]
    }

    /// The connection ending at `id`, or `None` for the root.
    pub fn incoming(&self, id: NodeId) -> Option<ConnectionId> {
        self.incoming[id]
    }

    /// Whether an edge `start -> end` has already been added.
    pub fn has_connection(&self, start: Option<NodeId>, end: NodeId) -> bool {
        self.by_key.contains_key(&(start, end))
    }

    /// Id of the edge `start -> end`, if present.
    pub fn find_connection(&self, start: Option<NodeId>, end: NodeId) -> Option<ConnectionId> {
        self.by_key.get(&(start, end)).copied()
    }

    /// Appends a node and connects it from every parent candidate that is not
    /// already connected to it.
    pub fn add_node(&mut self, location: DVec2, parents: &[NodeId], t: f64) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id, location, t));
        self.children.push(Vec::with_capacity(4));
        self.incoming.push(None);

        for &parent in parents {
            if !self.has_connection(Some(parent), id) {
                self.add_connection(parent, id, t);
            }
        }
        id
    }

    /// Creates and indexes a single connection `start -> end`.
    ///
    /// Callers must reject duplicates beforehand; inserting an edge into a
    /// node that already has a parent breaks the tree and is a fault.
    pub fn add_connection(&mut self, start: NodeId, end: NodeId, t: f64) -> ConnectionId {
        debug_assert!(
            !self.has_connection(Some(start), end),
            "duplicate connection {start} -> {end}"
        );
        debug_assert!(
            end != Self::ROOT && self.incoming[end].is_none(),
            "node {end} already has a parent"
        );

        let id = self.connections.len();
        let conn = Connection::new(id, Some(start), end, t);
        self.by_key.insert(conn.key(), id);
        self.connections.push(conn);
        self.children[start].push(id);
        self.incoming[end] = Some(id);
        id
    }

    /// Finds the node closest to `pos`.
    ///
    /// ### Returns
    /// The node id and the **squared** distance, or `None` for an empty tree.
    pub fn find_nearest_node(&self, pos: DVec2) -> Option<(NodeId, f64)> {
        let mut best = None;
        let mut best_d2 = f64::MAX;
        for (id, n) in self.nodes.iter().enumerate() {
            let d2 = (n.location - pos).length_squared();
            if d2 < best_d2 {
                best_d2 = d2;
                best = Some(id);
            }
        }
        best.map(|id| (id, best_d2))
    }
}
