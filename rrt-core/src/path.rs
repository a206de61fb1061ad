use crate::{
    tree::Tree,
    types::{ConnectionId, NodeId},
};

/// A chain of connections from a target node back to the root.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    /// Connection ids ordered goal-ward first, root-ward last.
    pub connections: Vec<ConnectionId>,
    pub target: NodeId,
    /// `target.t + target.len`, the time at which the target is reached.
    pub arrival_time: f64,
}

impl Path {
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Nodes along the path, from the target to the root inclusive.
    pub fn node_ids(&self, tree: &Tree) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.connections.len() + 1);
        ids.push(self.target);
        ids.extend(
            self.connections
                .iter()
                .filter_map(|&c| tree.connection(c).start),
        );
        ids
    }
}

/// Walks from `target` back to the root, collecting connections.
///
/// Returns `None` as soon as an invalid connection is met. The root itself
/// yields an empty path.
pub fn find_path(tree: &Tree, target: NodeId) -> Option<Path> {
    let mut connections = Vec::new();
    let mut current = target;

    while current != Tree::ROOT {
        let Some(cid) = tree.incoming(current) else {
            unreachable!("non-root node {current} has no incoming connection");
        };
        let conn = tree.connection(cid);
        if !conn.valid {
            return None;
        }
        connections.push(cid);
        let Some(start) = conn.start else {
            unreachable!("connection {cid} into node {current} has no start");
        };
        current = start;
    }

    Some(Path {
        connections,
        target,
        arrival_time: tree.node(target).arrival_time(),
    })
}
