/// Identifier for a node in a [`crate::tree::Tree`].
///
/// Ids are handed out sequentially starting at `0` for the root, and are
/// indices into `Tree::nodes`. They are only meaningful within the lifetime
/// of a given `Tree` instance.
pub type NodeId = usize;

/// Identifier for a connection (edge) in a [`crate::tree::Tree`].
///
/// This is an index into `Tree::connections`.
pub type ConnectionId = usize;
