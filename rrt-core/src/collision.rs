//! Segment/obstacle intersection tests.
//!
//! Crossing is decided with the orientation test only. A crossing must be
//! proper: each segment's endpoints lie strictly on opposite sides of the
//! other segment. Collinear overlaps and endpoint touches report no
//! intersection. Near-zero cross products can flip either way under floating
//! point error; that approximation is accepted.

use glam::DVec2;

use crate::{obstacle::ObstacleSet, tree::Tree, types::ConnectionId};

/// Turn direction of an ordered point triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

impl Orientation {
    /// Orientation of `r` relative to the directed segment `p -> q`.
    pub fn of(p: DVec2, q: DVec2, r: DVec2) -> Self {
        let cross = (q - p).perp_dot(r - q);
        if cross > 0.0 {
            Orientation::CounterClockwise
        } else if cross < 0.0 {
            Orientation::Clockwise
        } else {
            Orientation::Collinear
        }
    }

    #[inline]
    fn opposes(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Orientation::Clockwise, Orientation::CounterClockwise)
                | (Orientation::CounterClockwise, Orientation::Clockwise)
        )
    }
}

/// Returns `true` if segments `a1-a2` and `b1-b2` properly cross.
pub fn segments_intersect(a1: DVec2, a2: DVec2, b1: DVec2, b2: DVec2) -> bool {
    let b_sides = Orientation::of(a1, a2, b1).opposes(Orientation::of(a1, a2, b2));
    let a_sides = Orientation::of(b1, b2, a1).opposes(Orientation::of(b1, b2, a2));
    b_sides && a_sides
}

/// Returns `true` if segment `a-b` crosses any side of the closed polygon.
pub fn segment_crosses_polygon(a: DVec2, b: DVec2, polygon: &[DVec2]) -> bool {
    let n = polygon.len();
    (0..n).any(|i| segments_intersect(a, b, polygon[i], polygon[(i + 1) % n]))
}

/// Returns `true` if segment `a-b` crosses any obstacle at time `t`.
pub fn segment_blocked(obstacles: &ObstacleSet, a: DVec2, b: DVec2, t: f64) -> bool {
    obstacles
        .shapes
        .iter()
        .any(|s| segment_crosses_polygon(a, b, &s.polygon_at(t)))
}

/// Returns `true` if the connection crosses any obstacle at time `t`.
///
/// The synthetic root-entry edge has no start point and never collides.
pub fn intersects(tree: &Tree, conn: ConnectionId, obstacles: &ObstacleSet, t: f64) -> bool {
    let c = tree.connection(conn);
    let Some(start) = c.start else {
        return false;
    };
    segment_blocked(
        obstacles,
        tree.node(start).location,
        tree.node(c.end).location,
        t,
    )
}
