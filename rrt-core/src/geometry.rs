//! Planar rigid-body geometry: rotation operators and time-parameterized
//! polygons.
//!
//! Poses and velocities are `(x, y, θ)` triples stored as [`DVec3`]. Corner
//! points are lifted to three components with a zero orientation so that the
//! same rotation operator applies to both.

use glam::{DMat3, DVec2, DVec3};

use crate::error::GeometryError;

/// Planar rotation operator by a fixed angle.
///
/// Built from the columns `[cos a, sin a, 0]`, `[-sin a, cos a, 0]`,
/// `[0, 0, 1]`; applying it sums each column scaled by the matching vector
/// component, which rotates the `(x, y)` part counter-clockwise by `a` and
/// leaves the orientation component untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    mat: DMat3,
}

impl Rotation {
    pub fn new(a: f64) -> Self {
        let (sin, cos) = a.sin_cos();
        Self {
            mat: DMat3::from_cols(
                DVec3::new(cos, sin, 0.0),
                DVec3::new(-sin, cos, 0.0),
                DVec3::Z,
            ),
        }
    }

    #[inline]
    pub fn apply(&self, v: DVec3) -> DVec3 {
        self.mat * v
    }
}

/// A polygon moving with constant linear and angular velocity.
///
/// `points` are the corners relative to the shape's local origin, ordered
/// clockwise from the upper-left corner. `t0` is the pose at time zero and
/// `velocity` is `(vx, vy, ω)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub points: Vec<DVec3>,
    pub t0: DVec3,
    pub velocity: DVec3,
}

impl Shape {
    /// Creates a shape from planar corner points.
    pub fn new(points: impl IntoIterator<Item = DVec2>, t0: DVec3, velocity: DVec3) -> Self {
        Self {
            points: points.into_iter().map(|p| p.extend(0.0)).collect(),
            t0,
            velocity,
        }
    }

    /// Creates a shape from corner points that already carry an orientation
    /// component.
    pub fn from_points3(points: Vec<DVec3>, t0: DVec3, velocity: DVec3) -> Self {
        Self {
            points,
            t0,
            velocity,
        }
    }

    /// Pose of the shape's center at time `t`: `t0 + velocity * t`.
    #[inline]
    pub fn location(&self, t: f64) -> DVec3 {
        self.t0 + self.velocity * t
    }

    /// Returns a copy with every corner rotated by `a` radians about the
    /// local origin. The pose and velocity are unchanged.
    pub fn rotate(&self, a: f64) -> Shape {
        let rot = Rotation::new(a);
        Shape {
            points: self.points.iter().map(|&p| rot.apply(p)).collect(),
            t0: self.t0,
            velocity: self.velocity,
        }
    }

    /// World-space corners at time `t`.
    ///
    /// Corners are rotated by `θ(t) = t0.θ + ω t` and then translated by
    /// [`Shape::location`]. The third component of each returned point is the
    /// heading at `t`.
    pub fn absolute_pos(&self, t: f64) -> Shape {
        let loc = self.location(t);
        let mut abs = self.rotate(loc.z);
        for p in &mut abs.points {
            *p += loc;
        }
        abs
    }

    /// World-space corners at time `t`, projected to the plane.
    pub fn polygon_at(&self, t: f64) -> Vec<DVec2> {
        self.absolute_pos(t)
            .points
            .iter()
            .map(|p| p.truncate())
            .collect()
    }

    /// Unsigned area by the shoelace formula.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (self.points[j], self.points[i]);
            sum += (a.x + b.x) * (a.y - b.y);
            j = i;
        }
        (sum / 2.0).abs()
    }

    /// Centroid of the corner polygon, shifted by `velocity * t`.
    ///
    /// The weighted sum is signed but [`Shape::area`] is not, so a polygon
    /// wound clockwise (y up) yields the centroid mirrored through the local
    /// origin. Origin-centred shapes are unaffected.
    ///
    /// This lives in the shape's translating frame: add `t0` (see
    /// [`Shape::world_centroid`]) to get workspace coordinates.
    ///
    /// ### Errors
    /// [`GeometryError::Degenerate`] if the polygon has zero area.
    pub fn centroid(&self, t: f64) -> Result<DVec2, GeometryError> {
        let area = self.area();
        if area == 0.0 {
            return Err(GeometryError::Degenerate { area });
        }

        let n = self.points.len();
        let mut c = DVec2::ZERO;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let cross = a.x * b.y - b.x * a.y;
            c.x += (a.x + b.x) * cross;
            c.y += (a.y + b.y) * cross;
        }
        c /= 6.0 * area;

        Ok(c + self.velocity.truncate() * t)
    }

    /// Centroid in workspace coordinates at time `t`.
    pub fn world_centroid(&self, t: f64) -> Result<DVec2, GeometryError> {
        Ok(self.centroid(t)? + self.t0.truncate())
    }
}
