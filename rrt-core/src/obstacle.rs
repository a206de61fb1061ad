use std::f64::consts::PI;

use glam::{DVec2, DVec3};

use crate::geometry::Shape;

/// Fixed collection of moving obstacles.
///
/// Obstacles are never mutated after construction; every query is a pure
/// function of the simulated time.
#[derive(Clone, Debug, Default)]
pub struct ObstacleSet {
    pub shapes: Vec<Shape>,
}

impl ObstacleSet {
    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    /// The four-obstacle scene: a drifting pentagon, a spinning diamond, a
    /// slowly turning bar and a drifting quadrilateral.
    pub fn demo() -> Self {
        let pentagon = Shape::new(
            [
                DVec2::new(-40.0, -40.0),
                DVec2::new(40.0, -40.0),
                DVec2::new(60.0, 0.0),
                DVec2::new(40.0, 40.0),
                DVec2::new(-40.0, 40.0),
            ],
            DVec3::new(100.0, 100.0, 0.0),
            DVec3::new(30.0, -30.0, 0.0),
        );

        let diamond = Shape::new(
            [
                DVec2::new(0.0, -40.0),
                DVec2::new(40.0, 0.0),
                DVec2::new(0.0, 40.0),
                DVec2::new(-40.0, 0.0),
            ],
            DVec3::new(200.0, 240.0, 0.0),
            DVec3::new(0.0, 10.0, -PI / 3.0),
        );

        let bar = Shape::new(
            [
                DVec2::new(-50.0, -20.0),
                DVec2::new(50.0, -20.0),
                DVec2::new(50.0, 20.0),
                DVec2::new(-50.0, 20.0),
            ],
            DVec3::new(300.0, 300.0, 0.0),
            DVec3::new(6.0, 0.0, PI / 10.0),
        );

        let quad = Shape::new(
            [
                DVec2::new(-30.0, -10.0),
                DVec2::new(20.0, -20.0),
                DVec2::new(10.0, 20.0),
                DVec2::new(-50.0, 20.0),
            ],
            DVec3::new(50.0, 300.0, 0.0),
            DVec3::new(30.0, -10.0, 0.0),
        );

        Self::from_shapes(vec![pentagon, diamond, bar, quad])
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// World-space polygon of every obstacle at time `t`.
    pub fn polygons_at(&self, t: f64) -> Vec<Vec<DVec2>> {
        self.shapes.iter().map(|s| s.polygon_at(t)).collect()
    }
}
