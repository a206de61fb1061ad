//! Core of a time-aware rapidly-exploring random tree (RRT) planner for a 2-D
//! workspace with moving, rotating polygonal obstacles.
//!
//! Main components:
//! - [`geometry`] — rotation operators and time-parameterized polygons.
//! - [`obstacle`] — the fixed set of moving obstacles.
//! - [`tree`] — arena-backed search tree of nodes and connections.
//! - [`collision`] — segment/obstacle intersection at a given time.
//! - [`phases`] — growth-step phases: fan-out, branching, lengths, validity.
//! - [`path`] — extraction of goal paths back to the root.
//! - [`planner`] — the time-driven facade tying everything together.
//! - [`config`] — tunable parameters of the planner.
//! - [`error`] — error types.
//! - [`types`] — shared id aliases.

pub mod collision;
pub mod config;
pub mod error;
pub mod geometry;
pub mod obstacle;
pub mod path;
pub mod phases;
pub mod planner;
pub mod tree;
pub mod types;
