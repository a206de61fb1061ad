//! Growth-step phases of the planner.
//!
//! One growth step at simulated time `t` looks like:
//! 1. [`fan_out_phase`] — every node present at the start of the step gets
//!    one Bernoulli trial with probability [`branch_probability`]; each
//!    success calls [`grow_branch`].
//! 2. [`grow_branch`] — samples a goal-biased point with
//!    [`sample_branch_point`], attaches it to the trunk, then reruns
//!    [`length_phase`] and [`validity_phase`] over the whole tree and checks
//!    whether the new node reached the goal.

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

use crate::{
    collision,
    config::Config,
    error::SamplingExhausted,
    obstacle::ObstacleSet,
    path::{Path, find_path},
    tree::Tree,
    types::NodeId,
};

/// Standard deviation of the sampled branch direction around the goal
/// bearing, in radians.
pub const ANGLE_STDDEV: f64 = 0.2;

/// Angle added to the branch direction after each out-of-bounds sample.
pub const ANGLE_STEP: f64 = PI / 10.0;

/// Probability that a node sprouts a branch when the tree holds
/// `node_count` nodes: `1 - tanh(node_count / branch_weight)`.
///
/// Non-increasing in `node_count`, equal to `1` for an empty tree.
#[inline]
pub fn branch_probability(node_count: usize, branch_weight: f64) -> f64 {
    1.0 - (node_count as f64 / branch_weight).tanh()
}

/// Samples a new branch end point off `trunk`, biased toward `goal`.
///
/// The direction is drawn from a normal distribution around the bearing to
/// the goal and wrapped into `[0, 2π)`. Each attempt draws a length uniformly
/// from `[cfg.branch_len_min, cfg.branch_len_max]`; a point outside the
/// workspace turns the direction by [`ANGLE_STEP`] and tries again.
///
/// ### Parameters
/// - `trunk` - Location of the node the branch grows from.
/// - `goal` - Current goal; only its bearing from `trunk` is used.
/// - `cfg` - Branch length range, workspace bounds and retry budget.
/// - `rng` - Source of the direction noise and the branch lengths.
///
/// ### Errors
/// [`SamplingExhausted`] after `cfg.max_sampling_retries` failed attempts.
pub fn sample_branch_point(
    trunk: DVec2,
    goal: DVec2,
    cfg: &Config,
    rng: &mut impl Rng,
) -> Result<DVec2, SamplingExhausted> {
    let to_goal = goal - trunk;
    let goal_angle = to_goal.y.atan2(to_goal.x);
    let noise: f64 = rng.sample(StandardNormal);
    let mut angle = (goal_angle + ANGLE_STDDEV * noise).rem_euclid(TAU);

    for _ in 0..cfg.max_sampling_retries {
        let dist = rng.random_range(cfg.branch_len_min..=cfg.branch_len_max);
        let candidate = trunk + DVec2::from_angle(angle) * dist;
        if cfg.in_bounds(candidate) {
            return Ok(candidate);
        }
        angle = (angle + ANGLE_STEP).rem_euclid(TAU);
    }

    Err(SamplingExhausted {
        retries: cfg.max_sampling_retries,
    })
}

/// Recomputes travel times for the whole tree.
///
/// Walks depth-first from the root with an explicit stack. Every node is
/// written once per pass: `len(child) = len(parent) + |parent - child| /
/// traversal_rate`, and each connection takes the `len` of its end node.
///
/// ### Parameters
/// - `tree` - The tree to update; `len` is overwritten on every reachable
///   node and connection.
/// - `traversal_rate` - Distance covered per unit of simulated time.
pub fn length_phase(tree: &mut Tree, traversal_rate: f64) {
    let mut visited = vec![false; tree.nodes.len()];
    visited[Tree::ROOT] = true;
    tree.nodes[Tree::ROOT].len = 0.0;

    let mut stack = vec![Tree::ROOT];
    while let Some(node) = stack.pop() {
        let base = tree.nodes[node].len;
        let from = tree.nodes[node].location;

        for k in 0..tree.children_of(node).len() {
            let cid = tree.children_of(node)[k];
            let end = tree.connections[cid].end;
            if visited[end] {
                continue;
            }
            visited[end] = true;

            let len = base + from.distance(tree.nodes[end].location) / traversal_rate;
            tree.nodes[end].len = len;
            tree.connections[cid].len = len;
            stack.push(end);
        }
    }
}

/// Re-evaluates `valid` on every connection and non-root node at time `t`.
///
/// Starts from the synthetic root-entry edge and walks depth-first. A
/// connection is valid iff it does not cross an obstacle at `t` and the
/// connection it was reached through is valid; its end node takes the same
/// flag. Invalidity therefore flows from a blocked edge to every descendant,
/// while the root itself is never touched.
///
/// ### Parameters
/// - `tree` - The tree whose `valid` flags are rewritten.
/// - `obstacles` - Obstacles, posed at `t` for every crossing test.
/// - `t` - Simulated time of the check.
pub fn validity_phase(tree: &mut Tree, obstacles: &ObstacleSet, t: f64) {
    let mut visited = vec![false; tree.nodes.len()];
    visited[Tree::ROOT] = true;

    let mut stack = vec![(Tree::ROOT, tree.root_entry().valid)];
    while let Some((node, incoming_valid)) = stack.pop() {
        for k in 0..tree.children_of(node).len() {
            let cid = tree.children_of(node)[k];
            let end = tree.connections[cid].end;

            let valid = incoming_valid && !collision::intersects(tree, cid, obstacles, t);
            tree.connections[cid].valid = valid;
            tree.nodes[end].valid = valid;

            if !visited[end] {
                visited[end] = true;
                stack.push((end, valid));
            }
        }
    }
}

/// Grows a single branch off `trunk` at time `t`.
///
/// 1. Samples an end point with [`sample_branch_point`]; an exhausted
///    sampler abandons the attempt without touching the tree.
/// 2. Adds the node and the `trunk -> node` connection.
/// 3. Reruns [`length_phase`] and [`validity_phase`].
/// 4. If the new node lies within `cfg.success_radius` of `goal`, tries
///    [`find_path`] from it.
///
/// ### Parameters
/// - `tree` - The tree to grow; gains one node and one connection unless
///   sampling is exhausted.
/// - `obstacles` - Obstacle set used by the validity pass.
/// - `cfg` - Sampling, traversal rate and success radius.
/// - `goal` - Point the branch is biased toward and tested against.
/// - `trunk` - Existing node the branch attaches to.
/// - `t` - Simulated time stamped on the new node and connection.
/// - `rng` - Random source passed on to [`sample_branch_point`].
///
/// ### Returns
/// A non-empty, fully valid [`Path`] if the new node reached the goal,
/// `None` otherwise.
pub fn grow_branch(
    tree: &mut Tree,
    obstacles: &ObstacleSet,
    cfg: &Config,
    goal: DVec2,
    trunk: NodeId,
    t: f64,
    rng: &mut impl Rng,
) -> Option<Path> {
    let trunk_loc = tree.nodes[trunk].location;
    let loc = match sample_branch_point(trunk_loc, goal, cfg, rng) {
        Ok(loc) => loc,
        Err(e) => {
            debug!(trunk, t, "branch abandoned: {e}");
            return None;
        }
    };

    let node = tree.add_node(loc, &[], t);
    tree.add_connection(trunk, node, t);

    length_phase(tree, cfg.traversal_rate);
    validity_phase(tree, obstacles, t);

    if loc.distance(goal) > cfg.success_radius {
        return None;
    }
    find_path(tree, node).filter(|p| !p.is_empty())
}

/// Runs one growth step over every node that exists when the step begins.
///
/// The fan-out probability is re-evaluated before each trial with the
/// current node count, so branches grown earlier in the step damp later
/// trials. Nodes added during the step do not branch until the next step.
///
/// ### Parameters
/// - `tree` - The tree to grow.
/// - `obstacles` - Obstacle set, forwarded to [`grow_branch`].
/// - `cfg` - Global configuration; `branch_weight` drives the trials.
/// - `goal` - Current goal.
/// - `t` - Simulated time of the step.
/// - `rng` - Random source for the trials and the branches.
///
/// ### Returns
/// The first path found during this step, if any. Later branches in the
/// same step still grow.
pub fn fan_out_phase(
    tree: &mut Tree,
    obstacles: &ObstacleSet,
    cfg: &Config,
    goal: DVec2,
    t: f64,
    rng: &mut impl Rng,
) -> Option<Path> {
    let trunks = tree.nodes.len();
    let mut found = None;
    let mut grown = 0usize;

    for trunk in 0..trunks {
        let p = branch_probability(tree.nodes.len(), cfg.branch_weight);
        if rng.random::<f64>() > p {
            continue;
        }
        grown += 1;
        if let Some(path) = grow_branch(tree, obstacles, cfg, goal, trunk, t, rng)
            && found.is_none()
        {
            found = Some(path);
        }
    }

    debug!(t, trunks, grown, nodes = tree.nodes.len(), "growth step");
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use glam::DVec3;
    use rand::{SeedableRng, rngs::StdRng};

    fn wall_at(x: f64, y: f64) -> ObstacleSet {
        ObstacleSet::from_shapes(vec![Shape::new(
            [
                DVec2::new(-5.0, -30.0),
                DVec2::new(5.0, -30.0),
                DVec2::new(5.0, 30.0),
                DVec2::new(-5.0, 30.0),
            ],
            DVec3::new(x, y, 0.0),
            DVec3::ZERO,
        )])
    }

    /// root (0,100) -> a (50,100) -> b (100,100) -> c (150,100), and
    /// root -> d (0,150).
    fn line_tree() -> (Tree, [NodeId; 4]) {
        let mut tree = Tree::new(DVec2::new(0.0, 100.0), 0.0);
        let a = tree.add_node(DVec2::new(50.0, 100.0), &[Tree::ROOT], 0.0);
        let b = tree.add_node(DVec2::new(100.0, 100.0), &[a], 0.0);
        let c = tree.add_node(DVec2::new(150.0, 100.0), &[b], 0.0);
        let d = tree.add_node(DVec2::new(0.0, 150.0), &[Tree::ROOT], 0.0);
        (tree, [a, b, c, d])
    }

    #[test]
    fn branch_probability_is_non_increasing() {
        let mut prev = branch_probability(0, 10.0);
        assert_eq!(prev, 1.0);
        for n in 1..200 {
            let p = branch_probability(n, 10.0);
            assert!(p <= prev, "p({n}) = {p} > p({}) = {prev}", n - 1);
            assert!((0.0..=1.0).contains(&p));
            prev = p;
        }
    }

    #[test]
    fn larger_branch_weight_branches_more() {
        assert!(branch_probability(10, 20.0) > branch_probability(10, 5.0));
    }

    #[test]
    fn sampled_points_are_in_bounds_and_in_range() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(3);
        let trunk = DVec2::new(200.0, 180.0);

        for _ in 0..500 {
            let p = sample_branch_point(trunk, DVec2::new(300.0, 350.0), &cfg, &mut rng).unwrap();
            assert!(cfg.in_bounds(p), "{p:?} out of bounds");
            let d = p.distance(trunk);
            assert!(
                d >= cfg.branch_len_min - 1e-9 && d <= cfg.branch_len_max + 1e-9,
                "length {d} out of range"
            );
        }
    }

    #[test]
    fn sampling_is_biased_toward_the_goal() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(11);
        let trunk = DVec2::new(100.0, 200.0);
        let goal = DVec2::new(300.0, 200.0);

        let toward = (0..200)
            .filter_map(|_| sample_branch_point(trunk, goal, &cfg, &mut rng).ok())
            .filter(|p| p.x > trunk.x)
            .count();
        assert!(toward > 190, "only {toward} of 200 samples head to the goal");
    }

    #[test]
    fn vertical_goal_bearing_is_well_defined() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(5);
        let trunk = DVec2::new(200.0, 50.0);
        let p = sample_branch_point(trunk, DVec2::new(200.0, 350.0), &cfg, &mut rng).unwrap();
        assert!(p.y > trunk.y, "{p:?} should head up toward the goal");
    }

    #[test]
    fn sampling_gives_up_after_retry_budget() {
        let cfg = Config {
            workspace: DVec2::new(1.0, 1.0),
            max_sampling_retries: 8,
            ..Config::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let err = sample_branch_point(DVec2::new(0.5, 0.5), DVec2::new(0.9, 0.9), &cfg, &mut rng)
            .unwrap_err();
        assert_eq!(err, SamplingExhausted { retries: 8 });
    }

    #[test]
    fn abandoned_branch_leaves_tree_untouched() {
        // No branch length fits inside a 1x1 workspace.
        let cfg = Config {
            workspace: DVec2::new(1.0, 1.0),
            max_sampling_retries: 4,
            ..Config::default()
        };
        let mut tree = Tree::new(DVec2::new(0.5, 0.5), 0.0);
        let mut rng = StdRng::seed_from_u64(12);

        let found = grow_branch(
            &mut tree,
            &ObstacleSet::default(),
            &cfg,
            DVec2::new(0.9, 0.9),
            Tree::ROOT,
            1.0,
            &mut rng,
        );
        assert!(found.is_none());
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.connections.len(), 0);
        assert!(tree.children_of(Tree::ROOT).is_empty());

        // Whichever trials succeed, their branches are abandoned too.
        for step in 1..=5 {
            let found = fan_out_phase(
                &mut tree,
                &ObstacleSet::default(),
                &cfg,
                DVec2::new(0.9, 0.9),
                step as f64,
                &mut rng,
            );
            assert!(found.is_none());
        }
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.connections.len(), 0);
    }

    #[test]
    fn length_phase_accumulates_along_each_branch() {
        let (mut tree, [a, b, c, d]) = line_tree();
        length_phase(&mut tree, 50.0);

        assert_eq!(tree.node(Tree::ROOT).len, 0.0);
        assert!((tree.node(a).len - 1.0).abs() < 1e-12);
        assert!((tree.node(b).len - 2.0).abs() < 1e-12);
        assert!((tree.node(c).len - 3.0).abs() < 1e-12);
        // Siblings do not accumulate each other's lengths.
        assert!((tree.node(d).len - 1.0).abs() < 1e-12);

        let bc = tree.incoming(c).unwrap();
        assert_eq!(tree.connection(bc).len, tree.node(c).len);
    }

    #[test]
    fn lengths_are_non_decreasing_from_the_root() {
        let (mut tree, _) = line_tree();
        length_phase(&mut tree, 50.0);
        for conn in &tree.connections {
            let start = conn.start.unwrap();
            assert!(tree.node(start).len <= tree.node(conn.end).len);
        }
    }

    #[test]
    fn blocked_root_edge_invalidates_all_descendants() {
        let (mut tree, [a, b, c, d]) = line_tree();
        // Wall across root -> a only.
        let obstacles = wall_at(25.0, 100.0);
        validity_phase(&mut tree, &obstacles, 0.0);

        assert!(tree.root().valid, "root must stay valid");
        for n in [a, b, c] {
            assert!(!tree.node(n).valid, "node {n} should be invalid");
            assert!(!tree.connection(tree.incoming(n).unwrap()).valid);
        }
        assert!(tree.node(d).valid, "unblocked sibling stays valid");
    }

    #[test]
    fn blocked_inner_edge_leaves_ancestors_valid() {
        let (mut tree, [a, b, c, _]) = line_tree();
        // Wall across a -> b.
        let obstacles = wall_at(75.0, 100.0);
        validity_phase(&mut tree, &obstacles, 0.0);

        assert!(tree.node(a).valid);
        assert!(!tree.node(b).valid);
        assert!(!tree.node(c).valid);
    }

    #[test]
    fn validity_recovers_once_obstacle_moves_on() {
        let (mut tree, [a, b, c, d]) = line_tree();
        let obstacles = ObstacleSet::from_shapes(vec![Shape::new(
            [
                DVec2::new(-5.0, -30.0),
                DVec2::new(5.0, -30.0),
                DVec2::new(5.0, 30.0),
                DVec2::new(-5.0, 30.0),
            ],
            DVec3::new(25.0, 100.0, 0.0),
            DVec3::new(0.0, 100.0, 0.0),
        )]);

        validity_phase(&mut tree, &obstacles, 0.0);
        assert!(!tree.node(c).valid);

        // By t = 1 the wall has moved up to y = 200, clear of every edge.
        validity_phase(&mut tree, &obstacles, 1.0);
        for n in [a, b, c, d] {
            assert!(tree.node(n).valid, "node {n} should be valid again");
        }
    }

    #[test]
    fn grow_branch_adds_one_node_and_edge() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut tree = Tree::new(DVec2::new(200.0, 180.0), 0.0);
        let far_goal = DVec2::new(390.0, 390.0);

        grow_branch(
            &mut tree,
            &ObstacleSet::default(),
            &cfg,
            far_goal,
            Tree::ROOT,
            1.0,
            &mut rng,
        );

        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.connections.len(), 1);
        let child = tree.node(1);
        assert_eq!(child.t, 1.0);
        let expected = tree.root().location.distance(child.location) / cfg.traversal_rate;
        assert!((child.len - expected).abs() < 1e-12);
    }

    #[test]
    fn grow_branch_reports_goal_within_radius() {
        // Goal radius covers the whole workspace, so any branch arrives.
        let cfg = Config {
            success_radius: 1_000.0,
            ..Config::default()
        };
        let mut rng = StdRng::seed_from_u64(2);
        let mut tree = Tree::new(DVec2::new(200.0, 180.0), 0.0);

        let path = grow_branch(
            &mut tree,
            &ObstacleSet::default(),
            &cfg,
            DVec2::new(300.0, 350.0),
            Tree::ROOT,
            1.0,
            &mut rng,
        )
        .expect("path within radius");

        assert_eq!(path.target, 1);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn fan_out_only_branches_from_pre_existing_nodes() {
        // branch_weight is huge so every trial succeeds.
        let cfg = Config {
            branch_weight: 1e12,
            ..Config::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        let mut tree = Tree::new(DVec2::new(200.0, 180.0), 0.0);

        fan_out_phase(
            &mut tree,
            &ObstacleSet::default(),
            &cfg,
            DVec2::new(390.0, 20.0),
            1.0,
            &mut rng,
        );
        assert_eq!(tree.nodes.len(), 2);

        fan_out_phase(
            &mut tree,
            &ObstacleSet::default(),
            &cfg,
            DVec2::new(390.0, 20.0),
            2.0,
            &mut rng,
        );
        assert_eq!(tree.nodes.len(), 4);
        assert_eq!(tree.connections.len(), 3);
    }
}
