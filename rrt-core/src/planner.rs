//! Time-driven RRT planner.
//!
//! [`Planner`] owns the search tree, the obstacle set, the goal and the RNG.
//! The caller feeds it strictly increasing simulated times through
//! [`Planner::advance`]; each call runs exactly one growth step to
//! completion. Between calls, [`Planner::snapshot`] hands out a consistent
//! read-only view for rendering.

use glam::DVec2;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{ConfigError, PlannerError, Result},
    obstacle::ObstacleSet,
    path::Path,
    phases,
    tree::{Connection, Node, Tree},
};

/// Read-only view of the planner between growth steps.
#[derive(Debug)]
pub struct Snapshot<'a> {
    /// Simulated time the obstacles are posed at.
    pub time: f64,
    pub start: DVec2,
    pub goal: DVec2,
    pub nodes: &'a [Node],
    pub connections: &'a [Connection],
    /// World-space obstacle polygons at `time`, one per shape.
    pub obstacles: Vec<Vec<DVec2>>,
    /// World-space centroid of each shape at `time`; `None` for degenerate
    /// shapes.
    pub centroids: Vec<Option<DVec2>>,
    pub solution: Option<&'a Path>,
}

#[derive(Debug)]
pub struct Planner {
    tree: Tree,
    obstacles: ObstacleSet,
    goal: DVec2,
    cfg: Config,
    rng: StdRng,
    last_time: f64,
    solution: Option<Path>,
    /// Path found by the seeded branch, handed out by the next `advance`.
    pending: Option<Path>,
}

impl Planner {
    /// Builds a planner rooted at `start` and grows the first branch at
    /// time `0`.
    ///
    /// ### Errors
    /// [`PlannerError::Config`] if `cfg` fails validation.
    pub fn new(start: DVec2, goal: DVec2, obstacles: ObstacleSet, cfg: Config) -> Result<Self> {
        cfg.validate()?;

        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut planner = Self {
            tree: Tree::new(start, 0.0),
            obstacles,
            goal,
            cfg,
            rng,
            last_time: 0.0,
            solution: None,
            pending: None,
        };

        let seeded = phases::grow_branch(
            &mut planner.tree,
            &planner.obstacles,
            &planner.cfg,
            planner.goal,
            Tree::ROOT,
            0.0,
            &mut planner.rng,
        );
        planner.pending = planner.record(seeded);

        debug!(
            ?start,
            ?goal,
            obstacles = planner.obstacles.len(),
            "planner initialized"
        );
        Ok(planner)
    }

    /// Runs one growth step at time `t`.
    ///
    /// ### Returns
    /// The path to the goal the first time one is found; `None` on every
    /// other step, including all steps after a path has been reported. A
    /// path already reached by the branch grown in [`Planner::new`] is
    /// returned by the first accepted call.
    ///
    /// ### Errors
    /// [`PlannerError::NonIncreasingTime`] if `t` is not greater than the
    /// last processed time. The tree is left untouched.
    pub fn advance(&mut self, t: f64) -> Result<Option<Path>> {
        if !(t > self.last_time) {
            warn!(t, last = self.last_time, "rejected out-of-order advance");
            return Err(PlannerError::NonIncreasingTime {
                t,
                last: self.last_time,
            });
        }
        self.last_time = t;

        let found = phases::fan_out_phase(
            &mut self.tree,
            &self.obstacles,
            &self.cfg,
            self.goal,
            t,
            &mut self.rng,
        );
        let found = self.record(found);
        Ok(self.pending.take().or(found))
    }

    /// Keeps the first path found for the current goal and reports it once.
    fn record(&mut self, found: Option<Path>) -> Option<Path> {
        if self.solution.is_some() {
            return None;
        }
        let path = found?;
        info!(
            target_node = path.target,
            hops = path.len(),
            arrival_time = path.arrival_time,
            "path to goal found"
        );
        self.solution = Some(path.clone());
        Some(path)
    }

    /// Replaces the goal. A path found for the previous goal is forgotten.
    pub fn set_goal(&mut self, goal: DVec2) {
        info!(?goal, "goal changed");
        self.goal = goal;
        self.solution = None;
        self.pending = None;
    }

    /// Changes the fan-out damping used from the next step on.
    ///
    /// ### Errors
    /// [`PlannerError::Config`] if `weight` is not positive.
    pub fn set_branch_weight(&mut self, weight: f64) -> Result<()> {
        if !(weight > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "branch_weight must be positive, got {weight}"
            ))
            .into());
        }
        self.cfg.branch_weight = weight;
        Ok(())
    }

    /// View with obstacles posed at the last processed time.
    pub fn snapshot(&self) -> Snapshot<'_> {
        self.snapshot_at(self.last_time)
    }

    /// View of the current tree with obstacles posed at `t`.
    ///
    /// `t` only moves the obstacles; the tree is whatever the last
    /// [`Planner::advance`] left behind. The viewer scrubs through time
    /// this way without growing the tree.
    pub fn snapshot_at(&self, t: f64) -> Snapshot<'_> {
        Snapshot {
            time: t,
            start: self.tree.root().location,
            goal: self.goal,
            nodes: &self.tree.nodes,
            connections: &self.tree.connections,
            obstacles: self.obstacles.polygons_at(t),
            centroids: self
                .obstacles
                .shapes
                .iter()
                .map(|shape| shape.world_centroid(t).ok())
                .collect(),
            solution: self.solution.as_ref(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    pub fn goal(&self) -> DVec2 {
        self.goal
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    pub fn solution(&self) -> Option<&Path> {
        self.solution.as_ref()
    }
}
