//! Interactive viewer for the RRT planner built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Planner`] and implements
//! [`eframe::App`] to drive it from a time slider and render the tree,
//! obstacles and found path at the selected simulated time.

use eframe::App;
use glam::DVec2;
use rrt_core::{
    config::Config, error::PlannerError, obstacle::ObstacleSet, planner::Planner, types::NodeId,
};
use tracing::{error, info};

const START: DVec2 = DVec2::new(200.0, 180.0);
const GOAL: DVec2 = DVec2::new(300.0, 350.0);

/// How far past the last processed time the slider reaches while searching.
const FORWARD: f64 = 5.0;
const TIME_STEP: f64 = 0.1;

const VALID: egui::Color32 = egui::Color32::from_rgb(154, 255, 154);
const INVALID: egui::Color32 = egui::Color32::from_rgb(250, 128, 114);
const PATH: egui::Color32 = egui::Color32::from_rgb(72, 118, 255);
const OBSTACLE: egui::Color32 = egui::Color32::from_rgb(173, 216, 230);
const CENTROID: egui::Color32 = egui::Color32::from_rgb(70, 130, 180);
const GOAL_COLOR: egui::Color32 = egui::Color32::from_rgb(30, 144, 255);

/// Main application state for the interactive viewer.
///
/// The slider time `view_time` decides what is drawn. Moving it past the
/// planner's last processed time runs a growth step; moving it back only
/// re-renders the tree and obstacles as they were at that time.
///
/// ### Fields
/// - `planner` - The planner being driven.
/// - `cfg` - Configuration used when the planner is rebuilt on reset.
/// - `goal` - Current goal, kept across resets.
///
/// - `view_time` - Simulated time currently shown.
/// - `finish_time` - Arrival time of the found path, once there is one.
/// - `path_nodes` - Nodes on the found path, target first.
/// - `hover_node` - Node under the cursor, for the status bar.
/// - `last_error` - Last planner error, shown in the status bar.
///
/// - `running` - Whether the slider is auto-advancing.
/// - `zoom` - Zoom factor for world-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
/// - `step_interval` - Target wall-clock time between automatic steps (seconds).
/// - `last_step_time` - Time stamp of the last automatic step (egui time).
pub struct Viewer {
    planner: Planner,
    cfg: Config,
    goal: DVec2,

    view_time: f64,
    finish_time: Option<f64>,
    path_nodes: Vec<NodeId>,
    hover_node: Option<NodeId>,
    last_error: Option<String>,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    step_interval: f64,
    last_step_time: f64,
}

impl Viewer {
    /// Creates a viewer over the demo obstacle scene.
    ///
    /// ### Errors
    /// Returns the planner's error if `cfg` is invalid.
    pub fn new(cfg: Config) -> Result<Self, PlannerError> {
        let planner = Planner::new(START, GOAL, ObstacleSet::demo(), cfg)?;
        Ok(Self {
            planner,
            cfg,
            goal: GOAL,
            view_time: 0.0,
            finish_time: None,
            path_nodes: Vec::new(),
            hover_node: None,
            last_error: None,
            running: false,
            zoom: 1.5,
            pan: egui::vec2(0.0, 0.0),
            step_interval: 0.1,
            last_step_time: 0.0,
        })
    }

    /// Rebuilds the planner from `cfg`, keeping the current goal and camera.
    fn reset(&mut self) {
        match Planner::new(START, self.goal, ObstacleSet::demo(), self.cfg) {
            Ok(planner) => {
                self.planner = planner;
                self.view_time = 0.0;
                self.finish_time = None;
                self.path_nodes.clear();
                self.hover_node = None;
                self.last_error = None;
                self.running = false;
            }
            Err(e) => {
                error!("reset failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn set_goal(&mut self, goal: DVec2) {
        self.goal = goal;
        self.planner.set_goal(goal);
        self.finish_time = None;
        self.path_nodes.clear();
    }

    /// Moves the view to time `t`, running a growth step if `t` is new.
    fn set_time(&mut self, t: f64) {
        self.view_time = t;
        if t <= self.planner.last_time() {
            return;
        }
        match self.planner.advance(t) {
            Ok(Some(path)) => {
                info!(
                    arrival_time = path.arrival_time,
                    hops = path.len(),
                    "showing path"
                );
                self.finish_time = Some(path.arrival_time);
                self.path_nodes = path.node_ids(self.planner.tree());
            }
            Ok(None) => {}
            Err(e) => {
                error!("advance failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Upper end of the time slider.
    fn horizon(&self) -> f64 {
        match self.finish_time {
            Some(finish) => finish + TIME_STEP,
            None => self.planner.last_time() + FORWARD,
        }
    }

    fn step_once(&mut self) {
        let next = self.view_time + TIME_STEP;
        if next > self.horizon() {
            self.running = false;
            return;
        }
        self.set_time(next);
    }

    /// Returns `true` when `t` is the moment the found path completes.
    fn at_finish_time(&self, t: f64) -> bool {
        self.finish_time.is_some_and(|f| (t - f).abs() < TIME_STEP)
    }

    /// Converts a workspace position to screen-space.
    ///
    /// The workspace center maps to the center of `rect`; positions are
    /// scaled by `zoom` and offset by `pan`. The workspace y-axis points
    /// down, as on screen.
    fn world_to_screen(&self, p: DVec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let d = (p - self.planner.config().workspace * 0.5).as_vec2();
        egui::pos2(
            center.x + d.x * self.zoom + self.pan.x,
            center.y + d.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`], up to floating point rounding.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> DVec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (p.y - center.y - self.pan.y) / self.zoom;
        DVec2::new(f64::from(x), f64::from(y)) + self.planner.config().workspace * 0.5
    }

    /// Helper to draw a labeled `f64` [`egui::DragValue`].
    fn labeled_drag_f64(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f64,
        range: std::ops::RangeInclusive<f64>,
        speed: f64,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed))
                .changed()
        })
        .inner
    }

    /// Builds the top panel UI (run controls, time slider, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.01..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                let mut t = self.view_time;
                let slider = egui::Slider::new(&mut t, 0.0..=self.horizon())
                    .text("t")
                    .step_by(TIME_STEP);
                if ui.add(slider).changed() {
                    self.set_time(t);
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (time, node count, path state, hover info).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("t = {:.1}", self.view_time));
                ui.label(format!("last step = {:.1}", self.planner.last_time()));
                ui.separator();
                ui.label(format!("nodes = {}", self.planner.tree().nodes.len()));
                match self.finish_time {
                    Some(f) => ui.label(format!("path arrives at t = {f:.2}")),
                    None => ui.label("searching"),
                };
                if let Some(node) = self.hover_node.and_then(|id| self.planner.tree().nodes.get(id)) {
                    let id = node.id;
                    ui.separator();
                    ui.label(format!(
                        "node {id}: {} arrives {:.2}",
                        if node.valid { "valid" } else { "blocked" },
                        node.arrival_time()
                    ));
                }
                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err);
                }
            });
        });
    }

    /// Builds the right-hand configuration panel.
    ///
    /// The branch weight applies immediately; everything else takes effect
    /// on the next reset.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Growth");
                if Self::labeled_drag_f64(
                    ui,
                    "branch_weight:",
                    &mut self.cfg.branch_weight,
                    0.5..=100.0,
                    0.1,
                ) && let Err(e) = self.planner.set_branch_weight(self.cfg.branch_weight)
                {
                    self.last_error = Some(e.to_string());
                }
                Self::labeled_drag_f64(
                    ui,
                    "branch_len_min:",
                    &mut self.cfg.branch_len_min,
                    0.0..=self.cfg.branch_len_max,
                    1.0,
                );
                Self::labeled_drag_f64(
                    ui,
                    "branch_len_max:",
                    &mut self.cfg.branch_len_max,
                    self.cfg.branch_len_min..=400.0,
                    1.0,
                );

                ui.separator();
                ui.label("Motion");
                Self::labeled_drag_f64(
                    ui,
                    "traversal_rate:",
                    &mut self.cfg.traversal_rate,
                    1.0..=500.0,
                    1.0,
                );
                Self::labeled_drag_f64(
                    ui,
                    "success_radius:",
                    &mut self.cfg.success_radius,
                    1.0..=200.0,
                    0.5,
                );

                ui.separator();
                ui.label(format!("goal = ({:.0}, {:.0})", self.goal.x, self.goal.y));
                ui.label("Click the canvas to move the goal.");

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config {
                        seed: self.cfg.seed,
                        ..Config::default()
                    };
                }
            });
    }

    /// Builds the central panel where the scene is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            let hover_world = response.hover_pos().map(|p| self.screen_to_world(p, rect));
            self.hover_node = hover_world.and_then(|p| {
                self.planner
                    .tree()
                    .find_nearest_node(p)
                    .filter(|&(_, d2)| d2 < 100.0)
                    .map(|(id, _)| id)
            });

            if response.clicked()
                && let Some(goal) = hover_world
            {
                self.set_goal(goal);
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            self.paint_scene(&painter, rect);

            // Auto-advance the slider if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                if now - self.last_step_time >= self.step_interval {
                    self.step_once();
                    self.last_step_time = now;
                }
                ctx.request_repaint();
            }
        });
    }

    /// Draws the workspace, obstacles, tree, path, start and goal at `view_time`.
    fn paint_scene(&self, painter: &egui::Painter, rect: egui::Rect) {
        let t = self.view_time;
        let snap = self.planner.snapshot_at(t);
        let at_finish = self.at_finish_time(t);
        let to_screen = |p: DVec2| self.world_to_screen(p, rect);

        // Workspace border.
        let ws = self.planner.config().workspace;
        let border = [
            DVec2::ZERO,
            DVec2::new(ws.x, 0.0),
            ws,
            DVec2::new(0.0, ws.y),
        ]
        .into_iter()
        .map(to_screen)
        .collect();
        painter.add(egui::Shape::closed_line(
            border,
            egui::Stroke::new(1.0, egui::Color32::GRAY),
        ));

        // Obstacles with their centroid.
        for (polygon, centroid) in snap.obstacles.iter().zip(&snap.centroids) {
            let points = polygon.iter().copied().map(to_screen).collect();
            painter.add(egui::Shape::convex_polygon(
                points,
                OBSTACLE,
                egui::Stroke::NONE,
            ));
            if let Some(c) = centroid {
                painter.circle_filled(to_screen(*c), 3.0, CENTROID);
            }
        }

        // Connections reached by time t.
        for conn in snap.connections {
            let Some(start) = conn.start else {
                continue;
            };
            if !conn.is_reached(t) {
                continue;
            }
            let on_path = self.path_nodes.contains(&conn.end) && self.path_nodes.contains(&start);
            let color = if on_path && at_finish {
                PATH
            } else if conn.valid {
                VALID
            } else {
                INVALID
            };
            painter.line_segment(
                [
                    to_screen(snap.nodes[start].location),
                    to_screen(snap.nodes[conn.end].location),
                ],
                egui::Stroke::new(3.0, color),
            );
        }

        // Final hop from the path's target to the goal.
        if at_finish && let Some(&target) = self.path_nodes.first() {
            painter.line_segment(
                [to_screen(snap.nodes[target].location), to_screen(snap.goal)],
                egui::Stroke::new(3.0, PATH),
            );
        }

        // Nodes reached by time t, labelled with their arrival time.
        for node in snap.nodes {
            if !node.is_reached(t) {
                continue;
            }
            let color = if at_finish && self.path_nodes.contains(&node.id) {
                PATH
            } else if node.valid {
                VALID
            } else {
                INVALID
            };
            let p = to_screen(node.location);
            painter.circle_filled(p, 5.0, color);
            let arrival = (node.arrival_time() * 10.0).ceil() / 10.0;
            painter.text(
                p - egui::vec2(0.0, 8.0),
                egui::Align2::CENTER_BOTTOM,
                format!("{arrival:.1}"),
                egui::FontId::proportional(10.0),
                egui::Color32::LIGHT_GRAY,
            );
        }

        painter.circle_filled(to_screen(snap.start), 6.0, egui::Color32::GREEN);

        let goal = to_screen(snap.goal);
        painter.circle_filled(goal, 6.0, GOAL_COLOR);
        painter.text(
            goal - egui::vec2(0.0, 10.0),
            egui::Align2::CENTER_BOTTOM,
            "Goal",
            egui::FontId::proportional(12.0),
            egui::Color32::WHITE,
        );
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
