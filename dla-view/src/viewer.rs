//! Interactive 3D DLA cluster viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the aggregation engine and
//! implements [`eframe::App`] to render and control the simulation
//! through an egui UI.
//!
//! The viewer is a pure consumer of the engine: it drives the engine's
//! fixed-step clock with frame-time deltas and receives cell creations
//! through the growth-event sink. All visual state — instance list,
//! grow-in animation timing — lives here, keyed by the viewer's own
//! instance indices, never by engine state.

use dla_core::{
    config::Config,
    engine::AggregationEngine,
    events::{GrowthEvent, GrowthSink},
    types::Cell,
};
use eframe::App;
use glam::{Mat3, Vec3};
use tracing::warn;

/// Seconds a newly frozen cell spends growing to full size.
const GROW_IN_SECONDS: f64 = 0.4;

/// Visual bookkeeping for one rendered aggregate cell.
struct VisualInstance {
    cell: Cell,
    born_at: f64,
}

/// Instance list fed by engine growth events.
///
/// `now` is stamped by the frame loop before the engine runs, so every
/// event received during a step records its creation time and the cell
/// can be grown in over the following frames.
#[derive(Default)]
struct InstanceSet {
    instances: Vec<VisualInstance>,
    now: f64,
}

impl InstanceSet {
    fn clear(&mut self) {
        self.instances.clear();
    }

    /// Grow-in factor in `[0, 1]` for the instance at `index`.
    fn scale_at(&self, index: usize, now: f64) -> f32 {
        let age = now - self.instances[index].born_at;
        (age / GROW_IN_SECONDS).clamp(0.0, 1.0) as f32
    }
}

impl GrowthSink for InstanceSet {
    fn on_growth(&mut self, event: GrowthEvent) {
        self.instances.push(VisualInstance {
            cell: event.cell,
            born_at: self.now,
        });
    }
}

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`AggregationEngine`] and its [`Config`].
/// - The visual instance list fed by growth events.
/// - An orbiting orthographic camera (yaw/pitch/zoom).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running`, feed the frame delta into the engine's tick clock.
/// 3. Project and render the bounding cube, aggregate cells and walkers.
///
/// Configuration edits in the side panel apply on the next reset — the
/// engine's own configuration is fixed at construction.
pub struct Viewer {
    engine: AggregationEngine,
    instances: InstanceSet,

    cfg: Config,
    seed: u64,

    running: bool,
    yaw: f32,
    pitch: f32,
    zoom: f32,

    last_frame_time: f64,
}

impl Viewer {
    /// Creates a viewer around a freshly seeded engine.
    ///
    /// The default configuration is used for the first engine; the seed
    /// cell is entered into the instance list immediately so the origin
    /// is visible before any walker freezes.
    pub fn new() -> Self {
        let cfg = Config::default();
        let seed = 42;
        let engine = AggregationEngine::new(cfg, seed).expect("default configuration is valid");

        let mut instances = InstanceSet::default();
        instances.on_growth(GrowthEvent { cell: Cell::ZERO });

        Self {
            engine,
            instances,
            cfg,
            seed,
            running: false,
            yaw: 0.6,
            pitch: 0.5,
            zoom: 6.0,
            last_frame_time: 0.0,
        }
    }

    /// Rebuilds the engine from the edited configuration and seed.
    ///
    /// Keeps the camera settings, clears the instance list back to the
    /// seed cell and stops auto-running. A configuration the engine
    /// rejects leaves the current simulation untouched.
    fn reset(&mut self) {
        match AggregationEngine::new(self.cfg, self.seed) {
            Ok(engine) => {
                self.engine = engine;
                self.instances.clear();
                self.instances.on_growth(GrowthEvent { cell: Cell::ZERO });
                self.running = false;
            }
            Err(err) => warn!(%err, "rejected configuration"),
        }
    }

    /// The camera's view rotation for the current yaw and pitch.
    fn view_rotation(&self) -> Mat3 {
        Mat3::from_rotation_x(self.pitch) * Mat3::from_rotation_y(self.yaw)
    }

    /// Projects a world position into screen space.
    ///
    /// The projection is orthographic: rotate into view space, scale by
    /// `zoom` and center inside `rect`, flipping y so that world-up is
    /// screen-up.
    ///
    /// ### Returns
    /// The screen position and the view-space depth (larger is closer
    /// to the camera).
    fn world_to_screen(&self, rotation: &Mat3, p: Vec3, rect: egui::Rect) -> (egui::Pos2, f32) {
        let v = *rotation * p;
        let center = rect.center();
        (
            egui::pos2(center.x + v.x * self.zoom, center.y - v.y * self.zoom),
            v.z,
        )
    }

    /// Helper to draw a labeled [`egui::DragValue`].
    fn labeled_drag<Num: egui::emath::Numeric>(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut Num,
        range: std::ops::RangeInclusive<Num>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                    self.last_frame_time = ctx.input(|i| i.time);
                }

                if ui.button("Step").clicked() {
                    self.instances.now = ctx.input(|i| i.time);
                    self.engine.step(&mut self.instances);
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 1.0..=30.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (step count, cell and walker counts).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("steps = {}", self.engine.steps()));
                ui.separator();
                ui.label(format!("cells = {}", self.engine.aggregate().len()));
                ui.label(format!("walkers = {}", self.engine.walkers().len()));
            });
        });
    }

    /// Builds the right-hand configuration panel.
    ///
    /// Edits are staged on the viewer's config copy and take effect on
    /// the next reset; the drag ranges keep every field inside the
    /// engine's valid range.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");
                ui.label("Applied on reset");

                ui.separator();
                ui.label("Domain");
                Self::labeled_drag(ui, "bounds_radius:", &mut self.cfg.bounds_radius, 1..=200, 1.0);

                ui.separator();
                ui.label("Population");
                Self::labeled_drag(
                    ui,
                    "initial_walkers:",
                    &mut self.cfg.initial_walkers,
                    1..=5000,
                    1.0,
                );
                Self::labeled_drag(
                    ui,
                    "population_floor:",
                    &mut self.cfg.population_floor,
                    1..=500,
                    1.0,
                );
                Self::labeled_drag(
                    ui,
                    "decay_steps_per_walker:",
                    &mut self.cfg.decay_steps_per_walker,
                    1..=2000,
                    1.0,
                );

                ui.separator();
                ui.label("Timing");
                Self::labeled_drag(
                    ui,
                    "step_interval:",
                    &mut self.cfg.step_interval,
                    0.01..=1.0,
                    0.01,
                );

                ui.separator();
                ui.label("Random seed");
                ui.add(egui::DragValue::new(&mut self.seed).speed(1.0));

                ui.separator();
                if ui.button("Apply & Reset").clicked() {
                    self.reset();
                }
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config::default();
                }
            });
    }

    /// Draws the bounding cube as a wireframe.
    fn draw_bounds(&self, painter: &egui::Painter, rotation: &Mat3, rect: egui::Rect) {
        let b = self.engine.config().bounds_radius as f32;
        let corners = [
            Vec3::new(-b, -b, -b),
            Vec3::new(b, -b, -b),
            Vec3::new(b, b, -b),
            Vec3::new(-b, b, -b),
            Vec3::new(-b, -b, b),
            Vec3::new(b, -b, b),
            Vec3::new(b, b, b),
            Vec3::new(-b, b, b),
        ];
        const EDGES: [(usize, usize); 12] = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];

        let stroke = egui::Stroke::new(1.0, egui::Color32::DARK_GREEN);
        for (start, end) in EDGES {
            let (a, _) = self.world_to_screen(rotation, corners[start], rect);
            let (b, _) = self.world_to_screen(rotation, corners[end], rect);
            painter.line_segment([a, b], stroke);
        }
    }

    /// Draws the aggregate cells, far-to-near, with grow-in animation.
    ///
    /// A cell younger than [`GROW_IN_SECONDS`] is scaled up from zero
    /// and highlighted in red, echoing its freeze; settled cells render
    /// at full size in blue.
    fn draw_cells(&self, painter: &egui::Painter, rotation: &Mat3, rect: egui::Rect, now: f64) {
        let mut sprites: Vec<(f32, egui::Pos2, f32, egui::Color32)> =
            Vec::with_capacity(self.instances.instances.len());

        for (i, instance) in self.instances.instances.iter().enumerate() {
            let (pos, depth) = self.world_to_screen(rotation, instance.cell.as_vec3(), rect);
            let scale = self.instances.scale_at(i, now);
            let radius = (self.zoom * 0.45 * scale).max(1.0);
            let color = if scale < 1.0 {
                egui::Color32::RED
            } else {
                egui::Color32::LIGHT_BLUE
            };
            sprites.push((depth, pos, radius, color));
        }

        // Painter's algorithm: far cells first, near cells on top.
        sprites.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
        for (_, pos, radius, color) in sprites {
            painter.circle_filled(pos, radius, color);
        }
    }

    /// Draws the live walkers as small red points.
    fn draw_walkers(&self, painter: &egui::Painter, rotation: &Mat3, rect: egui::Rect) {
        for walker in &self.engine.walkers().walkers {
            let (pos, _) = self.world_to_screen(rotation, walker.pos.as_vec3(), rect);
            painter.circle_filled(pos, 2.0, egui::Color32::LIGHT_RED);
        }
    }

    /// Builds the central panel where the cluster is drawn and orbited.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Orbit with drag.
            if response.dragged() {
                let delta = response.drag_delta();
                self.yaw += delta.x * 0.01;
                self.pitch = (self.pitch + delta.y * 0.01).clamp(-1.55, 1.55);
            }

            // Zoom with scroll.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(1.0, 30.0);
            }

            let now = ctx.input(|i| i.time);
            let rotation = self.view_rotation();

            self.draw_bounds(&painter, &rotation, rect);
            self.draw_cells(&painter, &rotation, rect, now);
            self.draw_walkers(&painter, &rotation, rect);

            // Auto-run: feed real elapsed time into the fixed-step clock.
            if self.running {
                let dt = (now - self.last_frame_time).max(0.0) as f32;
                self.last_frame_time = now;
                self.instances.now = now;
                self.engine.tick(dt, &mut self.instances);

                ctx.request_repaint();
            }
        });
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

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn origin_projects_to_the_rect_center() {
        let viewer = Viewer::new();
        let rect = test_rect();
        let rotation = viewer.view_rotation();

        let (screen, depth) = viewer.world_to_screen(&rotation, Vec3::ZERO, rect);

        assert_eq!(screen, rect.center());
        assert_eq!(depth, 0.0);
    }

    #[test]
    fn instance_set_grows_only_through_events() {
        let mut instances = InstanceSet::default();
        assert!(instances.instances.is_empty());

        instances.now = 10.0;
        instances.on_growth(GrowthEvent {
            cell: Cell::new(1, 0, 0),
        });

        assert_eq!(instances.instances.len(), 1);
        assert_eq!(instances.instances[0].cell, Cell::new(1, 0, 0));

        // Mid-animation the cell is partially grown, afterwards full.
        let halfway = instances.scale_at(0, 10.0 + GROW_IN_SECONDS / 2.0);
        assert!(halfway > 0.0 && halfway < 1.0);
        assert_eq!(instances.scale_at(0, 10.0 + GROW_IN_SECONDS * 2.0), 1.0);
    }

    #[test]
    fn reset_applies_the_edited_configuration() {
        let mut viewer = Viewer::new();
        viewer.running = true;
        viewer.cfg.initial_walkers = 10;
        viewer.cfg.bounds_radius = 7;

        viewer.reset();

        assert_eq!(viewer.engine.walkers().len(), 10);
        assert_eq!(viewer.engine.config().bounds_radius, 7);
        // Instance list is back to just the seed cell.
        assert_eq!(viewer.instances.instances.len(), 1);
        assert_eq!(viewer.instances.instances[0].cell, Cell::ZERO);
        assert!(!viewer.running);
    }

    #[test]
    fn reset_with_invalid_config_keeps_the_running_engine() {
        let mut viewer = Viewer::new();
        let walkers_before = viewer.engine.walkers().len();

        // The UI clamps to valid ranges; guard the path anyway.
        viewer.cfg.bounds_radius = 0;
        viewer.reset();

        assert_eq!(viewer.engine.walkers().len(), walkers_before);
        assert_eq!(viewer.engine.config().bounds_radius, 50);
    }
}
