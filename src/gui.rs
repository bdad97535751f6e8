//! Native GUI viewer using egui
//!
//! Projects the normalized points through an orbit camera onto an egui_plot
//! canvas. Hovering a marker shows its original values in a centered overlay.

use eframe::egui;
use egui_plot::{MarkerShape, Plot, PlotPoint, PlotPoints, Points};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::camera::{CameraController, OrbitCamera};
use crate::color::HexColor;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::hover::{self, PointHover, ScreenMarker};
use crate::ingest::format_local;
use crate::normalize::{AxisRange, Bounds};
use crate::state::{Action, AppState};

const HALO_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(140, 90, 0, 140);
const MAX_LISTED_ISSUES: usize = 50;

/// Run the native GUI viewer, optionally loading `initial` first
pub fn run_viewer(config: Config, initial: Option<PathBuf>) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.viewer.window_size)
            .with_title("Geo Scatter")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Geo Scatter",
        options,
        Box::new(|cc| Ok(Box::new(ScatterApp::new(cc, config, initial)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

struct ScatterApp {
    config: Config,
    state: AppState,
    camera: OrbitCamera,
    controller: CameraController,
    path_input: String,
    /// Distinct IDs of the current set, with their colors
    legend: BTreeMap<String, HexColor>,
    background: egui::Color32,
}

impl ScatterApp {
    fn new(cc: &eframe::CreationContext<'_>, config: Config, initial: Option<PathBuf>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let background = HexColor::parse(&config.viewer.background)
            .map(color32)
            .unwrap_or(egui::Color32::BLACK);

        let mut app = Self {
            camera: OrbitCamera::new(config.viewer.fov_degrees),
            controller: CameraController::new(config.viewer.camera_distance),
            state: AppState::default(),
            path_input: String::new(),
            legend: BTreeMap::new(),
            background,
            config,
        };

        if let Some(path) = initial {
            app.path_input = path.display().to_string();
            app.load_file(path);
        }
        app
    }

    fn load_file(&mut self, path: PathBuf) {
        info!("load_file called for: {:?}", path);

        let action = match Dataset::from_path(&path, self.config.ingest.malformed_rows) {
            Ok(dataset) => Action::Loaded {
                source: path,
                dataset,
            },
            Err(e) => Action::LoadFailed {
                source: path,
                message: e.to_string(),
            },
        };
        self.state = self.state.apply(action);

        self.legend = self
            .state
            .points
            .iter()
            .map(|p| (p.id.clone(), p.color))
            .collect();
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        // One file at a time; the last drop wins
        if let Some(path) = dropped.into_iter().last() {
            debug!("File dropped: {:?}", path);
            self.path_input = path.display().to_string();
            self.load_file(path);
        }
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("data_panel").min_width(250.0).show(ctx, |ui| {
            ui.heading("Geo Scatter");
            ui.separator();

            ui.label("CSV file:");
            let edit = ui.text_edit_singleline(&mut self.path_input);
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Load").clicked() || submitted {
                let path = PathBuf::from(self.path_input.trim());
                if !path.as_os_str().is_empty() {
                    self.load_file(path);
                }
            }
            ui.label("or drop a file on the window");

            ui.separator();
            match &self.state.source {
                Some(source) => {
                    ui.label(format!("{}", source.display()));
                    ui.label(format!("{} points", self.state.points.len()));
                    if let Some(bounds) = &self.state.bounds {
                        ranges_grid(ui, bounds);
                    }
                }
                None => {
                    ui.label("No data loaded");
                }
            }

            if let Some(err) = &self.state.last_error {
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }

            if !self.state.issues.is_empty() {
                let title = format!("{} rejected rows", self.state.issues.len());
                ui.collapsing(title, |ui| {
                    for issue in self.state.issues.iter().take(MAX_LISTED_ISSUES) {
                        ui.label(format!("line {}: {}", issue.line, issue.kind));
                    }
                    if self.state.issues.len() > MAX_LISTED_ISSUES {
                        ui.label("...");
                    }
                });
            }

            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (id, color) in &self.legend {
                    ui.horizontal(|ui| {
                        ui.colored_label(color32(*color), "●");
                        ui.label(id);
                    });
                }
            });
        });
    }

    fn controls_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("controls_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Rotate:");
                ui.add(egui::DragValue::new(&mut self.camera.yaw).speed(0.02).prefix("Yaw:"));
                ui.add(egui::DragValue::new(&mut self.camera.pitch).speed(0.02).prefix("Pitch:"));
                ui.add(
                    egui::DragValue::new(&mut self.camera.distance)
                        .speed(0.02)
                        .prefix("Dist:"),
                );

                let [x, y, z] = self.camera.pose().position;
                ui.label(format!("Camera: ({:.2}, {:.2}, {:.2})", x, y, z));

                ui.separator();
                if ui.button("Center").clicked() {
                    self.controller.recenter(&self.state.points, &mut self.camera);
                }
            });
        });
    }

    fn handle_camera_input(&mut self, ctx: &egui::Context, over_view: bool) {
        let mut recenter = false;
        let typing = ctx.wants_keyboard_input();
        ctx.input(|i| {
            // Keys belong to the path box while it has focus
            if !typing {
                if i.key_down(egui::Key::ArrowLeft) { self.camera.rotate(-0.03, 0.0); }
                if i.key_down(egui::Key::ArrowRight) { self.camera.rotate(0.03, 0.0); }
                if i.key_down(egui::Key::ArrowUp) { self.camera.rotate(0.0, 0.03); }
                if i.key_down(egui::Key::ArrowDown) { self.camera.rotate(0.0, -0.03); }
                if i.key_down(egui::Key::Minus) { self.camera.zoom(1.02); }
                if i.key_down(egui::Key::Plus) { self.camera.zoom(0.98); }
                if i.key_pressed(egui::Key::Home) { recenter = true; }
            }

            if !over_view {
                return;
            }
            if i.raw_scroll_delta.y != 0.0 {
                let factor = (1.0 - i.raw_scroll_delta.y as f64 * 0.002).max(0.1);
                self.camera.zoom(factor);
            }
            // Right-drag rotates, middle-drag pans
            if i.pointer.secondary_down() {
                let delta = i.pointer.delta();
                self.camera.rotate(-delta.x as f64 * 0.005, delta.y as f64 * 0.005);
            }
            if i.pointer.middle_down() {
                let delta = i.pointer.delta();
                self.camera.pan(-delta.x as f64 * 0.002, delta.y as f64 * 0.002);
            }
        });

        if recenter {
            self.controller.recenter(&self.state.points, &mut self.camera);
        }
    }

    fn scene(&mut self, ctx: &egui::Context) {
        let frame = egui::Frame::none().fill(self.background);
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            ui.label("Right-drag: rotate | Middle-drag: pan | Scroll: zoom | Home: center");

            let over_view = ui.rect_contains_pointer(ui.max_rect());
            self.handle_camera_input(ctx, over_view);
            self.controller.sync(&self.state.points, &mut self.camera);

            let size = ui.available_size();
            let aspect = (size.x / size.y.max(1.0)) as f64;

            // Project and clip to the view rectangle, grouped by color for plotting
            let mut visible: Vec<(usize, [f64; 2], f64)> = Vec::new();
            let mut by_color: BTreeMap<[u8; 3], Vec<[f64; 2]>> = BTreeMap::new();
            for (index, point) in self.state.points.iter().enumerate() {
                let Some(p) = self.camera.project(point.position) else {
                    continue;
                };
                if p.xy[0].abs() > aspect || p.xy[1].abs() > 1.0 {
                    continue;
                }
                visible.push((index, p.xy, p.depth));
                by_color.entry(point.color.rgb()).or_default().push(p.xy);
            }

            let radius = self.config.viewer.point_radius;
            let plot = Plot::new("scatter_plot")
                .data_aspect(1.0)
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .allow_boxed_zoom(false)
                .allow_double_click_reset(false)
                .show_axes(false)
                .show_grid(false)
                .show_x(false)
                .show_y(false)
                .include_x(-aspect)
                .include_x(aspect)
                .include_y(-1.0)
                .include_y(1.0);

            let response = plot.show(ui, |plot_ui| {
                for (rgb, xy) in by_color {
                    plot_ui.points(
                        Points::new(PlotPoints::from(xy))
                            .shape(MarkerShape::Circle)
                            .filled(true)
                            .radius(radius)
                            .color(egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])),
                    );
                }
            });

            let markers: Vec<ScreenMarker> = visible
                .iter()
                .map(|&(index, xy, depth)| {
                    let pos = response
                        .transform
                        .position_from_point(&PlotPoint::new(xy[0], xy[1]));
                    ScreenMarker {
                        index,
                        pos: [pos.x, pos.y],
                        depth,
                    }
                })
                .collect();

            let picked = ctx
                .pointer_hover_pos()
                .filter(|pos| response.response.rect.contains(*pos))
                .and_then(|pos| {
                    hover::pick(&markers, [pos.x, pos.y], self.config.viewer.pick_radius)
                });

            for event in hover::transitions(self.state.hovered_index(), picked) {
                self.state = self.state.apply(Action::Hover(event));
            }

            // Halo behind the hovered marker, then the marker again on top
            for m in &markers {
                if self.state.hover_state(m.index) != PointHover::Hovered {
                    continue;
                }
                let center = egui::pos2(m.pos[0], m.pos[1]);
                let painter = ui.painter();
                painter.circle_filled(center, radius * self.config.viewer.halo_scale, HALO_COLOR);
                painter.circle_filled(center, radius, color32(self.state.points[m.index].color));
            }
        });
    }

    fn hover_overlay(&self, ctx: &egui::Context) {
        let Some(hovered) = &self.state.hovered else {
            return;
        };
        egui::Area::new(egui::Id::new("hover_overlay"))
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(egui::Color32::from_black_alpha(128))
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        let white = egui::Color32::WHITE;
                        ui.colored_label(white, format!("ID: {}", hovered.id));
                        ui.colored_label(white, format!("Latitude: {}", hovered.latitude));
                        ui.colored_label(white, format!("Longitude: {}", hovered.longitude));
                        ui.colored_label(white, format!("Timestamp: {}", hovered.timestamp));
                    });
            });
    }
}

impl eframe::App for ScatterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        self.side_panel(ctx);
        self.controls_panel(ctx);
        self.scene(ctx);
        self.hover_overlay(ctx);
    }
}

/// Raw value range of each axis
fn ranges_grid(ui: &mut egui::Ui, bounds: &Bounds) {
    let plain = |v: f64| v.to_string();
    let time = |v: f64| format_local(v as i64);
    egui::Grid::new("ranges_grid").num_columns(2).show(ui, |ui| {
        ui.label("Latitude");
        ui.label(range_text(&bounds.latitude, plain));
        ui.end_row();

        ui.label("Longitude");
        ui.label(range_text(&bounds.longitude, plain));
        ui.end_row();

        ui.label("Time");
        ui.label(range_text(&bounds.timestamp, time));
        ui.end_row();
    });
}

/// `min .. max`, or the single value of a flat axis (drawn at the midplane)
fn range_text(range: &AxisRange, value: impl Fn(f64) -> String) -> String {
    if range.is_degenerate() {
        format!("{} (flat)", value(range.min))
    } else {
        format!("{} .. {}", value(range.min), value(range.max))
    }
}

fn color32(c: HexColor) -> egui::Color32 {
    let [r, g, b] = c.rgb();
    egui::Color32::from_rgb(r, g, b)
}
