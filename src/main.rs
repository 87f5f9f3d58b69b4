use eframe::egui;
use glam::{Vec2 as GVec2, Vec3};
use indextree::NodeId;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use photosphere::navigator::LevelChange;
use photosphere::orbit_camera::OrbitCamera;
use photosphere::scanner::{AlbumScanner, ScanError, ScanProgress, ScanStats};
use photosphere::session::Session;
use photosphere::sphere_layout::fibonacci_sphere;
use photosphere::tree::{AlbumNode, AlbumTree, NodeKind};

/// Radius of the sphere the current level's items sit on, in world units.
const LEVEL_RADIUS: f32 = 18.0;
/// World-space radius of a folder orb.
const FOLDER_RADIUS: f32 = 1.4;
/// World-space edge length of an image tile.
const IMAGE_SIZE: f32 = 3.3;

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("PhotoSphere - 3D Album Browser"),
        ..Default::default()
    };

    eframe::run_native(
        "PhotoSphere",
        options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            configure_custom_style(&cc.egui_ctx);
            Box::new(PhotoSphereApp::default())
        }),
    )
}

fn configure_custom_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = egui::Color32::from_rgba_unmultiplied(8, 10, 14, 245);
    visuals.window_fill = egui::Color32::from_rgba_unmultiplied(8, 10, 14, 235);
    visuals.window_stroke = egui::Stroke::new(
        1.0,
        egui::Color32::from_rgba_unmultiplied(255, 255, 255, 26),
    );
    visuals.window_rounding = egui::Rounding::same(12.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(8.0);
    visuals.widgets.active.rounding = egui::Rounding::same(8.0);
    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(12.0, 8.0);
    style.spacing.button_padding = egui::vec2(16.0, 8.0);

    ctx.set_style(style);
}

/// Messages from the scan worker thread back to the UI thread.
enum ScanEvent {
    Progress(ScanProgress),
    Completed(Result<(AlbumTree, ScanStats), ScanError>),
}

/// One displayed item of the current level, anchored on the sphere.
struct LevelItem {
    node_id: NodeId,
    node: AlbumNode,
    anchor: Vec3,
    /// Set for images only; doubles as the texture key to release on teardown.
    uri: Option<String>,
}

struct PreviewImage {
    name: String,
    uri: String,
}

struct PhotoSphereApp {
    scan_rx: Option<Receiver<ScanEvent>>,
    scan_progress: Option<ScanProgress>,
    session: Option<Session>,
    level_rx: Option<Receiver<LevelChange>>,
    level: Vec<LevelItem>,
    /// Texture uris owned by the displayed level, released on level change.
    level_uris: Vec<String>,
    camera: OrbitCamera,
    preview: Option<PreviewImage>,
    error: Option<String>,
}

impl Default for PhotoSphereApp {
    fn default() -> Self {
        Self {
            scan_rx: None,
            scan_progress: None,
            session: None,
            level_rx: None,
            level: Vec::new(),
            level_uris: Vec::new(),
            camera: OrbitCamera::new(1280.0, 800.0),
            preview: None,
            error: None,
        }
    }
}

impl PhotoSphereApp {
    fn choose_album(&mut self, ctx: &egui::Context) {
        // Only one scan in flight; the button is disabled meanwhile, this is
        // the backstop.
        if self.scan_rx.is_some() {
            return;
        }

        // Cancelling the picker is a no-op, not an error.
        let Some(root) = rfd::FileDialog::new()
            .set_title("Choose album root folder")
            .pick_folder()
        else {
            return;
        };

        self.start_scan(ctx, root);
    }

    fn start_scan(&mut self, ctx: &egui::Context, root: PathBuf) {
        info!(root = %root.display(), "starting album scan");

        let (tx, rx) = mpsc::channel();
        self.scan_rx = Some(rx);
        self.scan_progress = None;

        let progress_tx = tx.clone();
        let progress_ctx = ctx.clone();
        let done_ctx = ctx.clone();

        thread::spawn(move || {
            let reporter: Arc<dyn Fn(ScanProgress) + Send + Sync> = Arc::new(move |progress| {
                let _ = progress_tx.send(ScanEvent::Progress(progress));
                progress_ctx.request_repaint();
            });

            let mut scanner = AlbumScanner::new();
            let result = scanner.scan_with_progress(&root, Some(reporter));
            let _ = tx.send(ScanEvent::Completed(result));
            done_ctx.request_repaint();
        });
    }

    fn poll_scan(&mut self) {
        let Some(rx) = self.scan_rx.take() else {
            return;
        };

        loop {
            match rx.try_recv() {
                Ok(ScanEvent::Progress(progress)) => self.scan_progress = Some(progress),
                Ok(ScanEvent::Completed(result)) => {
                    self.scan_progress = None;
                    match result {
                        Ok((tree, stats)) => self.install_session(tree, stats),
                        Err(err) => {
                            // The prior session, if any, stays untouched.
                            error!(error = %err, "album scan failed");
                            self.error = Some(err.to_string());
                        }
                    }
                    return;
                }
                Err(TryRecvError::Empty) => {
                    self.scan_rx = Some(rx);
                    return;
                }
                Err(TryRecvError::Disconnected) => return,
            }
        }
    }

    /// Replace the whole session with a freshly scanned one and seed its
    /// navigator. The subscription is wired up first so the root level event
    /// is observed like any other.
    fn install_session(&mut self, tree: AlbumTree, stats: ScanStats) {
        let (tx, rx) = mpsc::channel();
        self.level_rx = Some(rx);
        self.error = None;
        self.preview = None;

        let mut session = Session::new(tree, stats);
        session
            .navigator_mut()
            .subscribe(Arc::new(move |change: &LevelChange| {
                let _ = tx.send(change.clone());
            }));
        session.navigator_mut().reset();
        self.session = Some(session);
    }

    fn poll_level_changes(&mut self, ctx: &egui::Context) {
        let mut changes = Vec::new();
        if let Some(rx) = &self.level_rx {
            while let Ok(change) = rx.try_recv() {
                changes.push(change);
            }
        }

        for change in changes {
            self.rebuild_level(ctx, &change);
        }
    }

    /// Tear down the previous level's display resources and lay the new
    /// level's children out on the sphere.
    fn rebuild_level(&mut self, ctx: &egui::Context, change: &LevelChange) {
        for uri in self.level_uris.drain(..) {
            ctx.forget_image(&uri);
        }
        self.level.clear();

        let Some(session) = &self.session else {
            return;
        };
        let tree = session.tree();

        let children: Vec<(NodeId, AlbumNode)> = tree
            .children(change.node_id)
            .filter_map(|id| tree.node(id).map(|n| (id, n.clone())))
            .collect();
        let anchors = fibonacci_sphere(children.len(), LEVEL_RADIUS);

        self.level = children
            .into_iter()
            .zip(anchors)
            .map(|((node_id, node), anchor)| {
                let uri = (node.kind == NodeKind::Image)
                    .then(|| format!("file://{}", node.path.display()));
                if let Some(uri) = &uri {
                    self.level_uris.push(uri.clone());
                }
                LevelItem {
                    node_id,
                    node,
                    anchor,
                    uri,
                }
            })
            .collect();
    }

    fn top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("PhotoSphere");
                ui.separator();

                let scanning = self.scan_rx.is_some();
                if ui
                    .add_enabled(!scanning, egui::Button::new("Open album…"))
                    .clicked()
                {
                    self.choose_album(ctx);
                }

                if scanning {
                    ui.spinner();
                    match &self.scan_progress {
                        Some(p) => ui.label(format!(
                            "Scanning… {} folders, {} images",
                            p.folders, p.images
                        )),
                        None => ui.label("Scanning…"),
                    };
                }

                if let Some(session) = &self.session {
                    let stats = session.stats();
                    ui.label(format!(
                        "{} folders · {} images",
                        stats.folders, stats.images
                    ));
                }

                if let Some(error) = &self.error {
                    ui.colored_label(egui::Color32::from_rgb(255, 96, 96), error);
                }
            });

            // Breadcrumb navigation.
            let nav_bar = self
                .session
                .as_ref()
                .map(|s| (s.navigator().depth(), s.navigator().breadcrumb().join(" / ")));
            if let Some((depth, breadcrumb)) = nav_bar {
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(depth > 1, egui::Button::new("⬅ Back"))
                        .clicked()
                    {
                        if let Some(session) = &mut self.session {
                            session.navigator_mut().ascend();
                        }
                    }
                    ui.separator();
                    ui.label(breadcrumb);
                });
            }
        });
    }

    fn scene(&mut self, ui: &mut egui::Ui) {
        let rect = ui.available_rect_before_wrap();
        self.camera.update_viewport(rect.width(), rect.height());

        let depth = self
            .session
            .as_ref()
            .map(|s| s.navigator().depth())
            .unwrap_or(0);
        draw_background(ui.painter(), rect, depth);

        // The backdrop orbit control goes in before the items so that item
        // clicks win over it.
        let backdrop = ui.interact(
            rect,
            ui.id().with("scene_backdrop"),
            egui::Sense::click_and_drag(),
        );
        if backdrop.dragged() {
            let delta = backdrop.drag_delta();
            self.camera.orbit(GVec2::new(delta.x, delta.y));
        }
        if backdrop.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                self.camera.zoom(scroll * 0.05);
            }
        }

        if self.session.is_none() {
            let message = if self.scan_rx.is_some() {
                "Scanning album…"
            } else {
                "Open an album folder to begin"
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                message,
                egui::FontId::proportional(18.0),
                egui::Color32::from_gray(140),
            );
            return;
        }

        if self.level.is_empty() {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "This folder has no subfolders or images",
                egui::FontId::proportional(16.0),
                egui::Color32::from_gray(140),
            );
            return;
        }

        // Project every anchor, then paint back-to-front so near items both
        // cover and out-click far ones.
        let mut order: Vec<(usize, f32)> = Vec::with_capacity(self.level.len());
        for (idx, item) in self.level.iter().enumerate() {
            if let Some(projected) = self.camera.project(item.anchor) {
                order.push((idx, projected.depth));
            }
        }
        order.sort_by(|a, b| b.1.total_cmp(&a.1));

        let interactive = self.preview.is_none();
        let mut clicked: Option<usize> = None;

        for (idx, _) in order {
            let item = &self.level[idx];
            let Some(projected) = self.camera.project(item.anchor) else {
                continue;
            };
            let center = rect.min + egui::vec2(projected.screen.x, projected.screen.y);

            let item_rect = match item.node.kind {
                NodeKind::Folder => {
                    let radius = FOLDER_RADIUS * projected.scale;
                    egui::Rect::from_center_size(center, egui::vec2(radius * 2.0, radius * 2.0))
                }
                NodeKind::Image => {
                    let side = IMAGE_SIZE * projected.scale;
                    egui::Rect::from_center_size(center, egui::vec2(side, side))
                }
            };
            if !rect.intersects(item_rect) {
                continue;
            }

            let mut is_hovered = false;
            if interactive {
                let response = ui.interact(
                    item_rect,
                    ui.id().with(("level_item", idx)),
                    egui::Sense::click(),
                );
                is_hovered = response.hovered();
                if is_hovered {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }
                if response.clicked() {
                    clicked = Some(idx);
                }
            }

            match item.node.kind {
                NodeKind::Folder => draw_folder(ui.painter(), center, item_rect, is_hovered),
                NodeKind::Image => {
                    if let Some(uri) = &item.uri {
                        egui::Image::from_uri(uri.clone())
                            .rounding(egui::Rounding::same(4.0))
                            .paint_at(ui, item_rect);
                        if is_hovered {
                            ui.painter().rect_stroke(
                                item_rect,
                                4.0,
                                egui::Stroke::new(2.0, egui::Color32::from_rgb(0, 180, 255)),
                            );
                        }
                    }
                }
            }

            // Labels: folders that project large enough, anything hovered.
            if is_hovered || (item.node.is_folder() && item_rect.width() > 34.0) {
                ui.painter().text(
                    item_rect.center_bottom() + egui::vec2(0.0, 6.0),
                    egui::Align2::CENTER_TOP,
                    &item.node.name,
                    egui::FontId::proportional(12.0),
                    egui::Color32::from_gray(220),
                );
            }
        }

        if let Some(idx) = clicked {
            self.activate(idx);
        }
    }

    /// A click on a level item: folders descend, images open the preview.
    fn activate(&mut self, idx: usize) {
        let Some(item) = self.level.get(idx) else {
            return;
        };

        match item.node.kind {
            NodeKind::Folder => {
                let node_id = item.node_id;
                let path = item.node.path.clone();
                if let Some(session) = &mut self.session {
                    if let Err(err) = session.navigator_mut().descend(node_id) {
                        // A stale click against an already replaced level is
                        // an integration bug, not a user-visible condition.
                        warn!(path = %path.display(), error = %err, "descend rejected");
                    }
                }
            }
            NodeKind::Image => {
                if let Some(uri) = &item.uri {
                    self.preview = Some(PreviewImage {
                        name: item.node.name.clone(),
                        uri: uri.clone(),
                    });
                }
            }
        }
    }

    fn preview_overlay(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let Some(preview) = &self.preview else {
            return;
        };

        ui.painter()
            .rect_filled(rect, 0.0, egui::Color32::from_black_alpha(217));

        let frame = egui::Rect::from_center_size(rect.center(), rect.size() * 0.86);
        let image = egui::Image::from_uri(preview.uri.clone())
            .rounding(egui::Rounding::same(6.0))
            .fit_to_exact_size(frame.size());
        ui.put(frame, image);

        ui.painter().text(
            egui::pos2(rect.center().x, rect.max.y - 18.0),
            egui::Align2::CENTER_BOTTOM,
            &preview.name,
            egui::FontId::proportional(14.0),
            egui::Color32::from_gray(220),
        );

        let dismissed = ui
            .interact(rect, ui.id().with("preview_backdrop"), egui::Sense::click())
            .clicked()
            || ui.input(|i| i.key_pressed(egui::Key::Escape));
        if dismissed {
            self.preview = None;
        }
    }
}

impl eframe::App for PhotoSphereApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_scan();
        self.poll_level_changes(ctx);

        self.top_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            self.scene(ui);
            self.preview_overlay(ui, rect);

            if self.scan_rx.is_some() {
                ctx.request_repaint();
            }
        });
    }
}

/// Deep night-sky gradient behind the sphere; tilts a little bluer the
/// deeper the navigation goes.
fn draw_background(painter: &egui::Painter, rect: egui::Rect, depth: usize) {
    let depth_factor = (depth as f32 * 0.08).min(0.4);

    let top_color = egui::Color32::from_rgb(5, 5, (5.0 + depth_factor * 30.0) as u8);
    let bottom_color = egui::Color32::from_rgb(
        2,
        (8.0 + depth_factor * 20.0) as u8,
        (16.0 + depth_factor * 50.0) as u8,
    );

    let mut mesh = egui::Mesh::default();
    mesh.vertices.push(egui::epaint::Vertex {
        pos: rect.left_top(),
        uv: egui::pos2(0.0, 0.0),
        color: top_color,
    });
    mesh.vertices.push(egui::epaint::Vertex {
        pos: rect.right_top(),
        uv: egui::pos2(1.0, 0.0),
        color: top_color,
    });
    mesh.vertices.push(egui::epaint::Vertex {
        pos: rect.right_bottom(),
        uv: egui::pos2(1.0, 1.0),
        color: bottom_color,
    });
    mesh.vertices.push(egui::epaint::Vertex {
        pos: rect.left_bottom(),
        uv: egui::pos2(0.0, 1.0),
        color: bottom_color,
    });
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    painter.add(egui::Shape::Mesh(mesh));
}

fn draw_folder(painter: &egui::Painter, center: egui::Pos2, rect: egui::Rect, hovered: bool) {
    let radius = rect.width() * 0.5;

    let (fill, glow) = if hovered {
        (
            egui::Color32::from_rgb(60, 200, 255),
            egui::Color32::from_rgba_unmultiplied(0, 128, 255, 90),
        )
    } else {
        (
            egui::Color32::from_rgb(0, 180, 255),
            egui::Color32::from_rgba_unmultiplied(0, 128, 255, 50),
        )
    };

    painter.circle_filled(center, radius * 1.5, glow);
    painter.circle_filled(center, radius, fill);
    painter.circle_stroke(
        center,
        radius,
        egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(255, 255, 255, 40)),
    );
}
