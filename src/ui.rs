//! Window: shows the latest published scene and turns clicks into operations.
//!
//! The window never touches render state. It receives [`Scene`] snapshots from
//! the loop's canvas over a channel and posts operations back through a
//! [`Poster`], like any other producer.

use crossbeam_channel::Receiver;
use eframe::egui;
use log::{debug, info};

use crate::core::canvas::{Fill, Scene};
use crate::core::op_loop::Poster;
use crate::core::ops::{Operation, Point, Rect, Rgb};

/// Presentation defaults around the drawn scene
#[derive(Debug, Clone, Copy)]
pub struct CanvasStyle {
    pub base_color: Rgb,
    pub border_color: Rgb,
    pub border_width: u32,
}

/// Window options
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub style: CanvasStyle,
    /// Shown in the help overlay
    pub listen_addr: String,
}

fn color32(c: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(c.r, c.g, c.b)
}

/// Help text displayed in overlay
fn help_text(listen_addr: &str) -> String {
    format!(
        "Send scripts to http://{addr}/\n\
        GET  /?cmd=<script>\n\
        POST /  (script in body)\n\n\
        BGRECT x1 y1 x2 y2 RRGGBB\n\
        FIGURE x1 y1 x2 y2 RRGGBB\n\
        MOVE dx dy\n\n\
        Left Click - Move figures here\n\
        F1 - Toggle this help",
        addr = listen_addr
    )
}

/// Canvas placement inside the window panel: uniform scale, centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasView {
    pub origin: egui::Pos2,
    pub scale: f32,
}

impl CanvasView {
    pub fn fit(panel: egui::Rect, width: u32, height: u32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let scale = (panel.width() / w).min(panel.height() / h).max(0.0);
        let size = egui::vec2(w * scale, h * scale);
        Self {
            origin: panel.center() - size * 0.5,
            scale,
        }
    }

    pub fn to_screen(&self, r: Rect) -> egui::Rect {
        let p = |pt: Point| self.origin + egui::vec2(pt.x as f32, pt.y as f32) * self.scale;
        egui::Rect::from_min_max(p(r.min), p(r.max))
    }

    /// Screen position to canvas pixel (rounded down).
    pub fn to_canvas(&self, pos: egui::Pos2) -> Point {
        if self.scale <= 0.0 {
            return Point::ORIGIN;
        }
        let local = (pos - self.origin) / self.scale;
        Point::new(local.x.floor() as i32, local.y.floor() as i32)
    }
}

/// Border strips of `width` pixels along the inside edges of `bounds`.
fn border(bounds: Rect, width: u32) -> [Rect; 4] {
    let w = i32::try_from(width).unwrap_or(i32::MAX);
    let (min, max) = (bounds.min, bounds.max);
    [
        Rect::new(min.x, min.y, max.x, min.y.saturating_add(w).min(max.y)),
        Rect::new(min.x, max.y.saturating_sub(w).max(min.y), max.x, max.y),
        Rect::new(min.x, min.y, min.x.saturating_add(w).min(max.x), max.y),
        Rect::new(max.x.saturating_sub(w).max(min.x), min.y, max.x, max.y),
    ]
}

/// Offset that moves the reference position from `from` onto `target`.
fn move_to(from: Point, target: Point) -> Operation {
    Operation::Move {
        offset: Point::new(target.x.saturating_sub(from.x), target.y.saturating_sub(from.y)),
    }
}

/// eframe app drawing published scenes
pub struct Visualizer {
    scenes: Receiver<Scene>,
    scene: Scene,
    poster: Poster,
    style: CanvasStyle,
    listen_addr: String,
    show_help: bool,
    /// Where the last click put the reference position, until a scene shows it
    expected: Option<Point>,
}

impl Visualizer {
    pub fn new(config: &WindowConfig, poster: Poster, scenes: Receiver<Scene>) -> Self {
        Self {
            scenes,
            scene: Scene::blank(config.canvas_width, config.canvas_height),
            poster,
            style: config.style,
            listen_addr: config.listen_addr.clone(),
            show_help: true,
            expected: None,
        }
    }

    /// Keep only the newest pending scene.
    fn receive_scenes(&mut self) {
        // Checked before receiving: an idle queue means every posted click
        // was applied by the time the newest scene was published
        let idle = self.poster.pending() == 0;
        if let Some(latest) = self.scenes.try_iter().last() {
            debug!("Showing frame {}", latest.frame);
            if idle || self.expected == Some(latest.position) {
                self.expected = None;
            }
            self.scene = latest;
        }
    }

    /// Reference position including clicks the loop has not shown yet.
    fn reference(&self) -> Point {
        self.expected.unwrap_or(self.scene.position)
    }

    /// Post a move that brings the reference position onto `target`.
    fn click(&mut self, target: Point) -> Operation {
        let op = move_to(self.reference(), target);
        debug!("Click at canvas {:?}: {}", target, op);
        self.poster.post(op.clone());
        self.expected = Some(target);
        op
    }

    fn paint_scene(&self, painter: &egui::Painter, view: &CanvasView) {
        let bounds = self.scene.bounds();
        painter.rect_filled(view.to_screen(bounds), 0.0, color32(self.style.base_color));

        if let Some(Fill { rect, color }) = self.scene.visible_background() {
            painter.rect_filled(view.to_screen(rect), 0.0, color32(color));
        }

        for Fill { rect, color } in self.scene.visible_figures() {
            painter.rect_filled(view.to_screen(rect), 0.0, color32(color));
        }

        if self.style.border_width > 0 {
            for strip in border(bounds, self.style.border_width) {
                painter.rect_filled(view.to_screen(strip), 0.0, color32(self.style.border_color));
            }
        }
    }
}

impl eframe::App for Visualizer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive_scenes();

        if ctx.input(|i| i.key_pressed(egui::Key::F1)) {
            self.show_help = !self.show_help;
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let panel_rect = ui.max_rect();
                let response = ui.interact(panel_rect, ui.id().with("canvas"), egui::Sense::click());
                let view = CanvasView::fit(panel_rect, self.scene.width, self.scene.height);

                self.paint_scene(ui.painter(), &view);

                if response.clicked()
                    && let Some(pos) = response.interact_pointer_pos()
                {
                    self.click(view.to_canvas(pos));
                }

                if self.show_help {
                    ui.painter().text(
                        panel_rect.left_top() + egui::vec2(10.0, 10.0),
                        egui::Align2::LEFT_TOP,
                        help_text(&self.listen_addr),
                        egui::FontId::monospace(13.0),
                        egui::Color32::from_rgba_unmultiplied(255, 255, 255, 160),
                    );
                }
            });
    }
}

/// Open the window and block until it is closed.
///
/// `on_screen_ready` runs once, on the UI thread, as soon as the egui context
/// exists; it is where the caller builds its canvas and starts the loop.
pub fn run<F>(
    config: WindowConfig,
    poster: Poster,
    scenes: Receiver<Scene>,
    on_screen_ready: F,
) -> anyhow::Result<()>
where
    F: FnOnce(&egui::Context) -> anyhow::Result<()>,
{
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("{} v{}", config.title, env!("CARGO_PKG_VERSION")))
            .with_inner_size([config.canvas_width as f32, config.canvas_height as f32])
            .with_resizable(true),
        ..Default::default()
    };

    info!("Opening window {}x{}", config.canvas_width, config.canvas_height);

    eframe::run_native(
        "painter",
        native_options,
        Box::new(move |cc| {
            on_screen_ready(&cc.egui_ctx)?;
            Ok(Box::new(Visualizer::new(&config, poster, scenes)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Window failed: {}", e))?;

    info!("Window closed");
    Ok(())
}
