//! Concrete render surface.
//!
//! `Canvas` owns the render state (background, figures, reference position)
//! and lives on the loop's consumer thread. Every `publish()` puts an
//! immutable [`Scene`] snapshot into a one-slot crossbeam channel and asks
//! egui for a repaint. A frame the window has not picked up yet is replaced,
//! so at most one scene is ever waiting. Figures are shared between the
//! canvas and its snapshots until the next `fill`.
//!
//! ```text
//! consumer thread                       UI thread
//! ┌──────────────┐  Scene (1 slot)     ┌─────────────────┐
//! │ Canvas       │ ──────────────────▶ │ Visualizer      │
//! │  apply(op)   │   request_repaint   │  paint latest   │
//! └──────────────┘ ──────────────────▶ └─────────────────┘
//! ```

use crossbeam_channel::{Receiver, Sender, TrySendError};
use eframe::egui;
use log::trace;
use std::sync::Arc;

use super::ops::{Point, Rect, Rgb};
use super::surface::Surface;

/// A filled rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub rect: Rect,
    pub color: Rgb,
}

/// Snapshot of the render state at one `publish()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    /// Monotonic frame counter, starting at 1 for the first published frame
    pub frame: u64,
    pub width: u32,
    pub height: u32,
    pub background: Option<Fill>,
    /// Figures in draw order, in canvas space before translation
    pub figures: Arc<Vec<Fill>>,
    pub position: Point,
}

impl Scene {
    /// Empty scene shown before the first publish.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            frame: 0,
            width,
            height,
            background: None,
            figures: Arc::default(),
            position: Point::ORIGIN,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Background clipped to the canvas.
    pub fn visible_background(&self) -> Option<Fill> {
        let bg = self.background?;
        bg.rect.intersect(&self.bounds()).map(|rect| Fill { rect, color: bg.color })
    }

    /// Figures translated by the reference position and clipped to the canvas.
    pub fn visible_figures(&self) -> impl Iterator<Item = Fill> + '_ {
        let bounds = self.bounds();
        self.figures.iter().filter_map(move |f| {
            f.rect
                .translate(self.position)
                .intersect(&bounds)
                .map(|rect| Fill { rect, color: f.color })
        })
    }
}

/// Render surface publishing into a latest-frame slot.
pub struct Canvas {
    width: u32,
    height: u32,
    background: Option<Fill>,
    figures: Arc<Vec<Fill>>,
    position: Point,
    frame: u64,
    scenes: Sender<Scene>,
    // Drains the stale frame when the window is behind
    stale: Receiver<Scene>,
    ctx: Option<egui::Context>,
}

impl Canvas {
    /// Canvas without a window (headless mode, tests).
    pub fn new(width: u32, height: u32) -> Self {
        let (scenes, stale) = crossbeam_channel::bounded(1);
        Self {
            width,
            height,
            background: None,
            figures: Arc::default(),
            position: Point::ORIGIN,
            frame: 0,
            scenes,
            stale,
            ctx: None,
        }
    }

    /// Wake the egui event loop after each publish.
    pub fn with_context(self, ctx: egui::Context) -> Self {
        Self { ctx: Some(ctx), ..self }
    }

    /// Receiving end for the window. Holds at most the newest scene.
    pub fn scenes(&self) -> Receiver<Scene> {
        self.stale.clone()
    }

    fn snapshot(&self) -> Scene {
        Scene {
            frame: self.frame,
            width: self.width,
            height: self.height,
            background: self.background,
            figures: Arc::clone(&self.figures),
            position: self.position,
        }
    }
}

impl Surface for Canvas {
    fn set_background(&mut self, rect: Rect, color: Rgb) {
        self.background = Some(Fill { rect, color });
    }

    fn fill(&mut self, rect: Rect, color: Rgb) {
        Arc::make_mut(&mut self.figures).push(Fill { rect, color });
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn publish(&mut self) {
        self.frame += 1;
        trace!("Publishing frame {} ({} figures)", self.frame, self.figures.len());

        let mut scene = self.snapshot();
        // The canvas holds a receiver itself, so the slot never disconnects
        while let Err(TrySendError::Full(unsent)) = self.scenes.try_send(scene) {
            if let Ok(old) = self.stale.try_recv() {
                trace!("Replacing undelivered frame {}", old.frame);
            }
            scene = unsent;
        }

        if let Some(ref ctx) = self.ctx {
            ctx.request_repaint();
        }
    }
}
