//! Render surface capability.
//!
//! The minimal set of primitives an [`Operation`](super::ops::Operation) needs
//! from whatever it draws on. The loop's consumer thread is the only caller, so
//! implementations need no internal locking.

use super::ops::{Point, Rect, Rgb};

pub trait Surface {
    /// Replace the background region and its fill color.
    fn set_background(&mut self, rect: Rect, color: Rgb);

    /// Fill `rect` with `color`.
    fn fill(&mut self, rect: Rect, color: Rgb);

    /// Current reference position.
    fn position(&self) -> Point;

    fn set_position(&mut self, position: Point);

    /// Publish the current state as a new frame / request a redraw.
    fn publish(&mut self);
}
