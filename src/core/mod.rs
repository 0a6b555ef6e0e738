//! Core drawing engine - operations, render surface, command loop
//!
//! These modules are independent of HTTP and of the window toolkit
//! (apart from the repaint handle `Canvas` may hold).

pub mod canvas;
pub mod op_loop;
pub mod ops;
pub mod surface;

// Re-exports for convenience
pub use canvas::{Canvas, Fill, Scene};
pub use op_loop::{Loop, Poster};
pub use ops::{Operation, Point, Rect, Rgb};
pub use surface::Surface;
