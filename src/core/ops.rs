//! Draw operations and the integer geometry they carry.
//!
//! An [`Operation`] is produced by the script parser (`crate::lang`) or by the
//! window's input handling, queued on the [`Loop`](super::op_loop::Loop) and
//! finally applied to a [`Surface`] by the loop's consumer thread.
//!
//! Operations are plain values: applying one is the only side effect they have,
//! and all of that side effect lands on the target surface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::surface::Surface;

/// Integer point / offset in canvas space (+Y is down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by `offset`, saturating at the `i32` bounds.
    pub fn offset(self, offset: Point) -> Point {
        Point {
            x: self.x.saturating_add(offset.x),
            y: self.y.saturating_add(offset.y),
        }
    }
}

/// Axis-aligned integer rectangle, `min` inclusive, `max` exclusive.
///
/// Always canonical: `min.x <= max.x` and `min.y <= max.y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Build from two corners given in any order.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            min: Point::new(x1.min(x2), y1.min(y2)),
            max: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        Self::new(0, 0, w, h)
    }

    pub fn width(&self) -> i64 {
        self.max.x as i64 - self.min.x as i64
    }

    pub fn height(&self) -> i64 {
        self.max.y as i64 - self.min.y as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Translate both corners by `offset` (saturating).
    pub fn translate(&self, offset: Point) -> Rect {
        Rect {
            min: self.min.offset(offset),
            max: self.max.offset(offset),
        }
    }

    /// Overlapping area, `None` when the rects do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        };
        if r.is_empty() { None } else { Some(r) }
    }
}

/// Opaque RGB color. Alpha is implicitly 255.
///
/// Serialized as its `rrggbb` hex string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Error for color literals that are not exactly six hex digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColor(pub String);

impl fmt::Display for InvalidColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected RRGGBB hex color, got {:?}", self.0)
    }
}

impl std::error::Error for InvalidColor {}

impl FromStr for Rgb {
    type Err = InvalidColor;

    /// Parse `RRGGBB` (either case, no `#` prefix).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidColor(s.to_string()));
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| InvalidColor(s.to_string()));
        Ok(Rgb::new(byte(0)?, byte(2)?, byte(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = InvalidColor;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

/// One immutable draw / state-change command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Replace the background fill region and color
    SetBackground { rect: Rect, color: Rgb },
    /// Fill a rectangle on the surface
    DrawFigure { rect: Rect, color: Rgb },
    /// Translate the surface's reference position
    Move { offset: Point },
}

impl Operation {
    /// Apply to `target`, then ask it to publish a new frame.
    ///
    /// Callers must hold exclusive access to `target` for the whole call;
    /// `Move` reads and writes the position cell non-atomically.
    pub fn apply(&self, target: &mut dyn Surface) {
        match self {
            Operation::SetBackground { rect, color } => {
                target.set_background(*rect, *color);
            }
            Operation::DrawFigure { rect, color } => {
                target.fill(*rect, *color);
            }
            Operation::Move { offset } => {
                let pos = target.position();
                target.set_position(pos.offset(*offset));
            }
        }
        target.publish();
    }

    /// Script keyword of this operation.
    pub fn keyword(&self) -> &'static str {
        match self {
            Operation::SetBackground { .. } => "BGRECT",
            Operation::DrawFigure { .. } => "FIGURE",
            Operation::Move { .. } => "MOVE",
        }
    }
}

/// Formats back into the script line the operation parses from.
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SetBackground { rect, color } | Operation::DrawFigure { rect, color } => write!(
                f,
                "{} {} {} {} {} {}",
                self.keyword(),
                rect.min.x,
                rect.min.y,
                rect.max.x,
                rect.max.y,
                color
            ),
            Operation::Move { offset } => write!(f, "MOVE {} {}", offset.x, offset.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface::testing::{RecordingSurface, SurfaceCall};

    #[test]
    fn test_rect_is_canonical() {
        let r = Rect::new(90, 80, 10, 20);
        assert_eq!(r.min, Point::new(10, 20));
        assert_eq!(r.max, Point::new(90, 80));
        assert_eq!(r.width(), 80);
        assert_eq!(r.height(), 60);
        assert!(Rect::new(5, 0, 5, 10).is_empty());
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 150, 150);
        assert_eq!(a.intersect(&b), Some(Rect::new(50, 50, 100, 100)));
        assert_eq!(a.intersect(&Rect::new(100, 0, 200, 10)), None);
    }

    #[test]
    fn test_point_offset_saturates() {
        let p = Point::new(i32::MAX - 1, i32::MIN + 1).offset(Point::new(10, -10));
        assert_eq!(p, Point::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("ffffff".parse::<Rgb>(), Ok(Rgb::WHITE));
        assert_eq!("00Ff00".parse::<Rgb>(), Ok(Rgb::new(0, 255, 0)));
        assert!("#00ff00".parse::<Rgb>().is_err());
        assert!("0f0".parse::<Rgb>().is_err());
        assert!("00ff0g".parse::<Rgb>().is_err());
        // Non-ASCII input must not panic on byte slicing
        assert!("ééé".parse::<Rgb>().is_err());
        assert_eq!(Rgb::new(1, 171, 255).to_string(), "01abff");
    }

    #[test]
    fn test_apply_figure_fills_and_publishes() {
        let mut surface = RecordingSurface::default();
        let rect = Rect::new(10, 10, 90, 90);
        let color = Rgb::new(0, 255, 0);

        Operation::DrawFigure { rect, color }.apply(&mut surface);

        assert_eq!(
            surface.calls(),
            vec![SurfaceCall::Fill(rect, color), SurfaceCall::Publish]
        );
    }

    #[test]
    fn test_apply_background_replaces_and_publishes() {
        let mut surface = RecordingSurface::default();
        let rect = Rect::new(0, 0, 100, 100);

        Operation::SetBackground { rect, color: Rgb::WHITE }.apply(&mut surface);

        assert_eq!(
            surface.calls(),
            vec![SurfaceCall::SetBackground(rect, Rgb::WHITE), SurfaceCall::Publish]
        );
    }

    #[test]
    fn test_apply_move_accumulates_position() {
        let mut surface = RecordingSurface::default();

        Operation::Move { offset: Point::new(10, 5) }.apply(&mut surface);
        Operation::Move { offset: Point::new(-3, 20) }.apply(&mut surface);

        assert_eq!(surface.position(), Point::new(7, 25));
        assert_eq!(
            surface.calls(),
            vec![
                SurfaceCall::SetPosition(Point::new(10, 5)),
                SurfaceCall::Publish,
                SurfaceCall::SetPosition(Point::new(7, 25)),
                SurfaceCall::Publish,
            ]
        );
    }

    #[test]
    fn test_display_matches_script_syntax() {
        let op = Operation::SetBackground { rect: Rect::new(0, 0, 100, 100), color: Rgb::WHITE };
        assert_eq!(op.to_string(), "BGRECT 0 0 100 100 ffffff");
        assert_eq!(Operation::Move { offset: Point::new(-1, 2) }.to_string(), "MOVE -1 2");
    }
}
