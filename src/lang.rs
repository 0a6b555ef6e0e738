//! Drawing script parser.
//!
//! One command per line, whitespace-separated fields:
//!
//! ```text
//! # comment
//! BGRECT x1 y1 x2 y2 RRGGBB   set background rect + color
//! FIGURE x1 y1 x2 y2 RRGGBB   fill a figure rect
//! MOVE dx dy                  translate the reference position
//! ```
//!
//! Parsing is all-or-nothing: the first bad line fails the whole script and
//! no operations are returned.

use std::io::BufRead;

use crate::core::ops::{Operation, Point, Rect, Rgb};

/// Script parse failure. `line` is 1-based.
#[derive(Debug)]
pub enum ParseError {
    /// Wrong number of fields for a known keyword
    InvalidCommand {
        line: usize,
        keyword: &'static str,
        text: String,
    },
    /// Coordinate field is not a base-10 `i32`
    InvalidCoordinates {
        line: usize,
        keyword: &'static str,
        field: String,
    },
    /// Color field is not exactly six hex digits
    InvalidColor { line: usize, field: String },
    UnknownCommand { line: usize, token: String },
    /// Reader failed or produced invalid UTF-8
    Read { line: usize, source: std::io::Error },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::InvalidCommand { line, .. }
            | ParseError::InvalidCoordinates { line, .. }
            | ParseError::InvalidColor { line, .. }
            | ParseError::UnknownCommand { line, .. }
            | ParseError::Read { line, .. } => *line,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: ", self.line())?;
        match self {
            ParseError::InvalidCommand { keyword, text, .. } => {
                write!(f, "invalid {} command: {}", keyword, text)
            }
            ParseError::InvalidCoordinates { keyword, field, .. } => {
                write!(f, "invalid {} coordinates: {}", keyword, field)
            }
            ParseError::InvalidColor { field, .. } => write!(f, "invalid color: {}", field),
            ParseError::UnknownCommand { token, .. } => write!(f, "unknown command: {}", token),
            ParseError::Read { source, .. } => write!(f, "read error: {}", source),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parse a whole script held in memory.
pub fn parse(script: &str) -> Result<Vec<Operation>, ParseError> {
    let mut ops = Vec::new();
    for (idx, line) in script.lines().enumerate() {
        if let Some(op) = parse_line(idx + 1, line)? {
            ops.push(op);
        }
    }
    Ok(ops)
}

/// Parse a script streamed from `reader` (request bodies).
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<Operation>, ParseError> {
    let mut ops = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ParseError::Read { line: idx + 1, source })?;
        if let Some(op) = parse_line(idx + 1, &line)? {
            ops.push(op);
        }
    }
    Ok(ops)
}

/// Parse one line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Operation>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    let op = match fields[0] {
        "BGRECT" => {
            let (rect, color) = parse_rect_command(line_no, "BGRECT", line, &fields)?;
            Operation::SetBackground { rect, color }
        }
        "FIGURE" => {
            let (rect, color) = parse_rect_command(line_no, "FIGURE", line, &fields)?;
            Operation::DrawFigure { rect, color }
        }
        "MOVE" => {
            expect_fields(line_no, "MOVE", line, &fields, 3)?;
            let dx = parse_coord(line_no, "MOVE", fields[1])?;
            let dy = parse_coord(line_no, "MOVE", fields[2])?;
            Operation::Move { offset: Point::new(dx, dy) }
        }
        other => {
            return Err(ParseError::UnknownCommand {
                line: line_no,
                token: other.to_string(),
            });
        }
    };
    Ok(Some(op))
}

/// `KEYWORD x1 y1 x2 y2 RRGGBB`
fn parse_rect_command(
    line_no: usize,
    keyword: &'static str,
    line: &str,
    fields: &[&str],
) -> Result<(Rect, Rgb), ParseError> {
    expect_fields(line_no, keyword, line, fields, 6)?;
    let x1 = parse_coord(line_no, keyword, fields[1])?;
    let y1 = parse_coord(line_no, keyword, fields[2])?;
    let x2 = parse_coord(line_no, keyword, fields[3])?;
    let y2 = parse_coord(line_no, keyword, fields[4])?;
    let color = fields[5].parse::<Rgb>().map_err(|_| ParseError::InvalidColor {
        line: line_no,
        field: fields[5].to_string(),
    })?;
    Ok((Rect::new(x1, y1, x2, y2), color))
}

fn expect_fields(
    line_no: usize,
    keyword: &'static str,
    line: &str,
    fields: &[&str],
    count: usize,
) -> Result<(), ParseError> {
    if fields.len() != count {
        return Err(ParseError::InvalidCommand {
            line: line_no,
            keyword,
            text: line.to_string(),
        });
    }
    Ok(())
}

fn parse_coord(line_no: usize, keyword: &'static str, field: &str) -> Result<i32, ParseError> {
    field.parse::<i32>().map_err(|_| ParseError::InvalidCoordinates {
        line: line_no,
        keyword,
        field: field.to_string(),
    })
}
