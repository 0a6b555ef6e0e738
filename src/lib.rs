//! PAINTER - toy drawing server
//!
//! Re-exports all modules for use by the binary target.

// Core engine (operations, surface, command loop)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod lang;
pub mod runner;
pub mod server;
pub mod ui;

// Re-export commonly used types from core
pub use crate::core::{Canvas, Loop, Operation, Poster, Scene, Surface};
pub use lang::{parse, ParseError};
