//! HTTP script ingest.
//!
//! # Purpose
//!
//! Lets external tools and scripts draw by submitting command scripts over
//! HTTP. Each request is parsed as a whole and its operations are posted to
//! the command loop, or rejected without posting anything.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐        Poster::post         ┌──────────────────────┐
//! │   rouille pool threads  │  ───── Operation ────────▶  │   Loop consumer      │
//! │                         │                             │   (single thread)    │
//! │  GET  /?cmd=<script>    │  ──▶ lang::parse ──▶ ops ─▶ │  op.apply(canvas)    │
//! │  POST /  <script body>  │                             │                      │
//! └─────────────────────────┘                             └──────────────────────┘
//! ```
//!
//! - **rouille** - sync HTTP server (simpler than async axum/tokio)
//! - **Poster** - cloneable producer handle of the loop queue
//!
//! # Responses
//!
//! | Result                         | Status | Body  |
//! |--------------------------------|--------|-------|
//! | script parsed, ops posted      | 200    | empty |
//! | parse error / body too large   | 400    | empty |
//!
//! Error details are logged, never returned.

mod api;

pub use api::{ApiServer, IngestLimits, ServerHandle};
