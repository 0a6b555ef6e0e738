//! Script ingest implementation using rouille.
//!
//! # Purpose
//!
//! Accepts drawing scripts over HTTP, parses them and posts the resulting
//! operations to the command loop.
//!
//! # Key types
//!
//! - [`ApiServer`] - binds the listener, spawns the serving thread
//! - [`ServerHandle`] - bound address + shutdown for a running server
//! - [`IngestLimits`] - request size limits
//!
//! # Thread safety
//!
//! - rouille runs each request on its own pool thread
//! - every handler posts through a clone of the loop's `Poster`; the loop's
//!   queue lock is the only synchronization point
//! - a script is posted only after it parsed completely, so concurrent
//!   requests never interleave half a script with a failed one

use rouille::{Request, Response};
use std::io::{BufReader, Read};
use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;

use crate::core::op_loop::Poster;
use crate::core::ops::Operation;
use crate::lang;

/// Request limits applied before parsing
#[derive(Debug, Clone, Copy)]
pub struct IngestLimits {
    /// Largest accepted POST body, in bytes
    pub max_script_bytes: u64,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_script_bytes: 1024 * 1024,
        }
    }
}

/// Why a request was rejected (operator log only, never sent to clients)
#[derive(Debug)]
enum Rejection {
    Parse(lang::ParseError),
    TooLarge(u64),
    Io(std::io::Error),
    BodyConsumed,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Parse(e) => write!(f, "bad script: {}", e),
            Rejection::TooLarge(limit) => write!(f, "script exceeds {} bytes", limit),
            Rejection::Io(e) => write!(f, "failed to read body: {}", e),
            Rejection::BodyConsumed => write!(f, "request body unavailable"),
        }
    }
}

/// Script ingest server
pub struct ApiServer;

/// Running server. Dropping it leaves the server running; call `stop()`.
pub struct ServerHandle {
    addr: SocketAddr,
    stop_tx: mpsc::Sender<()>,
    thread: thread::JoinHandle<()>,
}

impl ServerHandle {
    /// Address actually bound (useful with port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting requests and wait for the serving thread.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.thread.join().is_err() {
            log::warn!("Ingest server thread panicked");
        }
        log::info!("Ingest server on http://{} stopped", self.addr);
    }
}

impl ApiServer {
    /// Bind `addr` and serve on a background thread.
    ///
    /// Binding happens before returning so address-in-use errors reach the caller.
    pub fn start(
        addr: &str,
        poster: Poster,
        limits: IngestLimits,
    ) -> anyhow::Result<ServerHandle> {
        let server = rouille::Server::new(addr, move |request| {
            Self::handle_request(request, &poster, limits)
        })
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

        let bound = server.server_addr();
        log::info!("Ingest server listening on http://{}", bound);

        let (thread, stop_tx) = server.stoppable();
        Ok(ServerHandle {
            addr: bound,
            stop_tx,
            thread,
        })
    }

    /// Route one request: GET reads `?cmd=`, every other method reads the body.
    /// Any path is accepted.
    pub fn handle_request(request: &Request, poster: &Poster, limits: IngestLimits) -> Response {
        log::debug!("{} {} from {}", request.method(), request.raw_url(), request.remote_addr());

        let parsed = if request.method() == "GET" {
            let script = request.get_param("cmd").unwrap_or_default();
            log::debug!("Received command: {}", script);
            lang::parse(&script).map_err(Rejection::Parse)
        } else {
            Self::parse_body(request, limits)
        };

        match parsed {
            Ok(ops) => {
                Self::post_all(poster, ops);
                Response::text("")
            }
            Err(e) => {
                log::warn!("Rejected {} {}: {}", request.method(), request.raw_url(), e);
                Response::empty_400()
            }
        }
    }

    fn parse_body(request: &Request, limits: IngestLimits) -> Result<Vec<Operation>, Rejection> {
        let body = request.data().ok_or(Rejection::BodyConsumed)?;

        // Read one byte past the limit to tell "exactly at limit" from "over"
        let mut buf = Vec::new();
        body.take(limits.max_script_bytes + 1)
            .read_to_end(&mut buf)
            .map_err(Rejection::Io)?;
        if buf.len() as u64 > limits.max_script_bytes {
            return Err(Rejection::TooLarge(limits.max_script_bytes));
        }

        lang::parse_reader(BufReader::new(buf.as_slice())).map_err(Rejection::Parse)
    }

    fn post_all(poster: &Poster, ops: Vec<Operation>) {
        log::debug!("Posting {} operations to loop", ops.len());
        for op in ops {
            poster.post(op);
        }
    }
}
