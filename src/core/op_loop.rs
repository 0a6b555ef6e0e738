//! Command loop: multi-producer, single-consumer FIFO of operations.
//!
//! Producers (HTTP handlers, the window's input handling) call `post()` from
//! any thread. One dedicated consumer thread pops operations in submission
//! order and applies them to the render surface it owns.
//!
//! The mutex guards only the queue and the stop flag. Operations are applied
//! outside the lock, so a slow redraw never blocks producers. An idle consumer
//! sleeps on a condition variable instead of polling.
//!
//! Shutdown is fast, not graceful: `stop_and_wait()` lets the consumer finish
//! the operation it is applying, then discards whatever is still queued.
//!
//! # Example
//! ```ignore
//! let mut op_loop = Loop::new();
//! let poster = op_loop.poster();          // hand to HTTP server, window, ...
//! op_loop.start(canvas)?;
//! poster.post(Operation::Move { offset: Point::new(10, 10) });
//! op_loop.stop_and_wait();
//! ```

use log::{debug, info, trace, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use super::ops::Operation;
use super::surface::Surface;

#[derive(Default)]
struct State {
    pending: VecDeque<Operation>,
    stopped: bool,
}

/// Queue shared between producers and the consumer
#[derive(Default)]
struct Queue {
    state: Mutex<State>,
    ready: Condvar,
}

impl Queue {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Operations are plain data; a panicked holder cannot leave them torn
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, op: Operation) {
        self.lock().pending.push_back(op);
        self.ready.notify_one();
    }

    /// Block until an operation is available or the loop is stopped.
    /// Returns `None` once stopped.
    fn next(&self) -> Option<Operation> {
        let mut state = self.lock();
        loop {
            if state.stopped {
                return None;
            }
            if let Some(op) = state.pending.pop_front() {
                return Some(op);
            }
            state = self.ready.wait(state).unwrap_or_else(|e| e.into_inner());
        }
    }
}

/// Cloneable producer handle.
#[derive(Clone)]
pub struct Poster {
    queue: Arc<Queue>,
}

impl Poster {
    /// Append `op` to the tail of the queue. Never fails, never waits for rendering.
    pub fn post(&self, op: Operation) {
        trace!("Posting {}", op);
        self.queue.push(op);
    }

    /// Number of queued operations not yet picked up by the consumer.
    pub fn pending(&self) -> usize {
        self.queue.lock().pending.len()
    }
}

/// Owner of the queue and its consumer thread.
pub struct Loop {
    queue: Arc<Queue>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Default for Loop {
    fn default() -> Self {
        Self::new()
    }
}

impl Loop {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Queue::default()),
            worker: None,
        }
    }

    /// Producer handle sharing this loop's queue.
    pub fn poster(&self) -> Poster {
        Poster {
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn post(&self, op: Operation) {
        self.queue.push(op);
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().pending.len()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the consumer thread, which takes ownership of `target`.
    ///
    /// Operations posted before `start` are applied first, in order.
    /// Calling `start` on a running loop is ignored.
    pub fn start<S>(&mut self, target: S) -> std::io::Result<()>
    where
        S: Surface + Send + 'static,
    {
        if self.is_running() {
            warn!("Command loop already running, start() ignored");
            return Ok(());
        }

        self.queue.lock().stopped = false;

        let queue = Arc::clone(&self.queue);
        let handle = thread::Builder::new()
            .name("painter-loop".to_string())
            .spawn(move || {
                debug!("Command loop consumer started");
                let mut target = target;
                let mut applied: u64 = 0;

                while let Some(op) = queue.next() {
                    trace!("Applying {}", op);
                    op.apply(&mut target);
                    applied += 1;
                }

                debug!("Command loop consumer stopped after {} operations", applied);
            })?;

        self.worker = Some(handle);
        info!("Command loop started");
        Ok(())
    }

    /// Signal the consumer to exit after its current operation and join it.
    ///
    /// Operations still queued are dropped, not applied. No-op if the loop
    /// is not running.
    pub fn stop_and_wait(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        self.queue.lock().stopped = true;
        self.queue.ready.notify_all();

        if handle.join().is_err() {
            warn!("Command loop consumer panicked");
        }

        let dropped = std::mem::take(&mut self.queue.lock().pending);
        if !dropped.is_empty() {
            info!("Command loop stopped, discarded {} queued operations", dropped.len());
        } else {
            info!("Command loop stopped");
        }
    }
}

impl Drop for Loop {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ops::{Point, Rect, Rgb};
    use crate::core::surface::testing::{RecordingSurface, SurfaceCall};
    use crossbeam_channel::{Receiver, Sender, unbounded};
    use std::time::{Duration, Instant};

    /// Poll until `cond` holds or the deadline passes.
    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        cond()
    }

    /// Figure whose rect encodes (producer, sequence)
    fn tagged(producer: i32, seq: i32) -> Operation {
        Operation::DrawFigure {
            rect: Rect::new(producer, seq, producer + 1, seq + 1),
            color: Rgb::BLACK,
        }
    }

    #[test]
    fn test_applies_in_post_order() {
        let surface = RecordingSurface::default();
        let mut op_loop = Loop::new();
        op_loop.start(surface.clone()).unwrap();

        op_loop.post(Operation::SetBackground { rect: Rect::new(0, 0, 100, 100), color: Rgb::WHITE });
        op_loop.post(Operation::DrawFigure { rect: Rect::new(10, 10, 90, 90), color: Rgb::new(0, 255, 0) });
        op_loop.post(Operation::Move { offset: Point::new(10, 10) });

        assert!(wait_for(|| surface.draw_calls().len() == 3));
        op_loop.stop_and_wait();

        assert_eq!(
            surface.draw_calls(),
            vec![
                SurfaceCall::SetBackground(Rect::new(0, 0, 100, 100), Rgb::WHITE),
                SurfaceCall::Fill(Rect::new(10, 10, 90, 90), Rgb::new(0, 255, 0)),
                SurfaceCall::SetPosition(Point::new(10, 10)),
            ]
        );
    }

    #[test]
    fn test_start_then_stop_applies_nothing() {
        let surface = RecordingSurface::default();
        let mut op_loop = Loop::new();

        op_loop.start(surface.clone()).unwrap();
        assert!(op_loop.is_running());
        op_loop.stop_and_wait();

        assert!(!op_loop.is_running());
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut op_loop = Loop::new();
        op_loop.stop_and_wait();
        op_loop.stop_and_wait();
        assert!(!op_loop.is_running());
    }

    #[test]
    fn test_ops_posted_before_start_are_applied_first() {
        let surface = RecordingSurface::default();
        let mut op_loop = Loop::new();

        op_loop.post(tagged(0, 0));
        op_loop.post(tagged(0, 1));
        assert_eq!(op_loop.pending(), 2);

        op_loop.start(surface.clone()).unwrap();
        op_loop.post(tagged(0, 2));

        assert!(wait_for(|| surface.draw_calls().len() == 3));
        op_loop.stop_and_wait();

        let seqs: Vec<i32> = surface
            .draw_calls()
            .into_iter()
            .map(|c| match c {
                SurfaceCall::Fill(rect, _) => rect.min.y,
                other => panic!("unexpected call {:?}", other),
            })
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn test_concurrent_producers_keep_their_order() {
        const PRODUCERS: i32 = 8;
        const PER_PRODUCER: i32 = 200;

        let surface = RecordingSurface::default();
        let mut op_loop = Loop::new();
        op_loop.start(surface.clone()).unwrap();

        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let poster = op_loop.poster();
                thread::spawn(move || {
                    for seq in 0..PER_PRODUCER {
                        poster.post(tagged(p, seq));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let total = (PRODUCERS * PER_PRODUCER) as usize;
        assert!(wait_for(|| surface.draw_calls().len() == total));
        op_loop.stop_and_wait();

        let mut next_seq = vec![0; PRODUCERS as usize];
        for call in surface.draw_calls() {
            let SurfaceCall::Fill(rect, _) = call else {
                panic!("unexpected call {:?}", call);
            };
            let producer = rect.min.x as usize;
            assert_eq!(rect.min.y, next_seq[producer], "producer {} out of order", producer);
            next_seq[producer] += 1;
        }
        assert!(next_seq.iter().all(|&n| n == PER_PRODUCER));
    }

    #[test]
    fn test_posts_while_stopped_wait_for_restart() {
        let surface = RecordingSurface::default();
        let mut op_loop = Loop::new();
        op_loop.start(surface.clone()).unwrap();
        op_loop.stop_and_wait();

        op_loop.post(tagged(0, 0));
        op_loop.post(tagged(0, 1));
        assert_eq!(op_loop.pending(), 2);

        op_loop.start(surface.clone()).unwrap();
        assert!(wait_for(|| surface.draw_calls().len() == 2));
        op_loop.stop_and_wait();
        assert_eq!(op_loop.pending(), 0);
    }

    /// Surface whose `fill` blocks until the test opens the gate.
    struct GatedSurface {
        inner: RecordingSurface,
        entered: Sender<()>,
        gate: Receiver<()>,
    }

    impl Surface for GatedSurface {
        fn set_background(&mut self, rect: Rect, color: Rgb) {
            self.inner.set_background(rect, color);
        }

        fn fill(&mut self, rect: Rect, color: Rgb) {
            let _ = self.entered.send(());
            let _ = self.gate.recv();
            self.inner.fill(rect, color);
        }

        fn position(&self) -> Point {
            self.inner.position()
        }

        fn set_position(&mut self, position: Point) {
            self.inner.set_position(position);
        }

        fn publish(&mut self) {
            self.inner.publish();
        }
    }

    #[test]
    fn test_stop_discards_queued_operations() {
        let (entered_tx, entered_rx) = unbounded();
        let (gate_tx, gate_rx) = unbounded();
        let recorder = RecordingSurface::default();
        let surface = GatedSurface {
            inner: recorder.clone(),
            entered: entered_tx,
            gate: gate_rx,
        };

        let mut op_loop = Loop::new();
        op_loop.start(surface).unwrap();
        for seq in 0..4 {
            op_loop.post(tagged(0, seq));
        }

        // Consumer is now inside the first apply; the rest stay queued
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(op_loop.pending(), 3);

        let opener = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            for _ in 0..4 {
                let _ = gate_tx.send(());
            }
        });
        op_loop.stop_and_wait();
        opener.join().unwrap();

        // The in-flight operation completes, queued ones are dropped
        assert_eq!(recorder.draw_calls().len(), 1);
        assert_eq!(op_loop.pending(), 0);
    }

    #[test]
    fn test_double_start_is_ignored() {
        let surface = RecordingSurface::default();
        let mut op_loop = Loop::new();
        op_loop.start(surface.clone()).unwrap();
        op_loop.start(surface.clone()).unwrap();

        op_loop.post(tagged(0, 0));
        assert!(wait_for(|| surface.draw_calls().len() == 1));
        op_loop.stop_and_wait();

        // A second consumer would have been a second owner of the surface
        assert_eq!(surface.draw_calls().len(), 1);
    }

    #[test]
    fn test_drop_stops_consumer() {
        let surface = RecordingSurface::default();
        {
            let mut op_loop = Loop::new();
            op_loop.start(surface.clone()).unwrap();
            op_loop.post(tagged(0, 0));
            assert!(wait_for(|| surface.draw_calls().len() == 1));
        }
        assert_eq!(surface.draw_calls().len(), 1);
    }
}
