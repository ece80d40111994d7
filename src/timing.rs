//! Collaborators the trajectory loop talks to: where moves go, how delays
//! happen and what time it is.
//!
//! Closures work directly: `FnMut(i32, i32) -> Result<()>` is a [`Mover`],
//! `FnMut(u64) -> Result<()>` is a [`Delayer`] and `Fn() -> u64` is a
//! [`Clock`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Applies one relative pointer move
pub trait Mover {
    fn move_by(&mut self, dx: i32, dy: i32) -> Result<()>;
}

/// Blocks the calling thread for a number of microseconds
pub trait Delayer {
    fn sleep_us(&mut self, micros: u64) -> Result<()>;
}

/// Monotonically non-decreasing microsecond timestamp
pub trait Clock {
    fn now_us(&self) -> u64;
}

impl<F> Mover for F
where
    F: FnMut(i32, i32) -> Result<()>,
{
    fn move_by(&mut self, dx: i32, dy: i32) -> Result<()> {
        self(dx, dy)
    }
}

impl<F> Delayer for F
where
    F: FnMut(u64) -> Result<()>,
{
    fn sleep_us(&mut self, micros: u64) -> Result<()> {
        self(micros)
    }
}

impl<F> Clock for F
where
    F: Fn() -> u64,
{
    fn now_us(&self) -> u64 {
        self()
    }
}

/// Busy-waits on the monotonic clock
///
/// Burns a core for the whole delay but returns within a few hundred
/// nanoseconds of the deadline, which is what the precise strategy needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinSleep;

impl Delayer for SpinSleep {
    fn sleep_us(&mut self, micros: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_micros(micros);
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
        Ok(())
    }
}

/// OS sleep; usually overshoots by the scheduler's granularity
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Delayer for ThreadSleep {
    fn sleep_us(&mut self, micros: u64) -> Result<()> {
        thread::sleep(Duration::from_micros(micros));
        Ok(())
    }
}

/// OS sleep truncated to whole milliseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct CoarseSleep;

impl Delayer for CoarseSleep {
    fn sleep_us(&mut self, micros: u64) -> Result<()> {
        thread::sleep(Duration::from_millis(micros / 1000));
        Ok(())
    }
}

/// Microseconds elapsed since construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_us(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// Simulated time that only moves when someone sleeps on it
///
/// Clones share the same timeline, so one handle can be lent out as the
/// delayer while another serves as the clock. Every sleep advances time by
/// exactly the requested amount.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now_us: Arc<AtomicU64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(micros: u64) -> Self {
        Self {
            now_us: Arc::new(AtomicU64::new(micros)),
        }
    }

    /// Move time forward without going through a delayer
    pub fn advance(&self, micros: u64) {
        self.now_us.fetch_add(micros, Ordering::Relaxed);
    }
}

impl Clock for VirtualClock {
    fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::Relaxed)
    }
}

impl Delayer for VirtualClock {
    fn sleep_us(&mut self, micros: u64) -> Result<()> {
        self.advance(micros);
        Ok(())
    }
}

/// Delayer that refuses to sleep once its flag is raised
///
/// The trajectory loop only yields through its collaborators, so this is
/// the way to stop a movement from another thread. The move in flight is
/// abandoned with [`Error::Cancelled`].
#[derive(Debug, Clone)]
pub struct Cancellable<D> {
    inner: D,
    cancelled: Arc<AtomicBool>,
}

impl<D: Delayer> Cancellable<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag; store `true` to cancel
    pub fn flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl<D: Delayer> Delayer for Cancellable<D> {
    fn sleep_us(&mut self, micros: u64) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.inner.sleep_us(micros)
    }
}
