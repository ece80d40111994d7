//! Micro-interpolators: turn one small `(dx, dy, duration)` into the actual
//! sequence of pointer moves and delays.
//!
//! Both variants guarantee the moves sum to `(dx, dy)`. They differ in what
//! they assume about the delayer:
//!
//! * [`interpolate_precise`] trusts every sleep to last exactly as long as
//!   requested and walks a fixed unit-step schedule.
//! * [`interpolate_compensated`] polls a clock and places the pointer where it
//!   should be at the measured time, so an inaccurate sleep costs path
//!   granularity instead of position.

use crate::distance::mul_div;
use crate::error::Result;
use crate::timing::{Clock, Delayer, Mover};

/// Two-axis digital differential analyzer over `max(|dx|, |dy|)` slices
///
/// Each slice adds `|dx|` and `|dy|` to per-axis error accumulators and
/// yields a unit step on every axis whose accumulator reached the slice
/// count. Both axes may step in the same slice.
#[derive(Debug, Clone)]
pub struct UnitSteps {
    abs: (u32, u32),
    sign: (i32, i32),
    steps: u32,
    remaining: u32,
    acc: (u32, u32),
}

impl UnitSteps {
    pub fn new(dx: i32, dy: i32) -> Self {
        let abs = (dx.unsigned_abs(), dy.unsigned_abs());
        let steps = abs.0.max(abs.1).max(1);
        Self {
            abs,
            sign: (dx.signum(), dy.signum()),
            steps,
            remaining: steps,
            acc: (0, 0),
        }
    }

    /// Number of slices the walk is divided into (at least one)
    pub fn slices(&self) -> u32 {
        self.steps
    }
}

impl Iterator for UnitSteps {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        self.acc.0 += self.abs.0;
        self.acc.1 += self.abs.1;

        let mut step = (0, 0);
        if self.acc.0 >= self.steps {
            self.acc.0 -= self.steps;
            step.0 = self.sign.0;
        }
        if self.acc.1 >= self.steps {
            self.acc.1 -= self.steps;
            step.1 = self.sign.1;
        }
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for UnitSteps {}

/// Unit-step interpolation for an exact delayer
///
/// Sleeps once per DDA slice. Slices are `duration_us / steps` long, with
/// the remainder spread over the walk by the same accumulator rule, so the
/// sleeps add up to `duration_us` exactly. A zero delta is a single sleep
/// for the whole duration.
pub fn interpolate_precise<M, D>(
    dx: i32,
    dy: i32,
    duration_us: u64,
    mover: &mut M,
    delayer: &mut D,
) -> Result<()>
where
    M: Mover + ?Sized,
    D: Delayer + ?Sized,
{
    if dx == 0 && dy == 0 {
        return delayer.sleep_us(duration_us);
    }

    let walk = UnitSteps::new(dx, dy);
    let slices = u64::from(walk.slices());
    let slice_us = duration_us / slices;
    let spare_us = duration_us % slices;
    let mut spare_acc = 0u64;
    let mut moved = (0i32, 0i32);

    for (step_x, step_y) in walk {
        spare_acc += spare_us;
        let mut delay = slice_us;
        if spare_acc >= slices {
            spare_acc -= slices;
            delay += 1;
        }

        if step_x != 0 || step_y != 0 {
            mover.move_by(step_x, step_y)?;
            moved.0 += step_x;
            moved.1 += step_y;
        }
        delayer.sleep_us(delay)?;
    }

    // Truncation guard; free of delay
    let rest = (dx - moved.0, dy - moved.1);
    if rest != (0, 0) {
        mover.move_by(rest.0, rest.1)?;
    }
    Ok(())
}

/// Clock-driven interpolation for an inexact delayer
///
/// Repeatedly reads the clock, moves to the linearly interpolated position
/// for the elapsed time and sleeps for the time one pixel of the dominant
/// axis should take (capped by what is left, never below 1 µs). Stops once
/// the budget is spent and closes any gap with a final move.
///
/// The delayer must advance `clock` for non-zero requests, otherwise the
/// polling loop cannot finish.
pub fn interpolate_compensated<M, D, C>(
    dx: i32,
    dy: i32,
    duration_us: u64,
    mover: &mut M,
    delayer: &mut D,
    clock: &C,
) -> Result<()>
where
    M: Mover + ?Sized,
    D: Delayer + ?Sized,
    C: Clock + ?Sized,
{
    if dx == 0 && dy == 0 {
        return delayer.sleep_us(duration_us);
    }

    let abs = (u64::from(dx.unsigned_abs()), u64::from(dy.unsigned_abs()));
    let sign = (dx.signum(), dy.signum());
    let per_pixel_us = (duration_us / abs.0.max(abs.1)).max(1);

    let start = clock.now_us();
    let end = start.saturating_add(duration_us);
    let mut done = (0u64, 0u64);

    loop {
        let now = clock.now_us();
        if now >= end {
            break;
        }
        let elapsed = now.saturating_sub(start);

        let want = (
            mul_div(abs.0, elapsed, duration_us),
            mul_div(abs.1, elapsed, duration_us),
        );
        let step = (want.0.saturating_sub(done.0), want.1.saturating_sub(done.1));
        if step != (0, 0) {
            mover.move_by(step.0 as i32 * sign.0, step.1 as i32 * sign.1)?;
            done.0 += step.0;
            done.1 += step.1;
        }

        delayer.sleep_us(per_pixel_us.min(end - now))?;
    }

    let rest = (abs.0 - done.0, abs.1 - done.1);
    if rest != (0, 0) {
        mover.move_by(rest.0 as i32 * sign.0, rest.1 as i32 * sign.1)?;
    }
    Ok(())
}
