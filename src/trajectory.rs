//! The wind mouse: a small physics simulation that produces human-looking
//! pointer paths.
//!
//! A simulated cursor starts at the origin with zero velocity. Every coarse
//! step it is pulled toward the target by constant-strength gravity and
//! pushed around by wind, a random vector that halves every step before new
//! noise is added. Velocity is capped at `max_step_size` pixels per step.
//! The pixel delta of each coarse step is handed to a micro-interpolator
//! together with a share of the remaining time proportional to the distance
//! it covers. Once the cursor is within `max_step_size` of the target, one
//! final interpolation covers the exact remaining delta and time.
//!
//! All arithmetic is integer; velocity and wind carry a fixed-point scale of
//! [`SCALE`].

use rand::RngCore;
use tracing::{debug, trace};

use crate::config::Tuning;
use crate::distance::{approx_distance, mul_div};
use crate::error::Result;
use crate::interpolation::{interpolate_compensated, interpolate_precise};
use crate::noise::{signed_byte, XorShift32, SCALE};
use crate::timing::{Clock, Delayer, Mover};

const WIND_DECAY: i64 = 2;

/// Diagnostics for one movement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    /// Physics steps taken before the final approach
    pub coarse_steps: u32,
    /// Loop passes including the final approach
    pub iterations: u32,
    /// Whether the step limit forced the final approach
    pub step_limit_hit: bool,
}

/// How a coarse step turns into delays
trait Pacing {
    /// Time still available to the movement
    fn remaining_us(&self) -> u64;

    /// Execute one coarse step that should take `budget_us`
    fn step(&mut self, dx: i32, dy: i32, budget_us: u64) -> Result<()>;

    /// Execute the final approach with whatever time is left
    fn finish(&mut self, dx: i32, dy: i32) -> Result<()>;
}

/// Trusts the delayer; the remaining budget is plain bookkeeping
struct Exact<'a, M: ?Sized, D: ?Sized> {
    mover: &'a mut M,
    delayer: &'a mut D,
    remaining_us: u64,
}

impl<M, D> Pacing for Exact<'_, M, D>
where
    M: Mover + ?Sized,
    D: Delayer + ?Sized,
{
    fn remaining_us(&self) -> u64 {
        self.remaining_us
    }

    fn step(&mut self, dx: i32, dy: i32, budget_us: u64) -> Result<()> {
        self.remaining_us -= budget_us;
        interpolate_precise(dx, dy, budget_us, &mut *self.mover, &mut *self.delayer)
    }

    fn finish(&mut self, dx: i32, dy: i32) -> Result<()> {
        let rest = std::mem::take(&mut self.remaining_us);
        interpolate_precise(dx, dy, rest, &mut *self.mover, &mut *self.delayer)
    }
}

/// Measures every step against the clock and feeds the drift back
///
/// A step that overran shortens the next request by the overrun (and an
/// early finish lengthens it). The remaining budget is always recomputed
/// from wall-clock time since the movement started.
struct Compensated<'a, M: ?Sized, D: ?Sized, C: ?Sized> {
    mover: &'a mut M,
    delayer: &'a mut D,
    clock: &'a C,
    start_us: u64,
    duration_us: u64,
    remaining_us: u64,
    drift_us: i64,
}

impl<M, D, C> Pacing for Compensated<'_, M, D, C>
where
    M: Mover + ?Sized,
    D: Delayer + ?Sized,
    C: Clock + ?Sized,
{
    fn remaining_us(&self) -> u64 {
        self.remaining_us
    }

    fn step(&mut self, dx: i32, dy: i32, budget_us: u64) -> Result<()> {
        let ideal = i64::try_from(budget_us).unwrap_or(i64::MAX);
        let request = ideal.saturating_sub(self.drift_us).max(0) as u64;

        let before = self.clock.now_us();
        interpolate_compensated(
            dx,
            dy,
            request,
            &mut *self.mover,
            &mut *self.delayer,
            self.clock,
        )?;
        let after = self.clock.now_us();

        let actual = i64::try_from(after.saturating_sub(before)).unwrap_or(i64::MAX);
        self.drift_us = self.drift_us.saturating_add(actual.saturating_sub(ideal));

        let elapsed = after.saturating_sub(self.start_us);
        self.remaining_us = self.duration_us.saturating_sub(elapsed);
        Ok(())
    }

    fn finish(&mut self, dx: i32, dy: i32) -> Result<()> {
        interpolate_compensated(
            dx,
            dy,
            self.remaining_us,
            &mut *self.mover,
            &mut *self.delayer,
            self.clock,
        )
    }
}

/// Human-like pointer movement generator
///
/// Owns its noise generator; paths from two instances with the same seed
/// and inputs are identical. Use one instance per thread.
///
/// # Example
/// ```
/// use windmouse::{Result, Tuning, VirtualClock, WindMouse};
///
/// let mut wind = WindMouse::seeded(Tuning::default(), 42);
/// let mut position = (0, 0);
/// let mut mover = |dx: i32, dy: i32| -> Result<()> {
///     position.0 += dx;
///     position.1 += dy;
///     Ok(())
/// };
/// let mut delayer = VirtualClock::new();
/// wind.move_precise(300, -120, 250_000, &mut mover, &mut delayer)?;
/// assert_eq!(position, (300, -120));
/// # Ok::<(), windmouse::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct WindMouse<R = XorShift32> {
    tuning: Tuning,
    noise: R,
}

impl WindMouse<XorShift32> {
    /// Generator seeded from the build fingerprint
    pub fn new(tuning: Tuning) -> Self {
        Self::with_noise(tuning, XorShift32::from_build())
    }

    pub fn seeded(tuning: Tuning, seed: u32) -> Self {
        Self::with_noise(tuning, XorShift32::new(seed))
    }
}

impl Default for WindMouse<XorShift32> {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl<R: RngCore> WindMouse<R> {
    pub fn with_noise(tuning: Tuning, noise: R) -> Self {
        Self { tuning, noise }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Move by `(delta_x, delta_y)` over `duration_us`, trusting the delayer
    ///
    /// The moves sum to the requested delta and the delays sum to
    /// `duration_us` exactly.
    pub fn move_precise<M, D>(
        &mut self,
        delta_x: i16,
        delta_y: i16,
        duration_us: u64,
        mover: &mut M,
        delayer: &mut D,
    ) -> Result<Report>
    where
        M: Mover + ?Sized,
        D: Delayer + ?Sized,
    {
        let mut pacing = Exact {
            mover,
            delayer,
            remaining_us: duration_us,
        };
        let report = self.simulate(delta_x, delta_y, &mut pacing)?;
        debug!(
            delta_x,
            delta_y,
            duration_us,
            iterations = report.iterations,
            "precise movement done"
        );
        Ok(report)
    }

    /// Move by `(delta_x, delta_y)` over `duration_us` with an inexact delayer
    ///
    /// Timing is measured with `clock` and corrected step by step, so the
    /// movement ends close to `duration_us` after it started even when
    /// individual sleeps overshoot. The moves still sum to the requested
    /// delta exactly.
    pub fn move_compensated<M, D, C>(
        &mut self,
        delta_x: i16,
        delta_y: i16,
        duration_us: u64,
        mover: &mut M,
        delayer: &mut D,
        clock: &C,
    ) -> Result<Report>
    where
        M: Mover + ?Sized,
        D: Delayer + ?Sized,
        C: Clock + ?Sized,
    {
        let start_us = clock.now_us();
        let mut pacing = Compensated {
            mover,
            delayer,
            clock,
            start_us,
            duration_us,
            remaining_us: duration_us,
            drift_us: 0,
        };
        let report = self.simulate(delta_x, delta_y, &mut pacing)?;
        debug!(
            delta_x,
            delta_y,
            duration_us,
            elapsed_us = clock.now_us().saturating_sub(start_us),
            drift_us = pacing.drift_us,
            iterations = report.iterations,
            "compensated movement done"
        );
        Ok(report)
    }

    fn simulate<P: Pacing>(&mut self, delta_x: i16, delta_y: i16, pacing: &mut P) -> Result<Report> {
        let target = (i64::from(delta_x), i64::from(delta_y));
        let scale = i64::from(SCALE);
        let gravity = i64::from(self.tuning.gravity_strength) * scale;
        let max_wind = u64::from(self.tuning.max_wind_magnitude);
        let max_step = u64::from(self.tuning.max_step_size);
        let speed_cap = max_step * SCALE as u64;

        let mut current = (0i64, 0i64);
        let mut previous = current;
        let mut velocity = (0i64, 0i64);
        let mut wind = (0i64, 0i64);

        let mut distance = approx_distance(target.0, target.1);
        // Escape hatch against paths that orbit or stall
        let step_limit = u32::try_from(distance).unwrap_or(u32::MAX).saturating_add(1);
        let mut report = Report::default();

        while max_step > 0 && distance > max_step {
            if report.coarse_steps >= step_limit {
                report.step_limit_hit = true;
                break;
            }

            let wind_magnitude = max_wind.min(distance) as i64;
            wind.0 = wind.0 / WIND_DECAY + i64::from(signed_byte(&mut self.noise)) * wind_magnitude;
            wind.1 = wind.1 / WIND_DECAY + i64::from(signed_byte(&mut self.noise)) * wind_magnitude;

            // distance > max_step >= 1 here
            let d = distance as i64;
            velocity.0 += wind.0 + gravity * (target.0 - current.0) / d;
            velocity.1 += wind.1 + gravity * (target.1 - current.1) / d;

            let speed = approx_distance(velocity.0, velocity.1);
            if speed > speed_cap {
                // speed > speed_cap >= 128 here
                velocity.0 = velocity.0 * speed_cap as i64 / speed as i64;
                velocity.1 = velocity.1 * speed_cap as i64 / speed as i64;
            }

            let step = (velocity.0 / scale, velocity.1 / scale);
            current.0 += step.0;
            current.1 += step.1;

            let step_distance = approx_distance(step.0, step.1);
            let remaining = pacing.remaining_us();
            let budget = mul_div(remaining, step_distance, distance).min(remaining);

            trace!(
                x = current.0,
                y = current.1,
                vx = velocity.0,
                vy = velocity.1,
                wind_x = wind.0,
                wind_y = wind.1,
                distance,
                budget,
                "coarse step"
            );

            pacing.step(
                (current.0 - previous.0) as i32,
                (current.1 - previous.1) as i32,
                budget,
            )?;
            previous = current;

            distance = approx_distance(target.0 - current.0, target.1 - current.1);
            report.coarse_steps += 1;
        }

        pacing.finish((target.0 - previous.0) as i32, (target.1 - previous.1) as i32)?;
        report.iterations = report.coarse_steps + 1;
        Ok(report)
    }
}
