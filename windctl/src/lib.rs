mod device;
pub mod error;

use evdev::uinput::VirtualDevice;
use evdev::{EventType, InputEvent, RelativeAxisType};
use std::thread;
use std::time::Duration;
use tracing::info;
use windmouse::{
    Clock, CoarseSleep, Delayer, MonotonicClock, Mover, Report, SpinSleep, ThreadSleep, WindMouse,
};

pub use error::{Error, Result};

/// Which wind mouse entry point drives the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Fixed unit-step schedule; needs an exact sleep
    Precise,
    /// Clock-corrected schedule; tolerates a sloppy sleep
    Compensated,
}

/// How the thread waits between moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepKind {
    /// Busy-wait, microsecond accurate
    Spin,
    /// `std::thread::sleep`
    Thread,
    /// Whole milliseconds only
    Coarse,
}

impl SleepKind {
    pub fn delayer(self) -> Box<dyn Delayer> {
        match self {
            SleepKind::Spin => Box::new(SpinSleep),
            SleepKind::Thread => Box::new(ThreadSleep),
            SleepKind::Coarse => Box::new(CoarseSleep),
        }
    }
}

/// Virtual relative pointer backed by /dev/uinput
pub struct PointerCtl {
    device: VirtualDevice,
}

impl PointerCtl {
    /// Create the virtual pointer
    ///
    /// Takes a little over a second while the kernel registers the device.
    /// Requires access to /dev/uinput (typically root or input group membership).
    pub fn new() -> Result<Self> {
        let device = device::create_pointer()?;
        let mut ctl = Self { device };

        // The first report after creation is sometimes partially dropped
        let _ = ctl.move_relative(1, 0);
        thread::sleep(Duration::from_millis(50));
        let _ = ctl.move_relative(-1, 0);
        thread::sleep(Duration::from_millis(50));

        Ok(ctl)
    }

    /// Move the pointer by a relative amount in one report
    pub fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.emit_relative(dx, dy).map_err(windmouse::Error::Device)?;
        Ok(())
    }

    /// Move along a wind mouse path
    ///
    /// # Example
    /// ```no_run
    /// use windctl::{PointerCtl, SleepKind, Timing};
    /// use windmouse::WindMouse;
    /// use std::time::Duration;
    ///
    /// let mut ctl = PointerCtl::new().unwrap();
    /// let mut wind = WindMouse::default();
    /// ctl.glide(&mut wind, 400, -150, Duration::from_millis(600), Timing::Compensated, SleepKind::Thread)
    ///     .unwrap();
    /// ```
    pub fn glide(
        &mut self,
        wind: &mut WindMouse,
        dx: i16,
        dy: i16,
        duration: Duration,
        timing: Timing,
        sleep: SleepKind,
    ) -> Result<Report> {
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        let mut delayer = sleep.delayer();
        let clock = MonotonicClock::new();

        let report = match timing {
            Timing::Precise => wind.move_precise(dx, dy, duration_us, self, delayer.as_mut())?,
            Timing::Compensated => {
                wind.move_compensated(dx, dy, duration_us, self, delayer.as_mut(), &clock)?
            }
        };

        info!(
            dx,
            dy,
            requested_us = duration_us,
            elapsed_us = clock.now_us(),
            coarse_steps = report.coarse_steps,
            max_step = wind.tuning().max_step_size,
            "glide finished"
        );
        Ok(report)
    }

    fn emit_relative(&mut self, dx: i32, dy: i32) -> std::io::Result<()> {
        let events = [
            InputEvent::new_now(EventType::RELATIVE, RelativeAxisType::REL_X.0, dx),
            InputEvent::new_now(EventType::RELATIVE, RelativeAxisType::REL_Y.0, dy),
            InputEvent::new_now(EventType::SYNCHRONIZATION, 0, 0), // SYN_REPORT
        ];
        self.device.emit(&events)
    }
}

impl Mover for PointerCtl {
    fn move_by(&mut self, dx: i32, dy: i32) -> windmouse::Result<()> {
        self.emit_relative(dx, dy)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sleep_kind_builds_a_delayer() {
        for kind in [SleepKind::Spin, SleepKind::Thread, SleepKind::Coarse] {
            let mut delayer = kind.delayer();
            delayer.sleep_us(0).unwrap();
        }
    }

    #[test]
    fn coarse_sleep_drops_sub_millisecond_requests() {
        let clock = MonotonicClock::new();
        let mut delayer = SleepKind::Coarse.delayer();
        delayer.sleep_us(900).unwrap();
        assert!(clock.now_us() < 900);
    }
}
