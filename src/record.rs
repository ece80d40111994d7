//! Path recording for dry runs and tests.

use serde::Serialize;

use crate::error::Result;
use crate::timing::{Clock, Mover};

/// One emitted move, stamped with the clock reading when it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub t_us: u64,
    pub dx: i32,
    pub dy: i32,
    /// Cumulative position after the move
    pub x: i32,
    pub y: i32,
}

/// Mover that keeps every move instead of applying it
#[derive(Debug, Clone)]
pub struct PathRecorder<C> {
    clock: C,
    origin_us: u64,
    position: (i32, i32),
    samples: Vec<Sample>,
}

impl<C: Clock> PathRecorder<C> {
    /// Timestamps are relative to the clock reading at construction
    pub fn new(clock: C) -> Self {
        let origin_us = clock.now_us();
        Self {
            clock,
            origin_us,
            position: (0, 0),
            samples: Vec::new(),
        }
    }

    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Length of the recorded path in pixels, using true Euclidean steps
    pub fn path_length(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| f64::from(s.dx).hypot(f64::from(s.dy)))
            .sum()
    }
}

impl<C: Clock> Mover for PathRecorder<C> {
    fn move_by(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.position.0 += dx;
        self.position.1 += dy;
        self.samples.push(Sample {
            t_us: self.clock.now_us().saturating_sub(self.origin_us),
            dx,
            dy,
            x: self.position.0,
            y: self.position.1,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::VirtualClock;

    #[test]
    fn records_relative_time_and_position() {
        let clock = VirtualClock::starting_at(1_000);
        let mut recorder = PathRecorder::new(clock.clone());
        recorder.move_by(3, 4).unwrap();
        clock.advance(250);
        recorder.move_by(-1, 0).unwrap();

        assert_eq!(recorder.position(), (2, 4));
        assert_eq!(
            recorder.samples(),
            &[
                Sample { t_us: 0, dx: 3, dy: 4, x: 3, y: 4 },
                Sample { t_us: 250, dx: -1, dy: 0, x: 2, y: 4 },
            ]
        );
        assert!((recorder.path_length() - 6.0).abs() < 1e-9);
    }
}
