//! Human-like pointer trajectories.
//!
//! [`WindMouse`] turns a relative displacement and a time budget into a
//! stream of small moves and delays. The path wanders like a hand would,
//! but the moves always add up to the requested displacement and the
//! delays to the requested duration.
//!
//! Nothing here touches a real device or timer. Moves, delays and the clock
//! are collaborators passed in by the caller (see [`timing`]), so the same
//! generator drives a uinput pointer, a drawing canvas or a test recorder.

pub mod config;
pub mod distance;
pub mod error;
pub mod interpolation;
pub mod noise;
pub mod record;
pub mod timing;
pub mod trajectory;

pub use config::Tuning;
pub use distance::approx_distance;
pub use error::{Error, Result};
pub use interpolation::{interpolate_compensated, interpolate_precise, UnitSteps};
pub use noise::XorShift32;
pub use record::{PathRecorder, Sample};
pub use timing::{
    Cancellable, Clock, CoarseSleep, Delayer, MonotonicClock, Mover, SpinSleep, ThreadSleep,
    VirtualClock,
};
pub use trajectory::{Report, WindMouse};
