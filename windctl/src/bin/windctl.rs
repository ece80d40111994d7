use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use windctl::{PointerCtl, SleepKind, Timing};
use windmouse::{Clock, PathRecorder, Sample, Tuning, VirtualClock, WindMouse, XorShift32};

#[derive(Parser)]
#[command(name = "windctl")]
#[command(about = "Human-like pointer movement on a virtual uinput mouse")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Move the real pointer through a virtual uinput device
    Move {
        #[command(flatten)]
        motion: MotionArgs,

        /// How the thread waits between moves
        #[arg(long, value_enum, default_value_t = SleepArg::Spin)]
        sleep: SleepArg,
    },
    /// Print the moves a movement would emit, on simulated time
    Trace {
        #[command(flatten)]
        motion: MotionArgs,

        /// Emit one JSON object per move
        #[arg(long)]
        json: bool,

        /// Make every simulated sleep overshoot by this percentage
        #[arg(long, default_value_t = 0)]
        overshoot_pct: u64,

        /// Add fixed latency to every simulated sleep (µs)
        #[arg(long, default_value_t = 0)]
        latency_us: u64,
    },
}

#[derive(Args)]
struct MotionArgs {
    /// Horizontal pixels (positive = right)
    #[arg(allow_negative_numbers = true)]
    dx: i16,

    /// Vertical pixels (positive = down)
    #[arg(allow_negative_numbers = true)]
    dy: i16,

    /// Total movement time in milliseconds
    #[arg(long, default_value_t = 500)]
    duration_ms: u64,

    /// Timing strategy
    #[arg(long, value_enum, default_value_t = TimingArg::Compensated)]
    timing: TimingArg,

    /// Pull toward the target
    #[arg(long, default_value_t = Tuning::default().gravity_strength)]
    gravity: u8,

    /// Maximum random jitter
    #[arg(long, default_value_t = Tuning::default().max_wind_magnitude)]
    wind: u8,

    /// Speed cap in pixels per step
    #[arg(long, default_value_t = Tuning::default().max_step_size)]
    max_step: u8,

    /// Noise seed (defaults to the build fingerprint)
    #[arg(long)]
    seed: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TimingArg {
    Precise,
    Compensated,
}

#[derive(Clone, Copy, ValueEnum)]
enum SleepArg {
    Spin,
    Thread,
    Coarse,
}

impl From<TimingArg> for Timing {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Precise => Timing::Precise,
            TimingArg::Compensated => Timing::Compensated,
        }
    }
}

impl From<SleepArg> for SleepKind {
    fn from(arg: SleepArg) -> Self {
        match arg {
            SleepArg::Spin => SleepKind::Spin,
            SleepArg::Thread => SleepKind::Thread,
            SleepArg::Coarse => SleepKind::Coarse,
        }
    }
}

impl MotionArgs {
    fn tuning(&self) -> Tuning {
        Tuning {
            gravity_strength: self.gravity,
            max_wind_magnitude: self.wind,
            max_step_size: self.max_step,
        }
    }

    fn wind_mouse(&self) -> WindMouse {
        let noise = self.seed.map(XorShift32::new).unwrap_or_default();
        WindMouse::with_noise(self.tuning(), noise)
    }

    fn duration_us(&self) -> u64 {
        self.duration_ms.saturating_mul(1000)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("windctl={},windmouse={}", level, level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Move { motion, sleep } => run_move(&motion, sleep),
        Commands::Trace {
            motion,
            json,
            overshoot_pct,
            latency_us,
        } => run_trace(&motion, json, overshoot_pct, latency_us),
    }
}

fn run_move(motion: &MotionArgs, sleep: SleepArg) -> Result<()> {
    if matches!(motion.timing, TimingArg::Precise) && !matches!(sleep, SleepArg::Spin) {
        warn!("precise timing with an inexact sleep will overrun the duration");
    }

    info!("creating virtual pointer (takes about a second)");
    let mut ctl = PointerCtl::new().context("could not open /dev/uinput")?;
    let mut wind = motion.wind_mouse();

    ctl.glide(
        &mut wind,
        motion.dx,
        motion.dy,
        Duration::from_millis(motion.duration_ms),
        motion.timing.into(),
        sleep.into(),
    )?;
    Ok(())
}

fn run_trace(motion: &MotionArgs, json: bool, overshoot_pct: u64, latency_us: u64) -> Result<()> {
    let clock = VirtualClock::new();
    let mut recorder = PathRecorder::new(clock.clone());
    let mut delayer = drifting_sleep(&clock, overshoot_pct, latency_us);
    let mut wind = motion.wind_mouse();
    let duration_us = motion.duration_us();

    let report = match motion.timing {
        TimingArg::Precise => {
            wind.move_precise(motion.dx, motion.dy, duration_us, &mut recorder, &mut delayer)?
        }
        TimingArg::Compensated => wind.move_compensated(
            motion.dx,
            motion.dy,
            duration_us,
            &mut recorder,
            &mut delayer,
            &clock,
        )?,
    };

    for line in render_samples(recorder.samples(), json)? {
        println!("{}", line);
    }

    info!(
        moves = recorder.samples().len(),
        coarse_steps = report.coarse_steps,
        step_limit_hit = report.step_limit_hit,
        path_px = recorder.path_length(),
        requested_us = duration_us,
        elapsed_us = clock.now_us(),
        "trace finished"
    );
    Ok(())
}

/// Simulated sleep that overshoots by `overshoot_pct` percent plus `latency_us`
fn drifting_sleep(
    clock: &VirtualClock,
    overshoot_pct: u64,
    latency_us: u64,
) -> impl FnMut(u64) -> windmouse::Result<()> + '_ {
    move |us| {
        clock.advance(us + us * overshoot_pct / 100 + latency_us);
        Ok(())
    }
}

/// One JSON object per sample, or a table with a header row
fn render_samples(samples: &[Sample], json: bool) -> serde_json::Result<Vec<String>> {
    if json {
        return samples.iter().map(serde_json::to_string).collect();
    }

    let mut lines = Vec::with_capacity(samples.len() + 1);
    lines.push(format!("{:>10} {:>4} {:>4} {:>7} {:>7}", "t_us", "dx", "dy", "x", "y"));
    for s in samples {
        lines.push(format!("{:>10} {:>4} {:>4} {:>7} {:>7}", s.t_us, s.dx, s.dy, s.x, s.y));
    }
    Ok(lines)
}
