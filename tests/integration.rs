//! End-to-end properties of the wind mouse against simulated collaborators.

use std::cell::RefCell;

use proptest::prelude::*;
use windmouse::{
    approx_distance, Cancellable, Clock, Error, PathRecorder, Result, Tuning, VirtualClock,
    WindMouse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Move(i32, i32),
    Sleep(u64),
}

#[derive(Debug, Default)]
struct Run {
    events: Vec<Event>,
}

impl Run {
    fn displacement(&self) -> (i32, i32) {
        self.events.iter().fold((0, 0), |acc, e| match *e {
            Event::Move(x, y) => (acc.0 + x, acc.1 + y),
            Event::Sleep(_) => acc,
        })
    }

    fn slept(&self) -> u64 {
        self.events
            .iter()
            .map(|e| match *e {
                Event::Sleep(us) => us,
                Event::Move(..) => 0,
            })
            .sum()
    }

    fn moves(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Move(..)))
            .count()
    }
}

fn run_precise(seed: u32, dx: i16, dy: i16, duration_us: u64) -> Run {
    let events = RefCell::new(Vec::new());
    let mut mover = |x: i32, y: i32| -> Result<()> {
        events.borrow_mut().push(Event::Move(x, y));
        Ok(())
    };
    let mut delayer = |us: u64| -> Result<()> {
        events.borrow_mut().push(Event::Sleep(us));
        Ok(())
    };
    WindMouse::seeded(Tuning::default(), seed)
        .move_precise(dx, dy, duration_us, &mut mover, &mut delayer)
        .expect("precise movement");
    Run {
        events: events.into_inner(),
    }
}

/// Runs the compensated variant on a virtual clock whose sleeps last
/// `num / den` of the request plus `extra_us`.
fn run_compensated(
    seed: u32,
    dx: i16,
    dy: i16,
    duration_us: u64,
    (num, den, extra_us): (u64, u64, u64),
) -> (Run, u64) {
    let clock = VirtualClock::new();
    let events = RefCell::new(Vec::new());
    let mut mover = |x: i32, y: i32| -> Result<()> {
        events.borrow_mut().push(Event::Move(x, y));
        Ok(())
    };
    let mut delayer = |us: u64| -> Result<()> {
        events.borrow_mut().push(Event::Sleep(us));
        clock.advance(us * num / den + extra_us);
        Ok(())
    };
    WindMouse::seeded(Tuning::default(), seed)
        .move_compensated(dx, dy, duration_us, &mut mover, &mut delayer, &clock)
        .expect("compensated movement");
    let elapsed = clock.now_us();
    (
        Run {
            events: events.into_inner(),
        },
        elapsed,
    )
}

const PERFECT: (u64, u64, u64) = (1, 1, 0);

#[test]
fn zero_distance_sleeps_once() {
    let run = run_precise(1, 0, 0, 1_000_000);
    assert_eq!(run.events, vec![Event::Sleep(1_000_000)]);

    let (run, elapsed) = run_compensated(1, 0, 0, 1_000_000, PERFECT);
    assert_eq!(run.events, vec![Event::Sleep(1_000_000)]);
    assert_eq!(elapsed, 1_000_000);
}

#[test]
fn single_axis_move() {
    let run = run_precise(9, 100, 0, 1_000_000);
    assert_eq!(run.displacement(), (100, 0));
    assert_eq!(run.slept(), 1_000_000);
}

#[test]
fn zero_duration_moves_without_waiting() {
    let run = run_precise(3, -700, 450, 0);
    assert_eq!(run.displacement(), (-700, 450));
    assert_eq!(run.slept(), 0);

    let (run, elapsed) = run_compensated(3, -700, 450, 0, PERFECT);
    assert_eq!(run.displacement(), (-700, 450));
    assert_eq!(elapsed, 0);
}

#[test]
fn extreme_displacements_arrive() {
    for (dx, dy) in [
        (i16::MAX, i16::MAX),
        (i16::MIN, i16::MIN),
        (i16::MIN, i16::MAX),
        (10_000, -10_000),
    ] {
        let run = run_precise(17, dx, dy, 2_000_000);
        assert_eq!(run.displacement(), (i32::from(dx), i32::from(dy)));
        assert_eq!(run.slept(), 2_000_000);
    }
}

#[test]
fn same_seed_same_triples() {
    let a = run_precise(0x5EED, 812, -377, 640_000);
    let b = run_precise(0x5EED, 812, -377, 640_000);
    assert_eq!(a.events, b.events);

    let (a, _) = run_compensated(0x5EED, 812, -377, 640_000, PERFECT);
    let (b, _) = run_compensated(0x5EED, 812, -377, 640_000, PERFECT);
    assert_eq!(a.events, b.events);
}

#[test]
fn path_is_not_a_straight_line() {
    let clock = VirtualClock::new();
    let mut recorder = PathRecorder::new(clock.clone());
    let mut delayer = clock.clone();
    WindMouse::seeded(Tuning::default(), 21)
        .move_precise(1200, 0, 1_000_000, &mut recorder, &mut delayer)
        .unwrap();

    assert_eq!(recorder.position(), (1200, 0));
    assert!(recorder.samples().iter().any(|s| s.y != 0));
    assert!(recorder.path_length() > 1200.0);
    // timestamps never run backwards and end within the budget
    let samples = recorder.samples();
    assert!(samples.windows(2).all(|w| w[0].t_us <= w[1].t_us));
    assert!(samples.last().unwrap().t_us <= 1_000_000);
}

#[test]
fn compensation_beats_drift() {
    // sleeps overshoot by a quarter plus 30 µs of scheduler latency
    let drift = (5, 4, 30);
    let duration_us = 1_000_000;

    let clock = VirtualClock::new();
    let mut delayer = |us: u64| -> Result<()> {
        clock.advance(us * 5 / 4 + 30);
        Ok(())
    };
    let mut mover = |_: i32, _: i32| -> Result<()> { Ok(()) };
    WindMouse::seeded(Tuning::default(), 4)
        .move_precise(800, 0, duration_us, &mut mover, &mut delayer)
        .unwrap();
    let uncorrected = clock.now_us();

    let (run, corrected) = run_compensated(4, 800, 0, duration_us, drift);
    assert_eq!(run.displacement(), (800, 0));
    assert!(corrected >= duration_us);
    assert!(
        corrected < uncorrected,
        "compensated {corrected} vs uncorrected {uncorrected}"
    );
    assert!(corrected < duration_us * 115 / 100, "took {corrected} µs");
}

/// With no time to spread them over, every coarse step arrives as one move
fn coarse_moves(tuning: Tuning, seed: u32, dx: i16, dy: i16) -> Vec<(i32, i32)> {
    let clock = VirtualClock::new();
    let mut delayer = clock.clone();
    let mut moves = Vec::new();
    let mut mover = |x: i32, y: i32| -> Result<()> {
        moves.push((x, y));
        Ok(())
    };
    let report = WindMouse::seeded(tuning, seed)
        .move_compensated(dx, dy, 0, &mut mover, &mut delayer, &clock)
        .expect("zero-duration movement");
    assert!(!report.step_limit_hit);
    assert_eq!(clock.now_us(), 0);
    moves
}

#[test]
fn coarse_steps_respect_speed_cap() {
    for max_step_size in [32u8, 8] {
        let tuning = Tuning {
            max_step_size,
            ..Tuning::default()
        };
        for seed in 0..200 {
            let moves = coarse_moves(tuning, seed, -9000, 7000);
            let total = moves
                .iter()
                .fold((0, 0), |acc, m| (acc.0 + m.0, acc.1 + m.1));
            assert_eq!(total, (-9000, 7000));
            for &(x, y) in &moves {
                let step = approx_distance(i64::from(x), i64::from(y));
                assert!(
                    step <= u64::from(max_step_size),
                    "seed {seed}: move ({x}, {y}) exceeds cap {max_step_size}"
                );
            }
        }
    }
}

#[test]
fn undersleeping_clock_still_arrives() {
    let (run, elapsed) = run_compensated(8, -300, 900, 500_000, (1, 2, 1));
    assert_eq!(run.displacement(), (-300, 900));
    assert!(elapsed <= 500_000);
}

#[test]
fn cancellation_propagates() {
    let clock = VirtualClock::new();
    let mut delayer = Cancellable::new(clock.clone());
    delayer.cancel();
    let mut moves = 0;
    let mut mover = |_: i32, _: i32| -> Result<()> {
        moves += 1;
        Ok(())
    };
    let err = WindMouse::seeded(Tuning::default(), 2)
        .move_compensated(400, 400, 100_000, &mut mover, &mut delayer, &clock)
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(moves <= 1);
    assert_eq!(clock.now_us(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn precise_arrives_exactly_on_time(
        seed in any::<u32>(),
        dx in -10_000i16..=10_000,
        dy in -10_000i16..=10_000,
        duration_us in 0u64..=5_000_000,
    ) {
        let run = run_precise(seed, dx, dy, duration_us);
        prop_assert_eq!(run.displacement(), (i32::from(dx), i32::from(dy)));
        prop_assert_eq!(run.slept(), duration_us);
    }

    #[test]
    fn compensated_arrives_exactly_on_perfect_clock(
        seed in any::<u32>(),
        dx in -10_000i16..=10_000,
        dy in -10_000i16..=10_000,
        duration_us in 0u64..=5_000_000,
    ) {
        let (run, elapsed) = run_compensated(seed, dx, dy, duration_us, PERFECT);
        prop_assert_eq!(run.displacement(), (i32::from(dx), i32::from(dy)));
        prop_assert_eq!(elapsed, duration_us);
    }

    #[test]
    fn coarse_steps_are_bounded(
        seed in any::<u32>(),
        dx in -10_000i16..=10_000,
        dy in -10_000i16..=10_000,
    ) {
        let mut mover = |_: i32, _: i32| -> Result<()> { Ok(()) };
        let mut delayer = |_: u64| -> Result<()> { Ok(()) };
        let report = WindMouse::seeded(Tuning::default(), seed)
            .move_precise(dx, dy, 1_000, &mut mover, &mut delayer)
            .unwrap();
        let limit = approx_distance(i64::from(dx), i64::from(dy)) as u32 + 1;
        prop_assert!(report.coarse_steps <= limit);
        prop_assert_eq!(report.iterations, report.coarse_steps + 1);
    }

    #[test]
    fn moves_stay_small(
        seed in any::<u32>(),
        dx in -2_000i16..=2_000,
        dy in -2_000i16..=2_000,
    ) {
        let run = run_precise(seed, dx, dy, 200_000);
        // unit steps, plus the occasional truncation fix-up
        let unit_sized = run.events.iter().all(|e| match *e {
            Event::Move(x, y) => x.abs() <= 1 && y.abs() <= 1,
            Event::Sleep(_) => true,
        });
        prop_assert!(unit_sized);
        prop_assert!(run.moves() >= dx.unsigned_abs().max(dy.unsigned_abs()) as usize);
    }
}
