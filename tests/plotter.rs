//! End-to-end plotter tests on the mock rig
//!
//! Drives the full stack - homing, planning, closed-loop execution -
//! against the shared-state mock devices, without hardware. Verifies:
//! - a homed machine executes a multi-waypoint plan to completion
//! - waypoints are strictly sequential (positions settle per target)
//! - an encoder fault mid-traversal stops both motors and propagates
//! - the demo hexagon path reproduces the branch-cut long-way rotation
//!
//! Run with: `cargo test --test plotter`

use std::f64::consts::{FRAC_PI_3, TAU};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use yantra_motion::config::AppConfig;
use yantra_motion::coords::{Cartesian, Polar};
use yantra_motion::devices::mock::{
    MockIndicator, MockLimitSwitch, MockRig, MotorCommand, SLIDER, SPINNER,
};
use yantra_motion::drivers::{Axis, EncoderSource};
use yantra_motion::error::Error;
use yantra_motion::motion::{AxisController, HomingSequence, MotionExecutor};
use yantra_motion::planner::{PathPlanner, TickTarget};

const TOLERANCE: u32 = 8;
const SPEED: u8 = 26;

fn controller(rig: &MockRig, axis: Axis, slot: usize) -> AxisController {
    AxisController::new(
        axis,
        Box::new(rig.motor(slot)),
        Arc::new(rig.encoder()) as Arc<dyn EncoderSource>,
        Box::new(MockIndicator::new()),
        SPEED,
        TOLERANCE,
        Duration::ZERO,
    )
    .unwrap()
}

fn test_planner(start: Polar) -> PathPlanner {
    // 1000 ticks per rotation, 0.01mm per slider tick
    PathPlanner::new(TAU / 1000.0, 0.01, start, TickTarget::default())
}

#[test]
fn homed_machine_executes_plan() {
    let rig = MockRig::new(5);
    let mut spinner = controller(&rig, Axis::Spinner, SPINNER);
    let mut slider = controller(&rig, Axis::Slider, SLIDER);

    // Home the slider against a switch that triggers after a few polls,
    // then zero the spinner in place.
    let homing = HomingSequence::new(SPEED, Duration::ZERO).unwrap();
    let mut switch = MockLimitSwitch::new(3);
    homing
        .run(&mut slider, &mut switch, &AtomicBool::new(false))
        .unwrap();
    spinner.home_in_place().unwrap();

    let mut planner = test_planner(Polar::new(5.0, 0.0));
    planner.append_waypoint(Polar::new(6.0, 0.5));
    planner.append_waypoint(Polar::new(6.0, 1.0));
    planner.append_waypoint(Polar::new(5.5, 0.75));
    let plan = planner.into_plan();
    let last = *plan.targets().last().unwrap();

    let shutdown = AtomicBool::new(false);
    let mut executor = MotionExecutor::new(spinner, slider);
    executor.execute(&plan, &shutdown).unwrap();

    assert!(
        (rig.position(SPINNER) - last.spinner_ticks).abs() <= i64::from(TOLERANCE),
        "spinner at {} vs target {}",
        rig.position(SPINNER),
        last.spinner_ticks
    );
    assert!(
        (rig.position(SLIDER) - last.slider_ticks).abs() <= i64::from(TOLERANCE),
        "slider at {} vs target {}",
        rig.position(SLIDER),
        last.slider_ticks
    );

    // Both motors end stopped
    assert_eq!(rig.commands(SPINNER).last(), Some(&MotorCommand::Stop));
    assert_eq!(rig.commands(SLIDER).last(), Some(&MotorCommand::Stop));
}

#[test]
fn zero_delta_waypoint_settles_without_driving() {
    let rig = MockRig::new(5);
    let spinner = controller(&rig, Axis::Spinner, SPINNER);
    let slider = controller(&rig, Axis::Slider, SLIDER);

    // Two identical waypoints: the second produces an identical target,
    // which both axes settle on without a single motor command.
    let mut planner = test_planner(Polar::new(5.0, 0.0));
    planner.append_waypoint(Polar::new(5.0, 0.0));
    planner.append_waypoint(Polar::new(5.0, 0.0));
    let plan = planner.into_plan();
    assert_eq!(plan.targets()[0], plan.targets()[1]);

    let shutdown = AtomicBool::new(false);
    let mut executor = MotionExecutor::new(spinner, slider);
    executor.execute(&plan, &shutdown).unwrap();

    assert!(rig.commands(SPINNER).is_empty());
    assert!(rig.commands(SLIDER).is_empty());
}

#[test]
fn waypoints_run_strictly_in_sequence() {
    let rig = MockRig::new(5);
    let spinner = controller(&rig, Axis::Spinner, SPINNER);
    let slider = controller(&rig, Axis::Slider, SLIDER);

    // Two waypoints that move both axes, the second reversing both.
    let mut planner = test_planner(Polar::new(5.0, 0.0));
    planner.append_waypoint(Polar::new(6.0, 0.8));
    planner.append_waypoint(Polar::new(5.2, 0.3));
    let plan = planner.into_plan();
    let first = plan.targets()[0];

    let shutdown = AtomicBool::new(false);
    let mut executor = MotionExecutor::new(spinner, slider);
    executor.execute(&plan, &shutdown).unwrap();

    let log = rig.command_log();
    let first_stop = |slot: usize| {
        log.iter()
            .position(|e| e.slot == slot && e.command == MotorCommand::Stop)
            .expect("axis never stopped")
    };
    let spinner_stop = first_stop(SPINNER);
    let slider_stop = first_stop(SLIDER);
    let barrier = spinner_stop.max(slider_stop);

    // When the later of the two first-waypoint stops lands, both axes
    // already sit within tolerance of the first target.
    let at_barrier = log[barrier].positions;
    assert!(
        (at_barrier[SPINNER] - first.spinner_ticks).abs() <= i64::from(TOLERANCE),
        "spinner at {} vs first target {}",
        at_barrier[SPINNER],
        first.spinner_ticks
    );
    assert!(
        (at_barrier[SLIDER] - first.slider_ticks).abs() <= i64::from(TOLERANCE),
        "slider at {} vs first target {}",
        at_barrier[SLIDER],
        first.slider_ticks
    );

    // An axis that has stopped for the first waypoint issues nothing more
    // until its peer has stopped too: every second-waypoint command comes
    // after the barrier.
    for (slot, stop) in [(SPINNER, spinner_stop), (SLIDER, slider_stop)] {
        let next = log[stop + 1..].iter().position(|e| e.slot == slot);
        if let Some(offset) = next {
            assert!(
                stop + 1 + offset > barrier,
                "slot {} drove again at log index {} before the barrier at {}",
                slot,
                stop + 1 + offset,
                barrier
            );
        }
    }
}

#[test]
fn encoder_fault_stops_both_motors_and_propagates() {
    let rig = MockRig::new(5);
    let spinner = controller(&rig, Axis::Spinner, SPINNER);
    let slider = controller(&rig, Axis::Slider, SLIDER);

    let mut planner = test_planner(Polar::new(5.0, 0.0));
    planner.append_waypoint(Polar::new(10.0, 2.0));
    let plan = planner.into_plan();

    rig.fail_reads_after(10);

    let shutdown = AtomicBool::new(false);
    let mut executor = MotionExecutor::new(spinner, slider);
    let result = executor.execute(&plan, &shutdown);

    assert!(
        matches!(result, Err(Error::EncoderRead(_))),
        "expected encoder error, got {:?}",
        result
    );
    assert_eq!(rig.commands(SPINNER).last(), Some(&MotorCommand::Stop));
    assert_eq!(rig.commands(SLIDER).last(), Some(&MotorCommand::Stop));
}

#[test]
fn hexagon_path_includes_branch_cut_long_way() {
    // The demo path from the original machine: extend to half radius,
    // then six cmul rotations of pi/3. Crossing the +/-pi seam produces
    // one long-way spinner move of nearly a full rotation.
    let config = AppConfig::plotter_defaults();
    let calibration = &config.calibration;

    let start = Cartesian::new(calibration.radius_min_mm, 0.0).to_polar();
    let mut planner = PathPlanner::new(
        calibration.angle_per_tick(),
        calibration.radius_per_tick(),
        start,
        TickTarget::default(),
    );

    let extended = Cartesian::new(calibration.radius_max_mm / 2.0, 0.0).to_polar();
    planner.append_waypoint(extended);

    let delta = Polar::new(1.0, FRAC_PI_3);
    let mut position = extended;
    for _ in 0..6 {
        position = position.cmul(delta);
        planner.append_waypoint(position);
    }
    let plan = planner.into_plan();
    assert_eq!(plan.len(), 7);

    // Per-waypoint spinner deltas: six edges of a hexagon are pi/3 each
    // (960 ticks at 5760/rev), except the one edge crossing the +/-pi
    // seam, which the planner takes the long way: -5*pi/3 = -4800 ticks.
    let spinner_deltas: Vec<i64> = plan
        .targets()
        .windows(2)
        .map(|pair| pair[1].spinner_ticks - pair[0].spinner_ticks)
        .collect();
    assert_eq!(spinner_deltas.len(), 6);
    assert_eq!(spinner_deltas.iter().filter(|&&d| d == 960).count(), 5);
    assert_eq!(spinner_deltas.iter().filter(|&&d| d == -4800).count(), 1);

    // The slider only moves on the initial extension
    assert_eq!(plan.targets()[0].slider_ticks, plan.targets()[6].slider_ticks);
}

#[test]
fn interrupted_execution_stops_motors() {
    let rig = MockRig::new(5);
    let spinner = controller(&rig, Axis::Spinner, SPINNER);
    let slider = controller(&rig, Axis::Slider, SLIDER);

    let mut planner = test_planner(Polar::new(5.0, 0.0));
    planner.append_waypoint(Polar::new(9.0, 1.5));
    let plan = planner.into_plan();

    let shutdown = AtomicBool::new(true);
    let mut executor = MotionExecutor::new(spinner, slider);
    let result = executor.execute(&plan, &shutdown);

    assert!(matches!(result, Err(Error::Interrupted)));
    assert_eq!(rig.commands(SPINNER).last(), Some(&MotorCommand::Stop));
    assert_eq!(rig.commands(SLIDER).last(), Some(&MotorCommand::Stop));
}

#[test]
fn dropping_controllers_stops_motors() {
    let rig = MockRig::new(5);
    {
        let mut spinner = controller(&rig, Axis::Spinner, SPINNER);
        spinner.set_target(500);
        spinner.poll().unwrap();
    }
    // The drop guard issued the final stop even though the motion was
    // abandoned mid-approach.
    assert_eq!(rig.commands(SPINNER).last(), Some(&MotorCommand::Stop));
}
