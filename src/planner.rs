//! Path planning: polar waypoints to absolute tick targets
//!
//! Two planning modes are provided:
//!
//! - [`PathPlanner`] converts an ordered waypoint sequence into absolute
//!   encoder tick targets for closed-loop execution. Each waypoint delta is
//!   rounded to whole ticks independently while the running polar position
//!   is tracked exactly, so rounding error accumulates in tick space
//!   (about half a tick per waypoint) but never feeds back into the polar
//!   tracker. This is a known characteristic of the design.
//! - [`StepPlanner`] is a discrete greedy search over single-tick moves,
//!   for simulated open-loop planning without encoder feedback.

use crate::coords::{Cartesian, Polar};

/// Absolute tick targets for both axes
///
/// The only quantity the hardware layer understands: spinner ticks are
/// rotation, slider ticks are radial extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickTarget {
    /// Absolute spinner (rotation) axis tick count
    pub spinner_ticks: i64,
    /// Absolute slider (radius) axis tick count
    pub slider_ticks: i64,
}

impl TickTarget {
    /// Create a new tick target
    pub fn new(spinner_ticks: i64, slider_ticks: i64) -> Self {
        Self {
            spinner_ticks,
            slider_ticks,
        }
    }
}

/// An ordered, append-only sequence of tick targets
///
/// Built once by a planner, then read-only during execution.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    targets: Vec<TickTarget>,
}

impl Plan {
    /// Number of waypoints in the plan
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when the plan has no waypoints
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Iterate over the tick targets in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, TickTarget> {
        self.targets.iter()
    }

    /// Targets as a slice
    pub fn targets(&self) -> &[TickTarget] {
        &self.targets
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a TickTarget;
    type IntoIter = std::slice::Iter<'a, TickTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}

/// Converts polar waypoints into absolute tick targets
pub struct PathPlanner {
    /// Radians of spinner rotation per encoder tick
    angle_per_tick: f64,
    /// Millimeters of slider travel per encoder tick
    radius_per_tick: f64,
    /// Running polar position, tracked exactly (never rounded)
    position: Polar,
    /// Last appended absolute target
    last_target: TickTarget,
    plan: Plan,
}

impl PathPlanner {
    /// Create a planner from calibration constants and a starting state
    ///
    /// # Arguments
    /// * `angle_per_tick` - radians per spinner tick
    /// * `radius_per_tick` - millimeters per slider tick
    /// * `initial_position` - polar position the machine currently holds
    /// * `baseline` - absolute tick counts corresponding to that position
    pub fn new(
        angle_per_tick: f64,
        radius_per_tick: f64,
        initial_position: Polar,
        baseline: TickTarget,
    ) -> Self {
        log::debug!(
            "PathPlanner: Initialized at (r={:.3}mm, theta={:.4}rad), baseline=({}, {})",
            initial_position.r,
            initial_position.theta,
            baseline.spinner_ticks,
            baseline.slider_ticks
        );

        Self {
            angle_per_tick,
            radius_per_tick,
            position: initial_position,
            last_target: baseline,
            plan: Plan::default(),
        }
    }

    /// Append a waypoint, producing one absolute tick target
    ///
    /// The angular delta is taken as a plain difference with no branch-cut
    /// correction: a path crossing the +/-pi seam produces the long-way
    /// tick jump. Carried forward from the original machine on purpose.
    pub fn append_waypoint(&mut self, target: Polar) {
        let delta_theta = target.theta - self.position.theta;
        let delta_r = target.r - self.position.r;

        let spinner_delta = (delta_theta / self.angle_per_tick).round() as i64;
        let slider_delta = (delta_r / self.radius_per_tick).round() as i64;

        let next = TickTarget::new(
            self.last_target.spinner_ticks + spinner_delta,
            self.last_target.slider_ticks + slider_delta,
        );

        log::debug!(
            "PathPlanner: Waypoint (r={:.3}, theta={:.4}) -> delta=({}, {}), target=({}, {})",
            target.r,
            target.theta,
            spinner_delta,
            slider_delta,
            next.spinner_ticks,
            next.slider_ticks
        );

        self.plan.targets.push(next);
        self.last_target = next;
        // Track the exact requested position, not the rounded tick-derived
        // one, so per-waypoint rounding does not propagate.
        self.position = target;
    }

    /// Polar position after all appended waypoints
    pub fn position(&self) -> Polar {
        self.position
    }

    /// Borrow the plan built so far
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Consume the planner, yielding the finished plan
    pub fn into_plan(self) -> Plan {
        log::info!("PathPlanner: Plan finished with {} waypoints", self.plan.len());
        self.plan
    }
}

/// A single-tick move on both axes, each component in {-1, 0, +1}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineStep {
    pub spinner_step: i8,
    pub slider_step: i8,
}

impl MachineStep {
    /// True when neither axis moves
    pub fn is_neutral(&self) -> bool {
        self.spinner_step == 0 && self.slider_step == 0
    }
}

/// Greedy discrete planner over single-tick moves
///
/// At each iteration the nine {-1, 0, +1}^2 candidates are scored by
/// cartesian distance to the target and the minimizer is taken; the search
/// stops when the no-move candidate wins. The search is local: it can
/// stall one grid cell short of the target when the target sits on a
/// boundary between discrete positions. Accepted behavior.
pub struct StepPlanner {
    angle_per_tick: f64,
    radius_per_tick: f64,
    position: Polar,
    program: Vec<MachineStep>,
}

impl StepPlanner {
    /// Create a step planner at the given starting position
    pub fn new(angle_per_tick: f64, radius_per_tick: f64, initial_position: Polar) -> Self {
        Self {
            angle_per_tick,
            radius_per_tick,
            position: initial_position,
            program: Vec::new(),
        }
    }

    /// The nine neighbor positions reachable in one step, with the step
    /// that produces each (includes the neutral step)
    fn neighbors(&self) -> impl Iterator<Item = (Polar, MachineStep)> + '_ {
        const OPTIONS: [i8; 3] = [-1, 0, 1];
        OPTIONS.iter().flat_map(move |&slider_step| {
            OPTIONS.iter().map(move |&spinner_step| {
                let candidate = Polar::new(
                    self.position.r + f64::from(slider_step) * self.radius_per_tick,
                    self.position.theta + f64::from(spinner_step) * self.angle_per_tick,
                );
                (
                    candidate,
                    MachineStep {
                        spinner_step,
                        slider_step,
                    },
                )
            })
        })
    }

    /// Walk greedily toward `target`, appending steps to the program
    pub fn goto_polar(&mut self, target: Polar) {
        let target_cart = target.to_cartesian();

        loop {
            let best = self
                .neighbors()
                .min_by(|a, b| {
                    let da = (target_cart - a.0.to_cartesian()).magnitude();
                    let db = (target_cart - b.0.to_cartesian()).magnitude();
                    da.total_cmp(&db)
                })
                .expect("neighbor set is never empty");

            if best.1.is_neutral() {
                break;
            }

            self.position = best.0;
            self.program.push(best.1);
        }

        log::debug!(
            "StepPlanner: goto (r={:.3}, theta={:.4}) complete, program length {}",
            target.r,
            target.theta,
            self.program.len()
        );
    }

    /// Position the program ends at
    pub fn position(&self) -> Polar {
        self.position
    }

    /// The accumulated step program
    pub fn program(&self) -> &[MachineStep] {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_3, PI, TAU};

    fn test_planner() -> PathPlanner {
        // 1000 ticks per revolution, 0.01mm per slider tick
        PathPlanner::new(
            TAU / 1000.0,
            0.01,
            Polar::new(5.0, 0.0),
            TickTarget::default(),
        )
    }

    #[test]
    fn test_zero_delta_appends_identical_target() {
        let mut planner = test_planner();
        planner.append_waypoint(Polar::new(5.0, 1.0));
        let first = *planner.plan().targets().last().unwrap();
        planner.append_waypoint(Polar::new(5.0, 1.0));
        let second = *planner.plan().targets().last().unwrap();
        assert_eq!(first, second);
        assert_eq!(planner.plan().len(), 2);
    }

    #[test]
    fn test_hexagon_edge_scenario() {
        // Sixth of a revolution at 1000 ticks/rev rounds to 167 ticks
        let mut planner = test_planner();
        planner.append_waypoint(Polar::new(5.0, 0.0));
        planner.append_waypoint(Polar::new(5.0, FRAC_PI_3));

        let targets = planner.plan().targets();
        assert_eq!(targets[0], TickTarget::new(0, 0));
        assert_eq!(targets[1], TickTarget::new(167, 0));
    }

    #[test]
    fn test_exact_polar_tracking_decoupled_from_rounding() {
        let mut planner = test_planner();
        // 0.3 of a tick per waypoint: every delta rounds to zero ticks,
        // but the polar tracker still advances exactly.
        let per_waypoint = 0.3 * (TAU / 1000.0);
        for i in 1..=10 {
            planner.append_waypoint(Polar::new(5.0, per_waypoint * i as f64));
        }
        let last = *planner.plan().targets().last().unwrap();
        assert_eq!(last, TickTarget::new(0, 0));
        assert_relative_eq!(planner.position().theta, per_waypoint * 10.0);
    }

    #[test]
    fn test_branch_cut_jump_is_not_corrected() {
        // Crossing the +/-pi seam the short way is ~0.28 rad, but the
        // planner takes the raw difference (~ -6 rad): nearly a full
        // revolution the long way. The original machine behaves this way
        // and we keep it.
        let mut planner = PathPlanner::new(
            TAU / 1000.0,
            0.01,
            Polar::new(5.0, 3.0),
            TickTarget::default(),
        );
        planner.append_waypoint(Polar::new(5.0, -3.0));
        let target = planner.plan().targets()[0];
        let expected = ((-6.0) / (TAU / 1000.0)).round() as i64;
        assert_eq!(target.spinner_ticks, expected);
        assert!(target.spinner_ticks < -900);
    }

    #[test]
    fn test_baseline_offsets_absolute_targets() {
        let mut planner = PathPlanner::new(
            TAU / 1000.0,
            0.01,
            Polar::new(5.0, 0.0),
            TickTarget::new(500, -20),
        );
        planner.append_waypoint(Polar::new(5.1, 0.0));
        assert_eq!(planner.plan().targets()[0], TickTarget::new(500, -10));
    }

    #[test]
    fn test_greedy_search_reaches_target() {
        let angle_per_tick = TAU / 5760.0;
        let radius_per_tick = 495.0 / 640.0;
        let mut planner =
            StepPlanner::new(angle_per_tick, radius_per_tick, Polar::new(5.0, 0.0));

        let target = Polar::new(250.0, PI / 4.0);
        planner.goto_polar(target);

        assert!(!planner.program().is_empty());
        // Greedy search stops within one grid cell of the target
        let final_cart = planner.position().to_cartesian();
        let err = (target.to_cartesian() - final_cart).magnitude();
        let cell = radius_per_tick.max(250.0 * angle_per_tick);
        assert!(err <= 2.0 * cell, "residual error {:.3}mm", err);
    }

    #[test]
    fn test_greedy_search_at_target_is_empty() {
        let mut planner = StepPlanner::new(TAU / 5760.0, 495.0 / 640.0, Polar::new(5.0, 0.0));
        planner.goto_polar(Polar::new(5.0, 0.0));
        assert!(planner.program().is_empty());
    }

    #[test]
    fn test_greedy_steps_are_unit_moves() {
        let mut planner = StepPlanner::new(TAU / 5760.0, 495.0 / 640.0, Polar::new(5.0, 0.0));
        planner.goto_polar(Polar::new(50.0, 0.5));
        for step in planner.program() {
            assert!((-1..=1).contains(&step.spinner_step));
            assert!((-1..=1).contains(&step.slider_step));
            assert!(!step.is_neutral());
        }
    }
}
