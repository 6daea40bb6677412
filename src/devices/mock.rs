//! Mock device rig for hardware-free testing
//!
//! A [`MockRig`] simulates the coupled motor/encoder pair: mock motors
//! latch a commanded direction into shared state, and the mock encoder
//! advances each axis by a fixed number of ticks per read in the latched
//! direction. Since the controller reads the encoder exactly once per
//! control tick, "ticks per read" models motor travel per poll interval.

use crate::drivers::{
    CommandedDirection, DirectionIndicator, EncoderReading, EncoderSource, LimitSwitch,
    MotorDriver,
};
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex};

/// A motor command observed by a mock motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    Forward(u8),
    Reverse(u8),
    Stop,
}

#[derive(Debug, Default)]
struct AxisSim {
    position: i64,
    direction: i64,
    commands: Vec<MotorCommand>,
}

/// A motor command together with both rig positions at the moment it
/// was issued, for asserting ordering across the two axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEvent {
    pub slot: usize,
    pub command: MotorCommand,
    pub positions: [i64; 2],
}

#[derive(Debug)]
struct RigState {
    axes: [AxisSim; 2],
    ticks_per_read: i64,
    reads: usize,
    fail_reads_after: Option<usize>,
    log: Vec<CommandEvent>,
}

impl RigState {
    fn record(&mut self, slot: usize, command: MotorCommand) {
        self.axes[slot].commands.push(command);
        self.log.push(CommandEvent {
            slot,
            command,
            positions: [self.axes[SPINNER].position, self.axes[SLIDER].position],
        });
    }
}

/// Shared-state simulation of both axes
#[derive(Clone)]
pub struct MockRig {
    state: Arc<Mutex<RigState>>,
}

/// Axis slot indices into the rig: 0 = spinner, 1 = slider
pub const SPINNER: usize = 0;
/// Slider slot index
pub const SLIDER: usize = 1;

impl MockRig {
    /// Create a rig whose axes travel `ticks_per_read` ticks per encoder
    /// read while driven
    pub fn new(ticks_per_read: i64) -> Self {
        Self {
            state: Arc::new(Mutex::new(RigState {
                axes: [AxisSim::default(), AxisSim::default()],
                ticks_per_read,
                reads: 0,
                fail_reads_after: None,
                log: Vec::new(),
            })),
        }
    }

    /// Motor handle for one axis slot
    pub fn motor(&self, slot: usize) -> MockMotor {
        MockMotor {
            slot,
            state: Arc::clone(&self.state),
        }
    }

    /// Encoder handle (shared by both controllers)
    pub fn encoder(&self) -> MockEncoder {
        MockEncoder {
            state: Arc::clone(&self.state),
        }
    }

    /// Current simulated position of an axis
    pub fn position(&self, slot: usize) -> i64 {
        self.state.lock().unwrap().axes[slot].position
    }

    /// Force an axis position (e.g. to simulate a pre-homed machine)
    pub fn set_position(&self, slot: usize, position: i64) {
        self.state.lock().unwrap().axes[slot].position = position;
    }

    /// Commands issued to an axis motor so far, in order
    pub fn commands(&self, slot: usize) -> Vec<MotorCommand> {
        self.state.lock().unwrap().axes[slot].commands.clone()
    }

    /// Every motor command on either axis, in issue order, each tagged
    /// with the rig positions observed when it arrived
    pub fn command_log(&self) -> Vec<CommandEvent> {
        self.state.lock().unwrap().log.clone()
    }

    /// Make every encoder read after the nth fail
    pub fn fail_reads_after(&self, reads: usize) {
        self.state.lock().unwrap().fail_reads_after = Some(reads);
    }
}

/// Mock motor latching direction into the rig
pub struct MockMotor {
    slot: usize,
    state: Arc<Mutex<RigState>>,
}

impl MotorDriver for MockMotor {
    fn forward(&mut self, speed: u8) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.axes[self.slot].direction = 1;
        state.record(self.slot, MotorCommand::Forward(speed));
        Ok(())
    }

    fn reverse(&mut self, speed: u8) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.axes[self.slot].direction = -1;
        state.record(self.slot, MotorCommand::Reverse(speed));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.axes[self.slot].direction = 0;
        state.record(self.slot, MotorCommand::Stop);
        Ok(())
    }
}

/// Mock encoder advancing driven axes on every read
pub struct MockEncoder {
    state: Arc<Mutex<RigState>>,
}

impl EncoderSource for MockEncoder {
    fn read(&self) -> Result<EncoderReading> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        if let Some(limit) = state.fail_reads_after {
            if state.reads > limit {
                return Err(Error::EncoderRead("injected failure".to_string()));
            }
        }

        let step = state.ticks_per_read;
        for axis in &mut state.axes {
            axis.position += axis.direction * step;
        }

        Ok(EncoderReading {
            spinner: state.axes[SPINNER].position,
            slider: state.axes[SLIDER].position,
        })
    }
}

/// Limit switch that reports triggered only after a fixed number of polls
pub struct MockLimitSwitch {
    triggers_after: usize,
    polls: usize,
}

impl MockLimitSwitch {
    /// Switch that reads false for the first `triggers_after` polls
    pub fn new(triggers_after: usize) -> Self {
        Self {
            triggers_after,
            polls: 0,
        }
    }

    /// Number of polls seen so far
    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl LimitSwitch for MockLimitSwitch {
    fn is_triggered(&mut self) -> Result<bool> {
        self.polls += 1;
        Ok(self.polls > self.triggers_after)
    }
}

/// Switch whose reads always fail
pub struct BrokenLimitSwitch;

impl LimitSwitch for BrokenLimitSwitch {
    fn is_triggered(&mut self) -> Result<bool> {
        Err(Error::SwitchRead("injected failure".to_string()))
    }
}

/// Indicator recording the directions it was shown
#[derive(Clone, Default)]
pub struct MockIndicator {
    history: Arc<Mutex<Vec<CommandedDirection>>>,
}

impl MockIndicator {
    /// Create a fresh recording indicator
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently displayed direction
    pub fn current(&self) -> CommandedDirection {
        self.history
            .lock()
            .unwrap()
            .last()
            .copied()
            .unwrap_or_default()
    }

    /// All directions displayed, in order
    pub fn history(&self) -> Vec<CommandedDirection> {
        self.history.lock().unwrap().clone()
    }
}

impl DirectionIndicator for MockIndicator {
    fn set_direction(&mut self, direction: CommandedDirection) {
        self.history.lock().unwrap().push(direction);
    }
}
