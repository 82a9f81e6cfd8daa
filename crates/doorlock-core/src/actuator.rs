//! Door actuator commands and the three-phase open/close timeline.
//!
//! ```text
//!  0s            15s        18s              33s
//!  ├── Extend ───┼── Hold ──┼──── Retract ───┼── Done
//!  forward 50%     stop       reverse 50%      stop
//! ```
//!
//! Phase changes are driven purely by elapsed-second comparisons. There is
//! no feedback sensor: "door open" is a timing assumption, and each drive
//! command is fire-and-forget.

use crate::timing::{Deadline, TimelineConfig};

/// Motor direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Opening direction.
    Forward,
    /// Closing direction.
    Reverse,
    /// Motor off.
    Stop,
}

/// PWM duty cycle in percent, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DutyCycle(u8);

impl DutyCycle {
    /// Zero duty.
    pub const ZERO: Self = Self(0);

    /// Duty cycle clamped to 100 %.
    pub const fn new(percent: u8) -> Self {
        if percent > 100 { Self(100) } else { Self(percent) }
    }

    /// Value in percent.
    pub const fn percent(self) -> u8 {
        self.0
    }
}

/// One command to the actuator, held until the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriveCommand {
    /// Direction to drive.
    pub direction: Direction,
    /// Duty cycle.
    pub duty: DutyCycle,
}

impl DriveCommand {
    /// Motor off.
    pub const STOP: Self = Self { direction: Direction::Stop, duty: DutyCycle::ZERO };

    /// Drive `direction` at `duty`.
    pub const fn new(direction: Direction, duty: DutyCycle) -> Self {
        Self { direction, duty }
    }
}

/// Phase of the door timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimelinePhase {
    /// Unlocking: driving forward.
    Extend,
    /// Door open: motor stopped.
    Hold,
    /// Locking: driving in reverse.
    Retract,
    /// Sequence finished, motor stopped.
    Done,
}

/// A phase boundary crossed by [`ActuatorTimeline::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    /// Phase entered.
    pub phase: TimelinePhase,
    /// Command to issue on entry.
    pub drive: DriveCommand,
}

/// Fixed extend/hold/retract sequence, measured from elapsed second zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorTimeline {
    phase: TimelinePhase,
    config: TimelineConfig,
}

impl ActuatorTimeline {
    /// Begin the sequence. The caller must reset the elapsed counter at the
    /// same time and issue the returned command.
    pub const fn start(config: TimelineConfig) -> (Self, DriveCommand) {
        let timeline = Self { phase: TimelinePhase::Extend, config };
        (timeline, DriveCommand::new(Direction::Forward, DutyCycle::new(config.duty_percent)))
    }

    /// Current phase.
    pub const fn phase(&self) -> TimelinePhase {
        self.phase
    }

    /// True once the final stop has been issued.
    pub const fn is_done(&self) -> bool {
        matches!(self.phase, TimelinePhase::Done)
    }

    /// Threshold that ends the current phase, `None` when done.
    pub const fn next_deadline(&self) -> Option<Deadline> {
        match self.phase {
            TimelinePhase::Extend => Some(Deadline::at(self.config.extend_until)),
            TimelinePhase::Hold => Some(Deadline::at(self.config.hold_until)),
            TimelinePhase::Retract => Some(Deadline::at(self.config.retract_until)),
            TimelinePhase::Done => None,
        }
    }

    /// Move through every phase boundary at or below `elapsed`.
    ///
    /// If several thresholds were crossed at once, every intermediate phase
    /// is still entered, in order, so no phase is skipped or repeated.
    pub fn advance(&mut self, elapsed: u32) -> Vec<PhaseChange> {
        let mut changes = Vec::new();

        while let Some(deadline) = self.next_deadline() {
            if !deadline.reached(elapsed) {
                break;
            }

            let duty = DutyCycle::new(self.config.duty_percent);
            let (phase, drive) = match self.phase {
                TimelinePhase::Extend => (TimelinePhase::Hold, DriveCommand::STOP),
                TimelinePhase::Hold => {
                    (TimelinePhase::Retract, DriveCommand::new(Direction::Reverse, duty))
                },
                TimelinePhase::Retract | TimelinePhase::Done => {
                    (TimelinePhase::Done, DriveCommand::STOP)
                },
            };

            self.phase = phase;
            changes.push(PhaseChange { phase, drive });
        }

        changes
    }
}
