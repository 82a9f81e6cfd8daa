//! Timing constants shared by both nodes.
//!
//! Nothing on the link carries these values. Both nodes compile in the same
//! defaults and rely on that agreement; a node built with different numbers
//! would silently drift from its peer.

/// Door timeline thresholds, in seconds from the start of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Drive forward until this many seconds have elapsed.
    pub extend_until: u32,
    /// Hold (stopped) until this many seconds have elapsed.
    pub hold_until: u32,
    /// Drive in reverse until this many seconds have elapsed.
    pub retract_until: u32,
    /// Duty cycle used for both drive phases, in percent.
    pub duty_percent: u8,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { extend_until: 15, hold_until: 18, retract_until: 33, duty_percent: 50 }
    }
}

/// All timing and threshold constants of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Consecutive mismatches that trigger a lockout.
    pub failure_threshold: u8,
    /// Lockout length in seconds.
    pub lockout_secs: u32,
    /// Door actuator timeline.
    pub timeline: TimelineConfig,
}

impl Default for Timing {
    fn default() -> Self {
        Self { failure_threshold: 3, lockout_secs: 60, timeline: TimelineConfig::default() }
    }
}

/// An elapsed-seconds threshold that a blocked phase waits for.
///
/// There is deliberately no cancel or timeout path: the phase ends only when
/// the counter reaches the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(u32);

impl Deadline {
    /// Deadline at `seconds` after the last counter reset.
    pub const fn at(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Threshold in seconds.
    pub const fn seconds(self) -> u32 {
        self.0
    }

    /// Predicate checked on every tick.
    pub const fn reached(self, elapsed: u32) -> bool {
        elapsed >= self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_firmware() {
        let timing = Timing::default();
        assert_eq!(timing.failure_threshold, 3);
        assert_eq!(timing.lockout_secs, 60);
        assert_eq!(timing.timeline.extend_until, 15);
        assert_eq!(timing.timeline.hold_until, 18);
        assert_eq!(timing.timeline.retract_until, 33);
        assert_eq!(timing.timeline.duty_percent, 50);
    }

    #[test]
    fn deadline_is_inclusive() {
        let deadline = Deadline::at(60);
        assert!(!deadline.reached(59));
        assert!(deadline.reached(60));
        assert!(deadline.reached(61));
    }
}
