//! HMI node state machine.
//!
//! The HMI owns the keypad and the display and always initiates exchanges.
//!
//! # State Machine
//!
//! ```text
//! Connecting ─▶ CaptureNew ─▶ CaptureConfirm ─▶ AwaitVerdict
//!                   ▲                                │
//!                   └──────────── UNMATCHED ─────────┤
//!                                                    ▼ MATCHED
//!               ┌──────────────────────────────▶ MainMenu
//!               │                               │         │
//!               │                         '+'   ▼         ▼  '-'
//!               │                       OpeningDoor   ChangingPassword
//!               │   door cycle done          │              │ MATCHED
//!               ├────────────────────────────┘              ▼
//!               │                                       CaptureNew
//!               │      3rd mismatch
//!             Lockout ◀──────────── (either sub-flow)
//! ```
//!
//! Each sub-flow captures a password, offers it to Control, receives the
//! verdict and then always sends its action code, whatever the verdict was.
//! A mismatch below the threshold re-prompts the same sub-flow.

mod input;
mod screen;

use std::collections::VecDeque;

use doorlock_proto::{Command, DoorAction, PASSWORD_LEN, Password, Verdict};
pub use input::Key;
pub use screen::Screen;

use crate::{
    actuator::{ActuatorTimeline, TimelinePhase},
    error::MachineError,
    exchange::{self, IntakeStep, Offer, Outbound, VerdictIntake},
    lockout::{FailureCounter, FailureOutcome},
    timing::{Deadline, Timing},
};

/// Events consumed by [`HmiMachine::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmiEvent {
    /// Power-on: announce readiness to Control.
    Start,
    /// A key was pressed.
    Key(Key),
    /// A byte arrived from Control.
    Byte(u8),
    /// The elapsed-seconds counter advanced.
    Tick {
        /// Seconds since the last reset.
        elapsed: u32,
    },
}

/// Effects requested from the runtime, to be executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmiAction {
    /// Transmit to Control.
    Send(Outbound),
    /// Replace the display contents.
    Show(Screen),
    /// Append one `*` to the second display line.
    EchoMask,
    /// Restart the elapsed-seconds counter from zero.
    ResetElapsed,
}

/// Externally observable phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HmiPhase {
    /// Waiting for the readiness exchange.
    Connecting,
    /// Capturing or sending a new password.
    CaptureNew,
    /// Capturing or sending its confirmation.
    CaptureConfirm,
    /// Waiting for the enrollment verdict.
    AwaitVerdict,
    /// Showing the menu.
    MainMenu,
    /// Open-door sub-flow, door cycle included.
    OpeningDoor,
    /// Change-password sub-flow.
    ChangingPassword,
    /// Locked out after too many mismatches.
    Lockout,
}

/// Why a password is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Enroll,
    Confirm,
    Verify(DoorAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Capture {
    digits: [u8; PASSWORD_LEN],
    len: usize,
}

impl Capture {
    const fn is_full(&self) -> bool {
        self.len == PASSWORD_LEN
    }

    fn push(&mut self, digit: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.digits[self.len] = digit;
        self.len += 1;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    AwaitReady,
    Capturing { purpose: Purpose, capture: Capture },
    Offering { purpose: Purpose, offer: Offer<Password> },
    AwaitingVerdict { purpose: Purpose, intake: VerdictIntake },
    Menu,
    DoorCycle { timeline: ActuatorTimeline },
    LockedOut { until: Deadline },
}

impl State {
    const fn consumes_bytes(&self) -> bool {
        matches!(self, Self::AwaitReady | Self::Offering { .. } | Self::AwaitingVerdict { .. })
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitReady => "awaiting ready",
            Self::Capturing { .. } => "capturing",
            Self::Offering { .. } => "offering",
            Self::AwaitingVerdict { .. } => "awaiting verdict",
            Self::Menu => "menu",
            Self::DoorCycle { .. } => "door cycle",
            Self::LockedOut { .. } => "locked out",
        }
    }
}

/// HMI node state machine.
///
/// Pure: returns actions, the caller handles I/O.
#[derive(Debug, Clone)]
pub struct HmiMachine {
    state: State,
    failures: FailureCounter,
    timing: Timing,
    inbox: VecDeque<u8>,
}

impl Default for HmiMachine {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

impl HmiMachine {
    /// Machine before [`HmiEvent::Start`].
    pub fn new(timing: Timing) -> Self {
        Self {
            state: State::Idle,
            failures: FailureCounter::new(timing.failure_threshold),
            timing,
            inbox: VecDeque::new(),
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> HmiPhase {
        match &self.state {
            State::Idle | State::AwaitReady => HmiPhase::Connecting,
            State::Capturing { purpose, .. } | State::Offering { purpose, .. } => match purpose {
                Purpose::Enroll => HmiPhase::CaptureNew,
                Purpose::Confirm => HmiPhase::CaptureConfirm,
                Purpose::Verify(action) => Self::sub_flow_phase(*action),
            },
            State::AwaitingVerdict { purpose, .. } => match purpose {
                Purpose::Enroll | Purpose::Confirm => HmiPhase::AwaitVerdict,
                Purpose::Verify(action) => Self::sub_flow_phase(*action),
            },
            State::Menu => HmiPhase::MainMenu,
            State::DoorCycle { .. } => HmiPhase::OpeningDoor,
            State::LockedOut { .. } => HmiPhase::Lockout,
        }
    }

    const fn sub_flow_phase(action: DoorAction) -> HmiPhase {
        match action {
            DoorAction::OpenDoor => HmiPhase::OpeningDoor,
            DoorAction::ChangePassword => HmiPhase::ChangingPassword,
        }
    }

    /// Consecutive verification failures seen by this node.
    pub const fn failures(&self) -> u8 {
        self.failures.failures()
    }

    /// Bytes received but not yet consumed.
    pub fn queued_bytes(&self) -> usize {
        self.inbox.len()
    }

    /// Process an event and return the resulting actions.
    ///
    /// # Errors
    ///
    /// Returns `MachineError::InvalidState` for a second `Start`.
    pub fn handle(&mut self, event: HmiEvent) -> Result<Vec<HmiAction>, MachineError> {
        let mut actions = Vec::new();

        match event {
            HmiEvent::Start => self.handle_start(&mut actions)?,
            HmiEvent::Key(key) => self.handle_key(key, &mut actions),
            HmiEvent::Byte(byte) => self.inbox.push_back(byte),
            HmiEvent::Tick { elapsed } => self.handle_tick(elapsed, &mut actions),
        }

        self.drain_inbox(&mut actions);
        Ok(actions)
    }

    fn handle_start(&mut self, actions: &mut Vec<HmiAction>) -> Result<(), MachineError> {
        if self.state != State::Idle {
            return Err(MachineError::InvalidState { phase: self.state.name(), event: "start" });
        }
        actions.push(HmiAction::Send(Outbound::Command(Command::Ready)));
        self.transition(State::AwaitReady);
        Ok(())
    }

    fn handle_key(&mut self, key: Key, actions: &mut Vec<HmiAction>) {
        match &mut self.state {
            State::Capturing { purpose, capture } => match key {
                Key::Digit(digit) => {
                    if capture.push(digit) {
                        actions.push(HmiAction::EchoMask);
                    }
                },
                Key::Enter if capture.is_full() => {
                    let purpose = *purpose;
                    match Password::new(capture.digits) {
                        Ok(password) => {
                            let (offer, announce) = Offer::start(password);
                            actions.push(HmiAction::Send(announce));
                            self.transition(State::Offering { purpose, offer });
                        },
                        Err(error) => {
                            tracing::warn!(%error, "discarding captured password");
                            *capture = Capture::default();
                        },
                    }
                },
                _ => tracing::trace!(key = %key.as_char(), "ignored key while capturing"),
            },
            State::Menu => match key {
                Key::Open => self.begin_sub_flow(DoorAction::OpenDoor, actions),
                Key::Change => self.begin_sub_flow(DoorAction::ChangePassword, actions),
                _ => tracing::trace!(key = %key.as_char(), "ignored key in menu"),
            },
            state => {
                tracing::trace!(state = state.name(), key = %key.as_char(), "ignored key");
            },
        }
    }

    fn handle_tick(&mut self, elapsed: u32, actions: &mut Vec<HmiAction>) {
        match &mut self.state {
            State::DoorCycle { timeline } => {
                for change in timeline.advance(elapsed) {
                    match change.phase {
                        TimelinePhase::Extend => {},
                        TimelinePhase::Hold => actions.push(HmiAction::Show(Screen::DoorOpened)),
                        TimelinePhase::Retract => {
                            actions.push(HmiAction::Show(Screen::DoorLocking));
                        },
                        TimelinePhase::Done => {
                            tracing::info!("door cycle finished");
                            self.enter_menu(actions);
                            return;
                        },
                    }
                }
            },
            State::LockedOut { until } => {
                if until.reached(elapsed) {
                    tracing::info!(elapsed, "lockout finished");
                    self.enter_menu(actions);
                }
            },
            _ => {},
        }
    }

    fn drain_inbox(&mut self, actions: &mut Vec<HmiAction>) {
        while self.state.consumes_bytes() {
            let Some(byte) = self.inbox.pop_front() else {
                break;
            };
            self.handle_byte(byte, actions);
        }
    }

    fn handle_byte(&mut self, byte: u8, actions: &mut Vec<HmiAction>) {
        match &mut self.state {
            State::AwaitReady => {
                if exchange::expect(Command::Ready, byte, "hmi ready") {
                    tracing::info!("control node ready");
                    self.begin_capture(Purpose::Enroll, actions);
                }
            },
            State::Offering { purpose, offer } => {
                let purpose = *purpose;
                let Some(password) = offer.on_byte(byte) else {
                    return;
                };
                actions.push(HmiAction::Send(Outbound::Password(password)));
                match purpose {
                    Purpose::Enroll => self.begin_capture(Purpose::Confirm, actions),
                    Purpose::Confirm | Purpose::Verify(_) => {
                        self.transition(State::AwaitingVerdict {
                            purpose,
                            intake: VerdictIntake::new(),
                        });
                    },
                }
            },
            State::AwaitingVerdict { purpose, intake } => {
                let purpose = *purpose;
                match intake.on_byte(byte) {
                    IntakeStep::Pending => {},
                    IntakeStep::Reply(reply) => actions.push(HmiAction::Send(reply)),
                    IntakeStep::Complete(raw) => {
                        let verdict = Verdict::from_byte(raw).unwrap_or_else(|| {
                            tracing::warn!(byte = raw, "unknown verdict byte, treating as mismatch");
                            Verdict::Unmatched
                        });
                        self.on_verdict(purpose, verdict, actions);
                    },
                }
            },
            state => {
                tracing::debug!(state = state.name(), byte, "byte outside exchange");
            },
        }
    }

    fn on_verdict(&mut self, purpose: Purpose, verdict: Verdict, actions: &mut Vec<HmiAction>) {
        match purpose {
            Purpose::Enroll | Purpose::Confirm => {
                tracing::info!(%verdict, "enrollment verdict");
                if verdict.is_match() {
                    self.enter_menu(actions);
                } else {
                    actions.push(HmiAction::Show(Screen::NotMatched));
                    self.begin_capture(Purpose::Enroll, actions);
                }
            },
            Purpose::Verify(action) => {
                actions.push(HmiAction::Send(Outbound::Command(action.command())));
                tracing::info!(%verdict, ?action, "verification verdict");

                match self.failures.record(verdict) {
                    FailureOutcome::Cleared => match action {
                        DoorAction::OpenDoor => {
                            let (timeline, _) = ActuatorTimeline::start(self.timing.timeline);
                            actions.push(HmiAction::ResetElapsed);
                            actions.push(HmiAction::Show(Screen::DoorUnlocking));
                            self.transition(State::DoorCycle { timeline });
                        },
                        DoorAction::ChangePassword => {
                            actions.push(HmiAction::Show(Screen::PasswordChanged));
                            self.begin_capture(Purpose::Enroll, actions);
                        },
                    },
                    FailureOutcome::Retry { failures } => {
                        actions.push(HmiAction::Show(Screen::WrongPassword { failures }));
                        self.begin_capture(Purpose::Verify(action), actions);
                    },
                    FailureOutcome::Exhausted => {
                        self.failures.engage_lockout();
                        tracing::info!(lockout_secs = self.timing.lockout_secs, "lockout engaged");
                        actions.push(HmiAction::ResetElapsed);
                        actions.push(HmiAction::Show(Screen::Error));
                        self.transition(State::LockedOut {
                            until: Deadline::at(self.timing.lockout_secs),
                        });
                    },
                }
            },
        }
    }

    fn begin_sub_flow(&mut self, action: DoorAction, actions: &mut Vec<HmiAction>) {
        tracing::debug!(?action, "menu selection");
        self.begin_capture(Purpose::Verify(action), actions);
    }

    fn begin_capture(&mut self, purpose: Purpose, actions: &mut Vec<HmiAction>) {
        let screen = match purpose {
            Purpose::Confirm => Screen::ReEnterPassword,
            Purpose::Enroll | Purpose::Verify(_) => Screen::EnterPassword,
        };
        actions.push(HmiAction::Show(screen));
        self.transition(State::Capturing { purpose, capture: Capture::default() });
    }

    fn enter_menu(&mut self, actions: &mut Vec<HmiAction>) {
        actions.push(HmiAction::Show(Screen::MainMenu));
        self.transition(State::Menu);
    }

    fn transition(&mut self, next: State) {
        tracing::debug!(from = self.state.name(), to = next.name(), "hmi transition");
        self.state = next;
    }
}
