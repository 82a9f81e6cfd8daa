//! Control node state machine.
//!
//! Control is the authoritative side: it compares passwords, owns the stored
//! credential, drives the door actuator and sounds the alarm. It never
//! initiates an exchange; every step is a reply to the HMI.
//!
//! # State Machine
//!
//! ```text
//! Connecting ─READY─▶ AwaitEnrollment ─two frames─▶ CompareNewPair
//!                           ▲   ▲                        │
//!                           │   └──────── UNMATCHED ─────┤
//!              CHANGE_PASS  │                            ▼ MATCHED (persisted)
//!                           │                   AwaitReVerification ◀──────┐
//!                           │                    │      │       │          │
//!                           └────────────────────┘      │       │          │
//!                                        OPEN_DOOR      ▼       ▼ 3rd miss │
//!                                                  Actuating  Lockout ─────┤
//!                                                       └──────────────────┘
//! ```
//!
//! Store access is split into a request action and a completion event: the
//! machine emits [`ControlAction::LoadCredential`] and waits for
//! [`ControlEvent::CredentialLoaded`]. Bytes that arrive meanwhile, or while
//! the door cycle or lockout runs, are queued and consumed in order once the
//! machine can read again.

use std::collections::VecDeque;

use doorlock_proto::{Command, CredentialRecord, DoorAction, Password, Verdict};

use crate::{
    actuator::{ActuatorTimeline, DriveCommand},
    error::MachineError,
    exchange::{self, IntakeStep, Offer, Outbound, PasswordIntake, Received},
    lockout::{FailureCounter, FailureOutcome},
    timing::{Deadline, Timing},
};

/// Events consumed by [`ControlMachine::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// A byte arrived from the HMI.
    Byte(u8),
    /// The elapsed-seconds counter advanced.
    Tick {
        /// Seconds since the last reset.
        elapsed: u32,
    },
    /// Completion of [`ControlAction::LoadCredential`].
    CredentialLoaded(CredentialRecord),
}

/// Effects requested from the runtime, to be executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Transmit to the HMI.
    Send(Outbound),
    /// Overwrite the stored credential. Must finish before the next action.
    PersistCredential(Password),
    /// Read the stored credential and feed it back as
    /// [`ControlEvent::CredentialLoaded`].
    LoadCredential,
    /// Restart the elapsed-seconds counter from zero.
    ResetElapsed,
    /// Command the door actuator.
    Drive(DriveCommand),
    /// Switch the alarm.
    Alarm(bool),
}

/// Externally observable phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPhase {
    /// Waiting for the readiness exchange.
    Connecting,
    /// Receiving a new password and its confirmation.
    AwaitEnrollment,
    /// Replying with the enrollment verdict.
    CompareNewPair,
    /// Checking a password against the stored credential.
    AwaitReVerification,
    /// Running the door timeline.
    Actuating,
    /// Alarm on, waiting out the lockout.
    Lockout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    AwaitPeer,
    Enrolling { first: Option<Received>, intake: PasswordIntake },
    ReplyingEnrollment { offer: Offer<Verdict> },
    Verifying { intake: PasswordIntake },
    LoadingCredential { candidate: Received },
    ReplyingVerification { offer: Offer<Verdict> },
    AwaitingAction,
    Actuating { timeline: ActuatorTimeline },
    LockedOut { until: Deadline },
}

impl State {
    const fn consumes_bytes(&self) -> bool {
        !matches!(
            self,
            Self::LoadingCredential { .. } | Self::Actuating { .. } | Self::LockedOut { .. }
        )
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::AwaitPeer => "awaiting peer",
            Self::Enrolling { .. } => "enrolling",
            Self::ReplyingEnrollment { .. } => "replying enrollment",
            Self::Verifying { .. } => "verifying",
            Self::LoadingCredential { .. } => "loading credential",
            Self::ReplyingVerification { .. } => "replying verification",
            Self::AwaitingAction => "awaiting action",
            Self::Actuating { .. } => "actuating",
            Self::LockedOut { .. } => "locked out",
        }
    }

    fn enrolling() -> Self {
        Self::Enrolling { first: None, intake: PasswordIntake::new() }
    }

    fn verifying() -> Self {
        Self::Verifying { intake: PasswordIntake::new() }
    }
}

/// Control node state machine.
///
/// Pure: returns actions, the caller handles I/O.
#[derive(Debug, Clone)]
pub struct ControlMachine {
    state: State,
    failures: FailureCounter,
    timing: Timing,
    inbox: VecDeque<u8>,
}

impl Default for ControlMachine {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

impl ControlMachine {
    /// Machine waiting for the HMI's `READY`.
    pub fn new(timing: Timing) -> Self {
        Self {
            state: State::AwaitPeer,
            failures: FailureCounter::new(timing.failure_threshold),
            timing,
            inbox: VecDeque::new(),
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> ControlPhase {
        match self.state {
            State::AwaitPeer => ControlPhase::Connecting,
            State::Enrolling { .. } => ControlPhase::AwaitEnrollment,
            State::ReplyingEnrollment { .. } => ControlPhase::CompareNewPair,
            State::Verifying { .. }
            | State::LoadingCredential { .. }
            | State::ReplyingVerification { .. }
            | State::AwaitingAction => ControlPhase::AwaitReVerification,
            State::Actuating { .. } => ControlPhase::Actuating,
            State::LockedOut { .. } => ControlPhase::Lockout,
        }
    }

    /// Consecutive verification failures seen by this node.
    pub const fn failures(&self) -> u8 {
        self.failures.failures()
    }

    /// True while a [`ControlAction::LoadCredential`] is outstanding.
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, State::LoadingCredential { .. })
    }

    /// Bytes received but not yet consumed.
    pub fn queued_bytes(&self) -> usize {
        self.inbox.len()
    }

    /// Process an event and return the resulting actions.
    ///
    /// # Errors
    ///
    /// Returns `MachineError::InvalidState` for a `CredentialLoaded` that
    /// was never requested.
    pub fn handle(&mut self, event: ControlEvent) -> Result<Vec<ControlAction>, MachineError> {
        let mut actions = Vec::new();

        match event {
            ControlEvent::Byte(byte) => self.inbox.push_back(byte),
            ControlEvent::Tick { elapsed } => self.handle_tick(elapsed, &mut actions),
            ControlEvent::CredentialLoaded(record) => {
                self.handle_credential(&record, &mut actions)?;
            },
        }

        self.drain_inbox(&mut actions);
        Ok(actions)
    }

    fn drain_inbox(&mut self, actions: &mut Vec<ControlAction>) {
        while self.state.consumes_bytes() {
            let Some(byte) = self.inbox.pop_front() else {
                break;
            };
            self.handle_byte(byte, actions);
        }
    }

    fn handle_byte(&mut self, byte: u8, actions: &mut Vec<ControlAction>) {
        match &mut self.state {
            State::AwaitPeer => {
                if exchange::expect(Command::Ready, byte, "control ready") {
                    tracing::info!("hmi node ready");
                    actions.push(ControlAction::Send(Outbound::Command(Command::Ready)));
                    self.transition(State::enrolling());
                }
            },
            State::Enrolling { first, intake } => match intake.on_byte(byte) {
                IntakeStep::Pending => {},
                IntakeStep::Reply(reply) => actions.push(ControlAction::Send(reply)),
                IntakeStep::Complete(received) => match first.take() {
                    None => *first = Some(received),
                    Some(new) => self.compare_new_pair(new, received, actions),
                },
            },
            State::ReplyingEnrollment { offer } => {
                let Some(verdict) = offer.on_byte(byte) else {
                    return;
                };
                actions.push(ControlAction::Send(verdict.into()));
                if verdict.is_match() {
                    self.transition(State::verifying());
                } else {
                    self.transition(State::enrolling());
                }
            },
            State::Verifying { intake } => match intake.on_byte(byte) {
                IntakeStep::Pending => {},
                IntakeStep::Reply(reply) => actions.push(ControlAction::Send(reply)),
                IntakeStep::Complete(candidate) => {
                    actions.push(ControlAction::LoadCredential);
                    self.transition(State::LoadingCredential { candidate });
                },
            },
            State::ReplyingVerification { offer } => {
                let Some(verdict) = offer.on_byte(byte) else {
                    return;
                };
                actions.push(ControlAction::Send(verdict.into()));
                self.after_verification(verdict, actions);
            },
            State::AwaitingAction => self.handle_action_byte(byte, actions),
            State::LoadingCredential { .. } | State::Actuating { .. } | State::LockedOut { .. } => {
                self.inbox.push_front(byte);
            },
        }
    }

    fn compare_new_pair(&mut self, new: Received, confirm: Received, actions: &mut Vec<ControlAction>) {
        let verdict = match (new, confirm) {
            (Received::Password(new), confirm) if confirm.matches(&new) => {
                actions.push(ControlAction::PersistCredential(new));
                Verdict::Matched
            },
            _ => Verdict::Unmatched,
        };
        tracing::info!(%verdict, "enrollment compared");

        let (offer, announce) = Offer::start(verdict);
        actions.push(ControlAction::Send(announce));
        self.transition(State::ReplyingEnrollment { offer });
    }

    fn handle_credential(
        &mut self,
        record: &CredentialRecord,
        actions: &mut Vec<ControlAction>,
    ) -> Result<(), MachineError> {
        let State::LoadingCredential { candidate } = &self.state else {
            return Err(MachineError::InvalidState {
                phase: self.state.name(),
                event: "credential loaded",
            });
        };

        let matched = match record.password() {
            Ok(stored) => candidate.matches(&stored),
            Err(error) => {
                tracing::warn!(%error, "stored credential unreadable");
                false
            },
        };
        let verdict = Verdict::from_match(matched);

        match self.failures.record(verdict) {
            FailureOutcome::Cleared => tracing::info!("verification passed"),
            FailureOutcome::Retry { failures } => tracing::info!(failures, "verification failed"),
            FailureOutcome::Exhausted => tracing::info!("verification failed, threshold reached"),
        }

        let (offer, announce) = Offer::start(verdict);
        actions.push(ControlAction::Send(announce));
        self.transition(State::ReplyingVerification { offer });
        Ok(())
    }

    fn after_verification(&mut self, verdict: Verdict, actions: &mut Vec<ControlAction>) {
        if verdict.is_match() {
            self.transition(State::AwaitingAction);
            return;
        }

        if self.failures.engage_lockout() {
            tracing::info!(lockout_secs = self.timing.lockout_secs, "lockout engaged");
            actions.push(ControlAction::ResetElapsed);
            actions.push(ControlAction::Alarm(true));
            self.transition(State::LockedOut { until: Deadline::at(self.timing.lockout_secs) });
        } else {
            self.transition(State::verifying());
        }
    }

    fn handle_action_byte(&mut self, byte: u8, actions: &mut Vec<ControlAction>) {
        self.failures.clear();

        match DoorAction::from_byte(byte) {
            Some(DoorAction::OpenDoor) => {
                tracing::info!("door cycle started");
                let (timeline, drive) = ActuatorTimeline::start(self.timing.timeline);
                actions.push(ControlAction::ResetElapsed);
                actions.push(ControlAction::Drive(drive));
                self.transition(State::Actuating { timeline });
            },
            Some(DoorAction::ChangePassword) => {
                tracing::info!("password change accepted");
                self.transition(State::enrolling());
            },
            None => {
                tracing::warn!(byte, "unknown action byte");
                self.transition(State::verifying());
            },
        }
    }

    fn handle_tick(&mut self, elapsed: u32, actions: &mut Vec<ControlAction>) {
        match &mut self.state {
            State::Actuating { timeline } => {
                for change in timeline.advance(elapsed) {
                    tracing::debug!(phase = ?change.phase, elapsed, "door phase");
                    actions.push(ControlAction::Drive(change.drive));
                }
                if timeline.is_done() {
                    tracing::info!("door cycle finished");
                    self.transition(State::verifying());
                }
            },
            State::LockedOut { until } => {
                if until.reached(elapsed) {
                    tracing::info!(elapsed, "lockout finished");
                    actions.push(ControlAction::Alarm(false));
                    self.transition(State::verifying());
                }
            },
            _ => {},
        }
    }

    fn transition(&mut self, next: State) {
        tracing::debug!(from = self.state.name(), to = next.name(), "control transition");
        self.state = next;
    }
}
