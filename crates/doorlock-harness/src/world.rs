//! Simulated world: both nodes, the link between them and their devices.
//!
//! The world is single-threaded and fully deterministic. Bytes travel
//! through two FIFO queues, one per direction, and are delivered one at a
//! time alternating between the nodes until both queues are empty. Ticks
//! reach both nodes in the same simulated second, which models two timers
//! started together and never drifting.

use std::{collections::VecDeque, time::Duration};

use doorlock_core::{
    Timing,
    actuator::DriveCommand,
    control::{ControlAction, ControlEvent, ControlMachine},
    env::Environment,
    exchange::Outbound,
    hmi::{HmiAction, HmiEvent, HmiMachine, Key, Screen},
    store::{CredentialVault, Eeprom, MemoryEeprom, StoreError},
    tick::ElapsedSeconds,
};
use doorlock_proto::{CredentialRecord, Password};

use crate::{HarnessError, SimEnv, run_ready};

/// Upper bound on byte deliveries per pump.
const PUMP_LIMIT: usize = 10_000;

/// One end of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// Keypad and display node.
    Hmi,
    /// Actuator, alarm and store node.
    Control,
}

/// A byte observed on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Sender.
    pub from: Node,
    /// The byte.
    pub byte: u8,
}

/// A value tagged with the simulated second it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamped<T> {
    /// Ticks delivered since the world was created.
    pub second: u64,
    /// What happened.
    pub value: T,
}

/// Kind of EEPROM access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOpKind {
    /// Byte read.
    Read,
    /// Byte write with its value.
    Write(u8),
}

/// One EEPROM access with its virtual timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOp {
    /// Virtual time of the access.
    pub at: Duration,
    /// Cell offset.
    pub offset: u16,
    /// Read or write.
    pub kind: StoreOpKind,
}

impl StoreOp {
    /// True for writes.
    pub const fn is_write(&self) -> bool {
        matches!(self.kind, StoreOpKind::Write(_))
    }
}

/// In-memory EEPROM that logs every access.
#[derive(Debug)]
pub struct RecordingEeprom {
    inner: MemoryEeprom,
    env: SimEnv,
    ops: Vec<StoreOp>,
}

impl RecordingEeprom {
    /// Erased device stamping accesses with `env`.
    pub fn new(env: SimEnv) -> Self {
        Self { inner: MemoryEeprom::default(), env, ops: Vec::new() }
    }

    /// All accesses so far, oldest first.
    pub fn ops(&self) -> &[StoreOp] {
        &self.ops
    }

    /// Raw cell contents.
    pub fn cells(&self) -> &[u8] {
        self.inner.cells()
    }
}

impl Eeprom for RecordingEeprom {
    fn write(&mut self, offset: u16, byte: u8) -> Result<(), StoreError> {
        self.ops.push(StoreOp { at: self.env.now(), offset, kind: StoreOpKind::Write(byte) });
        self.inner.write(offset, byte)
    }

    fn read(&mut self, offset: u16) -> Result<u8, StoreError> {
        self.ops.push(StoreOp { at: self.env.now(), offset, kind: StoreOpKind::Read });
        self.inner.read(offset)
    }
}

/// Both nodes wired together.
pub struct World {
    timing: Timing,
    hmi: HmiMachine,
    control: ControlMachine,
    hmi_elapsed: ElapsedSeconds,
    control_elapsed: ElapsedSeconds,
    to_control: VecDeque<u8>,
    to_hmi: VecDeque<u8>,
    vault: CredentialVault<RecordingEeprom, SimEnv>,
    env: SimEnv,
    second: u64,
    transcript: Vec<Transfer>,
    screens: Vec<Stamped<Screen>>,
    masks: usize,
    drives: Vec<Stamped<DriveCommand>>,
    alarms: Vec<Stamped<bool>>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

impl World {
    /// Fresh world with an erased store. Nothing runs until [`Self::start`].
    pub fn new(timing: Timing) -> Self {
        let env = SimEnv::new();
        Self {
            timing,
            hmi: HmiMachine::new(timing),
            control: ControlMachine::new(timing),
            hmi_elapsed: ElapsedSeconds::new(),
            control_elapsed: ElapsedSeconds::new(),
            to_control: VecDeque::new(),
            to_hmi: VecDeque::new(),
            vault: CredentialVault::new(RecordingEeprom::new(env.clone()), env.clone()),
            env,
            second: 0,
            transcript: Vec::new(),
            screens: Vec::new(),
            masks: 0,
            drives: Vec::new(),
            alarms: Vec::new(),
        }
    }

    /// Power on the HMI and let the readiness exchange settle.
    pub fn start(&mut self) -> Result<(), HarnessError> {
        let actions = self.hmi.handle(HmiEvent::Start)?;
        self.apply_hmi(actions);
        self.pump()
    }

    /// Press one key and let the link settle.
    pub fn press(&mut self, key: Key) -> Result<(), HarnessError> {
        let actions = self.hmi.handle(HmiEvent::Key(key))?;
        self.apply_hmi(actions);
        self.pump()
    }

    /// Press each key printed in `text`.
    pub fn type_text(&mut self, text: &str) -> Result<(), HarnessError> {
        text.chars().try_for_each(|c| self.press(Key::from_char(c)))
    }

    /// Let one second pass on both nodes.
    pub fn tick(&mut self) -> Result<(), HarnessError> {
        self.second += 1;
        self.env.advance(Duration::from_secs(1));

        let elapsed = self.hmi_elapsed.tick();
        let actions = self.hmi.handle(HmiEvent::Tick { elapsed })?;
        self.apply_hmi(actions);

        let elapsed = self.control_elapsed.tick();
        let actions = self.control.handle(ControlEvent::Tick { elapsed })?;
        self.apply_control(actions)?;

        self.pump()
    }

    /// Let `seconds` seconds pass.
    pub fn tick_for(&mut self, seconds: u32) -> Result<(), HarnessError> {
        (0..seconds).try_for_each(|_| self.tick())
    }

    /// Put raw bytes on the wire as if `from` had sent them.
    pub fn inject(&mut self, from: Node, bytes: &[u8]) -> Result<(), HarnessError> {
        for &byte in bytes {
            self.transmit(from, byte);
        }
        self.pump()
    }

    /// Deliver queued bytes until both directions are empty.
    fn pump(&mut self) -> Result<(), HarnessError> {
        let mut deliveries = 0;
        loop {
            let mut delivered = false;

            if let Some(byte) = self.to_control.pop_front() {
                let actions = self.control.handle(ControlEvent::Byte(byte))?;
                self.apply_control(actions)?;
                delivered = true;
                deliveries += 1;
            }

            if let Some(byte) = self.to_hmi.pop_front() {
                let actions = self.hmi.handle(HmiEvent::Byte(byte))?;
                self.apply_hmi(actions);
                delivered = true;
                deliveries += 1;
            }

            if !delivered {
                return Ok(());
            }
            if deliveries > PUMP_LIMIT {
                return Err(HarnessError::Livelock { deliveries });
            }
        }
    }

    fn apply_hmi(&mut self, actions: Vec<HmiAction>) {
        for action in actions {
            match action {
                HmiAction::Send(outbound) => self.send(Node::Hmi, &outbound),
                HmiAction::Show(screen) => {
                    self.screens.push(Stamped { second: self.second, value: screen });
                },
                HmiAction::EchoMask => self.masks += 1,
                HmiAction::ResetElapsed => self.hmi_elapsed.reset(),
            }
        }
    }

    fn apply_control(&mut self, actions: Vec<ControlAction>) -> Result<(), HarnessError> {
        let mut queue = VecDeque::from(actions);
        while let Some(action) = queue.pop_front() {
            match action {
                ControlAction::Send(outbound) => self.send(Node::Control, &outbound),
                ControlAction::PersistCredential(password) => {
                    run_ready(self.vault.persist(&password))??;
                },
                ControlAction::LoadCredential => {
                    let record = run_ready(self.vault.load())??;
                    queue.extend(self.control.handle(ControlEvent::CredentialLoaded(record))?);
                },
                ControlAction::ResetElapsed => self.control_elapsed.reset(),
                ControlAction::Drive(command) => {
                    self.drives.push(Stamped { second: self.second, value: command });
                },
                ControlAction::Alarm(on) => {
                    self.alarms.push(Stamped { second: self.second, value: on });
                },
            }
        }
        Ok(())
    }

    fn send(&mut self, from: Node, outbound: &Outbound) {
        for &byte in outbound.to_bytes().iter() {
            self.transmit(from, byte);
        }
    }

    fn transmit(&mut self, from: Node, byte: u8) {
        self.transcript.push(Transfer { from, byte });
        match from {
            Node::Hmi => self.to_control.push_back(byte),
            Node::Control => self.to_hmi.push_back(byte),
        }
    }

    /// Timing both nodes were built with.
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// The HMI machine.
    pub const fn hmi(&self) -> &HmiMachine {
        &self.hmi
    }

    /// The Control machine.
    pub const fn control(&self) -> &ControlMachine {
        &self.control
    }

    /// Ticks delivered so far.
    pub const fn second(&self) -> u64 {
        self.second
    }

    /// Every byte sent in either direction, in order.
    pub fn transcript(&self) -> &[Transfer] {
        &self.transcript
    }

    /// Every screen shown, in order.
    pub fn screens(&self) -> &[Stamped<Screen>] {
        &self.screens
    }

    /// Screen currently on the display.
    pub fn current_screen(&self) -> Option<Screen> {
        self.screens.last().map(|s| s.value)
    }

    /// Number of `*` echoes.
    pub const fn masks(&self) -> usize {
        self.masks
    }

    /// Actuator commands, in order.
    pub fn drives(&self) -> &[Stamped<DriveCommand>] {
        &self.drives
    }

    /// Alarm switches, in order.
    pub fn alarms(&self) -> &[Stamped<bool>] {
        &self.alarms
    }

    /// EEPROM accesses, in order.
    pub fn store_ops(&self) -> &[StoreOp] {
        self.vault.eeprom().ops()
    }

    /// The password currently in the store, if a valid record is there.
    pub fn stored_password(&self) -> Option<Password> {
        let base = usize::from(CredentialRecord::BASE_ADDRESS);
        let cells = self.vault.eeprom().cells().get(base..base + CredentialRecord::SIZE)?;
        CredentialRecord::from_slice(cells).ok()?.password().ok()
    }

    /// True when no byte is in flight on the link.
    pub fn is_quiescent(&self) -> bool {
        self.to_control.is_empty() && self.to_hmi.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use doorlock_core::{control::ControlPhase, hmi::HmiPhase};

    use super::*;

    #[test]
    fn start_reaches_enrollment() {
        let mut world = World::default();
        world.start().unwrap();

        assert_eq!(world.hmi().phase(), HmiPhase::CaptureNew);
        assert_eq!(world.control().phase(), ControlPhase::AwaitEnrollment);
        assert_eq!(world.current_screen(), Some(Screen::EnterPassword));
        assert_eq!(
            world.transcript(),
            &[
                Transfer { from: Node::Hmi, byte: 0xFF },
                Transfer { from: Node::Control, byte: 0xFF },
            ]
        );
    }

    #[test]
    fn digits_echo_masks() {
        let mut world = World::default();
        world.start().unwrap();
        world.type_text("1234567").unwrap();

        assert_eq!(world.masks(), 5);
        assert!(world.is_quiescent());
    }

    #[test]
    fn fresh_store_has_no_password() {
        let world = World::default();
        assert_eq!(world.stored_password(), None);
        assert!(world.store_ops().is_empty());
    }
}
