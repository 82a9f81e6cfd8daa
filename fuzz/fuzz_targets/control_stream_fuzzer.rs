//! Fuzz target for [`ControlMachine`]
//!
//! Feed arbitrary link bytes, ticks and store contents to the Control node
//! and check it never panics or loses track of its lockout.
//!
//! # Strategy
//!
//! - Byte streams: raw bytes, well-formed password frames, command bytes
//! - Store contents: valid records, erased cells, garbage
//! - Time: ticks of arbitrary size, including ones that skip phases
//! - Probing: credential completions nobody asked for
//!
//! # Invariants
//!
//! - The failure counter only reaches the lockout threshold while the
//!   final verdict is being delivered
//! - An unsolicited `CredentialLoaded` is rejected, a requested one is not
//! - The alarm alternates on/off and only switches off after the lockout
//! - The motor only runs while the door timeline runs
//! - NEVER panic on unexpected bytes

#![no_main]

use arbitrary::Arbitrary;
use doorlock_core::{
    Timing,
    actuator::DriveCommand,
    control::{ControlAction, ControlEvent, ControlMachine, ControlPhase},
};
use doorlock_proto::{CredentialRecord, WIRE_LEN};
use libfuzzer_sys::fuzz_target;

/// Every byte value with a meaning on the link.
const COMMANDS: [u8; 7] = [0x01, 0x02, 0x03, 0x04, 0xFD, 0xFE, 0xFF];

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    Byte(u8),
    Frame { digits: [u8; 5] },
    Command(u8),
    Tick { seconds: u8 },
    UnsolicitedLoad([u8; WIRE_LEN]),
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    /// What the EEPROM returns for every load.
    stored: [u8; WIRE_LEN],
    events: Vec<Input>,
}

struct Harness {
    machine: ControlMachine,
    timing: Timing,
    stored: CredentialRecord,
    elapsed: u32,
    alarm_on: bool,
}

impl Harness {
    fn apply(&mut self, actions: Vec<ControlAction>) {
        let mut queue = std::collections::VecDeque::from(actions);
        while let Some(action) = queue.pop_front() {
            match action {
                ControlAction::LoadCredential => {
                    assert!(self.machine.is_loading());
                    let follow = self
                        .machine
                        .handle(ControlEvent::CredentialLoaded(self.stored))
                        .expect("requested load must be accepted");
                    queue.extend(follow);
                },
                ControlAction::ResetElapsed => self.elapsed = 0,
                ControlAction::Alarm(on) => {
                    assert_ne!(on, self.alarm_on, "alarm switched to its current state");
                    if !on {
                        assert!(self.elapsed >= self.timing.lockout_secs);
                    }
                    self.alarm_on = on;
                },
                ControlAction::Drive(command) => {
                    assert!(
                        command == DriveCommand::STOP
                            || self.machine.phase() == ControlPhase::Actuating
                    );
                },
                ControlAction::Send(_) | ControlAction::PersistCredential(_) => {},
            }
        }
        let failures = self.machine.failures();
        assert!(failures <= self.timing.failure_threshold);
        assert!(
            failures < self.timing.failure_threshold
                || self.machine.phase() == ControlPhase::AwaitReVerification
        );
    }

    fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let actions = self.machine.handle(ControlEvent::Byte(byte)).expect("bytes never error");
            self.apply(actions);
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let timing = Timing::default();
    let mut harness = Harness {
        machine: ControlMachine::new(timing),
        timing,
        stored: CredentialRecord::from_bytes(input.stored),
        elapsed: 0,
        alarm_on: false,
    };

    for event in input.events {
        match event {
            Input::Byte(byte) => harness.feed(&[byte]),
            Input::Command(index) => {
                harness.feed(&[COMMANDS[usize::from(index) % COMMANDS.len()]]);
            },
            Input::Frame { digits } => {
                let mut frame = vec![0x01];
                frame.extend_from_slice(&digits);
                frame.push(b'#');
                harness.feed(&frame);
            },
            Input::Tick { seconds } => {
                for _ in 0..seconds {
                    harness.elapsed += 1;
                    let actions = harness
                        .machine
                        .handle(ControlEvent::Tick { elapsed: harness.elapsed })
                        .expect("ticks never error");
                    harness.apply(actions);
                }
            },
            Input::UnsolicitedLoad(raw) => {
                let loading = harness.machine.is_loading();
                let record = CredentialRecord::from_bytes(raw);
                let result = harness.machine.handle(ControlEvent::CredentialLoaded(record));
                assert_eq!(result.is_ok(), loading);
                if let Ok(actions) = result {
                    harness.apply(actions);
                }
            },
        }
    }
});
