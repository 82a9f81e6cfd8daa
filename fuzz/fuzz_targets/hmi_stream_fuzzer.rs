//! Fuzz target for [`HmiMachine`]
//!
//! Interleave arbitrary key presses, link bytes and ticks.
//!
//! # Invariants
//!
//! - A second `Start` is always rejected
//! - The failure counter stays below the lockout threshold
//! - At most five `*` echoes per capture
//! - NEVER panic on unexpected bytes or keys

#![no_main]

use arbitrary::Arbitrary;
use doorlock_core::{
    Timing,
    hmi::{HmiAction, HmiEvent, HmiMachine, Key, Screen},
};
use doorlock_proto::PASSWORD_LEN;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    Key(u8),
    Byte(u8),
    Tick { seconds: u8 },
    Restart,
}

fuzz_target!(|events: Vec<Input>| {
    let timing = Timing::default();
    let mut machine = HmiMachine::new(timing);
    machine.handle(HmiEvent::Start).expect("first start is accepted");

    let mut elapsed = 0u32;
    let mut masks = 0usize;

    for event in events {
        let result = match event {
            Input::Key(raw) => machine.handle(HmiEvent::Key(Key::from_char(char::from(raw)))),
            Input::Byte(byte) => machine.handle(HmiEvent::Byte(byte)),
            Input::Tick { seconds } => {
                let mut actions = Vec::new();
                for _ in 0..seconds {
                    elapsed += 1;
                    actions.extend(
                        machine.handle(HmiEvent::Tick { elapsed }).expect("ticks never error"),
                    );
                }
                Ok(actions)
            },
            Input::Restart => {
                assert!(machine.handle(HmiEvent::Start).is_err());
                continue;
            },
        };

        for action in result.expect("keys and bytes never error") {
            match action {
                HmiAction::ResetElapsed => elapsed = 0,
                HmiAction::EchoMask => {
                    masks += 1;
                    assert!(masks <= PASSWORD_LEN);
                },
                HmiAction::Show(Screen::EnterPassword | Screen::ReEnterPassword) => masks = 0,
                HmiAction::Show(_) | HmiAction::Send(_) => {},
            }
        }
        assert!(machine.failures() < timing.failure_threshold);
    }
});
