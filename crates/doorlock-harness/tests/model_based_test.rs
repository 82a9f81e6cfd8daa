//! Property tests over random user sessions.
//!
//! Each case boots a fresh [`World`], enrolls nothing up front, and applies a
//! random sequence of operations. After every operation the link is quiet,
//! so the protocol-level invariants must hold at that point.
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!                          ▼
//!                World (HMI + Control)
//!                          │
//!                          ▼
//!            invariants after every step
//! ```

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use arbitrary::{Arbitrary, Unstructured};
use doorlock_core::{actuator::Direction, control::ControlPhase, hmi::HmiPhase};
use doorlock_harness::{
    Node, Operation, PasswordChoice, World,
    scenario::oracle::{
        check_counters_agree, check_door_cycles, check_lockouts_held, check_store_settled,
    },
};
use doorlock_proto::Password;
use proptest::prelude::*;

const SETTLE: Duration = Duration::from_millis(10);

fn password_strategy() -> impl Strategy<Value = PasswordChoice> {
    prop_oneof![
        3 => Just(PasswordChoice::Primary),
        2 => Just(PasswordChoice::Secondary),
        1 => Just(PasswordChoice::Zeros),
    ]
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    // Digits and `=` only arrive through `Submit`, so every submitted
    // password is exactly the one chosen.
    let keys = prop::sample::select(b"+-#*AD".to_vec());

    prop_oneof![
        6 => password_strategy().prop_map(Operation::Submit),
        2 => Just(Operation::OpenDoor),
        2 => Just(Operation::ChangePassword),
        1 => keys.prop_map(Operation::Press),
        2 => (0u8..80).prop_map(|seconds| Operation::Wait { seconds }),
    ]
}

/// Captured state for determinism checks.
#[derive(Debug, PartialEq, Eq)]
struct Observed {
    transcript: Vec<(bool, u8)>,
    screens: Vec<String>,
    drives: Vec<(u64, String)>,
    alarms: Vec<(u64, bool)>,
    store_ops: Vec<Duration>,
    phases: (HmiPhase, ControlPhase),
}

fn observe(world: &World) -> Observed {
    Observed {
        transcript: world
            .transcript()
            .iter()
            .map(|t| (t.from == Node::Hmi, t.byte))
            .collect(),
        screens: world.screens().iter().map(|s| format!("{}@{}", s.value, s.second)).collect(),
        drives: world.drives().iter().map(|d| (d.second, format!("{:?}", d.value))).collect(),
        alarms: world.alarms().iter().map(|a| (a.second, a.value)).collect(),
        store_ops: world.store_ops().iter().map(|op| op.at).collect(),
        phases: (world.hmi().phase(), world.control().phase()),
    }
}

fn run(ops: &[Operation]) -> World {
    let mut world = World::default();
    world.start().unwrap();
    for op in ops {
        op.apply(&mut world).unwrap();
    }
    world
}

fn assert_invariants(world: &World) -> Result<(), TestCaseError> {
    prop_assert!(world.is_quiescent(), "link must be quiet between operations");
    check_counters_agree(world).map_err(TestCaseError::fail)?;
    check_lockouts_held(world).map_err(TestCaseError::fail)?;
    check_store_settled(world, SETTLE).map_err(TestCaseError::fail)?;
    check_door_cycles(world).map_err(TestCaseError::fail)?;
    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold_after_every_operation(
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let mut world = World::default();
        world.start().unwrap();

        for (i, op) in ops.iter().enumerate() {
            op.apply(&mut world).unwrap();
            assert_invariants(&world).map_err(|e| {
                TestCaseError::fail(format!("after operation {i} ({op:?}): {e}"))
            })?;
        }
    }

    #[test]
    fn prop_same_operations_same_run(
        ops in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        let first = observe(&run(&ops));
        let second = observe(&run(&ops));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_timed_phases_always_end(
        ops in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        let mut world = run(&ops);
        world.tick_for(100).unwrap();

        prop_assert_ne!(world.hmi().phase(), HmiPhase::Lockout);
        prop_assert!(
            !matches!(world.control().phase(), ControlPhase::Actuating | ControlPhase::Lockout),
            "control stuck in {:?}",
            world.control().phase()
        );
        prop_assert!(world.alarms().last().is_none_or(|a| !a.value), "alarm left on");
        assert_invariants(&world)?;
    }

    #[test]
    fn prop_door_opens_only_for_stored_password(
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let mut world = World::default();
        world.start().unwrap();

        for op in &ops {
            let stored_before = world.stored_password();
            let drives_before = world.drives().len();
            op.apply(&mut world).unwrap();

            let opened = world.drives()[drives_before..]
                .iter()
                .any(|d| d.value.direction == Direction::Forward);
            if opened {
                let Operation::Submit(choice) = op else {
                    return Err(TestCaseError::fail(format!("door opened on {op:?}")));
                };
                prop_assert_eq!(stored_before, choice.digits().parse::<Password>().ok());
            }
        }
    }

    #[test]
    fn prop_arbitrary_sessions_keep_invariants(
        raw in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let mut u = Unstructured::new(&raw);
        let ops = Vec::<Operation>::arbitrary(&mut u).unwrap_or_default();

        let world = run(&ops);
        assert_invariants(&world)?;
    }
}

#[cfg(test)]
mod smoke_tests {
    use super::*;

    #[test]
    fn enroll_open_and_lock_out() {
        let ops = [
            Operation::Submit(PasswordChoice::Primary),
            Operation::Submit(PasswordChoice::Primary),
            Operation::OpenDoor,
            Operation::Submit(PasswordChoice::Primary),
            Operation::Wait { seconds: 40 },
            Operation::ChangePassword,
            Operation::Submit(PasswordChoice::Zeros),
            Operation::Submit(PasswordChoice::Zeros),
            Operation::Submit(PasswordChoice::Zeros),
            Operation::Wait { seconds: 61 },
        ];

        let world = run(&ops);

        assert_eq!(world.drives().len(), 4);
        assert_eq!(world.alarms().len(), 2);
        assert_eq!(world.hmi().phase(), HmiPhase::MainMenu);
        assert_eq!(world.control().phase(), ControlPhase::AwaitReVerification);
        assert_eq!(world.stored_password(), "12345".parse::<Password>().ok());
    }
}
