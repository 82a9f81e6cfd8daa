//! Reusable oracle checks.
//!
//! Each helper returns an [`OracleFn`] so they compose with [`all_of`].
//! The same checks are exposed as plain functions over a [`World`] for the
//! property tests, which run them after every operation.

use std::time::Duration;

use doorlock_core::{
    actuator::{Direction, DriveCommand, DutyCycle},
    control::ControlPhase,
    hmi::HmiPhase,
};
use doorlock_proto::Password;

use crate::{
    World,
    scenario::{OracleFn, OracleResult},
};

/// Wrap an ad-hoc check.
pub fn check(f: impl Fn(&World) -> OracleResult + 'static) -> OracleFn {
    Box::new(f)
}

/// Run every oracle, stopping at the first failure.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| oracles.iter().try_for_each(|oracle| oracle(world)))
}

/// Both nodes saw the same number of consecutive failures.
pub fn counters_agree() -> OracleFn {
    Box::new(check_counters_agree)
}

/// The store holds exactly this password.
pub fn stored_password(digits: &'static str) -> OracleFn {
    Box::new(move |world| {
        let expected = digits.parse::<Password>().ok();
        let stored = world.stored_password();
        if expected.is_some() && stored == expected {
            Ok(())
        } else {
            let found = stored.map(|p| String::from_utf8_lossy(p.digits()).into_owned());
            Err(format!("expected stored password {digits}, found {found:?}"))
        }
    })
}

/// The store was never written.
pub fn nothing_stored() -> OracleFn {
    Box::new(|world| {
        let writes = world.store_ops().iter().filter(|op| op.is_write()).count();
        if writes == 0 && world.stored_password().is_none() {
            Ok(())
        } else {
            Err(format!("expected empty store, saw {writes} writes"))
        }
    })
}

/// Both nodes ended in these phases.
pub fn phases(hmi: HmiPhase, control: ControlPhase) -> OracleFn {
    Box::new(move |world| {
        let actual = (world.hmi().phase(), world.control().phase());
        if actual == (hmi, control) {
            Ok(())
        } else {
            Err(format!("expected phases {:?}, found {actual:?}", (hmi, control)))
        }
    })
}

/// Every completed lockout kept the alarm on for the configured time.
pub fn lockouts_held() -> OracleFn {
    Box::new(check_lockouts_held)
}

/// EEPROM accesses are spaced by at least `gap`.
pub fn store_settled(gap: Duration) -> OracleFn {
    Box::new(move |world| check_store_settled(world, gap))
}

/// Actuator commands form complete or in-progress door cycles.
pub fn door_cycles_well_formed() -> OracleFn {
    Box::new(check_door_cycles)
}

/// Failure counters agree and stay below the lockout threshold.
pub fn check_counters_agree(world: &World) -> OracleResult {
    let hmi = world.hmi().failures();
    let control = world.control().failures();
    let threshold = world.timing().failure_threshold;

    if hmi != control {
        return Err(format!("failure counters diverged: hmi {hmi}, control {control}"));
    }
    if control >= threshold {
        return Err(format!("failure counter {control} reached threshold {threshold}"));
    }
    Ok(())
}

/// Alarm on/off pairs are at least the lockout length apart.
pub fn check_lockouts_held(world: &World) -> OracleResult {
    let lockout = u64::from(world.timing().lockout_secs);
    let mut engaged = None;

    for event in world.alarms() {
        match (event.value, engaged) {
            (true, None) => engaged = Some(event.second),
            (false, Some(since)) => {
                let held = event.second - since;
                if held < lockout {
                    return Err(format!("alarm held {held}s, lockout is {lockout}s"));
                }
                engaged = None;
            },
            (on, state) => {
                return Err(format!("alarm switched {on} while engaged since {state:?}"));
            },
        }
    }
    Ok(())
}

/// Consecutive EEPROM accesses are at least `gap` apart.
pub fn check_store_settled(world: &World, gap: Duration) -> OracleResult {
    for pair in world.store_ops().windows(2) {
        let spacing = pair[1].at - pair[0].at;
        if spacing < gap {
            return Err(format!("store accesses {spacing:?} apart at {:?}", pair[1].at));
        }
    }
    Ok(())
}

/// Drives follow forward, stop, reverse, stop at the configured seconds.
pub fn check_door_cycles(world: &World) -> OracleResult {
    let timeline = world.timing().timeline;
    let duty = timeline.duty_percent;
    let offsets = [0, timeline.extend_until, timeline.hold_until, timeline.retract_until];
    let directions = [Direction::Forward, Direction::Stop, Direction::Reverse, Direction::Stop];

    for cycle in world.drives().chunks(offsets.len()) {
        let started = cycle[0].second;
        for ((drive, offset), direction) in cycle.iter().zip(offsets).zip(directions) {
            let expected_duty = if direction == Direction::Stop { 0 } else { duty };
            let expected = DriveCommand::new(direction, DutyCycle::new(expected_duty));
            if drive.value != expected {
                return Err(format!("expected {expected:?}, found {:?}", drive.value));
            }
            if drive.second - started != u64::from(offset) {
                return Err(format!(
                    "{direction:?} at +{}s, expected +{offset}s",
                    drive.second - started
                ));
            }
        }
    }
    Ok(())
}
