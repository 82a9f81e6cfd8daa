//! End-to-end user journeys through both state machines.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use doorlock_core::{
    actuator::Direction,
    control::ControlPhase,
    hmi::{HmiPhase, Screen},
};
use doorlock_harness::{
    Node,
    scenario::{Scenario, oracle},
};

#[test]
fn enrollment_stores_password() {
    let result = Scenario::new("enroll")
        .enroll("12345")
        .oracle(oracle::all_of(vec![
            oracle::stored_password("12345"),
            oracle::phases(HmiPhase::MainMenu, ControlPhase::AwaitReVerification),
            oracle::store_settled(Duration::from_millis(10)),
            oracle::check(|world| {
                if world.current_screen() == Some(Screen::MainMenu) {
                    Ok(())
                } else {
                    Err(format!("menu not shown: {:?}", world.current_screen()))
                }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn mismatched_enrollment_restarts() {
    let result = Scenario::new("mismatch")
        .enter("11111")
        .enter("22222")
        .oracle(oracle::all_of(vec![
            oracle::nothing_stored(),
            oracle::phases(HmiPhase::CaptureNew, ControlPhase::AwaitEnrollment),
            oracle::check(|world| {
                let shown: Vec<Screen> = world.screens().iter().map(|s| s.value).collect();
                let expected = [
                    Screen::EnterPassword,
                    Screen::ReEnterPassword,
                    Screen::NotMatched,
                    Screen::EnterPassword,
                ];
                if shown == expected {
                    Ok(())
                } else {
                    Err(format!("unexpected screens {shown:?}"))
                }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn mismatch_then_match_enrolls() {
    let result = Scenario::new("retry enrollment")
        .enter("11111")
        .enter("22222")
        .enroll("24680")
        .oracle(oracle::all_of(vec![
            oracle::stored_password("24680"),
            oracle::phases(HmiPhase::MainMenu, ControlPhase::AwaitReVerification),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn open_door_runs_full_cycle() {
    let result = Scenario::new("open door")
        .enroll("12345")
        .open_door()
        .enter("12345")
        .wait(33)
        .oracle(oracle::all_of(vec![
            oracle::door_cycles_well_formed(),
            oracle::counters_agree(),
            oracle::phases(HmiPhase::MainMenu, ControlPhase::AwaitReVerification),
            oracle::check(|world| {
                let directions: Vec<Direction> =
                    world.drives().iter().map(|d| d.value.direction).collect();
                let expected =
                    [Direction::Forward, Direction::Stop, Direction::Reverse, Direction::Stop];
                if directions == expected {
                    Ok(())
                } else {
                    Err(format!("unexpected drives {directions:?}"))
                }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn door_is_open_during_hold() {
    let result = Scenario::new("mid cycle")
        .enroll("12345")
        .open_door()
        .enter("12345")
        .wait(16)
        .keys("+-=")
        .oracle(oracle::all_of(vec![
            oracle::phases(HmiPhase::OpeningDoor, ControlPhase::Actuating),
            oracle::check(|world| {
                if world.current_screen() == Some(Screen::DoorOpened) {
                    Ok(())
                } else {
                    Err(format!("expected door opened, showing {:?}", world.current_screen()))
                }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn three_mismatches_lock_out() {
    let result = Scenario::new("lockout engaged")
        .enroll("12345")
        .change_password()
        .enter("99999")
        .enter("99999")
        .enter("99999")
        .wait(59)
        .oracle(oracle::all_of(vec![
            oracle::phases(HmiPhase::Lockout, ControlPhase::Lockout),
            oracle::counters_agree(),
            oracle::stored_password("12345"),
            oracle::check(|world| {
                let alarms: Vec<bool> = world.alarms().iter().map(|a| a.value).collect();
                if alarms == [true] && world.current_screen() == Some(Screen::Error) {
                    Ok(())
                } else {
                    Err(format!("alarms {alarms:?}, screen {:?}", world.current_screen()))
                }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn lockout_expires_after_sixty_seconds() {
    let result = Scenario::new("lockout expires")
        .enroll("12345")
        .open_door()
        .enter("99999")
        .enter("99999")
        .enter("99999")
        .wait(60)
        .oracle(oracle::all_of(vec![
            oracle::phases(HmiPhase::MainMenu, ControlPhase::AwaitReVerification),
            oracle::lockouts_held(),
            oracle::counters_agree(),
            oracle::check(|world| {
                let alarms: Vec<bool> = world.alarms().iter().map(|a| a.value).collect();
                if alarms == [true, false] && world.drives().is_empty() {
                    Ok(())
                } else {
                    Err(format!("alarms {alarms:?}, drives {:?}", world.drives()))
                }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn wrong_then_right_clears_counter() {
    let result = Scenario::new("recover")
        .enroll("12345")
        .open_door()
        .enter("54321")
        .enter("12345")
        .oracle(oracle::all_of(vec![
            oracle::counters_agree(),
            oracle::phases(HmiPhase::OpeningDoor, ControlPhase::Actuating),
            oracle::check(|world| {
                let wrong = world
                    .screens()
                    .iter()
                    .any(|s| s.value == Screen::WrongPassword { failures: 1 });
                if wrong && world.hmi().failures() == 0 {
                    Ok(())
                } else {
                    Err(format!("failures {}", world.hmi().failures()))
                }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn change_password_replaces_credential() {
    let result = Scenario::new("change password")
        .enroll("12345")
        .change_password()
        .enter("12345")
        .enroll("67890")
        .open_door()
        .enter("12345")
        .oracle(oracle::all_of(vec![
            oracle::stored_password("67890"),
            oracle::counters_agree(),
            oracle::store_settled(Duration::from_millis(10)),
            oracle::check(|world| {
                let shown: Vec<Screen> = world.screens().iter().map(|s| s.value).collect();
                let changed = shown.contains(&Screen::PasswordChanged);
                let rejected = shown.last() == Some(&Screen::EnterPassword)
                    && shown.contains(&Screen::WrongPassword { failures: 1 });
                if changed && rejected {
                    Ok(())
                } else {
                    Err(format!("unexpected screens {shown:?}"))
                }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn line_noise_before_enrollment_is_ignored() {
    let result = Scenario::new("noise")
        .inject(Node::Hmi, [0x42, 0x00, 0x23])
        .inject(Node::Control, [0x10, 0x7F])
        .enroll("13579")
        .oracle(oracle::all_of(vec![
            oracle::stored_password("13579"),
            oracle::phases(HmiPhase::MainMenu, ControlPhase::AwaitReVerification),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn failing_oracle_reports_scenario() {
    let result = Scenario::new("expects wrong password")
        .enroll("12345")
        .oracle(oracle::stored_password("00000"))
        .run();

    let err = result.unwrap_err().to_string();
    assert!(err.contains("expects wrong password"), "{err}");
}
