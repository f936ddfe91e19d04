//! Integration tests for the shared poll driver.

use std::time::{Duration, Instant};

use crate::mock_hw::{ManualClock, Rig};

use limbsafety::app::commands::SupervisorCommand;
use limbsafety::fsm::StateId;
use limbsafety::poll::{POLL_TASK, PollDriver};
use limbsafety::status;

#[test]
fn driver_ticks_and_supervises_through_the_lock() {
    let rig = Rig::started();
    let (left, right, foot) = (rig.left.clone(), rig.right.clone(), rig.foot.clone());
    let driver = PollDriver::new(rig.lss);
    let supervisor = driver.clone();

    left.press();
    right.press();
    for t in 0..50 {
        driver.tick(t);
    }
    foot.press();
    let trace = driver.tick(50);
    assert_eq!(trace.len(), 2, "start and end release in one tick");
    assert_eq!(driver.with(|lss| lss.state()), StateId::EndRelease);
    assert_ne!(driver.board().word() & status::LATCH_RELEASE_ON, 0);

    supervisor
        .with(|lss| lss.handle_command(SupervisorCommand::ResetFda))
        .unwrap();
    assert_eq!(driver.with(|lss| lss.state()), StateId::OffNotBothHands);
    assert_eq!(driver.board().word() & status::LATCH_RELEASE_ON, 0);
}

#[test]
fn spawned_task_polls_until_stopped() {
    let rig = Rig::started();
    let (left, right) = (rig.left.clone(), rig.right.clone());
    let clock = ManualClock::default();
    let driver = PollDriver::new(rig.lss);
    let board = driver.board().clone();

    let handle = driver.spawn(clock.clone(), POLL_TASK).unwrap();
    left.press();
    right.press();
    clock.advance(10);

    let deadline = Instant::now() + Duration::from_secs(2);
    while board.word() & status::FOOT_ENABLED == 0 {
        assert!(Instant::now() < deadline, "poll task never armed the foot");
        std::thread::sleep(Duration::from_millis(5));
    }
    handle.stop();
    assert_eq!(driver.with(|lss| lss.state()), StateId::OffBothHandsNotFoot);
}

#[test]
fn spawn_requires_a_started_switch() {
    let rig = Rig::with_config(limbsafety::config::InterlockConfig::default());
    let driver = PollDriver::new(rig.lss);
    assert!(driver.spawn(ManualClock::default(), POLL_TASK).is_err());
}
