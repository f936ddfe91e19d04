//! Integration tests for the switches → FDA → outputs pipeline.
//!
//! Drives a started [`LimbSafetySwitch`] with mock switches one
//! millisecond at a time and checks the published status word.

use crate::mock_hw::{Journal, Rig};

use limbsafety::config::{InterlockConfig, SwitchBehaviorConfig};
use limbsafety::error::{Error, StartError};
use limbsafety::fsm::StateId;
use limbsafety::notify::NotifyEvent;
use limbsafety::status;

/// Hands on at t=0, foot seen released, foot pressed at t=50.
fn start_cycle(rig: &mut Rig) {
    rig.hands_on();
    rig.run(0, 49);
    rig.foot.press();
    rig.lss.tick(50);
}

// ── Full cycle ────────────────────────────────────────────────

#[test]
fn full_cycle_follows_release_and_cycle_times() {
    let mut rig = Rig::started();
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(rig.left.is_enabled() && rig.right.is_enabled());
    assert!(!rig.foot.is_enabled());

    rig.hands_on();
    rig.lss.tick(0);
    assert_eq!(rig.lss.state(), StateId::OffBothHandsNotFoot);
    assert!(rig.foot.is_enabled(), "foot armed once both hands are on");

    rig.run(1, 49);
    rig.foot.press();
    rig.run(50, 51);
    assert!(rig.lss.latch_release_on());
    assert!(rig.lss.production_cycle_on());
    assert_eq!(rig.lss.state(), StateId::EndRelease);
    assert!(!rig.foot.is_enabled());
    assert!(!rig.left.is_enabled() && !rig.right.is_enabled());
    let word = rig.lss.status_word();
    assert_ne!(word & status::LATCH_RELEASE_ON, 0);
    assert_ne!(word & status::PRODUCTION_CYCLE_ON, 0);

    rig.hands_off();
    rig.foot.release();
    rig.run(52, 1549);
    assert!(rig.lss.latch_release_on(), "release still held at 1549");

    rig.run(1550, 1551);
    assert!(!rig.lss.latch_release_on());
    assert!(rig.lss.production_cycle_on());
    assert_eq!(rig.lss.state(), StateId::EndCycle);

    rig.run(1552, 6049);
    assert!(rig.lss.production_cycle_on(), "cycle still running at 6049");

    rig.run(6050, 6051);
    assert!(!rig.lss.latch_release_on());
    assert!(!rig.lss.production_cycle_on());
    assert!(!rig.foot.is_enabled());
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(rig.left.is_enabled() && rig.right.is_enabled());
    assert_eq!(rig.flags().encode(), rig.lss.status_flags().encode());
}

#[test]
fn hands_held_through_cycle_end_must_be_pressed_again() {
    let mut rig = Rig::started();
    start_cycle(&mut rig);
    rig.foot.release();
    rig.run(51, 6050);
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(rig.left.is_enabled() && rig.right.is_enabled());

    rig.run(6051, 7000);
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands, "held hands do not re-arm");
    assert!(!rig.foot.is_enabled());

    rig.hands_off();
    rig.lss.tick(7001);
    rig.hands_on();
    rig.lss.tick(7002);
    assert_eq!(rig.lss.state(), StateId::OffBothHandsNotFoot);
    assert!(rig.foot.is_enabled());
    assert!(!rig.lss.production_cycle_on());
}

#[test]
fn hands_reading_on_while_disabled_never_arm_the_foot() {
    let mut rig = Rig::started();
    let journal = Journal::default();
    journal.attach(&mut rig.lss);
    rig.left.set_on_if_disabled(true);
    rig.right.set_on_if_disabled(true);
    start_cycle(&mut rig);

    rig.hands_off();
    rig.foot.release();
    rig.run(51, 6050);
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(!rig.foot.is_enabled());

    rig.run(6051, 6100);
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(!rig.foot.is_enabled());
    assert_eq!(journal.count(NotifyEvent::BothHandsMissed), 0);
}

// ── Foot-press edge ───────────────────────────────────────────

#[test]
fn foot_held_through_arming_never_fires() {
    let mut rig = Rig::started();
    rig.foot.press();
    rig.hands_on();
    rig.run(0, 3000);
    assert_eq!(rig.lss.state(), StateId::OffBothHandsNotFoot);
    assert!(!rig.lss.production_cycle_on());

    rig.foot.release();
    rig.run(3001, 3009);
    rig.foot.press();
    rig.lss.tick(3010);
    assert!(rig.lss.production_cycle_on());
}

#[test]
fn voided_foot_press_does_not_fire() {
    let mut rig = Rig::started();
    rig.hands_on();
    rig.run(0, 9);
    rig.foot.press();
    rig.foot.void();
    rig.run(10, 200);
    assert!(!rig.lss.latch_release_on());
    assert_eq!(rig.lss.state(), StateId::OffBothHandsNotFoot);

    rig.foot.release();
    rig.run(201, 210);
    rig.foot.press();
    rig.lss.tick(211);
    assert!(rig.lss.latch_release_on());
}

#[test]
fn one_hand_never_arms_the_foot() {
    let mut rig = Rig::started();
    rig.left.press();
    rig.foot.press();
    rig.run(0, 500);
    assert!(!rig.foot.is_enabled());
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(!rig.lss.both_hands_ok());
}

// ── Missed opportunity ────────────────────────────────────────

#[test]
fn missed_opportunity_fires_once_and_never_cycles() {
    let mut rig = Rig::started();
    let journal = Journal::default();
    journal.attach(&mut rig.lss);

    rig.hands_on();
    for t in 0..=499 {
        rig.lss.tick(t);
        assert!(!rig.lss.production_cycle_on());
    }
    assert!(rig.lss.both_hands_ok());

    rig.left.release();
    for t in 500..=2000 {
        rig.lss.tick(t);
        assert!(!rig.lss.production_cycle_on());
    }
    assert_eq!(journal.count(NotifyEvent::BothHandsMissed), 1);
    assert_eq!(journal.count(NotifyEvent::ProductionCycleOn), 0);
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(!rig.foot.is_enabled());
}

// ── Restoration ───────────────────────────────────────────────

#[test]
fn hand_enablement_is_restored_after_a_cycle() {
    let mut config = InterlockConfig::default();
    config.left_hand.is_enabled = false;
    let mut rig = Rig::with_config(config);
    rig.lss.begin(10).unwrap();
    assert!(!rig.left.is_enabled());
    assert!(rig.right.is_enabled());

    rig.right.press();
    rig.run(0, 49);
    assert_eq!(rig.lss.state(), StateId::OffBothHandsNotFoot);
    rig.foot.press();
    rig.lss.tick(50);
    assert!(rig.lss.production_cycle_on());

    rig.right.release();
    rig.foot.release();
    rig.run(51, 6051);
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(!rig.left.is_enabled());
    assert!(rig.right.is_enabled());
    let cfg = rig.lss.current_config();
    assert!(!cfg.left_hand.is_enabled);
    assert!(cfg.right_hand.is_enabled);
}

#[test]
fn hand_reconfigured_mid_cycle_applies_at_cycle_end() {
    let mut rig = Rig::started();
    start_cycle(&mut rig);
    rig.hands_off();
    rig.foot.release();

    let off = SwitchBehaviorConfig {
        is_enabled: false,
        ..Default::default()
    };
    rig.lss.configure_right_hand(off).unwrap();
    assert_eq!(rig.lss.state(), StateId::EndRelease);
    assert!(rig.lss.latch_release_on(), "reconfiguring does not disturb the cycle");

    rig.run(51, 6050);
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(rig.left.is_enabled());
    assert!(!rig.right.is_enabled());
}

#[test]
fn configure_foot_sets_timing_only() {
    let mut rig = Rig::started();
    let cfg = SwitchBehaviorConfig {
        start_delay_ms: 50,
        is_enabled: true,
        void_time_ms: 2000,
    };
    rig.lss.configure_foot(cfg).unwrap();
    assert_eq!(rig.foot.timing(), (50, 2000));
    assert!(!rig.foot.is_enabled());

    let bad = SwitchBehaviorConfig {
        void_time_ms: 999,
        ..cfg
    };
    assert!(rig.lss.configure_foot(bad).is_err());
    assert_eq!(rig.foot.timing(), (50, 2000));
}

// ── Supervisory control ───────────────────────────────────────

#[test]
fn reset_mid_cycle_turns_both_outputs_off() {
    let mut rig = Rig::started();
    let journal = Journal::default();
    journal.attach(&mut rig.lss);
    start_cycle(&mut rig);
    rig.run(51, 1000);
    assert!(rig.lss.latch_release_on());

    rig.lss.reset_fda();
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(!rig.lss.latch_release_on());
    assert!(!rig.lss.production_cycle_on());
    assert!(!rig.foot.is_enabled());
    assert!(rig.left.is_enabled() && rig.right.is_enabled());
    assert_eq!(journal.count(NotifyEvent::LatchReleaseOff), 1);
    assert_eq!(journal.count(NotifyEvent::ProductionCycleOff), 1);
    assert_eq!(rig.lss.status_word() & (status::LATCH_RELEASE_ON | status::PRODUCTION_CYCLE_ON), 0);
}

#[test]
fn emergency_halts_until_reset() {
    let mut rig = Rig::started();
    start_cycle(&mut rig);

    rig.lss.trigger_emergency();
    assert_eq!(rig.lss.state(), StateId::EmergencyExceptionHandle);
    assert!(!rig.lss.latch_release_on());
    assert!(!rig.lss.production_cycle_on());
    assert!(!rig.left.is_enabled() && !rig.right.is_enabled() && !rig.foot.is_enabled());

    rig.hands_on();
    rig.foot.press();
    rig.run(51, 10_000);
    assert_eq!(rig.lss.state(), StateId::EmergencyExceptionHandle);
    assert!(!rig.lss.production_cycle_on());

    rig.lss.reset_fda();
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    assert!(rig.left.is_enabled() && rig.right.is_enabled());
}

#[test]
fn clear_status_keeps_state() {
    let mut rig = Rig::started();
    start_cycle(&mut rig);
    rig.lss.clear_status();
    assert_eq!(rig.lss.state(), StateId::EndRelease);
    assert!(!rig.lss.latch_release_on());
    assert!(!rig.lss.production_cycle_on());
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn begin_below_switch_minimum_leaves_nothing_started() {
    let mut rig = Rig::with_config(InterlockConfig::default());
    rig.foot.set_min_period(20);
    assert_eq!(
        rig.lss.begin(10),
        Err(Error::Start(StartError::PollPeriodTooShort {
            requested_ms: 10,
            min_ms: 20,
        }))
    );
    assert!(!rig.lss.is_started());
    assert!(!rig.left.is_running() && !rig.right.is_running() && !rig.foot.is_running());
    assert_eq!(rig.left.enable_calls(), 0);

    rig.hands_on();
    assert!(rig.lss.tick(0).is_empty());
    assert_eq!(rig.lss.status_word(), 0);

    rig.lss.begin(20).unwrap();
    assert_eq!(rig.lss.poll_period_ms(), Some(20));
    assert!(rig.foot.is_running());
}

#[test]
fn end_while_armed_leaves_every_switch_disabled() {
    let mut rig = Rig::started();
    rig.hands_on();
    rig.lss.tick(0);
    assert!(rig.foot.is_enabled());

    rig.lss.end();
    assert!(!rig.foot.is_enabled());
    assert!(!rig.left.is_enabled() && !rig.right.is_enabled());
    assert!(!rig.flags().foot_enabled);

    rig.foot.press();
    rig.run(1, 100);
    assert!(!rig.lss.production_cycle_on());
}

#[test]
fn restart_after_end_mid_cycle_does_not_resume() {
    let mut rig = Rig::started();
    start_cycle(&mut rig);
    rig.lss.end();
    assert!(!rig.lss.production_cycle_on());
    assert!(!rig.left.is_running());

    rig.hands_off();
    rig.foot.release();
    rig.lss.begin(10).unwrap();
    assert_eq!(rig.lss.state(), StateId::OffNotBothHands);
    rig.run(100, 200);
    assert!(!rig.lss.production_cycle_on());
}

#[test]
fn enable_commands_are_only_issued_on_change() {
    let mut rig = Rig::started();
    assert_eq!(rig.left.enable_calls(), 1);
    rig.run(0, 100);
    assert_eq!(rig.left.enable_calls(), 1);
    assert_eq!(rig.foot.disable_calls(), 0);
}
