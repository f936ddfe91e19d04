//! Concrete FDA state handlers and table builder.
//!
//! Each state is three plain `fn` pointers over [`FsmContext`]; no
//! closures, no dynamic dispatch, no heap.
//!
//! ```text
//!  OFF_NOT_BOTH_HANDS ──[both hands on]──▶ OFF_BOTH_HANDS_NOT_FOOT
//!          ▲    ▲                               │        │
//!          │    └────[a hand released]──────────┘   [foot press]
//!          │          (BothHandsMissed)                  ▼
//!          │                                START_RELEASE_START_CYCLE
//!          │                                             │ (same tick)
//!    [cycle time]                                        ▼
//!          │                                        END_RELEASE
//!          └──────────────── END_CYCLE ◀──[release time]─┘
//!
//!  supervisory fault ──▶ EMERGENCY ──[reset_fda only]──▶ OFF_NOT_BOTH_HANDS
//! ```

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::error::SwitchId;
use crate::notify::NotifyEvent;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at construction.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0
        StateDescriptor {
            id: StateId::OffNotBothHands,
            name: "OffNotBothHands",
            on_enter: Some(off_not_both_hands_enter),
            on_exit: Some(off_not_both_hands_exit),
            on_update: off_not_both_hands_update,
        },
        // Index 1
        StateDescriptor {
            id: StateId::OffBothHandsNotFoot,
            name: "OffBothHandsNotFoot",
            on_enter: None,
            on_exit: Some(off_both_hands_not_foot_exit),
            on_update: off_both_hands_not_foot_update,
        },
        // Index 2
        StateDescriptor {
            id: StateId::StartReleaseStartCycle,
            name: "StartReleaseStartCycle",
            on_enter: Some(start_cycle_enter),
            on_exit: Some(start_cycle_exit),
            on_update: start_cycle_update,
        },
        // Index 3
        StateDescriptor {
            id: StateId::EndRelease,
            name: "EndRelease",
            on_enter: None,
            on_exit: Some(end_release_exit),
            on_update: end_release_update,
        },
        // Index 4
        StateDescriptor {
            id: StateId::EndCycle,
            name: "EndCycle",
            on_enter: None,
            on_exit: Some(end_cycle_exit),
            on_update: end_cycle_update,
        },
        // Index 5
        StateDescriptor {
            id: StateId::EmergencyExceptionHandle,
            name: "EmergencyExceptionHandle",
            on_enter: Some(emergency_enter),
            on_exit: None,
            on_update: emergency_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF, NOT BOTH HANDS: initial state, waiting for both hands
// ═══════════════════════════════════════════════════════════════════════════

fn off_not_both_hands_enter(ctx: &mut FsmContext) {
    ctx.clear_status();
    ctx.command(SwitchId::LeftHand, ctx.left_hand.is_enabled);
    ctx.command(SwitchId::RightHand, ctx.right_hand.is_enabled);
    ctx.command(SwitchId::Foot, false);
}

fn off_not_both_hands_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.hands_committed() {
        return Some(StateId::OffBothHandsNotFoot);
    }
    None
}

fn off_not_both_hands_exit(ctx: &mut FsmContext) {
    ctx.foot_press_pending = false;
    ctx.foot_released_since_armed = false;
    ctx.command(SwitchId::Foot, true);
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF, BOTH HANDS, NOT FOOT: armed, the only state with the foot enabled
// ═══════════════════════════════════════════════════════════════════════════

fn off_both_hands_not_foot_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.hands_committed() {
        warn!("FDA: both hands dropped before the foot switch, cycle missed");
        ctx.raise(NotifyEvent::BothHandsMissed);
        return Some(StateId::OffNotBothHands);
    }
    if ctx.foot_press_pending {
        info!("FDA: foot press accepted at {} ms", ctx.now_ms);
        return Some(StateId::StartReleaseStartCycle);
    }
    None
}

fn off_both_hands_not_foot_exit(ctx: &mut FsmContext) {
    ctx.command(SwitchId::Foot, false);
}

// ═══════════════════════════════════════════════════════════════════════════
//  START RELEASE, START CYCLE: passes through within the arming tick
// ═══════════════════════════════════════════════════════════════════════════

fn start_cycle_enter(ctx: &mut FsmContext) {
    ctx.cycle_start_ms = ctx.now_ms;
    ctx.foot_press_pending = false;
    ctx.saved_hands_enabled = (
        ctx.effective_enabled(SwitchId::LeftHand),
        ctx.effective_enabled(SwitchId::RightHand),
    );
    ctx.command(SwitchId::LeftHand, false);
    ctx.command(SwitchId::RightHand, false);
}

fn start_cycle_update(_ctx: &mut FsmContext) -> Option<StateId> {
    Some(StateId::EndRelease)
}

fn start_cycle_exit(ctx: &mut FsmContext) {
    ctx.set_latch_release(true);
    ctx.set_production_cycle(true);
    info!(
        "FDA: latch release {} ms, production cycle {} ms",
        ctx.working.latch_release_total_ms(),
        ctx.working.production_cycle_total_ms()
    );
}

// ═══════════════════════════════════════════════════════════════════════════
//  END RELEASE: latch release asserted
// ═══════════════════════════════════════════════════════════════════════════

fn end_release_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.cycle_elapsed_ms() >= ctx.working.latch_release_total_ms() {
        return Some(StateId::EndCycle);
    }
    None
}

fn end_release_exit(ctx: &mut FsmContext) {
    ctx.set_latch_release(false);
}

// ═══════════════════════════════════════════════════════════════════════════
//  END CYCLE: production cycle still running, latch released
// ═══════════════════════════════════════════════════════════════════════════

fn end_cycle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.cycle_elapsed_ms() >= ctx.working.production_cycle_total_ms() {
        return Some(StateId::OffNotBothHands);
    }
    None
}

fn end_cycle_exit(ctx: &mut FsmContext) {
    ctx.set_production_cycle(false);
    let (left, right) = ctx.saved_hands_enabled;
    ctx.command(SwitchId::LeftHand, left);
    ctx.command(SwitchId::RightHand, right);
    info!("FDA: production cycle complete");
}

// ═══════════════════════════════════════════════════════════════════════════
//  EMERGENCY: everything off, left only through reset_fda
// ═══════════════════════════════════════════════════════════════════════════

fn emergency_enter(ctx: &mut FsmContext) {
    ctx.clear_status();
    ctx.command(SwitchId::LeftHand, false);
    ctx.command(SwitchId::RightHand, false);
    ctx.command(SwitchId::Foot, false);
    warn!("FDA: emergency, outputs off and all switches disabled");
}

fn emergency_update(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}
