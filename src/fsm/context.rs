//! Shared mutable context threaded through every FDA handler.
//!
//! `FsmContext` is the blackboard the state handlers read from and
//! write to: the per-tick switch snapshot, the two timed outputs, the
//! enable/disable commands for the underlying switches, the working
//! timings, the pending-event mask, and the ordered output switches the
//! notifier replays onto its change counter.

use heapless::Vec;

use crate::config::{InterlockConfig, LimbSafetyWorkingConfig, SwitchBehaviorConfig};
use crate::error::SwitchId;
use crate::notify::NotifyEvent;
use crate::status::SwitchStatus;

// ---------------------------------------------------------------------------
// Switch snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// Status triples of the three switches, copied once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchSnapshot {
    pub left_hand: SwitchStatus,
    pub right_hand: SwitchStatus,
    pub foot: SwitchStatus,
}

impl SwitchSnapshot {
    pub fn both_hands_on(&self) -> bool {
        self.left_hand.is_on && self.right_hand.is_on
    }

    pub fn get(&self, id: SwitchId) -> SwitchStatus {
        match id {
            SwitchId::LeftHand => self.left_hand,
            SwitchId::RightHand => self.right_hand,
            SwitchId::Foot => self.foot,
        }
    }
}

// ---------------------------------------------------------------------------
// Switch commands (written by state handlers; applied after the tick)
// ---------------------------------------------------------------------------

/// Enablement requests for the underlying switches.
/// `None` leaves the switch untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchCommands {
    pub left_hand: Option<bool>,
    pub right_hand: Option<bool>,
    pub foot: Option<bool>,
}

impl SwitchCommands {
    fn slot(&mut self, id: SwitchId) -> &mut Option<bool> {
        match id {
            SwitchId::LeftHand => &mut self.left_hand,
            SwitchId::RightHand => &mut self.right_hand,
            SwitchId::Foot => &mut self.foot,
        }
    }

    pub fn get(&self, id: SwitchId) -> Option<bool> {
        match id {
            SwitchId::LeftHand => self.left_hand,
            SwitchId::RightHand => self.right_hand,
            SwitchId::Foot => self.foot,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left_hand.is_none() && self.right_hand.is_none() && self.foot.is_none()
    }
}

/// The two timed activation outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outputs {
    pub latch_release_on: bool,
    pub production_cycle_on: bool,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Milliseconds since boot at the current tick.
    pub now_ms: u32,
    /// Instant the current production cycle started.
    pub cycle_start_ms: u32,

    // -- Inputs --
    pub switches: SwitchSnapshot,
    /// Edge-triggered: a foot press accepted while armed, not yet consumed.
    pub foot_press_pending: bool,
    /// The foot was seen released while enabled since the current arming.
    pub foot_released_since_armed: bool,

    // -- Outputs --
    outputs: Outputs,
    /// Enablement requests collected during the tick.
    pub commands: SwitchCommands,

    // -- Configuration --
    pub working: LimbSafetyWorkingConfig,
    pub left_hand: SwitchBehaviorConfig,
    pub right_hand: SwitchBehaviorConfig,

    /// Hand enablement saved when a cycle is armed, restored at its end.
    pub saved_hands_enabled: (bool, bool),

    // -- Change tracking --
    dirty: bool,
    events: u8,
    /// `true` per output switched on, `false` per output switched off,
    /// in order. Taken at every flush.
    output_changes: Vec<bool, 8>,
}

impl FsmContext {
    pub fn new(config: &InterlockConfig) -> Self {
        Self {
            now_ms: 0,
            cycle_start_ms: 0,
            switches: SwitchSnapshot::default(),
            foot_press_pending: false,
            foot_released_since_armed: false,
            outputs: Outputs::default(),
            commands: SwitchCommands::default(),
            working: config.working,
            left_hand: config.left_hand,
            right_hand: config.right_hand,
            saved_hands_enabled: (config.left_hand.is_enabled, config.right_hand.is_enabled),
            dirty: false,
            events: 0,
            output_changes: Vec::new(),
        }
    }

    pub fn outputs(&self) -> Outputs {
        self.outputs
    }

    /// Milliseconds since the cycle started (wrap-safe).
    pub fn cycle_elapsed_ms(&self) -> u32 {
        self.now_ms.wrapping_sub(self.cycle_start_ms)
    }

    pub fn set_latch_release(&mut self, on: bool) {
        if self.outputs.latch_release_on != on {
            self.outputs.latch_release_on = on;
            self.record_output_change(on);
            self.raise(if on {
                NotifyEvent::LatchReleaseOn
            } else {
                NotifyEvent::LatchReleaseOff
            });
        }
    }

    pub fn set_production_cycle(&mut self, on: bool) {
        if self.outputs.production_cycle_on != on {
            self.outputs.production_cycle_on = on;
            self.record_output_change(on);
            self.raise(if on {
                NotifyEvent::ProductionCycleOn
            } else {
                NotifyEvent::ProductionCycleOff
            });
        }
    }

    /// Both outputs off, pending foot press dropped. FDA state untouched.
    pub fn clear_status(&mut self) {
        self.set_latch_release(false);
        self.set_production_cycle(false);
        self.foot_press_pending = false;
    }

    /// Request an enablement change, applied after the tick.
    pub fn command(&mut self, id: SwitchId, enabled: bool) {
        *self.commands.slot(id) = Some(enabled);
        self.dirty = true;
    }

    /// Enablement the switch will have once this tick's commands apply.
    pub fn effective_enabled(&self, id: SwitchId) -> bool {
        self.commands
            .get(id)
            .unwrap_or(self.switches.get(id).is_enabled)
    }

    /// A hand counts as held when it is configured out of the interlock,
    /// or when it is enabled and on in this tick's snapshot. A hand the
    /// FDA disabled itself never counts, whatever it reports.
    pub fn hand_committed(&self, id: SwitchId) -> bool {
        let configured = match id {
            SwitchId::LeftHand => self.left_hand.is_enabled,
            SwitchId::RightHand => self.right_hand.is_enabled,
            SwitchId::Foot => return false,
        };
        let sw = self.switches.get(id);
        !configured || (sw.is_enabled && sw.is_on)
    }

    pub fn hands_committed(&self) -> bool {
        self.hand_committed(SwitchId::LeftHand) && self.hand_committed(SwitchId::RightHand)
    }

    pub fn take_commands(&mut self) -> SwitchCommands {
        core::mem::take(&mut self.commands)
    }

    /// Record an event for dispatch at the end of the tick.
    pub fn raise(&mut self, event: NotifyEvent) {
        self.events |= event.mask();
        self.dirty = true;
    }

    pub fn has_event(&self, event: NotifyEvent) -> bool {
        self.events & event.mask() != 0
    }

    pub fn take_events(&mut self) -> u8 {
        core::mem::take(&mut self.events)
    }

    pub fn take_output_changes(&mut self) -> Vec<bool, 8> {
        core::mem::take(&mut self.output_changes)
    }

    fn record_output_change(&mut self, on: bool) {
        // A flush sees at most one switch per output; overflow drops the newest.
        let _ = self.output_changes.push(on);
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.dirty)
    }
}
