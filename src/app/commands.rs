//! Supervisory commands to the interlock.
//!
//! These are the actions the outside world (a supervisor task, a fault
//! monitor, a maintenance console) may request. The
//! [`LimbSafetySwitch`](super::service::LimbSafetySwitch) applies them
//! between ticks.

use crate::config::SwitchBehaviorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCommand {
    /// Abort in place and return to the initial state.
    ResetFda,

    /// External fault signal: outputs off, all switches disabled, no
    /// automatic recovery.
    TriggerEmergency,

    /// Both outputs off, pending foot press dropped.
    ClearStatus,

    ConfigureLeftHand(SwitchBehaviorConfig),
    ConfigureRightHand(SwitchBehaviorConfig),
    /// Start delay and void time only; the FDA owns foot enablement.
    ConfigureFoot(SwitchBehaviorConfig),

    SetLatchReleaseTotal(u32),
    SetProductionCycleTotal(u32),
}
