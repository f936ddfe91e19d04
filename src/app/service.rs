//! The limb-safety switch: the hexagonal core.
//!
//! [`LimbSafetySwitch`] owns the three underlying switches, the FDA and
//! its context, and the notification registry. One [`tick`] is one
//! polling cycle:
//!
//! ```text
//!  SwitchPort ×3 ──poll──▶ snapshot ──▶ FDA ──▶ commands ──▶ SwitchPort ×3
//!                                        │
//!                                        ▼
//!                      StatusFlags ──encode──▶ StatusBoard ──▶ Notifications
//! ```
//!
//! [`tick`]: LimbSafetySwitch::tick

use std::sync::Arc;

use log::{info, warn};

use crate::config::{InterlockConfig, LimbSafetyWorkingConfig, SwitchBehaviorConfig};
use crate::error::{ConfigError, Result, StartError, SwitchId};
use crate::fsm::context::{FsmContext, Outputs, SwitchSnapshot};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, TickTrace};
use crate::notify::{NotifyEvent, Notifications, StatusBoard, TargetRef};
use crate::status::{StatusFlags, SwitchStatus};

use super::commands::SupervisorCommand;
use super::ports::{ConfigPort, SwitchPort};

// ───────────────────────────────────────────────────────────────
// LimbSafetySwitch
// ───────────────────────────────────────────────────────────────

pub struct LimbSafetySwitch<S: SwitchPort> {
    left_hand: S,
    right_hand: S,
    foot: S,
    fsm: Fsm,
    ctx: FsmContext,
    /// Hardware facts and the foot behaviour; hand behaviour and working
    /// timings live in `ctx`.
    config: InterlockConfig,
    board: Arc<StatusBoard>,
    notifications: Notifications,
    /// `Some(period)` while polling.
    poll_period_ms: Option<u32>,
}

impl<S: SwitchPort> LimbSafetySwitch<S> {
    /// Take ownership of the three switches and apply `config` to them.
    ///
    /// Does **not** start polling: call [`begin`](Self::begin) next.
    pub fn new(left_hand: S, right_hand: S, foot: S, config: InterlockConfig) -> Result<Self> {
        config.validate()?;
        let mut this = Self {
            left_hand,
            right_hand,
            foot,
            fsm: Fsm::new(build_state_table(), StateId::OffNotBothHands),
            ctx: FsmContext::new(&config),
            config: config.clone(),
            board: Arc::new(StatusBoard::new()),
            notifications: Notifications::new(),
            poll_period_ms: None,
        };
        Self::apply_timing(&mut this.left_hand, SwitchId::LeftHand, &config.left_hand)?;
        Self::apply_timing(&mut this.right_hand, SwitchId::RightHand, &config.right_hand)?;
        Self::apply_timing(&mut this.foot, SwitchId::Foot, &config.foot)?;
        Ok(this)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the switches polling and enter the initial state.
    ///
    /// Fails without side effects if the period is below what the
    /// switches can feed; a switch refusing to start stops the ones
    /// already started.
    pub fn begin(&mut self, poll_period_ms: u32) -> Result<()> {
        if self.poll_period_ms.is_some() {
            return Err(StartError::AlreadyStarted.into());
        }
        let min_ms = self
            .left_hand
            .min_poll_period_ms()
            .max(self.right_hand.min_poll_period_ms())
            .max(self.foot.min_poll_period_ms());
        if poll_period_ms < min_ms {
            warn!("LSS: poll period {poll_period_ms} ms rejected, minimum {min_ms} ms");
            return Err(StartError::PollPeriodTooShort {
                requested_ms: poll_period_ms,
                min_ms,
            }
            .into());
        }

        if !self.left_hand.begin(poll_period_ms) {
            return Err(StartError::SwitchBeginFailed(SwitchId::LeftHand).into());
        }
        if !self.right_hand.begin(poll_period_ms) {
            self.left_hand.end();
            return Err(StartError::SwitchBeginFailed(SwitchId::RightHand).into());
        }
        if !self.foot.begin(poll_period_ms) {
            self.left_hand.end();
            self.right_hand.end();
            return Err(StartError::SwitchBeginFailed(SwitchId::Foot).into());
        }

        self.poll_period_ms = Some(poll_period_ms);
        // A restart after `end` mid-cycle must not resume the old cycle.
        if self.fsm.current_state() == StateId::OffNotBothHands {
            self.fsm.start(&mut self.ctx);
        } else {
            self.fsm.reset_to(StateId::OffNotBothHands, &mut self.ctx);
        }
        self.apply_commands();
        self.ctx.mark_dirty();
        self.flush();
        info!("LSS: polling every {poll_period_ms} ms");
        Ok(())
    }

    /// Stop polling. Outputs are forced off and every switch is disabled;
    /// the next [`begin`](Self::begin) re-enables the hands.
    pub fn end(&mut self) {
        if self.poll_period_ms.take().is_none() {
            return;
        }
        Self::apply_enable(&mut self.left_hand, Some(false));
        Self::apply_enable(&mut self.right_hand, Some(false));
        Self::apply_enable(&mut self.foot, Some(false));
        self.left_hand.end();
        self.right_hand.end();
        self.foot.end();
        self.ctx.clear_status();
        self.flush();
        info!("LSS: polling stopped");
    }

    pub fn is_started(&self) -> bool {
        self.poll_period_ms.is_some()
    }

    pub fn poll_period_ms(&self) -> Option<u32> {
        self.poll_period_ms
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one polling cycle at `now_ms`: poll → snapshot → FDA →
    /// switch commands → publish and notify if anything changed.
    ///
    /// Returns the transitions committed this tick. A no-op before
    /// [`begin`](Self::begin).
    pub fn tick(&mut self, now_ms: u32) -> TickTrace {
        if self.poll_period_ms.is_none() {
            return TickTrace::new();
        }

        // 1. Refresh the underlying switches
        self.left_hand.poll(now_ms);
        self.right_hand.poll(now_ms);
        self.foot.poll(now_ms);

        // 2. Stable view for this tick
        self.ctx.now_ms = now_ms;
        self.ctx.switches = self.snapshot();
        self.track_foot_press();

        // 3. FDA
        let trace = self.fsm.tick(&mut self.ctx);

        // 4. Enable/disable choreography
        self.apply_commands();

        // 5. Publish
        self.flush();
        trace
    }

    // ── Supervisory operations ────────────────────────────────

    /// Abort in place: back to `OffNotBothHands` with both outputs off.
    /// Safe from any state, including mid-cycle and emergency.
    pub fn reset_fda(&mut self) {
        info!("LSS: reset from {}", self.fsm.state_name());
        self.fsm.reset_to(StateId::OffNotBothHands, &mut self.ctx);
        self.apply_commands();
        self.flush();
    }

    /// Supervisory fault signal. Only [`reset_fda`](Self::reset_fda) recovers.
    pub fn trigger_emergency(&mut self) {
        self.fsm
            .force_transition(StateId::EmergencyExceptionHandle, &mut self.ctx);
        self.apply_commands();
        self.flush();
    }

    /// Both outputs off and pending foot press dropped; state unchanged.
    pub fn clear_status(&mut self) {
        self.ctx.clear_status();
        self.flush();
    }

    pub fn configure_left_hand(&mut self, cfg: SwitchBehaviorConfig) -> Result<()> {
        self.configure_hand(SwitchId::LeftHand, cfg)
    }

    pub fn configure_right_hand(&mut self, cfg: SwitchBehaviorConfig) -> Result<()> {
        self.configure_hand(SwitchId::RightHand, cfg)
    }

    /// Start delay and void time only; the FDA owns foot enablement.
    pub fn configure_foot(&mut self, cfg: SwitchBehaviorConfig) -> Result<()> {
        cfg.validate().inspect_err(|e| warn!("LSS: foot config rejected: {e}"))?;
        Self::apply_timing(&mut self.foot, SwitchId::Foot, &cfg)?;
        self.config.foot = cfg;
        Ok(())
    }

    /// Rejects zero and values above the production cycle time.
    pub fn set_latch_release_total_ms(&mut self, ms: u32) -> Result<()> {
        self.ctx
            .working
            .set_latch_release_total_ms(ms)
            .inspect_err(|e| warn!("LSS: latch release {ms} ms rejected: {e}"))?;
        Ok(())
    }

    /// Rejects zero and values below the latch release time.
    pub fn set_production_cycle_total_ms(&mut self, ms: u32) -> Result<()> {
        self.ctx
            .working
            .set_production_cycle_total_ms(ms)
            .inspect_err(|e| warn!("LSS: production cycle {ms} ms rejected: {e}"))?;
        Ok(())
    }

    /// Route a supervisory command to the matching operation.
    pub fn handle_command(&mut self, cmd: SupervisorCommand) -> Result<()> {
        match cmd {
            SupervisorCommand::ResetFda => self.reset_fda(),
            SupervisorCommand::TriggerEmergency => self.trigger_emergency(),
            SupervisorCommand::ClearStatus => self.clear_status(),
            SupervisorCommand::ConfigureLeftHand(cfg) => self.configure_left_hand(cfg)?,
            SupervisorCommand::ConfigureRightHand(cfg) => self.configure_right_hand(cfg)?,
            SupervisorCommand::ConfigureFoot(cfg) => self.configure_foot(cfg)?,
            SupervisorCommand::SetLatchReleaseTotal(ms) => self.set_latch_release_total_ms(ms)?,
            SupervisorCommand::SetProductionCycleTotal(ms) => {
                self.set_production_cycle_total_ms(ms)?
            }
        }
        Ok(())
    }

    // ── Notification targets ──────────────────────────────────

    /// Install (or clear with `None`) the target for `event`. The previous
    /// target is retired first and returned.
    pub fn set_target(&mut self, event: NotifyEvent, target: Option<TargetRef>) -> Option<TargetRef> {
        self.notifications.set_target(event, target)
    }

    /// General "outputs changed" target.
    pub fn set_task_to_notify(&mut self, target: Option<TargetRef>) -> Option<TargetRef> {
        self.set_target(NotifyEvent::OutputsChanged, target)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Last published status word.
    pub fn status_word(&self) -> u32 {
        self.board.word()
    }

    /// Live flags read from the switches and outputs now.
    pub fn status_flags(&self) -> StatusFlags {
        let out = self.ctx.outputs();
        StatusFlags {
            left_hand: Self::status_of(&self.left_hand),
            right_hand: Self::status_of(&self.right_hand),
            foot_enabled: self.foot.is_enabled(),
            foot_on: self.foot.is_on(),
            latch_release_on: out.latch_release_on,
            production_cycle_on: out.production_cycle_on,
        }
    }

    pub fn outputs(&self) -> Outputs {
        self.ctx.outputs()
    }

    pub fn latch_release_on(&self) -> bool {
        self.ctx.outputs().latch_release_on
    }

    pub fn production_cycle_on(&self) -> bool {
        self.ctx.outputs().production_cycle_on
    }

    pub fn outputs_changed(&self) -> bool {
        self.board.outputs_changed()
    }

    /// Clear every pending output change. Returns whether any existed.
    pub fn consume_outputs_changed(&self) -> bool {
        self.board.notifier().consume()
    }

    /// Both hand switches currently report on.
    pub fn both_hands_ok(&self) -> bool {
        self.left_hand.is_on() && self.right_hand.is_on()
    }

    /// Shared handle for lock-free readers.
    pub fn board(&self) -> Arc<StatusBoard> {
        self.board.clone()
    }

    pub fn working_config(&self) -> LimbSafetyWorkingConfig {
        self.ctx.working
    }

    /// Full live configuration, as it would be persisted.
    pub fn current_config(&self) -> InterlockConfig {
        InterlockConfig {
            left_hand: self.ctx.left_hand,
            right_hand: self.ctx.right_hand,
            working: self.ctx.working,
            poll_period_ms: self.poll_period_ms.unwrap_or(self.config.poll_period_ms),
            ..self.config.clone()
        }
    }

    pub fn save_config(&self, storage: &impl ConfigPort) -> Result<()> {
        storage.save(&self.current_config())?;
        info!("LSS: config saved");
        Ok(())
    }

    pub fn left_hand(&self) -> &S {
        &self.left_hand
    }

    pub fn right_hand(&self) -> &S {
        &self.right_hand
    }

    pub fn foot(&self) -> &S {
        &self.foot
    }

    // ── Internal ──────────────────────────────────────────────

    fn status_of(sw: &S) -> SwitchStatus {
        SwitchStatus {
            is_on: sw.is_on(),
            is_enabled: sw.is_enabled(),
            is_voided: sw.is_voided(),
        }
    }

    fn snapshot(&self) -> SwitchSnapshot {
        SwitchSnapshot {
            left_hand: Self::status_of(&self.left_hand),
            right_hand: Self::status_of(&self.right_hand),
            foot: Self::status_of(&self.foot),
        }
    }

    /// Latch a foot press only if the foot was seen released while
    /// enabled since this arming; a foot held through arming never fires.
    fn track_foot_press(&mut self) {
        let foot = self.ctx.switches.foot;
        if !foot.is_enabled {
            return;
        }
        if !foot.is_on {
            self.ctx.foot_released_since_armed = true;
        } else if !foot.is_voided && self.ctx.foot_released_since_armed {
            self.ctx.foot_press_pending = true;
        }
    }

    fn apply_commands(&mut self) {
        let cmds = self.ctx.take_commands();
        Self::apply_enable(&mut self.left_hand, cmds.left_hand);
        Self::apply_enable(&mut self.right_hand, cmds.right_hand);
        Self::apply_enable(&mut self.foot, cmds.foot);
    }

    fn apply_enable(sw: &mut S, cmd: Option<bool>) {
        match cmd {
            Some(true) if !sw.is_enabled() => sw.enable(),
            Some(false) if sw.is_enabled() => sw.disable(),
            _ => {}
        }
    }

    /// Void time first, so a rejected value leaves the switch untouched.
    fn apply_timing(sw: &mut S, id: SwitchId, cfg: &SwitchBehaviorConfig) -> Result<()> {
        if !sw.set_void_time(cfg.void_time_ms) {
            return Err(ConfigError::RejectedBySwitch(id).into());
        }
        sw.set_start_delay(cfg.start_delay_ms);
        Ok(())
    }

    fn configure_hand(&mut self, id: SwitchId, cfg: SwitchBehaviorConfig) -> Result<()> {
        cfg.validate()
            .inspect_err(|e| warn!("LSS: {id} config rejected: {e}"))?;
        let sw = match id {
            SwitchId::LeftHand => &mut self.left_hand,
            _ => &mut self.right_hand,
        };
        Self::apply_timing(sw, id, &cfg)?;

        match id {
            SwitchId::LeftHand => {
                self.ctx.left_hand = cfg;
                self.ctx.saved_hands_enabled.0 = cfg.is_enabled;
            }
            _ => {
                self.ctx.right_hand = cfg;
                self.ctx.saved_hands_enabled.1 = cfg.is_enabled;
            }
        }

        // While cycling or halted the enablement waits for the next
        // entry into the initial state.
        let state = self.fsm.current_state();
        if self.is_started() && !state.is_cycling() && state != StateId::EmergencyExceptionHandle {
            self.ctx.command(id, cfg.is_enabled);
            self.apply_commands();
            self.flush();
        }
        info!("LSS: {id} reconfigured, enabled={}", cfg.is_enabled);
        Ok(())
    }

    /// Publish the word and notify targets if anything changed.
    ///
    /// The change counter is consumed once the general target has been
    /// woken; with none registered it stays pending for lock-free readers.
    fn flush(&mut self) {
        let word = self.status_flags().encode();
        let events = self.ctx.take_events();
        let dirty = self.ctx.take_dirty();
        let output_changes = self.ctx.take_output_changes();
        if !dirty && events == 0 && word == self.board.word() {
            return;
        }

        // Word is committed before the counter moves.
        self.board.publish(word, &output_changes);
        self.notifications
            .dispatch(events | NotifyEvent::OutputsChanged.mask(), word);
        if self.notifications.target(NotifyEvent::OutputsChanged).is_some() {
            self.board.notifier().consume();
        }
    }
}
