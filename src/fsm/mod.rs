//! Function-pointer finite state machine engine for the interlock FDA.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                        │
//! │  ┌──────────────────────────┬──────────┬─────────┬───────────────┐ │
//! │  │ StateId                  │ on_enter │ on_exit │ on_update     │ │
//! │  ├──────────────────────────┼──────────┼─────────┼───────────────┤ │
//! │  │ OffNotBothHands          │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  │ OffBothHandsNotFoot      │    -     │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  │ StartReleaseStartCycle   │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  │ EndRelease               │    -     │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  │ EndCycle                 │    -     │ fn(ctx) │ fn(ctx)->Opt  │ │
//! │  │ EmergencyExceptionHandle │ fn(ctx)  │    -    │ fn(ctx)->Opt  │ │
//! │  └──────────────────────────┴──────────┴─────────┴───────────────┘ │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the current state. If it
//! returns `Some(next)`, the engine runs `on_exit` for the current state,
//! then `on_enter` for the next, and evaluates the new state again in the
//! same tick. The loop stops at the first state that stays put, so an
//! unconditional transition commits both states' effects before the tick
//! yields.

pub mod context;
pub mod states;

use context::FsmContext;
use heapless::Vec;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every FDA state.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    OffNotBothHands = 0,
    OffBothHandsNotFoot = 1,
    StartReleaseStartCycle = 2,
    EndRelease = 3,
    EndCycle = 4,
    EmergencyExceptionHandle = 5,
}

impl StateId {
    pub const COUNT: usize = 6;

    /// Convert an index back to `StateId`. An out-of-range index is a
    /// programming error: it asserts in debug builds and lands in the
    /// emergency state in release builds.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::OffNotBothHands,
            1 => Self::OffBothHandsNotFoot,
            2 => Self::StartReleaseStartCycle,
            3 => Self::EndRelease,
            4 => Self::EndCycle,
            5 => Self::EmergencyExceptionHandle,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::EmergencyExceptionHandle
            }
        }
    }

    /// States in which a production cycle is in flight.
    pub fn is_cycling(self) -> bool {
        matches!(
            self,
            Self::StartReleaseStartCycle | Self::EndRelease | Self::EndCycle
        )
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` action, run once per transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick update. `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// One committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
}

/// Transitions committed during a single tick.
pub type TickTrace = Vec<Transition, { StateId::COUNT }>;

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter`. Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FDA: starting in state {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FDA by one tick, evaluating until a state stays put.
    ///
    /// Bounded by the number of states so a table bug cannot spin.
    pub fn tick(&mut self, ctx: &mut FsmContext) -> TickTrace {
        let mut trace = TickTrace::new();

        for _ in 0..StateId::COUNT {
            let Some(next) = (self.table[self.current].on_update)(ctx) else {
                break;
            };
            let from = self.current_state();
            self.transition(next, ctx);
            // Capacity equals the loop bound.
            let _ = trace.push(Transition { from, to: next });
        }
        trace
    }

    /// Transition immediately, regardless of what `on_update` would say.
    /// No-op when already in `next`.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// Abort in place: jump to `state` and re-run its entry actions
    /// without running the current state's exit actions.
    pub fn reset_to(&mut self, state: StateId, ctx: &mut FsmContext) {
        info!(
            "FDA reset: {} -> {}",
            self.table[self.current].name,
            self.table[state as usize].name
        );
        self.current = state as usize;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        self.table[self.current].id
    }

    pub fn state_name(&self) -> &'static str {
        self.table[self.current].name
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FDA transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        ctx.mark_dirty();

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
