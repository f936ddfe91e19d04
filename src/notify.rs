//! Change notification: the race-safe "outputs changed" flag, the
//! published status word, and the per-event notification targets.
//!
//! ```text
//!  Poll task (single writer)              Consumer tasks
//!  ┌───────────────────────┐  publish()  ┌──────────────────────────┐
//!  │ LimbSafetySwitch.tick │────────────▶│ StatusBoard (atomics)    │◀── word(), outputs_changed()
//!  └──────────┬────────────┘             └──────────────────────────┘
//!             │ dispatch()
//!             ▼
//!  ┌───────────────────────────────────────────────────────┐
//!  │ Notifications: one optional NotifyTarget per event    │──▶ Signal / callback / log
//!  └───────────────────────────────────────────────────────┘
//! ```
//!
//! The change flag is a saturating counter rather than a boolean so that
//! a "set" and a "clear" interleaved around a flush cannot erase a change
//! that is still pending.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

// ---------------------------------------------------------------------------
// Change notifier
// ---------------------------------------------------------------------------

/// Counter-backed `outputsChanged` flag.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    pending: AtomicU32,
}

impl ChangeNotifier {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
        }
    }

    /// `true` increments the counter, `false` decrements it (floored at 0).
    pub fn set(&self, changed: bool) {
        let step = |n: u32| {
            Some(if changed {
                n.saturating_add(1)
            } else {
                n.saturating_sub(1)
            })
        };
        // The closure never returns None, so the update cannot fail.
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, step);
    }

    pub fn is_changed(&self) -> bool {
        self.pending.load(Ordering::Acquire) > 0
    }

    /// Atomically clear every pending change. Returns whether any existed.
    pub fn consume(&self) -> bool {
        self.pending.swap(0, Ordering::AcqRel) > 0
    }
}

// ---------------------------------------------------------------------------
// Published status
// ---------------------------------------------------------------------------

/// Lock-free view of the interlock for asynchronous readers.
///
/// The word is stored before the change counter moves, so a reader
/// that observes `outputs_changed()` always reads the complete word of
/// the tick that set it.
#[derive(Debug, Default)]
pub struct StatusBoard {
    word: AtomicU32,
    changes: ChangeNotifier,
}

impl StatusBoard {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
            changes: ChangeNotifier::new(),
        }
    }

    /// Commit a new word, then replay the output switches that produced
    /// it onto the change counter: `true` for on, `false` for off.
    pub fn publish(&self, word: u32, output_changes: &[bool]) {
        self.word.store(word, Ordering::Release);
        for &on in output_changes {
            self.changes.set(on);
        }
    }

    /// Latest committed status word.
    pub fn word(&self) -> u32 {
        self.word.load(Ordering::Acquire)
    }

    pub fn outputs_changed(&self) -> bool {
        self.changes.is_changed()
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.changes
    }
}

// ---------------------------------------------------------------------------
// Events and targets
// ---------------------------------------------------------------------------

/// Distinguishable notification events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NotifyEvent {
    /// Any output-relevant change (the general "task to notify").
    OutputsChanged = 0,
    LatchReleaseOn = 1,
    LatchReleaseOff = 2,
    ProductionCycleOn = 3,
    ProductionCycleOff = 4,
    /// The armed window closed without a foot press.
    BothHandsMissed = 5,
}

impl NotifyEvent {
    pub const COUNT: usize = 6;

    /// Dispatch order: specific events first, the general change last.
    pub const DISPATCH_ORDER: [NotifyEvent; Self::COUNT] = [
        Self::LatchReleaseOn,
        Self::LatchReleaseOff,
        Self::ProductionCycleOn,
        Self::ProductionCycleOff,
        Self::BothHandsMissed,
        Self::OutputsChanged,
    ];

    /// Bit of this event in a pending-event mask.
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// Something that can be woken with the current status word.
pub trait NotifyTarget: Send + Sync {
    fn notify(&self, word: u32);

    /// Called once when the target is replaced or cleared.
    fn retire(&self) {}
}

/// Task wake-up with overwrite semantics: a waiting task sees the latest word.
impl NotifyTarget for Signal<CriticalSectionRawMutex, u32> {
    fn notify(&self, word: u32) {
        self.signal(word);
    }

    fn retire(&self) {
        self.reset();
    }
}

/// Closure callback target.
pub struct FnTarget<F>(pub F);

impl<F> NotifyTarget for FnTarget<F>
where
    F: Fn(u32) + Send + Sync,
{
    fn notify(&self, word: u32) {
        (self.0)(word);
    }
}

/// Shared handle to a registered target.
pub type TargetRef = Arc<dyn NotifyTarget>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One optional target per [`NotifyEvent`].
#[derive(Default)]
pub struct Notifications {
    targets: [Option<TargetRef>; NotifyEvent::COUNT],
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `target` for `event` (or clear it with `None`).
    ///
    /// The previous target is retired before the new one is installed
    /// and handed back to the caller.
    pub fn set_target(&mut self, event: NotifyEvent, target: Option<TargetRef>) -> Option<TargetRef> {
        let slot = &mut self.targets[event as usize];
        let previous = slot.take();
        if let Some(prev) = &previous {
            prev.retire();
        }
        *slot = target;
        previous
    }

    pub fn target(&self, event: NotifyEvent) -> Option<&TargetRef> {
        self.targets[event as usize].as_ref()
    }

    /// Notify every registered target whose event bit is set in `events`.
    /// Returns the number of targets notified.
    pub fn dispatch(&self, events: u8, word: u32) -> usize {
        let mut notified = 0;
        for event in NotifyEvent::DISPATCH_ORDER {
            if events & event.mask() == 0 {
                continue;
            }
            if let Some(target) = self.target(event) {
                target.notify(word);
                notified += 1;
            }
        }
        notified
    }
}
