//! Poll driver: the periodic single writer of the interlock.
//!
//! ```text
//!   poll task ──lock──▶ LimbSafetySwitch::tick(now) ──▶ StatusBoard ──▶ readers
//!   supervisor ──lock──▶ reset_fda / configure_* / set_target
//! ```
//!
//! The switch lives in a critical-section mutex. Every lock is short and
//! never blocks, so a supervisor call lands between two ticks and never
//! observes or causes a half-applied tick. Notification targets run
//! inside the tick's critical section and must not block.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::info;

use crate::app::ports::{ClockPort, SwitchPort};
use crate::app::service::LimbSafetySwitch;
use crate::drivers::task_pin::{self, Core, TaskSpec};
use crate::fsm::TickTrace;
use crate::notify::StatusBoard;

/// Name of the poll task.
pub const POLL_TASK_NAME: &str = "lmbSftySwtch-01\0";

/// Default placement: application core, above ordinary tasks.
pub const POLL_TASK: TaskSpec = TaskSpec {
    name: POLL_TASK_NAME,
    core: Core::App,
    priority: 10,
    stack_kb: 8,
};

type Shared<S> = Mutex<CriticalSectionRawMutex, RefCell<LimbSafetySwitch<S>>>;

/// Cloneable handle to the interlock shared between tasks.
pub struct PollDriver<S: SwitchPort> {
    shared: Arc<Shared<S>>,
    board: Arc<StatusBoard>,
}

impl<S: SwitchPort> Clone for PollDriver<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            board: self.board.clone(),
        }
    }
}

impl<S: SwitchPort> PollDriver<S> {
    pub fn new(lss: LimbSafetySwitch<S>) -> Self {
        let board = lss.board();
        Self {
            shared: Arc::new(Mutex::new(RefCell::new(lss))),
            board,
        }
    }

    /// Run `f` with exclusive access to the switch.
    pub fn with<R>(&self, f: impl FnOnce(&mut LimbSafetySwitch<S>) -> R) -> R {
        self.shared.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// One polling cycle.
    pub fn tick(&self, now_ms: u32) -> TickTrace {
        self.with(|lss| lss.tick(now_ms))
    }

    /// Lock-free status for readers that must not contend with the tick.
    pub fn board(&self) -> &Arc<StatusBoard> {
        &self.board
    }
}

impl<S: SwitchPort + Send + 'static> PollDriver<S> {
    /// Spawn the periodic poll task. The switch must already be started;
    /// its poll period sets the task period.
    pub fn spawn<C>(&self, clock: C, spec: TaskSpec) -> io::Result<PollHandle>
    where
        C: ClockPort + Send + 'static,
    {
        let period_ms = self
            .with(|lss| lss.poll_period_ms())
            .ok_or_else(|| io::Error::other("switch not started"))?;
        let stop = Arc::new(AtomicBool::new(false));
        let driver = self.clone();
        let stop_flag = stop.clone();
        let name = spec.display_name();

        let join = task_pin::spawn_on_core(spec, move || {
            info!("POLL: '{name}' running every {period_ms} ms");
            let period = Duration::from_millis(u64::from(period_ms));
            while !stop_flag.load(Ordering::Acquire) {
                driver.tick(clock.now_ms());
                std::thread::sleep(period);
            }
            info!("POLL: '{name}' stopped");
        })?;
        Ok(PollHandle { stop, join })
    }
}

/// Running poll task.
pub struct PollHandle {
    stop: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl PollHandle {
    /// Stop after the current tick and wait for the task to exit.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Release);
        if self.join.join().is_err() {
            log::error!("POLL: task panicked");
        }
    }
}
