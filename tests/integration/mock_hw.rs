//! Mock hardware for integration tests.
//!
//! Each [`MockSwitch`] is owned by the interlock under test; the test
//! keeps a [`SwitchHandle`] onto the same shared line to press, release
//! and inspect it without touching real GPIO.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use limbsafety::app::ports::{ClockPort, SwitchPort};
use limbsafety::config::{InterlockConfig, LimbSafetyWorkingConfig, MIN_VOID_TIME_MS};
use limbsafety::notify::{NotifyEvent, NotifyTarget};
use limbsafety::status::StatusFlags;

// ── Switch line ───────────────────────────────────────────────

#[derive(Debug, Default)]
struct Line {
    pressed: bool,
    on_if_disabled: bool,
    voided: bool,
    enabled: bool,
    /// Pressed when enabled; a press only counts once released.
    needs_release: bool,
    running: bool,
    min_period_ms: u32,
    enable_calls: u32,
    disable_calls: u32,
    start_delay_ms: u32,
    void_time_ms: u32,
}

/// Switch owned by the interlock. On while pressed, enabled and not
/// voided; a contact held through `enable` must be released first.
pub struct MockSwitch {
    line: Arc<Mutex<Line>>,
}

/// Test-side view of a [`MockSwitch`].
#[derive(Clone)]
pub struct SwitchHandle {
    line: Arc<Mutex<Line>>,
}

pub fn switch() -> (MockSwitch, SwitchHandle) {
    let line = Arc::new(Mutex::new(Line {
        min_period_ms: 1,
        ..Line::default()
    }));
    (
        MockSwitch { line: line.clone() },
        SwitchHandle { line },
    )
}

#[allow(dead_code)]
impl SwitchHandle {
    pub fn press(&self) {
        self.line.lock().unwrap().pressed = true;
    }

    pub fn release(&self) {
        let mut l = self.line.lock().unwrap();
        l.pressed = false;
        l.voided = false;
        l.needs_release = false;
    }

    /// Simulate the press outliving its void time.
    pub fn void(&self) {
        self.line.lock().unwrap().voided = true;
    }

    pub fn set_on_if_disabled(&self, on: bool) {
        self.line.lock().unwrap().on_if_disabled = on;
    }

    pub fn set_min_period(&self, ms: u32) {
        self.line.lock().unwrap().min_period_ms = ms;
    }

    pub fn is_enabled(&self) -> bool {
        self.line.lock().unwrap().enabled
    }

    pub fn is_running(&self) -> bool {
        self.line.lock().unwrap().running
    }

    pub fn enable_calls(&self) -> u32 {
        self.line.lock().unwrap().enable_calls
    }

    pub fn disable_calls(&self) -> u32 {
        self.line.lock().unwrap().disable_calls
    }

    pub fn timing(&self) -> (u32, u32) {
        let l = self.line.lock().unwrap();
        (l.start_delay_ms, l.void_time_ms)
    }
}

impl SwitchPort for MockSwitch {
    fn begin(&mut self, _poll_period_ms: u32) -> bool {
        self.line.lock().unwrap().running = true;
        true
    }

    fn end(&mut self) {
        self.line.lock().unwrap().running = false;
    }

    fn poll(&mut self, _now_ms: u32) {}

    fn is_on(&self) -> bool {
        let l = self.line.lock().unwrap();
        if l.enabled {
            l.pressed && !l.voided && !l.needs_release
        } else {
            l.on_if_disabled
        }
    }

    fn is_enabled(&self) -> bool {
        self.line.lock().unwrap().enabled
    }

    fn is_voided(&self) -> bool {
        let l = self.line.lock().unwrap();
        l.enabled && l.voided
    }

    fn enable(&mut self) {
        let mut l = self.line.lock().unwrap();
        l.enabled = true;
        l.needs_release = l.pressed;
        l.enable_calls += 1;
    }

    fn disable(&mut self) {
        let mut l = self.line.lock().unwrap();
        l.enabled = false;
        l.disable_calls += 1;
    }

    fn set_start_delay(&mut self, ms: u32) {
        self.line.lock().unwrap().start_delay_ms = ms;
    }

    fn set_void_time(&mut self, ms: u32) -> bool {
        if ms < MIN_VOID_TIME_MS {
            return false;
        }
        self.line.lock().unwrap().void_time_ms = ms;
        true
    }

    fn min_poll_period_ms(&self) -> u32 {
        self.line.lock().unwrap().min_period_ms
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Lss = limbsafety::app::service::LimbSafetySwitch<MockSwitch>;

/// Interlock plus handles onto its three switches.
pub struct Rig {
    pub lss: Lss,
    pub left: SwitchHandle,
    pub right: SwitchHandle,
    pub foot: SwitchHandle,
}

#[allow(dead_code)]
impl Rig {
    pub fn with_config(config: InterlockConfig) -> Self {
        let (l, left) = switch();
        let (r, right) = switch();
        let (f, foot) = switch();
        let lss = Lss::new(l, r, f, config).unwrap();
        Self {
            lss,
            left,
            right,
            foot,
        }
    }

    /// Default config with 1500 ms release / 6000 ms cycle, started.
    pub fn started() -> Self {
        let mut config = InterlockConfig::default();
        config.working = LimbSafetyWorkingConfig::new(1500, 6000).unwrap();
        let mut rig = Self::with_config(config);
        rig.lss.begin(10).unwrap();
        rig
    }

    pub fn hands_on(&self) {
        self.left.press();
        self.right.press();
    }

    pub fn hands_off(&self) {
        self.left.release();
        self.right.release();
    }

    /// Tick every millisecond in `from..=to`.
    pub fn run(&mut self, from: u32, to: u32) {
        for t in from..=to {
            self.lss.tick(t);
        }
    }

    pub fn flags(&self) -> StatusFlags {
        StatusFlags::decode(self.lss.status_word())
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Clock the test advances by hand.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Release);
    }

    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::AcqRel);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Acquire)
    }
}

// ── Recording target ──────────────────────────────────────────

/// Records every word it is woken with, plus retirements.
#[derive(Default)]
pub struct Recorder {
    pub words: Mutex<Vec<u32>>,
    pub retired: AtomicU32,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.words.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<u32> {
        self.words.lock().unwrap().last().copied()
    }

    pub fn retired(&self) -> u32 {
        self.retired.load(Ordering::Acquire)
    }
}

impl NotifyTarget for Recorder {
    fn notify(&self, word: u32) {
        self.words.lock().unwrap().push(word);
    }

    fn retire(&self) {
        self.retired.fetch_add(1, Ordering::AcqRel);
    }
}

/// Shared log of `(event, word)` in the order targets were woken.
#[derive(Clone, Default)]
pub struct Journal {
    pub entries: Arc<Mutex<Vec<(NotifyEvent, u32)>>>,
}

/// Target that writes into a [`Journal`] under its event.
pub struct JournalTarget {
    event: NotifyEvent,
    journal: Journal,
}

#[allow(dead_code)]
impl Journal {
    /// Register one journal target for every event.
    pub fn attach(&self, lss: &mut Lss) {
        for event in NotifyEvent::DISPATCH_ORDER {
            lss.set_target(
                event,
                Some(Arc::new(JournalTarget {
                    event,
                    journal: self.clone(),
                })),
            );
        }
    }

    pub fn count(&self, event: NotifyEvent) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == event)
            .count()
    }

    pub fn events(&self) -> Vec<NotifyEvent> {
        self.entries.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl NotifyTarget for JournalTarget {
    fn notify(&self, word: u32) {
        self.journal.entries.lock().unwrap().push((self.event, word));
    }
}
