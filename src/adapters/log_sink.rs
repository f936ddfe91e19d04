//! Log-based notification target.
//!
//! Decodes each status word it is woken with and writes one line to the
//! ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::notify::{NotifyEvent, NotifyTarget};
use crate::status::{StatusFlags, SwitchStatus};

pub struct LogTarget {
    event: NotifyEvent,
}

impl LogTarget {
    pub fn new(event: NotifyEvent) -> Self {
        Self { event }
    }
}

fn hand(s: SwitchStatus) -> &'static str {
    match (s.is_enabled, s.is_voided, s.is_on) {
        (false, _, true) => "on*",
        (false, _, false) => "off*",
        (true, true, _) => "VOID",
        (true, false, true) => "on",
        (true, false, false) => "off",
    }
}

impl NotifyTarget for LogTarget {
    fn notify(&self, word: u32) {
        let f = StatusFlags::decode(word);
        if self.event == NotifyEvent::BothHandsMissed {
            warn!("LSS | both hands missed | word=0x{word:03x}");
            return;
        }
        info!(
            "LSS | {:?} | L={} R={} foot={}{} | release={} cycle={} | word=0x{:03x}",
            self.event,
            hand(f.left_hand),
            hand(f.right_hand),
            if f.foot_enabled { "armed" } else { "off" },
            if f.foot_on { "+on" } else { "" },
            if f.latch_release_on { "ON" } else { "off" },
            if f.production_cycle_on { "ON" } else { "off" },
            word,
        );
    }

    fn retire(&self) {
        info!("LSS | log target for {:?} retired", self.event);
    }
}
