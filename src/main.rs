//! LimbSafety Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  DebouncedSwitch ×3   IndicatorUpdater   NvsAdapter  Esp32Time │
//! │  (SwitchPort)         (output pins)      (Config)    (Clock)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        LimbSafetySwitch (FDA · notifier · codec)       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  poll task (core 1) ──tick──▶ Signal ──▶ indicator task (main) │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::{Context, Result};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use log::{info, warn};

use limbsafety::adapters::log_sink::LogTarget;
use limbsafety::adapters::nvs::NvsAdapter;
use limbsafety::adapters::time::Esp32TimeAdapter;
use limbsafety::app::ports::ConfigPort;
use limbsafety::app::service::LimbSafetySwitch;
use limbsafety::config::{InterlockConfig, SwitchInputConfig};
use limbsafety::drivers::indicator::{BOARD_LINES, IndicatorUpdater};
use limbsafety::drivers::switch::DebouncedSwitch;
use limbsafety::error::ConfigError;
use limbsafety::notify::NotifyEvent;
use limbsafety::poll::{POLL_TASK, PollDriver};

type InputSwitch = DebouncedSwitch<PinDriver<'static, AnyIOPin, Input>>;

fn input_switch(cfg: SwitchInputConfig) -> Result<InputSwitch> {
    // SAFETY: each GPIO number is claimed exactly once, here.
    let io = unsafe { AnyIOPin::new(cfg.pin) };
    let mut drv = PinDriver::input(io)?;
    drv.set_pull(if cfg.is_pulled_up { Pull::Up } else { Pull::Down })?;
    Ok(DebouncedSwitch::new(drv, cfg))
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("LimbSafety v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(ConfigError::NotFound) => {
            info!("No stored config, using defaults");
            let cfg = InterlockConfig::default();
            if let Err(e) = nvs.save(&cfg) {
                warn!("Config save failed: {e}");
            }
            cfg
        }
        Err(e) => {
            warn!("Stored config unusable ({e}), using defaults");
            InterlockConfig::default()
        }
    };

    // ── 3. Switches ───────────────────────────────────────────
    let left = input_switch(config.left_hand_input)?;
    let right = input_switch(config.right_hand_input)?;
    let foot = input_switch(config.foot_input)?;

    let poll_period_ms = config.poll_period_ms;
    let mut lss = LimbSafetySwitch::new(left, right, foot, config)
        .map_err(|e| anyhow::anyhow!("interlock config: {e}"))?;

    // ── 4. Indicators, driven before polling starts ───────────
    let mut indicators = IndicatorUpdater::new();
    for (mask, out) in BOARD_LINES {
        // SAFETY: each GPIO number is claimed exactly once, here.
        let pin = unsafe { AnyOutputPin::new(out.pin) };
        let drv: PinDriver<'static, AnyOutputPin, Output> = PinDriver::output(pin)?;
        indicators
            .add_line(mask, out, drv)
            .map_err(|e| anyhow::anyhow!("indicator GPIO {}: {e:?}", out.pin))?;
    }

    // ── 5. Notification targets ───────────────────────────────
    let wake: Arc<Signal<CriticalSectionRawMutex, u32>> = Arc::new(Signal::new());
    lss.set_task_to_notify(Some(wake.clone()));
    lss.set_target(
        NotifyEvent::BothHandsMissed,
        Some(Arc::new(LogTarget::new(NotifyEvent::BothHandsMissed))),
    );
    lss.set_target(
        NotifyEvent::ProductionCycleOn,
        Some(Arc::new(LogTarget::new(NotifyEvent::ProductionCycleOn))),
    );

    // ── 6. Start polling ──────────────────────────────────────
    lss.begin(poll_period_ms)
        .map_err(|e| anyhow::anyhow!("interlock begin: {e}"))?;
    indicators
        .apply(lss.status_word())
        .map_err(|e| anyhow::anyhow!("indicator update: {e:?}"))?;

    let driver = PollDriver::new(lss);
    let _poll = driver
        .spawn(Esp32TimeAdapter::new(), POLL_TASK)
        .context("poll task")?;

    // ── 7. Indicator loop ─────────────────────────────────────
    info!("System ready.");
    loop {
        let word = futures_lite::future::block_on(wake.wait());
        if let Err(e) = indicators.apply(word) {
            log::error!("Indicator update failed: {e:?}");
        }
    }
}
