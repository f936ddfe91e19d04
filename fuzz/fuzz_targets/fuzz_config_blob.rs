//! Fuzz target: persisted `InterlockConfig` blob
//!
//! Feeds arbitrary bytes through the same decode-then-validate path the
//! NVS adapter uses on boot. Decoding must never panic, and any blob
//! that validates must keep validating after a save/load cycle.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use limbsafety::config::InterlockConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = postcard::from_bytes::<InterlockConfig>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }

    let bytes = postcard::to_allocvec(&cfg).expect("valid config serialises");
    let back: InterlockConfig = postcard::from_bytes(&bytes).expect("own blob decodes");
    assert_eq!(back, cfg);
    assert!(back.validate().is_ok());
    assert!(
        back.working.latch_release_total_ms() <= back.working.production_cycle_total_ms()
    );
});
