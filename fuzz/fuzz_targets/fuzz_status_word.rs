//! Fuzz target: `StatusFlags::decode` / `encode`
//!
//! Any 32-bit word decodes without panicking, bits outside the flag
//! mask are dropped, and re-encoding is stable.
//!
//! cargo fuzz run fuzz_status_word

#![no_main]

use libfuzzer_sys::fuzz_target;
use limbsafety::status::{FLAGS_MASK, StatusFlags};

fuzz_target!(|word: u32| {
    let flags = StatusFlags::decode(word);
    let encoded = flags.encode();

    assert_eq!(encoded, word & FLAGS_MASK, "only flag bits survive");
    assert_eq!(StatusFlags::decode(encoded), flags, "decode is stable");
    assert_eq!(
        flags.both_hands_on(),
        flags.left_hand.is_on && flags.right_hand.is_on
    );
});
