//! Status word codec.
//!
//! Packs the externally relevant interlock flags into a fixed-layout
//! 32-bit word. The layout is a compatibility contract with every
//! consumer that decodes the word (indicator updater, logging, another
//! process on the same channel):
//!
//! ```text
//!  bit  9    8    7    6    5    4    3    2    1    0
//!     ┌────┬────┬────┬────┬────┬────┬────┬────┬────┬────┐
//!     │ PC │ LR │ FO │ FE │ RV │ RO │ RE │ LV │ LO │ LE │
//!     └────┴────┴────┴────┴────┴────┴────┴────┴────┴────┘
//!  L = left hand, R = right hand, F = foot
//!  E = enabled, O = on, V = voided
//!  LR = latch release on, PC = production cycle on
//!  bits 10..31 reserved, always zero
//! ```

pub const LEFT_HAND_ENABLED: u32 = 1 << 0;
pub const LEFT_HAND_ON: u32 = 1 << 1;
pub const LEFT_HAND_VOIDED: u32 = 1 << 2;
pub const RIGHT_HAND_ENABLED: u32 = 1 << 3;
pub const RIGHT_HAND_ON: u32 = 1 << 4;
pub const RIGHT_HAND_VOIDED: u32 = 1 << 5;
pub const FOOT_ENABLED: u32 = 1 << 6;
pub const FOOT_ON: u32 = 1 << 7;
pub const LATCH_RELEASE_ON: u32 = 1 << 8;
pub const PRODUCTION_CYCLE_ON: u32 = 1 << 9;

/// Every meaningful bit of the word.
pub const FLAGS_MASK: u32 = (1 << 10) - 1;

/// `{isOn, isEnabled, isVoided}` of one switch, copied once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchStatus {
    pub is_on: bool,
    pub is_enabled: bool,
    pub is_voided: bool,
}

/// Decoded form of the status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFlags {
    pub left_hand: SwitchStatus,
    pub right_hand: SwitchStatus,
    pub foot_enabled: bool,
    pub foot_on: bool,
    pub latch_release_on: bool,
    pub production_cycle_on: bool,
}

#[inline]
fn bit(set: bool, mask: u32) -> u32 {
    if set { mask } else { 0 }
}

impl StatusFlags {
    pub fn encode(&self) -> u32 {
        bit(self.left_hand.is_enabled, LEFT_HAND_ENABLED)
            | bit(self.left_hand.is_on, LEFT_HAND_ON)
            | bit(self.left_hand.is_voided, LEFT_HAND_VOIDED)
            | bit(self.right_hand.is_enabled, RIGHT_HAND_ENABLED)
            | bit(self.right_hand.is_on, RIGHT_HAND_ON)
            | bit(self.right_hand.is_voided, RIGHT_HAND_VOIDED)
            | bit(self.foot_enabled, FOOT_ENABLED)
            | bit(self.foot_on, FOOT_ON)
            | bit(self.latch_release_on, LATCH_RELEASE_ON)
            | bit(self.production_cycle_on, PRODUCTION_CYCLE_ON)
    }

    /// Reserved bits are ignored.
    pub fn decode(word: u32) -> Self {
        let has = |mask: u32| word & mask != 0;
        Self {
            left_hand: SwitchStatus {
                is_on: has(LEFT_HAND_ON),
                is_enabled: has(LEFT_HAND_ENABLED),
                is_voided: has(LEFT_HAND_VOIDED),
            },
            right_hand: SwitchStatus {
                is_on: has(RIGHT_HAND_ON),
                is_enabled: has(RIGHT_HAND_ENABLED),
                is_voided: has(RIGHT_HAND_VOIDED),
            },
            foot_enabled: has(FOOT_ENABLED),
            foot_on: has(FOOT_ON),
            latch_release_on: has(LATCH_RELEASE_ON),
            production_cycle_on: has(PRODUCTION_CYCLE_ON),
        }
    }

    /// Both hand switches report on.
    pub fn both_hands_on(&self) -> bool {
        self.left_hand.is_on && self.right_hand.is_on
    }
}
