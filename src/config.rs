//! Runtime description of how a target is wired and how long each control
//! line must be held.

use embedded_hal::digital::PinState;

use crate::constants::{
    BOOT_HOLD_TIME_MS, DRAIN_POLL_MS, DRAIN_SETTLE_MS, DRAIN_WINDOW_MS, RESET_HOLD_TIME_MS,
    SYNC_TIMEOUT_MS, SYNC_TRIALS, WRITE_BLOCK_RETRIES,
};

/// Electrical level at which a control line is considered asserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Polarity {
    #[default]
    ActiveLow,
    ActiveHigh,
}

impl Polarity {
    pub fn asserted(self) -> PinState {
        match self {
            Polarity::ActiveLow => PinState::Low,
            Polarity::ActiveHigh => PinState::High,
        }
    }

    pub fn released(self) -> PinState {
        match self {
            Polarity::ActiveLow => PinState::High,
            Polarity::ActiveHigh => PinState::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineConfig {
    pub polarity: Polarity,
    /// How long the asserted state is held, in milliseconds
    pub hold_ms: u32,
}

/// Timing of the boot-log drain that follows the entry sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainConfig {
    pub settle_ms: u32,
    pub window_ms: u32,
    pub poll_ms: u32,
}

impl Default for DrainConfig {
    fn default() -> Self {
        DrainConfig {
            settle_ms: DRAIN_SETTLE_MS,
            window_ms: DRAIN_WINDOW_MS,
            poll_ms: DRAIN_POLL_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetProfile {
    pub reset: LineConfig,
    pub boot: LineConfig,

    /// Release BOOT once the ROM has sampled it. Some targets only stay in
    /// download mode while BOOT is held for the whole session.
    pub release_boot: bool,

    pub drain: DrainConfig,

    /// Consumed by the protocol layer, not by the port
    pub write_block_retries: u8,

    /// Consumed by the protocol layer, not by the port
    pub md5_enabled: bool,
}

impl Default for TargetProfile {
    fn default() -> Self {
        TargetProfile {
            reset: LineConfig {
                polarity: Polarity::ActiveLow,
                hold_ms: RESET_HOLD_TIME_MS,
            },
            boot: LineConfig {
                polarity: Polarity::ActiveLow,
                hold_ms: BOOT_HOLD_TIME_MS,
            },
            release_boot: true,
            drain: DrainConfig::default(),
            write_block_retries: WRITE_BLOCK_RETRIES,
            md5_enabled: true,
        }
    }
}

/// Parameters handed to the protocol layer's sync handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectArgs {
    pub sync_timeout_ms: u32,
    pub trials: u32,
}

impl Default for ConnectArgs {
    fn default() -> Self {
        ConnectArgs {
            sync_timeout_ms: SYNC_TIMEOUT_MS,
            trials: SYNC_TRIALS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_levels_are_complementary() {
        assert_eq!(Polarity::ActiveLow.asserted(), PinState::Low);
        assert_eq!(Polarity::ActiveLow.released(), PinState::High);
        assert_eq!(Polarity::ActiveHigh.asserted(), PinState::High);
        assert_eq!(Polarity::ActiveHigh.released(), PinState::Low);
    }

    #[test]
    fn default_profile_releases_boot() {
        let profile = TargetProfile::default();
        assert!(profile.release_boot);
        assert_eq!(profile.reset.hold_ms, 100);
        assert_eq!(profile.boot.hold_ms, 50);
        assert_eq!(profile.drain.window_ms, 500);
    }
}
