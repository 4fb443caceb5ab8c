use clap::ValueEnum;

use crate::config::{ConnectArgs, LineConfig, TargetProfile};

/// Chips whose ROM download mode has been exercised with espport
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Esp32,
    Esp32S2,
    Esp32S3,
    Esp32C3,
    Esp32C6,

    /// Slow ROM, and BOOT has to stay asserted for the whole download
    Esp32C5,
}

impl Target {
    /// Line polarity and hold times used to put the chip in download mode
    pub fn profile(self) -> TargetProfile {
        let defaults = TargetProfile::default();
        match self {
            Target::Esp32C5 => TargetProfile {
                reset: LineConfig {
                    hold_ms: 200,
                    ..defaults.reset
                },
                boot: LineConfig {
                    hold_ms: 900,
                    ..defaults.boot
                },
                release_boot: false,
                md5_enabled: false,
                ..defaults
            },
            Target::Esp32
            | Target::Esp32S2
            | Target::Esp32S3
            | Target::Esp32C3
            | Target::Esp32C6 => defaults,
        }
    }

    pub fn connect_args(self) -> ConnectArgs {
        match self {
            Target::Esp32C5 => ConnectArgs {
                sync_timeout_ms: 500,
                trials: 25,
            },
            _ => ConnectArgs::default(),
        }
    }
}
