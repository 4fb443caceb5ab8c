//! Serial transport layer for ESP ROM bootloaders.
//!
//! espport drives a target's RESET and BOOT lines into download mode, drains
//! the boot log, and then moves framed bytes for a bootloader protocol
//! implementation through the [`LoaderPort`] trait. The protocol itself (sync,
//! framing, flash writes) lives outside this crate and plugs in through
//! [`BootloaderProtocol`].

pub use config::{ConnectArgs, DrainConfig, LineConfig, Polarity, TargetProfile};
pub use constants::DEFAULT_BAUD_RATE;
pub use error::{LoaderStatus, PortError, PortResult};
pub use port::{LoaderPort, SerialFlasherPort};
pub use session::{BootloaderProtocol, FlasherSession};
pub use targets::Target;

pub mod clock;
pub mod config;
pub(crate) mod constants;
pub mod deadline;
pub mod error;
pub mod interface;
pub mod port;
pub mod session;
pub mod targets;

#[cfg(test)]
pub(crate) mod testing;
