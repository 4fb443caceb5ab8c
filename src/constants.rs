pub(crate) const SERIAL_TIMEOUT_MS: u64 = 1;
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

pub(crate) const RESET_HOLD_TIME_MS: u32 = 100;
pub(crate) const BOOT_HOLD_TIME_MS: u32 = 50;
pub(crate) const WRITE_BLOCK_RETRIES: u8 = 3;

pub(crate) const DRAIN_SETTLE_MS: u32 = 100;
pub(crate) const DRAIN_WINDOW_MS: u32 = 500;
pub(crate) const DRAIN_POLL_MS: u32 = 2;

pub(crate) const SYNC_TIMEOUT_MS: u32 = 100;
pub(crate) const SYNC_TRIALS: u32 = 10;

/// USB product ids of the serial bridges found on ESP dev boards
pub(crate) const BRIDGE_PRODUCT_IDS: [u16; 5] = [0xea60, 0x7523, 0x55d4, 0x6001, 0x6015];
