use embedded_hal::digital::{OutputPin, PinState};
use tracing::{debug, info, trace, warn};

use crate::clock::Clock;
use crate::config::TargetProfile;
use crate::constants::DEFAULT_BAUD_RATE;
use crate::deadline::Deadline;
use crate::error::{PortError, PortResult};
use crate::interface::{BaudRate, SerialEndpoint};

/// Operations the bootloader protocol state machine drives the target with.
///
/// Single caller, no reentrancy: nothing here may be called while another
/// call is in progress, and `change_transmission_rate` must not overlap a
/// read or write.
pub trait LoaderPort {
    /// Fill `buffer` completely within `timeout_ms` or report a timeout.
    /// Bytes consumed before a timeout are not kept for the next call.
    fn read(&mut self, buffer: &mut [u8], timeout_ms: u32) -> PortResult<()>;

    /// Send `data` and wait until it has been transmitted
    fn write(&mut self, data: &[u8], timeout_ms: u32) -> PortResult<()>;

    /// Put the target in ROM download mode and discard its boot log
    fn enter_bootloader(&mut self);

    /// Reboot the target into its application
    fn reset_target(&mut self);

    fn start_timer(&mut self, ms: u32);

    fn remaining_time(&self) -> u32;

    fn delay_ms(&mut self, ms: u32);

    fn change_transmission_rate(&mut self, baud: BaudRate) -> PortResult<()>;

    /// Best effort diagnostics, never fails
    fn debug_print(&self, text: &str);
}

/// Everything one flashing session needs: the endpoint, the RESET and BOOT
/// lines, their timing, and the single live deadline.
pub struct SerialFlasherPort<E, R, B, C> {
    endpoint: Option<E>,
    reset_pin: Option<R>,
    boot_pin: Option<B>,
    profile: TargetProfile,
    clock: C,
    deadline: Deadline,
    baud: BaudRate,
    drained: usize,
}

impl<E, R, B, C> SerialFlasherPort<E, R, B, C>
where
    E: SerialEndpoint,
    R: OutputPin,
    B: OutputPin,
    C: Clock,
{
    pub fn new(
        endpoint: Option<E>,
        reset_pin: Option<R>,
        boot_pin: Option<B>,
        profile: TargetProfile,
        clock: C,
    ) -> Self {
        SerialFlasherPort {
            endpoint,
            reset_pin,
            boot_pin,
            profile,
            clock,
            deadline: Deadline::default(),
            baud: DEFAULT_BAUD_RATE,
            drained: 0,
        }
    }

    /// Open the endpoint at `baud`
    pub fn open(&mut self, baud: BaudRate) -> PortResult<()> {
        let endpoint = self.endpoint.as_mut().ok_or(PortError::NoEndpoint)?;
        endpoint.begin(baud)?;
        self.baud = baud;
        Ok(())
    }

    /// Drive every configured line to its released level
    pub fn release_lines(&mut self) {
        if let Some(boot_pin) = self.boot_pin.as_mut() {
            drive(boot_pin, self.profile.boot.polarity.released(), "BOOT");
        }
        if let Some(reset_pin) = self.reset_pin.as_mut() {
            drive(reset_pin, self.profile.reset.polarity.released(), "RESET");
        }
    }

    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    pub fn baud_rate(&self) -> BaudRate {
        self.baud
    }

    /// Bytes discarded by the last boot log drain
    pub fn drained_bytes(&self) -> usize {
        self.drained
    }

    pub fn endpoint_mut(&mut self) -> Option<&mut E> {
        self.endpoint.as_mut()
    }

    /// Discard the target's boot banner so it cannot be taken for the start
    /// of a sync response. Best effort: bytes arriving after the window
    /// closes are not seen.
    fn drain_boot_log(&mut self) {
        let Some(endpoint) = self.endpoint.as_mut() else {
            return;
        };
        let drain = self.profile.drain;

        self.clock.delay_ms(drain.settle_ms);

        let mut discarded = 0;
        let start = self.clock.millis();
        while self.clock.millis().saturating_sub(start) < drain.window_ms as u64 {
            discarded += discard_pending(endpoint);
            self.clock.delay_ms(drain.poll_ms);
        }
        discarded += discard_pending(endpoint);

        debug!("Drained {} boot log bytes", discarded);
        self.drained = discarded;
    }
}

impl<E, R, B, C> LoaderPort for SerialFlasherPort<E, R, B, C>
where
    E: SerialEndpoint,
    R: OutputPin,
    B: OutputPin,
    C: Clock,
{
    fn read(&mut self, buffer: &mut [u8], timeout_ms: u32) -> PortResult<()> {
        let endpoint = self.endpoint.as_mut().ok_or(PortError::NoEndpoint)?;

        let start = self.clock.millis();
        let mut received = 0;
        while received < buffer.len()
            && self.clock.millis().saturating_sub(start) < timeout_ms as u64
        {
            if endpoint.available()? > 0 {
                if let Some(byte) = endpoint.read_byte()? {
                    buffer[received] = byte;
                    received += 1;
                    continue;
                }
            }
            self.clock.relax();
        }

        trace!("Received bytes {:?}", &buffer[..received]);
        if received == buffer.len() {
            Ok(())
        } else {
            Err(PortError::Timeout {
                expected: buffer.len(),
                received,
            })
        }
    }

    fn write(&mut self, data: &[u8], timeout_ms: u32) -> PortResult<()> {
        let endpoint = self.endpoint.as_mut().ok_or(PortError::NoEndpoint)?;

        // The flush blocks until transmission ends; timeout_ms cannot bound it
        let written = endpoint.write(data)?;
        endpoint.flush()?;

        if written == data.len() {
            Ok(())
        } else {
            debug!(
                "Short write of {}/{} bytes (timeout {} ms)",
                written,
                data.len(),
                timeout_ms
            );
            Err(PortError::ShortWrite {
                expected: data.len(),
                written,
            })
        }
    }

    fn enter_bootloader(&mut self) {
        let (Some(reset_pin), Some(boot_pin)) = (self.reset_pin.as_mut(), self.boot_pin.as_mut())
        else {
            debug!("RESET or BOOT line not configured, skipping bootloader entry");
            return;
        };
        let TargetProfile { reset, boot, .. } = self.profile;

        // BOOT has to be asserted before RESET, or the ROM boots the application
        drive(boot_pin, boot.polarity.asserted(), "BOOT");
        drive(reset_pin, reset.polarity.asserted(), "RESET");
        self.clock.delay_ms(reset.hold_ms);

        drive(reset_pin, reset.polarity.released(), "RESET");
        self.clock.delay_ms(boot.hold_ms);

        if self.profile.release_boot {
            drive(boot_pin, boot.polarity.released(), "BOOT");
        }
        debug!(
            "Entry sequence done (BOOT {})",
            if self.profile.release_boot {
                "released"
            } else {
                "held"
            }
        );

        self.drain_boot_log();
    }

    fn reset_target(&mut self) {
        let Some(reset_pin) = self.reset_pin.as_mut() else {
            return;
        };
        let reset = self.profile.reset;

        drive(reset_pin, reset.polarity.asserted(), "RESET");
        self.clock.delay_ms(reset.hold_ms);
        drive(reset_pin, reset.polarity.released(), "RESET");
        debug!("Target reset");
    }

    fn start_timer(&mut self, ms: u32) {
        self.deadline.start(self.clock.millis(), ms);
    }

    fn remaining_time(&self) -> u32 {
        self.deadline.remaining(self.clock.millis())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }

    fn change_transmission_rate(&mut self, baud: BaudRate) -> PortResult<()> {
        let endpoint = self.endpoint.as_mut().ok_or(PortError::NoEndpoint)?;

        endpoint.end();
        endpoint.begin(baud)?;

        info!("Baud rate changed from {} to {}", self.baud, baud);
        self.baud = baud;
        Ok(())
    }

    fn debug_print(&self, text: &str) {
        debug!(target: "espport::loader", "{}", text.trim_end());
    }
}

/// Pin writes are fire and forget; a failure only shows up later as a sync
/// timeout in the protocol layer
fn drive<P: OutputPin>(pin: &mut P, state: PinState, name: &str) {
    trace!("{} -> {:?}", name, state);
    if let Err(e) = pin.set_state(state) {
        warn!("Failed to drive {} {:?}: {:?}", name, state, e);
    }
}

fn discard_pending<E: SerialEndpoint>(endpoint: &mut E) -> usize {
    let mut discarded = 0;
    loop {
        match endpoint.available() {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to poll endpoint while draining: {}", e);
                break;
            }
        }
        match endpoint.read_byte() {
            Ok(Some(byte)) => {
                trace!("Discarded {:#04x}", byte);
                discarded += 1;
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read endpoint while draining: {}", e);
                break;
            }
        }
    }
    discarded
}
