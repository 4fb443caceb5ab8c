use embedded_hal::digital::OutputPin;
use tracing::info;

use crate::clock::Clock;
use crate::config::ConnectArgs;
use crate::error::PortResult;
use crate::interface::{BaudRate, SerialEndpoint};
use crate::port::{LoaderPort, SerialFlasherPort};

/// The bootloader protocol state machine served by the port: sync handshake,
/// framing, flash writes. espport only hands it a [`LoaderPort`].
pub trait BootloaderProtocol {
    fn connect(&mut self, port: &mut dyn LoaderPort, args: &ConnectArgs) -> PortResult<()>;
}

/// Lifecycle of one flashing session: `begin`, `connect`, the protocol's own
/// work through [`FlasherSession::port_mut`], then `finish`.
pub struct FlasherSession<E, R, B, C> {
    port: SerialFlasherPort<E, R, B, C>,
    connect_args: ConnectArgs,
}

impl<E, R, B, C> FlasherSession<E, R, B, C>
where
    E: SerialEndpoint,
    R: OutputPin,
    B: OutputPin,
    C: Clock,
{
    pub fn new(port: SerialFlasherPort<E, R, B, C>, connect_args: ConnectArgs) -> Self {
        FlasherSession { port, connect_args }
    }

    /// Open the endpoint and park both lines at their released level
    pub fn begin(&mut self, baud: BaudRate) -> PortResult<()> {
        self.port.open(baud)?;
        self.port.release_lines();
        info!("Session started at {} baud", baud);
        Ok(())
    }

    pub fn connect<P: BootloaderProtocol>(&mut self, protocol: &mut P) -> PortResult<()> {
        info!(
            "Connecting ({} trials, {} ms sync timeout)",
            self.connect_args.trials, self.connect_args.sync_timeout_ms
        );
        protocol.connect(&mut self.port, &self.connect_args)?;
        info!("Connected to target bootloader");
        Ok(())
    }

    /// Release BOOT if it was held through the download and reboot the
    /// target into its application
    pub fn finish(&mut self) {
        self.port.release_lines();
        self.port.reset_target();
        info!("Session finished, target restarted");
    }

    pub fn connect_args(&self) -> &ConnectArgs {
        &self.connect_args
    }

    pub fn port(&self) -> &SerialFlasherPort<E, R, B, C> {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut SerialFlasherPort<E, R, B, C> {
        &mut self.port
    }
}
