use clap::Parser;
use espport::{
    DEFAULT_BAUD_RATE, FlasherSession, LoaderPort, SerialFlasherPort, Target, TargetProfile,
    clock::MonotonicClock,
    error::{PortError, PortResult},
    interface::serialport::{ModemLine, ModemSignal, SerialPortEndpoint, find_bridge_port},
};
use tracing::info;

type CliSession = FlasherSession<SerialPortEndpoint, ModemLine, ModemLine, MonotonicClock>;

/// RESET and BOOT are driven from the bridge's RTS and DTR, wired straight to
/// the target's EN and BOOT inputs. Boards with the two-transistor auto-reset
/// circuit never see EN go low, since the entry sequence asserts both lines
/// together.
#[derive(Parser, Debug, Clone)]
pub(crate) struct LineOptions {
    /// Target chip
    #[clap(short, long, value_enum, default_value_t = Target::Esp32)]
    target: Target,

    /// Serial port, detected from the USB bridge when omitted
    #[clap(short, long)]
    serial: Option<String>,

    /// Baud rate
    #[clap(short, long)]
    baudrate: Option<u32>,

    /// Modem line wired directly to the target's reset (EN) input
    #[clap(long, value_enum, default_value_t = ModemSignal::Rts)]
    reset_line: ModemSignal,

    /// Modem line wired directly to the target's boot strap
    #[clap(long, value_enum, default_value_t = ModemSignal::Dtr)]
    boot_line: ModemSignal,

    /// RESET hold time in milliseconds
    #[clap(long)]
    reset_hold: Option<u32>,

    /// BOOT hold time in milliseconds
    #[clap(long)]
    boot_hold: Option<u32>,
}

impl LineOptions {
    fn profile(&self) -> TargetProfile {
        let mut profile = self.target.profile();
        if let Some(hold_ms) = self.reset_hold {
            profile.reset.hold_ms = hold_ms;
        }
        if let Some(hold_ms) = self.boot_hold {
            profile.boot.hold_ms = hold_ms;
        }
        profile
    }

    fn open_session(&self) -> PortResult<CliSession> {
        if self.reset_line == self.boot_line {
            return Err(PortError::ConfigurationError(format!(
                "RESET and BOOT cannot share {:?}",
                self.reset_line
            )));
        }

        let path = match &self.serial {
            Some(path) => path.clone(),
            None => find_bridge_port()?,
        };
        let baud = self.baudrate.unwrap_or(DEFAULT_BAUD_RATE);

        let endpoint = SerialPortEndpoint::new(path);
        let reset_line = endpoint.modem_line(self.reset_line);
        let boot_line = endpoint.modem_line(self.boot_line);
        info!(
            "Using {} ({:?} -> RESET, {:?} -> BOOT, direct wiring)",
            endpoint.path(),
            reset_line.signal(),
            boot_line.signal()
        );

        let port = SerialFlasherPort::new(
            Some(endpoint),
            Some(reset_line),
            Some(boot_line),
            self.profile(),
            MonotonicClock::new(),
        );
        let mut session = FlasherSession::new(port, self.target.connect_args());
        session.begin(baud)?;

        Ok(session)
    }
}

pub(crate) fn handle_enter(opts: LineOptions) -> PortResult<()> {
    let mut session = opts.open_session()?;

    session.port_mut().enter_bootloader();
    info!(
        "{:?} should now be in download mode, drained {} boot log bytes",
        opts.target,
        session.port().drained_bytes()
    );

    Ok(())
}

pub(crate) fn handle_reset(opts: LineOptions) -> PortResult<()> {
    let mut session = opts.open_session()?;

    session.finish();

    Ok(())
}
