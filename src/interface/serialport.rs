use clap::ValueEnum;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};
use serialport::{SerialPort, SerialPortType};
use tracing::{debug, trace};

use super::{BaudRate, SerialEndpoint};
use crate::constants::{BRIDGE_PRODUCT_IDS, SERIAL_TIMEOUT_MS};
use crate::error::{PortError, PortResult};
use std::cell::RefCell;
use std::io::{ErrorKind as IoErrorKind, Read, Write};
use std::rc::Rc;
use std::time::Duration;

pub type ComPort = String;

/// Last level each modem line was driven to, re-applied whenever the port
/// is opened again. Opening a tty raises RTS and DTR on its own.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LineLevels {
    rts: Option<bool>,
    dtr: Option<bool>,
}

impl LineLevels {
    fn record(&mut self, signal: ModemSignal, asserted: bool) {
        match signal {
            ModemSignal::Rts => self.rts = Some(asserted),
            ModemSignal::Dtr => self.dtr = Some(asserted),
        }
    }

    fn restore(&self, control: &mut impl ModemControl) -> PortResult<()> {
        if let Some(asserted) = self.rts {
            control.drive(ModemSignal::Rts, asserted)?;
        }
        if let Some(asserted) = self.dtr {
            control.drive(ModemSignal::Dtr, asserted)?;
        }
        Ok(())
    }
}

trait ModemControl {
    fn drive(&mut self, signal: ModemSignal, asserted: bool) -> PortResult<()>;
}

impl ModemControl for Box<dyn SerialPort> {
    fn drive(&mut self, signal: ModemSignal, asserted: bool) -> PortResult<()> {
        let result = match signal {
            ModemSignal::Rts => self.write_request_to_send(asserted),
            ModemSignal::Dtr => self.write_data_terminal_ready(asserted),
        };

        result.map_err(|e| {
            PortError::Communication(format!(
                "Failed to set {:?} {}: {:?}",
                signal, asserted, e
            ))
        })
    }
}

#[derive(Default)]
struct PortSlot {
    handle: Option<Box<dyn SerialPort>>,
    levels: LineLevels,
}

/// OS handle shared by the endpoint and its modem lines. Empty while closed.
type SharedPort = Rc<RefCell<PortSlot>>;

fn with_port<T>(
    shared: &SharedPort,
    f: impl FnOnce(&mut Box<dyn SerialPort>) -> PortResult<T>,
) -> PortResult<T> {
    let mut slot = shared.borrow_mut();
    let serial_port = slot.handle.as_mut().ok_or(PortError::NoEndpoint)?;
    f(serial_port)
}

/// Serial port endpoint. The OS handle only exists between `begin` and `end`.
pub struct SerialPortEndpoint {
    path: ComPort,
    serial_port: SharedPort,
}

impl SerialPortEndpoint {
    pub fn new(path: ComPort) -> SerialPortEndpoint {
        SerialPortEndpoint {
            path,
            serial_port: Rc::new(RefCell::new(PortSlot::default())),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.serial_port.borrow().handle.is_some()
    }

    /// A modem control line of this port, usable as an output pin. The line
    /// follows the port across close and reopen.
    pub fn modem_line(&self, signal: ModemSignal) -> ModemLine {
        ModemLine {
            serial_port: Rc::clone(&self.serial_port),
            signal,
        }
    }
}

impl SerialEndpoint for SerialPortEndpoint {
    fn begin(&mut self, baud: BaudRate) -> PortResult<()> {
        // Drop any previous handle first, the device is opened exclusively
        self.end();

        let mut serial_port = serialport::new(self.path.as_str(), baud)
            .timeout(Duration::from_millis(SERIAL_TIMEOUT_MS))
            .dtr_on_open(false)
            .open()
            .map_err(|e| PortError::Communication(format!("{:?}", e)))?;

        let mut slot = self.serial_port.borrow_mut();
        slot.levels.restore(&mut serial_port)?;
        debug!(
            "Opened {} at {} baud, lines {:?}",
            self.path, baud, slot.levels
        );
        slot.handle = Some(serial_port);
        Ok(())
    }

    fn end(&mut self) {
        if self.serial_port.borrow_mut().handle.take().is_some() {
            debug!("Closed {}", self.path);
        }
    }

    fn available(&mut self) -> PortResult<usize> {
        with_port(&self.serial_port, |serial_port| {
            let count = serial_port
                .bytes_to_read()
                .map_err(|e| PortError::Communication(format!("{:?}", e)))?;
            Ok(count as usize)
        })
    }

    fn read_byte(&mut self) -> PortResult<Option<u8>> {
        with_port(&self.serial_port, |serial_port| {
            let mut byte = [0u8; 1];
            match Read::read(serial_port, &mut byte) {
                Ok(0) => Ok(None),
                Ok(_) => Ok(Some(byte[0])),
                // Timeout error is fine, nothing arrived
                Err(e) if e.kind() == IoErrorKind::TimedOut => Ok(None),
                Err(e) => Err(PortError::Communication(format!("{:?}", e))),
            }
        })
    }

    fn write(&mut self, data: &[u8]) -> PortResult<usize> {
        with_port(&self.serial_port, |serial_port| {
            let mut written = 0;
            while written < data.len() {
                match Write::write(&mut *serial_port, &data[written..]) {
                    Ok(0) => break,
                    Ok(count) => written += count,
                    Err(e) if e.kind() == IoErrorKind::TimedOut => break,
                    Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                    Err(e) => return Err(PortError::Communication(format!("{:?}", e))),
                }
            }

            trace!("Sent bytes {:?}", &data[..written]);
            Ok(written)
        })
    }

    fn flush(&mut self) -> PortResult<()> {
        with_port(&self.serial_port, |serial_port| {
            Write::flush(serial_port).map_err(|e| {
                PortError::Communication(format!("Failed to flush transmit buffer, {}", e))
            })
        })
    }
}

/// Modem control signals of a USB-serial bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModemSignal {
    Rts,
    Dtr,
}

/// RTS or DTR driven as a GPIO.
///
/// Meant for lines wired straight to the target's EN and BOOT inputs. The
/// two-transistor auto-reset circuit of ESP dev boards does not work here:
/// it only pulls EN or IO0 low while exactly one signal is asserted, and the
/// entry sequence asserts both at once.
///
/// The bridge's TTL output is low while the signal is asserted, so
/// `set_low` asserts the signal and `set_high` deasserts it. The last level
/// is kept across close and reopen.
pub struct ModemLine {
    serial_port: SharedPort,
    signal: ModemSignal,
}

impl ModemLine {
    pub fn signal(&self) -> ModemSignal {
        self.signal
    }

    fn drive(&mut self, asserted: bool) -> PortResult<()> {
        let mut slot = self.serial_port.borrow_mut();
        slot.levels.record(self.signal, asserted);
        slot.handle
            .as_mut()
            .ok_or(PortError::NoEndpoint)?
            .drive(self.signal, asserted)
    }
}

impl digital::Error for PortError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for ModemLine {
    type Error = PortError;
}

impl OutputPin for ModemLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }
}

/// Find the first USB serial port behind a bridge commonly found on ESP boards
pub fn find_bridge_port() -> PortResult<ComPort> {
    let ports = serialport::available_ports().map_err(|e| {
        PortError::ConfigurationError(format!("Could not get available ports. Err {:?}", e))
    })?;

    for port in ports {
        if let SerialPortType::UsbPort(info) = port.port_type {
            if BRIDGE_PRODUCT_IDS.contains(&info.pid) {
                debug!(
                    "Found bridge {:04x}:{:04x} at {}",
                    info.vid, info.pid, port.port_name
                );
                return Ok(port.port_name);
            }
        }
    }

    Err(PortError::ConfigurationError(format!(
        "Looked at all available serial ports; could not find one that matches one of \
        product IDs {:04x?}. Try specifying a serial port?",
        BRIDGE_PRODUCT_IDS
    )))
}
