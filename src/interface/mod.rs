pub mod serialport;

use crate::error::PortResult;

pub type BaudRate = u32;

/// Byte stream the port layer talks to the target through
pub trait SerialEndpoint {
    /// Open the endpoint at the given rate
    fn begin(&mut self, baud: BaudRate) -> PortResult<()>;

    /// Close the endpoint. Closing an already closed endpoint does nothing.
    fn end(&mut self);

    /// Number of received bytes ready to be read without blocking
    fn available(&mut self) -> PortResult<usize>;

    /// Read one byte if there is one
    fn read_byte(&mut self) -> PortResult<Option<u8>>;

    /// Queue bytes for transmission, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> PortResult<usize>;

    /// Block until every queued byte has left the transmitter
    fn flush(&mut self) -> PortResult<()>;
}

impl<T: SerialEndpoint + ?Sized> SerialEndpoint for &mut T {
    fn begin(&mut self, baud: BaudRate) -> PortResult<()> {
        (**self).begin(baud)
    }

    fn end(&mut self) {
        (**self).end()
    }

    fn available(&mut self) -> PortResult<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> PortResult<Option<u8>> {
        (**self).read_byte()
    }

    fn write(&mut self, data: &[u8]) -> PortResult<usize> {
        (**self).write(data)
    }

    fn flush(&mut self) -> PortResult<()> {
        (**self).flush()
    }
}
