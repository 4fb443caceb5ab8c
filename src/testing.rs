//! Simulated time, recording lines and a scripted endpoint for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};

use crate::clock::Clock;
use crate::config::TargetProfile;
use crate::error::PortResult;
use crate::interface::{BaudRate, SerialEndpoint};
use crate::port::SerialFlasherPort;

/// Time only moves when something waits on it; a busy-poll iteration costs 1 ms
#[derive(Debug, Clone, Default)]
pub(crate) struct SimClock {
    now: Rc<Cell<u64>>,
}

impl SimClock {
    pub(crate) fn now(&self) -> u64 {
        self.now.get()
    }

    pub(crate) fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for SimClock {
    fn millis(&self) -> u64 {
        self.now()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms as u64);
    }

    fn relax(&mut self) {
        self.advance(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Pin {
        name: &'static str,
        state: PinState,
        at: u64,
    },
    Write {
        bytes: Vec<u8>,
        at: u64,
    },
    Flush {
        at: u64,
    },
    Begin {
        baud: BaudRate,
    },
    End,
}

pub(crate) type EventLog = Rc<RefCell<Vec<Event>>>;

pub(crate) fn pin_events(log: &EventLog) -> Vec<Event> {
    log.borrow()
        .iter()
        .filter(|event| matches!(event, Event::Pin { .. }))
        .cloned()
        .collect()
}

pub(crate) struct RecordingPin {
    name: &'static str,
    clock: SimClock,
    log: EventLog,
}

impl RecordingPin {
    pub(crate) fn new(name: &'static str, clock: &SimClock, log: &EventLog) -> Self {
        RecordingPin {
            name,
            clock: clock.clone(),
            log: Rc::clone(log),
        }
    }

    fn record(&self, state: PinState) {
        self.log.borrow_mut().push(Event::Pin {
            name: self.name,
            state,
            at: self.clock.now(),
        });
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(PinState::High);
        Ok(())
    }
}

/// Endpoint fed from a timetable of incoming bytes
pub(crate) struct ScriptedEndpoint {
    clock: SimClock,
    log: EventLog,
    incoming: VecDeque<(u64, u8)>,
    accept_limit: Option<usize>,
    open: bool,
}

impl ScriptedEndpoint {
    pub(crate) fn new(clock: &SimClock, log: &EventLog) -> Self {
        ScriptedEndpoint {
            clock: clock.clone(),
            log: Rc::clone(log),
            incoming: VecDeque::new(),
            accept_limit: None,
            open: false,
        }
    }

    /// Make `bytes` arrive at time `at`. Calls must be in time order.
    pub(crate) fn schedule(&mut self, at: u64, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().map(|&byte| (at, byte)));
    }

    /// Accept at most `limit` bytes per write
    pub(crate) fn limit_writes(&mut self, limit: usize) {
        self.accept_limit = Some(limit);
    }

    pub(crate) fn pending(&self) -> usize {
        self.incoming.len()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }
}

impl SerialEndpoint for ScriptedEndpoint {
    fn begin(&mut self, baud: BaudRate) -> PortResult<()> {
        self.log.borrow_mut().push(Event::Begin { baud });
        self.open = true;
        Ok(())
    }

    fn end(&mut self) {
        self.log.borrow_mut().push(Event::End);
        self.open = false;
    }

    fn available(&mut self) -> PortResult<usize> {
        let now = self.clock.now();
        Ok(self.incoming.iter().take_while(|(at, _)| *at <= now).count())
    }

    fn read_byte(&mut self) -> PortResult<Option<u8>> {
        match self.incoming.front() {
            Some(&(at, byte)) if at <= self.clock.now() => {
                self.incoming.pop_front();
                Ok(Some(byte))
            }
            _ => Ok(None),
        }
    }

    fn write(&mut self, data: &[u8]) -> PortResult<usize> {
        let accepted = self.accept_limit.map_or(data.len(), |limit| limit.min(data.len()));
        self.log.borrow_mut().push(Event::Write {
            bytes: data[..accepted].to_vec(),
            at: self.clock.now(),
        });
        Ok(accepted)
    }

    fn flush(&mut self) -> PortResult<()> {
        self.log.borrow_mut().push(Event::Flush {
            at: self.clock.now(),
        });
        Ok(())
    }
}

pub(crate) type TestPort = SerialFlasherPort<ScriptedEndpoint, RecordingPin, RecordingPin, SimClock>;

/// A port with both lines and an endpoint, all sharing one clock and log
pub(crate) fn test_port(profile: TargetProfile) -> (TestPort, SimClock, EventLog) {
    let clock = SimClock::default();
    let log = EventLog::default();
    let port = SerialFlasherPort::new(
        Some(ScriptedEndpoint::new(&clock, &log)),
        Some(RecordingPin::new("RESET", &clock, &log)),
        Some(RecordingPin::new("BOOT", &clock, &log)),
        profile,
        clock.clone(),
    );
    (port, clock, log)
}
