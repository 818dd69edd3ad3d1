//! In-memory GPIO and delay doubles.
//!
//! Both record every call into a shared [MockLog], so the exact interleaving of pin writes, port
//! writes and waits can be inspected afterwards. Nothing here touches real hardware, which also
//! makes [MockGpio] usable as a dry-run backend.
use crate::delay::Delay;
use crate::{
    fits_width, GpioDirection, GpioDriver, GpioError, GpioResult, PinBinding, PinId, PortId,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One recorded call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MockEvent {
    PinDirection {
        pin: PinBinding,
        direction: GpioDirection,
    },
    PortDirection {
        port: PortId,
        direction: GpioDirection,
    },
    PinWrite {
        pin: PinBinding,
        value: bool,
    },
    PortWrite {
        port: PortId,
        value: u8,
    },
    Delay(Duration),
}

/// The bus state sampled at a falling edge of the enable pin.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Latch {
    pub rs: bool,
    pub rw: bool,
    pub data: u8,
    /// Time waited between the last data write and the falling edge.
    pub data_setup: Duration,
}

/// Pins and port the display is wired to, used to decode a [MockLog].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MockWiring {
    pub rs: PinBinding,
    pub rw: PinBinding,
    pub e: PinBinding,
    pub data: PortId,
}

/// Shared, ordered record of everything the doubles were asked to do. Clones share the record,
/// also across threads.
#[derive(Debug, Clone, Default)]
pub struct MockLog(Arc<Mutex<Vec<MockEvent>>>);

impl MockLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self) -> MutexGuard<'_, Vec<MockEvent>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: MockEvent) {
        self.record().push(event);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.record().clone()
    }

    pub fn len(&self) -> usize {
        self.record().len()
    }

    pub fn is_empty(&self) -> bool {
        self.record().is_empty()
    }

    pub fn clear(&self) {
        self.record().clear();
    }

    /// All values written to the port, in order.
    pub fn port_writes(&self, port: PortId) -> Vec<u8> {
        self.record()
            .iter()
            .filter_map(|event| match *event {
                MockEvent::PortWrite { port: p, value } if p == port => Some(value),
                _ => None,
            })
            .collect()
    }

    /// All waits, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.record()
            .iter()
            .filter_map(|event| match *event {
                MockEvent::Delay(duration) => Some(duration),
                _ => None,
            })
            .collect()
    }

    /// Replays the log and samples RS, RW and the data port at every high-to-low transition of E.
    ///
    /// Levels that were never written read as low and an unwritten port reads as `0`.
    pub fn latches(&self, wiring: &MockWiring) -> Vec<Latch> {
        let mut levels: HashMap<PinBinding, bool> = HashMap::new();
        let mut data = 0u8;
        let mut since_data = Duration::ZERO;
        let mut latches = Vec::new();

        for event in self.record().iter() {
            match *event {
                MockEvent::PinWrite { pin, value } => {
                    let previous = levels.insert(pin, value).unwrap_or(false);
                    if pin == wiring.e && previous && !value {
                        latches.push(Latch {
                            rs: levels.get(&wiring.rs).copied().unwrap_or(false),
                            rw: levels.get(&wiring.rw).copied().unwrap_or(false),
                            data,
                            data_setup: since_data,
                        });
                    }
                }
                MockEvent::PortWrite { port, value } if port == wiring.data => {
                    data = value;
                    since_data = Duration::ZERO;
                }
                MockEvent::Delay(duration) => since_data += duration,
                _ => {}
            }
        }

        latches
    }

    /// Like [Self::latches], but joins consecutive nibble latches into bytes, high nibble first.
    /// RS and RW are taken from the high nibble; a trailing unpaired nibble is dropped.
    pub fn latched_bytes(&self, wiring: &MockWiring) -> Vec<Latch> {
        self.latches(wiring)
            .chunks_exact(2)
            .map(|pair| Latch {
                data: (pair[0].data << 4) | (pair[1].data & 0x0F),
                ..pair[0]
            })
            .collect()
    }
}

/// GPIO double. Accepts any port unless told otherwise; ports are 8 pins wide by default.
#[derive(Debug, Default)]
pub struct MockGpio {
    log: MockLog,
    port_widths: HashMap<PortId, usize>,
    rejected_ports: HashSet<PortId>,
    outputs: HashSet<PinBinding>,
}

impl MockGpio {
    pub const DEFAULT_PORT_WIDTH: usize = 8;

    pub fn new(log: MockLog) -> Self {
        MockGpio {
            log,
            ..Default::default()
        }
    }

    /// Gets a handle to the log this double records into.
    pub fn log(&self) -> MockLog {
        self.log.clone()
    }

    /// Limits the port to `width` pins; wider values written to it are rejected.
    pub fn with_port_width(mut self, port: PortId, width: usize) -> Self {
        self.port_widths.insert(port, width);
        self
    }

    /// Makes every operation on the port fail with [GpioError::UnknownPort].
    pub fn with_rejected_port(mut self, port: PortId) -> Self {
        self.rejected_ports.insert(port);
        self
    }

    fn port_width(&self, port: PortId) -> GpioResult<usize> {
        if self.rejected_ports.contains(&port) {
            return Err(GpioError::UnknownPort(port));
        }
        Ok(self
            .port_widths
            .get(&port)
            .copied()
            .unwrap_or(Self::DEFAULT_PORT_WIDTH))
    }

    fn check_pin(&self, port: PortId, pin: PinId) -> GpioResult<PinBinding> {
        let binding = PinBinding { port, pin };
        if pin.0 as usize >= self.port_width(port)? {
            return Err(GpioError::UnknownPin(binding));
        }
        Ok(binding)
    }

    fn set_output(&mut self, binding: PinBinding, direction: GpioDirection) {
        match direction {
            GpioDirection::Output => self.outputs.insert(binding),
            GpioDirection::Input => self.outputs.remove(&binding),
        };
    }
}

impl GpioDriver for MockGpio {
    fn set_pin_direction(
        &mut self,
        port: PortId,
        pin: PinId,
        direction: GpioDirection,
    ) -> GpioResult<()> {
        let binding = self.check_pin(port, pin)?;
        self.set_output(binding, direction);
        self.log.push(MockEvent::PinDirection {
            pin: binding,
            direction,
        });
        Ok(())
    }

    fn set_port_direction(&mut self, port: PortId, direction: GpioDirection) -> GpioResult<()> {
        let width = self.port_width(port)?;
        for pin in 0..width {
            self.set_output(PinBinding { port, pin: PinId(pin as u8) }, direction);
        }
        self.log.push(MockEvent::PortDirection { port, direction });
        Ok(())
    }

    fn write_pin(&mut self, port: PortId, pin: PinId, value: bool) -> GpioResult<()> {
        let binding = self.check_pin(port, pin)?;
        if !self.outputs.contains(&binding) {
            return Err(GpioError::NotOutput(binding));
        }
        self.log.push(MockEvent::PinWrite { pin: binding, value });
        Ok(())
    }

    fn write_port(&mut self, port: PortId, value: u8) -> GpioResult<()> {
        let width = self.port_width(port)?;
        if let Some(pin) = (0..width)
            .map(|pin| PinBinding { port, pin: PinId(pin as u8) })
            .find(|binding| !self.outputs.contains(binding))
        {
            return Err(GpioError::NotOutput(pin));
        }
        if !fits_width(value, width) {
            return Err(GpioError::InvalidArgument);
        }
        self.log.push(MockEvent::PortWrite { port, value });
        Ok(())
    }
}

/// Delay double. Returns immediately and records the requested duration.
#[derive(Debug, Default)]
pub struct MockDelay {
    log: MockLog,
}

impl MockDelay {
    pub fn new(log: MockLog) -> Self {
        MockDelay { log }
    }

    /// Sum of every wait recorded so far, by any double sharing the log.
    pub fn total(&self) -> Duration {
        self.log.delays().iter().sum()
    }
}

impl Delay for MockDelay {
    fn delay(&mut self, duration: Duration) {
        self.log.push(MockEvent::Delay(duration));
    }
}
