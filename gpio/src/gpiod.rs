//! GpiodDriver implementation for driving GPIO lines through the Linux GPIO character device,
//! using the gpiod library.
//!
//! Linux has no notion of ports, so they are defined by a [PortMap]: each port is an ordered list
//! of chip line offsets, pin `n` of the port being the `n`-th offset.
use crate::{
    fits_width, GpioDirection, GpioDriver, GpioError, GpioResult, PinBinding, PinId, PortId,
};
use bitvec::vec::BitVec;
use log::trace;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};
use std::path::Path;

/// Maps ports to chip line offsets.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PortMap {
    ports: BTreeMap<PortId, Vec<u32>>,
}

impl PortMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a port. Bit `n` of a value written to the port drives `lines[n]`.
    pub fn with_port(mut self, port: PortId, lines: impl Into<Vec<u32>>) -> Self {
        self.ports.insert(port, lines.into());
        self
    }

    pub fn lines(&self, port: PortId) -> GpioResult<&[u32]> {
        self.ports
            .get(&port)
            .map(Vec::as_slice)
            .ok_or(GpioError::UnknownPort(port))
    }

    pub fn line(&self, port: PortId, pin: PinId) -> GpioResult<u32> {
        self.lines(port)?
            .get(pin.0 as usize)
            .copied()
            .ok_or(GpioError::UnknownPin(PinBinding { port, pin }))
    }

    /// Checks that every line exists on a chip with `count` lines and belongs to one port only.
    pub fn validate(&self, count: usize) -> GpioResult<()> {
        let mut claimed: BitVec = BitVec::repeat(false, count);
        for &line in self.ports.values().flatten() {
            let index = line as usize;
            if index >= count {
                return Err(GpioError::InvalidArgument);
            }
            if claimed[index] {
                return Err(GpioError::AlreadyInUse);
            }
            claimed.set(index, true);
        }
        Ok(())
    }
}

/// GpiodDriver is a GPIO driver that uses the gpiod library to drive the lines of one chip.
///
/// A port configured as output is requested from the kernel as one multi-line request and written
/// with a single call, like a bus. Pins configured one by one get a request each. Configuring a
/// pin or port as input releases its lines again.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    ports: PortMap,
    outputs: HashMap<u32, gpiod::Lines<gpiod::Output>>,
    port_outputs: HashMap<PortId, PortOutput>,
}

/// A port requested as one multi-line output, with the levels last written to it.
struct PortOutput {
    lines: gpiod::Lines<gpiod::Output>,
    values: Vec<bool>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip, ports: PortMap) -> GpioResult<Self> {
        ports.validate(chip.num_lines() as usize)?;
        Ok(Self {
            chip,
            ports,
            outputs: HashMap::new(),
            port_outputs: HashMap::new(),
        })
    }

    /// Opens the chip at `path`, e.g. `/dev/gpiochip0`.
    pub fn open(path: impl AsRef<Path>, ports: PortMap) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(path.as_ref())?;
        Self::new(chip, ports)
    }

    fn request_output(&self, lines: &[u32]) -> GpioResult<gpiod::Lines<gpiod::Output>> {
        trace!("Requesting lines {:?} as output", lines);
        Ok(self
            .chip
            .request_lines(gpiod::Options::output(lines).consumer(env!("CARGO_PKG_NAME")))?)
    }

    /// Gives up the port-wide request and requests the remaining lines one by one.
    fn split_port(&mut self, port: PortId, except: u32) -> GpioResult<()> {
        if self.port_outputs.remove(&port).is_none() {
            return Ok(());
        }
        trace!("Released port {}", port);
        let lines = self.ports.lines(port)?.to_vec();
        for line in lines.into_iter().filter(|&line| line != except) {
            let output = self.request_output(&[line])?;
            self.outputs.insert(line, output);
        }
        Ok(())
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn set_pin_direction(
        &mut self,
        port: PortId,
        pin: PinId,
        direction: GpioDirection,
    ) -> GpioResult<()> {
        let line = self.ports.line(port, pin)?;
        match direction {
            GpioDirection::Output => {
                if !self.port_outputs.contains_key(&port) && !self.outputs.contains_key(&line) {
                    let output = self.request_output(&[line])?;
                    self.outputs.insert(line, output);
                }
            }
            GpioDirection::Input => {
                self.split_port(port, line)?;
                if self.outputs.remove(&line).is_some() {
                    trace!("Released line {}", line);
                }
            }
        }
        Ok(())
    }

    fn set_port_direction(&mut self, port: PortId, direction: GpioDirection) -> GpioResult<()> {
        let lines = self.ports.lines(port)?.to_vec();
        for line in &lines {
            self.outputs.remove(line);
        }
        match direction {
            GpioDirection::Output => {
                if !self.port_outputs.contains_key(&port) {
                    let output = PortOutput {
                        lines: self.request_output(&lines)?,
                        values: vec![false; lines.len()],
                    };
                    self.port_outputs.insert(port, output);
                }
            }
            GpioDirection::Input => {
                if self.port_outputs.remove(&port).is_some() {
                    trace!("Released port {}", port);
                }
            }
        }
        Ok(())
    }

    fn write_pin(&mut self, port: PortId, pin: PinId, value: bool) -> GpioResult<()> {
        let line = self.ports.line(port, pin)?;
        if let Some(output) = self.outputs.get(&line) {
            output.set_values([value])?;
        } else if let Some(output) = self.port_outputs.get_mut(&port) {
            // The whole port is rewritten; the other lines keep their last level.
            output.values[pin.0 as usize] = value;
            output.lines.set_values(&output.values)?;
        } else {
            return Err(GpioError::NotOutput(PinBinding { port, pin }));
        }
        Ok(())
    }

    fn write_port(&mut self, port: PortId, value: u8) -> GpioResult<()> {
        let width = self.ports.lines(port)?.len();
        if !fits_width(value, width) {
            return Err(GpioError::InvalidArgument);
        }

        let values = (0..width)
            .map(|i| value & (1 << i) != 0)
            .collect::<Vec<_>>();
        if let Some(output) = self.port_outputs.get_mut(&port) {
            output.lines.set_values(&values)?;
            output.values = values;
            return Ok(());
        }

        // Configured pin by pin: resolve every line first so a partial port writes nothing.
        let outputs = (0..width)
            .map(|pin| {
                let line = self.ports.line(port, PinId(pin as u8))?;
                self.outputs
                    .get(&line)
                    .ok_or(GpioError::NotOutput(PinBinding::new(port.0, pin as u8)))
            })
            .collect::<GpioResult<Vec<_>>>()?;
        for (output, value) in outputs.into_iter().zip(values) {
            output.set_values([value])?;
        }
        Ok(())
    }
}
