pub mod delay;
pub mod gpiod;
pub mod lcd;
pub mod mock;

use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("unknown port {0}")]
    UnknownPort(PortId),
    #[error("unknown pin {0}")]
    UnknownPin(PinBinding),
    #[error("{0} is not configured as output")]
    NotOutput(PinBinding),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Identifies a GPIO port, a group of pins that can be written together.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PortId(pub u8);

impl Display for PortId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Identifies a pin within a port. Pin `n` corresponds to bit `n` of the port value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PinId(pub u8);

/// A single pin, addressed by its port and its index within that port.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PinBinding {
    pub port: PortId,
    pub pin: PinId,
}

impl PinBinding {
    pub const fn new(port: u8, pin: u8) -> Self {
        PinBinding {
            port: PortId(port),
            pin: PinId(pin),
        }
    }
}

impl Display for PinBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.port, self.pin.0)
    }
}

/// Direction of a GPIO pin or a whole port.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioDirection {
    #[default]
    Input,
    Output,
}

/// The GPIO capability used by the display drivers.
///
/// All operations are blocking and are expected to take effect before they return.
/// Direction setup may fail (e.g. the port or pin does not exist, or the line is taken by
/// someone else); writes may fail if the pin was never configured as output.
///
/// Drivers are `Send` so a display built on top of them can be moved to, or shared behind a
/// mutex with, another thread.
pub trait GpioDriver: Debug + Send {
    /// Configures a single pin as input or output.
    fn set_pin_direction(
        &mut self,
        port: PortId,
        pin: PinId,
        direction: GpioDirection,
    ) -> GpioResult<()>;

    /// Configures every pin of the port as input or output.
    fn set_port_direction(&mut self, port: PortId, direction: GpioDirection) -> GpioResult<()>;

    /// Drives a single output pin high (`true`) or low (`false`).
    fn write_pin(&mut self, port: PortId, pin: PinId, value: bool) -> GpioResult<()>;

    /// Writes a value onto the port, LSb on pin 0.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the value has bits set above the port width.
    fn write_port(&mut self, port: PortId, value: u8) -> GpioResult<()>;
}

impl dyn GpioDriver + '_ {
    /// Configures the pin as output.
    pub fn pin_as_output(&mut self, binding: PinBinding) -> GpioResult<()> {
        self.set_pin_direction(binding.port, binding.pin, GpioDirection::Output)
    }

    /// Writes the state of the pin.
    pub fn write(&mut self, binding: PinBinding, value: bool) -> GpioResult<()> {
        self.write_pin(binding.port, binding.pin, value)
    }
}

/// Splits a byte into its nibbles, high nibble first.
pub fn split_nibbles(value: u8) -> [u8; 2] {
    [(value >> 4) & 0x0F, value & 0x0F]
}

/// Checks whether `value` fits into a port of `width` pins.
pub fn fits_width(value: u8, width: usize) -> bool {
    width >= 8 || value >> width == 0
}
