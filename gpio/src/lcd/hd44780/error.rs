use crate::{GpioError, PinBinding};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    /// The GPIO backend refused to configure the display pins during initialization.
    #[error("failed to set up the display pins: {0}")]
    Setup(#[source] GpioError),
    #[error(transparent)]
    Gpio(#[from] GpioError),
    #[error("{0} is bound to more than one control line")]
    DuplicatePin(PinBinding),
    #[error("row {row} is out of range, the display has {rows} rows")]
    RowOutOfRange { row: u8, rows: u8 },
    #[error("column {col} is out of range, a DDRAM line has {columns} columns")]
    ColumnOutOfRange { col: u8, columns: u8 },
    #[error("DDRAM address {0:#04x} is out of range")]
    AddressOutOfRange(u8),
    #[error("invalid layout")]
    InvalidLayout,
}

pub type LcdResult<T> = Result<T, LcdError>;
