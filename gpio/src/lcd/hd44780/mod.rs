//! HD44780 character LCD module.
//!
//! [driver::HD44780Driver] is the command/data layer, implemented over GPIO pins by
//! [driver::GpioHD44780Driver]. Text output and cursor addressing are layered on top of any
//! driver by [HD44780Text].

pub mod driver;
mod error;
mod text;

pub use error::*;
pub use text::*;
