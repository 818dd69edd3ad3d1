//! HD44780 command/data layer.
//!
//! See [HD44780Driver] for the command set, and [GpioHD44780Driver] for the implementation
//! over GPIO pins.

mod config;
mod gpio;

use crate::lcd::hd44780::{LcdError, LcdResult};
pub use config::*;
pub use gpio::*;
use std::fmt::Debug;

pub const CLEAR_DISPLAY: u8 = 0b00000001;
pub const RETURN_HOME: u8 = 0b00000010;
pub const ENTRY_MODE_SET: u8 = 0b00000100;
pub const DISPLAY_CONTROL: u8 = 0b00001000;
pub const CURSOR_SHIFT: u8 = 0b00010000;
pub const FUNCTION_SET: u8 = 0b00100000;
pub const SET_DDRAM_ADDRESS: u8 = 0b10000000;

/// Highest DDRAM address; the address field of the set DDRAM address command is 7 bits wide.
pub const DDRAM_MAX_ADDRESS: u8 = 0b01111111;

/// Command: `000001IS`.
/// `I` is `1` for right cursor direction (address increment), `0` for left.
/// `S` is `1` to shift the display along with the cursor.
pub fn entry_mode_command(mode: EntryMode) -> u8 {
    let mut command = ENTRY_MODE_SET;
    if mode.direction == CursorDirection::Right {
        command |= 0b00000010;
    }
    if mode.shift {
        command |= 0b00000001;
    }
    command
}

/// Command: `00001DCB`.
/// `D` is `1` for display on, `C` for cursor on, `B` for cursor blinking.
pub fn display_control_command(control: DisplayControl) -> u8 {
    let mut command = DISPLAY_CONTROL;
    if control.display_on {
        command |= 0b00000100;
    }
    if control.cursor_on {
        command |= 0b00000010;
    }
    if control.blink_on {
        command |= 0b00000001;
    }
    command
}

/// Command: `0001SR??`.
/// `S` is `1` for display shift, `0` for cursor move.
/// `R` is `1` for right, `0` for left.
pub fn cursor_shift_command(display_shift: bool, direction: CursorDirection) -> u8 {
    let mut command = CURSOR_SHIFT;
    if display_shift {
        command |= 0b00001000;
    }
    if direction == CursorDirection::Right {
        command |= 0b00000100;
    }
    command
}

/// Command: `001DNF??`.
/// `D` is `1` for the 8-bit bus, `0` for 4-bit.
/// `N` is `1` for 2 lines, `F` is `1` for the 5x10 font.
pub fn function_set_command(bus_width: BusWidth, two_lines: bool, font: Font) -> u8 {
    let mut command = FUNCTION_SET;
    if bus_width == BusWidth::Eight {
        command |= 0b00010000;
    }
    if two_lines {
        command |= 0b00001000;
    }
    if font == Font::Dots5x10 {
        command |= 0b00000100;
    }
    command
}

/// Write-only HD44780 interface.
///
/// Implementors provide the raw transfers ([Self::send_command] and [Self::display_character]),
/// the initialization and the long-instruction wait; the instruction set is built on top of them.
/// The controller is never read, so every instruction is followed by a fixed wait long enough
/// for it to complete, and the next call can be made as soon as the previous one returns.
pub trait HD44780Driver: Debug {
    /// Configures the pins and runs the initialization sequence. Must be called once, before
    /// anything else.
    fn init(&mut self) -> LcdResult<()>;

    /// Gets the row layout of the display.
    fn layout(&self) -> &DisplayLayout;

    /// Sends a command to the instruction register (RS low).
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends a character code to the data register (RS high); it is shown at the cursor, which
    /// then moves according to the entry mode.
    fn display_character(&mut self, data: u8) -> LcdResult<()>;

    /// Blocks for the execution time of clear display and return home, which is much longer
    /// than for the other instructions.
    fn wait_long_instruction(&mut self);

    /// Clears the display and sets the cursor to the home position.
    ///
    /// Command: `00000001`.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.send_command(CLEAR_DISPLAY)?;
        self.wait_long_instruction();
        Ok(())
    }

    /// Sets the cursor to the home position and undoes any display shift.
    ///
    /// Command: `0000001?`.
    fn return_home(&mut self) -> LcdResult<()> {
        self.send_command(RETURN_HOME)?;
        self.wait_long_instruction();
        Ok(())
    }

    /// Sets how the cursor moves after each character and whether the display follows it.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> LcdResult<()> {
        self.send_command(entry_mode_command(EntryMode {
            direction: cursor_direction,
            shift,
        }))
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        self.send_command(display_control_command(DisplayControl {
            display_on,
            cursor_on,
            blink_on,
        }))
    }

    /// Moves the cursor or shifts the display by one position, without writing anything.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> LcdResult<()> {
        self.send_command(cursor_shift_command(display_shift, direction))
    }

    /// Sets the bus width, the number of lines and the font.
    ///
    /// The bus width must match the wiring; changing it on a live display desynchronizes the
    /// nibble order until the next initialization.
    fn function_set(&mut self, bus_width: BusWidth, two_lines: bool, font: Font) -> LcdResult<()> {
        self.send_command(function_set_command(bus_width, two_lines, font))
    }

    /// Sets the DDRAM address, i.e. moves the cursor.
    ///
    /// # Errors
    /// - `LcdError::AddressOutOfRange` if the address does not fit into 7 bits.
    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > DDRAM_MAX_ADDRESS {
            return Err(LcdError::AddressOutOfRange(address));
        }
        self.send_command(SET_DDRAM_ADDRESS | address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_init_bytes() {
        assert_eq!(function_set_command(BusWidth::Eight, true, Font::Dots5x8), 0x38);
        assert_eq!(function_set_command(BusWidth::Four, true, Font::Dots5x8), 0x28);
        assert_eq!(function_set_command(BusWidth::Four, false, Font::Dots5x10), 0x24);
        assert_eq!(display_control_command(DisplayControl::default()), 0x0E);
        assert_eq!(entry_mode_command(EntryMode::default()), 0x06);
    }

    #[test]
    fn display_control_bits() {
        let all = DisplayControl {
            display_on: true,
            cursor_on: true,
            blink_on: true,
        };
        let off = DisplayControl {
            display_on: false,
            cursor_on: false,
            blink_on: false,
        };
        assert_eq!(display_control_command(all), 0x0F);
        assert_eq!(display_control_command(off), 0x08);
    }

    #[test]
    fn shift_and_entry_bits() {
        assert_eq!(cursor_shift_command(false, CursorDirection::Left), 0x10);
        assert_eq!(cursor_shift_command(true, CursorDirection::Right), 0x1C);
        let mode = EntryMode {
            direction: CursorDirection::Left,
            shift: true,
        };
        assert_eq!(entry_mode_command(mode), 0x05);
    }
}
