use crate::lcd::hd44780::{LcdError, LcdResult};
use crate::{PinBinding, PortId};
use std::time::Duration;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BusWidth {
    /// D4..D7 only; every byte is sent as two nibbles.
    Four,
    /// D0..D7.
    Eight,
}

impl BusWidth {
    pub fn bits(self) -> usize {
        match self {
            BusWidth::Four => 4,
            BusWidth::Eight => 8,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Font {
    #[default]
    Dots5x8,
    Dots5x10,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

/// Display on/off, cursor on/off and cursor blinking, as sent by the display control command.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayControl {
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink_on: bool,
}

impl Default for DisplayControl {
    fn default() -> Self {
        DisplayControl {
            display_on: true,
            cursor_on: true,
            blink_on: false,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EntryMode {
    pub direction: CursorDirection,
    pub shift: bool,
}

impl Default for EntryMode {
    fn default() -> Self {
        EntryMode {
            direction: CursorDirection::Right,
            shift: false,
        }
    }
}

/// How the controller is brought into the configured bus width before the first function set.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum WidthSync {
    /// The reset sequence from the HD44780 datasheet: three 8-bit function sets, followed by a
    /// switch to 4-bit mode when the bus is 4 bits wide. Works whatever state the controller is in.
    #[default]
    Reset,
    /// Sends the function set directly. Only safe when the controller is known to be in the
    /// configured bus width already, e.g. after a previous initialization.
    Skip,
}

/// Fixed waits used instead of polling the busy flag.
///
/// Every value is a minimum; all of them must also cover the execution time of the previous
/// instruction, since the busy flag is never read.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Timing {
    /// After setting RS and RW, before raising E.
    pub address_setup: Duration,
    /// After raising E, before writing the data.
    pub enable_setup: Duration,
    /// After writing the data, before the falling edge of E.
    pub data_setup: Duration,
    /// After the falling edge of E.
    pub hold: Duration,
    /// After power-on, before the first command.
    pub power_on: Duration,
    /// After each command of the initialization sequence. At least 4.1 ms, the wait required
    /// after the first function set of the reset sequence.
    pub init_step: Duration,
    /// After clear display and return home.
    pub clear_settle: Duration,
}

impl Timing {
    /// Millisecond waits everywhere. Slow, but tolerant of long wires and sluggish clones.
    pub const CONSERVATIVE: Timing = Timing {
        address_setup: Duration::from_millis(1),
        enable_setup: Duration::from_millis(1),
        data_setup: Duration::from_millis(1),
        hold: Duration::from_millis(1),
        power_on: Duration::from_millis(20),
        init_step: Duration::from_millis(5),
        clear_settle: Duration::from_millis(2),
    };

    /// Datasheet minimums rounded up to whole microseconds; the hold time covers the 37 us
    /// execution time of most instructions.
    pub const FAST: Timing = Timing {
        address_setup: Duration::from_micros(1),
        enable_setup: Duration::from_micros(1),
        data_setup: Duration::from_micros(1),
        hold: Duration::from_micros(50),
        power_on: Duration::from_millis(40),
        init_step: Duration::from_micros(4100),
        clear_settle: Duration::from_micros(1600),
    };
}

impl Default for Timing {
    fn default() -> Self {
        Timing::CONSERVATIVE
    }
}

/// Maps display rows to DDRAM base addresses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayLayout {
    rows: u8,
    row_offsets: [u8; 4],
}

impl DisplayLayout {
    pub const LCD_16X2: DisplayLayout = DisplayLayout {
        rows: 2,
        row_offsets: [0x00, 0x40, 0x10, 0x50],
    };
    pub const LCD_20X2: DisplayLayout = DisplayLayout {
        rows: 2,
        row_offsets: [0x00, 0x40, 0x14, 0x54],
    };
    pub const LCD_16X4: DisplayLayout = DisplayLayout {
        rows: 4,
        row_offsets: [0x00, 0x40, 0x10, 0x50],
    };
    pub const LCD_20X4: DisplayLayout = DisplayLayout {
        rows: 4,
        row_offsets: [0x00, 0x40, 0x14, 0x54],
    };

    /// Creates a layout from the base address of each row, at most 4 rows.
    ///
    /// # Errors
    /// - `LcdError::InvalidLayout` if there are no rows or more than 4.
    /// - `LcdError::AddressOutOfRange` if an offset is outside of the DDRAM.
    pub fn new(row_offsets: &[u8]) -> LcdResult<Self> {
        if row_offsets.is_empty() || row_offsets.len() > 4 {
            return Err(LcdError::InvalidLayout);
        }
        if let Some(&offset) = row_offsets.iter().find(|&&offset| offset > 0x7F) {
            return Err(LcdError::AddressOutOfRange(offset));
        }

        let mut offsets = [0u8; 4];
        offsets[..row_offsets.len()].copy_from_slice(row_offsets);
        Ok(DisplayLayout {
            rows: row_offsets.len() as u8,
            row_offsets: offsets,
        })
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn row_offset(&self, row: u8) -> LcdResult<u8> {
        if row >= self.rows {
            return Err(LcdError::RowOutOfRange {
                row,
                rows: self.rows,
            });
        }
        Ok(self.row_offsets[row as usize])
    }
}

impl Default for DisplayLayout {
    fn default() -> Self {
        DisplayLayout::LCD_16X4
    }
}

/// Everything the driver needs to know about the wiring and the wanted display setup.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HD44780Config {
    pub rs: PinBinding,
    pub rw: PinBinding,
    pub e: PinBinding,
    pub data: PortId,
    pub bus_width: BusWidth,
    pub font: Font,
    pub display: DisplayControl,
    pub entry: EntryMode,
    pub layout: DisplayLayout,
    pub timing: Timing,
    pub width_sync: WidthSync,
}

impl HD44780Config {
    pub fn new(
        rs: PinBinding,
        rw: PinBinding,
        e: PinBinding,
        data: PortId,
        bus_width: BusWidth,
    ) -> Self {
        HD44780Config {
            rs,
            rw,
            e,
            data,
            bus_width,
            font: Font::default(),
            display: DisplayControl::default(),
            entry: EntryMode::default(),
            layout: DisplayLayout::default(),
            timing: Timing::default(),
            width_sync: WidthSync::default(),
        }
    }

    pub fn with_layout(mut self, layout: DisplayLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_display_control(mut self, display: DisplayControl) -> Self {
        self.display = display;
        self
    }

    pub fn with_entry_mode(mut self, entry: EntryMode) -> Self {
        self.entry = entry;
        self
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_width_sync(mut self, width_sync: WidthSync) -> Self {
        self.width_sync = width_sync;
        self
    }

    /// Whether the function set selects the 2-line mode. 4-line displays are 2-line internally.
    pub fn two_lines(&self) -> bool {
        self.layout.rows() > 1
    }

    /// Checks that RS, RW and E are three distinct pins.
    pub fn validate(&self) -> LcdResult<()> {
        if self.rs == self.rw || self.rs == self.e {
            return Err(LcdError::DuplicatePin(self.rs));
        }
        if self.rw == self.e {
            return Err(LcdError::DuplicatePin(self.rw));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HD44780Config {
        HD44780Config::new(
            PinBinding::new(0, 0),
            PinBinding::new(0, 1),
            PinBinding::new(0, 2),
            PortId(1),
            BusWidth::Four,
        )
    }

    #[test]
    fn control_pins_must_be_distinct() {
        assert_eq!(config().validate(), Ok(()));

        let mut shared = config();
        shared.e = shared.rw;
        assert_eq!(
            shared.validate(),
            Err(LcdError::DuplicatePin(PinBinding::new(0, 1)))
        );

        let mut shared = config();
        shared.rs = shared.e;
        assert_eq!(
            shared.validate(),
            Err(LcdError::DuplicatePin(PinBinding::new(0, 2)))
        );
    }

    #[test]
    fn layout_rows_map_to_offsets() {
        let layout = DisplayLayout::default();
        assert_eq!(layout.row_offset(0), Ok(0x00));
        assert_eq!(layout.row_offset(1), Ok(0x40));
        assert_eq!(layout.row_offset(2), Ok(0x10));
        assert_eq!(layout.row_offset(3), Ok(0x50));
        assert_eq!(
            layout.row_offset(4),
            Err(LcdError::RowOutOfRange { row: 4, rows: 4 })
        );
        assert_eq!(
            DisplayLayout::LCD_16X2.row_offset(2),
            Err(LcdError::RowOutOfRange { row: 2, rows: 2 })
        );
    }

    #[test]
    fn custom_layouts_are_checked() {
        let layout = DisplayLayout::new(&[0x00, 0x40, 0x14]).unwrap();
        assert_eq!(layout.rows(), 3);
        assert_eq!(layout.row_offset(2), Ok(0x14));
        assert_eq!(DisplayLayout::new(&[]), Err(LcdError::InvalidLayout));
        assert_eq!(
            DisplayLayout::new(&[0, 0, 0, 0, 0]),
            Err(LcdError::InvalidLayout)
        );
        assert_eq!(
            DisplayLayout::new(&[0x00, 0x80]),
            Err(LcdError::AddressOutOfRange(0x80))
        );
    }

    #[test]
    fn single_row_layout_uses_one_line_mode() {
        let config = config().with_layout(DisplayLayout::new(&[0x00]).unwrap());
        assert!(!config.two_lines());
        assert!(self::config().two_lines());
    }
}
