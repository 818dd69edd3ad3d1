use crate::lcd::hd44780::driver::HD44780Driver;
use crate::lcd::hd44780::{LcdError, LcdResult};
use log::warn;

/// Number of DDRAM addresses per display line; columns beyond the visible width still exist
/// and scroll into view with display shifts.
pub const DDRAM_LINE_LENGTH: u8 = 40;

/// Text output and cursor addressing for any [HD44780Driver].
pub trait HD44780Text {
    /// Writes the text at the cursor, stopping at the first NUL character.
    ///
    /// The controller only knows single-byte character codes, so non-ASCII characters are
    /// replaced with `?`.
    fn display_string(&mut self, text: &str) -> LcdResult<()>;

    /// Moves the cursor to the given row and column.
    ///
    /// # Errors
    /// - `LcdError::RowOutOfRange` if the layout has no such row.
    /// - `LcdError::ColumnOutOfRange` if `col` is not below [DDRAM_LINE_LENGTH].
    ///
    /// Nothing is sent in either case.
    fn move_cursor(&mut self, row: u8, col: u8) -> LcdResult<()>;

    /// Moves the cursor, then writes the text. Nothing is written if the position is invalid.
    fn display_string_row_column(&mut self, row: u8, col: u8, text: &str) -> LcdResult<()>;

    /// Writes the decimal representation of the value.
    fn display_integer(&mut self, value: i32) -> LcdResult<()>;

    /// Clears the display and moves the cursor home.
    fn clear_screen(&mut self) -> LcdResult<()>;
}

impl<T: ?Sized + HD44780Driver> HD44780Text for T {
    fn display_string(&mut self, text: &str) -> LcdResult<()> {
        for c in text.chars().take_while(|&c| c != '\0') {
            if c.is_ascii() {
                self.display_character(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.display_character(b'?')?;
            }
        }
        Ok(())
    }

    fn move_cursor(&mut self, row: u8, col: u8) -> LcdResult<()> {
        let offset = self.layout().row_offset(row)?;
        if col >= DDRAM_LINE_LENGTH {
            return Err(LcdError::ColumnOutOfRange {
                col,
                columns: DDRAM_LINE_LENGTH,
            });
        }
        self.set_ddram_address(offset + col)
    }

    fn display_string_row_column(&mut self, row: u8, col: u8, text: &str) -> LcdResult<()> {
        self.move_cursor(row, col)?;
        self.display_string(text)
    }

    fn display_integer(&mut self, value: i32) -> LcdResult<()> {
        self.display_string(&value.to_string())
    }

    fn clear_screen(&mut self) -> LcdResult<()> {
        self.clear_display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::hd44780::driver::DisplayLayout;

    /// Records the bytes sent, `false` for commands and `true` for characters.
    #[derive(Debug, Default)]
    struct Recorder {
        layout: DisplayLayout,
        sent: Vec<(bool, u8)>,
        long_waits: usize,
    }

    impl Recorder {
        fn characters(&self) -> Vec<u8> {
            self.sent
                .iter()
                .filter(|(rs, _)| *rs)
                .map(|&(_, byte)| byte)
                .collect()
        }

        fn commands(&self) -> Vec<u8> {
            self.sent
                .iter()
                .filter(|(rs, _)| !*rs)
                .map(|&(_, byte)| byte)
                .collect()
        }
    }

    impl HD44780Driver for Recorder {
        fn init(&mut self) -> LcdResult<()> {
            Ok(())
        }

        fn layout(&self) -> &DisplayLayout {
            &self.layout
        }

        fn send_command(&mut self, command: u8) -> LcdResult<()> {
            self.sent.push((false, command));
            Ok(())
        }

        fn display_character(&mut self, data: u8) -> LcdResult<()> {
            self.sent.push((true, data));
            Ok(())
        }

        fn wait_long_instruction(&mut self) {
            self.long_waits += 1;
        }
    }

    #[test]
    fn empty_string_sends_nothing() {
        let mut lcd = Recorder::default();
        lcd.display_string("").unwrap();
        assert!(lcd.sent.is_empty());
    }

    #[test]
    fn string_characters_are_sent_in_order() {
        let mut lcd = Recorder::default();
        lcd.display_string("Hi").unwrap();
        assert_eq!(lcd.sent, vec![(true, b'H'), (true, b'i')]);
    }

    #[test]
    fn string_stops_at_nul() {
        let mut lcd = Recorder::default();
        lcd.display_string("ab\0cd").unwrap();
        assert_eq!(lcd.characters(), b"ab".to_vec());
    }

    #[test]
    fn non_ascii_is_replaced() {
        let mut lcd = Recorder::default();
        lcd.display_string("20°C").unwrap();
        assert_eq!(lcd.characters(), b"20?C".to_vec());
    }

    #[test]
    fn cursor_rows_use_the_layout_offsets() {
        let mut lcd = Recorder::default();
        lcd.move_cursor(0, 0).unwrap();
        lcd.move_cursor(1, 3).unwrap();
        lcd.move_cursor(2, 5).unwrap();
        lcd.move_cursor(3, 39).unwrap();
        assert_eq!(lcd.commands(), vec![0x80, 0xC3, 0x95, 0xD0 + 39]);

        let mut lcd = Recorder {
            layout: DisplayLayout::LCD_20X4,
            ..Default::default()
        };
        lcd.move_cursor(2, 5).unwrap();
        assert_eq!(lcd.commands(), vec![0x80 | 0x19]);
    }

    #[test]
    fn cursor_out_of_range_sends_nothing() {
        let mut lcd = Recorder::default();
        assert_eq!(
            lcd.move_cursor(4, 0),
            Err(LcdError::RowOutOfRange { row: 4, rows: 4 })
        );
        assert_eq!(
            lcd.move_cursor(0, 40),
            Err(LcdError::ColumnOutOfRange {
                col: 40,
                columns: 40
            })
        );
        assert_eq!(
            lcd.display_string_row_column(7, 0, "lost"),
            Err(LcdError::RowOutOfRange { row: 7, rows: 4 })
        );
        assert!(lcd.sent.is_empty());
    }

    #[test]
    fn string_at_row_column_moves_first() {
        let mut lcd = Recorder::default();
        lcd.display_string_row_column(1, 2, "ok").unwrap();
        assert_eq!(lcd.sent, vec![(false, 0xC2), (true, b'o'), (true, b'k')]);
    }

    #[test]
    fn integers_are_decimal() {
        let mut lcd = Recorder::default();
        lcd.display_integer(-42).unwrap();
        assert_eq!(lcd.characters(), b"-42".to_vec());

        let mut lcd = Recorder::default();
        lcd.display_integer(0).unwrap();
        assert_eq!(lcd.characters(), b"0".to_vec());

        let mut lcd = Recorder::default();
        lcd.display_integer(i32::MIN).unwrap();
        assert_eq!(lcd.characters(), b"-2147483648".to_vec());

        let mut lcd = Recorder::default();
        lcd.display_integer(1200).unwrap();
        assert_eq!(lcd.characters(), b"1200".to_vec());
    }

    #[test]
    fn clear_screen_waits_for_the_clear() {
        let mut lcd = Recorder::default();
        lcd.clear_screen().unwrap();
        assert_eq!(lcd.commands(), vec![0x01]);
        assert_eq!(lcd.long_waits, 1);
    }
}
