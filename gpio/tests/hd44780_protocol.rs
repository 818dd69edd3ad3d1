use charlcd_gpio::lcd::hd44780::driver::{
    BusWidth, DisplayLayout, GpioHD44780Driver, HD44780Config, HD44780Driver, Timing,
};
use charlcd_gpio::lcd::hd44780::{HD44780Text, LcdResult};
use charlcd_gpio::mock::{Latch, MockDelay, MockGpio, MockLog, MockWiring};
use charlcd_gpio::{PinBinding, PortId};
use proptest::prelude::*;

const WIRING: MockWiring = MockWiring {
    rs: PinBinding::new(0, 4),
    rw: PinBinding::new(0, 5),
    e: PinBinding::new(0, 6),
    data: PortId(2),
};

/// Initializes a display on the mocks, runs `f` and returns the latches `f` produced.
fn latches_of(
    bus_width: BusWidth,
    f: impl FnOnce(&mut GpioHD44780Driver) -> LcdResult<()>,
) -> Vec<Latch> {
    let log = MockLog::new();
    let mut gpio = MockGpio::new(log.clone()).with_port_width(WIRING.data, bus_width.bits());
    let mut delay = MockDelay::new(log.clone());
    let config = HD44780Config::new(WIRING.rs, WIRING.rw, WIRING.e, WIRING.data, bus_width)
        .with_timing(Timing::FAST);

    let mut lcd = GpioHD44780Driver::new(&mut gpio, &mut delay, config).unwrap();
    lcd.init().unwrap();
    log.clear();
    f(&mut lcd).unwrap();

    log.latches(&WIRING)
}

fn bus_width() -> impl Strategy<Value = BusWidth> {
    prop_oneof![Just(BusWidth::Four), Just(BusWidth::Eight)]
}

proptest! {
    #[test]
    fn bytes_are_latched_whole_or_as_two_nibbles(
        byte in any::<u8>(),
        data in any::<bool>(),
        bus_width in bus_width(),
    ) {
        let latches = latches_of(bus_width, |lcd| {
            if data {
                lcd.display_character(byte)
            } else {
                lcd.send_command(byte)
            }
        });

        let expected = match bus_width {
            BusWidth::Eight => vec![byte],
            BusWidth::Four => vec![byte >> 4, byte & 0x0F],
        };
        let latched: Vec<u8> = latches.iter().map(|latch| latch.data).collect();
        prop_assert_eq!(latched, expected);
        for latch in &latches {
            prop_assert_eq!(latch.rs, data);
            prop_assert!(!latch.rw);
            prop_assert!(latch.data_setup >= Timing::FAST.data_setup);
        }
    }

    #[test]
    fn cursor_address_is_row_offset_plus_column(row in 0u8..4, col in 0u8..40) {
        let latches = latches_of(BusWidth::Eight, |lcd| lcd.move_cursor(row, col));
        let offsets = [0x00, 0x40, 0x10, 0x50];
        prop_assert_eq!(latches.len(), 1);
        prop_assert_eq!(latches[0].data, (offsets[row as usize] + col) | 0x80);
        prop_assert!(!latches[0].rs);
    }
}

#[test]
fn text_reaches_the_bus_in_order() {
    let latches = latches_of(BusWidth::Four, |lcd| {
        lcd.display_string_row_column(2, 5, "Hi")?;
        lcd.display_integer(-42)
    });

    let bytes: Vec<(bool, u8)> = latches
        .chunks_exact(2)
        .map(|pair| (pair[0].rs, (pair[0].data << 4) | pair[1].data))
        .collect();
    assert_eq!(
        bytes,
        vec![
            (false, 0x95),
            (true, b'H'),
            (true, b'i'),
            (true, b'-'),
            (true, b'4'),
            (true, b'2'),
        ]
    );
}

#[test]
fn wide_layout_addresses_rows_three_and_four() {
    let log = MockLog::new();
    let mut gpio = MockGpio::new(log.clone());
    let mut delay = MockDelay::new(log.clone());
    let config = HD44780Config::new(WIRING.rs, WIRING.rw, WIRING.e, WIRING.data, BusWidth::Eight)
        .with_layout(DisplayLayout::LCD_20X4);
    let mut lcd = GpioHD44780Driver::new(&mut gpio, &mut delay, config).unwrap();
    lcd.init().unwrap();
    log.clear();

    lcd.move_cursor(3, 19).unwrap();
    assert_eq!(log.port_writes(WIRING.data), vec![0x80 | (0x54 + 19)]);
}

#[test]
fn shared_display_is_serialized_by_a_mutex() {
    use std::sync::Mutex;
    use std::thread;

    let log = MockLog::new();
    let mut gpio = MockGpio::new(log.clone());
    let mut delay = MockDelay::new(log.clone());
    let config =
        HD44780Config::new(WIRING.rs, WIRING.rw, WIRING.e, WIRING.data, BusWidth::Eight)
            .with_timing(Timing::FAST);
    let lcd = Mutex::new(GpioHD44780Driver::new(&mut gpio, &mut delay, config).unwrap());

    lcd.lock().unwrap().init().unwrap();
    log.clear();

    thread::scope(|s| {
        for (row, text) in [(0, "ab"), (1, "cd")] {
            let lcd = &lcd;
            s.spawn(move || {
                lcd.lock()
                    .unwrap()
                    .display_string_row_column(row, 0, text)
                    .unwrap();
            });
        }
    });

    let first = vec![0x80, b'a', b'b'];
    let second = vec![0xC0, b'c', b'd'];
    let writes = log.port_writes(WIRING.data);
    assert!(
        writes == [first.clone(), second.clone()].concat()
            || writes == [second, first].concat(),
        "interleaved writes: {:02X?}",
        writes
    );
}
