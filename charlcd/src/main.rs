mod config;

use crate::config::Config;
use charlcd_gpio::delay::{Delay, StdDelay};
use charlcd_gpio::gpiod::GpiodDriver;
use charlcd_gpio::lcd::hd44780::driver::{BusWidth, GpioHD44780Driver, HD44780Driver};
use charlcd_gpio::lcd::hd44780::HD44780Text;
use charlcd_gpio::mock::{MockDelay, MockGpio, MockLog};
use charlcd_gpio::GpioDriver;
use dotenv::dotenv;
use log::{debug, info, warn};
use std::thread::sleep;
use std::time::Duration;
use sysinfo::System;
use time::macros::format_description;
use time::OffsetDateTime;

const UNKNOWN_STR: &str = "???";

/// Pads or cuts the text to exactly `width` characters, so it overwrites the whole row.
fn fit(text: &str, width: usize) -> String {
    format!("{:<width$.width$}", text, width = width)
}

/// Whether [fit] has to cut the text to make it `width` characters wide.
fn is_cut(text: &str, width: usize) -> bool {
    text.chars().count() > width
}

fn clock() -> eyre::Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| {
        debug!("Local offset unavailable, using UTC");
        OffsetDateTime::now_utc()
    });
    Ok(now.format(format_description!("[hour]:[minute]:[second]"))?)
}

/// Draws the rows that change every second: uptime on the third row, the clock on the last one.
fn draw_status(lcd: &mut dyn HD44780Driver, columns: usize) -> eyre::Result<()> {
    let rows = lcd.layout().rows();

    if rows > 3 {
        let uptime = i32::try_from(System::uptime()).unwrap_or(i32::MAX);
        lcd.move_cursor(2, 0)?;
        lcd.display_string("Up ")?;
        lcd.display_integer(uptime)?;
        lcd.display_string("s    ")?;
    }

    lcd.display_string_row_column(rows - 1, 0, &fit(&clock()?, columns))?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("charlcd starting...");
    info!(
        "Host {} running {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    let config = Config::load()?;
    info!(
        "LCD @ RS: {}, RW: {}, E: {}, Data: {:?} on {}",
        config.pin_rs, config.pin_rw, config.pin_e, config.pins_data, config.chip
    );

    let log = MockLog::new();
    let (mut gpio, mut delay): (Box<dyn GpioDriver>, Box<dyn Delay>) = if config.is_mock() {
        info!("Dry run, nothing is sent to hardware.");
        (
            Box::new(MockGpio::new(log.clone())) as Box<dyn GpioDriver>,
            Box::new(MockDelay::new(log.clone())) as Box<dyn Delay>,
        )
    } else {
        let gpio = GpiodDriver::open(&config.chip, config.port_map())?;
        debug!("{:?} initialized.", gpio);
        (Box::new(gpio) as Box<dyn GpioDriver>, Box::new(StdDelay) as Box<dyn Delay>)
    };

    {
        debug!("Initializing LCD driver...");
        let mut lcd = GpioHD44780Driver::new(&mut *gpio, &mut *delay, config.lcd_config()?)?;
        lcd.init()?;
        debug!("{:?} initialized.", lcd);

        let columns = config.layout.columns();
        if is_cut(&config.message, columns) {
            warn!("Message is longer than {} columns and will be cut.", columns);
        }
        lcd.display_string_row_column(0, 0, &fit(&config.message, columns))?;

        if lcd.layout().rows() > 2 {
            let host = System::host_name().unwrap_or_else(|| UNKNOWN_STR.to_string());
            lcd.display_string_row_column(1, 0, &fit(&host, columns))?;
        }

        draw_status(&mut lcd, columns)?;
        for _ in 0..config.seconds {
            sleep(Duration::from_secs(1));
            draw_status(&mut lcd, columns)?;
        }
    }

    if config.is_mock() {
        let wiring = config.wiring();
        let transfers = match config.bus_width()? {
            BusWidth::Four => log.latched_bytes(&wiring),
            BusWidth::Eight => log.latches(&wiring),
        };
        for transfer in &transfers {
            let kind = if transfer.rs { "data" } else { "command" };
            info!("{:>7} {:08b} {:?}", kind, transfer.data, transfer.data as char);
        }
        info!(
            "{} transfers, {:?} of waits.",
            transfers.len(),
            log.delays().iter().sum::<Duration>()
        );
    }

    info!("charlcd done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_or_cut_to_width() {
        assert_eq!(fit("hi", 4), "hi  ");
        assert_eq!(fit("hello", 4), "hell");
    }

    #[test]
    fn cut_counts_characters_not_bytes() {
        assert!(!is_cut("Grüße", 5));
        assert_eq!(fit("Grüße", 5), "Grüße");
        assert!(is_cut("Grüße!", 5));
    }
}
