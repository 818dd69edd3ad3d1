use crate::delay::Delay;
use crate::lcd::hd44780::driver::{
    display_control_command, entry_mode_command, function_set_command, BusWidth, DisplayLayout,
    Font, HD44780Config, HD44780Driver, WidthSync, CLEAR_DISPLAY,
};
use crate::lcd::hd44780::{LcdError, LcdResult};
use crate::{split_nibbles, GpioDirection, GpioDriver, GpioResult};
use log::{debug, trace};

/// HD44780 driver using GPIO pins: RS, RW and E as single pins, and the data lines as one port.
///
/// Only writes are performed. RW is kept low; it is driven rather than tied to ground so the
/// controller never turns the data lines around. Every wait is fixed, see [crate::lcd::hd44780::driver::Timing].
///
/// The driver has exclusive use of the pins for as long as it lives. It is `Send` but not
/// synchronized; wrap it in a mutex to share it between threads.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a> {
    gpio: &'a mut dyn GpioDriver,
    delay: &'a mut dyn Delay,
    config: HD44780Config,
}

impl<'a> GpioHD44780Driver<'a> {
    /// Creates a new driver. Nothing is sent until [HD44780Driver::init] is called.
    ///
    /// # Errors
    /// - `LcdError::DuplicatePin` if RS, RW and E are not three distinct pins.
    pub fn new(
        gpio: &'a mut dyn GpioDriver,
        delay: &'a mut dyn Delay,
        config: HD44780Config,
    ) -> LcdResult<Self> {
        config.validate()?;
        Ok(GpioHD44780Driver {
            gpio,
            delay,
            config,
        })
    }

    pub fn config(&self) -> &HD44780Config {
        &self.config
    }

    /// Clocks one nibble or byte into the controller. The controller latches the data bus on the
    /// falling edge of E, so the data is written while E is high and given time to settle.
    fn pulse_transfer(&mut self, bits: u8) -> LcdResult<()> {
        let timing = self.config.timing;

        self.gpio.write(self.config.e, true)?;
        self.delay.delay(timing.enable_setup);
        self.gpio.write_port(self.config.data, bits)?;
        self.delay.delay(timing.data_setup);
        self.gpio.write(self.config.e, false)?;
        self.delay.delay(timing.hold);
        Ok(())
    }

    fn send(&mut self, data: u8, rs: bool) -> LcdResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        self.gpio.write(self.config.rs, rs)?;
        self.gpio.write(self.config.rw, false)?;
        self.delay.delay(self.config.timing.address_setup);

        match self.config.bus_width {
            BusWidth::Eight => self.pulse_transfer(data)?,
            BusWidth::Four => {
                let [high_nibble, low_nibble] = split_nibbles(data);
                trace!("Writing HN: {:04b}", high_nibble);
                self.pulse_transfer(high_nibble)?;
                trace!("Writing LN: {:04b}", low_nibble);
                self.pulse_transfer(low_nibble)?;
            }
        }

        Ok(())
    }

    fn setup_pins(&mut self) -> GpioResult<()> {
        for pin in [self.config.rs, self.config.rw, self.config.e] {
            self.gpio.pin_as_output(pin)?;
        }
        self.gpio
            .set_port_direction(self.config.data, GpioDirection::Output)
    }

    /// Clocks a single nibble of the 4-bit reset sequence as a command, then waits the init step.
    /// The nibble goes on its own: before the switch to 4-bit mode the controller takes every
    /// nibble as a whole 8-bit instruction and needs the full wait after each one.
    fn reset_nibble(&mut self, nibble: u8) -> LcdResult<()> {
        debug!("Reset nibble: {:04b}", nibble);
        self.gpio.write(self.config.rs, false)?;
        self.gpio.write(self.config.rw, false)?;
        self.delay.delay(self.config.timing.address_setup);
        self.pulse_transfer(nibble)?;
        self.delay.delay(self.config.timing.init_step);
        Ok(())
    }

    fn init_command(&mut self, command: u8) -> LcdResult<()> {
        debug!("Init command: {:08b}", command);
        self.send_command(command)?;
        self.delay.delay(self.config.timing.init_step);
        Ok(())
    }
}

impl HD44780Driver for GpioHD44780Driver<'_> {
    /// Initializes the controller:
    ///
    /// 1. RS, RW, E and the data port are configured as outputs;
    /// 2. the power-on settle time passes;
    /// 3. with [WidthSync::Reset], the datasheet reset sequence brings the controller into the
    ///    configured bus width (`0x30` three times on an 8-bit bus; nibbles `3, 3, 3, 2` on a
    ///    4-bit bus);
    /// 4. function set, display control, clear display and entry mode set are sent, in that
    ///    order.
    ///
    /// Every command, and every nibble of the reset sequence, is followed by the init step wait.
    ///
    /// # Errors
    /// - `LcdError::Setup` if the pins cannot be configured. Nothing is sent in that case.
    fn init(&mut self) -> LcdResult<()> {
        debug!("Configuring LCD pins...");
        self.setup_pins().map_err(LcdError::Setup)?;

        self.delay.delay(self.config.timing.power_on);

        match (self.config.width_sync, self.config.bus_width) {
            (WidthSync::Reset, BusWidth::Eight) => {
                let wake_up = function_set_command(BusWidth::Eight, false, Font::Dots5x8);
                for _ in 0..3 {
                    self.init_command(wake_up)?;
                }
            }
            (WidthSync::Reset, BusWidth::Four) => {
                for nibble in [0b0011, 0b0011, 0b0011, 0b0010] {
                    self.reset_nibble(nibble)?;
                }
            }
            (WidthSync::Skip, _) => {}
        }

        let config = self.config;
        self.init_command(function_set_command(
            config.bus_width,
            config.two_lines(),
            config.font,
        ))?;
        self.init_command(display_control_command(config.display))?;
        self.init_command(CLEAR_DISPLAY)?;
        self.init_command(entry_mode_command(config.entry))?;

        debug!("LCD initialized.");
        Ok(())
    }

    fn layout(&self) -> &DisplayLayout {
        &self.config.layout
    }

    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.send(command, false)
    }

    fn display_character(&mut self, data: u8) -> LcdResult<()> {
        self.send(data, true)
    }

    fn wait_long_instruction(&mut self) {
        self.delay.delay(self.config.timing.clear_settle);
    }
}
