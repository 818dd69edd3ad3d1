use charlcd_gpio::gpiod::PortMap;
use charlcd_gpio::lcd::hd44780::driver::{
    BusWidth, DisplayControl, DisplayLayout, HD44780Config, Timing, WidthSync,
};
use charlcd_gpio::mock::MockWiring;
use charlcd_gpio::{PinBinding, PortId};
use eyre::{bail, eyre, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::Path;
use std::str::FromStr;

/// Chip name selecting the in-memory GPIO instead of real hardware.
pub const MOCK_CHIP: &str = "mock";

const CONTROL_PORT: PortId = PortId(0);
const DATA_PORT: PortId = PortId(1);
const RS: PinBinding = PinBinding::new(0, 0);
const RW: PinBinding = PinBinding::new(0, 1);
const E: PinBinding = PinBinding::new(0, 2);

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Layout {
    #[serde(rename = "16x2")]
    Lcd16x2,
    #[serde(rename = "20x2")]
    Lcd20x2,
    #[default]
    #[serde(rename = "16x4")]
    Lcd16x4,
    #[serde(rename = "20x4")]
    Lcd20x4,
}

impl Layout {
    pub fn display_layout(self) -> DisplayLayout {
        match self {
            Layout::Lcd16x2 => DisplayLayout::LCD_16X2,
            Layout::Lcd20x2 => DisplayLayout::LCD_20X2,
            Layout::Lcd16x4 => DisplayLayout::LCD_16X4,
            Layout::Lcd20x4 => DisplayLayout::LCD_20X4,
        }
    }

    pub fn columns(self) -> usize {
        match self {
            Layout::Lcd16x2 | Layout::Lcd16x4 => 16,
            Layout::Lcd20x2 | Layout::Lcd20x4 => 20,
        }
    }
}

impl FromStr for Layout {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16x2" => Ok(Layout::Lcd16x2),
            "20x2" => Ok(Layout::Lcd20x2),
            "16x4" => Ok(Layout::Lcd16x4),
            "20x4" => Ok(Layout::Lcd20x4),
            other => Err(eyre!("Unknown layout {:?}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// GPIO chip device, or [MOCK_CHIP] for a dry run.
    pub chip: String,
    pub pin_rs: u32,
    pub pin_rw: u32,
    pub pin_e: u32,
    /// Data lines, D4..D7 for a 4-bit bus or D0..D7 for an 8-bit one, LSb first.
    pub pins_data: Vec<u32>,
    pub layout: Layout,
    pub cursor: bool,
    pub blink: bool,
    pub fast_timing: bool,
    /// Skips the reset sequence; only for a controller that is already in the right bus width.
    pub skip_width_sync: bool,
    pub message: String,
    /// How long the clock keeps running after the first screen, in seconds.
    pub seconds: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chip: "/dev/gpiochip0".to_string(),
            pin_rs: 22,
            pin_rw: 27,
            pin_e: 17,
            pins_data: vec![26, 16, 20, 21],
            layout: Layout::default(),
            cursor: false,
            blink: false,
            fast_timing: false,
            skip_width_sync: false,
            message: "Hello, charlcd!".to_string(),
            seconds: 10,
        }
    }
}

pub fn parse_pin_bus(pin_str: &str) -> eyre::Result<Vec<u32>> {
    let pins = pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?;
    if pins.len() != 4 && pins.len() != 8 {
        bail!("Invalid number of data pins: {}", pins.len());
    }
    Ok(pins)
}

fn parse_bool(s: &str) -> eyre::Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(eyre!("Invalid boolean {:?}", other)),
    }
}

impl Config {
    /// Loads the JSON config file named by `CHARLCD_CONFIG` (default `charlcd.json`), if it exists.
    pub fn try_load() -> eyre::Result<Option<Self>> {
        let config_str = std::env::var_os("CHARLCD_CONFIG");
        let config_str: &OsStr = config_str
            .as_deref()
            .unwrap_or(OsStr::new("charlcd.json"));
        let config_path = Path::new(config_str);
        if !config_path.exists() {
            return Ok(None);
        }

        debug!("Loading config from {}", config_path.display());
        let file = std::fs::File::open(config_path)?;
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .wrap_err_with(|| format!("Invalid config file {}", config_path.display()))?;
        Ok(Some(config))
    }

    /// Builds the config from the defaults, overridden by the `CHARLCD_*` variables that are set.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let mut config = Config::default();

        if let Some(chip) = var("CHARLCD_CHIP") {
            config.chip = chip;
        }
        if let Some(pin) = var("CHARLCD_LCD_PIN_RS") {
            config.pin_rs = pin.parse().wrap_err("CHARLCD_LCD_PIN_RS")?;
        }
        if let Some(pin) = var("CHARLCD_LCD_PIN_RW") {
            config.pin_rw = pin.parse().wrap_err("CHARLCD_LCD_PIN_RW")?;
        }
        if let Some(pin) = var("CHARLCD_LCD_PIN_E") {
            config.pin_e = pin.parse().wrap_err("CHARLCD_LCD_PIN_E")?;
        }
        if let Some(pins) = var("CHARLCD_LCD_PINS_DATA") {
            config.pins_data = parse_pin_bus(&pins)?;
        }
        if let Some(layout) = var("CHARLCD_LCD_LAYOUT") {
            config.layout = layout.parse()?;
        }
        if let Some(cursor) = var("CHARLCD_LCD_CURSOR") {
            config.cursor = parse_bool(&cursor)?;
        }
        if let Some(blink) = var("CHARLCD_LCD_BLINK") {
            config.blink = parse_bool(&blink)?;
        }
        if let Some(fast) = var("CHARLCD_LCD_FAST_TIMING") {
            config.fast_timing = parse_bool(&fast)?;
        }
        if let Some(skip) = var("CHARLCD_LCD_SKIP_WIDTH_SYNC") {
            config.skip_width_sync = parse_bool(&skip)?;
        }
        if let Some(message) = var("CHARLCD_MESSAGE") {
            config.message = message;
        }
        if let Some(seconds) = var("CHARLCD_SECONDS") {
            config.seconds = seconds.parse().wrap_err("CHARLCD_SECONDS")?;
        }

        Ok(config)
    }

    /// The config file if there is one, otherwise the environment.
    pub fn load() -> eyre::Result<Self> {
        match Self::try_load()? {
            Some(config) => Ok(config),
            None => Self::from_vars(|name| dotenv::var(name).ok()),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.chip == MOCK_CHIP
    }

    pub fn bus_width(&self) -> eyre::Result<BusWidth> {
        match self.pins_data.len() {
            4 => Ok(BusWidth::Four),
            8 => Ok(BusWidth::Eight),
            n => Err(eyre!("Invalid number of data pins: {}", n)),
        }
    }

    /// RS, RW and E form the control port, in that order; the data lines form the data port.
    pub fn port_map(&self) -> PortMap {
        PortMap::new()
            .with_port(CONTROL_PORT, [self.pin_rs, self.pin_rw, self.pin_e])
            .with_port(DATA_PORT, self.pins_data.clone())
    }

    pub fn wiring(&self) -> MockWiring {
        MockWiring {
            rs: RS,
            rw: RW,
            e: E,
            data: DATA_PORT,
        }
    }

    pub fn lcd_config(&self) -> eyre::Result<HD44780Config> {
        let timing = if self.fast_timing {
            Timing::FAST
        } else {
            Timing::CONSERVATIVE
        };
        let width_sync = if self.skip_width_sync {
            WidthSync::Skip
        } else {
            WidthSync::Reset
        };

        Ok(
            HD44780Config::new(RS, RW, E, DATA_PORT, self.bus_width()?)
                .with_layout(self.layout.display_layout())
                .with_display_control(DisplayControl {
                    display_on: true,
                    cursor_on: self.cursor,
                    blink_on: self.blink,
                })
                .with_timing(timing)
                .with_width_sync(width_sync),
        )
    }
}
