//! Portable core of `ttyport`: serial port options, their validation, and their translation into
//! terminal control registers.
//!
//! Nothing in this crate touches a device. Platform crates such as `ttyport-unix` take the
//! [`ControlRegisterImage`] built here, pack it into their own register layout, and apply it.

use std::io;
use std::time::{Duration, Instant};

pub use baud::{is_standard_baud_rate, Family, PLACEHOLDER_BAUD_RATE};
pub use error::{ControlCall, Error, ErrorKind, Result};
pub use image::{
    quantize_timeout, ControlChars, ControlModes, ControlRegisterImage, InputModes, LocalModes,
    OutputModes,
};

pub use CharSize::*;

/// A module that exports traits that are useful to have in scope.
///
/// It is intended to be glob imported:
///
/// ```no_run
/// use ttyport_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::SerialPort;
}

mod baud;
mod error;
mod image;

/// Number of bits per character.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CharSize {
    /** 5 bits per character. */ Bits5,
    /** 6 bits per character. */ Bits6,
    /** 7 bits per character. */ Bits7,
    /** 8 bits per character. */ Bits8,
}

impl CharSize {
    /// Returns the character size for a number of data bits, if it is one of 5, 6, 7 or 8.
    pub fn from_bits(bits: u8) -> Option<CharSize> {
        match bits {
            5 => Some(Bits5),
            6 => Some(Bits6),
            7 => Some(Bits7),
            8 => Some(Bits8),
            _ => None,
        }
    }

    /// Returns the number of data bits.
    pub fn bits(self) -> u8 {
        match self {
            Bits5 => 5,
            Bits6 => 6,
            Bits7 => 7,
            Bits8 => 8,
        }
    }
}

/// Parity checking modes.
///
/// When parity checking is enabled (`Odd` or `Even`) an extra bit is transmitted with each
/// character. The value of the parity bit is arranged so that the number of 1 bits in the
/// character (including the parity bit) is an even number (`Even`) or an odd number (`Odd`).
///
/// Parity checking is disabled by setting `None`, in which case parity bits are not transmitted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParityMode {
    /// No parity bit.
    #[default]
    None,

    /// Parity bit sets odd number of 1 bits.
    Odd,

    /// Parity bit sets even number of 1 bits.
    Even,
}

impl TryFrom<u32> for ParityMode {
    type Error = Error;

    /// Resolves the numeric encoding `0 = None`, `1 = Odd`, `2 = Even`.
    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(ParityMode::None),
            1 => Ok(ParityMode::Odd),
            2 => Ok(ParityMode::Even),
            _ => Err(Error::configuration("invalid setting for ParityMode")),
        }
    }
}

/// Everything needed to open and configure a serial device.
///
/// The values are validated when the port is opened, before the device is touched.
///
/// ```
/// let options = ttyport_core::OpenOptions {
///     port_name: "/dev/ttyUSB0".into(),
///     baud_rate: 115_200,
///     ..Default::default()
/// };
///
/// assert_eq!(options.data_bits, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OpenOptions {
    /// Path of the device node, e.g. `/dev/ttyUSB0`.
    pub port_name: String,

    /// Baud rate in bits per second. Rates outside the platform's standard set are applied with
    /// an arbitrary-speed call.
    pub baud_rate: u32,

    /// Data bits per character: 5, 6, 7 or 8.
    pub data_bits: u8,

    /// Stop bits per character: 1 or 2.
    pub stop_bits: u8,

    /// Parity checking mode.
    pub parity_mode: ParityMode,

    /// Line-oriented input with the terminal's editing rules. Serial byte streams normally leave
    /// this off.
    pub canonical_mode: bool,

    /// Inter-character timeout in milliseconds, quantized to deciseconds (`VTIME`). Only
    /// meaningful in non-canonical mode.
    pub inter_character_timeout: u32,

    /// Minimum number of bytes a non-canonical read waits for (`VMIN`).
    pub minimum_read_size: u32,

    /// RTS/CTS hardware flow control.
    pub rts_cts_flow_control: bool,

    /// Hold the device exclusively while it is open.
    pub exclusive: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            port_name: String::new(),
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity_mode: ParityMode::None,
            canonical_mode: false,
            inter_character_timeout: 100,
            minimum_read_size: 0,
            rts_cts_flow_control: false,
            exclusive: false,
        }
    }
}

impl OpenOptions {
    /// Returns default options for the device at `port_name`.
    pub fn new<T: Into<String>>(port_name: T) -> Self {
        OpenOptions {
            port_name: port_name.into(),
            ..Default::default()
        }
    }

    /// Validates the options and builds the control registers for `family` without opening
    /// anything.
    pub fn control_registers(&self, family: Family) -> Result<ControlRegisterImage> {
        ControlRegisterImage::build(self, family)
    }
}

/// A trait for opened serial devices.
///
/// Input and output go through `std::io::Read` and `std::io::Write`. Once `close()` has been
/// called, every operation fails with an `Io(NotConnected)` error.
pub trait SerialPort: io::Read + io::Write {
    /// Returns the path the port was opened from.
    fn path(&self) -> &std::path::Path;

    /// Closes the device. Only the first call releases the descriptor; later calls fail.
    fn close(&mut self) -> Result<()>;

    /// Returns the number of bytes waiting in the driver's input queue.
    fn in_waiting(&self) -> Result<usize>;

    /// Discards data that has been received but not read.
    fn reset_input_buffer(&self) -> Result<()>;

    /// Discards data that has been written but not transmitted.
    fn reset_output_buffer(&self) -> Result<()>;

    /// Sets an absolute point after which reads and writes fail with a timeout. `None` removes the
    /// deadline.
    fn set_deadline(&mut self, deadline: Option<Instant>);

    /// Sets the deadline to `timeout` from now.
    fn set_timeout(&mut self, timeout: Duration) {
        self.set_deadline(Some(Instant::now() + timeout));
    }

    /// Returns the current deadline.
    fn deadline(&self) -> Option<Instant>;

    /// Reads the state of the DTR (Data Terminal Ready) control signal.
    fn dtr(&self) -> Result<bool>;

    /// Reads the state of the RTS (Request To Send) control signal.
    fn rts(&self) -> Result<bool>;

    /// Sets the state of the DTR (Data Terminal Ready) control signal.
    ///
    /// Setting a value of `true` asserts the DTR control signal. `false` clears the signal.
    fn set_dtr(&mut self, level: bool) -> Result<()>;

    /// Sets the state of the RTS (Request To Send) control signal.
    ///
    /// Setting a value of `true` asserts the RTS control signal. `false` clears the signal.
    fn set_rts(&mut self, level: bool) -> Result<()>;

    /// Reads the state of the CTS (Clear To Send) control signal.
    fn read_cts(&self) -> Result<bool>;

    /// Reads the state of the DSR (Data Set Ready) control signal.
    fn read_dsr(&self) -> Result<bool>;

    /// Reads the state of the RI (Ring Indicator) control signal.
    fn read_ri(&self) -> Result<bool>;

    /// Reads the state of the CD (Carrier Detect) control signal.
    fn read_cd(&self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_8n1_at_9600() {
        let options = OpenOptions::default();
        assert_eq!(options.baud_rate, 9600);
        assert_eq!(options.data_bits, 8);
        assert_eq!(options.stop_bits, 1);
        assert_eq!(options.parity_mode, ParityMode::None);
        assert!(!options.canonical_mode);
    }

    #[test]
    fn default_options_validate_on_every_family() {
        let options = OpenOptions::new("/dev/ttyS0");
        assert!(options.control_registers(Family::Linux).is_ok());
        assert!(options.control_registers(Family::Bsd).is_ok());
    }

    #[test]
    fn parity_mode_from_integer() {
        assert_eq!(ParityMode::try_from(0).unwrap(), ParityMode::None);
        assert_eq!(ParityMode::try_from(1).unwrap(), ParityMode::Odd);
        assert_eq!(ParityMode::try_from(2).unwrap(), ParityMode::Even);

        let err = ParityMode::try_from(3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn char_size_round_trips_bits() {
        for bits in 5..=8 {
            assert_eq!(CharSize::from_bits(bits).map(CharSize::bits), Some(bits));
        }
        assert_eq!(CharSize::from_bits(9), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn options_load_from_partial_config() {
        let options: OpenOptions =
            serde_json::from_str(r#"{ "port_name": "/dev/ttyACM0", "baud_rate": 57600, "parity_mode": "Even" }"#)
                .unwrap();

        assert_eq!(options.port_name, "/dev/ttyACM0");
        assert_eq!(options.baud_rate, 57600);
        assert_eq!(options.parity_mode, ParityMode::Even);
        assert_eq!(options.data_bits, 8);
    }
}
