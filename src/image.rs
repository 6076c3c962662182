//! Translation of `OpenOptions` into terminal control registers.
//!
//! The image built here names every flag it manages instead of carrying raw bit words. Each
//! platform adapter packs it into its own register layout exactly once, right before the
//! set-attributes call, so no platform constant leaks into validation.

use std::time::Duration;

use crate::baud::{is_standard_baud_rate, Family, PLACEHOLDER_BAUD_RATE};
use crate::error::{Error, Result};
use crate::{CharSize, OpenOptions, ParityMode};

/// Input mode flags (`c_iflag`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct InputModes {
    /// `IGNBRK`
    pub ignore_break: bool,
    /// `INLCR`
    pub map_nl_to_cr: bool,
    /// `IGNCR`
    pub ignore_cr: bool,
    /// `ICRNL`
    pub map_cr_to_nl: bool,
    /// `INPCK`
    pub check_parity: bool,
    /// `IXON`
    pub xon_output: bool,
    /// `IXOFF`
    pub xoff_input: bool,
}

/// Output mode flags (`c_oflag`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct OutputModes {
    /// `OPOST`
    pub post_process: bool,
}

/// Control mode flags (`c_cflag`), excluding the speed code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ControlModes {
    /// `CLOCAL`
    pub ignore_modem_lines: bool,
    /// `CREAD`
    pub enable_receiver: bool,
    /// `CS5` through `CS8`
    pub char_size: CharSize,
    /// `CSTOPB`
    pub two_stop_bits: bool,
    /// `PARENB`
    pub parity_enable: bool,
    /// `PARODD`
    pub parity_odd: bool,
    /// `CRTSCTS`
    pub rts_cts: bool,
}

/// Local mode flags (`c_lflag`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocalModes {
    /// `ICANON`
    pub canonical: bool,
    /// `ECHO`
    pub echo: bool,
    /// `ECHOE`
    pub echo_erase: bool,
    /// `ECHOK`
    pub echo_kill: bool,
    /// `ECHONL`
    pub echo_nl: bool,
    /// `ISIG`
    pub signals: bool,
    /// `IEXTEN`
    pub extended_input: bool,
}

/// The `VMIN` and `VTIME` control characters.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ControlChars {
    /// Minimum number of bytes for a non-canonical read.
    pub min: u8,
    /// Inter-character timer in deciseconds.
    pub time: u8,
}

/// The control registers derived from one `OpenOptions` value.
///
/// Every flag listed in the mode records is managed: when the image is merged onto a device's
/// current attributes, each one is set or cleared as recorded here and all other bits are kept.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ControlRegisterImage {
    /// The platform family the image was built for.
    pub family: Family,
    /// Input modes.
    pub input: InputModes,
    /// Output modes.
    pub output: OutputModes,
    /// Control modes.
    pub control: ControlModes,
    /// Local modes.
    pub local: LocalModes,
    /// Control characters.
    pub control_chars: ControlChars,
    /// A standard rate to encode in the speed fields.
    pub speed: u32,
    /// Set when the requested rate is not standard and must be applied with the arbitrary-speed
    /// call after the image.
    pub arbitrary_rate: Option<u32>,
}

impl ControlRegisterImage {
    /// Validates `options` and builds the control registers for `family`.
    ///
    /// This performs no I/O.
    ///
    /// ## Errors
    ///
    /// Returns a `Configuration` error for a zero baud rate, stop bits other than 1 or 2, data
    /// bits outside 5 to 8, and, on families that enforce timing limits, a minimum read size of zero without an
    /// inter-character timeout or a timeout beyond 25.5 seconds.
    pub fn build(options: &OpenOptions, family: Family) -> Result<Self> {
        // rate 0 is B0, which hangs up the line
        if options.baud_rate == 0 {
            return Err(Error::configuration("invalid setting for BaudRate"));
        }

        let two_stop_bits = match options.stop_bits {
            1 => false,
            2 => true,
            _ => return Err(Error::configuration("invalid setting for StopBits")),
        };

        let char_size = match CharSize::from_bits(options.data_bits) {
            Some(size) => size,
            None => return Err(Error::configuration("invalid setting for DataBits")),
        };

        let (parity_enable, parity_odd) = match options.parity_mode {
            ParityMode::None => (false, false),
            ParityMode::Odd => (true, true),
            ParityMode::Even => (true, false),
        };

        let time = quantize_timeout(options.inter_character_timeout);
        let min = options.minimum_read_size;

        if family.enforces_timing_limits() {
            if min == 0 && time == 0 {
                return Err(Error::configuration(
                    "invalid values for InterCharacterTimeout and MinimumReadSize",
                ));
            }

            if time > u32::from(u8::MAX) {
                return Err(Error::configuration("invalid value for InterCharacterTimeout"));
            }
        }

        let (speed, arbitrary_rate) = if is_standard_baud_rate(family, options.baud_rate) {
            (options.baud_rate, None)
        } else {
            (PLACEHOLDER_BAUD_RATE, Some(options.baud_rate))
        };

        Ok(ControlRegisterImage {
            family,
            // every field below is a managed flag, cleared explicitly when merged onto a device
            input: InputModes {
                check_parity: parity_enable,
                ..InputModes::default()
            },
            output: OutputModes::default(),
            control: ControlModes {
                ignore_modem_lines: true,
                enable_receiver: true,
                char_size,
                two_stop_bits,
                parity_enable,
                parity_odd,
                rts_cts: options.rts_cts_flow_control,
            },
            local: LocalModes {
                canonical: options.canonical_mode,
                ..LocalModes::default()
            },
            control_chars: ControlChars {
                min: saturate(min, "MinimumReadSize"),
                time: saturate(time, "InterCharacterTimeout"),
            },
            speed,
            arbitrary_rate,
        })
    }

    /// Whether an arbitrary-speed call must follow the set-attributes call.
    pub fn needs_arbitrary_speed(&self) -> bool {
        self.arbitrary_rate.is_some()
    }

    /// The rate the device will run at once the image and any follow-up call are applied.
    pub fn effective_rate(&self) -> u32 {
        self.arbitrary_rate.unwrap_or(self.speed)
    }

    /// The longest a read may wait for a first byte before timing out, the window the driver
    /// applies for `VMIN = 0` and `VTIME > 0` in non-canonical mode.
    pub fn idle_read_timeout(&self) -> Option<Duration> {
        if self.local.canonical || self.control_chars.min != 0 || self.control_chars.time == 0 {
            return None;
        }

        Some(Duration::from_millis(u64::from(self.control_chars.time) * 100))
    }
}

/// Quantizes a timeout in milliseconds to whole deciseconds.
///
/// The value is rounded to the nearest multiple of 100, with ties going to the even multiple.
///
/// ```
/// assert_eq!(ttyport_core::quantize_timeout(250), 2);
/// assert_eq!(ttyport_core::quantize_timeout(251), 3);
/// ```
pub fn quantize_timeout(millis: u32) -> u32 {
    let (quotient, remainder) = (millis / 100, millis % 100);

    if remainder > 50 || (remainder == 50 && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

fn saturate(value: u32, field: &'static str) -> u8 {
    match u8::try_from(value) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(field, value, "value exceeds control character range, saturating to 255");
            u8::MAX
        }
    }
}
