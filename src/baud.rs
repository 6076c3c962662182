//! Standard baud rates per platform family.

/// Families of terminal interfaces that encode serial settings differently.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Family {
    /// Linux `termios2`: symbolic speed codes in the control flags plus explicit speed fields, with
    /// `BOTHER` for anything else. Registers are built from zero.
    Linux,

    /// BSD-derived systems (macOS, FreeBSD, OpenBSD, NetBSD, DragonFly) whose speed fields hold the
    /// literal rate. macOS sets other rates through the `IOSSIOSPEED` ioctl. Registers are merged
    /// onto the device's current attributes with the raw-mode-hostile flags cleared.
    Bsd,
}

impl Family {
    /// Returns the rates this family encodes directly in its speed fields.
    pub fn standard_baud_rates(self) -> &'static [u32] {
        match self {
            Family::Linux => LINUX_BAUD_RATES,
            Family::Bsd => BSD_BAUD_RATES,
        }
    }

    /// Whether this family rejects timeout combinations the driver can't honor, instead of
    /// saturating them.
    pub fn enforces_timing_limits(self) -> bool {
        match self {
            Family::Linux => true,
            Family::Bsd => false,
        }
    }
}

/// The standard rate encoded in place of a non-standard one until the arbitrary-speed call
/// applies the real value.
pub const PLACEHOLDER_BAUD_RATE: u32 = 115_200;

static LINUX_BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115200, 230400,
];

static BSD_BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 7200, 9600, 14400, 19200,
    28800, 38400, 57600, 76800, 115200, 230400,
];

/// Returns `true` if `rate` is one of the rates `family` encodes symbolically.
///
/// ```
/// use ttyport_core::{is_standard_baud_rate, Family};
///
/// assert!(is_standard_baud_rate(Family::Linux, 9600));
/// assert!(!is_standard_baud_rate(Family::Linux, 123_456));
/// ```
pub fn is_standard_baud_rate(family: Family, rate: u32) -> bool {
    family.standard_baud_rates().binary_search(&rate).is_ok()
}
