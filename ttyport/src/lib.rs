//! Open, configure and control serial devices through the operating system's terminal interface.
//!
//! ```no_run
//! use std::io::prelude::*;
//! use ttyport::prelude::*;
//!
//! let options = ttyport::OpenOptions {
//!     port_name: "/dev/ttyUSB0".into(),
//!     baud_rate: 115_200,
//!     ..Default::default()
//! };
//!
//! let mut port = ttyport::open(&options).unwrap();
//! port.write_all(b"hello").unwrap();
//! ```

pub use ttyport_core::*;

/// Serial port implementation for Unix operating systems.
#[cfg(unix)]
pub mod unix {
    pub use ttyport_unix::*;
}

/// The serial port implementation for the current platform.
#[cfg(unix)]
pub type SystemPort = unix::TTYPort;

/// A convenience function for opening a native serial port.
///
/// `options.port_name` must be one that's understood by the target operating system to identify
/// a serial port. On Unix systems, it should be a path to a TTY device file.
///
/// ## Examples
///
/// Hard-coding the device name diminishes the portability of `ttyport::open()`. Device names
/// should come from external sources:
///
/// ```no_run
/// use std::env;
///
/// for arg in env::args().skip(1) {
///     let port = ttyport::open(&ttyport::OpenOptions::new(arg)).unwrap();
/// }
/// ```
#[cfg(unix)]
pub fn open(options: &OpenOptions) -> Result<SystemPort> {
    unix::TTYPort::open(options)
}
