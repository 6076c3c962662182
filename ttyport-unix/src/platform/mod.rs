//! Platform adapters: opening a device node and applying a `ControlRegisterImage` to it.

use std::fs;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;

use ttyport_core::{ControlCall, ControlRegisterImage, Error, Family, OpenOptions, Result};

use crate::error;
use crate::TTYPort;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use self::linux::{LinuxPlatform, FLAG_BITS};

#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod bsd;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub use self::bsd::{BsdPlatform, FLAG_BITS};

/// The adapter for the compilation target.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub type NativePlatform = LinuxPlatform;

/// The adapter for the compilation target.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub type NativePlatform = BsdPlatform;

/// The control calls whose encoding differs between platform families.
///
/// Everything else a port needs (modem lines, queue counts, flushing) is shared by all Unix
/// targets and lives on `TTYPort`.
pub trait Platform {
    /// The family whose rules the image is built with.
    fn family(&self) -> Family;

    /// Packs `image` into the platform's register layout and applies it to `fd`.
    fn set_attributes(&self, fd: RawFd, image: &ControlRegisterImage) -> Result<()>;

    /// Applies a baud rate that has no symbolic speed code.
    fn set_arbitrary_speed(&self, fd: RawFd, rate: u32) -> Result<()>;
}

/// Opens and configures the device named by `options` using `platform`.
///
/// The options are validated before the device is touched. Any failure after the device has been
/// opened closes it again before the error is returned.
///
/// ## Errors
///
/// * `Configuration` if the options are invalid.
/// * `DeviceOpen` if the device could not be opened.
/// * `ControlCall` if configuring the opened device failed.
pub fn open_with<P: Platform + ?Sized>(platform: &P, options: &OpenOptions) -> Result<TTYPort> {
    let image = ControlRegisterImage::build(options, platform.family())?;
    let path = Path::new(&options.port_name);

    tracing::debug!(
        path = %path.display(),
        baud_rate = options.baud_rate,
        data_bits = options.data_bits,
        stop_bits = options.stop_bits,
        parity = ?options.parity_mode,
        family = ?platform.family(),
        "opening serial device"
    );

    // O_NONBLOCK keeps open(2) from waiting on carrier detect
    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
        .open(path)
        .map_err(|err| {
            tracing::debug!(path = %path.display(), error = %err, "failed to open serial device");
            Error::device_open(path, err)
        })?;

    // `file` closes the descriptor on every early return below
    let fd = file.as_raw_fd();

    set_nonblocking(fd)?;

    if options.exclusive {
        ioctl::tiocexcl(fd).map_err(error::from_io_error(ControlCall::Exclusive))?;
    }

    if let Err(err) = configure(platform, fd, &image) {
        tracing::debug!(path = %path.display(), error = %err, "failed to configure serial device");

        if options.exclusive {
            let _ = ioctl::tiocnxcl(fd);
        }

        return Err(err);
    }

    tracing::debug!(path = %path.display(), rate = image.effective_rate(), "serial device configured");

    Ok(TTYPort::new(file, path.to_path_buf(), &image, options.exclusive))
}

fn configure<P: Platform + ?Sized>(platform: &P, fd: RawFd, image: &ControlRegisterImage) -> Result<()> {
    platform.set_attributes(fd, image)?;

    if let Some(rate) = image.arbitrary_rate {
        tracing::trace!(fd, rate, "applying arbitrary baud rate");
        platform.set_arbitrary_speed(fd, rate)?;
    }

    Ok(())
}

// Re-asserted explicitly instead of trusting the open flags to have survived. Whether any file
// abstraction resets the mode differs between platforms and runtimes; this is harmless where none
// does.
fn set_nonblocking(fd: RawFd) -> Result<()> {
    let flags = error::check(ControlCall::SetNonblocking, unsafe { libc::fcntl(fd, libc::F_GETFL) })?;

    if flags & libc::O_NONBLOCK == 0 {
        tracing::trace!(fd, "descriptor lost O_NONBLOCK, restoring");
        error::check(ControlCall::SetNonblocking, unsafe {
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK)
        })?;
    }

    Ok(())
}

/// Opens the device named by `options` with the adapter for the compilation target.
pub fn open(options: &OpenOptions) -> Result<TTYPort> {
    open_with(&NativePlatform::default(), options)
}
