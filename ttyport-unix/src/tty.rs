use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use libc::c_int;
use ttyport_core::{ControlCall, ControlRegisterImage, Error, OpenOptions, Result, SerialPort};

use crate::error;
use crate::poll;

/// A TTY-based serial port implementation.
///
/// The port will be closed when the value is dropped, or earlier with `close()`. Every operation
/// on a closed port fails.
#[derive(Debug)]
pub struct TTYPort {
    file: Option<File>,
    path: PathBuf,
    deadline: Option<Instant>,
    idle_timeout: Option<Duration>,
    exclusive: bool,
}

impl TTYPort {
    /// Opens a TTY device as a serial port and configures it from `options`.
    ///
    /// ```no_run
    /// let options = ttyport_core::OpenOptions::new("/dev/ttyS0");
    /// ttyport_unix::TTYPort::open(&options).unwrap();
    /// ```
    ///
    /// ## Errors
    ///
    /// * `Configuration` if `options` fails validation. The device is not touched.
    /// * `DeviceOpen` if the device could not be opened. This could indicate that the device is
    ///   already in use.
    /// * `ControlCall` for any error while initializing the device.
    pub fn open(options: &OpenOptions) -> Result<Self> {
        crate::platform::open(options)
    }

    pub(crate) fn new(file: File, path: PathBuf, image: &ControlRegisterImage, exclusive: bool) -> Self {
        TTYPort {
            file: Some(file),
            path,
            deadline: None,
            idle_timeout: image.idle_read_timeout(),
            exclusive,
        }
    }

    fn file(&self) -> io::Result<&File> {
        self.file.as_ref().ok_or_else(|| Error::closed().into())
    }

    fn fd(&self) -> Result<RawFd> {
        match self.file {
            Some(ref file) => Ok(file.as_raw_fd()),
            None => Err(Error::closed()),
        }
    }

    fn set_pin(&mut self, pin: c_int, level: bool) -> Result<()> {
        let fd = self.fd()?;

        tracing::trace!(path = %self.path.display(), pin, level, "setting modem line");

        if level {
            ioctl::tiocmbis(fd, pin).map_err(error::from_io_error(ControlCall::SetModemBits))
        } else {
            ioctl::tiocmbic(fd, pin).map_err(error::from_io_error(ControlCall::ClearModemBits))
        }
    }

    fn read_pin(&self, pin: c_int) -> Result<bool> {
        let fd = self.fd()?;

        match ioctl::tiocmget(fd) {
            Ok(pins) => Ok(pins & pin != 0),
            Err(err) => Err(Error::control_call(ControlCall::GetModemLines, err)),
        }
    }

    fn flush_queue(&self, queue: c_int, call: ControlCall) -> Result<()> {
        let fd = self.fd()?;

        termios::tcflush(fd, queue).map_err(error::from_io_error(call))
    }

    // The time left before the deadline, or a timeout error once it has passed.
    fn remaining(&self) -> io::Result<Option<Duration>> {
        match self.deadline {
            None => Ok(None),
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => Ok(Some(remaining)),
                _ => Err(io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded")),
            },
        }
    }
}

// shared by the io::Read and io::Write impls for `TTYPort` and `&TTYPort`
impl TTYPort {
    #[inline]
    fn read_impl(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self.file()?;

        loop {
            // without a deadline the VTIME idle window bounds the wait
            let timeout = match self.remaining()? {
                Some(remaining) => Some(remaining),
                None => self.idle_timeout,
            };

            poll::wait_read_fd(file.as_raw_fd(), timeout)?;

            match file.read(buf) {
                Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => continue,
                Ok(n) => {
                    tracing::trace!(path = %self.path.display(), bytes = n, "read");
                    return Ok(n);
                }
                result => return result,
            }
        }
    }

    #[inline]
    fn write_impl(&self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.file()?;

        loop {
            poll::wait_write_fd(file.as_raw_fd(), self.remaining()?)?;

            match file.write(buf) {
                Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => continue,
                Ok(n) => {
                    tracing::trace!(path = %self.path.display(), bytes = n, "wrote");
                    return Ok(n);
                }
                result => return result,
            }
        }
    }

    #[inline]
    fn flush_impl(&self) -> io::Result<()> {
        let file = self.file()?;

        termios::tcdrain(file.as_raw_fd())
            .map_err(|err| Error::control_call(ControlCall::Drain, err).into())
    }
}

impl io::Read for TTYPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_impl(buf)
    }
}

impl io::Read for &TTYPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_impl(buf)
    }
}

impl io::Write for TTYPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_impl(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_impl()
    }
}

impl io::Write for &TTYPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_impl(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_impl()
    }
}

impl Drop for TTYPort {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            tracing::debug!(path = %self.path.display(), "serial port dropped, closing");

            if self.exclusive {
                if let Err(err) = ioctl::tiocnxcl(file.as_raw_fd()) {
                    tracing::warn!(path = %self.path.display(), error = %err, "failed to release exclusive access");
                }
            }
        }
    }
}

impl AsRawFd for TTYPort {
    /// Returns the descriptor, or `-1` once the port has been closed.
    fn as_raw_fd(&self) -> RawFd {
        self.fd().unwrap_or(-1)
    }
}

impl SerialPort for TTYPort {
    fn path(&self) -> &Path {
        &self.path
    }

    fn close(&mut self) -> Result<()> {
        let file = self.file.take().ok_or_else(Error::closed)?;

        tracing::debug!(path = %self.path.display(), "closing serial port");

        if self.exclusive {
            if let Err(err) = ioctl::tiocnxcl(file.as_raw_fd()) {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to release exclusive access");
            }
        }

        // closed by hand so that errors from close(2) reach the caller
        let fd = file.into_raw_fd();
        if unsafe { libc::close(fd) } < 0 {
            return Err(io::Error::last_os_error().into());
        }

        Ok(())
    }

    fn in_waiting(&self) -> Result<usize> {
        let fd = self.fd()?;
        let mut count: c_int = 0;

        error::check(ControlCall::InputQueueCount, unsafe {
            libc::ioctl(fd, libc::FIONREAD as _, &mut count as *mut c_int)
        })?;

        Ok(count as usize)
    }

    fn reset_input_buffer(&self) -> Result<()> {
        self.flush_queue(termios::TCIFLUSH, ControlCall::FlushInput)
    }

    fn reset_output_buffer(&self) -> Result<()> {
        self.flush_queue(termios::TCOFLUSH, ControlCall::FlushOutput)
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn dtr(&self) -> Result<bool> {
        self.read_pin(libc::TIOCM_DTR)
    }

    fn rts(&self) -> Result<bool> {
        self.read_pin(libc::TIOCM_RTS)
    }

    fn set_dtr(&mut self, level: bool) -> Result<()> {
        self.set_pin(libc::TIOCM_DTR, level)
    }

    fn set_rts(&mut self, level: bool) -> Result<()> {
        self.set_pin(libc::TIOCM_RTS, level)
    }

    fn read_cts(&self) -> Result<bool> {
        self.read_pin(libc::TIOCM_CTS)
    }

    fn read_dsr(&self) -> Result<bool> {
        self.read_pin(libc::TIOCM_DSR)
    }

    fn read_ri(&self) -> Result<bool> {
        self.read_pin(libc::TIOCM_RI)
    }

    fn read_cd(&self) -> Result<bool> {
        self.read_pin(libc::TIOCM_CD)
    }
}
