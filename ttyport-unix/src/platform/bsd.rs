use std::os::unix::io::RawFd;

use termios::os::target::CRTSCTS;
use termios::{tcsetattr, Termios, TCSANOW};
use termios::{CLOCAL, CREAD, CS5, CS6, CS7, CS8, CSIZE, CSTOPB, PARENB, PARODD}; // cflags
use termios::{ECHO, ECHOE, ECHOK, ECHONL, ICANON, IEXTEN, ISIG}; // lflags
use termios::{ICRNL, IGNBRK, IGNCR, INLCR, INPCK, IXOFF, IXON}; // iflags
use termios::{OPOST, VMIN, VTIME}; // oflags, c_cc indexes
use ttyport_core::{ControlCall, ControlRegisterImage, Family, Result};

use super::Platform;
use crate::error;
use crate::registers::{FlagBits, RegisterWords};

/// Flag values from the BSD `<termios.h>`.
pub const FLAG_BITS: FlagBits = FlagBits {
    ignbrk: IGNBRK,
    inlcr: INLCR,
    igncr: IGNCR,
    icrnl: ICRNL,
    inpck: INPCK,
    ixon: IXON,
    ixoff: IXOFF,

    opost: OPOST,

    clocal: CLOCAL,
    cread: CREAD,
    csize: CSIZE,
    cs5: CS5,
    cs6: CS6,
    cs7: CS7,
    cs8: CS8,
    cstopb: CSTOPB,
    parenb: PARENB,
    parodd: PARODD,
    crtscts: CRTSCTS,

    icanon: ICANON,
    echo: ECHO,
    echoe: ECHOE,
    echok: ECHOK,
    echonl: ECHONL,
    isig: ISIG,
    iexten: IEXTEN,
};

#[cfg(any(target_os = "macos", target_os = "ios"))]
const IOSSIOSPEED: libc::c_ulong = 0x8004_5402;

/// Adapter for BSD-derived `termios`, where speed fields hold the literal rate.
///
/// The image is merged onto the device's current attributes. Rates outside the standard set are
/// applied with `IOSSIOSPEED` on Apple targets and by writing the literal rate elsewhere.
#[derive(Debug, Default, Copy, Clone)]
pub struct BsdPlatform;

impl Platform for BsdPlatform {
    fn family(&self) -> Family {
        Family::Bsd
    }

    fn set_attributes(&self, fd: RawFd, image: &ControlRegisterImage) -> Result<()> {
        let mut termios = Termios::from_fd(fd).map_err(error::from_io_error(ControlCall::GetAttributes))?;

        pack(image, &mut termios)?;

        tracing::trace!(fd, speed = image.speed, "tcsetattr");
        tcsetattr(fd, TCSANOW, &termios).map_err(error::from_io_error(ControlCall::SetAttributes))
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    fn set_arbitrary_speed(&self, fd: RawFd, rate: u32) -> Result<()> {
        let speed = rate as libc::speed_t;

        tracing::trace!(fd, rate, "IOSSIOSPEED");
        error::check(ControlCall::SetArbitrarySpeed, unsafe {
            libc::ioctl(fd, IOSSIOSPEED, &speed as *const libc::speed_t)
        })?;

        Ok(())
    }

    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    fn set_arbitrary_speed(&self, fd: RawFd, rate: u32) -> Result<()> {
        let mut termios = Termios::from_fd(fd).map_err(error::from_io_error(ControlCall::GetAttributes))?;

        termios::cfsetspeed(&mut termios, rate as _)
            .map_err(error::from_io_error(ControlCall::SetArbitrarySpeed))?;

        tracing::trace!(fd, rate, "tcsetattr with literal speed");
        tcsetattr(fd, TCSANOW, &termios).map_err(error::from_io_error(ControlCall::SetArbitrarySpeed))
    }
}

/// Merges `image` onto `termios`, which holds the device's current attributes. Bits the image
/// does not manage are kept.
pub fn pack(image: &ControlRegisterImage, termios: &mut Termios) -> Result<()> {
    let current = RegisterWords {
        input: termios.c_iflag,
        output: termios.c_oflag,
        control: termios.c_cflag,
        local: termios.c_lflag,
    };
    let words = RegisterWords::pack(image, &FLAG_BITS).merge_onto(current, &FLAG_BITS);

    termios.c_iflag = words.input;
    termios.c_oflag = words.output;
    termios.c_cflag = words.control;
    termios.c_lflag = words.local;

    termios.c_cc[VMIN] = image.control_chars.min;
    termios.c_cc[VTIME] = image.control_chars.time;

    // BSD speed codes are the rates themselves
    termios::cfsetspeed(termios, image.speed as _).map_err(error::from_io_error(ControlCall::SetAttributes))
}
