use std::mem;
use std::os::unix::io::RawFd;

use libc::{speed_t, termios2};
use ttyport_core::{ControlCall, ControlRegisterImage, Error, Family, Result};

use super::Platform;
use crate::error;
use crate::registers::{FlagBits, RegisterWords};

/// Flag values from the Linux UAPI headers.
pub const FLAG_BITS: FlagBits = FlagBits {
    ignbrk: libc::IGNBRK,
    inlcr: libc::INLCR,
    igncr: libc::IGNCR,
    icrnl: libc::ICRNL,
    inpck: libc::INPCK,
    ixon: libc::IXON,
    ixoff: libc::IXOFF,

    opost: libc::OPOST,

    clocal: libc::CLOCAL,
    cread: libc::CREAD,
    csize: libc::CSIZE,
    cs5: libc::CS5,
    cs6: libc::CS6,
    cs7: libc::CS7,
    cs8: libc::CS8,
    cstopb: libc::CSTOPB,
    parenb: libc::PARENB,
    parodd: libc::PARODD,
    crtscts: libc::CRTSCTS,

    icanon: libc::ICANON,
    echo: libc::ECHO,
    echoe: libc::ECHOE,
    echok: libc::ECHOK,
    echonl: libc::ECHONL,
    isig: libc::ISIG,
    iexten: libc::IEXTEN,
};

/// Adapter for the Linux `termios2` interface.
///
/// Standard rates are encoded as a `CBAUD` speed code with matching `c_ispeed`/`c_ospeed`.
/// Arbitrary rates switch the speed code to `BOTHER` and carry the literal rate in the speed
/// fields.
#[derive(Debug, Default, Copy, Clone)]
pub struct LinuxPlatform;

impl Platform for LinuxPlatform {
    fn family(&self) -> Family {
        Family::Linux
    }

    fn set_attributes(&self, fd: RawFd, image: &ControlRegisterImage) -> Result<()> {
        let termios = pack(image)?;

        tracing::trace!(fd, speed = image.speed, "TCSETS2");
        set_termios2(fd, &termios, ControlCall::SetAttributes)
    }

    fn set_arbitrary_speed(&self, fd: RawFd, rate: u32) -> Result<()> {
        let mut termios = get_termios2(fd)?;

        termios.c_cflag &= !libc::CBAUD;
        termios.c_cflag |= libc::BOTHER;
        termios.c_ispeed = rate as speed_t;
        termios.c_ospeed = rate as speed_t;

        tracing::trace!(fd, rate, "TCSETS2 with BOTHER");
        set_termios2(fd, &termios, ControlCall::SetArbitrarySpeed)
    }
}

/// Packs `image` into a zeroed `termios2`.
pub fn pack(image: &ControlRegisterImage) -> Result<termios2> {
    let speed = match speed_code(image.speed) {
        Some(speed) => speed,
        None => {
            return Err(Error::configuration(format!(
                "baud rate {} has no speed code",
                image.speed
            )))
        }
    };

    let words = RegisterWords::pack(image, &FLAG_BITS);
    let mut termios: termios2 = unsafe { mem::zeroed() };

    termios.c_iflag = words.input;
    termios.c_oflag = words.output;
    termios.c_cflag = (words.control & !libc::CBAUD) | speed;
    termios.c_lflag = words.local;

    termios.c_cc[libc::VMIN] = image.control_chars.min;
    termios.c_cc[libc::VTIME] = image.control_chars.time;

    termios.c_ispeed = image.speed as speed_t;
    termios.c_ospeed = image.speed as speed_t;

    Ok(termios)
}

fn get_termios2(fd: RawFd) -> Result<termios2> {
    let mut termios: termios2 = unsafe { mem::zeroed() };
    error::check(ControlCall::GetAttributes, unsafe {
        libc::ioctl(fd, libc::TCGETS2 as _, &mut termios as *mut termios2)
    })?;

    Ok(termios)
}

fn set_termios2(fd: RawFd, termios: &termios2, call: ControlCall) -> Result<()> {
    error::check(call, unsafe {
        libc::ioctl(fd, libc::TCSETS2 as _, termios as *const termios2)
    })?;

    Ok(())
}

/// Returns the `CBAUD` code for a standard rate.
pub fn speed_code(rate: u32) -> Option<speed_t> {
    let code = match rate {
        50 => libc::B50,
        75 => libc::B75,
        110 => libc::B110,
        134 => libc::B134,
        150 => libc::B150,
        200 => libc::B200,
        300 => libc::B300,
        600 => libc::B600,
        1200 => libc::B1200,
        1800 => libc::B1800,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        _ => return None,
    };

    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ttyport_core::{is_standard_baud_rate, OpenOptions, PLACEHOLDER_BAUD_RATE};

    fn image(options: &OpenOptions) -> ControlRegisterImage {
        ControlRegisterImage::build(options, Family::Linux).unwrap()
    }

    #[test]
    fn every_standard_rate_has_a_speed_code() {
        for &rate in Family::Linux.standard_baud_rates() {
            assert!(speed_code(rate).is_some(), "{}", rate);
        }
    }

    #[test]
    fn non_standard_rates_have_no_speed_code() {
        assert!(!is_standard_baud_rate(Family::Linux, 123_456));
        assert_eq!(speed_code(123_456), None);
    }

    #[test]
    fn standard_rate_encodes_code_and_speed_fields() {
        let termios = pack(&image(&OpenOptions { baud_rate: 9600, ..OpenOptions::default() })).unwrap();

        assert_eq!(termios.c_cflag & libc::CBAUD, libc::B9600);
        assert_eq!(termios.c_ispeed, 9600);
        assert_eq!(termios.c_ospeed, 9600);
    }

    #[test]
    fn non_standard_rate_encodes_placeholder() {
        let image = image(&OpenOptions { baud_rate: 123_456, ..OpenOptions::default() });
        let termios = pack(&image).unwrap();

        assert_eq!(termios.c_cflag & libc::CBAUD, libc::B115200);
        assert_eq!(termios.c_ospeed, PLACEHOLDER_BAUD_RATE);
        assert_eq!(image.arbitrary_rate, Some(123_456));
    }

    #[test]
    fn framing_lands_in_control_flags() {
        let options = OpenOptions {
            data_bits: 7,
            stop_bits: 2,
            parity_mode: ttyport_core::ParityMode::Odd,
            ..OpenOptions::default()
        };
        let termios = pack(&image(&options)).unwrap();

        assert_eq!(termios.c_cflag & libc::CSIZE, libc::CS7);
        assert_ne!(termios.c_cflag & libc::CSTOPB, 0);
        assert_ne!(termios.c_cflag & libc::PARENB, 0);
        assert_ne!(termios.c_cflag & libc::PARODD, 0);
        assert_ne!(termios.c_iflag & libc::INPCK, 0);
        assert_eq!(termios.c_cflag & libc::CBAUD, libc::B9600);
    }

    #[test]
    fn control_chars_land_in_vmin_and_vtime() {
        let options = OpenOptions {
            inter_character_timeout: 250,
            minimum_read_size: 12,
            ..OpenOptions::default()
        };
        let termios = pack(&image(&options)).unwrap();

        assert_eq!(termios.c_cc[libc::VTIME], 2);
        assert_eq!(termios.c_cc[libc::VMIN], 12);
    }

    #[test]
    fn packing_from_zero_is_deterministic() {
        let image = image(&OpenOptions::default());
        let first = pack(&image).unwrap();
        let second = pack(&image).unwrap();

        assert_eq!(first.c_iflag, second.c_iflag);
        assert_eq!(first.c_oflag, second.c_oflag);
        assert_eq!(first.c_cflag, second.c_cflag);
        assert_eq!(first.c_lflag, second.c_lflag);
        assert_eq!(first.c_cc, second.c_cc);
        assert_eq!(first.c_ospeed, second.c_ospeed);
    }

    #[test]
    fn raw_mode_from_zero_leaves_line_discipline_off() {
        let termios = pack(&image(&OpenOptions::default())).unwrap();

        assert_eq!(termios.c_iflag, 0);
        assert_eq!(termios.c_oflag, 0);
        assert_eq!(termios.c_lflag & libc::ICANON, 0);
        assert_eq!(termios.c_cflag & (libc::CLOCAL | libc::CREAD), libc::CLOCAL | libc::CREAD);
        assert_eq!(termios.c_cflag & libc::CSIZE, libc::CS8);
    }

    #[test]
    fn control_chars_other_than_vmin_and_vtime_are_cleared() {
        let termios = pack(&image(&OpenOptions::default())).unwrap();

        for (index, &cc) in termios.c_cc.iter().enumerate() {
            match index {
                libc::VMIN => assert_eq!(cc, 0),
                libc::VTIME => assert_eq!(cc, 1),
                _ => assert_eq!(cc, 0, "c_cc[{}]", index),
            }
        }
    }

    #[test]
    fn unknown_speed_is_rejected() {
        let mut image = image(&OpenOptions::default());
        image.speed = 14_400;

        let err = pack(&image).unwrap_err();
        assert_eq!(err.kind(), ttyport_core::ErrorKind::Configuration);
    }
}
