#![allow(dead_code)]

use std::fs::File;
use std::thread;
use std::time::{Duration, Instant};

use ttyport_core::OpenOptions;

/// The controlling side of a pseudo-terminal, plus the path of its device side.
pub struct Pty {
    pub master: File,
    pub slave_path: String,
}

#[cfg(target_os = "linux")]
pub fn open_pty() -> Pty {
    use std::ffi::CStr;
    use std::io;
    use std::os::unix::io::FromRawFd;

    unsafe {
        let fd = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
        assert!(fd >= 0, "posix_openpt: {}", io::Error::last_os_error());
        let master = File::from_raw_fd(fd);

        assert_eq!(libc::grantpt(fd), 0, "grantpt: {}", io::Error::last_os_error());
        assert_eq!(libc::unlockpt(fd), 0, "unlockpt: {}", io::Error::last_os_error());

        let mut name = [0 as libc::c_char; 128];
        assert_eq!(libc::ptsname_r(fd, name.as_mut_ptr(), name.len()), 0);
        let slave_path = CStr::from_ptr(name.as_ptr()).to_string_lossy().into_owned();

        Pty { master, slave_path }
    }
}

pub fn options(path: &str) -> OpenOptions {
    OpenOptions {
        port_name: path.to_string(),
        baud_rate: 9600,
        data_bits: 8,
        stop_bits: 1,
        inter_character_timeout: 100,
        minimum_read_size: 0,
        ..OpenOptions::default()
    }
}

/// Polls `probe` until it returns `true` or a second has passed.
pub fn eventually<F: FnMut() -> bool>(mut probe: F) -> bool {
    let give_up = Instant::now() + Duration::from_secs(1);

    while Instant::now() < give_up {
        if probe() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }

    probe()
}

#[cfg(target_os = "linux")]
pub fn open_descriptors() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}
