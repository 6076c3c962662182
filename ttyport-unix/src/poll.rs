use std::io;
use std::time::Duration;

use libc::{c_int, c_short};

pub fn wait_read_fd(fd: c_int, timeout: Option<Duration>) -> io::Result<()> {
    wait_fd(fd, libc::POLLIN, timeout)
}

pub fn wait_write_fd(fd: c_int, timeout: Option<Duration>) -> io::Result<()> {
    wait_fd(fd, libc::POLLOUT, timeout)
}

fn wait_fd(fd: c_int, events: c_short, timeout: Option<Duration>) -> io::Result<()> {
    let mut fds = [libc::pollfd {
        fd,
        events,
        revents: 0,
    }];

    let wait = loop {
        let wait = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, poll_timeout(timeout)) };

        if wait >= 0 {
            break wait;
        }

        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    };

    if wait == 0 {
        return Err(io::Error::new(io::ErrorKind::TimedOut, "operation timed out"));
    }

    if fds[0].revents & events != 0 {
        return Ok(());
    }

    if fds[0].revents & libc::POLLHUP != 0 {
        return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
    }

    if fds[0].revents & libc::POLLNVAL != 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid input"));
    }

    Err(io::Error::new(io::ErrorKind::Other, "unknown I/O error"))
}

// rounds up so a wait never ends before the requested time
fn poll_timeout(timeout: Option<Duration>) -> c_int {
    match timeout {
        None => -1,
        Some(timeout) => {
            let millis = timeout.as_nanos().div_ceil(1_000_000);
            c_int::try_from(millis).unwrap_or(c_int::MAX)
        }
    }
}
