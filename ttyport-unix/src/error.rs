use std::io;

use libc::c_int;
use ttyport_core::{ControlCall, Error, Result};

/// Checks the return value of a libc call, capturing `errno` for `call` on failure.
pub fn check(call: ControlCall, retval: c_int) -> Result<c_int> {
    if retval < 0 {
        Err(last_os_error(call))
    } else {
        Ok(retval)
    }
}

pub fn last_os_error(call: ControlCall) -> Error {
    Error::control_call(call, io::Error::last_os_error())
}

pub fn from_io_error(call: ControlCall) -> impl FnOnce(io::Error) -> Error {
    move |err| Error::control_call(call, err)
}
