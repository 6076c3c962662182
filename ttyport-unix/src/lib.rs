//! Serial port implementation for Unix operating systems.
//!
//! Linux and Android configure devices through `termios2`; macOS and the BSDs through the classic
//! `termios` interface, with `IOSSIOSPEED` for arbitrary rates on Apple targets.

extern crate ioctl_rs as ioctl;

pub use platform::*;
pub use registers::{FlagBits, RegisterWords};
pub use tty::*;

mod error;
mod platform;
mod poll;
mod registers;
mod tty;
