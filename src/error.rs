use std::fmt;
use std::io;

/// A type for results generated by interacting with serial ports.
pub type Result<T> = std::result::Result<T, Error>;

/// The OS control calls a serial port implementation consumes.
///
/// The numeric request codes behind these differ per platform; errors only ever refer to the call
/// by name.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlCall {
    /// Read the terminal attributes.
    GetAttributes,
    /// Apply the terminal attributes.
    SetAttributes,
    /// Set a baud rate outside the symbolic speed table.
    SetArbitrarySpeed,
    /// Read the modem-control line status word.
    GetModemLines,
    /// Assert modem-control bits.
    SetModemBits,
    /// Clear modem-control bits.
    ClearModemBits,
    /// Count the bytes waiting in the input queue.
    InputQueueCount,
    /// Discard received but unread data.
    FlushInput,
    /// Discard written but unsent data.
    FlushOutput,
    /// Put the descriptor in non-blocking mode.
    SetNonblocking,
    /// Acquire or release exclusive access to the device.
    Exclusive,
    /// Wait until all queued output has been transmitted.
    Drain,
}

impl fmt::Display for ControlCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            ControlCall::GetAttributes => "get-terminal-attributes",
            ControlCall::SetAttributes => "set-terminal-attributes",
            ControlCall::SetArbitrarySpeed => "set-arbitrary-baud-rate",
            ControlCall::GetModemLines => "get-modem-control-lines",
            ControlCall::SetModemBits => "set-modem-control-bits",
            ControlCall::ClearModemBits => "clear-modem-control-bits",
            ControlCall::InputQueueCount => "get-input-queue-count",
            ControlCall::FlushInput => "flush-input",
            ControlCall::FlushOutput => "flush-output",
            ControlCall::SetNonblocking => "set-descriptor-nonblocking",
            ControlCall::Exclusive => "set-exclusive-access",
            ControlCall::Drain => "drain-output",
        };

        f.write_str(name)
    }
}

/// Categories of errors that can occur when interacting with serial ports.
///
/// This list is intended to grow over time and it is not recommended to exhaustively match
/// against it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An `OpenOptions` value failed validation. No OS call was made.
    Configuration,

    /// The device could not be opened. It may not exist, the caller may lack permission, or it may
    /// be held exclusively by another process.
    DeviceOpen,

    /// An OS control call failed.
    ControlCall(ControlCall),

    /// A read or write failed for a reason other than a timeout. This includes operations on a
    /// closed port.
    Io(io::ErrorKind),

    /// A read or write exceeded its deadline.
    Timeout,
}

/// An error type for serial port operations.
#[derive(Debug, thiserror::Error)]
#[error("{description}")]
pub struct Error {
    kind: ErrorKind,
    description: String,
    #[source]
    source: Option<io::Error>,
}

impl Error {
    /// Creates an error with the given kind and description.
    pub fn new<T: Into<String>>(kind: ErrorKind, description: T) -> Self {
        Error {
            kind,
            description: description.into(),
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration<T: Into<String>>(description: T) -> Self {
        Error::new(ErrorKind::Configuration, description)
    }

    /// Wraps the OS error returned while opening a device.
    pub fn device_open(path: &std::path::Path, cause: io::Error) -> Self {
        Error {
            kind: ErrorKind::DeviceOpen,
            description: format!("could not open {}: {}", path.display(), cause),
            source: Some(cause),
        }
    }

    /// Wraps the OS error returned by a control call.
    pub fn control_call(call: ControlCall, cause: io::Error) -> Self {
        Error {
            kind: ErrorKind::ControlCall(call),
            description: format!("{} failed: {}", call, cause),
            source: Some(cause),
        }
    }

    /// The error returned by any operation on a port that has been closed.
    pub fn closed() -> Self {
        Error::new(ErrorKind::Io(io::ErrorKind::NotConnected), "port is closed")
    }

    /// Returns the corresponding `ErrorKind` for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the OS error code behind this error, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.as_ref().and_then(io::Error::raw_os_error)
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Error {
        let kind = match io_error.kind() {
            io::ErrorKind::TimedOut => ErrorKind::Timeout,
            kind => ErrorKind::Io(kind),
        };

        Error {
            kind,
            description: io_error.to_string(),
            source: Some(io_error),
        }
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> io::Error {
        let kind = match error.kind {
            ErrorKind::Configuration => io::ErrorKind::InvalidInput,
            ErrorKind::DeviceOpen => io::ErrorKind::NotFound,
            ErrorKind::ControlCall(_) => io::ErrorKind::Other,
            ErrorKind::Io(kind) => kind,
            ErrorKind::Timeout => io::ErrorKind::TimedOut,
        };

        match error.source {
            Some(source) if source.kind() == kind => source,
            _ => io::Error::new(kind, error.description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_io_error_becomes_timeout() {
        let err: Error = io::Error::new(io::ErrorKind::TimedOut, "operation timed out").into();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn other_io_error_keeps_its_kind() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe").into();
        assert_eq!(err.kind(), ErrorKind::Io(io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn control_call_error_names_the_call() {
        let err = Error::control_call(ControlCall::SetAttributes, io::Error::from_raw_os_error(25));
        assert_eq!(err.kind(), ErrorKind::ControlCall(ControlCall::SetAttributes));
        assert_eq!(err.raw_os_error(), Some(25));
        assert!(err.to_string().starts_with("set-terminal-attributes failed"));
    }

    #[test]
    fn closed_error_converts_to_not_connected() {
        let err: io::Error = Error::closed().into();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert_eq!(err.to_string(), "port is closed");
    }

    #[test]
    fn configuration_error_converts_to_invalid_input() {
        let err: io::Error = Error::configuration("invalid setting for StopBits").into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + std::error::Error>() {}
        assert_send_sync::<Error>();
    }
}
