//! Status codes returned by the resource manager
//!
//! Every native call reports a 32-bit status. [`StatusCode`] keeps the raw
//! value and maps it to a [`Condition`], which is what the rest of the crate
//! acts on: retry on a timeout, stop on anything terminal.

use std::fmt;

use tracing::Level;

/// Named condition a status code maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// The call completed
    Success,
    /// A blocking wait elapsed without a change
    Timeout,
    /// The resource manager is not running, was stopped, or went away
    ResourceManagerUnavailable,
    /// The context handle is not (or no longer) valid
    InvalidHandle,
    /// A parameter or value passed to the resource manager was rejected
    InvalidParameter,
    /// The destination buffer was too small for the result
    InsufficientBuffer,
    /// The named reader is not available
    ReaderUnavailable,
    /// No readers are attached
    NoReadersAvailable,
    /// Any code without a specific mapping
    Unknown,
}

impl Condition {
    /// Whether the condition is absorbed by retrying
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Whether the condition ends a monitoring session
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Success | Self::Timeout)
    }

    /// Short human readable name of the condition
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::ResourceManagerUnavailable => "resource manager unavailable",
            Self::InvalidHandle => "invalid handle",
            Self::InvalidParameter => "invalid parameter",
            Self::InsufficientBuffer => "insufficient buffer",
            Self::ReaderUnavailable => "reader unavailable",
            Self::NoReadersAvailable => "no readers available",
            Self::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Raw status code from the resource manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u32);

impl StatusCode {
    /// Success
    pub const SUCCESS: Self = Self(codes::SCARD_S_SUCCESS);
    /// Wait timed out
    pub const TIMEOUT: Self = Self(codes::SCARD_E_TIMEOUT);
    /// Handle is invalid
    pub const INVALID_HANDLE: Self = Self(codes::SCARD_E_INVALID_HANDLE);
    /// Parameter is invalid
    pub const INVALID_PARAMETER: Self = Self(codes::SCARD_E_INVALID_PARAMETER);
    /// Buffer too small
    pub const INSUFFICIENT_BUFFER: Self = Self(codes::SCARD_E_INSUFFICIENT_BUFFER);
    /// No readers attached
    pub const NO_READERS_AVAILABLE: Self = Self(codes::SCARD_E_NO_READERS_AVAILABLE);
    /// Service not running
    pub const NO_SERVICE: Self = Self(codes::SCARD_E_NO_SERVICE);
    /// Service stopped
    pub const SERVICE_STOPPED: Self = Self(codes::SCARD_E_SERVICE_STOPPED);

    /// Wrap a raw status value
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Raw status value
    pub const fn code(&self) -> u32 {
        self.0
    }

    /// Map the raw value to a named condition
    pub const fn condition(&self) -> Condition {
        use codes::*;

        match self.0 {
            SCARD_S_SUCCESS => Condition::Success,
            SCARD_E_TIMEOUT => Condition::Timeout,
            SCARD_E_NO_SERVICE
            | SCARD_E_SERVICE_STOPPED
            | SCARD_P_SHUTDOWN
            | SCARD_E_SYSTEM_CANCELLED
            | SCARD_F_COMM_ERROR => Condition::ResourceManagerUnavailable,
            SCARD_E_INVALID_HANDLE | ERROR_INVALID_HANDLE => Condition::InvalidHandle,
            SCARD_E_INVALID_PARAMETER | SCARD_E_INVALID_VALUE => Condition::InvalidParameter,
            SCARD_E_INSUFFICIENT_BUFFER => Condition::InsufficientBuffer,
            SCARD_E_READER_UNAVAILABLE | SCARD_E_UNKNOWN_READER => Condition::ReaderUnavailable,
            SCARD_E_NO_READERS_AVAILABLE => Condition::NoReadersAvailable,
            _ => Condition::Unknown,
        }
    }

    /// Check if this status indicates success
    pub const fn is_success(&self) -> bool {
        self.0 == codes::SCARD_S_SUCCESS
    }

    /// Check if this status indicates a wait timeout
    pub const fn is_timeout(&self) -> bool {
        self.0 == codes::SCARD_E_TIMEOUT
    }

    /// Get the appropriate tracing level for this status
    pub const fn tracing_level(&self) -> Level {
        match self.condition() {
            Condition::Success => Level::DEBUG,
            Condition::Timeout => Level::TRACE,
            Condition::NoReadersAvailable | Condition::InsufficientBuffer => Level::INFO,
            _ => Level::WARN,
        }
    }

    /// Get a description of this status
    pub const fn description(&self) -> &'static str {
        use codes::*;

        match self.0 {
            SCARD_S_SUCCESS => "No error was encountered",
            SCARD_F_INTERNAL_ERROR => "An internal consistency check failed",
            SCARD_E_CANCELLED => "The action was cancelled by a cancel request",
            SCARD_E_INVALID_HANDLE | ERROR_INVALID_HANDLE => "The supplied handle was invalid",
            SCARD_E_INVALID_PARAMETER => "One or more of the supplied parameters could not be properly interpreted",
            SCARD_E_NO_MEMORY => "Not enough memory available to complete this command",
            SCARD_E_INSUFFICIENT_BUFFER => "The data buffer to receive returned data is too small",
            SCARD_E_UNKNOWN_READER => "The specified reader name is not recognized",
            SCARD_E_TIMEOUT => "The user-specified timeout value has expired",
            SCARD_E_NO_SMARTCARD => "The operation requires a smart card, but no smart card is currently in the device",
            SCARD_E_INVALID_VALUE => "One or more of the supplied parameter values could not be properly interpreted",
            SCARD_E_SYSTEM_CANCELLED => "The action was cancelled by the system",
            SCARD_F_COMM_ERROR => "An internal communications error has been detected",
            SCARD_F_UNKNOWN_ERROR => "An internal error has been detected, but the source is unknown",
            SCARD_E_READER_UNAVAILABLE => "The specified reader is not currently available for use",
            SCARD_P_SHUTDOWN => "The operation has been aborted to allow the server application to exit",
            SCARD_E_NO_SERVICE => "The smart card resource manager is not running",
            SCARD_E_SERVICE_STOPPED => "The smart card resource manager has shut down",
            SCARD_E_UNEXPECTED => "An unexpected card error has occurred",
            SCARD_E_NO_READERS_AVAILABLE => "Cannot find a smart card reader",
            SCARD_E_SERVER_TOO_BUSY => "The smart card resource manager is too busy to complete this operation",
            _ => "Unknown error",
        }
    }
}

/// Classify a raw status value
pub const fn classify(code: u32) -> Condition {
    StatusCode::new(code).condition()
}

impl From<u32> for StatusCode {
    fn from(code: u32) -> Self {
        Self::new(code)
    }
}

impl From<StatusCode> for u32 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.description(), self.0)
    }
}

/// Raw status values of the resource manager API
pub mod codes {
    #![allow(missing_docs)]

    pub const SCARD_S_SUCCESS: u32 = 0x0000_0000;
    pub const SCARD_F_INTERNAL_ERROR: u32 = 0x8010_0001;
    pub const SCARD_E_CANCELLED: u32 = 0x8010_0002;
    pub const SCARD_E_INVALID_HANDLE: u32 = 0x8010_0003;
    pub const SCARD_E_INVALID_PARAMETER: u32 = 0x8010_0004;
    pub const SCARD_E_NO_MEMORY: u32 = 0x8010_0006;
    pub const SCARD_E_INSUFFICIENT_BUFFER: u32 = 0x8010_0008;
    pub const SCARD_E_UNKNOWN_READER: u32 = 0x8010_0009;
    pub const SCARD_E_TIMEOUT: u32 = 0x8010_000A;
    pub const SCARD_E_NO_SMARTCARD: u32 = 0x8010_000C;
    pub const SCARD_E_INVALID_VALUE: u32 = 0x8010_0011;
    pub const SCARD_E_SYSTEM_CANCELLED: u32 = 0x8010_0012;
    pub const SCARD_F_COMM_ERROR: u32 = 0x8010_0013;
    pub const SCARD_F_UNKNOWN_ERROR: u32 = 0x8010_0014;
    pub const SCARD_E_READER_UNAVAILABLE: u32 = 0x8010_0017;
    pub const SCARD_P_SHUTDOWN: u32 = 0x8010_0018;
    pub const SCARD_E_NO_SERVICE: u32 = 0x8010_001D;
    pub const SCARD_E_SERVICE_STOPPED: u32 = 0x8010_001E;
    pub const SCARD_E_UNEXPECTED: u32 = 0x8010_001F;
    pub const SCARD_E_NO_READERS_AVAILABLE: u32 = 0x8010_002E;
    pub const SCARD_E_SERVER_TOO_BUSY: u32 = 0x8010_0031;

    /// Win32 `ERROR_INVALID_HANDLE`, returned for a released context on Windows
    pub const ERROR_INVALID_HANDLE: u32 = 0x0000_0006;
}
