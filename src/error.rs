//! Common error type for shell operations

use core::fmt;

/// A common error type for shell operations.
///
/// None of these conditions is fatal to a running session: resource
/// exhaustion only prevents a session from being created, malformed input
/// discards the current command and a closed stream ends the session
/// normally.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// No thread control block is left in the shared pool.
    PoolExhausted,
    /// The stack source (heap or stack pool) could not provide a stack.
    StackExhausted,
    /// The scheduler refused to start the session thread.
    SpawnFailed,
    /// A command line has more arguments than `MAX_ARGUMENTS`.
    TooManyArguments,
    /// A prompt string is longer than `PROMPT_LENGTH`.
    PromptTooLong,
    /// The manager was configured without a mutable prompt.
    PromptDisabled,
    /// The stream signalled disconnection.
    StreamClosed,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// The configuration is inconsistent or could not be parsed.
    InvalidConfig,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Error::PoolExhausted => "thread pool exhausted",
            Error::StackExhausted => "stack allocation failed",
            Error::SpawnFailed => "thread creation failed",
            Error::TooManyArguments => "too many arguments",
            Error::PromptTooLong => "string too long",
            Error::PromptDisabled => "prompt is not mutable",
            Error::StreamClosed => "stream closed",
            Error::WriteError => "write error",
            Error::ReadError => "read error",
            Error::InvalidConfig => "invalid configuration",
        };
        f.write_str(text)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::PoolExhausted => defmt::write!(f, "PoolExhausted"),
            Error::StackExhausted => defmt::write!(f, "StackExhausted"),
            Error::SpawnFailed => defmt::write!(f, "SpawnFailed"),
            Error::TooManyArguments => defmt::write!(f, "TooManyArguments"),
            Error::PromptTooLong => defmt::write!(f, "PromptTooLong"),
            Error::PromptDisabled => defmt::write!(f, "PromptDisabled"),
            Error::StreamClosed => defmt::write!(f, "StreamClosed"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::InvalidConfig => defmt::write!(f, "InvalidConfig"),
        }
    }
}
