//! Error types for the Prisma engine
//!
//! This module defines the error type used throughout the engine and the
//! helper macros that log an error through the engine logger before
//! returning it.
//!
//! Transient presentation conditions (out-of-date or suboptimal swapchain)
//! are NOT errors: they travel as enum values (`AcquireResult`,
//! `PresentResult`) so the frame loop can recover without unwinding.

use std::fmt;

/// Result type for Prisma engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prisma engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan device lost, submit failure, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (stale handle, unknown name, bad descriptor)
    InvalidResource(String),

    /// Initialization failed (instance, device, swapchain, frame sync objects)
    InitializationFailed(String),

    /// An operation was called in a state that does not allow it
    InvalidState(String),
}

impl Error {
    /// True for the error classes that make the engine unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InitializationFailed(_) | Error::OutOfMemory)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build a `BackendError` with the same message
///
/// # Example
///
/// ```no_run
/// # use prisma_engine::engine_err;
/// let err = engine_err!("prisma::vulkan", "Failed to submit: {}", 42);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::prisma::Error::BackendError(message)
    }};
}

/// Log a WARN and build a `BackendError` with the same message
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_warn!($source, "{}", message);
        $crate::prisma::Error::BackendError(message)
    }};
}

/// Log an ERROR and return `Err(BackendError)` from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a WARN and return `Err(BackendError)` from the enclosing function
#[macro_export]
macro_rules! engine_bail_warn {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
