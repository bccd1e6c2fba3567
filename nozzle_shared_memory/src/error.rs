//! Error types for shared memory operations

use thiserror::Error;

/// Errors that can occur during shared memory operations
#[derive(Error, Debug)]
pub enum ShmError {
    /// Segment not found
    #[error("Segment not found: {name}")]
    NotFound {
        /// Segment name
        name: String,
    },

    /// Segment exists but its size does not match the expected layout
    #[error("Segment {name} has {actual} bytes, layout needs exactly {expected}")]
    SizeMismatch {
        /// Segment name
        name: String,
        /// Size of the layout in bytes
        expected: usize,
        /// Size of the segment in bytes
        actual: usize,
    },

    /// Invalid segment name
    #[error("Invalid segment name: {name:?}")]
    InvalidName {
        /// Segment name
        name: String,
    },

    /// Permission denied
    #[error("Permission denied accessing segment: {name}")]
    PermissionDenied {
        /// Segment name
        name: String,
    },

    /// Memory alignment error
    #[error("Memory alignment error: address {address:#x} not aligned to {alignment}")]
    AlignmentError {
        /// Memory address
        address: usize,
        /// Required alignment
        alignment: usize,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// Nix system call error
    #[error("System call error: {source}")]
    Nix {
        /// Source nix error
        #[from]
        source: nix::Error,
    },
}

/// Result type for shared memory operations
pub type ShmResult<T> = Result<T, ShmError>;
