use thiserror::Error;

/// Crate-wide error type.
///
/// Per-tick outcomes that are part of normal play (a failed route search, a
/// city with no power) are ordinary return values, never errors. `SimError`
/// covers misuse of the API surface and internal consistency failures only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// Coordinate outside the fixed grid. The offending call mutates nothing.
    #[error("coordinate ({x}, {y}) outside {width}x{height} grid")]
    Bounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    /// Loaded state does not match the expected shape or tile vocabulary.
    #[error("malformed city state: {0}")]
    Format(String),

    /// A configuration value is outside its documented range.
    #[error("configuration rejected: {0}")]
    Config(String),

    /// Internal consistency failure. Always fatal to the call; never patched
    /// over silently.
    #[error("simulation invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
