//! Error types for data parsing in solarflow-types.

use thiserror::Error;

/// Errors that can occur when parsing SolarFlow data types from text.
///
/// Sensor values themselves never produce errors (they degrade to zero),
/// so this only covers identifiers such as node names.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The text does not name one of the four energy nodes.
    #[error("Unknown energy node: {0}")]
    UnknownNode(String),

    /// The text does not name a known flow style.
    #[error("Unknown flow style: {0}")]
    UnknownFlowStyle(String),
}

/// Result type alias using solarflow-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
