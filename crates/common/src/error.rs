//! Errors produced when parsing rendered flags.

use thiserror::Error;

use crate::protocol::HEX_LEN;

/// A rendered flag string did not match `<prefix>{<36 hex digits>}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The text does not start with the expected flag prefix.
    #[error("missing `{0}` prefix")]
    MissingPrefix(String),

    /// The body is not enclosed in `{` and `}`.
    #[error("flag body must be enclosed in braces")]
    MissingBraces,

    /// The body has the wrong number of characters.
    #[error("flag body must be {HEX_LEN} hex digits, got {0}")]
    InvalidLength(usize),

    /// The body contains a character outside `[0-9a-fA-F]`.
    #[error("flag body is not valid hex")]
    InvalidHex,
}
