//! Error types shared by the parser, CNF transformer and CLI.

use std::fmt;
use std::io;

/// Everything that can go wrong on the way from grammar source text to a
/// `DiffResult`.
#[derive(Debug)]
pub enum CfgError {
    /// The source file could not be opened or read.
    Io(io::Error),
    /// The lexer or parser rejected the input.
    Syntax(String),
    /// A structurally malformed grammar was found mid-transformation
    /// (`epsilon` mixed into a longer production, or a production with more
    /// nullable positions than fit in a `u64` bitmask).
    Semantic(String),
}

impl fmt::Display for CfgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgError::Io(e) => write!(f, "i/o error: {e}"),
            CfgError::Syntax(msg) => write!(f, "syntax error: {msg}"),
            CfgError::Semantic(msg) => write!(f, "malformed grammar: {msg}"),
        }
    }
}

impl std::error::Error for CfgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CfgError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CfgError {
    fn from(e: io::Error) -> Self {
        CfgError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, CfgError>;
