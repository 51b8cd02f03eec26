// Decimal-preserving save codec
// Decodes save text into a `Value` tree and writes it back byte-for-byte in
// the game's own layout.

pub mod decimal;
pub mod read;
pub mod value;
pub mod write;

use thiserror::Error;

pub use decimal::{Decimal, DecimalError};
pub use read::{from_slice, from_str, from_str_with, ReadOptions};
pub use value::{Map, Value, ValueType};
pub use write::{encode_number, to_string, to_writer};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("{message}: line {line} column {column}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Out of range float value `{token}`: line {line} column {column}")]
    ValueKind {
        token: &'static str,
        line: usize,
        column: usize,
    },

    #[error("Number exponent out of range: line {line} column {column}")]
    NumberOutOfRange { line: usize, column: usize },

    #[error("Save file is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Parses one numeric literal into a decimal without going through binary
/// floating point.
pub fn decode_number(text: &str) -> Result<Decimal, DecimalError> {
    text.parse()
}
