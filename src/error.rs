//! Error types for the rANS coder.

use thiserror::Error;

/// Error variants for table construction, encoding, and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested precision is outside the supported `1..=16` bit range.
    #[error("unsupported precision: {0} bits (must be 1..=16)")]
    InvalidPrecision(u32),

    /// A table was requested for an alphabet with no symbols.
    #[error("alphabet is empty")]
    EmptyAlphabet,

    /// The alphabet has more symbols than the probability mass `2^P` can
    /// give a nonzero frequency each.
    #[error("alphabet of {alphabet} symbols does not fit {precision} bits of probability mass")]
    PrecisionTooLow {
        /// Number of symbols in the alphabet.
        alphabet: usize,
        /// Requested precision in bits.
        precision: u32,
    },

    /// A weight was negative or non-finite, or the weights sum to zero.
    #[error("invalid weight: {0}")]
    InvalidWeight(f64),

    /// A caller-supplied frequency or cdf array violates the table
    /// invariants.
    #[error("invalid cdf table: {0}")]
    InvalidTable(String),

    /// The symbol index does not exist in the table's alphabet.
    #[error("symbol {symbol} out of range for alphabet of {alphabet}")]
    SymbolOutOfRange {
        /// Offending symbol index.
        symbol: u16,
        /// Number of symbols in the alphabet.
        alphabet: usize,
    },

    /// The symbol has frequency 0 in its table and can never be encoded.
    #[error("symbol {0} has frequency 0 and cannot be encoded")]
    ImpossibleSymbol(u16),

    /// The indexed encode/decode API was given parallel slices of
    /// different lengths.
    #[error("{symbols} symbols but {indexes} table indexes")]
    LengthMismatch {
        /// Number of symbols supplied.
        symbols: usize,
        /// Number of table indexes supplied.
        indexes: usize,
    },

    /// A per-symbol table index points past the supplied table list.
    #[error("table index {index} out of range for {tables} tables")]
    TableIndexOutOfRange {
        /// Offending table index.
        index: usize,
        /// Number of tables supplied.
        tables: usize,
    },

    /// The compressed stream ran out of bytes before the requested symbol
    /// count was recovered: the buffer is truncated or does not match the
    /// supplied tables and counts.
    #[error("unexpected end of stream at byte {pos}")]
    UnexpectedEof {
        /// Byte offset at which the next read failed.
        pos: usize,
    },
}

/// A specialized Result type for rANS operations.
pub type Result<T> = std::result::Result<T, Error>;
