use thiserror::Error;

/// Errors raised by the decimal/date primitives and currency amount types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("arithmetic error: {0}")]
    ArithmeticError(String),

    #[error("could not parse '{0}' as a decimal amount")]
    ParseError(String),
}
