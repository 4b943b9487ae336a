use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LotError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

pub type LotResult<T> = Result<T, LotError>;
