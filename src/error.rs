use rust_decimal::Decimal;

pub type Result<T> = std::result::Result<T, DataError>;

/// Everything that can abort an aggregation run. Rows are numbered from 1,
/// not counting the header.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumn(Vec<String>),
    #[error("row {row}: empty value in column '{column}'")]
    EmptyField { row: usize, column: &'static str },
    #[error("row {row}: unsupported date format in column '{column}': {value}")]
    InvalidDate {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: invalid number in column '{column}': {value}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: fee_percentage {fee} for token {token} is outside [0, 100]")]
    FeeOutOfRange {
        row: usize,
        token: String,
        fee: Decimal,
    },
    #[error("row {row}: amounts for token {token} exceed the decimal range")]
    Overflow { row: usize, token: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl DataError {
    pub fn is_schema_error(&self) -> bool {
        matches!(self, DataError::MissingColumn(_))
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            DataError::EmptyField { .. }
                | DataError::InvalidDate { .. }
                | DataError::InvalidNumber { .. }
        )
    }
}
