use crate::error::{DataError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, Trim};
use rust_decimal::prelude::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const TRANSACTION_COLUMNS: [&str; 7] = [
    "token",
    "quantity",
    "buy_date",
    "sale_date",
    "buy_price",
    "sale_price",
    "fee_percentage",
];

#[derive(Debug, Deserialize, Clone)]
struct TransactionRow {
    token: String,
    quantity: String,
    buy_date: String,
    sale_date: String,
    buy_price: String,
    sale_price: String,
    fee_percentage: String,
}

/// One closed trade: a buy and the matching sale of `quantity` units of `token`.
///
/// `buy_price` is the total cost basis of the lot and `sale_price` the gross
/// proceeds before the percentage fee.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub token: String,
    pub quantity: Decimal,
    pub buy_date: NaiveDateTime,
    pub sale_date: NaiveDateTime,
    pub buy_price: Decimal,
    pub sale_price: Decimal,
    pub fee_percentage: Decimal,
}

fn require<'a>(row: usize, column: &'static str, s: &'a str) -> Result<&'a str> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DataError::EmptyField { row, column });
    }
    Ok(s)
}

pub fn parse_decimal(row: usize, column: &'static str, s: &str) -> Result<Decimal> {
    let s = require(row, column, s)?;
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| DataError::InvalidNumber {
            row,
            column,
            value: s.to_string(),
        })
}

pub fn parse_date(row: usize, column: &'static str, s: &str) -> Result<NaiveDateTime> {
    let s = require(row, column, s)?;
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_time(NaiveTime::MIN));
        }
    }
    Err(DataError::InvalidDate {
        row,
        column,
        value: s.to_string(),
    })
}

/// Calendar-only values print as `YYYY-MM-DD`; anything with a time of day
/// keeps it.
pub fn format_date(t: &NaiveDateTime) -> String {
    if t.time() == NaiveTime::MIN {
        t.format("%Y-%m-%d").to_string()
    } else {
        t.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl TransactionRow {
    // The token is kept byte-for-byte since it is the grouping key.
    // quantity is only checked to be numeric; summaries count rows instead.
    fn into_transaction(self, row: usize) -> Result<Transaction> {
        require(row, "token", &self.token)?;
        Ok(Transaction {
            token: self.token,
            quantity: parse_decimal(row, "quantity", &self.quantity)?,
            buy_date: parse_date(row, "buy_date", &self.buy_date)?,
            sale_date: parse_date(row, "sale_date", &self.sale_date)?,
            buy_price: parse_decimal(row, "buy_price", &self.buy_price)?,
            sale_price: parse_decimal(row, "sale_price", &self.sale_price)?,
            fee_percentage: parse_decimal(row, "fee_percentage", &self.fee_percentage)?,
        })
    }
}

fn check_schema(headers: &csv::StringRecord) -> Result<()> {
    let missing: Vec<String> = TRANSACTION_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumn(missing));
    }
    Ok(())
}

/// Reads a transaction table with a header row. Columns may come in any order
/// and unknown columns are ignored; the first bad row aborts the read.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(false)
        .from_reader(reader);
    check_schema(rdr.headers()?)?;

    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<TransactionRow>().enumerate() {
        let row = row?;
        out.push(row.into_transaction(i + 1)?);
    }
    debug!(rows = out.len(), "parsed transaction table");
    Ok(out)
}

pub fn load_transactions<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let f = File::open(path)?;
    let out = read_transactions(f)?;
    info!(path = %path.display(), transactions = out.len(), "loaded transactions");
    Ok(out)
}
