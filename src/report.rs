use crate::aggregate::TokenSummary;
use crate::error::Result;
use csv::WriterBuilder;
use rust_decimal::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct SummaryRow {
    token: String,
    quantity: usize,
    date_acquired: String,
    date_sold: String,
    total_sale_proceeds: String,
    total_cost_basis: String,
    pnl: String,
}

impl From<&TokenSummary> for SummaryRow {
    fn from(s: &TokenSummary) -> Self {
        SummaryRow {
            token: s.token.clone(),
            quantity: s.quantity,
            date_acquired: s.date_acquired.to_string(),
            date_sold: s.date_sold.to_string(),
            total_sale_proceeds: s.total_sale_proceeds.to_string(),
            total_cost_basis: s.total_cost_basis.to_string(),
            pnl: s.pnl.to_string(),
        }
    }
}

const SUMMARY_HEADER: [&str; 7] = [
    "token",
    "quantity",
    "date_acquired",
    "date_sold",
    "total_sale_proceeds",
    "total_cost_basis",
    "pnl",
];

pub fn write_summaries_to<W: Write>(writer: W, summaries: &[TokenSummary]) -> Result<()> {
    // Header written by hand so an empty report still has one.
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(SUMMARY_HEADER)?;
    for s in summaries {
        wtr.serialize(SummaryRow::from(s))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summaries<P: AsRef<Path>>(path: P, summaries: &[TokenSummary]) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path)?;
    write_summaries_to(f, summaries)?;
    info!(path = %path.display(), rows = summaries.len(), "wrote summary report");
    Ok(())
}

/// Grand totals over the already-rounded summary rows.
#[derive(Debug, Default, PartialEq)]
pub struct ReportTotals {
    pub tokens: usize,
    pub transactions: usize,
    pub sale_proceeds: Decimal,
    pub cost_basis: Decimal,
    pub pnl: Decimal,
}

impl ReportTotals {
    pub fn from_summaries(summaries: &[TokenSummary]) -> Self {
        let mut totals = ReportTotals {
            tokens: summaries.len(),
            ..Default::default()
        };
        for s in summaries {
            totals.transactions += s.quantity;
            totals.sale_proceeds += s.total_sale_proceeds;
            totals.cost_basis += s.total_cost_basis;
            totals.pnl += s.pnl;
        }
        totals
    }
}
