use crate::error::{DataError, Result};
use crate::ledger::{Transaction, format_date};
use chrono::NaiveDateTime;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

pub const VARIOUS: &str = "Various";

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Reject rows whose fee_percentage falls outside [0, 100].
    pub validate_fees: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            validate_fees: true,
        }
    }
}

/// Acquisition or disposal date of a summary row: the shared date when every
/// folded transaction agrees, `Various` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSummary {
    On(NaiveDateTime),
    Various,
}

impl DateSummary {
    fn observe(current: Option<DateSummary>, date: NaiveDateTime) -> DateSummary {
        match current {
            None => DateSummary::On(date),
            Some(DateSummary::On(d)) if d == date => DateSummary::On(d),
            Some(_) => DateSummary::Various,
        }
    }
}

impl fmt::Display for DateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSummary::On(d) => f.write_str(&format_date(d)),
            DateSummary::Various => f.write_str(VARIOUS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSummary {
    pub token: String,
    /// Number of transactions folded into the row, not units traded.
    pub quantity: usize,
    pub date_acquired: DateSummary,
    pub date_sold: DateSummary,
    pub total_sale_proceeds: Decimal,
    pub total_cost_basis: Decimal,
    pub pnl: Decimal,
}

impl Transaction {
    /// Sale price after the percentage fee, `None` if it leaves the
    /// representable range.
    pub fn net_sale(&self) -> Option<Decimal> {
        dec!(100)
            .checked_sub(self.fee_percentage)?
            .checked_mul(self.sale_price)?
            .checked_div(dec!(100))
    }

    pub fn pnl(&self) -> Option<Decimal> {
        self.net_sale()?.checked_sub(self.buy_price)
    }
}

/// Whole-unit reporting, half away from zero.
pub fn whole(x: Decimal) -> Decimal {
    x.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

#[derive(Debug)]
struct TokenAccumulator {
    token: String,
    count: usize,
    acquired: Option<DateSummary>,
    sold: Option<DateSummary>,
    net_sale: Decimal,
    cost_basis: Decimal,
    pnl: Decimal,
}

impl TokenAccumulator {
    fn new(token: &str) -> Self {
        TokenAccumulator {
            token: token.to_string(),
            count: 0,
            acquired: None,
            sold: None,
            net_sale: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            pnl: Decimal::ZERO,
        }
    }

    fn fold(&mut self, row: usize, tx: &Transaction) -> Result<()> {
        let overflow = || DataError::Overflow {
            row,
            token: tx.token.clone(),
        };
        let net_sale = tx.net_sale().ok_or_else(overflow)?;
        let pnl = tx.pnl().ok_or_else(overflow)?;
        self.net_sale = self.net_sale.checked_add(net_sale).ok_or_else(overflow)?;
        self.cost_basis = self
            .cost_basis
            .checked_add(tx.buy_price)
            .ok_or_else(overflow)?;
        self.pnl = self.pnl.checked_add(pnl).ok_or_else(overflow)?;
        self.count += 1;
        self.acquired = Some(DateSummary::observe(self.acquired, tx.buy_date));
        self.sold = Some(DateSummary::observe(self.sold, tx.sale_date));
        Ok(())
    }

    // Sums stay exact until here; each total is rounded once.
    fn finish(self) -> TokenSummary {
        debug!(
            token = %self.token,
            transactions = self.count,
            net_sale = %self.net_sale,
            cost_basis = %self.cost_basis,
            pnl = %self.pnl,
            "closing token group"
        );
        TokenSummary {
            quantity: self.count,
            date_acquired: self.acquired.unwrap_or(DateSummary::Various),
            date_sold: self.sold.unwrap_or(DateSummary::Various),
            total_sale_proceeds: whole(self.net_sale),
            total_cost_basis: whole(self.cost_basis),
            pnl: whole(self.pnl),
            token: self.token,
        }
    }
}

fn validate_fees(transactions: &[Transaction]) -> Result<()> {
    for (i, tx) in transactions.iter().enumerate() {
        if tx.fee_percentage < Decimal::ZERO || tx.fee_percentage > dec!(100) {
            return Err(DataError::FeeOutOfRange {
                row: i + 1,
                token: tx.token.clone(),
                fee: tx.fee_percentage,
            });
        }
    }
    Ok(())
}

/// Folds transactions into one summary per token, in order of each token's
/// first appearance. Tokens match by exact string equality.
pub fn aggregate_transactions(
    transactions: &[Transaction],
    options: &AggregateOptions,
) -> Result<Vec<TokenSummary>> {
    if options.validate_fees {
        validate_fees(transactions)?;
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<TokenAccumulator> = Vec::new();
    for (i, tx) in transactions.iter().enumerate() {
        let slot = *index.entry(tx.token.as_str()).or_insert_with(|| {
            groups.push(TokenAccumulator::new(&tx.token));
            groups.len() - 1
        });
        groups[slot].fold(i + 1, tx)?;
    }

    let out: Vec<TokenSummary> = groups.into_iter().map(TokenAccumulator::finish).collect();
    info!(
        transactions = transactions.len(),
        tokens = out.len(),
        "aggregated transactions"
    );
    Ok(out)
}
