//! Monthly totals by transaction type
//!
//! Pure fold over the transactions; unrecognized types fall into no bucket.
//! Exact decimal arithmetic keeps the fold order-independent.

use crate::models::{Transaction, TransactionKind};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateTotals {
    pub total_income: Decimal,
    pub total_fixed: Decimal,
    pub total_variable: Decimal,
    pub total_card: Decimal,
    /// May be negative.
    pub month_balance: Decimal,
    /// Always `max(0, month_balance)`.
    pub possible_savings: Decimal,
}

impl AggregateTotals {
    pub fn compute(transactions: &[Transaction]) -> Self {
        let mut totals = transactions
            .iter()
            .fold(Self::default(), |mut acc, tx| {
                let bucket = match tx.kind() {
                    Some(TransactionKind::Income) => &mut acc.total_income,
                    Some(TransactionKind::Fixed) => &mut acc.total_fixed,
                    Some(TransactionKind::Variable) => &mut acc.total_variable,
                    Some(TransactionKind::Card) => &mut acc.total_card,
                    None => return acc,
                };
                *bucket = bucket.saturating_add(tx.amount);
                acc
            });

        totals.month_balance = totals
            .total_income
            .saturating_sub(totals.total_fixed)
            .saturating_sub(totals.total_variable)
            .saturating_sub(totals.total_card);
        totals.possible_savings = totals.month_balance.max(Decimal::ZERO);
        totals
    }
}
