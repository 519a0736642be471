//! Display formatting for amounts and movement lines

use crate::models::Transaction;
use rust_decimal::{Decimal, RoundingStrategy};

const MISSING: &str = "-";

/// Two fractional digits, half away from zero, period separator.
/// Anything that rounds to zero prints as `0.00`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    format!("{:.2}", rounded)
}

/// `"{date} | {type} | {category} | R$ {amount} | {description}"`
pub fn format_movement(tx: &Transaction) -> String {
    format!(
        "{} | {} | {} | R$ {} | {}",
        tx.date.as_deref().unwrap_or(MISSING),
        tx.kind_label.as_deref().unwrap_or(MISSING),
        tx.category.as_deref().unwrap_or(MISSING),
        format_amount(tx.amount),
        tx.description.as_deref().unwrap_or(MISSING),
    )
}

/// One line per transaction, input order preserved.
pub fn format_movements(transactions: &[Transaction]) -> Vec<String> {
    transactions.iter().map(format_movement).collect()
}
