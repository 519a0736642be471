//! Core data models for the monthly report
//!
//! Inbound payloads are read leniently: wire names follow the end-user's
//! vocabulary (`movimentos`, `metas`, `valor`, ...) and English aliases are
//! accepted. Amounts are coerced, never rejected.

use crate::error::ReportError;
use crate::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

pub const FALLBACK_REPORT_TEXT: &str = "Não foi possível gerar a análise.";

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Fixed,
    Variable,
    Card,
}

impl TransactionKind {
    /// Exact, case-sensitive match against the known labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "entrada" | "income" => Some(TransactionKind::Income),
            "fixo" | "fixed" => Some(TransactionKind::Fixed),
            "variavel" | "variable" => Some(TransactionKind::Variable),
            "cartao" | "card" => Some(TransactionKind::Card),
            _ => None,
        }
    }
}

//
// ================= Transaction =================
//

/// One movement of the month, immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: Option<String>,
    /// Raw type label as sent by the caller, kept for display.
    pub kind_label: Option<String>,
    pub category: Option<String>,
    pub amount: Decimal,
    pub description: Option<String>,
}

impl Transaction {
    pub fn kind(&self) -> Option<TransactionKind> {
        self.kind_label.as_deref().and_then(TransactionKind::from_label)
    }

    /// Read a transaction from one element of `movimentos`.
    ///
    /// Non-object elements yield a transaction with every field missing.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        Self {
            date: display_label(lookup(obj, &["data", "date"])),
            kind_label: display_label(lookup(obj, &["tipo", "type"])),
            category: display_label(lookup(obj, &["categoria", "category"])),
            amount: coerce_amount(lookup(obj, &["valor", "amount"])),
            description: display_label(lookup(obj, &["descricao", "description"])),
        }
    }
}

//
// ================= Goals =================
//

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Goals {
    pub savings_goal: Decimal,
    pub variable_goal: Decimal,
    pub card_goal: Decimal,
}

impl Goals {
    /// Read `metas`; a non-object value yields all-zero goals.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        Self {
            savings_goal: coerce_amount(lookup(obj, &["metaPoupanca", "savingsGoal"])),
            variable_goal: coerce_amount(lookup(obj, &["metaVariavel", "variableGoal"])),
            card_goal: coerce_amount(lookup(obj, &["metaCartao", "cardGoal"])),
        }
    }
}

//
// ================= Request / Result =================
//

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub transactions: Vec<Transaction>,
    pub goals: Goals,
    pub month: Option<String>,
    pub year: Option<String>,
}

impl ReportRequest {
    /// Validate and read the inbound body.
    ///
    /// Rejects when the body is not an object, when `movimentos` is absent or
    /// not an array, or when `metas` is absent or falsy (`false`, `0`, `""`).
    pub fn from_json(body: &Value) -> Result<Self> {
        let obj = body
            .as_object()
            .ok_or_else(|| ReportError::Validation("request body is not a JSON object".into()))?;

        let movements = lookup(obj, &["movimentos", "transactions"])
            .ok_or_else(|| ReportError::Validation("missing movimentos".into()))?
            .as_array()
            .ok_or_else(|| ReportError::Validation("movimentos is not an array".into()))?;

        let goals = lookup(obj, &["metas", "goals"])
            .filter(|v| !is_falsy(v))
            .ok_or_else(|| ReportError::Validation("missing metas".into()))?;

        Ok(Self {
            transactions: movements.iter().map(Transaction::from_value).collect(),
            goals: Goals::from_value(goals),
            month: display_label(lookup(obj, &["mes", "month"])),
            year: display_label(lookup(obj, &["ano", "year"])),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportResult {
    #[serde(rename = "texto")]
    pub text: String,
}

impl ReportResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_REPORT_TEXT)
    }
}

//
// ================= Field Helpers =================
//

/// First present, non-null value among `names`.
fn lookup<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

/// Text shown verbatim in the report; empty strings count as missing.
fn display_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Exact decimal parse; exponent forms go through `f64` and must fit a `Decimal`.
fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw).ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .and_then(|f| Decimal::try_from(f).ok())
    })
}

/// Coerce an amount: numbers as-is, numeric strings parsed, booleans as 1/0,
/// everything else (including out-of-range values) as 0.
pub fn coerce_amount(value: Option<&Value>) -> Decimal {
    let amount = match value {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(Decimal::ZERO)
            } else {
                parse_decimal(trimmed)
            }
        }
        Some(Value::Bool(true)) => Some(Decimal::ONE),
        _ => None,
    };

    amount.unwrap_or(Decimal::ZERO)
}
