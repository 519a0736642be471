//! Report prompt composition
//!
//! The prompt document is the only contract between the local aggregation
//! and the generation provider.

use crate::aggregator::AggregateTotals;
use crate::formatter::format_amount;
use crate::models::ReportRequest;
use rust_decimal::Decimal;

pub const DEFAULT_ANNUAL_SAVINGS_TARGET: Decimal = Decimal::from_parts(15_600, 0, 0, false, 0);

const SYSTEM_INSTRUCTION: &str = "Você é um analista financeiro profissional.";

#[derive(Debug, Clone)]
pub struct ReportPromptBuilder {
    annual_savings_target: Decimal,
}

impl ReportPromptBuilder {
    pub fn new(annual_savings_target: Decimal) -> Self {
        Self {
            annual_savings_target,
        }
    }

    pub fn system_instruction(&self) -> &'static str {
        SYSTEM_INSTRUCTION
    }

    /// Build the user prompt from the request labels, totals and rendered movements.
    pub fn build(
        &self,
        request: &ReportRequest,
        totals: &AggregateTotals,
        movements: &[String],
    ) -> String {
        format!(
            r#"Você é um analista financeiro pessoal.

Analise os gastos, metas e sobras do usuário e produza um relatório claro e prático.

Dados do mês:
- Mês: {}
- Ano: {}

Metas:
- Poupança: R$ {}
- Variáveis: R$ {}
- Cartão: R$ {}

Totais:
- Entradas: R$ {}
- Gastos Fixos: R$ {}
- Variáveis: R$ {}
- Cartão: R$ {}
- Saldo: R$ {}
- Poupança possível: R$ {}

Movimentos:
{}

Monte o relatório com:
1. Resumo geral.
2. Pontos positivos.
3. Alertas e riscos.
4. Sugestões práticas (5 no máximo).
5. Se a meta anual de R$ {} é possível.
Resposta em português, direta e amigável.
"#,
            request.month.as_deref().unwrap_or("-"),
            request.year.as_deref().unwrap_or("-"),
            format_amount(request.goals.savings_goal),
            format_amount(request.goals.variable_goal),
            format_amount(request.goals.card_goal),
            format_amount(totals.total_income),
            format_amount(totals.total_fixed),
            format_amount(totals.total_variable),
            format_amount(totals.total_card),
            format_amount(totals.month_balance),
            format_amount(totals.possible_savings),
            movements.join("\n"),
            format_amount(self.annual_savings_target),
        )
    }
}

impl Default for ReportPromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ANNUAL_SAVINGS_TARGET)
    }
}
