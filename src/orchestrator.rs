//! Report orchestrator - single-shot request pipeline
//!
//! IDLE → VALIDATING → AGGREGATING → GENERATING → RESPONDING
//!
//! Every outcome, including every error, ends as a JSON response here.

use crate::aggregator::AggregateTotals;
use crate::config::{ServiceConfig, CREDENTIAL_VAR};
use crate::error::ReportError;
use crate::formatter::format_movements;
use crate::models::{ReportRequest, ReportResult};
use crate::prompt::ReportPromptBuilder;
use crate::provider::{GenerationRequest, ModelConfig, ReportGenerator, ReportProviderClient};
use crate::Result;
use axum::http::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Validating,
    Aggregating,
    Generating,
    Responding,
}

/// Status plus optional JSON body, independent of the HTTP framework.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl ReportResponse {
    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }
}

/// Main orchestrator that coordinates the report pipeline
pub struct ReportOrchestrator {
    generator: Arc<dyn ReportGenerator>,
    prompt_builder: ReportPromptBuilder,
    model_config: ModelConfig,
}

impl ReportOrchestrator {
    pub fn new(
        generator: Arc<dyn ReportGenerator>,
        prompt_builder: ReportPromptBuilder,
        model_config: ModelConfig,
    ) -> Self {
        Self {
            generator,
            prompt_builder,
            model_config,
        }
    }

    /// Wire the real provider client from service configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let client = ReportProviderClient::new(&config.provider)?;
        Ok(Self::new(
            Arc::new(client),
            ReportPromptBuilder::new(config.annual_savings_target),
            config.model_config,
        ))
    }

    /// Handle one invocation of the report endpoint.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> ReportResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("report_request", %request_id, %method);

        async move {
            if *method == Method::OPTIONS {
                debug!("Preflight request");
                return ReportResponse::empty(StatusCode::OK);
            }

            let mut stage = PipelineStage::Idle;
            let outcome = self.run(method, body, &mut stage).await;

            let response = match outcome.and_then(|result| Ok(serde_json::to_value(&result)?)) {
                Ok(body) => ReportResponse::json(StatusCode::OK, body),
                Err(err) => Self::error_response(err, stage),
            };

            info!(status = response.status.as_u16(), "Report request finished");
            response
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        method: &Method,
        body: &[u8],
        stage: &mut PipelineStage,
    ) -> Result<ReportResult> {
        if *method != Method::POST {
            return Err(ReportError::MethodNotAllowed(method.to_string()));
        }

        // Credential first: nothing is parsed for a request that cannot be served.
        if let Err(err) = self.generator.ensure_configured() {
            error!("{} is not set in the environment", CREDENTIAL_VAR);
            return Err(err);
        }

        advance(stage, PipelineStage::Validating);
        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| ReportError::Validation(format!("body is not valid JSON: {}", e)))?;
        let request = ReportRequest::from_json(&payload)?;

        advance(stage, PipelineStage::Aggregating);
        let totals = AggregateTotals::compute(&request.transactions);
        let movements = format_movements(&request.transactions);
        debug!(
            transactions = request.transactions.len(),
            month_balance = %totals.month_balance,
            possible_savings = %totals.possible_savings,
            "Month aggregated"
        );

        let generation = GenerationRequest {
            system_instruction: self.prompt_builder.system_instruction().to_string(),
            user_prompt: self.prompt_builder.build(&request, &totals, &movements),
            model_config: self.model_config,
        };

        advance(stage, PipelineStage::Generating);
        let result = match self.generator.generate(&generation).await {
            Ok(result) => result,
            Err(ReportError::MissingText { .. }) => {
                warn!("Provider returned no text, using fallback report");
                ReportResult::fallback()
            }
            Err(err) => return Err(err),
        };

        advance(stage, PipelineStage::Responding);
        Ok(result)
    }

    fn error_response(err: ReportError, stage: PipelineStage) -> ReportResponse {
        match &err {
            ReportError::Validation(reason) => info!(?stage, "Rejected request: {}", reason),
            ReportError::MethodNotAllowed(method) => info!("Rejected method {}", method),
            ReportError::Configuration(_) => {}
            ReportError::Upstream { message, details } => {
                error!(?stage, ?details, "Report provider failed: {}", message)
            }
            _ => error!(?stage, "Report pipeline fault: {}", err),
        }

        ReportResponse::json(err.status_code(), err.response_body())
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    debug!(from = ?*stage, to = ?next, "Pipeline stage");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{
        CONFIGURATION_MESSAGE, INTERNAL_MESSAGE, METHOD_NOT_ALLOWED_MESSAGE, UPSTREAM_MESSAGE,
        VALIDATION_MESSAGE,
    };
    use crate::models::FALLBACK_REPORT_TEXT;
    use crate::provider::{MockGenerator, MockOutcome};
    use serde_json::json;

    fn orchestrator(generator: Arc<MockGenerator>) -> ReportOrchestrator {
        ReportOrchestrator::new(generator, ReportPromptBuilder::default(), ModelConfig::default())
    }

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn month_body() -> Vec<u8> {
        body(json!({
            "movimentos": [
                { "data": "01/05", "tipo": "entrada", "categoria": "Salário", "valor": 5000 },
                { "data": "05/05", "tipo": "fixo", "categoria": "Aluguel", "valor": 1200 },
                { "data": "12/05", "tipo": "variavel", "categoria": "Mercado", "valor": 800 },
                { "data": "20/05", "tipo": "cartao", "categoria": "Streaming", "valor": 300 }
            ],
            "metas": { "metaPoupanca": 1300, "metaVariavel": 900, "metaCartao": 400 },
            "mes": "Maio",
            "ano": "2024"
        }))
    }

    #[tokio::test]
    async fn test_full_month_report() {
        let generator = Arc::new(MockGenerator::replying("Ótimo mês."));
        let orch = orchestrator(generator.clone());

        let response = orch.handle(&Method::POST, &month_body()).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, Some(json!({ "texto": "Ótimo mês." })));
        assert_eq!(generator.calls(), 1);

        let sent = generator.last_request().unwrap();
        assert_eq!(sent.system_instruction, "Você é um analista financeiro profissional.");
        assert!(sent.user_prompt.contains("- Entradas: R$ 5000.00"));
        assert!(sent.user_prompt.contains("- Saldo: R$ 2700.00"));
        assert!(sent.user_prompt.contains("- Poupança possível: R$ 2700.00"));
        assert!(sent
            .user_prompt
            .contains("05/05 | fixo | Aluguel | R$ 1200.00 | -"));
        assert_eq!(sent.model_config, ModelConfig::default());
    }

    #[tokio::test]
    async fn test_empty_movements_still_generate() {
        let generator = Arc::new(MockGenerator::replying("Sem movimentos."));
        let orch = orchestrator(generator.clone());

        let response = orch
            .handle(
                &Method::POST,
                &body(json!({ "movimentos": [], "metas": {}, "mes": "Junho", "ano": 2024 })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(generator.calls(), 1);
        let prompt = generator.last_request().unwrap().user_prompt;
        assert!(prompt.contains("- Saldo: R$ 0.00"));
        assert!(prompt.contains("- Poupança possível: R$ 0.00"));
    }

    #[tokio::test]
    async fn test_missing_goals_rejected_before_generation() {
        let generator = Arc::new(MockGenerator::replying("unused"));
        let orch = orchestrator(generator.clone());

        let response = orch
            .handle(
                &Method::POST,
                &body(json!({ "movimentos": [{ "tipo": "entrada", "valor": 10 }] })),
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, Some(json!({ "error": VALIDATION_MESSAGE })));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_bodies() {
        let generator = Arc::new(MockGenerator::replying("unused"));
        let orch = orchestrator(generator.clone());

        let bodies: [&[u8]; 4] = [b"", b"not json", b"[]", br#"{"movimentos": "x", "metas": {}}"#];
        for raw in bodies {
            let response = orch.handle(&Method::POST, raw).await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
        }
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let generator = Arc::new(MockGenerator::unconfigured());
        let orch = orchestrator(generator.clone());

        // Credential is checked before validation, so even a bad body yields 500.
        for raw in [month_body(), b"not json".to_vec()] {
            let response = orch.handle(&Method::POST, &raw).await;
            assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(response.body, Some(json!({ "error": CONFIGURATION_MESSAGE })));
        }
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_text_uses_fallback() {
        let generator = Arc::new(MockGenerator::new(MockOutcome::MissingText));
        let orch = orchestrator(generator);

        let response = orch.handle(&Method::POST, &month_body()).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, Some(json!({ "texto": FALLBACK_REPORT_TEXT })));
    }

    #[tokio::test]
    async fn test_preflight() {
        let generator = Arc::new(MockGenerator::unconfigured());
        let orch = orchestrator(generator.clone());

        let response = orch.handle(&Method::OPTIONS, b"garbage").await;

        assert_eq!(response, ReportResponse::empty(StatusCode::OK));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let generator = Arc::new(MockGenerator::replying("unused"));
        let orch = orchestrator(generator.clone());

        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let response = orch.handle(&method, &month_body()).await;
            assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.body, Some(json!({ "error": METHOD_NOT_ALLOWED_MESSAGE })));
        }
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_exposes_details() {
        let details = json!({ "error": { "code": "insufficient_quota" } });
        let generator = Arc::new(MockGenerator::new(MockOutcome::Upstream(Some(details.clone()))));
        let orch = orchestrator(generator);

        let response = orch.handle(&Method::POST, &month_body()).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            Some(json!({ "error": UPSTREAM_MESSAGE, "detalhes": details }))
        );
    }

    #[tokio::test]
    async fn test_internal_fault_is_generic() {
        let generator = Arc::new(MockGenerator::new(MockOutcome::Internal(
            "Salário 5000 leaked".into(),
        )));
        let orch = orchestrator(generator);

        let response = orch.handle(&Method::POST, &month_body()).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, Some(json!({ "error": INTERNAL_MESSAGE })));
    }

    #[tokio::test]
    async fn test_fractional_amounts_are_exact() {
        let generator = Arc::new(MockGenerator::replying("ok"));
        let orch = orchestrator(generator.clone());

        let response = orch
            .handle(
                &Method::POST,
                &body(json!({
                    "movimentos": [
                        { "tipo": "entrada", "valor": 0.3 },
                        { "tipo": "fixo", "valor": 0.1 },
                        { "tipo": "fixo", "valor": "0.2" }
                    ],
                    "metas": { "metaPoupanca": 0.1 }
                })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        let prompt = generator.last_request().unwrap().user_prompt;
        assert!(prompt.contains("- Poupança: R$ 0.10"));
        assert!(prompt.contains("- Gastos Fixos: R$ 0.30"));
        assert!(prompt.contains("- Saldo: R$ 0.00"));
        assert!(prompt.contains("- Poupança possível: R$ 0.00"));
    }

    #[tokio::test]
    async fn test_non_object_goals_generate_with_zero_goals() {
        let generator = Arc::new(MockGenerator::replying("ok"));
        let orch = orchestrator(generator.clone());

        let response = orch
            .handle(
                &Method::POST,
                &body(json!({ "movimentos": [], "metas": [1, 2] })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        let prompt = generator.last_request().unwrap().user_prompt;
        assert!(prompt.contains("- Poupança: R$ 0.00\n- Variáveis: R$ 0.00\n- Cartão: R$ 0.00"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let generator = Arc::new(MockGenerator::replying("ok"));
        let orch = Arc::new(orchestrator(generator.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let orch = orch.clone();
                tokio::spawn(async move { orch.handle(&Method::POST, &month_body()).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().status, StatusCode::OK);
        }
        assert_eq!(generator.calls(), 8);
    }
}
