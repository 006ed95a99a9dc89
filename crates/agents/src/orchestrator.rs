use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};
use tripit_core::prompts::{
    chat_prompt, explanation_prompt, itinerary_prompt, suggestions_prompt, CHAT_SYSTEM,
    EXPLANATION_SYSTEM, ITINERARY_SYSTEM, SUGGESTIONS_SYSTEM,
};
use tripit_core::{
    allowed_destinations, fallback_chat_reply, fallback_explanation, parse_itinerary,
    parse_suggestions, prompt_destination_names, rule_based_suggestions, sanitize_response,
    synthesize_itinerary, DestinationRecord, GenerationFault, Itinerary, ItineraryRequest,
    ScoredDestination, SuggestionContext, CHAT_FAILURE_REPLY, EMPTY_CONTEXT_SUGGESTION,
};
use tripit_observability::{AppMetrics, FallbackKind};
use uuid::Uuid;

use crate::provider::{Completion, CompletionProvider, CompletionRequest, ModelAccess};

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub max_attempts: u32,
    pub structured_temperature: f32,
    pub creative_temperature: f32,
    /// Upper bound on a single model call. An attempt that hits it counts as failed.
    pub attempt_timeout: Duration,
    pub retry_backoff: Duration,
    pub top_n: usize,
    pub explanation_max_tokens: u32,
    pub itinerary_max_tokens: u32,
    pub chat_max_tokens: u32,
    pub suggestions_max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            structured_temperature: 0.3,
            creative_temperature: 0.7,
            attempt_timeout: Duration::from_secs(20),
            retry_backoff: Duration::from_millis(250),
            top_n: 3,
            explanation_max_tokens: 150,
            itinerary_max_tokens: 1500,
            chat_max_tokens: 200,
            suggestions_max_tokens: 250,
        }
    }
}

/// Drives model calls and decides when to fall back to deterministic output.
pub struct GenerationOrchestrator<P> {
    access: ModelAccess<P>,
    config: GenerationConfig,
    metrics: Arc<AppMetrics>,
}

impl<P> Clone for GenerationOrchestrator<P> {
    fn clone(&self) -> Self {
        Self {
            access: self.access.clone(),
            config: self.config.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<P> GenerationOrchestrator<P>
where
    P: CompletionProvider,
{
    pub fn new(access: ModelAccess<P>, config: GenerationConfig, metrics: Arc<AppMetrics>) -> Self {
        if !access.is_available() {
            warn!("no model provider configured, all generation uses deterministic fallbacks");
        }
        Self {
            access,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn model_available(&self) -> bool {
        self.access.is_available()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.access.provider().map(|provider| provider.model_name())
    }

    /// One explanation per candidate, in candidate order. Failed calls are
    /// replaced by the templated sentence for that candidate.
    pub async fn explain_all(&self, candidates: &[ScoredDestination]) -> Vec<String> {
        let Some(provider) = self.access.provider() else {
            return candidates
                .iter()
                .map(|candidate| {
                    fallback_explanation(&candidate.destination.name, &candidate.preferences)
                })
                .collect();
        };

        join_all(
            candidates
                .iter()
                .map(|candidate| self.explain_one(provider, candidate)),
        )
        .await
    }

    async fn explain_one(&self, provider: &P, candidate: &ScoredDestination) -> String {
        let name = &candidate.destination.name;
        let request = CompletionRequest {
            system: EXPLANATION_SYSTEM.to_string(),
            user: explanation_prompt(name, &candidate.preferences),
            max_tokens: self.config.explanation_max_tokens,
            temperature: self.config.creative_temperature,
        };

        match self.call(provider, "explanation", &request).await {
            Ok(completion) if !completion.text.trim().is_empty() => {
                completion.text.trim().to_string()
            }
            outcome => {
                if let Err(fault) = outcome {
                    warn!(destination = %name, error = %fault, "explanation fell back to template");
                }
                self.metrics.inc_fallback(FallbackKind::Explanation);
                fallback_explanation(name, &candidate.preferences)
            }
        }
    }

    /// Bounded, strictly sequential retry loop. Never fails: once the attempt
    /// budget is spent the synthesized itinerary is returned.
    pub async fn generate_itinerary(&self, request: &ItineraryRequest) -> Itinerary {
        let Some(provider) = self.access.provider() else {
            info!(
                destination = %request.destination,
                "no model provider, using fallback itinerary"
            );
            self.metrics.inc_fallback(FallbackKind::Itinerary);
            return synthesize_itinerary(request);
        };

        let max_attempts = self.config.max_attempts.max(1);
        let completion_request = CompletionRequest {
            system: ITINERARY_SYSTEM.to_string(),
            user: itinerary_prompt(request),
            max_tokens: self.config.itinerary_max_tokens,
            temperature: self.config.structured_temperature,
        };

        let mut last_fault = None;
        for attempt in 1..=max_attempts {
            match self.attempt_itinerary(provider, &completion_request, request).await {
                // Fewer day plans than requested days is accepted.
                Ok(itinerary) => {
                    info!(
                        itinerary_id = %itinerary.id,
                        destination = %request.destination,
                        attempt,
                        day_plans = itinerary.day_plans.len(),
                        "itinerary generated by model"
                    );
                    return itinerary;
                }
                Err(fault) => {
                    warn!(
                        destination = %request.destination,
                        attempt,
                        max_attempts,
                        error = %fault,
                        "itinerary attempt failed"
                    );
                    last_fault = Some(fault);
                }
            }

            if attempt < max_attempts {
                self.metrics.inc_itinerary_retry();
                let delay = self.config.retry_backoff * attempt;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let last_error = last_fault.map(|fault| fault.to_string()).unwrap_or_default();
        warn!(
            destination = %request.destination,
            attempts = max_attempts,
            last_error = %last_error,
            "itinerary retries exhausted, using fallback"
        );
        self.metrics.inc_fallback(FallbackKind::Itinerary);
        synthesize_itinerary(request)
    }

    async fn attempt_itinerary(
        &self,
        provider: &P,
        completion_request: &CompletionRequest,
        request: &ItineraryRequest,
    ) -> Result<Itinerary, GenerationFault> {
        let completion = self.call(provider, "itinerary", completion_request).await?;
        let sanitized = sanitize_response(&completion.text);
        debug!(chars = sanitized.len(), "sanitized itinerary response");
        let validated = parse_itinerary(&sanitized, request.days)?;
        Ok(validated.into_itinerary(Uuid::new_v4().to_string(), request))
    }

    /// Always produces some reply.
    pub async fn chat(&self, message: &str) -> String {
        let Some(provider) = self.access.provider() else {
            self.metrics.inc_fallback(FallbackKind::Chat);
            return fallback_chat_reply(message).to_string();
        };

        let request = CompletionRequest {
            system: CHAT_SYSTEM.to_string(),
            user: chat_prompt(message),
            max_tokens: self.config.chat_max_tokens,
            temperature: self.config.creative_temperature,
        };

        match self.call(provider, "chat", &request).await {
            Ok(completion) if !completion.text.trim().is_empty() => {
                completion.text.trim().to_string()
            }
            outcome => {
                if let Err(fault) = outcome {
                    warn!(error = %fault, "chat reply fell back to canned text");
                }
                self.metrics.inc_fallback(FallbackKind::Chat);
                CHAT_FAILURE_REPLY.to_string()
            }
        }
    }

    /// One to three short tips for a partially filled preference form.
    pub async fn suggestions(
        &self,
        context: &SuggestionContext,
        catalog: &[DestinationRecord],
    ) -> Vec<String> {
        let described = context.described_parts();
        if described.is_empty() {
            return vec![EMPTY_CONTEXT_SUGGESTION.to_string()];
        }

        let allowed = allowed_destinations(catalog, context);
        let Some(provider) = self.access.provider() else {
            self.metrics.inc_fallback(FallbackKind::Suggestions);
            return rule_based_suggestions(context, &allowed);
        };

        let request = CompletionRequest {
            system: SUGGESTIONS_SYSTEM.to_string(),
            user: suggestions_prompt(&described.join(", "), &prompt_destination_names(&allowed)),
            max_tokens: self.config.suggestions_max_tokens,
            temperature: self.config.creative_temperature,
        };

        let parsed = match self.call(provider, "suggestions", &request).await {
            Ok(completion) => parse_suggestions(&sanitize_response(&completion.text)),
            Err(fault) => {
                warn!(error = %fault, "suggestions call failed");
                None
            }
        };

        parsed.unwrap_or_else(|| {
            self.metrics.inc_fallback(FallbackKind::Suggestions);
            rule_based_suggestions(context, &allowed)
        })
    }

    async fn call(
        &self,
        provider: &P,
        operation: &'static str,
        request: &CompletionRequest,
    ) -> Result<Completion, GenerationFault> {
        let started = Instant::now();
        let limit = self.config.attempt_timeout;
        let outcome = match tokio::time::timeout(limit, provider.complete(request)).await {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(err)) => Err(GenerationFault::Transport(err.to_string())),
            Err(_) => Err(GenerationFault::Timeout(limit)),
        };
        let elapsed = started.elapsed();

        let tokens = outcome
            .as_ref()
            .map(|completion| completion.total_tokens)
            .unwrap_or(0);
        self.metrics
            .record_model_call(operation, tokens, elapsed, outcome.is_ok());
        info!(
            operation,
            model = provider.model_name(),
            tokens,
            duration_ms = elapsed.as_millis() as u64,
            success = outcome.is_ok(),
            "model call"
        );

        outcome
    }
}
