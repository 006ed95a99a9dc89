pub mod orchestrator;
pub mod provider;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, instrument};
use tripit_catalog::{CatalogStats, DestinationCatalog};
use tripit_core::{
    score_destinations, DestinationRecord, Itinerary, ItineraryRequest, PlanningError,
    Recommendation, RecommendationResponse, SuggestionContext, UserPreferences,
    MAX_CHAT_MESSAGE_CHARS,
};
use tripit_observability::AppMetrics;
use tripit_storage::{ItineraryRepository, SaveOutcome};

pub use orchestrator::{GenerationConfig, GenerationOrchestrator};
pub use provider::{
    Completion, CompletionProvider, CompletionRequest, ModelAccess, OpenAiCompatClient,
    ProviderConfig, TransportError,
};

/// The four planning operations plus itinerary persistence, wired to a
/// catalog, a store and a completion provider.
pub struct TripPlanner<S, P> {
    catalog: DestinationCatalog,
    store: Arc<S>,
    orchestrator: GenerationOrchestrator<P>,
    metrics: Arc<AppMetrics>,
}

impl<S, P> Clone for TripPlanner<S, P> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            store: Arc::clone(&self.store),
            orchestrator: self.orchestrator.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S, P> TripPlanner<S, P>
where
    S: ItineraryRepository,
    P: CompletionProvider,
{
    pub fn new(
        catalog: DestinationCatalog,
        store: Arc<S>,
        access: ModelAccess<P>,
        config: GenerationConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            catalog,
            store,
            orchestrator: GenerationOrchestrator::new(access, config, Arc::clone(&metrics)),
            metrics,
        }
    }

    pub fn model_available(&self) -> bool {
        self.orchestrator.model_available()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.orchestrator.model_name()
    }

    pub fn catalog_stats(&self) -> CatalogStats {
        self.catalog.stats()
    }

    /// Scores the catalog and explains the top candidates.
    #[instrument(
        skip(self, preferences),
        fields(travel_type = %preferences.travel_type, interest = %preferences.interest)
    )]
    pub async fn recommend(
        &self,
        preferences: UserPreferences,
    ) -> Result<RecommendationResponse, PlanningError> {
        let started = Instant::now();
        self.metrics.inc_request();
        preferences.validate()?;

        let catalog = self.catalog.get_all();
        if catalog.is_empty() {
            return Err(PlanningError::CatalogUnavailable);
        }

        let mut ranked = score_destinations(&catalog, &preferences);
        ranked.truncate(self.orchestrator.config().top_n.max(1));
        let reasons = self.orchestrator.explain_all(&ranked).await;

        let destinations = ranked
            .iter()
            .zip(reasons)
            .map(|(scored, reason)| Recommendation::from_scored(scored, reason))
            .collect::<Vec<_>>();

        self.metrics.observe_latency(started.elapsed());
        info!(
            returned = destinations.len(),
            top = destinations.first().map(|d| d.id.as_str()).unwrap_or(""),
            "recommendations ranked"
        );

        Ok(RecommendationResponse {
            destinations,
            query: preferences,
        })
    }

    #[instrument(
        skip(self, request),
        fields(destination = %request.destination, days = request.days)
    )]
    pub async fn generate_itinerary(
        &self,
        request: ItineraryRequest,
    ) -> Result<Itinerary, PlanningError> {
        let started = Instant::now();
        self.metrics.inc_request();
        request.validate()?;

        let itinerary = self.orchestrator.generate_itinerary(&request).await;
        self.metrics.observe_latency(started.elapsed());
        Ok(itinerary)
    }

    pub async fn chat(&self, message: &str) -> Result<String, PlanningError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let length = message.trim().chars().count();
        if length == 0 || message.chars().count() > MAX_CHAT_MESSAGE_CHARS {
            return Err(PlanningError::InvalidPreferences(format!(
                "message must be 1..={} characters",
                MAX_CHAT_MESSAGE_CHARS
            )));
        }

        let reply = self.orchestrator.chat(message).await;
        self.metrics.observe_latency(started.elapsed());
        Ok(reply)
    }

    pub async fn suggestions(
        &self,
        context: SuggestionContext,
    ) -> Result<Vec<String>, PlanningError> {
        let started = Instant::now();
        self.metrics.inc_request();
        context.validate()?;

        let catalog = self.catalog.get_all();
        let tips = self.orchestrator.suggestions(&context, &catalog).await;
        self.metrics.observe_latency(started.elapsed());
        Ok(tips)
    }

    pub fn destinations(&self) -> Arc<Vec<DestinationRecord>> {
        self.catalog.get_all()
    }

    pub fn destination(&self, id: &str) -> Option<DestinationRecord> {
        self.catalog.get_by_id(id)
    }

    pub fn reload_catalog(&self) -> Result<usize> {
        self.catalog.reload()
    }

    pub async fn save_itinerary(
        &self,
        itinerary: &Itinerary,
        owner_id: &str,
    ) -> Result<SaveOutcome> {
        let outcome = self.store.save(itinerary, owner_id).await?;
        info!(itinerary_id = %itinerary.id, outcome = ?outcome, "itinerary saved");
        Ok(outcome)
    }

    pub async fn get_itinerary(&self, id: &str) -> Result<Option<Itinerary>> {
        self.store.get(id).await
    }

    pub async fn list_itineraries(&self, owner_id: &str) -> Result<Vec<Itinerary>> {
        self.store.list_for(owner_id).await
    }

    pub async fn delete_itinerary(&self, id: &str, owner_id: &str) -> Result<bool> {
        let deleted = self.store.delete(id, owner_id).await?;
        if deleted {
            info!(itinerary_id = %id, "itinerary deleted");
        }
        Ok(deleted)
    }
}
