//! Configuration flows: advanced (manual), intermediate (primary part) and
//! beginner (game + quality).
//!
//! The two AI-assisted flows fetch a suggestion first and then price it.
//! Pricing is best-effort: when it fails the suggestion is still returned,
//! without price data.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{Assistant, AssistantError, KnowledgeLevel};
use crate::error::TaskError;
use crate::history::{HistorySource, NewHistoryEntry};
use crate::normalize::{self, NormalizedOffers, SuggestedComponent, Suggestion};
use crate::tracker::{SearchDescriptor, TaskKind};
use crate::webhook::{GameRequest, PcConfigRequest, PriceTier};

/// History title of manual selections.
pub const ADVANCED_TITLE: &str = "Advanced configuration - individual selection";

// =============================================================================
// RESULT
// =============================================================================

/// Suggested parts plus whatever the pricing step produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedBuild {
    pub components: Vec<SuggestedComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Raw price-search answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_data: Option<Value>,
    /// Price answer in canonical form, when it had an offer shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<NormalizedOffers>,
    /// Why pricing produced nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_error: Option<TaskError>,
}

impl SuggestedBuild {
    fn unpriced(suggestion: Suggestion) -> Self {
        Self {
            components: suggestion.components,
            explanation: suggestion.explanation,
            price_data: None,
            offers: None,
            price_error: None,
        }
    }
}

// =============================================================================
// DESCRIPTORS
// =============================================================================

#[must_use]
pub fn advanced_descriptor(request: &PcConfigRequest) -> SearchDescriptor {
    SearchDescriptor::new(TaskKind::AdvancedConfig, ADVANCED_TITLE).subtitle(request.subtitle())
}

#[must_use]
pub fn intermediate_descriptor(primary_component: &str) -> SearchDescriptor {
    SearchDescriptor::new(TaskKind::ComponentSuggestion, primary_component.trim())
        .subtitle(KnowledgeLevel::Intermediate.as_str())
}

#[must_use]
pub fn game_descriptor(request: &GameRequest) -> SearchDescriptor {
    SearchDescriptor::new(TaskKind::GameSuggestion, request.game.trim()).subtitle(request.quality.label())
}

// =============================================================================
// FLOWS
// =============================================================================

impl Assistant {
    /// Submit a manual selection and normalize the priced result.
    ///
    /// # Errors
    ///
    /// Returns webhook or shape errors. Both are recorded in history.
    pub async fn advanced_config(&self, request: PcConfigRequest) -> Result<NormalizedOffers, AssistantError> {
        let entry = NewHistoryEntry::new(HistorySource::PcBuilder, ADVANCED_TITLE)
            .subtitle(request.subtitle())
            .request(&request);

        let raw = match self.webhooks.submit_pc_config(&request).await {
            Ok(raw) => raw,
            Err(e) => return Err(self.record_failure(entry, e.into())),
        };

        match normalize::normalize_offers(&raw, request.consider_reviews) {
            Ok(offers) => {
                debug!(categories = offers.data.len(), "advanced configuration normalized");
                self.history.add(entry.response(&raw));
                Ok(offers)
            }
            Err(e) => Err(self.record_failure(entry, e.into())),
        }
    }

    /// Suggest parts around one primary component, then price them.
    ///
    /// # Errors
    ///
    /// Returns suggestion failures; pricing failures are kept in the result.
    pub async fn intermediate_build(&self, primary_component: &str) -> Result<SuggestedBuild, AssistantError> {
        let primary = primary_component.trim();
        if primary.is_empty() {
            return Err(AssistantError::EmptyInput("primary component"));
        }

        let entry = NewHistoryEntry::new(HistorySource::GameAi, primary)
            .subtitle(KnowledgeLevel::Intermediate.as_str())
            .request(&json!({ "level": KnowledgeLevel::Intermediate, "primaryComponent": primary }));

        let suggestion = self
            .webhooks
            .suggest_components(primary)
            .await
            .map_err(AssistantError::from)
            .and_then(|raw| normalize::parse_suggestion(&raw).map_err(AssistantError::from));

        self.finish_suggested(entry, suggestion, PriceTier::Intermediate)
            .await
    }

    /// Suggest a build for a game at a target quality, then price it with the
    /// beginner price search.
    ///
    /// # Errors
    ///
    /// Returns suggestion failures; pricing failures are kept in the result.
    pub async fn game_config(&self, request: GameRequest) -> Result<SuggestedBuild, AssistantError> {
        let request = GameRequest { game: request.game.trim().to_string(), quality: request.quality };
        if request.game.is_empty() {
            return Err(AssistantError::EmptyInput("game"));
        }

        let entry = NewHistoryEntry::new(HistorySource::GameAi, request.game.as_str())
            .subtitle(request.quality.label())
            .request(&json!({ "level": KnowledgeLevel::Beginner, "game": request.game, "quality": request.quality }));

        let suggestion = self
            .webhooks
            .suggest_for_game(&request)
            .await
            .map_err(AssistantError::from)
            .and_then(|raw| normalize::parse_suggestion(&raw).map_err(AssistantError::from));

        self.finish_suggested(entry, suggestion, PriceTier::Beginner)
            .await
    }

    async fn finish_suggested(
        &self,
        entry: NewHistoryEntry,
        suggestion: Result<Suggestion, AssistantError>,
        tier: PriceTier,
    ) -> Result<SuggestedBuild, AssistantError> {
        let suggestion = match suggestion {
            Ok(s) => s,
            Err(e) => return Err(self.record_failure(entry, e)),
        };

        let build = self.price_suggestion(suggestion, tier).await;
        self.history.add(entry.response(&build));
        Ok(build)
    }

    fn record_failure(&self, entry: NewHistoryEntry, err: AssistantError) -> AssistantError {
        self.history.add(entry.failed(&TaskError::from_code(&err)));
        err
    }

    async fn price_suggestion(&self, suggestion: Suggestion, tier: PriceTier) -> SuggestedBuild {
        let mut build = SuggestedBuild::unpriced(suggestion);
        if build.components.is_empty() {
            debug!(?tier, "suggestion has no components; pricing skipped");
            return build;
        }

        match self.webhooks.price_search(tier, &build.components).await {
            Ok(raw) => {
                match normalize::normalize_offers(&raw, false) {
                    Ok(offers) => build.offers = Some(offers),
                    Err(e) => debug!(error = %e, "price answer kept raw"),
                }
                build.price_data = Some(raw);
            }
            Err(e) => {
                warn!(?tier, error = %e, "price search failed; keeping suggestion");
                build.price_error = Some(TaskError::from_code(&e));
            }
        }
        build
    }
}

#[cfg(test)]
#[path = "build_test.rs"]
mod tests;
