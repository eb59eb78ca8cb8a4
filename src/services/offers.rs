//! Quick search: offers for a single named part.

use serde_json::json;
use tracing::debug;

use super::{Assistant, AssistantError};
use crate::error::TaskError;
use crate::history::{HistorySource, NewHistoryEntry};
use crate::normalize::{self, Category, QuickSearchOffers};
use crate::tracker::{SearchDescriptor, TaskKind};

#[must_use]
pub fn quick_search_descriptor(category: Category, name: &str) -> SearchDescriptor {
    SearchDescriptor::new(TaskKind::QuickSearch, name.trim()).subtitle(category.label())
}

impl Assistant {
    /// Ask the quick-search automation for offers on one part and keep the
    /// first category that carries both rankings.
    ///
    /// # Errors
    ///
    /// Returns webhook or shape errors; both are recorded in history.
    pub async fn quick_search_offers(&self, category: Category, name: &str) -> Result<QuickSearchOffers, AssistantError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AssistantError::EmptyInput("part name"));
        }

        let entry = NewHistoryEntry::new(HistorySource::QuickSearch, name)
            .subtitle(category.label())
            .request(&json!({ "hardwareType": category.label(), "hardwareName": name }));

        let outcome = match self.webhooks.quick_search(category, name).await {
            Ok(raw) => normalize::extract_quick_search_offers(&raw)
                .map(|offers| (raw, offers))
                .map_err(AssistantError::from),
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok((raw, offers)) => {
                debug!(
                    %category,
                    best_price = offers.best_price.len(),
                    best_score = offers.best_score.len(),
                    "quick search offers found"
                );
                self.history.add(entry.response(&raw));
                Ok(offers)
            }
            Err(e) => {
                self.history.add(entry.failed(&TaskError::from_code(&e)));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "offers_test.rs"]
mod tests;
