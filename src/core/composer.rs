use crate::core::{Listing, TextModel};
use crate::domain::model::{format_price, PriceSummary};
use crate::utils::error::{AdvisorError, Result};
use std::fmt::Write as _;

/// Generation method a model must advertise to be used as a fallback.
pub const GENERATE_METHOD: &str = "generateContent";

/// Builds the analysis prompt. Pure: the same inputs give the same text.
pub fn compose_prompt(query: &str, listings: &[Listing]) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are a shopping assistant. A buyer is looking for \"{}\".",
        query.trim()
    );
    let _ = writeln!(prompt, "These are the current marketplace listings and prices:");
    for listing in listings {
        let _ = writeln!(prompt, "- {}: {}", listing.name, format_price(listing.price));
    }

    if let Some(summary) = PriceSummary::from_listings(listings) {
        let _ = writeln!(
            prompt,
            "Price distribution: {} listings, lowest {}, highest {}, average {}, median {}.",
            summary.count,
            format_price(summary.min),
            format_price(summary.max),
            format_price(summary.mean),
            format_price(summary.median)
        );
    }

    prompt.push_str(
        "\nBased on these prices, answer using exactly this format:\n\
         Optimal price range: <the range a buyer should expect to pay>\n\
         Price analysis: <how prices are distributed and which listings stand out>\n\
         Recommendations: <concrete advice for the buyer>\n",
    );
    prompt
}

/// Message shown in place of the recommendation when the model cannot answer.
pub fn fallback_message(err: &AdvisorError) -> String {
    format!(
        "Could not generate a price recommendation: {}. {}.",
        err.user_friendly_message(),
        err.recovery_suggestion()
    )
}

fn bare_model_name(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

pub struct RecommendationComposer<M: TextModel> {
    model: M,
    preferred_model: String,
}

impl<M: TextModel> RecommendationComposer<M> {
    pub fn new(model: M, preferred_model: impl Into<String>) -> Self {
        Self {
            model,
            preferred_model: preferred_model.into(),
        }
    }

    /// Always returns displayable text: the model answer or a fallback message.
    pub async fn request_recommendation(&self, prompt: &str) -> String {
        match self.try_recommendation(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    "Recommendation failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                fallback_message(&e)
            }
        }
    }

    pub async fn try_recommendation(&self, prompt: &str) -> Result<String> {
        let text = match self.model.generate(&self.preferred_model, prompt).await {
            Err(AdvisorError::ModelUnavailableError { model }) => {
                tracing::warn!("Model '{}' unavailable, looking for a fallback", model);
                let fallback = self.select_fallback_model().await?;
                tracing::info!("Using fallback model '{}'", fallback);
                self.model.generate(&fallback, prompt).await?
            }
            other => other?,
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(AdvisorError::ModelError {
                message: "the model returned an empty answer".to_string(),
            });
        }
        Ok(text.to_string())
    }

    /// First listed model that supports text generation, other than the preferred one.
    /// The catalog changes over time, so the choice is best-effort.
    async fn select_fallback_model(&self) -> Result<String> {
        let preferred = bare_model_name(&self.preferred_model);
        let models = self.model.list_models().await?;

        models
            .into_iter()
            .find(|m| m.supports(GENERATE_METHOD) && bare_model_name(&m.name) != preferred)
            .map(|m| m.name)
            .ok_or_else(|| AdvisorError::ModelError {
                message: "no compatible text-generation model found".to_string(),
            })
    }
}
