pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{gemini::GeminiClient, marketplace::HttpListingSource};
pub use app::session::Session;
pub use config::{AppConfig, CliConfig};
pub use crate::core::{
    composer::{compose_prompt, RecommendationComposer},
    engine::PriceEngine,
    retriever::{ListingRetriever, Retrieval},
};
pub use domain::model::{Listing, PriceSummary, SearchReport};
pub use utils::error::{AdvisorError, Result};

/// Wires the HTTP listing source and the Gemini client from resolved settings.
pub fn build_session(config: &AppConfig) -> Result<Session<HttpListingSource, GeminiClient>> {
    let source = HttpListingSource::new(config.source.clone())?;
    let retriever = ListingRetriever::new(source, config.source.ranking, config.source.max_results);
    let composer = RecommendationComposer::new(GeminiClient::new(&config.model)?, &config.model.name);
    Ok(Session::new(
        PriceEngine::new(retriever, composer),
        config.output.clone(),
    ))
}
