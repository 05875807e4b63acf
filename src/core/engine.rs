use crate::core::composer::{compose_prompt, RecommendationComposer};
use crate::core::retriever::ListingRetriever;
use crate::core::{ListingSource, TextModel};
use crate::domain::model::{PriceSummary, SearchReport};

pub const EMPTY_QUERY_WARNING: &str = "Please enter a product to search.";
pub const NO_RESULTS_WARNING: &str = "No prices were found for this product.";

/// Runs one search: retrieve, rank, prompt, recommend.
pub struct PriceEngine<S: ListingSource, M: TextModel> {
    retriever: ListingRetriever<S>,
    composer: RecommendationComposer<M>,
}

impl<S: ListingSource, M: TextModel> PriceEngine<S, M> {
    pub fn new(retriever: ListingRetriever<S>, composer: RecommendationComposer<M>) -> Self {
        Self {
            retriever,
            composer,
        }
    }

    /// Never fails; problems end up in `SearchReport::warnings` or as the
    /// fallback recommendation text.
    pub async fn run(&self, query: &str) -> SearchReport {
        let mut report = SearchReport::new(query, self.retriever.source_name());

        if report.query.is_empty() {
            report.warnings.push(EMPTY_QUERY_WARNING.to_string());
            return report;
        }

        tracing::info!("Searching prices for '{}'...", report.query);
        let retrieval = self.retriever.retrieve(&report.query).await;
        report.listings = retrieval.listings;
        if let Some(warning) = retrieval.warning {
            report.warnings.push(warning);
            return report;
        }

        if report.listings.is_empty() {
            report.warnings.push(NO_RESULTS_WARNING.to_string());
            return report;
        }
        tracing::info!("Found {} listings", report.listings.len());

        report.summary = PriceSummary::from_listings(&report.listings);

        tracing::info!("Analyzing prices...");
        let prompt = compose_prompt(&report.query, &report.listings);
        tracing::debug!("Prompt is {} bytes", prompt.len());
        report.recommendation = Some(self.composer.request_recommendation(&prompt).await);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingPolicy;
    use crate::core::Listing;
    use crate::domain::ports::ModelInfo;
    use crate::utils::error::{AdvisorError, Result};
    use async_trait::async_trait;

    struct VecSource(Vec<Listing>);

    #[async_trait]
    impl ListingSource for VecSource {
        fn name(&self) -> &str {
            "vec"
        }

        async fn fetch_listings(&self, _query: &str) -> Result<Vec<Listing>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl ListingSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch_listings(&self, _query: &str) -> Result<Vec<Listing>> {
            Err(AdvisorError::ResponseShapeError {
                message: "missing 'results' array".to_string(),
            })
        }
    }

    struct EchoModel;

    #[async_trait]
    impl TextModel for EchoModel {
        async fn generate(&self, _model: &str, prompt: &str) -> Result<String> {
            Ok(format!("analysis of {} bytes", prompt.len()))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    fn engine<S: ListingSource>(source: S) -> PriceEngine<S, EchoModel> {
        PriceEngine::new(
            ListingRetriever::new(source, RankingPolicy::PriceAscending, 10),
            RecommendationComposer::new(EchoModel, "m"),
        )
    }

    #[tokio::test]
    async fn test_blank_query_only_warns() {
        let report = engine(VecSource(vec![])).run("   ").await;
        assert_eq!(report.warnings, vec![EMPTY_QUERY_WARNING.to_string()]);
        assert!(report.recommendation.is_none());
    }

    #[tokio::test]
    async fn test_no_listings_skips_recommendation() {
        let report = engine(VecSource(vec![])).run("mouse").await;
        assert_eq!(report.warnings, vec![NO_RESULTS_WARNING.to_string()]);
        assert!(report.recommendation.is_none());
        assert!(report.summary.is_none());
    }

    #[tokio::test]
    async fn test_source_failure_becomes_warning() {
        let report = engine(BrokenSource).run("mouse").await;
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Failed to fetch prices from broken"));
        assert!(report.listings.is_empty());
    }

    #[tokio::test]
    async fn test_full_run_fills_report() {
        let listings = vec![
            Listing::new("B", 300.0, None).unwrap(),
            Listing::new("A", 100.0, None).unwrap(),
        ];
        let report = engine(VecSource(listings)).run(" mouse ").await;

        assert_eq!(report.query, "mouse");
        assert_eq!(report.listings[0].name, "A");
        assert_eq!(report.summary.as_ref().unwrap().max, 300.0);
        assert!(report.recommendation.unwrap().starts_with("analysis of"));
        assert!(report.warnings.is_empty());
    }
}
