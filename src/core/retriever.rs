use crate::config::{RankingPolicy, MAX_LISTINGS};
use crate::core::{Listing, ListingSource};
use crate::utils::error::Result;

#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub listings: Vec<Listing>,
    pub warning: Option<String>,
}

/// Fetches listings for a query and applies the ranking policy.
pub struct ListingRetriever<S: ListingSource> {
    source: S,
    ranking: RankingPolicy,
    max_results: usize,
}

impl<S: ListingSource> ListingRetriever<S> {
    pub fn new(source: S, ranking: RankingPolicy, max_results: usize) -> Self {
        Self {
            source,
            ranking,
            max_results: max_results.clamp(1, MAX_LISTINGS),
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub async fn try_retrieve(&self, query: &str) -> Result<Vec<Listing>> {
        let listings = self.source.fetch_listings(query).await?;
        tracing::debug!(
            "{} returned {} usable listings for '{}'",
            self.source.name(),
            listings.len(),
            query
        );
        Ok(rank_listings(listings, self.ranking, self.max_results))
    }

    /// Like [`try_retrieve`](Self::try_retrieve), but a failure is logged and
    /// turned into an empty list plus a warning for the user.
    pub async fn retrieve(&self, query: &str) -> Retrieval {
        match self.try_retrieve(query).await {
            Ok(listings) => Retrieval {
                listings,
                warning: None,
            },
            Err(e) => {
                let warning = format!(
                    "Failed to fetch prices from {}: {}",
                    self.source.name(),
                    e.user_friendly_message()
                );
                tracing::warn!("{} ({})", warning, e);
                Retrieval {
                    listings: Vec::new(),
                    warning: Some(warning),
                }
            }
        }
    }

    pub async fn retrieve_listings(&self, query: &str) -> Vec<Listing> {
        self.retrieve(query).await.listings
    }
}

pub fn rank_listings(
    mut listings: Vec<Listing>,
    policy: RankingPolicy,
    max_results: usize,
) -> Vec<Listing> {
    if policy == RankingPolicy::PriceAscending {
        listings.sort_by(|a, b| a.price.total_cmp(&b.price));
    }
    listings.truncate(max_results.min(MAX_LISTINGS));
    listings
}
