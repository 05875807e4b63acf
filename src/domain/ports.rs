use crate::domain::model::Listing;
use crate::utils::error::Result;
use async_trait::async_trait;

/// A place listings can be fetched from. Implementations parse and drop
/// malformed entries; ranking and truncation happen in the retriever.
#[async_trait]
pub trait ListingSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_listings(&self, query: &str) -> Result<Vec<Listing>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub supported_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports(&self, method: &str) -> bool {
        self.supported_methods.iter().any(|m| m == method)
    }
}

/// Hosted text-generation service.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}
