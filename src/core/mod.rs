pub mod composer;
pub mod engine;
pub mod price;
pub mod retriever;

pub use crate::domain::model::{Listing, PriceSummary, SearchReport};
pub use crate::domain::ports::{ListingSource, ModelInfo, TextModel};
pub use crate::utils::error::Result;
