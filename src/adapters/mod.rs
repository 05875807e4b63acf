// Adapters layer: concrete implementations for external systems.

pub mod export;
pub mod gemini;
pub mod marketplace;
