use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single product result with a display name and a non-negative price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Listing {
    /// Returns `None` when the name is blank or the price is negative or not finite.
    pub fn new(name: impl Into<String>, price: f64, url: Option<String>) -> Option<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() || !price.is_finite() || price < 0.0 {
            return None;
        }
        Some(Self { name, price, url })
    }
}

/// Formats a price without a trailing `.0` when it is integral.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0}", price)
    } else {
        format!("{:.2}", price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl PriceSummary {
    pub fn from_listings(listings: &[Listing]) -> Option<Self> {
        if listings.is_empty() {
            return None;
        }

        let mut prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
        prices.sort_by(|a, b| a.total_cmp(b));

        let count = prices.len();
        let mean = prices.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (prices[count / 2 - 1] + prices[count / 2]) / 2.0
        } else {
            prices[count / 2]
        };

        Some(Self {
            count,
            min: prices[0],
            max: prices[count - 1],
            mean,
            median,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub query: String,
    pub source: String,
    pub listings: Vec<Listing>,
    pub summary: Option<PriceSummary>,
    pub recommendation: Option<String>,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl SearchReport {
    pub fn new(query: &str, source: &str) -> Self {
        Self {
            query: query.trim().to_string(),
            source: source.to_string(),
            listings: Vec::new(),
            summary: None,
            recommendation: None,
            warnings: Vec::new(),
            generated_at: Utc::now(),
        }
    }
}
