use crate::config::{HtmlSelectors, SourceKind, SourceSettings};
use crate::core::price::{parse_price_text, price_from_json};
use crate::core::{Listing, ListingSource};
use crate::utils::error::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

struct CompiledSelectors {
    item: Selector,
    title: Selector,
    price: Selector,
    link: Selector,
}

impl CompiledSelectors {
    fn compile(selectors: &HtmlSelectors) -> Result<Self> {
        let parse = |field: &str, css: &str| {
            Selector::parse(css).map_err(|e| AdvisorError::InvalidConfigValueError {
                field: format!("source.selectors.{}", field),
                value: css.to_string(),
                reason: format!("{:?}", e),
            })
        };

        Ok(Self {
            item: parse("item", &selectors.item)?,
            title: parse("title", &selectors.title)?,
            price: parse("price", &selectors.price)?,
            link: parse("link", &selectors.link)?,
        })
    }
}

/// Listing source reached over HTTP; the wire format depends on [`SourceKind`].
pub struct HttpListingSource {
    client: Client,
    settings: SourceSettings,
    selectors: CompiledSelectors,
    name: String,
}

impl HttpListingSource {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        let selectors = CompiledSelectors::compile(&settings.selectors)?;

        let host = Url::parse(&settings.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| settings.endpoint.clone());
        let name = format!("{} ({})", host, settings.kind.as_str());

        Ok(Self {
            client,
            settings,
            selectors,
            name,
        })
    }

    /// Listing pages put the query in the path as a hyphenated slug.
    fn page_url(&self, query: &str) -> Result<Url> {
        let mut url =
            Url::parse(&self.settings.endpoint).map_err(|e| AdvisorError::InvalidConfigValueError {
                field: "source.endpoint".to_string(),
                value: self.settings.endpoint.clone(),
                reason: e.to_string(),
            })?;
        let slug = query.split_whitespace().collect::<Vec<_>>().join("-");

        url.path_segments_mut()
            .map_err(|_| AdvisorError::InvalidConfigValueError {
                field: "source.endpoint".to_string(),
                value: self.settings.endpoint.clone(),
                reason: "URL cannot have path segments".to_string(),
            })?
            .pop_if_empty()
            .push(&slug);
        Ok(url)
    }

    async fn get(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        tracing::debug!("{} response status: {}", self.name, response.status());

        if !response.status().is_success() {
            return Err(AdvisorError::UpstreamStatusError {
                status: response.status().as_u16(),
                url: self.settings.endpoint.clone(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_listings(&self, query: &str) -> Result<Vec<Listing>> {
        match self.settings.kind {
            SourceKind::Html => {
                let url = self.page_url(query)?;
                tracing::debug!("Fetching listing page {}", url);
                let body = self.get(self.client.get(url)).await?.text().await?;
                Ok(parse_html_listings(&body, &self.selectors))
            }
            SourceKind::Json => {
                let request = self
                    .client
                    .get(&self.settings.endpoint)
                    .query(&[("q", query)]);
                let body: Value = self.get(request).await?.json().await?;
                parse_json_listings(&body, "results")
            }
            SourceKind::Shopping => {
                let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
                    AdvisorError::MissingConfigError {
                        field: "SERPAPI_API_KEY".to_string(),
                    }
                })?;
                let request = self.client.get(&self.settings.endpoint).query(&[
                    ("engine", "google_shopping"),
                    ("q", query),
                    ("api_key", api_key),
                ]);
                let body: Value = self.get(request).await?.json().await?;
                parse_json_listings(&body, "shopping_results")
            }
        }
    }
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_html_listings(html: &str, selectors: &CompiledSelectors) -> Vec<Listing> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.item)
        .filter_map(|item| {
            let name = item.select(&selectors.title).next().map(element_text)?;
            let price = item
                .select(&selectors.price)
                .next()
                .map(element_text)
                .and_then(|text| parse_price_text(&text))?;
            let url = item
                .select(&selectors.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);
            Listing::new(name, price, url)
        })
        .collect()
}

/// Reads `body[array_key]` as a list of `{title, price}` objects.
///
/// `extracted_price` wins over `price` when both exist; the link comes from
/// `permalink`, `link` or `product_link`.
pub fn parse_json_listings(body: &Value, array_key: &str) -> Result<Vec<Listing>> {
    let items = match body.get(array_key) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None if body.is_object() => return Ok(Vec::new()),
        _ => {
            return Err(AdvisorError::ResponseShapeError {
                message: format!("expected an object with a '{}' array", array_key),
            })
        }
    };

    let listings = items
        .iter()
        .filter_map(|item| {
            let name = item.get("title").and_then(Value::as_str)?;
            let price = item
                .get("extracted_price")
                .and_then(price_from_json)
                .or_else(|| item.get("price").and_then(price_from_json))?;
            let url = ["permalink", "link", "product_link"]
                .iter()
                .find_map(|key| item.get(*key).and_then(Value::as_str))
                .map(str::to_string);
            Listing::new(name, price, url)
        })
        .collect();

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"
<html><body><ol>
  <li class="ui-search-layout__item">
    <a href="https://example.com/p/1"><h2 class="ui-search-item__title">Mouse  Logitech
      M170</h2></a>
    <span class="andes-money-amount__fraction">12.999</span>
  </li>
  <li class="ui-search-layout__item">
    <h2 class="ui-search-item__title">Mouse sin precio</h2>
  </li>
  <li class="ui-search-layout__item">
    <h2 class="ui-search-item__title">Mouse consultar</h2>
    <span class="andes-money-amount__fraction">abc</span>
  </li>
  <li class="ui-search-layout__item">
    <span class="andes-money-amount__fraction">5.000</span>
  </li>
  <li class="ui-search-layout__item">
    <h2 class="ui-search-item__title">Mouse Gamer</h2>
    <span class="andes-money-amount__fraction">8.500</span>
  </li>
</ol></body></html>"#;

    #[test]
    fn test_parse_html_drops_incomplete_items() {
        let selectors = CompiledSelectors::compile(&HtmlSelectors::default()).unwrap();
        let listings = parse_html_listings(PAGE, &selectors);

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "Mouse Logitech M170");
        assert_eq!(listings[0].price, 12999.0);
        assert_eq!(listings[0].url.as_deref(), Some("https://example.com/p/1"));
        assert_eq!(listings[1].name, "Mouse Gamer");
        assert_eq!(listings[1].price, 8500.0);
        assert_eq!(listings[1].url, None);
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let selectors = HtmlSelectors {
            item: "li[".to_string(),
            ..HtmlSelectors::default()
        };
        assert!(matches!(
            CompiledSelectors::compile(&selectors),
            Err(AdvisorError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_parse_marketplace_json() {
        let body = json!({
            "results": [
                {"title": "Laptop A", "price": 1000, "permalink": "https://example.com/a"},
                {"title": "Laptop B", "price": "N/A"},
                {"title": "", "price": 10},
                {"price": 20},
                {"title": "Laptop C", "price": 899.5}
            ]
        });

        let listings = parse_json_listings(&body, "results").unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].url.as_deref(), Some("https://example.com/a"));
        assert_eq!(listings[1].price, 899.5);
    }

    #[test]
    fn test_parse_shopping_prefers_extracted_price() {
        let body = json!({
            "shopping_results": [
                {"title": "Mouse", "price": "$1,299.99", "extracted_price": 1299.99, "product_link": "https://shop/1"},
                {"title": "Keyboard", "price": "$45"},
                {"title": "Cable", "price": "Free shipping"}
            ]
        });

        let listings = parse_json_listings(&body, "shopping_results").unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].price, 1299.99);
        assert_eq!(listings[0].url.as_deref(), Some("https://shop/1"));
        assert_eq!(listings[1].price, 45.0);
    }

    #[test]
    fn test_missing_array_in_object_is_empty() {
        let body = json!({"search_metadata": {"status": "Success"}});
        assert!(parse_json_listings(&body, "shopping_results").unwrap().is_empty());
    }

    #[test]
    fn test_non_object_body_is_shape_error() {
        let body = json!([{"title": "x", "price": 1}]);
        assert!(matches!(
            parse_json_listings(&body, "results"),
            Err(AdvisorError::ResponseShapeError { .. })
        ));
    }

    #[test]
    fn test_page_url_uses_hyphenated_slug() {
        let mut settings = SourceSettings::new(SourceKind::Html);
        settings.endpoint = "https://listado.example.com/".to_string();
        let source = HttpListingSource::new(settings).unwrap();

        assert_eq!(
            source.page_url("wireless  mouse").unwrap().as_str(),
            "https://listado.example.com/wireless-mouse"
        );
        assert_eq!(source.name(), "listado.example.com (html)");
    }
}
