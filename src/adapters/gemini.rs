use crate::config::ModelSettings;
use crate::core::{ModelInfo, TextModel};
use crate::utils::error::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

const API_VERSION: &str = "v1beta";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// Pulls `error.message` out of a Gemini error body, or returns the body as-is.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Client for the Gemini `generativelanguage` REST API.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AdvisorError::MissingConfigError {
                field: "GEMINI_API_KEY".to_string(),
            })
    }

    async fn failure(response: reqwest::Response) -> AdvisorError {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Could not read error body for status {}: {}", status, e);
                String::new()
            }
        };
        AdvisorError::ModelError {
            message: format!("status {}: {}", status.as_u16(), error_detail(&body)),
        }
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let api_key = self.api_key()?;
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        let url = format!("{}/{}/{}:generateContent", self.endpoint, API_VERSION, model_path);
        tracing::debug!("Requesting generation from {}", model_path);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(AdvisorError::ModelUnavailableError {
                model: model.to_string(),
            }),
            status if status.is_success() => {
                let parsed: GenerateContentResponse = response.json().await?;
                parsed.into_text().ok_or_else(|| AdvisorError::ModelError {
                    message: "response contained no text".to_string(),
                })
            }
            _ => Err(Self::failure(response).await),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let api_key = self.api_key()?;
        let url = format!("{}/{}/models", self.endpoint, API_VERSION);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let parsed: ListModelsResponse = response.json().await?;
        tracing::debug!("Model catalog lists {} models", parsed.models.len());

        Ok(parsed
            .models
            .into_iter()
            .map(|m| ModelInfo {
                name: m.name,
                supported_methods: m.supported_generation_methods,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer, api_key: Option<&str>) -> GeminiClient {
        let settings = ModelSettings {
            endpoint: server.base_url(),
            api_key: api_key.map(str::to_string),
            ..ModelSettings::default()
        };
        GeminiClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_joined_parts() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-1.5-flash:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("laptop");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "Optimal price range: "}, {"text": "900-1100"}]}
                }]
            }));
        });

        let client = client_for(&server, Some("test-key"));
        let text = client
            .generate("gemini-1.5-flash", "prices for laptop")
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(text, "Optimal price range: 900-1100");
    }

    #[tokio::test]
    async fn test_not_found_means_model_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/retired-model:generateContent");
            then.status(404).json_body(serde_json::json!({
                "error": {"code": 404, "message": "models/retired-model is not found", "status": "NOT_FOUND"}
            }));
        });

        let client = client_for(&server, Some("k"));
        let result = client.generate("models/retired-model", "p").await;

        assert!(matches!(
            result,
            Err(AdvisorError::ModelUnavailableError { model }) if model == "models/retired-model"
        ));
    }

    #[tokio::test]
    async fn test_quota_error_carries_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/m:generateContent");
            then.status(429).json_body(serde_json::json!({
                "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
            }));
        });

        let client = client_for(&server, Some("k"));
        match client.generate("m", "p").await {
            Err(AdvisorError::ModelError { message }) => {
                assert_eq!(message, "status 429: Resource has been exhausted")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });

        let client = client_for(&server, None);
        assert!(matches!(
            client.generate("m", "p").await,
            Err(AdvisorError::MissingConfigError { .. })
        ));
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1beta/models");
            then.status(200).json_body(serde_json::json!({
                "models": [
                    {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]},
                    {"name": "models/gemini-pro", "supportedGenerationMethods": ["generateContent"]}
                ]
            }));
        });

        let client = client_for(&server, Some("k"));
        let models = client.list_models().await.unwrap();

        assert_eq!(models.len(), 2);
        assert!(!models[0].supports("generateContent"));
        assert!(models[1].supports("generateContent"));
    }

    #[test]
    fn test_error_detail_falls_back_to_body() {
        assert_eq!(error_detail("  plain failure "), "plain failure");
        assert_eq!(error_detail(r#"{"error":{"message":"bad key"}}"#), "bad key");
    }
}
