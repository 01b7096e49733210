//! OpenAI-compatible classification collaborator
//!
//! Runs the two-phase call: a free-form analysis of the profile body first,
//! then a second request that formats that analysis as a JSON object with
//! the exact keys the orchestrator expects.

use crate::classify::Classifier;
use crate::config::AnalyzerConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Placeholder in the analysis prompt replaced with the profile body
const PROMPT_BODY_SLOT: &str = "{{body}}";

const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a startup analyst expert at classifying companies.";

const FORMATTING_SYSTEM_PROMPT: &str =
    "You are a startup analyst that provides structured JSON responses.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Classification collaborator backed by an OpenAI-compatible chat API
pub struct OpenAiClassifier {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    model: String,
    prompt_template: String,
}

impl OpenAiClassifier {
    pub fn new(api_key: impl Into<String>, config: &AnalyzerConfig) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
            model: config.model.clone(),
            prompt_template: config.classification_prompt.clone(),
        }
    }

    /// Builds a classifier from the `OPENAI_API_KEY` environment variable
    pub fn from_env(config: &AnalyzerConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable is not set"))?;
        Ok(Self::new(api_key, config))
    }

    /// Overrides the API base URL (used by tests)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "classification chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("chat API error ({}): {}", status, error_text));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("no response content from model"))
    }

    fn formatting_prompt(name: &str, analysis: &str) -> String {
        format!(
            "Here is your analysis of the company \"{}\":\n\n{}\n\n\
             Based on this analysis, provide the classification in JSON format \
             with these exact keys:\n\
             - theme: the core theme classification (or \"Non-Core\")\n\
             - tags: a list of all relevant tag names that apply to the company\n\
             - rationale: a brief rationale for the theme classification (2-4 sentences)",
            name, analysis
        )
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(&self, name: &str, body: &str) -> Result<Value> {
        // Phase one: free-form analysis, no format constraints
        let analysis = self
            .chat(&ChatRequest {
                model: self.model.clone(),
                messages: vec![
                    ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
                    ChatMessage::user(self.prompt_template.replace(PROMPT_BODY_SLOT, body)),
                ],
                response_format: None,
            })
            .await?;

        // Phase two: format the analysis as a JSON object
        let formatted = self
            .chat(&ChatRequest {
                model: self.model.clone(),
                messages: vec![
                    ChatMessage::system(FORMATTING_SYSTEM_PROMPT),
                    ChatMessage::user(Self::formatting_prompt(name, &analysis)),
                ],
                response_format: Some(ResponseFormat {
                    kind: "json_object".to_string(),
                }),
            })
            .await?;

        let value: Value = serde_json::from_str(formatted.trim())
            .map_err(|e| anyhow!("model returned malformed JSON: {}", e))?;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn analyzer_config() -> AnalyzerConfig {
        AnalyzerConfig {
            model: "o4-mini".to_string(),
            min_body_chars: 10,
            max_retries: 3,
            retry_delay_ms: 1,
            classification_prompt: "Analyze this company: {{body}}".to_string(),
        }
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn test_two_phase_classification() {
        let server = MockServer::start().await;

        // Phase one: the free-form analysis
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
                "The company builds autonomous agents for workflows.",
            )))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        // Phase two: the JSON formatting of that analysis
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
                r#"{"theme":"AI Agents","tags":["Agentic Workflow"],"rationale":"Builds agents."}"#,
            )))
            .mount(&server)
            .await;

        let classifier =
            OpenAiClassifier::new("test-key", &analyzer_config()).with_base_url(server.uri());

        let value = classifier
            .classify("Acme", "Acme builds autonomous agents.")
            .await
            .unwrap();

        assert_eq!(value["theme"], "AI Agents");
        assert_eq!(value["tags"][0], "Agentic Workflow");
    }

    #[tokio::test]
    async fn test_api_error_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let classifier =
            OpenAiClassifier::new("test-key", &analyzer_config()).with_base_url(server.uri());

        let result = classifier.classify("Acme", "body text").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_malformed_json_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("not json at all")))
            .mount(&server)
            .await;

        let classifier =
            OpenAiClassifier::new("test-key", &analyzer_config()).with_base_url(server.uri());

        let result = classifier.classify("Acme", "body text").await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("malformed JSON"));
    }
}
