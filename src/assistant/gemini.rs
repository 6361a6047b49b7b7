//! Gemini API client implementation with automatic retry for transient errors.
//!
//! Uses the `generateContent` REST endpoint with JSON response schemas so
//! structured operations (parse, decompose, rank) come back as machine-ready
//! JSON rather than prose.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::error::{classify_http_status, AssistantError, AssistantErrorKind, RetryConfig};
use super::{AdviceCandidate, AssistantGateway, ParsedTask, RankCandidate};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client with automatic retry for transient errors.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    retry_config: RetryConfig,
}

impl GeminiClient {
    /// Create a new Gemini client with default retry configuration.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            retry_config: RetryConfig::default(),
        }
    }

    /// Create a new Gemini client with custom retry configuration.
    pub fn with_retry_config(api_key: String, model: String, retry_config: RetryConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            retry_config,
        }
    }

    /// Parse Retry-After header if present.
    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok().map(Duration::from_secs))
    }

    /// Create an AssistantError from HTTP response status and body.
    fn create_error(
        status: reqwest::StatusCode,
        body: &str,
        retry_after: Option<Duration>,
    ) -> AssistantError {
        let status_code = status.as_u16();
        match classify_http_status(status_code) {
            AssistantErrorKind::RateLimited => {
                AssistantError::rate_limited(body.to_string(), retry_after)
            }
            AssistantErrorKind::ClientError => {
                AssistantError::client_error(status_code, body.to_string())
            }
            _ => AssistantError::server_error(status_code, body.to_string()),
        }
    }

    /// Execute a single generateContent request without retry, returning the
    /// text of the first candidate.
    async fn execute_request(&self, request: &Value) -> Result<String, AssistantError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );

        let response = match self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(AssistantError::network_error(format!(
                        "Request timeout: {}",
                        e
                    )));
                } else if e.is_connect() {
                    return Err(AssistantError::network_error(format!(
                        "Connection failed: {}",
                        e
                    )));
                } else {
                    return Err(AssistantError::network_error(format!(
                        "Request failed: {}",
                        e
                    )));
                }
            }
        };

        let status = response.status();
        let retry_after = Self::parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(Self::create_error(status, &body, retry_after));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            AssistantError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AssistantError::parse_error("No candidates in response".to_string()))
    }

    /// Execute a request with automatic retry for transient errors.
    async fn execute_with_retry(&self, request: &Value) -> Result<String, AssistantError> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            match self.execute_request(request).await {
                Ok(text) => {
                    if attempt > 0 {
                        tracing::info!(
                            "Assistant request succeeded after {} retries (total time: {:?})",
                            attempt,
                            start.elapsed()
                        );
                    }
                    return Ok(text);
                }
                Err(error) => {
                    let should_retry = self.retry_config.should_retry(&error)
                        && attempt < self.retry_config.max_retries
                        && start.elapsed() < self.retry_config.max_retry_duration;

                    if !should_retry {
                        return Err(error);
                    }

                    let delay = error.suggested_delay(attempt);
                    let remaining = self
                        .retry_config
                        .max_retry_duration
                        .saturating_sub(start.elapsed());
                    let actual_delay = delay.min(remaining);

                    tracing::warn!(
                        "Assistant attempt {} failed with {}, retrying in {:?}: {}",
                        attempt + 1,
                        error.kind,
                        actual_delay,
                        error.message
                    );

                    tokio::time::sleep(actual_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Build a structured-output request body with a JSON response schema.
    fn structured_request(prompt: String, schema: Value) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        })
    }
}

#[async_trait]
impl AssistantGateway for GeminiClient {
    async fn parse(&self, input: &str) -> Result<ParsedTask, AssistantError> {
        let today = Utc::now().date_naive();
        let prompt = format!(
            "Analyze the following to-do entry and extract structured fields.\n\
             \n\
             User input: \"{input}\"\n\
             \n\
             Today is {today}.\n\
             \n\
             Rules:\n\
             - If the priority is unclear, use \"medium\".\n\
             - If the category is unclear, use \"general\".\n\
             - Infer a due date if one is mentioned (e.g. \"tomorrow\", \"next friday\"), ISO format YYYY-MM-DD.\n\
             - Generate 1 to 3 relevant tags."
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING", "description": "Concise task title" },
                "description": { "type": "STRING", "description": "Longer description or context, if available" },
                "priority": { "type": "STRING", "enum": ["low", "medium", "high", "critical"] },
                "category": { "type": "STRING", "description": "Category (e.g. work, personal, health)" },
                "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
                "due_date": { "type": "STRING", "description": "Due date as YYYY-MM-DD, or null if unspecified", "nullable": true }
            },
            "required": ["title", "priority", "category", "tags"]
        });

        let text = self
            .execute_with_retry(&Self::structured_request(prompt, schema))
            .await?;
        serde_json::from_str(&text).map_err(|e| {
            AssistantError::parse_error(format!("Unexpected parse payload: {}, text: {}", e, text))
        })
    }

    async fn decompose(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Vec<String>, AssistantError> {
        let prompt = format!(
            "Act as a productivity expert. Break the following task into 3 to 5 \
             concrete, actionable subtasks. Answer only with a JSON array of strings.\n\
             \n\
             Task: {title}\n\
             Context: {}",
            description.unwrap_or("none")
        );
        let schema = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

        let text = self
            .execute_with_retry(&Self::structured_request(prompt, schema))
            .await?;
        serde_json::from_str(&text).map_err(|e| {
            AssistantError::parse_error(format!(
                "Unexpected decompose payload: {}, text: {}",
                e, text
            ))
        })
    }

    async fn rank(&self, candidates: &[RankCandidate]) -> Result<Vec<Uuid>, AssistantError> {
        let payload = serde_json::to_string(candidates)
            .map_err(|e| AssistantError::parse_error(format!("Failed to encode tasks: {}", e)))?;
        let prompt = format!(
            "Act as a productivity expert using the Eisenhower matrix.\n\
             Analyze the following task list and determine the optimal execution \
             order for maximum effectiveness.\n\
             \n\
             Sorting criteria:\n\
             1. Due date (urgency).\n\
             2. Priority level (importance: critical > high > medium > low).\n\
             3. Estimated complexity and effort (from title and description).\n\
             \n\
             Tasks to sort:\n{payload}\n\
             \n\
             Return ONLY a JSON array containing the task ids in recommended \
             order (first to do first)."
        );
        let schema = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

        let text = self
            .execute_with_retry(&Self::structured_request(prompt, schema))
            .await?;
        let raw: Vec<String> = serde_json::from_str(&text).map_err(|e| {
            AssistantError::parse_error(format!("Unexpected rank payload: {}, text: {}", e, text))
        })?;

        // The assistant may echo ids it invented; keep only well-formed ones.
        let mut ids = Vec::with_capacity(raw.len());
        for s in raw {
            match s.parse::<Uuid>() {
                Ok(id) => ids.push(id),
                Err(_) => tracing::warn!("Dropping malformed id from rank response: {}", s),
            }
        }
        Ok(ids)
    }

    async fn advise(&self, candidates: &[AdviceCandidate]) -> Result<String, AssistantError> {
        let payload = serde_json::to_string(candidates)
            .map_err(|e| AssistantError::parse_error(format!("Failed to encode tasks: {}", e)))?;
        let prompt = format!(
            "Analyze this task list (JSON) and give one short piece of advice \
             (max 2 sentences) to motivate the user or suggest what to start \
             with. Be professional and encouraging.\n\
             \n\
             Tasks: {payload}"
        );
        let request = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let text = self.execute_with_retry(&request).await?;
        Ok(text.trim().to_string())
    }
}

/// Gemini generateContent response format.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}
