//! Remote LLM intent classification.
//!
//! Fallback recognizer for utterances the pattern matcher cannot place. The
//! model receives a capability description generated from the registry
//! (intent names and entity semantics, never utterance patterns) and returns
//! a JSON array of intents ordered by relevance, so one utterance can carry
//! several commands ("check all terms and go back").
//!
//! Classification failures are non-fatal by design: any transport or parse
//! problem degrades to a single unknown result.

use crate::config::{LanguageConfig, LlmConfig};
use crate::error::{Result, VoxError};
use crate::intent::registry::CommandRegistry;
use crate::intent::IntentResult;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

/// Classifier over an OpenAI-compatible chat completions endpoint.
pub struct LlmClassifier {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl LlmClassifier {
    /// Build a classifier for the given registry, connection, and language.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection settings are incomplete or the
    /// HTTP client cannot be constructed.
    pub fn new(
        registry: &CommandRegistry,
        config: &LlmConfig,
        language: &LanguageConfig,
    ) -> Result<Self> {
        if config.api_url.trim().is_empty() {
            return Err(VoxError::Config("llm.api_url is empty".to_owned()));
        }
        if config.api_model.trim().is_empty() {
            return Err(VoxError::Config("llm.api_model is empty".to_owned()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| VoxError::Network(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.api_model.clone(),
            temperature: config.temperature,
            system_prompt: build_system_prompt(registry, language),
        })
    }

    /// Classify an utterance into zero or more intents.
    ///
    /// Never fails; single attempt per call, degrading to unknown.
    pub async fn identify_intent(&self, text: &str) -> Vec<IntentResult> {
        match self.request(text).await {
            Ok(results) if !results.is_empty() => results,
            Ok(_) => vec![IntentResult::unknown()],
            Err(e) => {
                // Raw provider errors stay in the logs (see error policy).
                warn!("intent classification failed, degrading to unknown: {e}");
                vec![IntentResult::unknown()]
            }
        }
    }

    async fn request(&self, text: &str) -> Result<Vec<IntentResult>> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": text },
            ],
            "temperature": self.temperature,
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VoxError::Network(format!("classification request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(VoxError::Network(format!(
                "classification request returned {status}: {detail}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| VoxError::Network(format!("cannot read classification response: {e}")))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                VoxError::Recognition("classification response has no content".to_owned())
            })?;

        debug!(content, "classifier raw response");
        parse_intent_payload(content)
    }
}

/// Build the system instruction from the registry's capability description.
fn build_system_prompt(registry: &CommandRegistry, language: &LanguageConfig) -> String {
    let mut prompt = String::from(
        "You classify voice commands for controlling an on-screen interface.\n\
         Supported intents and their entities:\n",
    );
    prompt.push_str(&registry.capability_description());
    prompt.push_str(
        "\nRespond with ONLY a JSON array of objects, each \
         {\"intent\": string, \"confidence\": number between 0 and 1, \
         \"entities\": object}, ordered by relevance. An utterance may \
         contain several commands; return one object per command. If nothing \
         matches, return [{\"intent\": \"unknown\", \"confidence\": 0, \
         \"entities\": {}}].\n",
    );
    if !language.is_default() {
        prompt.push_str(&format!(
            "\nThe user speaks \"{}\". Interpret the utterance semantically in \
             that language. For every entity, return an object \
             {{\"english\": ..., \"spokenForm\": ...}} where \"english\" is \
             the canonical English value (cardinal directions as \
             up/down/left/right/top/bottom, dates as YYYY-MM-DD) and \
             \"spokenForm\" is what the user actually said.\n",
            language.code
        ));
    }
    prompt
}

/// Strip surrounding Markdown code fences, if present.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model's JSON payload into intent results.
///
/// A single object is wrapped into a one-element array. Confidences are
/// clamped into `[0, 1]`.
pub(crate) fn parse_intent_payload(content: &str) -> Result<Vec<IntentResult>> {
    let stripped = strip_code_fences(content);
    let value: Value = serde_json::from_str(stripped)
        .map_err(|e| VoxError::Recognition(format!("malformed classifier output: {e}")))?;
    let array = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(VoxError::Recognition(format!(
                "unexpected classifier output shape: {other}"
            )));
        }
    };

    let mut results = Vec::with_capacity(array.len());
    for item in array {
        let mut result: IntentResult = serde_json::from_value(item)
            .map_err(|e| VoxError::Recognition(format!("malformed intent object: {e}")))?;
        result.confidence = result.confidence.clamp(0.0, 1.0);
        results.push(result);
    }
    Ok(results)
}
