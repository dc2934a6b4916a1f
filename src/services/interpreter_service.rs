use crate::config::get_config;
use crate::error::{Error, Result};
use crate::models::question::{AnswerType, Question};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// External text-completion oracle returning structured JSON judgments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextOracle: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<JsonValue>;
}

/// OpenAI-backed oracle in JSON mode.
#[derive(Clone)]
pub struct OpenAiOracle {
    client: Client,
}

impl OpenAiOracle {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextOracle for OpenAiOracle {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<JsonValue> {
        let payload = serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0.1,
            "response_format": { "type": "json_object" }
        });

        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&get_config().openai_api_key)
            .json(&payload)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| Error::Oracle(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Oracle(format!("OpenAI API {}: {}", status, text)));
        }

        let body: JsonValue = res.json().await.map_err(|e| Error::Oracle(e.to_string()))?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .and_then(|s| serde_json::from_str(s).ok())
            .ok_or_else(|| Error::Oracle("Invalid OpenAI response format".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Validation {
    pub valid: bool,
    pub normalized: String,
    pub reason: String,
}

/// Bridges free-text candidate answers into the strict state machine:
/// normalizes them against the question's expected shape and decides
/// whether an answer ends the interview early.
#[derive(Clone)]
pub struct AnswerInterpreter {
    oracle: Arc<dyn TextOracle>,
}

const VALIDATOR_SYSTEM_PROMPT: &str =
    "You are a strict answer validator for a job interview. Return exactly this JSON format: \
     {\"valid\": true/false, \"reason\": \"explanation\", \"normalized\": \"normalized answer\"}";

impl AnswerInterpreter {
    pub fn new(oracle: Arc<dyn TextOracle>) -> Self {
        Self { oracle }
    }

    /// Validates and normalizes a raw answer. Oracle failures fail
    /// closed: the answer is reported invalid with the raw text echoed
    /// back, so the candidate is re-prompted instead of advancing.
    pub async fn validate(&self, question: &Question, raw_answer: &str) -> Validation {
        // Inherited behavior: the immediate-start question accepts any
        // free-form answer (earliest start dates arrive here) without
        // consulting the oracle. Yes/no literals still go through.
        if question.id == "immediate_start"
            && !matches!(raw_answer.to_lowercase().as_str(), "yes" | "no")
        {
            return Validation {
                valid: true,
                normalized: raw_answer.to_string(),
                reason: "Valid answer".to_string(),
            };
        }

        let instruction = match (question.answer_type, question.id.as_str()) {
            (AnswerType::Boolean, _) => {
                "Analyze if this answer means Yes or No and output 'Yes' or 'No' as the \
                 normalized answer. Consider variations and informal responses."
            }
            (AnswerType::Number, "availability") => {
                "Normalize the answer to a number of days per week."
            }
            (_, "location") => "Analyze if this location is in the UK.",
            _ => "Analyze if this is a valid and clear answer.",
        };

        let user_prompt = format!(
            "Question: {}\nAnswer: {}\n\n{}",
            question.text, raw_answer, instruction
        );

        match self.oracle.complete(VALIDATOR_SYSTEM_PROMPT, &user_prompt).await {
            Ok(result) => {
                let valid = result.get("valid").and_then(|v| v.as_bool());
                let normalized = result.get("normalized").map(|v| match v.as_str() {
                    Some(s) => s.to_string(),
                    None => v.to_string(),
                });
                match (valid, normalized) {
                    (Some(valid), Some(normalized)) => Validation {
                        valid,
                        normalized,
                        reason: result
                            .get("reason")
                            .and_then(|v| v.as_str())
                            .unwrap_or("")
                            .to_string(),
                    },
                    _ => {
                        tracing::warn!(question_id = %question.id, "malformed oracle validation result");
                        Self::failed_validation(raw_answer)
                    }
                }
            }
            Err(e) => {
                tracing::error!(question_id = %question.id, "answer validation failed: {}", e);
                Self::failed_validation(raw_answer)
            }
        }
    }

    fn failed_validation(raw_answer: &str) -> Validation {
        Validation {
            valid: false,
            normalized: raw_answer.to_string(),
            reason: "Validation error occurred".to_string(),
        }
    }

    /// Rule table deciding whether a normalized answer terminates the
    /// interview immediately. Returns the goodbye message when it does.
    pub async fn should_terminate(&self, question_id: &str, normalized: &str) -> Option<String> {
        match question_id {
            "work_eligibility" => {
                if normalized.to_lowercase() != "yes" {
                    return Some(
                        "Thank you for your time, but we require UK work eligibility. Goodbye."
                            .to_string(),
                    );
                }
                None
            }
            "availability" => match parse_leading_int(normalized) {
                Some(days) if days >= 3 => None,
                Some(_) => Some(
                    "Thank you for your time, but we require minimum 3 days availability. Goodbye."
                        .to_string(),
                ),
                None => Some(
                    "Thank you for your time, but we require clear availability information. Goodbye."
                        .to_string(),
                ),
            },
            "location" => {
                if self.is_uk_location(normalized).await {
                    None
                } else {
                    Some(
                        "Thank you for your time, but we only accept candidates based in the UK. Goodbye."
                            .to_string(),
                    )
                }
            }
            _ => None,
        }
    }

    /// Yes/no geography classification, delegated to the oracle. Errors
    /// count as "not UK" so a flaky oracle cannot wave candidates through.
    async fn is_uk_location(&self, location: &str) -> bool {
        let system = "You are a geography expert. Answer with only 'true' or 'false' in json \
                      format. For example: {\"valid\": true}";
        let user = format!("Is {} a location in the United Kingdom?", location);
        match self.oracle.complete(system, &user).await {
            Ok(result) => result.get("valid").and_then(|v| v.as_bool()).unwrap_or(false),
            Err(e) => {
                tracing::error!("location check failed: {}", e);
                false
            }
        }
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
