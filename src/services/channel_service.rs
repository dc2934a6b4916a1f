use crate::config::get_config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// How long we wait before fetching a message's delivery status.
pub const MESSAGE_STATUS_WAIT: Duration = Duration::from_secs(2);
/// How long we give a placed call to be answered.
pub const CALL_ANSWER_WAIT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallChannel {
    /// WhatsApp voice call placed through the messaging provider.
    Whatsapp,
    /// Plain phone call driven by the AI voice assistant.
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageChannel {
    Whatsapp,
    Sms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Completed,
    InProgress,
    NoAnswer,
    Busy,
    Declined,
    Voicemail,
}

impl CallOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, CallOutcome::Completed | CallOutcome::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Queued,
    Sent,
    Delivered,
    Failed,
}

impl MessageStatus {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, MessageStatus::Failed)
    }
}

/// Conversational script handed to the voice assistant for the plain
/// call leg: the whole interview runs inside one call.
#[derive(Debug, Clone)]
pub struct CallScript {
    pub candidate_name: String,
    pub system_prompt: String,
    pub first_message: String,
}

/// Provider-side handle for a placed call, kept so the outcome can be
/// polled against the right provider.
#[derive(Debug, Clone)]
pub struct CallPlacement {
    pub provider_id: String,
    pub channel: CallChannel,
}

/// Per-channel senders and the WhatsApp capability probe. One
/// side-effecting call per method, no internal retries; the fallback
/// ladder owns sequencing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    async fn probe_whatsapp(&self, phone: &str) -> Result<bool>;
    async fn send_voice_call(
        &self,
        channel: CallChannel,
        phone: &str,
        script: &CallScript,
    ) -> Result<CallPlacement>;
    async fn poll_call_outcome(
        &self,
        placement: &CallPlacement,
        wait: Duration,
    ) -> Result<CallOutcome>;
    async fn send_message(
        &self,
        channel: MessageChannel,
        phone: &str,
        body: &str,
    ) -> Result<String>;
    async fn poll_message_status(&self, provider_id: &str, wait: Duration)
        -> Result<MessageStatus>;
}

/// Production adapter: Twilio REST for messaging and WhatsApp calls,
/// Vapi for the assistant-driven plain voice call.
#[derive(Clone)]
pub struct TwilioChannel {
    client: Client,
}

impl TwilioChannel {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api_base(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}",
            get_config().twilio_account_sid
        )
    }

    async fn twilio_post(&self, url: &str, form: &[(&str, &str)]) -> Result<JsonValue> {
        let config = get_config();
        let res = self
            .client
            .post(url)
            .basic_auth(&config.twilio_account_sid, Some(&config.twilio_auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| Error::Channel(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Channel(format!("Twilio API {}: {}", status, text)));
        }
        res.json().await.map_err(|e| Error::Channel(e.to_string()))
    }

    async fn twilio_get(&self, url: &str) -> Result<JsonValue> {
        let config = get_config();
        let res = self
            .client
            .get(url)
            .basic_auth(&config.twilio_account_sid, Some(&config.twilio_auth_token))
            .send()
            .await
            .map_err(|e| Error::Channel(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Channel(format!("Twilio API {}: {}", status, text)));
        }
        res.json().await.map_err(|e| Error::Channel(e.to_string()))
    }

    fn sid_of(value: &JsonValue) -> Result<String> {
        value
            .get("sid")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Channel("Twilio response missing sid".to_string()))
    }

    async fn place_whatsapp_call(&self, phone: &str) -> Result<CallPlacement> {
        let config = get_config();
        let url = format!("{}/Calls.json", self.api_base());
        let webhook = format!("{}/api/qualification/webhook/voice", config.base_url);
        let to = format!("whatsapp:{}", phone);
        let from = format!("whatsapp:{}", config.twilio_whatsapp_number);
        let body = self
            .twilio_post(
                &url,
                &[
                    ("Url", webhook.as_str()),
                    ("To", to.as_str()),
                    ("From", from.as_str()),
                    ("Method", "GET"),
                ],
            )
            .await?;
        Ok(CallPlacement {
            provider_id: Self::sid_of(&body)?,
            channel: CallChannel::Whatsapp,
        })
    }

    async fn place_assistant_call(&self, phone: &str, script: &CallScript) -> Result<CallPlacement> {
        let config = get_config();
        let payload = serde_json::json!({
            "phoneNumberId": config.vapi_phone_number_id,
            "customer": {
                "number": phone,
                "name": script.candidate_name,
            },
            "assistant": {
                "name": "Qualification Assistant",
                "voice": {
                    "voiceId": config.vapi_voice_id,
                    "provider": "11labs",
                    "stability": 0.5,
                    "similarityBoost": 0.75
                },
                "model": {
                    "provider": "openai",
                    "model": "gpt-4o-mini",
                    "temperature": 0.7,
                    "maxTokens": 250,
                    "messages": [
                        {"role": "system", "content": script.system_prompt}
                    ]
                },
                "recordingEnabled": true,
                "firstMessage": script.first_message,
                "voicemailMessage": "Sorry we missed you. Please register again when you're available for the interview.",
                "endCallMessage": "Thank you for completing the interview. We will review your answers and get back to you soon. Goodbye.",
                "transcriber": {
                    "model": "general",
                    "language": "en",
                    "provider": "deepgram"
                },
                "server": {
                    "url": format!("{}/api/qualification/webhook/assistant", config.base_url)
                },
                "serverMessages": [
                    "end-of-call-report", "status-update", "hang", "transcript"
                ],
                "endCallPhrases": [
                    "Goodbye.",
                    "Thank you for your time. Goodbye.",
                    "Thank you for completing the interview. We will review your answers and get back to you soon. Goodbye."
                ]
            }
        });

        let res = self
            .client
            .post("https://api.vapi.ai/call/phone")
            .header("Authorization", &config.vapi_api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Channel(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Channel(format!("Vapi API {}: {}", status, text)));
        }

        let body: JsonValue = res.json().await.map_err(|e| Error::Channel(e.to_string()))?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(CallPlacement {
            provider_id: id,
            channel: CallChannel::Assistant,
        })
    }

    fn map_twilio_call_status(status: &str) -> CallOutcome {
        match status {
            "completed" => CallOutcome::Completed,
            "in-progress" | "ringing" | "queued" | "initiated" => CallOutcome::InProgress,
            "busy" => CallOutcome::Busy,
            "canceled" => CallOutcome::Declined,
            _ => CallOutcome::NoAnswer,
        }
    }

    fn map_assistant_outcome(status: &str, ended_reason: &str) -> CallOutcome {
        match status {
            "queued" | "ringing" | "in-progress" => CallOutcome::InProgress,
            "ended" => {
                if ended_reason.contains("customer-did-not-answer") {
                    CallOutcome::NoAnswer
                } else if ended_reason.contains("customer-busy") {
                    CallOutcome::Busy
                } else if ended_reason.contains("voicemail") {
                    CallOutcome::Voicemail
                } else {
                    CallOutcome::Completed
                }
            }
            _ => CallOutcome::NoAnswer,
        }
    }

    fn map_message_status(status: &str) -> MessageStatus {
        match status {
            "queued" | "accepted" | "sending" => MessageStatus::Queued,
            "sent" => MessageStatus::Sent,
            "delivered" | "read" => MessageStatus::Delivered,
            _ => MessageStatus::Failed,
        }
    }
}

#[async_trait]
impl ChannelAdapter for TwilioChannel {
    async fn probe_whatsapp(&self, phone: &str) -> Result<bool> {
        let config = get_config();
        let url = format!("{}/Messages.json", self.api_base());
        let to = format!("whatsapp:{}", phone);
        let from = format!("whatsapp:{}", config.twilio_whatsapp_number);
        // An unregistered number makes the send itself fail, so a send
        // error means "not on WhatsApp", not a hard failure.
        let sent = self
            .twilio_post(
                &url,
                &[
                    ("From", from.as_str()),
                    ("Body", "Hi! This is a WhatsApp verification message."),
                    ("To", to.as_str()),
                ],
            )
            .await;
        let body = match sent {
            Ok(body) => body,
            Err(e) => {
                tracing::info!(phone, "WhatsApp probe send failed: {}", e);
                return Ok(false);
            }
        };

        let sid = Self::sid_of(&body)?;
        match self.poll_message_status(&sid, MESSAGE_STATUS_WAIT).await {
            Ok(status) => Ok(status.is_accepted()),
            Err(e) => {
                tracing::info!(phone, "WhatsApp probe status fetch failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn send_voice_call(
        &self,
        channel: CallChannel,
        phone: &str,
        script: &CallScript,
    ) -> Result<CallPlacement> {
        match channel {
            CallChannel::Whatsapp => self.place_whatsapp_call(phone).await,
            CallChannel::Assistant => self.place_assistant_call(phone, script).await,
        }
    }

    async fn poll_call_outcome(
        &self,
        placement: &CallPlacement,
        wait: Duration,
    ) -> Result<CallOutcome> {
        tokio::time::sleep(wait).await;
        match placement.channel {
            CallChannel::Whatsapp => {
                let url = format!("{}/Calls/{}.json", self.api_base(), placement.provider_id);
                let body = self.twilio_get(&url).await?;
                let status = body.get("status").and_then(|v| v.as_str()).unwrap_or("");
                Ok(Self::map_twilio_call_status(status))
            }
            CallChannel::Assistant => {
                let config = get_config();
                let res = self
                    .client
                    .get(format!("https://api.vapi.ai/call/{}", placement.provider_id))
                    .header("Authorization", &config.vapi_api_key)
                    .send()
                    .await
                    .map_err(|e| Error::Channel(e.to_string()))?;
                let body: JsonValue =
                    res.json().await.map_err(|e| Error::Channel(e.to_string()))?;
                let status = body.get("status").and_then(|v| v.as_str()).unwrap_or("");
                let ended_reason = body
                    .get("endedReason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                Ok(Self::map_assistant_outcome(status, ended_reason))
            }
        }
    }

    async fn send_message(
        &self,
        channel: MessageChannel,
        phone: &str,
        body: &str,
    ) -> Result<String> {
        let config = get_config();
        let url = format!("{}/Messages.json", self.api_base());
        let (from, to) = match channel {
            MessageChannel::Whatsapp => (
                format!("whatsapp:{}", config.twilio_whatsapp_number),
                format!("whatsapp:{}", phone),
            ),
            MessageChannel::Sms => (config.twilio_from_phone.clone(), phone.to_string()),
        };
        let response = self
            .twilio_post(
                &url,
                &[
                    ("From", from.as_str()),
                    ("Body", body),
                    ("To", to.as_str()),
                ],
            )
            .await?;
        Self::sid_of(&response)
    }

    async fn poll_message_status(
        &self,
        provider_id: &str,
        wait: Duration,
    ) -> Result<MessageStatus> {
        tokio::time::sleep(wait).await;
        let url = format!("{}/Messages/{}.json", self.api_base(), provider_id);
        let body = self.twilio_get(&url).await?;
        let status = body.get("status").and_then(|v| v.as_str()).unwrap_or("");
        Ok(Self::map_message_status(status))
    }
}
