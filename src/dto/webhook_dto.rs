use serde::Deserialize;

/// Query parameters Twilio sends to the voice IVR webhooks. The call is
/// outbound, so `To` carries the candidate's number.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceWebhookParams {
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "Digits")]
    pub digits: Option<String>,
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
}

/// Twilio inbound message webhook form body (SMS and WhatsApp text share
/// the shape; WhatsApp senders arrive as `whatsapp:+44...`).
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessageForm {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    /// Stable across provider redeliveries of the same message; used to
    /// drop retried webhooks.
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
}

/// Envelope for voice-assistant server messages. Only status updates and
/// the end-of-call report are consumed; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantEnvelope {
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "endedReason", default)]
    pub ended_reason: Option<String>,
    #[serde(default)]
    pub customer: Option<AssistantCustomer>,
    #[serde(default)]
    pub artifact: Option<AssistantArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantCustomer {
    #[serde(default)]
    pub number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantArtifact {
    #[serde(default)]
    pub messages: Vec<AssistantTranscriptMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantTranscriptMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub message: String,
}
