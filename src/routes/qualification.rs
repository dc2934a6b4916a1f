use crate::config::get_config;
use crate::dto::candidate_dto::{
    CandidateSummary, QualificationStatusResponse, RegisterCandidatePayload,
    RegisterCandidateResponse,
};
use crate::dto::webhook_dto::{AssistantEnvelope, InboundMessageForm, VoiceWebhookParams};
use crate::error::{Error, Result};
use crate::models::candidate::InterviewPhase;
use crate::services::candidate_service::NewCandidate;
use crate::services::interview_service::{AdvanceOutcome, StartOutcome};
use crate::utils::phone::{normalize_phone, strip_whatsapp_prefix};
use crate::utils::twiml::{Gather, GatherInput, VoiceResponse};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Form, Json};
use subtle::ConstantTimeEq;
use uuid::Uuid;
use validator::Validate;

const VOICE_WEBHOOK_PATH: &str = "/api/qualification/webhook/voice";
const VOICE_RESPONSE_ACTION: &str = "/api/qualification/webhook/voice/response";
const CONFIRMATION_PROMPT: &str =
    "Hello! This is a call about your job application. Press 1 to begin your qualification \
     interview.";

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCandidatePayload>,
) -> Result<(StatusCode, Json<RegisterCandidateResponse>)> {
    payload.validate()?;

    let candidate = state
        .interview
        .store()
        .create(NewCandidate {
            name: payload.name,
            phone: payload.phone,
            email: payload.email,
        })
        .await?;
    tracing::info!(candidate_id = %candidate.id, "candidate registered");

    let summary = CandidateSummary::from(&candidate);

    // The channel ladder blocks on call and delivery polls, so contact
    // runs in the background while registration returns immediately.
    let interview = state.interview.clone();
    let mut contact = candidate;
    tokio::spawn(async move {
        match interview.start_qualification(&mut contact).await {
            Ok(StartOutcome::Reached(method)) => {
                tracing::info!(candidate_id = %contact.id, method = method.as_str(), "candidate reached");
            }
            Ok(StartOutcome::Unreachable) => {
                tracing::warn!(candidate_id = %contact.id, "candidate unreachable on all channels");
            }
            Err(e) => {
                tracing::error!(candidate_id = %contact.id, "contact attempt failed: {}", e);
            }
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(RegisterCandidateResponse {
            status: "success".to_string(),
            message: "Candidate registered. We will contact you shortly.".to_string(),
            data: summary,
        }),
    ))
}

pub async fn qualification_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QualificationStatusResponse>> {
    let candidate = state
        .interview
        .store()
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
    Ok(Json(QualificationStatusResponse::from_candidate(
        &candidate,
        state.interview.questions().len(),
    )))
}

/// Answer point for the outbound IVR call: gathers the start
/// confirmation keypress, or re-speaks the current question when the
/// call reconnects mid-interview.
pub async fn voice_webhook(
    State(state): State<AppState>,
    Query(params): Query<VoiceWebhookParams>,
) -> Result<impl IntoResponse> {
    let phone = normalize_phone(strip_whatsapp_prefix(&params.to));
    if !phone.is_empty() {
        if let Some(candidate) = state.interview.store().get_by_phone(&phone).await? {
            if let Some(prompt) = state.current_prompt(&candidate) {
                return Ok(twiml(state.question_gather(&prompt).await));
            }
        }
    }
    Ok(twiml(state.confirmation_gather().await))
}

/// Handles both the confirmation keypress and every spoken answer; the
/// outcome of each transition is rendered straight into the next TwiML
/// document.
pub async fn voice_response_webhook(
    State(state): State<AppState>,
    Query(params): Query<VoiceWebhookParams>,
) -> Result<impl IntoResponse> {
    let phone = normalize_phone(strip_whatsapp_prefix(&params.to));
    let Some(candidate) = state.interview.store().get_by_phone(&phone).await? else {
        let xml = VoiceResponse::new()
            .say("Sorry, we couldn't find your registration. Goodbye.")
            .to_xml();
        return Ok(twiml(xml));
    };

    if let Some(digits) = params.digits.as_deref() {
        if digits == "1" && candidate.phase == InterviewPhase::AwaitingConfirmation {
            let mut candidate = candidate;
            let first_question = state.interview.start_interview(&mut candidate).await?;
            return Ok(twiml(state.question_gather(&first_question).await));
        }
        return Ok(twiml(state.confirmation_gather().await));
    }

    let Some(speech) = params.speech_result.as_deref().filter(|s| !s.is_empty()) else {
        // Gather timed out without input; repeat whatever is pending.
        let xml = match state.current_prompt(&candidate) {
            Some(prompt) => {
                state
                    .question_gather(&format!("Sorry, I didn't catch that. {}", prompt))
                    .await
            }
            None => state.confirmation_gather().await,
        };
        return Ok(twiml(xml));
    };

    let (_, outcome) = state
        .interview
        .process_answer(candidate.id, speech, None)
        .await?;
    let xml = match outcome {
        AdvanceOutcome::Reprompt { prompt }
        | AdvanceOutcome::FollowUp { prompt }
        | AdvanceOutcome::NextQuestion { prompt } => state.question_gather(&prompt).await,
        AdvanceOutcome::Disqualified { message } | AdvanceOutcome::Concluded { message } => {
            let audio = state.speech.synthesize(&message).await;
            VoiceResponse::new()
                .prompt(&message, audio.as_deref())
                .to_xml()
        }
        AdvanceOutcome::AlreadyComplete => VoiceResponse::new()
            .say("Your interview is already complete. Goodbye.")
            .to_xml(),
    };
    Ok(twiml(xml))
}

/// Inbound SMS and WhatsApp text messages share one endpoint; the sender
/// prefix distinguishes them.
pub async fn inbound_message_webhook(
    State(state): State<AppState>,
    Form(form): Form<InboundMessageForm>,
) -> Result<Json<serde_json::Value>> {
    let reply = state
        .interview
        .handle_inbound(&form.from, &form.body, form.message_sid.as_deref())
        .await?;
    Ok(Json(serde_json::json!({ "status": reply })))
}

/// Server messages from the voice assistant. Only the end-of-call report
/// mutates state; status updates and transcript fragments are ignored.
pub async fn assistant_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(envelope): Json<AssistantEnvelope>,
) -> Result<Json<serde_json::Value>> {
    verify_secret(&headers)?;

    let message = envelope.message;
    if message.message_type != "end-of-call-report" {
        tracing::debug!(message_type = %message.message_type, "ignoring assistant server message");
        return Ok(Json(serde_json::json!({ "received": true })));
    }

    let phone = message
        .customer
        .map(|c| c.number)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::BadRequest("report missing customer number".to_string()))?;
    let transcript: Vec<(String, String)> = message
        .artifact
        .map(|a| {
            a.messages
                .into_iter()
                .filter(|m| !m.message.is_empty())
                .map(|m| (m.role, m.message))
                .collect()
        })
        .unwrap_or_default();

    state
        .interview
        .record_assistant_report(&phone, &transcript)
        .await?;
    Ok(Json(serde_json::json!({ "received": true })))
}

impl AppState {
    async fn confirmation_gather(&self) -> String {
        let audio = self.speech.synthesize(CONFIRMATION_PROMPT).await;
        VoiceResponse::new()
            .gather(
                Gather::new(GatherInput::Dtmf, VOICE_RESPONSE_ACTION, 10)
                    .num_digits(1)
                    .prompt(CONFIRMATION_PROMPT, audio.as_deref()),
            )
            .say("We didn't receive a response. Goodbye.")
            .to_xml()
    }

    async fn question_gather(&self, prompt: &str) -> String {
        let audio = self.speech.synthesize(prompt).await;
        // Silence never reaches the action URL; the trailing redirect
        // loops the call back so the pending question is asked again.
        VoiceResponse::new()
            .gather(
                Gather::new(GatherInput::Speech, VOICE_RESPONSE_ACTION, 5)
                    .language("en-GB")
                    .prompt(prompt, audio.as_deref()),
            )
            .redirect(VOICE_WEBHOOK_PATH)
            .to_xml()
    }

    /// The prompt currently pending for an in-flight interview, if any.
    fn current_prompt(&self, candidate: &crate::models::candidate::Candidate) -> Option<String> {
        if candidate.status.is_terminal() {
            return None;
        }
        let bank = self.interview.questions();
        match &candidate.phase {
            InterviewPhase::Asking { index } => bank.get(*index).map(|q| q.prompt_text()),
            InterviewPhase::FollowUp { question_id, .. } => {
                bank.text_for_id(question_id).map(|t| t.to_string())
            }
            _ => None,
        }
    }
}

fn twiml(xml: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/xml")], xml)
}

fn verify_secret(headers: &HeaderMap) -> Result<()> {
    let Some(secret_hdr) = headers.get("x-webhook-secret") else {
        return Err(Error::Unauthorized("missing_webhook_secret".into()));
    };
    let provided = secret_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_secret_header".into()))?;
    let expected = &get_config().webhook_secret;
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_webhook_secret".into()))
    }
}
