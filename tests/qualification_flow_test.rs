use std::env;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use screening_backend::error::Result;
use screening_backend::models::candidate::{Candidate, CandidateStatus, CommunicationMethod};
use screening_backend::services::candidate_service::{
    CandidateStore, MemoryCandidateStore, NewCandidate,
};
use screening_backend::services::channel_service::{
    CallChannel, CallOutcome, CallPlacement, CallScript, ChannelAdapter, MessageChannel,
    MessageStatus,
};
use screening_backend::services::interpreter_service::TextOracle;
use screening_backend::services::speech_service::NullSpeech;
use screening_backend::AppState;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
        env::set_var("DATABASE_URL", "postgres://unused/unused");
        env::set_var("BASE_URL", "http://localhost:8080");
        env::set_var("WEBHOOK_SECRET", "whsec_test");
        env::set_var("TWILIO_ACCOUNT_SID", "ACtest");
        env::set_var("TWILIO_AUTH_TOKEN", "token");
        env::set_var("TWILIO_FROM_PHONE", "+15550000001");
        env::set_var("TWILIO_WHATSAPP_NUMBER", "+15550000002");
        env::set_var("VAPI_API_KEY", "vapi-test");
        env::set_var("VAPI_PHONE_NUMBER_ID", "pn-test");
        env::set_var("VAPI_VOICE_ID", "voice-test");
        env::set_var("ELEVEN_LABS_API_KEY", "xi-test");
        env::set_var("ELEVEN_LABS_VOICE_ID", "xi-voice");
        env::set_var("OPENAI_API_KEY", "sk-test");
        screening_backend::config::init_config().expect("init config");
    });
}

/// Channel fake: WhatsApp probe fails, calls go unanswered, messages
/// deliver. Every outbound message is recorded for assertions.
#[derive(Default)]
struct FakeChannel {
    sent: Mutex<Vec<(MessageChannel, String, String)>>,
}

#[async_trait]
impl ChannelAdapter for FakeChannel {
    async fn probe_whatsapp(&self, _phone: &str) -> Result<bool> {
        Ok(false)
    }

    async fn send_voice_call(
        &self,
        channel: CallChannel,
        _phone: &str,
        _script: &CallScript,
    ) -> Result<CallPlacement> {
        Ok(CallPlacement {
            provider_id: "call_test".to_string(),
            channel,
        })
    }

    async fn poll_call_outcome(
        &self,
        _placement: &CallPlacement,
        _wait: Duration,
    ) -> Result<CallOutcome> {
        Ok(CallOutcome::NoAnswer)
    }

    async fn send_message(
        &self,
        channel: MessageChannel,
        phone: &str,
        body: &str,
    ) -> Result<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((channel, phone.to_string(), body.to_string()));
        Ok(format!("SM_{}", sent.len()))
    }

    async fn poll_message_status(
        &self,
        _provider_id: &str,
        _wait: Duration,
    ) -> Result<MessageStatus> {
        Ok(MessageStatus::Delivered)
    }
}

/// Oracle fake answering each prompt family with canned JSON: boolean
/// answers normalize to Yes/No, everything else echoes, locations are
/// always in the UK, and evaluations score 0.8 across the board.
struct FakeOracle;

#[async_trait]
impl TextOracle for FakeOracle {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Value> {
        if system_prompt.contains("geography expert") {
            return Ok(json!({ "valid": true }));
        }
        if system_prompt.contains("recruitment evaluator") {
            return Ok(json!({
                "evaluation": {
                    "experience": 0.8,
                    "availability": 0.8,
                    "location": 0.8,
                    "motivation": 0.8
                }
            }));
        }

        let answer = user_prompt
            .lines()
            .find_map(|line| line.strip_prefix("Answer: "))
            .unwrap_or("");
        let normalized = match answer.to_lowercase().as_str() {
            a if a.starts_with("yes") => "Yes".to_string(),
            a if a.starts_with("no") => "No".to_string(),
            _ => answer.to_string(),
        };
        Ok(json!({
            "valid": true,
            "reason": "clear answer",
            "normalized": normalized
        }))
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryCandidateStore>,
    channel: Arc<FakeChannel>,
}

fn setup_app() -> TestApp {
    init_test_config();
    let store = Arc::new(MemoryCandidateStore::new());
    let channel = Arc::new(FakeChannel::default());
    let state = AppState::new(
        store.clone(),
        channel.clone(),
        Arc::new(FakeOracle),
        Arc::new(NullSpeech),
    )
    .expect("app state");
    TestApp {
        router: screening_backend::routes::router(state),
        store,
        channel,
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn response_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

async fn seed_sms_candidate(store: &MemoryCandidateStore, phone: &str, email: &str) -> Candidate {
    let mut candidate = store
        .create(NewCandidate {
            name: "Jamie Field".to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
        })
        .await
        .expect("seed candidate");
    candidate.communication_method = Some(CommunicationMethod::Sms);
    store.save(&candidate).await.expect("seed save");
    candidate
}

async fn post_sms(app: &Router, from: &str, body: &str, sid: &str) -> Value {
    let form = format!(
        "From={}&Body={}&MessageSid={}",
        urlencode(from),
        urlencode(body),
        sid
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/qualification/webhook/sms")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await
}

fn urlencode(value: &str) -> String {
    let mut out = String::new();
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

#[tokio::test]
async fn registration_walks_the_ladder_down_to_sms() {
    let app = setup_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/qualification/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "Robin Hale",
                "phone": "+44 7700 900100",
                "email": "robin@example.com"
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
    let id: uuid::Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    // Contact runs in the background; wait for the ladder to land.
    let mut candidate = None;
    for _ in 0..100 {
        let stored = app.store.get_by_id(id).await.unwrap().unwrap();
        if stored.communication_method.is_some() {
            candidate = Some(stored);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let candidate = candidate.expect("ladder should reach the candidate");
    assert_eq!(candidate.communication_method, Some(CommunicationMethod::Sms));
    assert_eq!(candidate.status, CandidateStatus::Registered);

    let sent = app.channel.sent.lock().unwrap();
    assert!(sent
        .iter()
        .any(|(channel, _, body)| *channel == MessageChannel::Sms && body.contains("reply START")));
    assert!(sent
        .iter()
        .any(|(_, _, body)| body.contains("Welcome to our recruitment process")));
}

#[tokio::test]
async fn invalid_registration_payload_is_rejected() {
    let app = setup_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/qualification/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "name": "", "phone": "123", "email": "not-an-email" }).to_string(),
        ))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_sms_interview_ends_qualified() {
    let app = setup_app();
    let phone = "+447700900200";
    let candidate = seed_sms_candidate(&app.store, phone, "full@example.com").await;

    let reply = post_sms(&app.router, phone, "START", "SM_a0").await;
    assert!(reply["status"]
        .as_str()
        .unwrap()
        .contains("Where are you currently based?"));

    let answers = [
        "Leeds",
        "yes",
        "yes",
        "4 days",
        "yes",
        "yes",
        "no",
        "yes",
        "10 miles",
        "none at the moment",
        "I enjoy supporting children's learning",
    ];
    let mut last = String::new();
    for (i, answer) in answers.iter().enumerate() {
        let reply = post_sms(&app.router, phone, answer, &format!("SM_a{}", i + 1)).await;
        last = reply["status"].as_str().unwrap().to_string();
    }
    assert!(last.contains("Congratulations"), "got: {}", last);

    let stored = app.store.get_by_id(candidate.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CandidateStatus::Qualified);

    let request = Request::builder()
        .uri(format!("/api/qualification/status/{}", candidate.id))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = response_json(response).await;
    assert_eq!(status["qualified"], true);
    assert_eq!(status["completed_questions"], status["total_questions"]);
}

#[tokio::test]
async fn sms_from_unknown_number_asks_to_register() {
    let app = setup_app();
    let reply = post_sms(&app.router, "+15559990000", "hello", "SM_u1").await;
    assert!(reply["status"]
        .as_str()
        .unwrap()
        .contains("couldn't find your registration"));
}

#[tokio::test]
async fn retried_sms_delivery_does_not_advance_twice() {
    let app = setup_app();
    let phone = "+447700900300";
    let candidate = seed_sms_candidate(&app.store, phone, "retry@example.com").await;

    post_sms(&app.router, phone, "START", "SM_r0").await;
    post_sms(&app.router, phone, "Leeds", "SM_r1").await;
    let before = app.store.get_by_id(candidate.id).await.unwrap().unwrap();

    // Same MessageSid again: provider retry of the delivery.
    post_sms(&app.router, phone, "Leeds", "SM_r1").await;
    let after = app.store.get_by_id(candidate.id).await.unwrap().unwrap();

    assert_eq!(before.phase, after.phase);
    assert_eq!(
        before.answers.len(),
        after.answers.len(),
        "retry must not append a second answer"
    );
}

#[tokio::test]
async fn voice_confirmation_keypress_starts_the_interview() {
    let app = setup_app();
    let phone = "+447700900400";
    let mut candidate = app
        .store
        .create(NewCandidate {
            name: "Morgan Wise".to_string(),
            phone: phone.to_string(),
            email: "voice@example.com".to_string(),
        })
        .await
        .unwrap();
    candidate.communication_method = Some(CommunicationMethod::WhatsappCall);
    app.store.save(&candidate).await.unwrap();

    let request = Request::builder()
        .uri(format!(
            "/api/qualification/webhook/voice/response?To={}&Digits=1",
            urlencode(phone)
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let xml = response_text(response).await;
    assert!(xml.contains(r#"input="speech""#));
    assert!(xml.contains("Where are you currently based?"));

    let stored = app.store.get_by_id(candidate.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CandidateStatus::InProgress);
}

#[tokio::test]
async fn silent_caller_loops_back_to_the_pending_question() {
    let app = setup_app();
    let phone = "+447700900450";
    let mut candidate = app
        .store
        .create(NewCandidate {
            name: "Ashley Vane".to_string(),
            phone: phone.to_string(),
            email: "silent@example.com".to_string(),
        })
        .await
        .unwrap();
    candidate.communication_method = Some(CommunicationMethod::WhatsappCall);
    app.store.save(&candidate).await.unwrap();

    let confirm = Request::builder()
        .uri(format!(
            "/api/qualification/webhook/voice/response?To={}&Digits=1",
            urlencode(phone)
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(confirm).await.unwrap();
    let xml = response_text(response).await;
    // Twilio never calls the Gather action on silence; the document
    // must route the fall-through back to the voice webhook itself.
    assert!(xml.contains(
        r#"<Redirect method="GET">/api/qualification/webhook/voice</Redirect>"#
    ));

    // The redirected request re-asks the question that is pending.
    let reconnect = Request::builder()
        .uri(format!(
            "/api/qualification/webhook/voice?To={}",
            urlencode(phone)
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(reconnect).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let xml = response_text(response).await;
    assert!(xml.contains(r#"input="speech""#));
    assert!(xml.contains("Where are you currently based?"));
}

#[tokio::test]
async fn spoken_disqualifying_answer_renders_goodbye_twiml() {
    let app = setup_app();
    let phone = "+447700900500";
    let mut candidate = app
        .store
        .create(NewCandidate {
            name: "Sam Porter".to_string(),
            phone: phone.to_string(),
            email: "goodbye@example.com".to_string(),
        })
        .await
        .unwrap();
    candidate.communication_method = Some(CommunicationMethod::WhatsappCall);
    app.store.save(&candidate).await.unwrap();

    // Confirm, answer the location, then fail the eligibility question.
    let confirm = Request::builder()
        .uri(format!(
            "/api/qualification/webhook/voice/response?To={}&Digits=1",
            urlencode(phone)
        ))
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(confirm).await.unwrap();

    let location = Request::builder()
        .uri(format!(
            "/api/qualification/webhook/voice/response?To={}&SpeechResult=Leeds",
            urlencode(phone)
        ))
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(location).await.unwrap();

    let eligibility = Request::builder()
        .uri(format!(
            "/api/qualification/webhook/voice/response?To={}&SpeechResult=no",
            urlencode(phone)
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(eligibility).await.unwrap();
    let xml = response_text(response).await;
    assert!(xml.contains("UK work eligibility"));
    assert!(!xml.contains("<Gather"), "terminal response must not gather");

    let stored = app.store.get_by_id(candidate.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CandidateStatus::Disqualified);
}

#[tokio::test]
async fn assistant_webhook_requires_the_shared_secret() {
    let app = setup_app();
    let body = json!({
        "message": {
            "type": "end-of-call-report",
            "status": "ended",
            "customer": { "number": "+447700900600" },
            "artifact": { "messages": [] }
        }
    });

    let missing = Request::builder()
        .method("POST")
        .uri("/api/qualification/webhook/assistant")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .method("POST")
        .uri("/api/qualification/webhook/assistant")
        .header("content-type", "application/json")
        .header("x-webhook-secret", "wrong")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn assistant_report_concludes_the_voice_interview() {
    let app = setup_app();
    let phone = "+447700900700";
    let mut candidate = app
        .store
        .create(NewCandidate {
            name: "Dana Reeve".to_string(),
            phone: phone.to_string(),
            email: "report@example.com".to_string(),
        })
        .await
        .unwrap();
    candidate.communication_method = Some(CommunicationMethod::VoiceCall);
    candidate.status = CandidateStatus::InProgress;
    app.store.save(&candidate).await.unwrap();

    let body = json!({
        "message": {
            "type": "end-of-call-report",
            "status": "ended",
            "endedReason": "assistant-ended-call",
            "customer": { "number": phone },
            "artifact": {
                "messages": [
                    { "role": "bot", "message": "Are you eligible to work in the UK?" },
                    { "role": "user", "message": "Yes, I am." }
                ]
            }
        }
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/qualification/webhook/assistant")
        .header("content-type", "application/json")
        .header("x-webhook-secret", "whsec_test")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = app.store.get_by_id(candidate.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CandidateStatus::Qualified);
    assert!(stored.transcript_chunks().count() >= 2);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = setup_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}
