use crate::error::Result;
use crate::models::candidate::{
    Candidate, CandidateStatus, CommunicationMethod, InterviewPhase,
};
use crate::models::question::QuestionBank;
use crate::services::candidate_service::CandidateStore;
use crate::services::channel_service::{
    CallChannel, CallOutcome, CallScript, ChannelAdapter, MessageChannel, CALL_ANSWER_WAIT,
    MESSAGE_STATUS_WAIT,
};
use crate::services::evaluation_service::EvaluationService;
use crate::services::interpreter_service::{AnswerInterpreter, TextOracle};
use crate::utils::phone::{normalize_phone, strip_whatsapp_prefix};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

pub const NOT_REGISTERED_MESSAGE: &str =
    "Sorry, we couldn't find your registration. Please register first.";
pub const AVAILABILITY_DISQUALIFICATION_MESSAGE: &str =
    "Thank you for your interest. Unfortunately, we require a minimum availability of 3 days \
     per week for this position. We cannot proceed with the qualification process at this time.";
pub const QUALIFIED_MESSAGE: &str =
    "Congratulations! You have successfully completed the qualification process. Our team will \
     contact you shortly with next steps.";
pub const NOT_QUALIFIED_MESSAGE: &str =
    "Thank you for your interest. After careful evaluation, we regret to inform you that we \
     cannot proceed with your application at this time.";
pub const PENDING_REVIEW_MESSAGE: &str =
    "Thank you for completing the interview! Our team will review your answers and get back to \
     you soon.";
pub const PROCESSING_ERROR_MESSAGE: &str =
    "Sorry, there was an error processing your response.";

/// Result of the channel fallback ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Reached(CommunicationMethod),
    /// Every channel failed; an external scheduler retries later.
    Unreachable,
}

/// Result of one `advance` transition. Messaging channels have already
/// had their outbound sends performed; the voice IVR route renders the
/// carried prompt into TwiML instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Terminal candidate or cursor past the last question; nothing was
    /// mutated.
    AlreadyComplete,
    /// The answer did not validate; same question again, cursor and log
    /// untouched.
    Reprompt { prompt: String },
    /// A conditional follow-up fired; extra prompt, no cursor move.
    FollowUp { prompt: String },
    NextQuestion { prompt: String },
    Disqualified { message: String },
    Concluded { message: String },
}

/// The interview state machine. Owns channel selection, question
/// sequencing, termination rules and the hand-off to evaluation; all
/// collaborators are injected handles so tests can substitute fakes.
#[derive(Clone)]
pub struct InterviewService {
    store: Arc<dyn CandidateStore>,
    channel: Arc<dyn ChannelAdapter>,
    interpreter: AnswerInterpreter,
    evaluator: EvaluationService,
    questions: Arc<QuestionBank>,
    // Serializes processing per candidate: provider webhooks can arrive
    // concurrently (including duplicate retries) for the same person.
    locks: Arc<AsyncMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
    // Outcome per processed provider message id, per candidate. A
    // retried webhook delivery gets the original outcome replayed
    // instead of mutating state again. Entries are dropped once the
    // candidate reaches a terminal status.
    processed: Arc<std::sync::Mutex<HashMap<Uuid, HashMap<String, AdvanceOutcome>>>>,
}

impl InterviewService {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        channel: Arc<dyn ChannelAdapter>,
        oracle: Arc<dyn TextOracle>,
        questions: Arc<QuestionBank>,
    ) -> Self {
        Self {
            store,
            channel,
            interpreter: AnswerInterpreter::new(oracle.clone()),
            evaluator: EvaluationService::new(oracle),
            questions,
            locks: Arc::new(AsyncMutex::new(HashMap::new())),
            processed: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }

    pub fn store(&self) -> &Arc<dyn CandidateStore> {
        &self.store
    }

    async fn candidate_lock(&self, id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn replayed(&self, candidate_id: Uuid, sid: &str) -> Option<AdvanceOutcome> {
        self.processed
            .lock()
            .unwrap()
            .get(&candidate_id)
            .and_then(|seen| seen.get(sid))
            .cloned()
    }

    fn remember(&self, candidate_id: Uuid, sid: &str, outcome: &AdvanceOutcome) {
        self.processed
            .lock()
            .unwrap()
            .entry(candidate_id)
            .or_default()
            .insert(sid.to_string(), outcome.clone());
    }

    /// Terminal candidates answer every further webhook from the status
    /// check alone, so their lock and replay entries can go.
    async fn forget(&self, candidate_id: Uuid) {
        self.locks.lock().await.remove(&candidate_id);
        self.processed.lock().unwrap().remove(&candidate_id);
    }

    /// Attempts to reach the candidate, walking the channel ladder in
    /// fixed order and stopping at the first success. Channel failures
    /// are converted into fall-through, never raised.
    pub async fn start_qualification(&self, candidate: &mut Candidate) -> Result<StartOutcome> {
        let is_whatsapp = match self.channel.probe_whatsapp(&candidate.phone).await {
            Ok(flag) => flag,
            Err(e) => {
                tracing::warn!(candidate_id = %candidate.id, "WhatsApp probe failed: {}", e);
                false
            }
        };

        if is_whatsapp {
            match self.try_whatsapp_call(candidate).await {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {
                    // Unanswered WhatsApp call falls through to a text.
                    if let Some(outcome) = self.try_whatsapp_message(candidate).await? {
                        return Ok(outcome);
                    }
                }
                Err(e) => {
                    tracing::warn!(candidate_id = %candidate.id, "WhatsApp call attempt failed: {}", e);
                }
            }
        }

        match self.try_assistant_call(candidate).await {
            Ok(Some(outcome)) => return Ok(outcome),
            Ok(None) => {
                if let Some(outcome) = self.try_sms(candidate).await? {
                    return Ok(outcome);
                }
            }
            Err(e) => {
                tracing::warn!(candidate_id = %candidate.id, "voice call attempt failed: {}", e);
            }
        }

        tracing::info!(candidate_id = %candidate.id, "all communication methods failed");
        Ok(StartOutcome::Unreachable)
    }

    /// Ok(Some) = answered, Ok(None) = explicit no-answer (fall through
    /// to WhatsApp text), Err = provider failure (skip to voice call).
    async fn try_whatsapp_call(&self, candidate: &mut Candidate) -> Result<Option<StartOutcome>> {
        let placement = self
            .channel
            .send_voice_call(CallChannel::Whatsapp, &candidate.phone, &self.call_script(candidate))
            .await?;
        let outcome = self
            .channel
            .poll_call_outcome(&placement, CALL_ANSWER_WAIT)
            .await?;
        if outcome.is_answered() {
            candidate.communication_method = Some(CommunicationMethod::WhatsappCall);
            self.store.save(candidate).await?;
            return Ok(Some(StartOutcome::Reached(CommunicationMethod::WhatsappCall)));
        }
        if outcome == CallOutcome::NoAnswer {
            return Ok(None);
        }
        Err(crate::error::Error::Channel(format!(
            "whatsapp call ended: {:?}",
            outcome
        )))
    }

    async fn try_whatsapp_message(
        &self,
        candidate: &mut Candidate,
    ) -> Result<Option<StartOutcome>> {
        match self
            .send_and_confirm(MessageChannel::Whatsapp, candidate, &welcome_message(&candidate.name))
            .await
        {
            Ok(true) => {
                candidate.communication_method = Some(CommunicationMethod::WhatsappMessage);
                self.store.save(candidate).await?;
                Ok(Some(StartOutcome::Reached(CommunicationMethod::WhatsappMessage)))
            }
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::warn!(candidate_id = %candidate.id, "WhatsApp message failed: {}", e);
                Ok(None)
            }
        }
    }

    /// Ok(Some) = reached, Ok(None) = no answer (fall through to SMS),
    /// Err = provider failure (ladder exhausted).
    async fn try_assistant_call(&self, candidate: &mut Candidate) -> Result<Option<StartOutcome>> {
        let placement = self
            .channel
            .send_voice_call(
                CallChannel::Assistant,
                &candidate.phone,
                &self.call_script(candidate),
            )
            .await?;
        let outcome = self
            .channel
            .poll_call_outcome(&placement, CALL_ANSWER_WAIT)
            .await?;
        if outcome.is_answered() {
            candidate.communication_method = Some(CommunicationMethod::VoiceCall);
            self.store.save(candidate).await?;
            return Ok(Some(StartOutcome::Reached(CommunicationMethod::VoiceCall)));
        }
        Ok(None)
    }

    async fn try_sms(&self, candidate: &mut Candidate) -> Result<Option<StartOutcome>> {
        let invite = format!(
            "Hi {}, please reply START to begin your qualification interview.",
            candidate.name
        );
        match self
            .send_and_confirm(MessageChannel::Sms, candidate, &invite)
            .await
        {
            Ok(true) => {
                // Initial instructions follow the invite.
                self.best_effort_send(MessageChannel::Sms, candidate, &welcome_message(&candidate.name))
                    .await;
                candidate.communication_method = Some(CommunicationMethod::Sms);
                self.store.save(candidate).await?;
                Ok(Some(StartOutcome::Reached(CommunicationMethod::Sms)))
            }
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::warn!(candidate_id = %candidate.id, "SMS send failed: {}", e);
                Ok(None)
            }
        }
    }

    async fn send_and_confirm(
        &self,
        channel: MessageChannel,
        candidate: &Candidate,
        body: &str,
    ) -> Result<bool> {
        let provider_id = self
            .channel
            .send_message(channel, &candidate.phone, body)
            .await?;
        let status = self
            .channel
            .poll_message_status(&provider_id, MESSAGE_STATUS_WAIT)
            .await?;
        Ok(status.is_accepted())
    }

    /// Full interview script for the assistant-driven voice call; the
    /// entire battery runs inside the one call, so the assistant carries
    /// the questions and the termination rules as its prompt.
    fn call_script(&self, candidate: &Candidate) -> CallScript {
        let mut lines: Vec<String> = Vec::new();
        lines.push(
            "You are a qualification interviewer.\n\
             First ask: \"Are you available for a quick interview? The process will take about \
             twenty minutes.\"\n\
             If user says no or is not available, say \"Thank you for your time. Goodbye.\" and \
             end the call.\n\nAsk these questions in order:"
                .to_string(),
        );
        for (i, question) in self.questions.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, question.text));
            if question.id == "availability" {
                lines.push(
                    "   \u{2022} If less than 3 days, say \"Thank you for your time, but we \
                     require minimum 3 days availability. Goodbye.\" and end the call"
                        .to_string(),
                );
            }
            if let Some(follow_up) = &question.follow_up {
                for (answer, sub) in follow_up {
                    lines.push(format!("   \u{2022} If {}, ask \"{}\"", answer, sub.text));
                }
            }
        }
        lines.push(
            "\nAfter all questions are answered, say \"Thank you for completing the interview. \
             We will review your answers and get back to you soon. Goodbye.\" and end the call.\n\n\
             Be professional but friendly. Listen carefully to answers and ask for clarification \
             if needed."
                .to_string(),
        );

        CallScript {
            candidate_name: candidate.name.clone(),
            system_prompt: lines.join("\n"),
            first_message: format!(
                "Hello {}, I'm calling about your qualification interview. Are you available to \
                 talk for about twenty minutes?",
                candidate.name
            ),
        }
    }

    /// Inbound SMS/WhatsApp text entry point. Serializes per candidate,
    /// handles the START confirmation, and otherwise advances the
    /// interview. Returns the status string reported to the webhook.
    pub async fn handle_inbound(
        &self,
        from: &str,
        body: &str,
        message_sid: Option<&str>,
    ) -> Result<String> {
        let phone = normalize_phone(strip_whatsapp_prefix(from));
        let Some(candidate) = self.store.get_by_phone(&phone).await? else {
            return Ok(NOT_REGISTERED_MESSAGE.to_string());
        };

        let lock = self.candidate_lock(candidate.id).await;
        let _guard = lock.lock().await;
        // Re-read under the lock; another webhook may have advanced the
        // candidate while we waited.
        let Some(mut candidate) = self.store.get_by_id(candidate.id).await? else {
            return Ok(NOT_REGISTERED_MESSAGE.to_string());
        };

        if candidate.status.is_terminal() {
            return Ok("Interview is already completed.".to_string());
        }

        if body.trim().eq_ignore_ascii_case("start") {
            // START goes through the same replay memo as answers: a
            // retried delivery of the original confirmation must not
            // restart an interview that has since moved on.
            if let Some(sid) = message_sid {
                if let Some(outcome) = self.replayed(candidate.id, sid) {
                    tracing::info!(candidate_id = %candidate.id, sid, "duplicate webhook delivery replayed");
                    return Ok(reply_for(outcome));
                }
            }
            let first = self.start_interview(&mut candidate).await?;
            let reply = format!("Interview started. First question: {}", first);
            if let Some(sid) = message_sid {
                self.remember(
                    candidate.id,
                    sid,
                    &AdvanceOutcome::Reprompt {
                        prompt: reply.clone(),
                    },
                );
            }
            return Ok(reply);
        }

        let outcome = self.advance_guarded(&mut candidate, body, message_sid).await?;
        Ok(reply_for(outcome))
    }

    /// Locked + replay-guarded wrapper around [`Self::advance`] for
    /// callers that have already resolved the candidate (voice IVR).
    pub async fn process_answer(
        &self,
        candidate_id: Uuid,
        raw_answer: &str,
        message_sid: Option<&str>,
    ) -> Result<(Candidate, AdvanceOutcome)> {
        let lock = self.candidate_lock(candidate_id).await;
        let _guard = lock.lock().await;
        let Some(mut candidate) = self.store.get_by_id(candidate_id).await? else {
            return Err(crate::error::Error::NotFound(
                "Candidate not found".to_string(),
            ));
        };
        let outcome = self
            .advance_guarded(&mut candidate, raw_answer, message_sid)
            .await?;
        Ok((candidate, outcome))
    }

    /// Replay guard: providers retry webhook deliveries with the same
    /// message id. Processing the retry again would double-append the
    /// answer and double-advance the cursor, so the retry gets the
    /// outcome the first delivery produced.
    async fn advance_guarded(
        &self,
        candidate: &mut Candidate,
        raw_answer: &str,
        message_sid: Option<&str>,
    ) -> Result<AdvanceOutcome> {
        if let Some(sid) = message_sid {
            if let Some(outcome) = self.replayed(candidate.id, sid) {
                tracing::info!(candidate_id = %candidate.id, sid, "duplicate webhook delivery replayed");
                return Ok(outcome);
            }
        }

        let outcome = self.advance(candidate, raw_answer).await?;

        if candidate.status.is_terminal() {
            self.forget(candidate.id).await;
        } else if let Some(sid) = message_sid {
            self.remember(candidate.id, sid, &outcome);
        }
        Ok(outcome)
    }

    /// The central transition, driven once per inbound answer regardless
    /// of channel.
    pub async fn advance(
        &self,
        candidate: &mut Candidate,
        raw_answer: &str,
    ) -> Result<AdvanceOutcome> {
        if candidate.status.is_terminal() {
            return Ok(AdvanceOutcome::AlreadyComplete);
        }

        // A pending follow-up consumes this answer verbatim and resumes
        // the main sequence without moving the cursor for it.
        if let InterviewPhase::FollowUp { index, question_id } = candidate.phase.clone() {
            candidate.record_answer(&question_id, raw_answer);
            return self.proceed_to(candidate, index + 1).await;
        }

        let index = match &candidate.phase {
            InterviewPhase::Asking { index } => *index,
            InterviewPhase::Concluded => return Ok(AdvanceOutcome::AlreadyComplete),
            InterviewPhase::AwaitingConfirmation => {
                let prompt =
                    "Please reply START when you're ready to begin the interview.".to_string();
                self.send_over_active_channel(candidate, &prompt).await;
                return Ok(AdvanceOutcome::Reprompt { prompt });
            }
            InterviewPhase::FollowUp { .. } => unreachable!("handled above"),
        };

        let Some(question) = self.questions.get(index) else {
            return Ok(AdvanceOutcome::AlreadyComplete);
        };
        let question = question.clone();

        // The weekly-availability question gets a dedicated pre-check
        // before any oracle round-trip.
        if question.id == "availability" && !availability_meets_minimum(raw_answer) {
            self.disqualify(
                candidate,
                "Insufficient availability (less than 3 days per week)",
            )
            .await?;
            self.send_over_active_channel(candidate, AVAILABILITY_DISQUALIFICATION_MESSAGE)
                .await;
            return Ok(AdvanceOutcome::Disqualified {
                message: AVAILABILITY_DISQUALIFICATION_MESSAGE.to_string(),
            });
        }

        let validation = self.interpreter.validate(&question, raw_answer).await;
        if !validation.valid {
            let prompt = format!("Sorry, I didn't catch that. {}", question.prompt_text());
            self.send_over_active_channel(candidate, &prompt).await;
            return Ok(AdvanceOutcome::Reprompt { prompt });
        }

        if let Some(message) = self
            .interpreter
            .should_terminate(&question.id, &validation.normalized)
            .await
        {
            self.disqualify(candidate, &termination_reason(&question.id))
                .await?;
            self.send_over_active_channel(candidate, &message).await;
            return Ok(AdvanceOutcome::Disqualified { message });
        }

        candidate.record_answer(&question.id, &validation.normalized);

        if let Some(follow_up) = question.follow_up_for(&validation.normalized) {
            candidate.phase = InterviewPhase::FollowUp {
                index,
                question_id: follow_up.id.clone(),
            };
            self.store.save(candidate).await?;
            self.send_over_active_channel(candidate, &follow_up.text).await;
            return Ok(AdvanceOutcome::FollowUp {
                prompt: follow_up.text.clone(),
            });
        }

        self.proceed_to(candidate, index + 1).await
    }

    async fn proceed_to(&self, candidate: &mut Candidate, next: usize) -> Result<AdvanceOutcome> {
        if let Some(question) = self.questions.get(next) {
            candidate.phase = InterviewPhase::Asking { index: next };
            self.store.save(candidate).await?;
            let prompt = question.prompt_text();
            self.send_over_active_channel(candidate, &prompt).await;
            return Ok(AdvanceOutcome::NextQuestion { prompt });
        }

        candidate.phase = InterviewPhase::Concluded;
        self.store.save(candidate).await?;
        let message = self.conclude(candidate).await;
        self.send_over_active_channel(candidate, &message).await;
        Ok(AdvanceOutcome::Concluded { message })
    }

    /// Evaluates the finished interview. Evaluation failure parks the
    /// candidate for human review; storage failure marks the candidate
    /// errored. Either way the caller gets a plain message, never an
    /// error.
    async fn conclude(&self, candidate: &mut Candidate) -> String {
        match self.evaluator.evaluate(candidate, &self.questions).await {
            Err(e) => {
                tracing::warn!(candidate_id = %candidate.id, "evaluation failed, parking for review: {}", e);
                candidate.status = CandidateStatus::PendingReview;
                if let Err(e) = self.store.save(candidate).await {
                    tracing::error!(candidate_id = %candidate.id, "failed to persist review status: {}", e);
                }
                PENDING_REVIEW_MESSAGE.to_string()
            }
            Ok(evaluation) => {
                let (status, reason, message) = if evaluation.qualified {
                    (CandidateStatus::Qualified, None, QUALIFIED_MESSAGE)
                } else {
                    (
                        CandidateStatus::Disqualified,
                        Some("Did not meet qualification criteria".to_string()),
                        NOT_QUALIFIED_MESSAGE,
                    )
                };
                candidate.status = status;
                candidate.disqualification_reason = reason;
                candidate.record_scores(evaluation.scores);
                match self.store.save(candidate).await {
                    Ok(()) => message.to_string(),
                    Err(e) => {
                        tracing::error!(candidate_id = %candidate.id, "failed to persist evaluation: {}", e);
                        candidate.status = CandidateStatus::Error;
                        let _ = self
                            .store
                            .update_status(candidate.id, CandidateStatus::Error, None)
                            .await;
                        PROCESSING_ERROR_MESSAGE.to_string()
                    }
                }
            }
        }
    }

    async fn disqualify(&self, candidate: &mut Candidate, reason: &str) -> Result<()> {
        candidate.status = CandidateStatus::Disqualified;
        candidate.disqualification_reason = Some(reason.to_string());
        self.store
            .update_status(
                candidate.id,
                CandidateStatus::Disqualified,
                Some(reason.to_string()),
            )
            .await?;
        Ok(())
    }

    /// (Re)starts the interview at question zero and delivers the first
    /// prompt. Returns the first question text.
    pub async fn start_interview(&self, candidate: &mut Candidate) -> Result<String> {
        candidate.phase = InterviewPhase::start();
        candidate.status = CandidateStatus::InProgress;
        self.store.save(candidate).await?;

        let first = self
            .questions
            .get(0)
            .map(|q| q.prompt_text())
            .unwrap_or_default();
        self.send_over_active_channel(candidate, &first).await;
        Ok(first)
    }

    /// Appends an assistant call's end-of-call transcript verbatim and
    /// concludes the interview. No-op for terminal candidates.
    pub async fn record_assistant_report(
        &self,
        phone: &str,
        transcript: &[(String, String)],
    ) -> Result<()> {
        let normalized = normalize_phone(strip_whatsapp_prefix(phone));
        let Some(candidate) = self.store.get_by_phone(&normalized).await? else {
            return Err(crate::error::Error::NotFound(
                "Candidate not found".to_string(),
            ));
        };

        let lock = self.candidate_lock(candidate.id).await;
        let _guard = lock.lock().await;
        let Some(mut candidate) = self.store.get_by_id(candidate.id).await? else {
            return Ok(());
        };
        if candidate.status.is_terminal() {
            tracing::info!(candidate_id = %candidate.id, "ignoring report for terminal candidate");
            return Ok(());
        }

        for (role, message) in transcript {
            candidate.record_transcript(role, message);
        }
        candidate.phase = InterviewPhase::Concluded;
        self.store.save(&candidate).await?;
        let _ = self.conclude(&mut candidate).await;
        self.forget(candidate.id).await;
        Ok(())
    }

    /// Delivers a prompt over the candidate's active channel when that
    /// channel is a messaging one. Voice channels speak their prompts in
    /// the call leg, and delivery failures only warn: the interview
    /// state has already been persisted.
    async fn send_over_active_channel(&self, candidate: &Candidate, body: &str) {
        let Some(method) = candidate.communication_method else {
            return;
        };
        if !method.is_messaging() {
            return;
        }
        let channel = match method {
            CommunicationMethod::WhatsappMessage => MessageChannel::Whatsapp,
            _ => MessageChannel::Sms,
        };
        self.best_effort_send(channel, candidate, body).await;
    }

    async fn best_effort_send(&self, channel: MessageChannel, candidate: &Candidate, body: &str) {
        if let Err(e) = self
            .channel
            .send_message(channel, &candidate.phone, body)
            .await
        {
            tracing::warn!(candidate_id = %candidate.id, "outbound message failed: {}", e);
        }
    }
}

/// Webhook acknowledgement for an inbound text; the substantive prompts
/// were already sent over the candidate's channel.
fn reply_for(outcome: AdvanceOutcome) -> String {
    match outcome {
        AdvanceOutcome::AlreadyComplete => "Interview is already completed.".to_string(),
        AdvanceOutcome::Reprompt { prompt } => prompt,
        AdvanceOutcome::FollowUp { .. } => "Please answer the follow-up question.".to_string(),
        AdvanceOutcome::NextQuestion { .. } => "Answer recorded. Next question sent.".to_string(),
        AdvanceOutcome::Disqualified { message } => message,
        AdvanceOutcome::Concluded { message } => message,
    }
}

fn welcome_message(name: &str) -> String {
    format!(
        "Hi {}! Welcome to our recruitment process. I'll be your interview bot today. Please \
         reply 'START' when you're ready to begin the interview. The process will take about \
         15-20 minutes.",
        name
    )
}

fn termination_reason(question_id: &str) -> String {
    match question_id {
        "work_eligibility" => "Not eligible to work in the UK".to_string(),
        "availability" => "Insufficient availability (less than 3 days per week)".to_string(),
        "location" => "Location outside the UK".to_string(),
        other => format!("Disqualifying answer to {}", other),
    }
}

/// Weekly-availability pre-check. Fail-open: ambiguous answers without a
/// parseable day count qualify and move on to the oracle.
pub fn availability_meets_minimum(raw_answer: &str) -> bool {
    let answer = raw_answer.to_lowercase();
    if ["1 day", "one day", "2 days", "two days"]
        .iter()
        .any(|phrase| answer.contains(phrase))
    {
        return false;
    }

    let first_number: Option<i64> = {
        let digits: String = answer
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    };
    match first_number {
        Some(days) => days > 2,
        None => true,
    }
}
