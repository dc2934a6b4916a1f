use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Registered,
    InProgress,
    Pending,
    PendingReview,
    Qualified,
    Disqualified,
    Error,
}

impl CandidateStatus {
    /// Terminal statuses are absorbing: no further question is sent and
    /// no further answer is accepted once one is reached.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CandidateStatus::Qualified
                | CandidateStatus::Disqualified
                | CandidateStatus::PendingReview
                | CandidateStatus::Error
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Registered => "registered",
            CandidateStatus::InProgress => "in_progress",
            CandidateStatus::Pending => "pending",
            CandidateStatus::PendingReview => "pending_review",
            CandidateStatus::Qualified => "qualified",
            CandidateStatus::Disqualified => "disqualified",
            CandidateStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(CandidateStatus::Registered),
            "in_progress" => Ok(CandidateStatus::InProgress),
            "pending" => Ok(CandidateStatus::Pending),
            "pending_review" => Ok(CandidateStatus::PendingReview),
            "qualified" => Ok(CandidateStatus::Qualified),
            "disqualified" => Ok(CandidateStatus::Disqualified),
            "error" => Ok(CandidateStatus::Error),
            other => Err(format!("unknown candidate status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationMethod {
    VoiceCall,
    WhatsappCall,
    WhatsappMessage,
    Sms,
}

impl CommunicationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationMethod::VoiceCall => "voice_call",
            CommunicationMethod::WhatsappCall => "whatsapp_call",
            CommunicationMethod::WhatsappMessage => "whatsapp_message",
            CommunicationMethod::Sms => "sms",
        }
    }

    /// Text channels deliver prompts as outbound messages; the voice
    /// channels speak them inside the IVR/assistant leg instead.
    pub fn is_messaging(&self) -> bool {
        matches!(
            self,
            CommunicationMethod::WhatsappMessage | CommunicationMethod::Sms
        )
    }
}

impl std::str::FromStr for CommunicationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voice_call" => Ok(CommunicationMethod::VoiceCall),
            "whatsapp_call" => Ok(CommunicationMethod::WhatsappCall),
            "whatsapp_message" => Ok(CommunicationMethod::WhatsappMessage),
            "sms" => Ok(CommunicationMethod::Sms),
            other => Err(format!("unknown communication method: {}", other)),
        }
    }
}

/// Where the candidate sits in the interview.
///
/// The cursor inside `Asking` only ever moves forward; restarting the
/// interview resets it to zero through [`InterviewPhase::start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum InterviewPhase {
    /// Contact was made but the candidate has not confirmed the start
    /// (waiting for `START` over SMS/WhatsApp, or "press 1" on voice).
    AwaitingConfirmation,
    Asking { index: usize },
    /// A conditional follow-up was triggered at `index`; the next answer
    /// is recorded under `question_id` and does not move the cursor.
    FollowUp { index: usize, question_id: String },
    Concluded,
}

impl InterviewPhase {
    pub fn start() -> Self {
        InterviewPhase::Asking { index: 0 }
    }

    pub fn cursor(&self) -> Option<usize> {
        match self {
            InterviewPhase::Asking { index } => Some(*index),
            InterviewPhase::FollowUp { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// One record in a candidate's append-only answer log.
///
/// The log mixes three shapes: per-question answers, the evaluation
/// scores entry, and (voice channel) transcript lines copied verbatim
/// from the provider's end-of-call report. Untagged serde keeps the
/// stored JSON identical to what each producer emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerLogEntry {
    Answer(AnswerRecord),
    Scores(ScoreRecord),
    Transcript(TranscriptChunk),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub evaluation_scores: HashMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub role: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub status: CandidateStatus,
    pub phase: InterviewPhase,
    pub communication_method: Option<CommunicationMethod>,
    pub answers: Vec<AnswerLogEntry>,
    pub disqualification_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn record_answer(&mut self, question_id: &str, answer: &str) {
        self.answers.push(AnswerLogEntry::Answer(AnswerRecord {
            question: question_id.to_string(),
            answer: answer.to_string(),
            timestamp: Utc::now(),
        }));
    }

    pub fn record_scores(&mut self, scores: HashMap<String, f64>) {
        self.answers.push(AnswerLogEntry::Scores(ScoreRecord {
            evaluation_scores: scores,
            timestamp: Utc::now(),
        }));
    }

    pub fn record_transcript(&mut self, role: &str, message: &str) {
        self.answers.push(AnswerLogEntry::Transcript(TranscriptChunk {
            role: role.to_string(),
            message: message.to_string(),
        }));
    }

    pub fn answer_records(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.answers.iter().filter_map(|entry| match entry {
            AnswerLogEntry::Answer(record) => Some(record),
            _ => None,
        })
    }

    pub fn transcript_chunks(&self) -> impl Iterator<Item = &TranscriptChunk> {
        self.answers.iter().filter_map(|entry| match entry {
            AnswerLogEntry::Transcript(chunk) => Some(chunk),
            _ => None,
        })
    }
}
