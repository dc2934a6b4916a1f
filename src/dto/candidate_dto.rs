use crate::models::candidate::{Candidate, CandidateStatus, CommunicationMethod, InterviewPhase};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterCandidatePayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: uuid::Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub status: CandidateStatus,
    pub communication_method: Option<CommunicationMethod>,
}

impl From<&Candidate> for CandidateSummary {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name.clone(),
            phone: candidate.phone.clone(),
            email: candidate.email.clone(),
            status: candidate.status,
            communication_method: candidate.communication_method,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCandidateResponse {
    pub status: String,
    pub message: String,
    pub data: CandidateSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationStatusResponse {
    pub status: CandidateStatus,
    pub completed_questions: usize,
    pub total_questions: usize,
    pub qualified: bool,
}

impl QualificationStatusResponse {
    pub fn from_candidate(candidate: &Candidate, total_questions: usize) -> Self {
        let completed_questions = match &candidate.phase {
            InterviewPhase::Asking { index } => *index,
            InterviewPhase::FollowUp { index, .. } => *index,
            InterviewPhase::Concluded => total_questions,
            InterviewPhase::AwaitingConfirmation => 0,
        };
        Self {
            status: candidate.status,
            completed_questions,
            total_questions,
            qualified: candidate.status == CandidateStatus::Qualified,
        }
    }
}
