use crate::error::{Error, Result};
use crate::models::candidate::{
    Candidate, CandidateStatus, CommunicationMethod, InterviewPhase,
};
use crate::utils::phone::normalize_phone;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Persistence boundary for candidates. The interview state machine only
/// sees this trait; production wires in [`PgCandidateStore`], tests an
/// in-memory implementation.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn create(&self, fields: NewCandidate) -> Result<Candidate>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Candidate>>;
    async fn get_by_phone(&self, phone: &str) -> Result<Option<Candidate>>;
    async fn get_by_email(&self, email: &str) -> Result<Option<Candidate>>;
    async fn save(&self, candidate: &Candidate) -> Result<()>;
    async fn update_status(
        &self,
        id: Uuid,
        status: CandidateStatus,
        disqualification_reason: Option<String>,
    ) -> Result<Option<Candidate>>;
}

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CandidateRow {
    id: Uuid,
    name: String,
    phone: String,
    email: String,
    status: String,
    phase: JsonValue,
    communication_method: Option<String>,
    answers: JsonValue,
    disqualification_reason: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl CandidateRow {
    fn into_candidate(self) -> Result<Candidate> {
        let status = CandidateStatus::from_str(&self.status).map_err(Error::State)?;
        let phase: InterviewPhase = serde_json::from_value(self.phase)
            .map_err(|e| Error::State(format!("unreadable interview phase: {}", e)))?;
        let communication_method = match self.communication_method {
            Some(raw) => Some(CommunicationMethod::from_str(&raw).map_err(Error::State)?),
            None => None,
        };
        // A log that no longer parses is reset to empty instead of
        // blocking the candidate.
        let answers = serde_json::from_value(self.answers).unwrap_or_else(|e| {
            tracing::warn!(candidate_id = %self.id, "resetting unreadable answer log: {}", e);
            Vec::new()
        });

        Ok(Candidate {
            id: self.id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            status,
            phase,
            communication_method,
            answers,
            disqualification_reason: self.disqualification_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const CANDIDATE_COLUMNS: &str = "id, name, phone, email, status, phase, communication_method, \
     answers, disqualification_reason, created_at, updated_at";

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn create(&self, fields: NewCandidate) -> Result<Candidate> {
        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM candidates WHERE email = $1")
            .bind(&fields.email)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(Error::BadRequest(
                "A candidate with this email address already exists.".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            r#"
            INSERT INTO candidates (name, phone, email)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        ))
        .bind(&fields.name)
        .bind(normalize_phone(&fields.phone))
        .bind(&fields.email)
        .fetch_one(&self.pool)
        .await?;

        row.into_candidate()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {} FROM candidates WHERE id = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CandidateRow::into_candidate).transpose()
    }

    async fn get_by_phone(&self, phone: &str) -> Result<Option<Candidate>> {
        // Both sides are reduced to digits and a leading plus so any
        // provider formatting matches the stored number.
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            r#"
            SELECT {} FROM candidates
            WHERE regexp_replace(phone, '[^0-9+]', '', 'g') = $1
            "#,
            CANDIDATE_COLUMNS
        ))
        .bind(normalize_phone(phone))
        .fetch_optional(&self.pool)
        .await?;
        row.map(CandidateRow::into_candidate).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "SELECT {} FROM candidates WHERE email = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CandidateRow::into_candidate).transpose()
    }

    async fn save(&self, candidate: &Candidate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE candidates
            SET status = $1,
                phase = $2,
                communication_method = $3,
                answers = $4,
                disqualification_reason = $5,
                updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(candidate.status.as_str())
        .bind(serde_json::to_value(&candidate.phase)?)
        .bind(candidate.communication_method.map(|m| m.as_str()))
        .bind(serde_json::to_value(&candidate.answers)?)
        .bind(&candidate.disqualification_reason)
        .bind(candidate.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: CandidateStatus,
        disqualification_reason: Option<String>,
    ) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            r#"
            UPDATE candidates
            SET status = $1, disqualification_reason = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        ))
        .bind(status.as_str())
        .bind(disqualification_reason)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CandidateRow::into_candidate).transpose()
    }
}

/// In-memory store used by the test suite and local runs without
/// Postgres. Same lookup semantics as [`PgCandidateStore`].
#[derive(Default)]
pub struct MemoryCandidateStore {
    candidates: std::sync::Mutex<HashMap<Uuid, Candidate>>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CandidateStore for MemoryCandidateStore {
    async fn create(&self, fields: NewCandidate) -> Result<Candidate> {
        let mut candidates = self.candidates.lock().unwrap();
        if candidates.values().any(|c| c.email == fields.email) {
            return Err(Error::BadRequest(
                "A candidate with this email address already exists.".to_string(),
            ));
        }
        let candidate = Candidate {
            id: Uuid::new_v4(),
            name: fields.name,
            phone: normalize_phone(&fields.phone),
            email: fields.email,
            status: CandidateStatus::Registered,
            phase: InterviewPhase::AwaitingConfirmation,
            communication_method: None,
            answers: vec![],
            disqualification_reason: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(self.candidates.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_phone(&self, phone: &str) -> Result<Option<Candidate>> {
        let normalized = normalize_phone(phone);
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .values()
            .find(|c| normalize_phone(&c.phone) == normalized)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn save(&self, candidate: &Candidate) -> Result<()> {
        self.candidates
            .lock()
            .unwrap()
            .insert(candidate.id, candidate.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: CandidateStatus,
        disqualification_reason: Option<String>,
    ) -> Result<Option<Candidate>> {
        let mut candidates = self.candidates.lock().unwrap();
        let Some(candidate) = candidates.get_mut(&id) else {
            return Ok(None);
        };
        candidate.status = status;
        if disqualification_reason.is_some() {
            candidate.disqualification_reason = disqualification_reason;
        }
        candidate.updated_at = Some(Utc::now());
        Ok(Some(candidate.clone()))
    }
}
