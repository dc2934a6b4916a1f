use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::models::question::QuestionBank;
use crate::services::interpreter_service::TextOracle;
use std::collections::HashMap;
use std::sync::Arc;

/// Mean rubric score required to qualify.
pub const QUALIFICATION_THRESHOLD: f64 = 0.70;

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub qualified: bool,
    pub scores: HashMap<String, f64>,
    pub overall_score: f64,
}

/// Scores a finished interview against a fixed rubric via the oracle.
/// Failures surface as `Err` so the state machine can fall back to
/// pending review instead of hard-failing the candidate.
#[derive(Clone)]
pub struct EvaluationService {
    oracle: Arc<dyn TextOracle>,
}

const EVALUATOR_SYSTEM_PROMPT: &str =
    "You are an unbiased recruitment evaluator. Score the candidate on each criterion from 0 to \
     1, where 1 is excellent and 0 is poor. Return exactly this JSON format: \
     {\"evaluation\": {\"experience\": 0.0, \"availability\": 0.0, \"location\": 0.0, \
     \"motivation\": 0.0}}";

impl EvaluationService {
    pub fn new(oracle: Arc<dyn TextOracle>) -> Self {
        Self { oracle }
    }

    pub async fn evaluate(&self, candidate: &Candidate, bank: &QuestionBank) -> Result<Evaluation> {
        let prompt = self.build_prompt(candidate, bank);
        let response = self.oracle.complete(EVALUATOR_SYSTEM_PROMPT, &prompt).await?;

        let scores: HashMap<String, f64> = response
            .get("evaluation")
            .and_then(|v| v.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_f64().map(|score| (k.clone(), score)))
                    .collect()
            })
            .unwrap_or_default();

        if scores.is_empty() {
            return Err(Error::Oracle(
                "evaluation response contained no scores".to_string(),
            ));
        }

        let overall_score = scores.values().sum::<f64>() / scores.len() as f64;
        Ok(Evaluation {
            qualified: overall_score >= QUALIFICATION_THRESHOLD,
            scores,
            overall_score,
        })
    }

    fn build_prompt(&self, candidate: &Candidate, bank: &QuestionBank) -> String {
        let mut prompt = String::from(
            "Please evaluate this teaching assistant candidate based on their interview \
             answers. Score each criterion from 0 to 1, where 1 is excellent and 0 is poor.\n\n\
             Criteria:\n\
             - experience: experience with children and in schools\n\
             - availability: minimum 3 days per week required\n\
             - location: location and travel capabilities\n\
             - motivation: motivation and commitment to working in schools\n\n",
        );

        for record in candidate.answer_records() {
            if let Some(text) = bank.text_for_id(&record.question) {
                prompt.push_str(&format!("Question: {}\nAnswer: {}\n\n", text, record.answer));
            }
        }

        // Voice-channel interviews carry their answers in the raw call
        // transcript rather than per-question records.
        let transcript: Vec<String> = candidate
            .transcript_chunks()
            .map(|chunk| format!("{}: {}", chunk.role, chunk.message))
            .collect();
        if !transcript.is_empty() {
            prompt.push_str("Call transcript:\n");
            prompt.push_str(&transcript.join("\n"));
            prompt.push('\n');
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{CandidateStatus, InterviewPhase};
    use crate::services::interpreter_service::MockTextOracle;
    use uuid::Uuid;

    fn finished_candidate() -> Candidate {
        let mut candidate = Candidate {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            phone: "+447700900123".to_string(),
            email: "t@example.com".to_string(),
            status: CandidateStatus::InProgress,
            phase: InterviewPhase::Concluded,
            communication_method: None,
            answers: vec![],
            disqualification_reason: None,
            created_at: None,
            updated_at: None,
        };
        candidate.record_answer("location", "Leeds");
        candidate.record_answer("availability", "4");
        candidate.record_answer("motivation", "I enjoy helping children learn");
        candidate
    }

    #[tokio::test]
    async fn mean_at_or_above_threshold_qualifies() {
        let mut oracle = MockTextOracle::new();
        oracle.expect_complete().returning(|_, _| {
            Ok(serde_json::json!({
                "evaluation": {
                    "experience": 0.9,
                    "availability": 0.8,
                    "location": 0.75,
                    "motivation": 0.83
                }
            }))
        });
        let service = EvaluationService::new(Arc::new(oracle));
        let bank = QuestionBank::load().unwrap();

        let evaluation = service.evaluate(&finished_candidate(), &bank).await.unwrap();
        assert!(evaluation.qualified);
        assert!((evaluation.overall_score - 0.82).abs() < 1e-9);
        assert_eq!(evaluation.scores.len(), 4);
    }

    #[tokio::test]
    async fn mean_below_threshold_disqualifies() {
        let mut oracle = MockTextOracle::new();
        oracle.expect_complete().returning(|_, _| {
            Ok(serde_json::json!({
                "evaluation": {
                    "experience": 0.5,
                    "availability": 0.9,
                    "location": 0.6,
                    "motivation": 0.4
                }
            }))
        });
        let service = EvaluationService::new(Arc::new(oracle));
        let bank = QuestionBank::load().unwrap();

        let evaluation = service.evaluate(&finished_candidate(), &bank).await.unwrap();
        assert!(!evaluation.qualified);
    }

    #[tokio::test]
    async fn oracle_failure_surfaces_as_error() {
        let mut oracle = MockTextOracle::new();
        oracle
            .expect_complete()
            .returning(|_, _| Err(Error::Oracle("unavailable".to_string())));
        let service = EvaluationService::new(Arc::new(oracle));
        let bank = QuestionBank::load().unwrap();

        assert!(service.evaluate(&finished_candidate(), &bank).await.is_err());
    }

    #[tokio::test]
    async fn prompt_joins_answers_with_question_text() {
        let service = EvaluationService::new(Arc::new(MockTextOracle::new()));
        let bank = QuestionBank::load().unwrap();
        let prompt = service.build_prompt(&finished_candidate(), &bank);

        assert!(prompt.contains("Where are you currently based?"));
        assert!(prompt.contains("Answer: Leeds"));
        assert!(prompt.contains("What motivates you to work in schools?"));
    }
}
