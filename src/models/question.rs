use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Expected shape of an answer, used to pick the normalization prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    Boolean,
    Number,
    Choice,
    FreeText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpQuestion {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub answer_type: AnswerType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    /// Maps a specific normalized answer value to an extra question
    /// asked immediately, without consuming a cursor increment.
    #[serde(default)]
    pub follow_up: Option<HashMap<String, FollowUpQuestion>>,
}

impl Question {
    /// The prompt as sent over a text channel; choice questions list
    /// their options as bullets.
    pub fn prompt_text(&self) -> String {
        match &self.options {
            Some(options) if self.answer_type == AnswerType::Choice => {
                let bullets = options
                    .iter()
                    .map(|opt| format!("\u{2022} {}", opt))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{}\n\nOptions:\n{}", self.text, bullets)
            }
            _ => self.text.clone(),
        }
    }

    pub fn follow_up_for(&self, answer: &str) -> Option<&FollowUpQuestion> {
        self.follow_up.as_ref()?.get(answer)
    }
}

#[derive(Debug, Deserialize)]
struct QuestionFile {
    questions: Vec<Question>,
}

/// The static, ordered interview battery. Loaded once at startup from
/// the embedded question file and read-only thereafter.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

static QUESTION_DATA: &str = include_str!("../../data/questions.json");

impl QuestionBank {
    pub fn load() -> crate::error::Result<Self> {
        let file: QuestionFile = serde_json::from_str(QUESTION_DATA)?;
        Ok(Self {
            questions: file.questions,
        })
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn by_id(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Resolves the question text for an id, including follow-up ids
    /// that only exist inside a parent question's follow-up map.
    pub fn text_for_id(&self, id: &str) -> Option<&str> {
        if let Some(question) = self.by_id(id) {
            return Some(&question.text);
        }
        self.questions
            .iter()
            .filter_map(|q| q.follow_up.as_ref())
            .flat_map(|map| map.values())
            .find(|f| f.id == id)
            .map(|f| f.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_question_file_parses() {
        let bank = QuestionBank::load().unwrap();
        assert!(bank.len() >= 10);
        assert_eq!(bank.get(0).unwrap().id, "location");
        assert!(bank.by_id("availability").is_some());
    }

    #[test]
    fn follow_ups_are_keyed_by_answer_value() {
        let bank = QuestionBank::load().unwrap();
        let immediate_start = bank.by_id("immediate_start").unwrap();
        let follow_up = immediate_start.follow_up_for("No").unwrap();
        assert_eq!(follow_up.id, "earliest_start_date");
        assert!(immediate_start.follow_up_for("Yes").is_none());
    }

    #[test]
    fn choice_prompts_list_options() {
        let question = Question {
            id: "q".to_string(),
            text: "Pick one".to_string(),
            answer_type: AnswerType::Choice,
            options: Some(vec!["A".to_string(), "B".to_string()]),
            follow_up: None,
        };
        let prompt = question.prompt_text();
        assert!(prompt.contains("Options:"));
        assert!(prompt.contains("\u{2022} A"));
    }
}
