pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::models::question::QuestionBank;
use crate::services::candidate_service::CandidateStore;
use crate::services::channel_service::ChannelAdapter;
use crate::services::interpreter_service::TextOracle;
use crate::services::interview_service::InterviewService;
use crate::services::speech_service::SpeechSynthesizer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub interview: InterviewService,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    /// Collaborators are injected so the binary can wire the real
    /// Twilio/OpenAI/ElevenLabs clients while tests substitute fakes.
    pub fn new(
        store: Arc<dyn CandidateStore>,
        channel: Arc<dyn ChannelAdapter>,
        oracle: Arc<dyn TextOracle>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> error::Result<Self> {
        let questions = Arc::new(QuestionBank::load()?);
        Ok(Self {
            interview: InterviewService::new(store, channel, oracle, questions),
            speech,
        })
    }
}
