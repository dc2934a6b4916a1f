pub mod candidate_service;
pub mod channel_service;
pub mod evaluation_service;
pub mod interpreter_service;
pub mod interview_service;
pub mod speech_service;
