pub mod candidate_dto;
pub mod webhook_dto;
