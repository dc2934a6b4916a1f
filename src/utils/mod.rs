pub mod phone;
pub mod twiml;
