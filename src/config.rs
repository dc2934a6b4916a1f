use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub base_url: String,
    pub webhook_secret: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_phone: String,
    pub twilio_whatsapp_number: String,
    pub vapi_api_key: String,
    pub vapi_phone_number_id: String,
    pub vapi_voice_id: String,
    pub eleven_labs_api_key: String,
    pub eleven_labs_voice_id: String,
    pub openai_api_key: String,
    pub audio_dir: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            base_url: get_env("BASE_URL")?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            twilio_account_sid: get_env("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: get_env("TWILIO_AUTH_TOKEN")?,
            twilio_from_phone: get_env("TWILIO_FROM_PHONE")?,
            twilio_whatsapp_number: get_env("TWILIO_WHATSAPP_NUMBER")?,
            vapi_api_key: get_env("VAPI_API_KEY")?,
            vapi_phone_number_id: get_env("VAPI_PHONE_NUMBER_ID")?,
            vapi_voice_id: get_env("VAPI_VOICE_ID")?,
            eleven_labs_api_key: get_env("ELEVEN_LABS_API_KEY")?,
            eleven_labs_voice_id: get_env("ELEVEN_LABS_VOICE_ID")?,
            openai_api_key: get_env("OPENAI_API_KEY")?,
            audio_dir: env::var("AUDIO_DIR").unwrap_or_else(|_| "static/audio".to_string()),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
