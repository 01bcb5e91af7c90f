//! Application Configuration Module
//!
//! Loads the interview service settings from environment variables (and a
//! `.env` file when present) into a single struct that the binary hands to
//! the HTTP client, the console engines and the session runner.

use interview_core::config::{
    ControllerConfig, DEFAULT_LISTEN_GAP, DEFAULT_LOCALE, DEFAULT_SILENCE_TIMEOUT,
    DEFAULT_STOP_PHRASE, Endpointing, TurnGating,
};
use std::env;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Console synthesizer pacing per spoken word.
pub const DEFAULT_SPEAK_WORD_MS: u64 = 300;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub question_service_url: String,
    pub request_timeout: Duration,
    pub speak_word: Duration,
    pub log_level: Level,
    pub controller: ControllerConfig,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `QUESTION_SERVICE_URL`: Base URL of the question service. Defaults to "http://127.0.0.1:4000".
    // *   `REQUEST_TIMEOUT_MS`: HTTP timeout. Defaults to 10000.
    // *   `SILENCE_TIMEOUT_MS`: Silence that ends an answer. Defaults to 5000.
    // *   `LISTEN_GAP_MS`: Pause between speaking and listening. Defaults to 1000.
    // *   `TURN_GATING`: "tts-gated" or "tight-loop". Defaults to "tts-gated".
    // *   `ENDPOINTING`: "silence" or "keyword". Defaults to "silence".
    // *   `STOP_PHRASES`: Comma-separated phrases ending an answer in keyword mode. Defaults to "готово".
    // *   `SPEECH_LOCALE`: Locale for recognition and synthesis. Defaults to "ru-RU".
    // *   `SPEAK_WORD_MS`: Console synthesizer pacing per word. Defaults to 300.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let question_service_url = lookup("QUESTION_SERVICE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let request_timeout = millis(&lookup, "REQUEST_TIMEOUT_MS")?
            .unwrap_or(Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS));
        let silence_timeout =
            millis(&lookup, "SILENCE_TIMEOUT_MS")?.unwrap_or(DEFAULT_SILENCE_TIMEOUT);
        let listen_gap = millis(&lookup, "LISTEN_GAP_MS")?.unwrap_or(DEFAULT_LISTEN_GAP);
        let speak_word = millis(&lookup, "SPEAK_WORD_MS")?
            .unwrap_or(Duration::from_millis(DEFAULT_SPEAK_WORD_MS));

        if silence_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "SILENCE_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let turn_gating = match lookup("TURN_GATING").as_deref().map(str::trim) {
            None | Some("") | Some("tts-gated") => TurnGating::TtsGated,
            Some("tight-loop") => TurnGating::TightLoop,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "TURN_GATING".to_string(),
                    format!("expected tts-gated or tight-loop, got {other:?}"),
                ));
            }
        };

        let endpointing = match lookup("ENDPOINTING").as_deref().map(str::trim) {
            None | Some("") | Some("silence") => Endpointing::SilenceOnly,
            Some("keyword") => Endpointing::SilenceOrKeyword,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "ENDPOINTING".to_string(),
                    format!("expected silence or keyword, got {other:?}"),
                ));
            }
        };

        let stop_phrases: Vec<String> = lookup("STOP_PHRASES")
            .unwrap_or_else(|| DEFAULT_STOP_PHRASE.to_string())
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if endpointing == Endpointing::SilenceOrKeyword && stop_phrases.is_empty() {
            return Err(ConfigError::InvalidValue(
                "STOP_PHRASES".to_string(),
                "keyword endpointing needs at least one stop phrase".to_string(),
            ));
        }

        let locale = lookup("SPEECH_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        let controller = ControllerConfig::default()
            .with_turn_gating(turn_gating)
            .with_endpointing(endpointing)
            .with_silence_timeout(silence_timeout)
            .with_listen_gap(listen_gap)
            .with_stop_phrases(stop_phrases)
            .with_locale(&locale);

        Ok(Self {
            question_service_url,
            request_timeout,
            speak_word,
            log_level,
            controller,
        })
    }
}

fn millis<F>(lookup: &F, name: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}
