use std::time::Duration;

pub const DEFAULT_SILENCE_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_LISTEN_GAP: Duration = Duration::from_millis(1000);
pub const DEFAULT_PLACEHOLDER_QUESTION: &str = "Ошибка загрузки вопроса";
pub const DEFAULT_LOCALE: &str = "ru-RU";
pub const DEFAULT_STOP_PHRASE: &str = "готово";

/// How speech output gates speech input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnGating {
    /// Listening (re)starts as soon as output finishes or the recognizer fails.
    TightLoop,
    /// Listening waits out the listen gap after output finishes or the recognizer fails.
    TtsGated,
}

/// What may end a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpointing {
    /// Silence timeout with a non-empty transcript, or a final transcript.
    SilenceOnly,
    /// As `SilenceOnly`, plus a spoken stop phrase ends the turn immediately.
    SilenceOrKeyword,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub turn_gating: TurnGating,
    pub endpointing: Endpointing,
    pub silence_timeout: Duration,
    pub listen_gap: Duration,
    pub stop_phrases: Vec<String>,
    pub placeholder_question: String,
    pub locale: String,
    pub prefer_offline: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            turn_gating: TurnGating::TtsGated,
            endpointing: Endpointing::SilenceOnly,
            silence_timeout: DEFAULT_SILENCE_TIMEOUT,
            listen_gap: DEFAULT_LISTEN_GAP,
            stop_phrases: vec![DEFAULT_STOP_PHRASE.to_string()],
            placeholder_question: DEFAULT_PLACEHOLDER_QUESTION.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            prefer_offline: true,
        }
    }
}

impl ControllerConfig {
    pub fn with_turn_gating(mut self, turn_gating: TurnGating) -> Self {
        self.turn_gating = turn_gating;
        self
    }

    pub fn with_endpointing(mut self, endpointing: Endpointing) -> Self {
        self.endpointing = endpointing;
        self
    }

    pub fn with_silence_timeout(mut self, timeout: Duration) -> Self {
        self.silence_timeout = timeout;
        self
    }

    pub fn with_listen_gap(mut self, gap: Duration) -> Self {
        self.listen_gap = gap;
        self
    }

    pub fn with_stop_phrases(mut self, phrases: Vec<String>) -> Self {
        self.stop_phrases = phrases;
        self
    }

    pub fn with_placeholder_question(mut self, text: &str) -> Self {
        self.placeholder_question = text.to_string();
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    /// The pause before a listening attempt actually starts.
    pub fn effective_listen_gap(&self) -> Duration {
        match self.turn_gating {
            TurnGating::TightLoop => Duration::ZERO,
            TurnGating::TtsGated => self.listen_gap,
        }
    }

    /// The pause before listening again after a recognizer error. Never zero,
    /// whatever the gating, so a recognizer that keeps failing is not restarted
    /// in a busy loop.
    pub fn recovery_gap(&self) -> Duration {
        if self.listen_gap.is_zero() {
            DEFAULT_LISTEN_GAP
        } else {
            self.listen_gap
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tight_loop_has_no_listen_gap() {
        let config = ControllerConfig::default().with_turn_gating(TurnGating::TightLoop);
        assert_eq!(config.effective_listen_gap(), Duration::ZERO);

        let gated = ControllerConfig::default();
        assert_eq!(gated.effective_listen_gap(), DEFAULT_LISTEN_GAP);
    }

    #[test]
    fn test_recovery_gap_is_never_zero() {
        let config = ControllerConfig::default().with_turn_gating(TurnGating::TightLoop);
        assert_eq!(config.recovery_gap(), DEFAULT_LISTEN_GAP);

        let config = config.with_listen_gap(Duration::ZERO);
        assert_eq!(config.recovery_gap(), DEFAULT_LISTEN_GAP);

        let config = config.with_listen_gap(Duration::from_millis(250));
        assert_eq!(config.recovery_gap(), Duration::from_millis(250));
    }
}
