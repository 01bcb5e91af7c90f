//! Speech output adapter.
//!
//! One utterance at a time. Speaking while an utterance is active flushes it
//! first, and once cancelled an utterance never reports done or error to the
//! controller.

use crate::{Event, UtteranceId};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    Start,
    Done,
    Error(String),
}

impl SynthesisEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SynthesisEvent::Done | SynthesisEvent::Error(_))
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisSink {
    utterance: UtteranceId,
    events: UnboundedSender<Event>,
}

impl SynthesisSink {
    pub fn new(utterance: UtteranceId, events: UnboundedSender<Event>) -> Self {
        Self { utterance, events }
    }

    pub fn utterance(&self) -> UtteranceId {
        self.utterance
    }

    pub fn emit(&self, event: SynthesisEvent) -> bool {
        self.events
            .send(Event::Synthesis {
                utterance: self.utterance,
                event,
            })
            .is_ok()
    }
}

/// A voice offered by the synthesis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    pub locale: String,
    pub requires_network: bool,
}

/// The platform speech synthesizer.
pub trait SynthesisEngine: Send {
    fn voices(&self) -> Vec<VoiceInfo>;

    fn use_voice(&mut self, voice: &VoiceInfo);

    /// Starts speaking `text`. Lifecycle events go through `sink`.
    fn speak(&mut self, text: &str, sink: SynthesisSink) -> Result<(), String>;

    fn cancel(&mut self);
}

/// Picks a voice for `locale`, preferring one that works offline when asked to.
pub fn select_voice<'a>(
    voices: &'a [VoiceInfo],
    locale: &str,
    prefer_offline: bool,
) -> Option<&'a VoiceInfo> {
    let wanted = normalize_locale(locale);
    let mut matching = voices
        .iter()
        .filter(|v| normalize_locale(&v.locale) == wanted)
        .peekable();
    matching.peek()?;

    if prefer_offline {
        let candidates: Vec<&VoiceInfo> = matching.collect();
        candidates
            .iter()
            .find(|v| !v.requires_network)
            .or_else(|| candidates.first())
            .copied()
    } else {
        matching.next()
    }
}

fn normalize_locale(locale: &str) -> String {
    locale.replace('_', "-").to_lowercase()
}

pub struct SpeechOutputAdapter<E> {
    engine: E,
    events: UnboundedSender<Event>,
    active: Option<UtteranceId>,
}

impl<E: SynthesisEngine> SpeechOutputAdapter<E> {
    pub fn new(engine: E, events: UnboundedSender<Event>) -> Self {
        Self {
            engine,
            events,
            active: None,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.active.is_some()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Voice selection, done once before the session starts.
    pub fn init_voice(&mut self, locale: &str, prefer_offline: bool) -> Option<VoiceInfo> {
        let voices = self.engine.voices();
        let Some(voice) = select_voice(&voices, locale, prefer_offline).cloned() else {
            tracing::warn!("no voice available for {}; using the engine default", locale);
            return None;
        };

        if prefer_offline && voice.requires_network {
            tracing::warn!("no offline voice for {}; falling back to {}", locale, voice.name);
        } else {
            tracing::info!("using voice {} ({})", voice.name, voice.locale);
        }
        self.engine.use_voice(&voice);
        Some(voice)
    }

    pub fn speak(&mut self, text: &str, utterance: UtteranceId) {
        if self.active.is_some() {
            self.cancel();
        }

        let sink = SynthesisSink::new(utterance, self.events.clone());
        self.active = Some(utterance);
        tracing::debug!("speaking {}: {:?}", utterance, text);

        if let Err(reason) = self.engine.speak(text, sink.clone()) {
            tracing::warn!("synthesizer refused {}: {}", utterance, reason);
            sink.emit(SynthesisEvent::Error(reason));
        }
    }

    pub fn cancel(&mut self) {
        if let Some(utterance) = self.active.take() {
            tracing::debug!("cancelling utterance {}", utterance);
            self.engine.cancel();
        }
    }

    /// Returns false for events of an utterance that is no longer active.
    pub fn accept(&mut self, utterance: UtteranceId, event: &SynthesisEvent) -> bool {
        if self.active != Some(utterance) {
            tracing::debug!("dropping stale synthesis event from {}: {:?}", utterance, event);
            return false;
        }
        if event.is_terminal() {
            self.active = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct RecordingEngine {
        calls: Arc<Mutex<Vec<String>>>,
        voices: Vec<VoiceInfo>,
        fail: bool,
    }

    impl SynthesisEngine for RecordingEngine {
        fn voices(&self) -> Vec<VoiceInfo> {
            self.voices.clone()
        }

        fn use_voice(&mut self, voice: &VoiceInfo) {
            self.calls.lock().unwrap().push(format!("voice:{}", voice.name));
        }

        fn speak(&mut self, text: &str, sink: SynthesisSink) -> Result<(), String> {
            self.calls.lock().unwrap().push(format!("speak:{text}"));
            if self.fail {
                return Err("engine not initialised".to_string());
            }
            sink.emit(SynthesisEvent::Start);
            Ok(())
        }

        fn cancel(&mut self) {
            self.calls.lock().unwrap().push("cancel".to_string());
        }
    }

    fn voice(name: &str, locale: &str, requires_network: bool) -> VoiceInfo {
        VoiceInfo {
            name: name.to_string(),
            locale: locale.to_string(),
            requires_network,
        }
    }

    #[test]
    fn test_select_voice_prefers_offline() {
        let voices = vec![
            voice("en-local", "en-US", false),
            voice("ru-cloud", "ru-RU", true),
            voice("ru-local", "ru_RU", false),
        ];

        assert_eq!(select_voice(&voices, "ru-RU", true).unwrap().name, "ru-local");
        assert_eq!(select_voice(&voices, "ru-RU", false).unwrap().name, "ru-cloud");
        assert!(select_voice(&voices, "de-DE", true).is_none());
    }

    #[test]
    fn test_select_voice_falls_back_to_network_voice() {
        let voices = vec![voice("ru-cloud", "ru-RU", true)];
        assert_eq!(select_voice(&voices, "ru-RU", true).unwrap().name, "ru-cloud");
    }

    #[test]
    fn test_init_voice_applies_selection() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = RecordingEngine {
            voices: vec![voice("ru-local", "ru-RU", false)],
            ..Default::default()
        };
        let mut adapter = SpeechOutputAdapter::new(engine.clone(), tx);

        let chosen = adapter.init_voice("ru-RU", true);

        assert_eq!(chosen.map(|v| v.name), Some("ru-local".to_string()));
        assert_eq!(*engine.calls.lock().unwrap(), vec!["voice:ru-local"]);
    }

    #[test]
    fn test_speak_flushes_active_utterance() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = RecordingEngine::default();
        let mut adapter = SpeechOutputAdapter::new(engine.clone(), tx);

        adapter.speak("Первый вопрос", UtteranceId(1));
        adapter.speak("Второй вопрос", UtteranceId(2));

        assert_eq!(
            *engine.calls.lock().unwrap(),
            vec!["speak:Первый вопрос", "cancel", "speak:Второй вопрос"]
        );
        assert!(!adapter.accept(UtteranceId(1), &SynthesisEvent::Done));
        assert!(adapter.accept(UtteranceId(2), &SynthesisEvent::Done));
        assert!(!adapter.is_speaking());
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = RecordingEngine::default();
        let mut adapter = SpeechOutputAdapter::new(engine.clone(), tx);

        adapter.cancel();

        assert!(engine.calls.lock().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_refused_speak_reports_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = RecordingEngine {
            fail: true,
            ..Default::default()
        };
        let mut adapter = SpeechOutputAdapter::new(engine, tx);

        adapter.speak("Как вас зовут?", UtteranceId(4));

        let Event::Synthesis { utterance, event } = rx.try_recv().unwrap() else {
            panic!("expected a synthesis event");
        };
        assert_eq!(utterance, UtteranceId(4));
        assert!(matches!(event, SynthesisEvent::Error(_)));
        assert!(adapter.accept(utterance, &event));
        assert!(!adapter.is_speaking());
    }
}
