//! Terminal stand-ins for the platform speech engines.
//!
//! `ConsoleRecognizer` treats typed lines as speech: each line extends the
//! transcript of the current attempt and is reported as a partial result,
//! an empty line ends the attempt. `ConsoleSynthesizer` prints the text and
//! reports completion after a delay proportional to its word count.

use interview_core::error::RecognitionErrorKind;
use interview_core::speech_input::{
    RecognitionEngine, RecognitionEvent, RecognitionRequest, RecognitionSink,
};
use interview_core::speech_output::{SynthesisEngine, SynthesisEvent, SynthesisSink, VoiceInfo};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

struct Attempt {
    sink: RecognitionSink,
    transcript: String,
}

impl Attempt {
    fn finish(self) {
        self.sink.emit(RecognitionEvent::End);
        self.sink.emit(RecognitionEvent::Final(self.transcript));
    }
}

type SharedAttempt = Arc<Mutex<Option<Attempt>>>;

fn lock(shared: &SharedAttempt) -> MutexGuard<'_, Option<Attempt>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Recognition engine fed by [`SpeechFeed`].
pub struct ConsoleRecognizer {
    active: SharedAttempt,
}

/// Writer side of a [`ConsoleRecognizer`]. Lines typed while no attempt is
/// running are discarded.
#[derive(Clone)]
pub struct SpeechFeed {
    active: SharedAttempt,
}

impl ConsoleRecognizer {
    pub fn new() -> (Self, SpeechFeed) {
        let active = SharedAttempt::default();
        let feed = SpeechFeed {
            active: Arc::clone(&active),
        };
        (Self { active }, feed)
    }
}

impl RecognitionEngine for ConsoleRecognizer {
    fn start(
        &mut self,
        request: &RecognitionRequest,
        sink: RecognitionSink,
    ) -> Result<(), RecognitionErrorKind> {
        let mut active = lock(&self.active);
        if active.is_some() {
            return Err(RecognitionErrorKind::Busy);
        }

        tracing::debug!("console recognizer listening ({})", request.locale);
        sink.emit(RecognitionEvent::Ready);
        *active = Some(Attempt {
            sink,
            transcript: String::new(),
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(attempt) = lock(&self.active).take() {
            attempt.finish();
        }
    }

    fn cancel(&mut self) {
        lock(&self.active).take();
    }
}

impl SpeechFeed {
    /// Whether a listening attempt is waiting for input.
    pub fn is_listening(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Delivers one typed line to the current attempt.
    pub fn push_line(&self, line: &str) -> bool {
        let mut active = lock(&self.active);
        let line = line.trim();

        if line.is_empty() {
            return match active.take() {
                Some(attempt) => {
                    attempt.finish();
                    true
                }
                None => false,
            };
        }

        let Some(attempt) = active.as_mut() else {
            tracing::debug!("ignoring input while not listening: {:?}", line);
            return false;
        };
        if attempt.transcript.is_empty() {
            attempt.sink.emit(RecognitionEvent::Begin);
        } else {
            attempt.transcript.push(' ');
        }
        attempt.transcript.push_str(line);
        attempt
            .sink
            .emit(RecognitionEvent::Partial(attempt.transcript.clone()));
        true
    }
}

/// Synthesis engine that prints utterances to stdout.
pub struct ConsoleSynthesizer {
    locale: String,
    per_word: Duration,
    playback: Option<JoinHandle<()>>,
}

impl ConsoleSynthesizer {
    pub fn new(locale: &str, per_word: Duration) -> Self {
        Self {
            locale: locale.to_string(),
            per_word,
            playback: None,
        }
    }

    fn duration_of(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as u32;
        self.per_word * words
    }
}

impl SynthesisEngine for ConsoleSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        vec![VoiceInfo {
            name: "console".to_string(),
            locale: self.locale.clone(),
            requires_network: false,
        }]
    }

    fn use_voice(&mut self, voice: &VoiceInfo) {
        tracing::debug!("console synthesizer using voice {}", voice.name);
    }

    fn speak(&mut self, text: &str, sink: SynthesisSink) -> Result<(), String> {
        self.cancel();

        println!("\n>>> {text}");
        sink.emit(SynthesisEvent::Start);
        let duration = self.duration_of(text);
        self.playback = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            sink.emit(SynthesisEvent::Done);
        }));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.abort();
        }
    }
}

impl Drop for ConsoleSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}
