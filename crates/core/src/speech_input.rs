//! Speech input adapter.
//!
//! Wraps a platform recognition engine. The adapter hands the engine a
//! [`RecognitionSink`] for each attempt; the sink tags every engine callback
//! with the attempt id and queues it for the controller, so engine threads
//! never touch session state.
//!
//! Commands issued in the wrong state are no-ops: `start_listening` while an
//! attempt is outstanding is ignored, `cancel`/`stop_listening` while idle do
//! nothing and produce no event.

use crate::error::RecognitionErrorKind;
use crate::{AttemptId, Event};
use tokio::sync::mpsc::UnboundedSender;

/// Events raised by the recognizer within one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Engine armed, no audio yet.
    Ready,
    /// Speech energy detected.
    Begin,
    /// Interim transcript.
    Partial(String),
    /// Terminal transcript; the attempt is over.
    Final(String),
    /// Audio capture ended; `Final` or `Error` follows.
    End,
    /// The attempt was aborted without a transcript.
    Error(RecognitionErrorKind),
}

impl RecognitionEvent {
    /// Whether the attempt is over once this event has been raised.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecognitionEvent::Final(_) | RecognitionEvent::Error(_))
    }
}

/// Parameters passed to the engine on every start.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub locale: String,
    pub prefer_offline: bool,
}

/// Marshals engine callbacks for one attempt onto the controller queue.
#[derive(Debug, Clone)]
pub struct RecognitionSink {
    attempt: AttemptId,
    events: UnboundedSender<Event>,
}

impl RecognitionSink {
    pub fn new(attempt: AttemptId, events: UnboundedSender<Event>) -> Self {
        Self { attempt, events }
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Queues `event`. Returns false once the controller is gone.
    pub fn emit(&self, event: RecognitionEvent) -> bool {
        self.events
            .send(Event::Recognition {
                attempt: self.attempt,
                event,
            })
            .is_ok()
    }
}

/// The platform speech recognizer.
pub trait RecognitionEngine: Send {
    /// Begins an attempt. All callbacks for it go through `sink`.
    fn start(
        &mut self,
        request: &RecognitionRequest,
        sink: RecognitionSink,
    ) -> Result<(), RecognitionErrorKind>;

    /// Stops capturing; the engine must still deliver `Final` or `Error`.
    fn stop(&mut self);

    /// Aborts the attempt; the engine should deliver nothing more for it.
    fn cancel(&mut self);
}

pub struct SpeechInputAdapter<E> {
    engine: E,
    request: RecognitionRequest,
    events: UnboundedSender<Event>,
    active: Option<AttemptId>,
}

impl<E: RecognitionEngine> SpeechInputAdapter<E> {
    pub fn new(engine: E, request: RecognitionRequest, events: UnboundedSender<Event>) -> Self {
        Self {
            engine,
            request,
            events,
            active: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_attempt(&self) -> Option<AttemptId> {
        self.active
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Starts a new attempt. Returns false if one is already outstanding.
    ///
    /// A refusal from the engine is reported as an `Error` event for the new
    /// attempt, so the controller recovers the same way as for a mid-attempt failure.
    pub fn start_listening(&mut self, attempt: AttemptId) -> bool {
        if let Some(active) = self.active {
            tracing::warn!("start_listening({}) ignored: {} still outstanding", attempt, active);
            return false;
        }

        let sink = RecognitionSink::new(attempt, self.events.clone());
        self.active = Some(attempt);
        tracing::debug!("starting recognition {} ({})", attempt, self.request.locale);

        if let Err(kind) = self.engine.start(&self.request, sink.clone()) {
            tracing::warn!("recognizer refused to start {}: {}", attempt, kind);
            sink.emit(RecognitionEvent::Error(kind));
        }
        true
    }

    /// Asks the engine to finish the current attempt with a final transcript.
    pub fn stop_listening(&mut self) {
        match self.active {
            Some(attempt) => {
                tracing::debug!("stopping recognition {}", attempt);
                self.engine.stop();
            }
            None => tracing::trace!("stop_listening ignored: no active attempt"),
        }
    }

    /// Aborts the current attempt. Anything it still raises is dropped by [`Self::accept`].
    pub fn cancel(&mut self) {
        if let Some(attempt) = self.active.take() {
            tracing::debug!("cancelling recognition {}", attempt);
            self.engine.cancel();
        }
    }

    /// Filters an event coming off the queue. Returns false for stale events,
    /// i.e. those of an attempt that was cancelled or already finished.
    pub fn accept(&mut self, attempt: AttemptId, event: &RecognitionEvent) -> bool {
        if self.active != Some(attempt) {
            tracing::debug!("dropping stale recognition event from {}: {:?}", attempt, event);
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
        refuse_with: Option<RecognitionErrorKind>,
    }

    impl RecognitionEngine for RecordingEngine {
        fn start(
            &mut self,
            request: &RecognitionRequest,
            sink: RecognitionSink,
        ) -> Result<(), RecognitionErrorKind> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("start:{}:{}", request.locale, sink.attempt()));
            match self.refuse_with {
                Some(kind) => Err(kind),
                None => {
                    sink.emit(RecognitionEvent::Ready);
                    Ok(())
                }
            }
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop".to_string());
        }

        fn cancel(&mut self) {
            self.calls.lock().unwrap().push("cancel".to_string());
        }
    }

    fn request() -> RecognitionRequest {
        RecognitionRequest {
            locale: "ru-RU".to_string(),
            prefer_offline: true,
        }
    }

    #[test]
    fn test_cancel_and_stop_when_idle_are_noops() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = RecordingEngine::default();
        let mut adapter = SpeechInputAdapter::new(engine.clone(), request(), tx);

        adapter.cancel();
        adapter.stop_listening();

        assert!(engine.calls.lock().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_start_while_listening_is_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = RecordingEngine::default();
        let mut adapter = SpeechInputAdapter::new(engine.clone(), request(), tx);

        assert!(adapter.start_listening(AttemptId(1)));
        assert!(!adapter.start_listening(AttemptId(2)));

        assert_eq!(*engine.calls.lock().unwrap(), vec!["start:ru-RU:attempt-1"]);
        assert_eq!(adapter.active_attempt(), Some(AttemptId(1)));
    }

    #[test]
    fn test_events_are_tagged_and_terminal_event_returns_to_idle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut adapter = SpeechInputAdapter::new(RecordingEngine::default(), request(), tx);

        adapter.start_listening(AttemptId(3));
        let Event::Recognition { attempt, event } = rx.try_recv().unwrap() else {
            panic!("expected a recognition event");
        };
        assert_eq!(attempt, AttemptId(3));
        assert_eq!(event, RecognitionEvent::Ready);

        assert!(adapter.accept(AttemptId(3), &RecognitionEvent::Partial("Иван".into())));
        assert!(adapter.is_listening());
        assert!(adapter.accept(AttemptId(3), &RecognitionEvent::Final("Иван".into())));
        assert!(!adapter.is_listening());
    }

    #[test]
    fn test_events_from_cancelled_attempt_are_dropped() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = RecordingEngine::default();
        let mut adapter = SpeechInputAdapter::new(engine.clone(), request(), tx);

        adapter.start_listening(AttemptId(1));
        adapter.cancel();
        adapter.start_listening(AttemptId(2));

        assert!(!adapter.accept(AttemptId(1), &RecognitionEvent::Final("поздно".into())));
        assert!(adapter.accept(AttemptId(2), &RecognitionEvent::Begin));
        assert_eq!(
            *engine.calls.lock().unwrap(),
            vec!["start:ru-RU:attempt-1", "cancel", "start:ru-RU:attempt-2"]
        );
    }

    #[test]
    fn test_engine_refusal_becomes_error_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = RecordingEngine {
            refuse_with: Some(RecognitionErrorKind::Busy),
            ..Default::default()
        };
        let mut adapter = SpeechInputAdapter::new(engine, request(), tx);

        adapter.start_listening(AttemptId(9));

        let Event::Recognition { attempt, event } = rx.try_recv().unwrap() else {
            panic!("expected a recognition event");
        };
        assert_eq!(attempt, AttemptId(9));
        assert_eq!(event, RecognitionEvent::Error(RecognitionErrorKind::Busy));
        assert!(adapter.accept(attempt, &event));
        assert!(!adapter.is_listening());
    }
}
