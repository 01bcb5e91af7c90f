//! Drives a [`SessionController`] against real engines and the question service.
//!
//! All inputs funnel through one unbounded queue. The runner pops an event,
//! drops it if the adapter or timer that produced it has moved on, lets the
//! controller decide, and executes the resulting commands before popping the
//! next one. Network calls run on spawned tasks and come back as events.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::ControllerConfig;
use crate::question_service::QuestionService;
use crate::session_state::{Session, SessionController};
use crate::silence_timer::{SilenceTimer, TimerKind};
use crate::speech_input::{RecognitionEngine, RecognitionRequest, SpeechInputAdapter};
use crate::speech_output::{SpeechOutputAdapter, SynthesisEngine};
use crate::{Command, Event, Update};

/// Caller-side handle for a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: UnboundedSender<Event>,
}

impl SessionHandle {
    pub fn start(&self) -> bool {
        self.send(Event::Start)
    }

    pub fn finish_answer(&self) -> bool {
        self.send(Event::FinishAnswer)
    }

    pub fn retry_submit(&self) -> bool {
        self.send(Event::RetrySubmit)
    }

    pub fn relisten(&self) -> bool {
        self.send(Event::Relisten)
    }

    pub fn list_answers(&self) -> bool {
        self.send(Event::ListAnswers)
    }

    pub fn reset(&self) -> bool {
        self.send(Event::Reset)
    }

    pub fn shutdown(&self) -> bool {
        self.send(Event::Shutdown)
    }

    /// Returns false once the runner has stopped.
    fn send(&self, event: Event) -> bool {
        self.events.send(event).is_ok()
    }
}

pub struct SessionRunner<R, S> {
    controller: SessionController,
    service: Arc<dyn QuestionService>,
    input: SpeechInputAdapter<R>,
    output: SpeechOutputAdapter<S>,
    silence: SilenceTimer,
    listen_gap: SilenceTimer,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
    updates: UnboundedSender<Update>,
}

impl<R, S> SessionRunner<R, S>
where
    R: RecognitionEngine + 'static,
    S: SynthesisEngine + 'static,
{
    /// Wires the engines and the service to a fresh controller and selects a
    /// voice. Nothing happens until [`SessionHandle::start`] is called.
    pub fn new(
        config: ControllerConfig,
        service: Arc<dyn QuestionService>,
        recognizer: R,
        synthesizer: S,
    ) -> (Self, SessionHandle, UnboundedReceiver<Update>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let request = RecognitionRequest {
            locale: config.locale.clone(),
            prefer_offline: config.prefer_offline,
        };
        let input = SpeechInputAdapter::new(recognizer, request, events_tx.clone());
        let mut output = SpeechOutputAdapter::new(synthesizer, events_tx.clone());
        output.init_voice(&config.locale, config.prefer_offline);

        let runner = Self {
            controller: SessionController::new(config),
            service,
            input,
            output,
            silence: SilenceTimer::new(TimerKind::Silence, events_tx.clone()),
            listen_gap: SilenceTimer::new(TimerKind::ListenGap, events_tx.clone()),
            events_tx: events_tx.clone(),
            events_rx,
            updates: updates_tx,
        };
        let handle = SessionHandle { events: events_tx };
        (runner, handle, updates_rx)
    }

    /// Processes events until [`Event::Shutdown`]; returns the final session.
    pub async fn run(mut self) -> Session {
        tracing::info!("session runner started");

        while let Some(event) = self.events_rx.recv().await {
            let shutdown = matches!(event, Event::Shutdown);
            if !self.admit(&event) {
                continue;
            }

            for command in self.controller.handle(event) {
                self.execute(command);
            }

            if shutdown {
                break;
            }
        }

        tracing::info!("session runner stopped");
        self.controller.session().clone()
    }

    /// Drops events from cancelled attempts, flushed utterances and
    /// superseded timer arms.
    fn admit(&mut self, event: &Event) -> bool {
        match event {
            Event::Recognition { attempt, event } => self.input.accept(*attempt, event),
            Event::Synthesis { utterance, event } => self.output.accept(*utterance, event),
            Event::TimerFired { timer, generation } => self.timer(*timer).accept(*generation),
            _ => true,
        }
    }

    fn execute(&mut self, command: Command) {
        tracing::trace!("executing {:?}", command);
        match command {
            Command::FetchQuestion { request } => self.spawn_call(move |service| async move {
                Event::QuestionFetched {
                    request,
                    result: service.fetch_next_question().await,
                }
            }),
            Command::SubmitAnswer { request, answer } => self.spawn_call(move |service| async move {
                Event::AnswerSubmitted {
                    request,
                    result: service.submit_answer(&answer).await,
                }
            }),
            Command::ListAnswers => self.spawn_call(|service| async move {
                Event::AnswersListed {
                    result: service.list_answers().await,
                }
            }),
            Command::ResetSession { request } => self.spawn_call(move |service| async move {
                Event::SessionReset {
                    request,
                    result: service.reset_session().await,
                }
            }),
            Command::Speak { utterance, text } => self.output.speak(&text, utterance),
            Command::CancelSpeech => self.output.cancel(),
            Command::StartListening { attempt } => {
                self.input.start_listening(attempt);
            }
            Command::StopListening => self.input.stop_listening(),
            Command::CancelListening => self.input.cancel(),
            Command::ArmTimer { timer, after } => self.timer(timer).arm(after),
            Command::DisarmTimer(timer) => self.timer(timer).disarm(),
            Command::Publish(update) => {
                if self.updates.send(update).is_err() {
                    tracing::trace!("no one is listening for session updates");
                }
            }
        }
    }

    fn spawn_call<F, Fut>(&self, call: F)
    where
        F: FnOnce(Arc<dyn QuestionService>) -> Fut + Send + 'static,
        Fut: Future<Output = Event> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let event = call(service).await;
            if events.send(event).is_err() {
                tracing::debug!("question service call completed after the runner stopped");
            }
        });
    }

    fn timer(&mut self, kind: TimerKind) -> &mut SilenceTimer {
        match kind {
            TimerKind::Silence => &mut self.silence,
            TimerKind::ListenGap => &mut self.listen_gap,
        }
    }
}
