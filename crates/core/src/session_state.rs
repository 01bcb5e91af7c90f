use crate::config::{ControllerConfig, Endpointing};
use crate::endpointing::StopPhrases;
use crate::error::{ServiceError, SessionError};
use crate::silence_timer::TimerKind;
use crate::speech_input::RecognitionEvent;
use crate::speech_output::SynthesisEvent;
use crate::{AttemptId, Command, Event, RequestId, Update, UtteranceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    LoadingQuestion,
    Speaking,
    /// Output finished; waiting out the listen gap before listening.
    Settling,
    Listening,
    /// Recognizer failed; listening restarts after the listen gap.
    ErrorRecovering,
    Submitting,
    Completed,
    /// Server-side reset in flight.
    Resetting,
}

/// State of one interview run. Only [`SessionController`] mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub current_question: Option<String>,
    pub transcript: String,
    pub turn_state: TurnState,
    pub last_error: Option<SessionError>,
    /// How many questions have been posed so far.
    pub question_index: usize,
    /// A submission failed; `transcript` holds the answer for a manual retry.
    pub awaiting_retry: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            current_question: None,
            transcript: String::new(),
            turn_state: TurnState::Idle,
            last_error: None,
            question_index: 0,
            awaiting_retry: false,
        }
    }
}

/// The turn-taking state machine.
///
/// `handle` takes one event and returns the commands to execute. It never
/// blocks and never touches an engine or the network itself, so every
/// transition can be tested by feeding events and inspecting the commands.
pub struct SessionController {
    config: ControllerConfig,
    stop_phrases: StopPhrases,
    session: Session,
    // Outstanding operations; events for anything else are stale.
    attempt: Option<AttemptId>,
    utterance: Option<UtteranceId>,
    pending_request: Option<RequestId>,
    next_id: u64,
}

impl SessionController {
    pub fn new(config: ControllerConfig) -> Self {
        let stop_phrases = match config.endpointing {
            Endpointing::SilenceOrKeyword => StopPhrases::new(&config.stop_phrases),
            Endpointing::SilenceOnly => StopPhrases::default(),
        };
        Self {
            config,
            stop_phrases,
            session: Session::default(),
            attempt: None,
            utterance: None,
            pending_request: None,
            next_id: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> TurnState {
        self.session.turn_state
    }

    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let mut out = Vec::new();
        match event {
            Event::Start => self.on_start(&mut out),
            Event::FinishAnswer => self.on_finish_answer(&mut out),
            Event::RetrySubmit => self.on_retry_submit(&mut out),
            Event::Relisten => self.on_relisten(&mut out),
            Event::ListAnswers => out.push(Command::ListAnswers),
            Event::Reset => self.on_reset(&mut out),
            Event::Shutdown => {
                tracing::info!("shutting down session in state {:?}", self.state());
                self.teardown_io(&mut out);
                self.pending_request = None;
            }
            Event::Recognition { attempt, event } => self.on_recognition(attempt, event, &mut out),
            Event::Synthesis { utterance, event } => self.on_synthesis(utterance, event, &mut out),
            Event::TimerFired { timer, .. } => self.on_timer(timer, &mut out),
            Event::QuestionFetched { request, result } => {
                self.on_question_fetched(request, result, &mut out)
            }
            Event::AnswerSubmitted { request, result } => {
                self.on_answer_submitted(request, result, &mut out)
            }
            Event::AnswersListed { result } => match result {
                Ok(records) => {
                    tracing::info!("received {} stored answers", records.len());
                    out.push(Command::Publish(Update::AnswersListed(records)));
                }
                Err(e) => {
                    tracing::warn!("failed to list answers: {}", e);
                    self.session.last_error = Some(SessionError::Network(e.clone()));
                    out.push(Command::Publish(Update::AnswersUnavailable(e)));
                }
            },
            Event::SessionReset { request, result } => self.on_session_reset(request, result, &mut out),
        }
        out
    }

    // --- Caller events ---

    fn on_start(&mut self, out: &mut Vec<Command>) {
        match self.state() {
            TurnState::Idle | TurnState::Completed => {
                tracing::info!("starting interview session");
                self.session = Session::default();
                self.fetch_question(out);
            }
            state => self.violation(format!("start requested while {state:?}")),
        }
    }

    fn on_finish_answer(&mut self, out: &mut Vec<Command>) {
        if self.state() == TurnState::Listening && self.attempt.is_some() {
            tracing::debug!("answer finished by caller; waiting for final transcript");
            out.push(Command::DisarmTimer(TimerKind::Silence));
            out.push(Command::StopListening);
        } else {
            self.violation(format!("finish requested while {:?}", self.state()));
        }
    }

    fn on_retry_submit(&mut self, out: &mut Vec<Command>) {
        if self.state() == TurnState::Listening && self.session.awaiting_retry {
            let answer = self.session.transcript.clone();
            tracing::info!("retrying submission");
            self.session.awaiting_retry = false;
            self.submit(answer, out);
        } else {
            self.violation("retry requested with no failed submission".to_string());
        }
    }

    fn on_relisten(&mut self, out: &mut Vec<Command>) {
        if self.state() == TurnState::Listening && self.session.awaiting_retry {
            self.session.awaiting_retry = false;
            self.set_state(TurnState::Settling, out);
            self.begin_listening(TurnState::Settling, out);
        } else {
            self.violation("relisten requested with no failed submission".to_string());
        }
    }

    fn on_reset(&mut self, out: &mut Vec<Command>) {
        if self.state() == TurnState::Resetting {
            self.violation("reset already in flight".to_string());
            return;
        }
        tracing::info!("resetting interview session");
        self.teardown_io(out);
        let request = self.next_request();
        self.pending_request = Some(request);
        out.push(Command::ResetSession { request });
        self.set_state(TurnState::Resetting, out);
    }

    // --- Speech output ---

    fn on_synthesis(&mut self, utterance: UtteranceId, event: SynthesisEvent, out: &mut Vec<Command>) {
        if self.utterance != Some(utterance) {
            tracing::debug!("ignoring synthesis event for inactive {}", utterance);
            return;
        }

        match event {
            SynthesisEvent::Start => {
                tracing::debug!("utterance {} started", utterance);
                if self.attempt.is_some() {
                    self.violation("speech started while listening".to_string());
                    self.cancel_listening(out);
                }
            }
            SynthesisEvent::Done | SynthesisEvent::Error(_) => {
                self.utterance = None;
                if let SynthesisEvent::Error(reason) = event {
                    tracing::warn!("utterance {} failed: {}", utterance, reason);
                    self.session.last_error = Some(SessionError::Synthesis(reason));
                }
                if self.state() == TurnState::Speaking {
                    self.begin_listening(TurnState::Settling, out);
                } else {
                    self.violation(format!("utterance finished while {:?}", self.state()));
                }
            }
        }
    }

    // --- Speech input ---

    fn on_recognition(&mut self, attempt: AttemptId, event: RecognitionEvent, out: &mut Vec<Command>) {
        if self.attempt != Some(attempt) || self.state() != TurnState::Listening {
            tracing::debug!("ignoring recognition event for inactive {}", attempt);
            return;
        }

        match event {
            RecognitionEvent::Ready => tracing::debug!("{} ready for speech", attempt),
            RecognitionEvent::Begin => tracing::debug!("{} detected speech", attempt),
            RecognitionEvent::End => tracing::debug!("{} end of speech", attempt),
            RecognitionEvent::Partial(text) => {
                if let Some(answer) = self.stop_phrases.strip(&text) {
                    tracing::info!("stop phrase heard in partial transcript");
                    self.end_turn(answer, out);
                    return;
                }
                let text = text.trim();
                if !text.is_empty() && text != self.session.transcript {
                    self.session.transcript = text.to_string();
                    out.push(Command::Publish(Update::TranscriptChanged(text.to_string())));
                }
                self.arm_silence(out);
            }
            RecognitionEvent::Final(text) => {
                // The engine is idle again after a final transcript.
                self.attempt = None;
                let answer = match self.stop_phrases.strip(&text) {
                    Some(answer) => answer,
                    None if text.trim().is_empty() => self.session.transcript.clone(),
                    None => text,
                };
                self.end_turn(answer, out);
            }
            RecognitionEvent::Error(kind) => {
                tracing::warn!("{} failed: {}", attempt, kind);
                self.attempt = None;
                self.session.last_error = Some(SessionError::Recognition(kind));
                out.push(Command::DisarmTimer(TimerKind::Silence));
                self.begin_listening(TurnState::ErrorRecovering, out);
            }
        }
    }

    // --- Timers ---

    fn on_timer(&mut self, timer: TimerKind, out: &mut Vec<Command>) {
        match (timer, self.state()) {
            (TimerKind::ListenGap, TurnState::Settling | TurnState::ErrorRecovering) => {
                self.enter_listening(out);
            }
            (TimerKind::Silence, TurnState::Listening) if self.attempt.is_some() => {
                let answer = self.session.transcript.clone();
                if answer.trim().is_empty() {
                    tracing::debug!("silence timeout with no speech; listening again");
                } else {
                    tracing::info!("silence timeout; ending turn");
                }
                self.end_turn(answer, out);
            }
            (timer, state) => tracing::debug!("ignoring {:?} timer while {:?}", timer, state),
        }
    }

    // --- Question service ---

    fn on_question_fetched(
        &mut self,
        request: RequestId,
        result: Result<String, ServiceError>,
        out: &mut Vec<Command>,
    ) {
        if !self.take_pending(request, TurnState::LoadingQuestion) {
            return;
        }

        match result {
            Ok(question) if question.trim().is_empty() => {
                tracing::info!("service has no questions left");
                self.complete(out);
            }
            Ok(question) => self.pose_question(question, out),
            Err(e) => {
                tracing::warn!("failed to fetch question: {}", e);
                self.session.last_error = Some(SessionError::Network(e));
                let placeholder = self.config.placeholder_question.clone();
                self.pose_question(placeholder, out);
            }
        }
    }

    fn on_answer_submitted(
        &mut self,
        request: RequestId,
        result: Result<Option<String>, ServiceError>,
        out: &mut Vec<Command>,
    ) {
        if !self.take_pending(request, TurnState::Submitting) {
            return;
        }

        match result {
            Ok(None) => {
                tracing::info!("interview finished");
                self.complete(out);
            }
            Ok(Some(next)) => self.pose_question(next, out),
            Err(e) => {
                tracing::error!("failed to submit answer: {}", e);
                self.session.last_error = Some(SessionError::Network(e.clone()));
                self.session.awaiting_retry = true;
                // Presentation learns about the failure before the state flips back.
                out.push(Command::Publish(Update::SubmitFailed {
                    answer: self.session.transcript.clone(),
                    error: e,
                }));
                self.set_state(TurnState::Listening, out);
            }
        }
    }

    fn on_session_reset(
        &mut self,
        request: RequestId,
        result: Result<bool, ServiceError>,
        out: &mut Vec<Command>,
    ) {
        if !self.take_pending(request, TurnState::Resetting) {
            return;
        }

        self.session = Session {
            turn_state: TurnState::Resetting,
            ..Session::default()
        };
        match result {
            Ok(true) => {
                tracing::info!("session reset; loading first question");
                self.fetch_question(out);
            }
            Ok(false) => {
                tracing::warn!("service refused to reset the session");
                out.push(Command::Publish(Update::ResetFailed(None)));
                self.set_state(TurnState::Idle, out);
            }
            Err(e) => {
                tracing::warn!("failed to reset session: {}", e);
                let error = SessionError::Network(e);
                self.session.last_error = Some(error.clone());
                out.push(Command::Publish(Update::ResetFailed(Some(error))));
                self.set_state(TurnState::Idle, out);
            }
        }
    }

    // --- Transitions ---

    fn fetch_question(&mut self, out: &mut Vec<Command>) {
        let request = self.next_request();
        self.pending_request = Some(request);
        out.push(Command::FetchQuestion { request });
        self.set_state(TurnState::LoadingQuestion, out);
    }

    fn pose_question(&mut self, question: String, out: &mut Vec<Command>) {
        self.session.question_index += 1;
        self.session.current_question = Some(question.clone());
        out.push(Command::Publish(Update::QuestionChanged {
            index: self.session.question_index,
            question: question.clone(),
        }));
        self.speak(question, out);
    }

    fn speak(&mut self, text: String, out: &mut Vec<Command>) {
        // Never talk over the recognizer.
        self.cancel_listening(out);
        out.push(Command::DisarmTimer(TimerKind::Silence));
        out.push(Command::DisarmTimer(TimerKind::ListenGap));
        if self.utterance.take().is_some() {
            out.push(Command::CancelSpeech);
        }

        let utterance = UtteranceId(self.next_id());
        self.utterance = Some(utterance);
        out.push(Command::Speak { utterance, text });
        self.set_state(TurnState::Speaking, out);
    }

    /// Listens now, or after the listen gap while in `waiting`. Recovery from
    /// a recognizer error always waits.
    fn begin_listening(&mut self, waiting: TurnState, out: &mut Vec<Command>) {
        let gap = match waiting {
            TurnState::ErrorRecovering => self.config.recovery_gap(),
            _ => self.config.effective_listen_gap(),
        };
        if gap.is_zero() {
            self.enter_listening(out);
        } else {
            out.push(Command::ArmTimer {
                timer: TimerKind::ListenGap,
                after: gap,
            });
            self.set_state(waiting, out);
        }
    }

    fn enter_listening(&mut self, out: &mut Vec<Command>) {
        if let Some(utterance) = self.utterance {
            self.violation(format!("refusing to listen while {utterance} is active"));
            return;
        }
        self.cancel_listening(out);

        self.session.awaiting_retry = false;
        if !self.session.transcript.is_empty() {
            self.session.transcript.clear();
            out.push(Command::Publish(Update::TranscriptChanged(String::new())));
        }

        let attempt = AttemptId(self.next_id());
        self.attempt = Some(attempt);
        out.push(Command::StartListening { attempt });
        self.arm_silence(out);
        self.set_state(TurnState::Listening, out);
    }

    /// Ends the current turn with `answer`: submit it, or listen again if empty.
    fn end_turn(&mut self, answer: String, out: &mut Vec<Command>) {
        self.cancel_listening(out);
        out.push(Command::DisarmTimer(TimerKind::Silence));

        let answer = answer.trim();
        if answer.is_empty() {
            self.begin_listening(TurnState::Settling, out);
        } else {
            self.submit(answer.to_string(), out);
        }
    }

    fn submit(&mut self, answer: String, out: &mut Vec<Command>) {
        if self.session.transcript != answer {
            self.session.transcript = answer.clone();
            out.push(Command::Publish(Update::TranscriptChanged(answer.clone())));
        }
        let request = self.next_request();
        self.pending_request = Some(request);
        tracing::info!("submitting answer: {:?}", answer);
        out.push(Command::SubmitAnswer { request, answer });
        self.set_state(TurnState::Submitting, out);
    }

    fn complete(&mut self, out: &mut Vec<Command>) {
        self.teardown_io(out);
        self.session.current_question = None;
        self.session.transcript.clear();
        self.set_state(TurnState::Completed, out);
        out.push(Command::Publish(Update::Completed));
    }

    // --- Helpers ---

    fn arm_silence(&mut self, out: &mut Vec<Command>) {
        out.push(Command::ArmTimer {
            timer: TimerKind::Silence,
            after: self.config.silence_timeout,
        });
    }

    fn cancel_listening(&mut self, out: &mut Vec<Command>) {
        if self.attempt.take().is_some() {
            out.push(Command::CancelListening);
        }
    }

    fn teardown_io(&mut self, out: &mut Vec<Command>) {
        if self.utterance.take().is_some() {
            out.push(Command::CancelSpeech);
        }
        self.cancel_listening(out);
        out.push(Command::DisarmTimer(TimerKind::Silence));
        out.push(Command::DisarmTimer(TimerKind::ListenGap));
    }

    fn take_pending(&mut self, request: RequestId, expected: TurnState) -> bool {
        if self.pending_request != Some(request) || self.state() != expected {
            tracing::debug!("ignoring late completion of {} while {:?}", request, self.state());
            return false;
        }
        self.pending_request = None;
        true
    }

    fn set_state(&mut self, state: TurnState, out: &mut Vec<Command>) {
        if self.session.turn_state != state {
            tracing::debug!("{:?} -> {:?}", self.session.turn_state, state);
            self.session.turn_state = state;
            out.push(Command::Publish(Update::StateChanged(state)));
        }
    }

    fn violation(&mut self, what: String) {
        tracing::warn!("protocol violation: {}", what);
        self.session.last_error = Some(SessionError::ProtocolViolation(what));
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn next_request(&mut self) -> RequestId {
        RequestId(self.next_id())
    }
}
