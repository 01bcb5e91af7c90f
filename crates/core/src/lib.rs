pub mod config;
pub mod endpointing;
pub mod error;
pub mod question_service;
pub mod runner;
pub mod session_state;
pub mod silence_timer;
pub mod speech_input;
pub mod speech_output;

use std::fmt;
use std::time::Duration;

use error::{ServiceError, SessionError};
use interview_types::AnswerRecord;
use session_state::TurnState;
use silence_timer::TimerKind;
use speech_input::RecognitionEvent;
use speech_output::SynthesisEvent;

/// Identifies one recognition attempt (start ... final/error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(pub u64);

/// Identifies one utterance, unique per `speak` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

/// Identifies one outstanding call to the question service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q_{}", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-{}", self.0)
    }
}

/// Everything the controller reacts to.
///
/// Adapters, timers and network completions never call into the controller
/// directly: they push one of these onto the runner's queue, and the runner
/// feeds them to [`session_state::SessionController::handle`] one at a time.
#[derive(Debug, Clone)]
pub enum Event {
    /// Begin a session by fetching the first question.
    Start,
    /// The user says they are done; stop listening and let the final transcript end the turn.
    FinishAnswer,
    /// Resubmit the transcript retained after a failed submission.
    RetrySubmit,
    /// Drop the retained transcript and listen again.
    Relisten,
    /// Ask the service for the stored answers.
    ListAnswers,
    /// Reset the server-side session and start over.
    Reset,
    /// Tear everything down and stop the runner.
    Shutdown,

    Recognition {
        attempt: AttemptId,
        event: RecognitionEvent,
    },
    Synthesis {
        utterance: UtteranceId,
        event: SynthesisEvent,
    },
    TimerFired {
        timer: TimerKind,
        generation: u64,
    },

    QuestionFetched {
        request: RequestId,
        result: Result<String, ServiceError>,
    },
    AnswerSubmitted {
        request: RequestId,
        result: Result<Option<String>, ServiceError>,
    },
    AnswersListed {
        result: Result<Vec<AnswerRecord>, ServiceError>,
    },
    SessionReset {
        request: RequestId,
        result: Result<bool, ServiceError>,
    },
}

/// Represents commands that the controller issues to the runtime.
///
/// The controller decides, the runner executes. This keeps every transition a
/// plain function from one event to a list of side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchQuestion { request: RequestId },
    SubmitAnswer { request: RequestId, answer: String },
    ListAnswers,
    ResetSession { request: RequestId },

    /// Speak the given text. Any active utterance is flushed first.
    Speak { utterance: UtteranceId, text: String },
    CancelSpeech,

    StartListening { attempt: AttemptId },
    /// Stop capturing audio; the engine still delivers a final transcript.
    StopListening,
    /// Abort the attempt; nothing more is delivered for it.
    CancelListening,

    ArmTimer { timer: TimerKind, after: Duration },
    DisarmTimer(TimerKind),

    /// Forward a state snapshot to presentation.
    Publish(Update),
}

/// Notifications for presentation code.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    StateChanged(TurnState),
    QuestionChanged { index: usize, question: String },
    TranscriptChanged(String),
    SubmitFailed { answer: String, error: ServiceError },
    Completed,
    AnswersListed(Vec<AnswerRecord>),
    AnswersUnavailable(ServiceError),
    ResetFailed(Option<SessionError>),
}
