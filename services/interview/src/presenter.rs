//! Turns session updates into console output.

use interview_core::Update;
use interview_core::session_state::TurnState;
use question_client::types::AnswerRecord;

/// Something the console should ask the session to do after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    ListAnswers,
    Shutdown,
}

#[derive(Debug, Default)]
pub struct Presenter {
    completed: bool,
    awaiting_retry: bool,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the lines to print for `update` to `out`.
    pub fn render(&mut self, update: Update, out: &mut Vec<String>) -> Option<FollowUp> {
        match update {
            Update::StateChanged(TurnState::Listening) => {
                if self.awaiting_retry {
                    out.push("(answer not submitted; type /retry or /relisten)".to_string());
                } else {
                    out.push("(listening)".to_string());
                }
            }
            Update::StateChanged(TurnState::Idle) => {
                self.awaiting_retry = false;
                out.push("(idle; type /start to begin)".to_string());
            }
            Update::StateChanged(state) => {
                tracing::debug!("state: {:?}", state);
                self.awaiting_retry = false;
            }
            Update::QuestionChanged { index, question } => {
                tracing::info!("Question {}: {}", index, question);
            }
            Update::TranscriptChanged(text) => {
                if !text.is_empty() {
                    out.push(format!("... {text}"));
                }
            }
            Update::SubmitFailed { answer, error } => {
                self.awaiting_retry = true;
                out.push(format!("Could not submit {answer:?}: {error}."));
            }
            Update::Completed => {
                self.completed = true;
                out.push("\nInterview complete. Fetching your answers...".to_string());
                return Some(FollowUp::ListAnswers);
            }
            Update::AnswersListed(answers) => {
                out.extend(format_answers(&answers));
                return self.completed.then_some(FollowUp::Shutdown);
            }
            Update::AnswersUnavailable(error) => {
                out.push(format!("Stored answers are unavailable: {error}"));
                return self.completed.then_some(FollowUp::Shutdown);
            }
            Update::ResetFailed(error) => match error {
                Some(error) => out.push(format!("Reset failed: {error}")),
                None => out.push("Reset refused by the question service.".to_string()),
            },
        }
        None
    }
}

pub fn format_answers(answers: &[AnswerRecord]) -> Vec<String> {
    if answers.is_empty() {
        return vec!["No answers recorded.".to_string()];
    }
    answers
        .iter()
        .map(|record| {
            format!(
                "#{} [{}] {}\n    {}",
                record.id(),
                record.q_index(),
                record.question(),
                record.answer()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::error::ServiceError;

    #[test]
    fn test_failed_submit_prompts_for_retry_instead_of_listening() {
        let mut presenter = Presenter::new();
        let mut out = Vec::new();

        presenter.render(
            Update::SubmitFailed {
                answer: "Иван".to_string(),
                error: ServiceError::Status(502),
            },
            &mut out,
        );
        presenter.render(Update::StateChanged(TurnState::Listening), &mut out);

        assert!(out.iter().all(|line| line != "(listening)"));
        assert!(out.last().unwrap().contains("/retry"));

        // Once the retry goes out, listening is announced normally again.
        out.clear();
        presenter.render(Update::StateChanged(TurnState::Submitting), &mut out);
        presenter.render(Update::StateChanged(TurnState::Listening), &mut out);
        assert_eq!(out, vec!["(listening)"]);
    }

    #[test]
    fn test_idle_after_failed_reset_offers_start() {
        let mut presenter = Presenter::new();
        let mut out = Vec::new();

        presenter.render(Update::ResetFailed(None), &mut out);
        presenter.render(Update::StateChanged(TurnState::Idle), &mut out);

        assert!(out.last().unwrap().contains("/start"));
    }

    #[test]
    fn test_completion_lists_answers_then_shuts_down() {
        let mut presenter = Presenter::new();
        let mut out = Vec::new();
        let records = vec![AnswerRecord::new(1, 0, "Как вас зовут?", "Иван")];

        assert_eq!(
            presenter.render(Update::AnswersListed(records.clone()), &mut out),
            None,
            "listing on request must not end the session"
        );
        assert_eq!(
            presenter.render(Update::Completed, &mut out),
            Some(FollowUp::ListAnswers)
        );
        assert_eq!(
            presenter.render(Update::AnswersListed(records), &mut out),
            Some(FollowUp::Shutdown)
        );
        assert!(out.iter().any(|line| line.contains("Иван")));
    }
}
