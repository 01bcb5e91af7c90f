use crate::error::ServiceError;
use async_trait::async_trait;
use interview_types::AnswerRecord;
#[cfg(test)]
use mockall::automock;

// The `QuestionService` trait is the controller's only view of the remote
// interview service. The runner spawns each call and queues its completion as
// an event, so implementations are free to take as long as they need.
//
// Each call completes exactly once and is never retried here.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuestionService: Send + Sync {
    /// Fetches the question currently posed by the service.
    async fn fetch_next_question(&self) -> Result<String, ServiceError>;

    /// Submits an answer. `None` means there are no more questions.
    async fn submit_answer(&self, answer: &str) -> Result<Option<String>, ServiceError>;

    async fn list_answers(&self) -> Result<Vec<AnswerRecord>, ServiceError>;

    /// Clears the server-side session. `Ok(false)` if the server refused.
    async fn reset_session(&self) -> Result<bool, ServiceError>;
}
